/*!
 * Tokenizer Configuration
 *
 * Typed view over the serialized tokenizer config (the parts the bridge
 * reads or lets callers rewrite) and the immutable runtime configuration
 * derived from it.
 */

use crate::core::errors::{Result, TokenizerError};
use crate::core::limits::max_utf8_byte_count;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Serialized tokenizer config
///
/// Keys the bridge does not model are kept in `extra`, so a
/// deserialize/serialize cycle loses nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenizerData {
    #[serde(default)]
    pub truncation: Option<Truncation>,
    #[serde(default)]
    pub padding: Option<Padding>,
    #[serde(default)]
    pub added_tokens: Vec<AddedToken>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenizerData {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TruncationDirection {
    Left,
    #[default]
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TruncationStrategy {
    #[default]
    LongestFirst,
    OnlyFirst,
    OnlySecond,
}

/// Truncation parameters; their presence makes encode calls truncate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Truncation {
    #[serde(default)]
    pub direction: TruncationDirection,
    pub max_length: u64,
    #[serde(default)]
    pub strategy: TruncationStrategy,
    #[serde(default)]
    pub stride: u64,
}

impl Truncation {
    pub fn new(max_length: u64) -> Self {
        Self {
            direction: TruncationDirection::default(),
            max_length,
            strategy: TruncationStrategy::default(),
            stride: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaddingDirection {
    Left,
    #[default]
    Right,
}

/// `"BatchLongest"` or `{"Fixed": n}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaddingStrategy {
    #[default]
    BatchLongest,
    Fixed(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Padding {
    #[serde(default)]
    pub strategy: PaddingStrategy,
    #[serde(default)]
    pub direction: PaddingDirection,
    #[serde(default)]
    pub pad_to_multiple_of: Option<u64>,
    #[serde(default)]
    pub pad_id: u32,
    #[serde(default)]
    pub pad_type_id: u32,
    #[serde(default = "default_pad_token")]
    pub pad_token: String,
}

fn default_pad_token() -> String {
    "[PAD]".to_string()
}

impl Default for Padding {
    fn default() -> Self {
        Self {
            strategy: PaddingStrategy::default(),
            direction: PaddingDirection::default(),
            pad_to_multiple_of: None,
            pad_id: 0,
            pad_type_id: 0,
            pad_token: default_pad_token(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddedToken {
    pub id: u32,
    pub content: String,
    #[serde(default)]
    pub single_word: bool,
    #[serde(default)]
    pub lstrip: bool,
    #[serde(default)]
    pub rstrip: bool,
    #[serde(default = "default_normalized")]
    pub normalized: bool,
    #[serde(default)]
    pub special: bool,
}

fn default_normalized() -> bool {
    true
}

impl AddedToken {
    pub fn new(id: u32, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            single_word: false,
            lstrip: false,
            rstrip: false,
            normalized: default_normalized(),
            special: false,
        }
    }
}

/// Runtime configuration fixed when a tokenizer is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizerConfig {
    expected_max_input_length: u32,
    expected_max_batches: u32,
    max_input_byte_length: usize,
    truncation: Option<Truncation>,
}

impl TokenizerConfig {
    /// Derive the runtime config, sizing pool buffers for the worst-case
    /// UTF-8 expansion of `expected_max_input_length` characters
    ///
    /// # Errors
    /// `Configuration` when the batch count is zero or the byte length does
    /// not fit in `usize`.
    pub fn new(
        expected_max_input_length: u32,
        expected_max_batches: u32,
        truncation: Option<Truncation>,
    ) -> Result<Self> {
        if expected_max_batches == 0 {
            return Err(TokenizerError::configuration(
                "expected max batches must be at least 1",
            ));
        }

        let max_input_byte_length = max_utf8_byte_count(expected_max_input_length as usize)
            .ok_or_else(|| {
                TokenizerError::configuration("expected max input length overflows buffer size")
            })?;

        Ok(Self {
            expected_max_input_length,
            expected_max_batches,
            max_input_byte_length,
            truncation,
        })
    }

    #[inline(always)]
    pub fn expected_max_input_length(&self) -> u32 {
        self.expected_max_input_length
    }

    #[inline(always)]
    pub fn expected_max_batches(&self) -> u32 {
        self.expected_max_batches
    }

    /// Capacity of every pool buffer in bytes
    #[inline(always)]
    pub fn max_input_byte_length(&self) -> usize {
        self.max_input_byte_length
    }

    #[inline(always)]
    pub fn truncation(&self) -> Option<&Truncation> {
        self.truncation.as_ref()
    }

    /// Whether encode calls use the truncating entry points
    #[inline(always)]
    pub fn truncates(&self) -> bool {
        self.truncation.is_some()
    }
}
