/*!
 * Tokenizer Builder
 * Builder pattern for Tokenizer construction
 */

use super::config::{TokenizerConfig, TokenizerData};
use super::tokenizer::Tokenizer;
use crate::core::errors::{Result, TokenizerError};
use crate::core::limits::{DEFAULT_EXPECTED_MAX_BATCHES, DEFAULT_EXPECTED_MAX_INPUT_LENGTH};
use crate::memory::ReadOnlyNativeBuffer;
use crate::native::NativeTokenizerApi;
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

type ConfigModifier = Box<dyn FnOnce(TokenizerData) -> TokenizerData>;

/// Builder for [`Tokenizer`]
///
/// # Example
///
/// ```ignore
/// let tokenizer = TokenizerBuilder::new()
///     .with_tokenizer_json_path("tokenizer.json")
///     .with_expected_max_input_length(512)
///     .with_expected_max_batches(32)
///     .build()?;
/// ```
pub struct TokenizerBuilder {
    expected_max_input_length: u32,
    expected_max_batches: u32,
    tokenizer_json_path: Option<PathBuf>,
    raw_tokenizer_data: Option<Vec<u8>>,
    modifier: Option<ConfigModifier>,
}

impl TokenizerBuilder {
    /// Create a new builder with default sizing
    pub fn new() -> Self {
        Self {
            expected_max_input_length: DEFAULT_EXPECTED_MAX_INPUT_LENGTH,
            expected_max_batches: DEFAULT_EXPECTED_MAX_BATCHES,
            tokenizer_json_path: None,
            raw_tokenizer_data: None,
            modifier: None,
        }
    }

    /// Longest input, in characters, that stages into a pool buffer
    pub fn with_expected_max_input_length(mut self, length: u32) -> Self {
        self.expected_max_input_length = length;
        self
    }

    /// Batch size the pool is pre-allocated for
    pub fn with_expected_max_batches(mut self, batches: u32) -> Self {
        self.expected_max_batches = batches;
        self
    }

    /// Read the tokenizer config from a file
    pub fn with_tokenizer_json_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.tokenizer_json_path = Some(path.into());
        self
    }

    /// Use in-memory tokenizer config bytes; wins over a path
    pub fn with_raw_tokenizer_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.raw_tokenizer_data = Some(data.into());
        self
    }

    /// Rewrite the parsed config before the native tokenizer sees it
    pub fn with_config_modifier<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(TokenizerData) -> TokenizerData + 'static,
    {
        self.modifier = Some(Box::new(modifier));
        self
    }

    /// Build against the linked native library
    #[cfg(feature = "native")]
    pub fn build(self) -> Result<Tokenizer<crate::native::ExternNative>> {
        self.build_with(crate::native::ExternNative)
    }

    /// Build against any native backend
    ///
    /// # Errors
    /// `Configuration` when no config source is set, the sizing is invalid,
    /// or the backend rejects the config; `Io`/`Json` when the config cannot
    /// be read or parsed.
    pub fn build_with<N: NativeTokenizerApi>(self, native: N) -> Result<Tokenizer<N>> {
        let mut bytes = match (self.raw_tokenizer_data, self.tokenizer_json_path) {
            (Some(data), _) => data,
            (None, Some(path)) => {
                debug!(path = %path.display(), "reading tokenizer config");
                std::fs::read(&path)?
            }
            (None, None) => {
                return Err(TokenizerError::configuration(
                    "no tokenizer config source: set a JSON path or raw data",
                ))
            }
        };

        let mut data = TokenizerData::from_slice(&bytes)?;
        if let Some(modifier) = self.modifier {
            data = modifier(data);
            bytes = data.to_vec()?;
        }

        let config = TokenizerConfig::new(
            self.expected_max_input_length,
            self.expected_max_batches,
            data.truncation,
        )?;

        // SAFETY: `bytes` is borrowed for the whole call
        let handle = unsafe { native.allocate_tokenizer(ReadOnlyNativeBuffer::from_slice(&bytes)) }
            .ok_or_else(|| TokenizerError::configuration("native tokenizer rejected the config"))?;

        Ok(Tokenizer::from_parts(native, handle, config))
    }
}

impl Default for TokenizerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TokenizerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenizerBuilder")
            .field("expected_max_input_length", &self.expected_max_input_length)
            .field("expected_max_batches", &self.expected_max_batches)
            .field("tokenizer_json_path", &self.tokenizer_json_path)
            .field(
                "raw_tokenizer_data",
                &self.raw_tokenizer_data.as_ref().map(Vec::len),
            )
            .field("has_modifier", &self.modifier.is_some())
            .finish()
    }
}
