/*!
 * Error Types
 * Centralized error handling with thiserror and miette diagnostics
 */

use miette::Diagnostic;
use smartstring::alias::String as SmartString;
use thiserror::Error;

/// Errors surfaced by the marshalling layer
///
/// Contract violations (`BufferTooSmall`, `LengthMismatch`) are reported
/// synchronously and never retried. Allocation failure is not represented
/// here: it aborts through `std::alloc::handle_alloc_error`.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum TokenizerError {
    #[error("Destination buffer too small: requires {required} elements, got {actual}")]
    #[diagnostic(
        code(tokenizer::buffer_too_small),
        help("Size the destination with the reported length, or use the variant that allocates an exact-sized block.")
    )]
    BufferTooSmall { required: usize, actual: usize },

    #[error("Output length {outputs} does not match input length {inputs}")]
    #[diagnostic(
        code(tokenizer::length_mismatch),
        help("Provide exactly one output slot per input text.")
    )]
    LengthMismatch { inputs: usize, outputs: usize },

    #[error("Token id {value} at index {index} does not fit in 32 bits")]
    #[diagnostic(
        code(tokenizer::id_out_of_range),
        help("Ids handed to the native decoder must come from this tokenizer's vocabulary.")
    )]
    IdOutOfRange { index: usize, value: u64 },

    #[error("Native output is not valid UTF-8 (valid up to byte {valid_up_to})")]
    #[diagnostic(
        code(tokenizer::invalid_utf8),
        help("Read the raw bytes instead, or decode with skip_special_tokens enabled.")
    )]
    InvalidUtf8 { valid_up_to: usize },

    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(tokenizer::configuration),
        help("Review the builder parameters and the tokenizer config source.")
    )]
    Configuration(SmartString),

    #[error("I/O error: {0}")]
    #[diagnostic(
        code(tokenizer::io),
        help("Check that the tokenizer config path exists and is readable.")
    )]
    Io(SmartString),

    #[error("Tokenizer config JSON error: {0}")]
    #[diagnostic(
        code(tokenizer::json),
        help("The config must be a tokenizer.json document.")
    )]
    Json(SmartString),
}

impl TokenizerError {
    /// Stable snake_case name of the violated contract
    pub fn kind(&self) -> &'static str {
        match self {
            TokenizerError::BufferTooSmall { .. } => "buffer_too_small",
            TokenizerError::LengthMismatch { .. } => "length_mismatch",
            TokenizerError::IdOutOfRange { .. } => "id_out_of_range",
            TokenizerError::InvalidUtf8 { .. } => "invalid_utf8",
            TokenizerError::Configuration(_) => "configuration",
            TokenizerError::Io(_) => "io",
            TokenizerError::Json(_) => "json",
        }
    }

    /// True for misuse of an API contract, as opposed to environment failures
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            TokenizerError::BufferTooSmall { .. }
                | TokenizerError::LengthMismatch { .. }
                | TokenizerError::IdOutOfRange { .. }
        )
    }

    #[cold]
    pub(crate) fn buffer_too_small(required: usize, actual: usize) -> Self {
        TokenizerError::BufferTooSmall { required, actual }
    }

    #[cold]
    pub(crate) fn configuration(msg: impl AsRef<str>) -> Self {
        TokenizerError::Configuration(msg.as_ref().into())
    }
}

impl From<std::io::Error> for TokenizerError {
    fn from(err: std::io::Error) -> Self {
        TokenizerError::Io(err.to_string().into())
    }
}

impl From<serde_json::Error> for TokenizerError {
    fn from(err: serde_json::Error) -> Self {
        TokenizerError::Json(err.to_string().into())
    }
}

impl From<std::str::Utf8Error> for TokenizerError {
    fn from(err: std::str::Utf8Error) -> Self {
        TokenizerError::InvalidUtf8 {
            valid_up_to: err.valid_up_to(),
        }
    }
}

/// Result type for tokenizer operations
pub type Result<T> = std::result::Result<T, TokenizerError>;
