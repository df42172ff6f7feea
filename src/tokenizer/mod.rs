/*!
 * Tokenizer Module
 * Builder, configuration, inputs and the marshalling tokenizer
 */

mod builder;
pub mod config;
mod input;
#[allow(clippy::module_inception)]
mod tokenizer;

pub use builder::TokenizerBuilder;
pub use config::{
    AddedToken, Padding, PaddingDirection, PaddingStrategy, TokenizerConfig, TokenizerData,
    Truncation, TruncationDirection, TruncationStrategy,
};
pub use input::EncodeInput;
pub use tokenizer::Tokenizer;
