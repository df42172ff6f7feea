/*!
 * Outputs Module
 * Owned encode/decode results, overflow gather and handle disposal
 */

mod decode;
mod gather;
mod handle;
mod tokenize;

pub use decode::DecodeOutput;
pub use handle::{HandleBatch, NativeAllocation};
pub use tokenize::TokenizeOutput;
