/*!
 * Tokenizers Bridge Library
 * Allocation-minimizing marshalling between Rust callers and a native tokenizer
 *
 * Texts are staged as UTF-8 in pooled buffers, handed to the native engine
 * in one call per batch, and come back as owned records that release their
 * native memory exactly once. Overflow windows can be gathered into one
 * flat buffer, optionally widened to u64 with SIMD.
 */

pub mod core;
pub mod memory;
pub mod monitoring;
pub mod native;
pub mod outputs;
pub mod tokenizer;

// Re-exports
pub use crate::core::errors::{Result, TokenizerError};
pub use memory::{BufferPool, GrowableList, MemoryBlock, NativeBuffer, ReadOnlyNativeBuffer};
pub use monitoring::init_tracing;
pub use native::{FreeHandle, NativeTokenizerApi, TokenField, TokenizerHandle};
#[cfg(feature = "native")]
pub use native::ExternNative;
pub use outputs::{DecodeOutput, HandleBatch, NativeAllocation, TokenizeOutput};
pub use tokenizer::{EncodeInput, Tokenizer, TokenizerBuilder, TokenizerConfig, TokenizerData};
