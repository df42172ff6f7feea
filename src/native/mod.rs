/*!
 * Native Boundary
 * Entry-point trait, handle types and record layouts
 */

pub mod api;
#[cfg(feature = "native")]
pub mod ffi;
pub mod layout;

pub use api::{FreeHandle, NativeTokenizerApi, TokenizerHandle};
#[cfg(feature = "native")]
pub use ffi::ExternNative;
pub use layout::{OverflowSegment, RawDecodeOutput, RawTokenizeOutput, TokenField};
