/*!
 * Native Tokenizer API
 * The boundary the marshalling core calls into
 *
 * Every method is `unsafe`: callers guarantee that each view points at live
 * memory of the stated length for the duration of the call, and that output
 * views have room for the records the call writes.
 */

use super::layout::{RawDecodeOutput, RawTokenizeOutput};
use crate::memory::{NativeBuffer, ReadOnlyNativeBuffer};
use std::ffi::c_void;
use std::fmt;
use std::mem::MaybeUninit;
use std::ptr::{self, NonNull};

/// Opaque token naming a block of native memory
///
/// Only the native side knows how to release it. The null value means "no
/// handle".
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FreeHandle(*mut c_void);

// SAFETY: a handle is an opaque token; the native side owns what it names
unsafe impl Send for FreeHandle {}
unsafe impl Sync for FreeHandle {}

impl FreeHandle {
    pub const EMPTY: FreeHandle = FreeHandle(ptr::null_mut());

    #[inline(always)]
    pub const fn from_raw(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    #[inline(always)]
    pub const fn as_raw(self) -> *mut c_void {
        self.0
    }

    #[inline(always)]
    pub fn is_empty(self) -> bool {
        self.0.is_null()
    }
}

impl Default for FreeHandle {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for FreeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("FreeHandle(empty)")
        } else {
            write!(f, "FreeHandle({:p})", self.0)
        }
    }
}

/// Opaque native tokenizer instance
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenizerHandle(NonNull<c_void>);

// SAFETY: encode/decode treat the native tokenizer as read-only state
unsafe impl Send for TokenizerHandle {}

impl TokenizerHandle {
    /// Wrap a raw tokenizer pointer, `None` when null
    #[inline]
    pub fn from_raw(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    #[inline(always)]
    pub fn as_raw(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

impl fmt::Debug for TokenizerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenizerHandle({:p})", self.0)
    }
}

/// One method per native entry point
///
/// Truncation is chosen per call; implementations route it to the
/// truncating or non-truncating entry point.
pub trait NativeTokenizerApi {
    /// Create a tokenizer from serialized config bytes
    ///
    /// # Safety
    /// `config` must be readable for its full length.
    unsafe fn allocate_tokenizer(&self, config: ReadOnlyNativeBuffer<u8>)
        -> Option<TokenizerHandle>;

    /// # Safety
    /// `tokenizer` came from [`Self::allocate_tokenizer`] and is freed once.
    unsafe fn free_tokenizer(&self, tokenizer: TokenizerHandle);

    /// Encode one UTF-8 text
    ///
    /// # Safety
    /// `text` must be readable UTF-8 for its full length.
    unsafe fn encode(
        &self,
        tokenizer: TokenizerHandle,
        text: ReadOnlyNativeBuffer<u8>,
        add_special_tokens: bool,
        truncate: bool,
    ) -> RawTokenizeOutput;

    /// Encode `texts`, writing one record per text into `outputs` in order
    ///
    /// # Safety
    /// Every text view must be readable UTF-8 and `outputs` must hold exactly
    /// `texts.len()` writable slots.
    unsafe fn encode_batch(
        &self,
        tokenizer: TokenizerHandle,
        texts: ReadOnlyNativeBuffer<ReadOnlyNativeBuffer<u8>>,
        outputs: NativeBuffer<MaybeUninit<RawTokenizeOutput>>,
        add_special_tokens: bool,
        truncate: bool,
    );

    /// # Safety
    /// `ids` must be readable for its full length.
    unsafe fn decode(
        &self,
        tokenizer: TokenizerHandle,
        ids: ReadOnlyNativeBuffer<u32>,
        skip_special_tokens: bool,
    ) -> RawDecodeOutput;

    /// Resolve each id to its token text, writing one view per id
    ///
    /// The returned handle backs every written view.
    ///
    /// # Safety
    /// `tokens` must have at least `ids.len()` writable slots.
    unsafe fn ids_to_tokens(
        &self,
        tokenizer: TokenizerHandle,
        ids: ReadOnlyNativeBuffer<u32>,
        tokens: NativeBuffer<ReadOnlyNativeBuffer<u8>>,
    ) -> FreeHandle;

    /// # Safety
    /// `handle` is non-empty and has not been freed before.
    unsafe fn free_with_handle(&self, handle: FreeHandle);

    /// Release several handles in one call
    ///
    /// # Safety
    /// Every handle is non-empty and has not been freed before.
    unsafe fn free_with_multiple_handles(&self, handles: ReadOnlyNativeBuffer<FreeHandle>);
}

impl<N: NativeTokenizerApi + ?Sized> NativeTokenizerApi for &N {
    unsafe fn allocate_tokenizer(
        &self,
        config: ReadOnlyNativeBuffer<u8>,
    ) -> Option<TokenizerHandle> {
        (**self).allocate_tokenizer(config)
    }

    unsafe fn free_tokenizer(&self, tokenizer: TokenizerHandle) {
        (**self).free_tokenizer(tokenizer)
    }

    unsafe fn encode(
        &self,
        tokenizer: TokenizerHandle,
        text: ReadOnlyNativeBuffer<u8>,
        add_special_tokens: bool,
        truncate: bool,
    ) -> RawTokenizeOutput {
        (**self).encode(tokenizer, text, add_special_tokens, truncate)
    }

    unsafe fn encode_batch(
        &self,
        tokenizer: TokenizerHandle,
        texts: ReadOnlyNativeBuffer<ReadOnlyNativeBuffer<u8>>,
        outputs: NativeBuffer<MaybeUninit<RawTokenizeOutput>>,
        add_special_tokens: bool,
        truncate: bool,
    ) {
        (**self).encode_batch(tokenizer, texts, outputs, add_special_tokens, truncate)
    }

    unsafe fn decode(
        &self,
        tokenizer: TokenizerHandle,
        ids: ReadOnlyNativeBuffer<u32>,
        skip_special_tokens: bool,
    ) -> RawDecodeOutput {
        (**self).decode(tokenizer, ids, skip_special_tokens)
    }

    unsafe fn ids_to_tokens(
        &self,
        tokenizer: TokenizerHandle,
        ids: ReadOnlyNativeBuffer<u32>,
        tokens: NativeBuffer<ReadOnlyNativeBuffer<u8>>,
    ) -> FreeHandle {
        (**self).ids_to_tokens(tokenizer, ids, tokens)
    }

    unsafe fn free_with_handle(&self, handle: FreeHandle) {
        (**self).free_with_handle(handle)
    }

    unsafe fn free_with_multiple_handles(&self, handles: ReadOnlyNativeBuffer<FreeHandle>) {
        (**self).free_with_multiple_handles(handles)
    }
}
