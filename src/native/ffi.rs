/*!
 * Linked Native Library
 * `extern "C"` bindings to the `tokenizers_net` shared library
 */

use super::api::{FreeHandle, NativeTokenizerApi, TokenizerHandle};
use super::layout::{RawDecodeOutput, RawTokenizeOutput};
use crate::memory::{NativeBuffer, ReadOnlyNativeBuffer};
use std::ffi::c_void;
use std::mem::MaybeUninit;

#[link(name = "tokenizers_net")]
extern "C" {
    fn allocate_tokenizer(json_bytes_ptr: *const u8, json_bytes_length: usize) -> *mut c_void;

    fn free_tokenizer(tokenizer: *mut c_void);

    fn tokenizer_encode(
        tokenizer: *mut c_void,
        text: ReadOnlyNativeBuffer<u8>,
        add_special_tokens: bool,
    ) -> RawTokenizeOutput;

    fn tokenizer_encode_non_truncating(
        tokenizer: *mut c_void,
        text: ReadOnlyNativeBuffer<u8>,
        add_special_tokens: bool,
    ) -> RawTokenizeOutput;

    fn tokenizer_encode_batch(
        tokenizer: *mut c_void,
        texts: ReadOnlyNativeBuffer<ReadOnlyNativeBuffer<u8>>,
        outputs: NativeBuffer<MaybeUninit<RawTokenizeOutput>>,
        add_special_tokens: bool,
    );

    fn tokenizer_encode_batch_non_truncating(
        tokenizer: *mut c_void,
        texts: ReadOnlyNativeBuffer<ReadOnlyNativeBuffer<u8>>,
        outputs: NativeBuffer<MaybeUninit<RawTokenizeOutput>>,
        add_special_tokens: bool,
    );

    fn tokenizer_decode(tokenizer: *mut c_void, ids: ReadOnlyNativeBuffer<u32>) -> RawDecodeOutput;

    fn tokenizer_decode_skip_special_tokens(
        tokenizer: *mut c_void,
        ids: ReadOnlyNativeBuffer<u32>,
    ) -> RawDecodeOutput;

    fn ids_to_tokens(
        tokenizer: *mut c_void,
        ids: ReadOnlyNativeBuffer<u32>,
        tokens: NativeBuffer<ReadOnlyNativeBuffer<u8>>,
    ) -> FreeHandle;

    fn free_with_handle(handle: FreeHandle);

    fn free_with_multiple_handles(handles: ReadOnlyNativeBuffer<FreeHandle>);
}

/// Backend calling the linked `tokenizers_net` library
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternNative;

impl NativeTokenizerApi for ExternNative {
    unsafe fn allocate_tokenizer(
        &self,
        config: ReadOnlyNativeBuffer<u8>,
    ) -> Option<TokenizerHandle> {
        TokenizerHandle::from_raw(allocate_tokenizer(config.as_ptr(), config.len()))
    }

    unsafe fn free_tokenizer(&self, tokenizer: TokenizerHandle) {
        free_tokenizer(tokenizer.as_raw())
    }

    #[inline]
    unsafe fn encode(
        &self,
        tokenizer: TokenizerHandle,
        text: ReadOnlyNativeBuffer<u8>,
        add_special_tokens: bool,
        truncate: bool,
    ) -> RawTokenizeOutput {
        if truncate {
            tokenizer_encode(tokenizer.as_raw(), text, add_special_tokens)
        } else {
            tokenizer_encode_non_truncating(tokenizer.as_raw(), text, add_special_tokens)
        }
    }

    #[inline]
    unsafe fn encode_batch(
        &self,
        tokenizer: TokenizerHandle,
        texts: ReadOnlyNativeBuffer<ReadOnlyNativeBuffer<u8>>,
        outputs: NativeBuffer<MaybeUninit<RawTokenizeOutput>>,
        add_special_tokens: bool,
        truncate: bool,
    ) {
        if truncate {
            tokenizer_encode_batch(tokenizer.as_raw(), texts, outputs, add_special_tokens)
        } else {
            tokenizer_encode_batch_non_truncating(
                tokenizer.as_raw(),
                texts,
                outputs,
                add_special_tokens,
            )
        }
    }

    #[inline]
    unsafe fn decode(
        &self,
        tokenizer: TokenizerHandle,
        ids: ReadOnlyNativeBuffer<u32>,
        skip_special_tokens: bool,
    ) -> RawDecodeOutput {
        if skip_special_tokens {
            tokenizer_decode_skip_special_tokens(tokenizer.as_raw(), ids)
        } else {
            tokenizer_decode(tokenizer.as_raw(), ids)
        }
    }

    #[inline]
    unsafe fn ids_to_tokens(
        &self,
        tokenizer: TokenizerHandle,
        ids: ReadOnlyNativeBuffer<u32>,
        tokens: NativeBuffer<ReadOnlyNativeBuffer<u8>>,
    ) -> FreeHandle {
        ids_to_tokens(tokenizer.as_raw(), ids, tokens)
    }

    #[inline]
    unsafe fn free_with_handle(&self, handle: FreeHandle) {
        free_with_handle(handle)
    }

    #[inline]
    unsafe fn free_with_multiple_handles(&self, handles: ReadOnlyNativeBuffer<FreeHandle>) {
        free_with_multiple_handles(handles)
    }
}
