/*!
 * Tokenize Output
 * Owned encode result with scoped disposal
 */

use super::handle::HandleBatch;
use crate::native::{NativeTokenizerApi, OverflowSegment, RawTokenizeOutput, TokenField};
use std::fmt;
use std::mem::ManuallyDrop;
use std::ptr;

/// Encode result whose native memory is released exactly once
///
/// Move-only. Borrowed field slices live no longer than the record, and the
/// record lives no longer than the backend that produced it. Disposal packs
/// the primary handle and, when the record has overflow segments, the
/// overflow handle into a single native call.
pub struct TokenizeOutput<'n, N: NativeTokenizerApi + ?Sized> {
    raw: RawTokenizeOutput,
    native: &'n N,
}

impl<'n, N: NativeTokenizerApi + ?Sized> TokenizeOutput<'n, N> {
    /// Adopt a record written by `native`
    ///
    /// # Safety
    /// `raw` was produced by `native`, its views are live, and nothing else
    /// will release its handles.
    #[inline]
    pub unsafe fn from_raw(native: &'n N, raw: RawTokenizeOutput) -> Self {
        Self { raw, native }
    }

    /// Give up ownership, handing the disposal obligation to the caller
    #[inline]
    pub fn into_raw(self) -> RawTokenizeOutput {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the record is moved out once
        unsafe { ptr::read(&this.raw) }
    }

    #[inline(always)]
    pub fn as_raw(&self) -> &RawTokenizeOutput {
        &self.raw
    }

    /// Token count of the primary window
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.raw.ids.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.raw.ids.is_empty()
    }

    #[inline]
    pub fn field(&self, field: TokenField) -> &[u32] {
        // SAFETY: views stay live until this record is disposed
        unsafe { self.raw.field(field).as_slice() }
    }

    #[inline]
    pub fn ids(&self) -> &[u32] {
        self.field(TokenField::Ids)
    }

    #[inline]
    pub fn attention_mask(&self) -> &[u32] {
        self.field(TokenField::AttentionMask)
    }

    #[inline]
    pub fn special_tokens_mask(&self) -> &[u32] {
        self.field(TokenField::SpecialTokensMask)
    }

    #[inline]
    pub fn token_type_ids(&self) -> &[u32] {
        self.field(TokenField::TokenTypeIds)
    }

    /// Continuation windows produced by truncation, in order
    #[inline]
    pub fn overflowing_tokens(&self) -> &[OverflowSegment] {
        // SAFETY: views stay live until this record is disposed
        unsafe { self.raw.overflowing_tokens.as_slice() }
    }

    #[inline]
    pub fn has_overflow(&self) -> bool {
        !self.raw.overflowing_tokens.is_empty()
    }

    /// `field` of the primary window followed by every overflow window
    pub fn field_segments(&self, field: TokenField) -> impl Iterator<Item = &[u32]> + '_ {
        std::iter::once(self.field(field)).chain(
            self.overflowing_tokens()
                .iter()
                // SAFETY: segment views share the record's lifetime
                .map(move |segment| unsafe { segment.field(field).as_slice() }),
        )
    }

    /// Handles this record will release
    #[inline]
    pub fn free_handles(&self) -> HandleBatch {
        HandleBatch::for_record(
            self.raw.original_output_free_handle,
            self.raw.overflowing_tokens_free_handle,
        )
    }

    /// Release the native memory now
    #[inline]
    pub fn dispose(self) {
        drop(self);
    }
}

impl<N: NativeTokenizerApi + ?Sized> Drop for TokenizeOutput<'_, N> {
    fn drop(&mut self) {
        // SAFETY: the record owns its handles and Drop runs once
        unsafe { self.free_handles().release_with(self.native) };
    }
}

impl<N: NativeTokenizerApi + ?Sized> fmt::Debug for TokenizeOutput<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenizeOutput")
            .field("ids", &self.ids())
            .field("attention_mask", &self.attention_mask())
            .field("special_tokens_mask", &self.special_tokens_mask())
            .field("token_type_ids", &self.token_type_ids())
            .field("overflow_segments", &self.overflowing_tokens().len())
            .finish()
    }
}
