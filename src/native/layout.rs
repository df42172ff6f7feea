/*!
 * Boundary Layouts
 * `#[repr(C)]` records exchanged with the native tokenizer
 *
 * Field order is fixed: pointer + length pairs for every buffer, followed by
 * the trailing free handle(s).
 */

use super::api::FreeHandle;
use crate::memory::ReadOnlyNativeBuffer;

/// The four per-token integer fields every encode result carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenField {
    Ids,
    AttentionMask,
    SpecialTokensMask,
    TokenTypeIds,
}

impl TokenField {
    pub const ALL: [TokenField; 4] = [
        TokenField::Ids,
        TokenField::AttentionMask,
        TokenField::SpecialTokensMask,
        TokenField::TokenTypeIds,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            TokenField::Ids => "ids",
            TokenField::AttentionMask => "attention_mask",
            TokenField::SpecialTokensMask => "special_tokens_mask",
            TokenField::TokenTypeIds => "token_type_ids",
        }
    }
}

/// One continuation window produced by truncation
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct OverflowSegment {
    pub ids: ReadOnlyNativeBuffer<u32>,
    pub attention_mask: ReadOnlyNativeBuffer<u32>,
    pub special_tokens_mask: ReadOnlyNativeBuffer<u32>,
    pub token_type_ids: ReadOnlyNativeBuffer<u32>,
}

impl OverflowSegment {
    #[inline(always)]
    pub fn field(&self, field: TokenField) -> ReadOnlyNativeBuffer<u32> {
        match field {
            TokenField::Ids => self.ids,
            TokenField::AttentionMask => self.attention_mask,
            TokenField::SpecialTokensMask => self.special_tokens_mask,
            TokenField::TokenTypeIds => self.token_type_ids,
        }
    }
}

/// Encode result exactly as the native side writes it
///
/// Not `Copy`: a raw record carries a disposal obligation. Wrap it in
/// [`crate::outputs::TokenizeOutput`] to have that obligation discharged.
#[repr(C)]
#[derive(Debug, Default)]
pub struct RawTokenizeOutput {
    pub ids: ReadOnlyNativeBuffer<u32>,
    pub attention_mask: ReadOnlyNativeBuffer<u32>,
    pub special_tokens_mask: ReadOnlyNativeBuffer<u32>,
    pub token_type_ids: ReadOnlyNativeBuffer<u32>,
    pub overflowing_tokens: ReadOnlyNativeBuffer<OverflowSegment>,
    pub original_output_free_handle: FreeHandle,
    pub overflowing_tokens_free_handle: FreeHandle,
}

impl RawTokenizeOutput {
    #[inline(always)]
    pub fn field(&self, field: TokenField) -> ReadOnlyNativeBuffer<u32> {
        match field {
            TokenField::Ids => self.ids,
            TokenField::AttentionMask => self.attention_mask,
            TokenField::SpecialTokensMask => self.special_tokens_mask,
            TokenField::TokenTypeIds => self.token_type_ids,
        }
    }
}

/// Decode result: UTF-8 bytes plus the handle that frees them
#[repr(C)]
#[derive(Debug, Default)]
pub struct RawDecodeOutput {
    pub text: ReadOnlyNativeBuffer<u8>,
    pub free_handle: FreeHandle,
}
