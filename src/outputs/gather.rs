/*!
 * Overflow Gather
 * Flattens a primary window and its overflow windows into one buffer
 *
 * Every field is gathered independently. The copy is verbatim, or widened
 * to u64 in the same pass for consumers that need 64-bit id tensors.
 */

use super::tokenize::TokenizeOutput;
use crate::core::errors::{Result, TokenizerError};
use crate::memory::simd::widen_into;
use crate::memory::MemoryBlock;
use crate::native::{NativeTokenizerApi, TokenField};

impl<N: NativeTokenizerApi + ?Sized> TokenizeOutput<'_, N> {
    /// Element count `field` flattens to
    ///
    /// With a primary length `L` and `K` overflow windows of the same length
    /// this is `L * (K + 1)`.
    #[inline]
    pub fn gathered_len(&self, field: TokenField) -> usize {
        self.field_segments(field).map(<[u32]>::len).sum()
    }

    /// Copy `field` of every window into `dst`, returning the element count
    ///
    /// # Errors
    /// `BufferTooSmall` when `dst` cannot hold the whole sequence.
    pub fn gather(&self, field: TokenField, dst: &mut [u32]) -> Result<usize> {
        let total = self.gathered_len(field);
        if dst.len() < total {
            return Err(TokenizerError::buffer_too_small(total, dst.len()));
        }

        self.gather_into(field, dst);
        Ok(total)
    }

    /// Gather into an exactly-sized block
    pub fn gather_to_block(&self, field: TokenField) -> MemoryBlock<u32> {
        let mut block = MemoryBlock::new(self.gathered_len(field));
        self.gather_into(field, &mut block);
        block
    }

    /// Like [`Self::gather`], widening each element to u64
    ///
    /// # Errors
    /// `BufferTooSmall` when `dst` cannot hold the whole sequence.
    pub fn gather_and_widen(&self, field: TokenField, dst: &mut [u64]) -> Result<usize> {
        let total = self.gathered_len(field);
        if dst.len() < total {
            return Err(TokenizerError::buffer_too_small(total, dst.len()));
        }

        self.gather_and_widen_into(field, dst);
        Ok(total)
    }

    /// Gather and widen into an exactly-sized block
    pub fn gather_and_widen_to_block(&self, field: TokenField) -> MemoryBlock<u64> {
        let mut block = MemoryBlock::new(self.gathered_len(field));
        self.gather_and_widen_into(field, &mut block);
        block
    }

    // Capacity already validated by the caller
    #[inline]
    fn gather_into(&self, field: TokenField, dst: &mut [u32]) {
        let mut offset = 0;
        for segment in self.field_segments(field) {
            let end = offset + segment.len();
            dst[offset..end].copy_from_slice(segment);
            offset = end;
        }
    }

    #[inline]
    fn gather_and_widen_into(&self, field: TokenField, dst: &mut [u64]) {
        let mut offset = 0;
        for segment in self.field_segments(field) {
            let end = offset + segment.len();
            widen_into(segment, &mut dst[offset..end]);
            offset = end;
        }
    }
}
