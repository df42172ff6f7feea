/*!
 * Vectorized Widening
 * Lossless u32 -> u64 conversion with AVX2/SSE2/NEON kernels
 *
 * Each kernel walks the source in whole vectors. A remainder shorter than
 * one vector is handled by running the last vector again so it ends exactly
 * at the source end; the overlapping lanes are stored twice with the same
 * values. Sources shorter than one vector take the scalar path.
 */

#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
use super::capabilities;
use crate::core::errors::{Result, TokenizerError};
use crate::memory::block::MemoryBlock;

/// Widen every element of `src` into the front of `dst`
///
/// # Errors
/// `BufferTooSmall` when `dst` is shorter than `src`. Nothing is written in
/// that case.
///
/// # Example
///
/// ```
/// use tokenizers_bridge::memory::simd::widen;
///
/// let src = [1u32, u32::MAX, 7];
/// let mut dst = [0u64; 4];
/// widen(&src, &mut dst).unwrap();
/// assert_eq!(dst, [1, u32::MAX as u64, 7, 0]);
/// ```
pub fn widen(src: &[u32], dst: &mut [u64]) -> Result<()> {
    if dst.len() < src.len() {
        return Err(TokenizerError::buffer_too_small(src.len(), dst.len()));
    }

    widen_into(src, dst);
    Ok(())
}

/// Widen into a freshly allocated, exactly-sized block
pub fn widen_to_block(src: &[u32]) -> MemoryBlock<u64> {
    let mut block = MemoryBlock::new(src.len());
    widen_into(src, &mut block);
    block
}

/// Widen without validating capacity
///
/// Callers have already sized `dst` to hold `src`.
#[inline]
pub(crate) fn widen_into(src: &[u32], dst: &mut [u64]) {
    debug_assert!(dst.len() >= src.len());
    let dst = &mut dst[..src.len()];

    #[cfg(target_arch = "x86_64")]
    {
        let caps = capabilities();
        if caps.avx2 && src.len() >= 8 {
            unsafe {
                return widen_avx2(src, dst);
            }
        }
        if caps.sse2 && src.len() >= 4 {
            unsafe {
                return widen_sse2(src, dst);
            }
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        if capabilities().neon && src.len() >= 4 {
            unsafe {
                return widen_neon(src, dst);
            }
        }
    }

    widen_scalar(src, dst);
}

/// Element-by-element fallback
#[inline]
pub(crate) fn widen_scalar(src: &[u32], dst: &mut [u64]) {
    for (out, &value) in dst.iter_mut().zip(src) {
        *out = u64::from(value);
    }
}

/// Start offsets of every vector step, ending with the re-run tail vector
///
/// Requires `len >= lanes`.
#[inline(always)]
#[allow(dead_code)]
fn block_offsets(len: usize, lanes: usize) -> impl Iterator<Item = usize> {
    let full = len / lanes;
    let tail = (len % lanes != 0).then(|| len - lanes);
    (0..full).map(move |block| block * lanes).chain(tail)
}

// x86_64 AVX2 implementation
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn widen_avx2(src: &[u32], dst: &mut [u64]) {
    use std::arch::x86_64::*;

    let src_ptr = src.as_ptr();
    let dst_ptr = dst.as_mut_ptr();

    // 8 u32 in, two vectors of 4 u64 out
    for offset in block_offsets(src.len(), 8) {
        let lo = _mm_loadu_si128(src_ptr.add(offset) as *const __m128i);
        let hi = _mm_loadu_si128(src_ptr.add(offset + 4) as *const __m128i);

        _mm256_storeu_si256(
            dst_ptr.add(offset) as *mut __m256i,
            _mm256_cvtepu32_epi64(lo),
        );
        _mm256_storeu_si256(
            dst_ptr.add(offset + 4) as *mut __m256i,
            _mm256_cvtepu32_epi64(hi),
        );
    }
}

// x86_64 SSE2 implementation
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
unsafe fn widen_sse2(src: &[u32], dst: &mut [u64]) {
    use std::arch::x86_64::*;

    let src_ptr = src.as_ptr();
    let dst_ptr = dst.as_mut_ptr();
    let zero = _mm_setzero_si128();

    // Interleaving with zero lanes zero-extends each u32
    for offset in block_offsets(src.len(), 4) {
        let values = _mm_loadu_si128(src_ptr.add(offset) as *const __m128i);

        _mm_storeu_si128(
            dst_ptr.add(offset) as *mut __m128i,
            _mm_unpacklo_epi32(values, zero),
        );
        _mm_storeu_si128(
            dst_ptr.add(offset + 2) as *mut __m128i,
            _mm_unpackhi_epi32(values, zero),
        );
    }
}

// aarch64 NEON implementation
#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
unsafe fn widen_neon(src: &[u32], dst: &mut [u64]) {
    use std::arch::aarch64::*;

    let src_ptr = src.as_ptr();
    let dst_ptr = dst.as_mut_ptr();

    for offset in block_offsets(src.len(), 4) {
        let values = vld1q_u32(src_ptr.add(offset));

        vst1q_u64(dst_ptr.add(offset), vmovl_u32(vget_low_u32(values)));
        vst1q_u64(dst_ptr.add(offset + 2), vmovl_high_u32(values));
    }
}
