/*!
 * SIMD Widening Tests
 * Tests for the vectorized u32 -> u64 widening kernels
 */

use proptest::prelude::*;
use tokenizers_bridge::memory::simd::{capabilities, detect_simd_support, init_simd};
use tokenizers_bridge::memory::{widen, widen_to_block};
use tokenizers_bridge::TokenizerError;

#[test]
fn test_simd_capabilities() {
    let caps = init_simd();

    // On x86_64, at least SSE2 should be available
    #[cfg(target_arch = "x86_64")]
    {
        assert!(caps.sse2);
    }

    // On aarch64, NEON should be available
    #[cfg(target_arch = "aarch64")]
    {
        assert!(caps.neon);
    }

    assert_eq!(*caps, detect_simd_support());
    assert_eq!(*capabilities(), *caps);
}

#[test]
fn test_widen_small() {
    let src = [1u32, 2, 3];
    let mut dst = [0u64; 3];

    widen(&src, &mut dst).unwrap();

    assert_eq!(dst, [1, 2, 3]);
}

#[test]
fn test_widen_extremes() {
    let src = [u32::MAX, 0, u32::MAX - 1, 1, 0x8000_0000, 7, 8, 9, u32::MAX];
    let block = widen_to_block(&src);

    let expected: Vec<u64> = src.iter().map(|&v| v as u64).collect();
    assert_eq!(block.to_vec(), expected);
}

#[test]
fn test_widen_large() {
    let src: Vec<u32> = (0..10_000).map(|i| i * 7919).collect();
    let mut dst = vec![0u64; src.len() + 5];

    widen(&src, &mut dst).unwrap();

    for (i, &v) in src.iter().enumerate() {
        assert_eq!(dst[i], v as u64);
    }
    // Destination tail beyond the source is untouched
    assert!(dst[src.len()..].iter().all(|&v| v == 0));
}

#[test]
fn test_widen_short_destination() {
    let src = [1u32; 9];
    let mut dst = [0u64; 8];

    let err = widen(&src, &mut dst).unwrap_err();

    assert!(matches!(
        err,
        TokenizerError::BufferTooSmall {
            required: 9,
            actual: 8
        }
    ));
}

proptest! {
    #[test]
    fn prop_widen_matches_cast(src in prop::collection::vec(any::<u32>(), 0..300)) {
        let mut dst = vec![0u64; src.len()];
        widen(&src, &mut dst).unwrap();

        let expected: Vec<u64> = src.iter().map(|&v| u64::from(v)).collect();
        prop_assert_eq!(dst, expected);
    }

    #[test]
    fn prop_widen_unaligned_views(
        src in prop::collection::vec(any::<u32>(), 1..100),
        skip in 0usize..8,
    ) {
        let skip = skip.min(src.len());
        let view = &src[skip..];
        let block = widen_to_block(view);

        prop_assert_eq!(block.len(), view.len());
        for (&wide, &narrow) in block.iter().zip(view) {
            prop_assert_eq!(wide, u64::from(narrow));
        }
    }
}
