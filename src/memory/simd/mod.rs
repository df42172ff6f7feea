/*!
 * SIMD-Accelerated Operations
 *
 * Integer widening for id tensors with automatic CPU feature detection.
 */

mod platform;
mod widen;

// CPU detection
pub use platform::{detect_simd_support, SimdCapabilities};

// Widening
pub use widen::{widen, widen_to_block};
pub(crate) use widen::widen_into;

use std::sync::OnceLock;

/// Global SIMD capabilities
static SIMD_CAPS: OnceLock<SimdCapabilities> = OnceLock::new();

/// Initialize SIMD capabilities detection, logging the result once
pub fn init_simd() -> &'static SimdCapabilities {
    SIMD_CAPS.get_or_init(|| {
        let caps = platform::detect_simd_support();
        tracing::info!(
            sse2 = caps.sse2,
            avx2 = caps.avx2,
            neon = caps.neon,
            widen_kernel = caps.kernel_name(),
            vector_lanes = caps.vector_lanes(),
            "SIMD capabilities detected"
        );
        caps
    })
}

/// Get SIMD capabilities
#[inline]
pub fn capabilities() -> &'static SimdCapabilities {
    SIMD_CAPS.get_or_init(platform::detect_simd_support)
}
