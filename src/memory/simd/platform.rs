/*!
 * Platform-specific SIMD Detection
 * Detects the instruction sets the widen kernels can use
 */

/// SIMD capabilities available on the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimdCapabilities {
    /// SSE2 support (x86/x86_64)
    pub sse2: bool,
    /// AVX2 support (x86/x86_64)
    pub avx2: bool,
    /// NEON support (ARM)
    pub neon: bool,
}

impl SimdCapabilities {
    /// Capabilities with every vector path disabled
    pub const fn scalar() -> Self {
        Self {
            sse2: false,
            avx2: false,
            neon: false,
        }
    }

    /// Number of u32 lanes the widest available widen kernel consumes per step
    pub const fn vector_lanes(&self) -> usize {
        if self.avx2 {
            8
        } else if self.sse2 || self.neon {
            4
        } else {
            1
        }
    }

    /// Name of the widen kernel that dispatch will select
    pub const fn kernel_name(&self) -> &'static str {
        if self.avx2 {
            "avx2"
        } else if self.sse2 {
            "sse2"
        } else if self.neon {
            "neon"
        } else {
            "scalar"
        }
    }
}

/// Detect available SIMD instruction sets
pub fn detect_simd_support() -> SimdCapabilities {
    #[cfg(target_arch = "x86_64")]
    {
        SimdCapabilities {
            sse2: is_x86_feature_detected!("sse2"),
            avx2: is_x86_feature_detected!("avx2"),
            neon: false,
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        SimdCapabilities {
            sse2: false,
            avx2: false,
            neon: std::arch::is_aarch64_feature_detected!("neon"),
        }
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        SimdCapabilities::scalar()
    }
}
