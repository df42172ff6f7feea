/*!
 * Limits and Constants
 *
 * Centralized location for defaults, thresholds, and stack capacities.
 * Performance-critical constants are marked with [PERF].
 */

// =============================================================================
// CONFIGURATION DEFAULTS
// =============================================================================

/// Default expected maximum input length, in characters
/// Drives the pool buffer size and the single-encode pool/one-off threshold
pub const DEFAULT_EXPECTED_MAX_INPUT_LENGTH: u32 = 1024;

/// Default expected maximum batch count
/// Drives the initial number of pool buffers
pub const DEFAULT_EXPECTED_MAX_BATCHES: u32 = 16;

// =============================================================================
// BUFFER POOL
// =============================================================================

/// Alignment of every pool buffer (two 64-byte cache lines)
/// [PERF] Keeps vector loads on the native side from straddling cache lines
pub const POOL_BUFFER_ALIGNMENT: usize = 128;

/// Worst-case UTF-8 bytes produced per input character
pub const MAX_UTF8_BYTES_PER_CHAR: usize = 3;

// =============================================================================
// STACK-FIRST SCRATCH CAPACITIES
// =============================================================================

/// Byte views kept on the stack for a batch before spilling to the heap
/// [PERF] Covers DEFAULT_EXPECTED_MAX_BATCHES twice over
pub const BATCH_VIEWS_STACK_CAPACITY: usize = 32;

/// One-off allocations tracked on the stack per batch call
/// Oversized inputs are rare, so this stays small
pub const ONE_OFF_STACK_CAPACITY: usize = 4;

/// Narrowed ids kept on the stack when decoding 64-bit ids
pub const DECODE_NARROW_STACK_CAPACITY: usize = 512;

/// Token views kept on the stack for ids-to-tokens
pub const TOKEN_VIEWS_STACK_CAPACITY: usize = 64;

// =============================================================================
// DISPOSAL
// =============================================================================

/// Maximum number of free handles carried by a single native result
/// (primary output plus overflow segment array)
pub const MAX_FREE_HANDLES_PER_RESULT: usize = 2;

/// Worst-case UTF-8 byte count for `chars` UTF-16 code units
///
/// One extra slot covers a dangling high surrogate. Returns `None` on overflow.
#[inline]
pub const fn max_utf8_byte_count(chars: usize) -> Option<usize> {
    match chars.checked_add(1) {
        Some(slots) => slots.checked_mul(MAX_UTF8_BYTES_PER_CHAR),
        None => None,
    }
}
