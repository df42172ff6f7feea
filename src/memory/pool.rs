/*!
 * Pinned Buffer Pool
 * Reusable fixed-size byte buffers for marshalling text across the native boundary
 *
 * # Performance
 *
 * - **Steady state**: zero allocations per encode call
 * - **Growth**: one buffer per input beyond the pool size, kept for later calls
 * - **Stable addresses**: every buffer is its own allocation, so growing the
 *   index array never moves a buffer that was already handed out
 */

use super::block::MemoryBlock;
use super::buffer::NativeBuffer;
use crate::core::limits::POOL_BUFFER_ALIGNMENT;

/// Pool of fixed-capacity byte buffers owned by one tokenizer
///
/// Buffers are never freed individually; the pool releases all of them
/// exactly once when it drops. The pool never shrinks.
pub struct BufferPool {
    buffers: Vec<MemoryBlock<u8>>,
    buffer_size: usize,
}

impl BufferPool {
    /// Pre-allocate `initial_count` buffers of `buffer_size` bytes each
    pub fn new(buffer_size: usize, initial_count: usize) -> Self {
        let buffers = (0..initial_count)
            .map(|_| MemoryBlock::with_alignment(buffer_size, POOL_BUFFER_ALIGNMENT))
            .collect();

        Self {
            buffers,
            buffer_size,
        }
    }

    /// Capacity of every buffer in bytes
    #[inline(always)]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Number of buffers currently owned
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Total bytes held by the pool
    #[inline]
    pub fn total_bytes(&self) -> usize {
        self.buffers.len() * self.buffer_size
    }

    /// Start a per-call lease over the whole pool
    #[inline]
    pub fn lease(&mut self) -> PoolLease<'_> {
        PoolLease {
            pool: self,
            cursor: 0,
            grown: 0,
        }
    }

    #[cold]
    fn grow_one(&mut self) {
        self.buffers.push(MemoryBlock::with_alignment(
            self.buffer_size,
            POOL_BUFFER_ALIGNMENT,
        ));
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("buffers", &self.buffers.len())
            .field("buffer_size", &self.buffer_size)
            .finish()
    }
}

/// Per-call cursor over a [`BufferPool`]
///
/// Hands out buffers front to back and never returns the same buffer twice.
/// A handed-out view stays valid for as long as the pool lives, but its
/// contents are only meaningful until the next lease reuses the buffer, so
/// callers keep it no longer than the native call it feeds.
pub struct PoolLease<'p> {
    pool: &'p mut BufferPool,
    cursor: usize,
    grown: usize,
}

impl PoolLease<'_> {
    /// Next unused buffer, growing the pool by one when exhausted
    ///
    /// Every returned view is exactly `buffer_size` bytes long; callers route
    /// larger inputs elsewhere.
    #[inline]
    pub fn acquire(&mut self) -> NativeBuffer<u8> {
        if self.cursor == self.pool.buffers.len() {
            self.pool.grow_one();
            self.grown += 1;
        }

        let buffer = self.pool.buffers[self.cursor].buffer();
        self.cursor += 1;
        buffer
    }

    /// Buffers handed out so far in this lease
    #[inline(always)]
    pub fn acquired(&self) -> usize {
        self.cursor
    }

    /// Buffers this lease appended to the pool
    #[inline(always)]
    pub fn grown(&self) -> usize {
        self.grown
    }

    #[inline(always)]
    pub fn buffer_size(&self) -> usize {
        self.pool.buffer_size
    }
}

impl Drop for PoolLease<'_> {
    fn drop(&mut self) {
        if self.grown > 0 {
            tracing::debug!(
                grown = self.grown,
                pool_size = self.pool.buffers.len(),
                buffer_size = self.pool.buffer_size,
                "buffer pool grew past expected batch count"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_preallocates() {
        let pool = BufferPool::new(64, 4);
        assert_eq!(pool.len(), 4);
        assert_eq!(pool.buffer_size(), 64);
        assert_eq!(pool.total_bytes(), 256);
    }

    #[test]
    fn test_lease_hands_out_distinct_buffers() {
        let mut pool = BufferPool::new(32, 3);
        let mut lease = pool.lease();

        let a = lease.acquire();
        let b = lease.acquire();
        let c = lease.acquire();

        assert_ne!(a.as_ptr(), b.as_ptr());
        assert_ne!(b.as_ptr(), c.as_ptr());
        assert_ne!(a.as_ptr(), c.as_ptr());
        assert_eq!(a.len(), 32);
        assert_eq!(lease.grown(), 0);
    }

    #[test]
    fn test_lease_grows_by_one_per_extra_buffer() {
        let mut pool = BufferPool::new(16, 2);
        {
            let mut lease = pool.lease();
            for _ in 0..5 {
                lease.acquire();
            }
            assert_eq!(lease.acquired(), 5);
            assert_eq!(lease.grown(), 3);
        }
        assert_eq!(pool.len(), 5);

        // A smaller call afterwards reuses the grown pool
        {
            let mut lease = pool.lease();
            lease.acquire();
            assert_eq!(lease.grown(), 0);
        }
        assert_eq!(pool.len(), 5);
    }

    #[test]
    fn test_buffers_reused_across_leases() {
        let mut pool = BufferPool::new(8, 1);
        let first = pool.lease().acquire().as_ptr();
        let second = pool.lease().acquire().as_ptr();
        assert_eq!(first, second);
    }

    #[test]
    fn test_growth_keeps_earlier_addresses() {
        let mut pool = BufferPool::new(8, 1);
        let mut lease = pool.lease();
        let first = lease.acquire();
        unsafe { first.as_mut_slice()[0] = 0x5A };

        for _ in 0..64 {
            lease.acquire();
        }

        assert_eq!(unsafe { first.as_slice()[0] }, 0x5A);
    }

    #[test]
    fn test_buffers_are_aligned() {
        let mut pool = BufferPool::new(100, 3);
        let mut lease = pool.lease();
        for _ in 0..4 {
            assert_eq!(lease.acquire().as_ptr() as usize % POOL_BUFFER_ALIGNMENT, 0);
        }
    }
}
