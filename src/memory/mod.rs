/*!
 * Memory Module
 * Unmanaged allocations, buffer views, pooling and SIMD kernels
 */

pub mod block;
pub mod buffer;
pub mod growable;
pub mod pool;
pub(crate) mod raw;
pub mod simd;

// Re-export for convenience
pub use block::MemoryBlock;
pub use buffer::{NativeBuffer, ReadOnlyNativeBuffer};
pub use growable::GrowableList;
pub use pool::{BufferPool, PoolLease};
pub use simd::{widen, widen_to_block};
