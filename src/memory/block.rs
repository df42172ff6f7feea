/*!
 * Memory Blocks
 * Owning, exactly-sized allocations released once on drop
 */

use super::buffer::{NativeBuffer, ReadOnlyNativeBuffer};
use super::raw;
use bytemuck::Pod;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

/// Owning allocation of `len` plain-old-data elements
///
/// The block is zero-initialized, so safe slice access is always sound.
/// It is move-only: two live owners of the same allocation cannot exist,
/// and the allocation is freed exactly once when the block drops.
///
/// # Example
///
/// ```
/// use tokenizers_bridge::memory::MemoryBlock;
///
/// let mut block = MemoryBlock::<u32>::new(4);
/// block.copy_from_slice(&[1, 2, 3, 4]);
/// assert_eq!(&*block, &[1, 2, 3, 4]);
/// // Freed here
/// ```
pub struct MemoryBlock<T: Pod> {
    ptr: NonNull<T>,
    len: usize,
    align: usize,
}

// SAFETY: the block exclusively owns its allocation, like Box<[T]>
unsafe impl<T: Pod + Send> Send for MemoryBlock<T> {}
unsafe impl<T: Pod + Sync> Sync for MemoryBlock<T> {}

impl<T: Pod> MemoryBlock<T> {
    /// Allocate `len` zeroed elements with `T`'s natural alignment
    #[inline]
    pub fn new(len: usize) -> Self {
        Self::with_alignment(len, std::mem::align_of::<T>())
    }

    /// Allocate `len` zeroed elements aligned to `align` bytes
    ///
    /// # Panics
    /// If `align` is not a power of two.
    pub fn with_alignment(len: usize, align: usize) -> Self {
        assert!(align.is_power_of_two(), "alignment must be a power of two");
        let align = align.max(std::mem::align_of::<T>());
        let ptr = raw::allocate_zeroed::<T>(len, align);
        Self { ptr, len, align }
    }

    /// Allocate and fill from a slice
    pub fn from_slice(data: &[T]) -> Self {
        let mut block = Self::new(data.len());
        block.copy_from_slice(data);
        block
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn alignment(&self) -> usize {
        self.align
    }

    /// Mutable non-owning view of the whole block
    #[inline]
    pub fn buffer(&mut self) -> NativeBuffer<T> {
        NativeBuffer::new(self.ptr.as_ptr(), self.len)
    }

    /// Read-only non-owning view of the whole block
    #[inline]
    pub fn read_only(&self) -> ReadOnlyNativeBuffer<T> {
        ReadOnlyNativeBuffer::new(self.ptr.as_ptr(), self.len)
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: owned, zero-initialized, Pod, len elements
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: owned, zero-initialized, Pod, len elements, &mut self
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Copy out into a `Vec`
    pub fn to_vec(&self) -> Vec<T> {
        self.as_slice().to_vec()
    }

    /// Release the allocation now instead of at scope exit
    #[inline]
    pub fn release(self) {
        drop(self);
    }
}

impl<T: Pod> Drop for MemoryBlock<T> {
    fn drop(&mut self) {
        // SAFETY: allocated in with_alignment with the same len and align
        unsafe { raw::free(self.ptr, self.len, self.align) };
    }
}

impl<T: Pod> Deref for MemoryBlock<T> {
    type Target = [T];

    #[inline(always)]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Pod> DerefMut for MemoryBlock<T> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Pod + fmt::Debug> fmt::Debug for MemoryBlock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBlock")
            .field("len", &self.len)
            .field("align", &self.align)
            .field("data", &self.as_slice())
            .finish()
    }
}
