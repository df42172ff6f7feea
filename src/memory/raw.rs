/*!
 * Raw Allocation Layer
 * Thin alloc/realloc/free over the global allocator
 *
 * Every function here treats allocation failure as fatal and routes it to
 * `handle_alloc_error`. Zero-sized requests never touch the allocator and
 * hand back a dangling, well-aligned pointer instead.
 */

use std::alloc::{self, Layout};
use std::ptr::NonNull;

/// Layout for `len` elements of `T` at `align` (at least `T`'s own alignment)
#[inline]
pub(crate) fn array_layout<T>(len: usize, align: usize) -> Layout {
    let align = align.max(std::mem::align_of::<T>());
    let size = std::mem::size_of::<T>()
        .checked_mul(len)
        .unwrap_or_else(|| capacity_overflow());
    Layout::from_size_align(size, align).unwrap_or_else(|_| capacity_overflow())
}

#[cold]
#[inline(never)]
fn capacity_overflow() -> ! {
    panic!("allocation size overflow");
}

#[inline]
fn dangling<T>(align: usize) -> NonNull<T> {
    // Non-null and aligned for both T and the requested alignment
    let align = align.max(std::mem::align_of::<T>());
    NonNull::new(align as *mut T).unwrap_or(NonNull::dangling())
}

/// Allocate uninitialized storage for `len` elements of `T`
pub(crate) fn allocate<T>(len: usize, align: usize) -> NonNull<T> {
    let layout = array_layout::<T>(len, align);
    if layout.size() == 0 {
        return dangling(layout.align());
    }

    // SAFETY: layout has a non-zero size
    let ptr = unsafe { alloc::alloc(layout) };
    match NonNull::new(ptr as *mut T) {
        Some(ptr) => ptr,
        None => alloc::handle_alloc_error(layout),
    }
}

/// Allocate zero-filled storage for `len` elements of `T`
pub(crate) fn allocate_zeroed<T>(len: usize, align: usize) -> NonNull<T> {
    let layout = array_layout::<T>(len, align);
    if layout.size() == 0 {
        return dangling(layout.align());
    }

    // SAFETY: layout has a non-zero size
    let ptr = unsafe { alloc::alloc_zeroed(layout) };
    match NonNull::new(ptr as *mut T) {
        Some(ptr) => ptr,
        None => alloc::handle_alloc_error(layout),
    }
}

/// Grow or shrink an allocation made by [`allocate`] with the same alignment
///
/// # Safety
/// `ptr` must come from [`allocate`]/[`allocate_zeroed`] (or a previous
/// `reallocate`) with `old_len` elements and the same `align`. The old
/// pointer must not be used afterwards.
pub(crate) unsafe fn reallocate<T>(
    ptr: NonNull<T>,
    old_len: usize,
    new_len: usize,
    align: usize,
) -> NonNull<T> {
    let old_layout = array_layout::<T>(old_len, align);
    let new_layout = array_layout::<T>(new_len, align);

    if old_layout.size() == 0 {
        return allocate(new_len, align);
    }
    if new_layout.size() == 0 {
        free(ptr, old_len, align);
        return dangling(new_layout.align());
    }

    let raw = alloc::realloc(ptr.as_ptr() as *mut u8, old_layout, new_layout.size());
    match NonNull::new(raw as *mut T) {
        Some(ptr) => ptr,
        None => alloc::handle_alloc_error(new_layout),
    }
}

/// Release an allocation made by [`allocate`]
///
/// # Safety
/// `ptr` must come from this module with `len` elements and `align`, and
/// must not be freed twice.
pub(crate) unsafe fn free<T>(ptr: NonNull<T>, len: usize, align: usize) {
    let layout = array_layout::<T>(len, align);
    if layout.size() != 0 {
        alloc::dealloc(ptr.as_ptr() as *mut u8, layout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_respects_alignment() {
        let ptr = allocate::<u8>(300, 128);
        assert_eq!(ptr.as_ptr() as usize % 128, 0);
        unsafe { free(ptr, 300, 128) };
    }

    #[test]
    fn test_zero_sized_allocation_is_dangling() {
        let ptr = allocate::<u64>(0, 1);
        assert_eq!(ptr.as_ptr() as usize % std::mem::align_of::<u64>(), 0);
        unsafe { free(ptr, 0, 1) };
    }

    #[test]
    fn test_allocate_zeroed() {
        let ptr = allocate_zeroed::<u32>(64, 1);
        let slice = unsafe { std::slice::from_raw_parts(ptr.as_ptr(), 64) };
        assert!(slice.iter().all(|&v| v == 0));
        unsafe { free(ptr, 64, 1) };
    }

    #[test]
    fn test_reallocate_preserves_prefix() {
        let ptr = allocate::<u32>(4, 1);
        unsafe {
            for i in 0..4 {
                ptr.as_ptr().add(i).write(i as u32 * 10);
            }
            let grown = reallocate(ptr, 4, 16, 1);
            let slice = std::slice::from_raw_parts(grown.as_ptr(), 4);
            assert_eq!(slice, &[0, 10, 20, 30]);
            free(grown, 16, 1);
        }
    }
}
