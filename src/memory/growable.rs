/*!
 * Stack-First Growable List
 * Append-only list that starts on caller memory and spills to the heap
 *
 * # Performance
 *
 * - **Common case**: zero heap allocations, storage lives on the caller's stack
 * - **Overflow**: capacity doubles, amortized O(1) append
 * - **Spill is one-way**: once on the heap the list never returns to the stack
 */

use super::raw;
use std::fmt;
use std::mem::MaybeUninit;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};

enum Storage<'a, T> {
    /// Caller-owned region, never freed by the list
    External(&'a mut [MaybeUninit<T>]),
    /// Heap region owned by the list
    Heap { ptr: NonNull<T>, capacity: usize },
}

/// Growable list backed first by an external region
///
/// # Example
///
/// ```
/// use std::mem::MaybeUninit;
/// use tokenizers_bridge::memory::GrowableList;
///
/// let mut scratch = [const { MaybeUninit::<u32>::uninit() }; 2];
/// let mut list = GrowableList::new(&mut scratch);
/// list.push(1);
/// list.push(2);
/// assert!(!list.is_spilled());
///
/// list.push(3); // spills, capacity doubles to 4
/// assert!(list.is_spilled());
/// assert_eq!(list.capacity(), 4);
/// assert_eq!(list.as_slice(), &[1, 2, 3]);
/// ```
pub struct GrowableList<'a, T> {
    storage: Storage<'a, T>,
    len: usize,
}

impl<'a, T> GrowableList<'a, T> {
    /// Bind a new empty list to `region`
    ///
    /// Elements still in the region when the list drops are dropped; the
    /// region itself stays with the caller.
    #[inline]
    pub fn new(region: &'a mut [MaybeUninit<T>]) -> Self {
        Self {
            storage: Storage::External(region),
            len: 0,
        }
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
    pub fn capacity(&self) -> usize {
        match &self.storage {
            Storage::External(region) => region.len(),
            Storage::Heap { capacity, .. } => *capacity,
        }
    }

    /// True once the list has moved to heap storage it owns
    #[inline(always)]
    pub fn is_spilled(&self) -> bool {
        matches!(self.storage, Storage::Heap { .. })
    }

    #[inline(always)]
    fn as_ptr(&self) -> *const T {
        match &self.storage {
            Storage::External(region) => region.as_ptr() as *const T,
            Storage::Heap { ptr, .. } => ptr.as_ptr(),
        }
    }

    #[inline(always)]
    pub(crate) fn as_mut_ptr(&mut self) -> *mut T {
        match &mut self.storage {
            Storage::External(region) => region.as_mut_ptr() as *mut T,
            Storage::Heap { ptr, .. } => ptr.as_ptr(),
        }
    }

    /// Append one element, growing the storage when full
    #[inline]
    pub fn push(&mut self, item: T) {
        if self.len == self.capacity() {
            self.grow();
        }

        // SAFETY: len < capacity after grow, slot is uninitialized
        unsafe { self.as_mut_ptr().add(self.len).write(item) };
        self.len += 1;
    }

    #[cold]
    #[inline(never)]
    fn grow(&mut self) {
        let old_capacity = self.capacity();
        // Saturation is caught by the layout check in raw
        let new_capacity = old_capacity.saturating_mul(2).max(1);
        let align = std::mem::align_of::<T>();

        match &mut self.storage {
            Storage::External(region) => {
                let new_ptr = raw::allocate::<T>(new_capacity, align);
                // SAFETY: first len slots of the region are initialized and the
                // fresh allocation cannot overlap caller memory
                unsafe {
                    ptr::copy_nonoverlapping(
                        region.as_ptr() as *const T,
                        new_ptr.as_ptr(),
                        self.len,
                    );
                }
                self.storage = Storage::Heap {
                    ptr: new_ptr,
                    capacity: new_capacity,
                };
            }
            Storage::Heap { ptr, capacity } => {
                // SAFETY: ptr was allocated by raw with `capacity` elements
                *ptr = unsafe { raw::reallocate(*ptr, *capacity, new_capacity, align) };
                *capacity = new_capacity;
            }
        }

        tracing::trace!(
            old_capacity,
            new_capacity,
            "stack-first list grew"
        );
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: first len slots are initialized
        unsafe { std::slice::from_raw_parts(self.as_ptr(), self.len) }
    }

    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let len = self.len;
        // SAFETY: first len slots are initialized
        unsafe { std::slice::from_raw_parts_mut(self.as_mut_ptr(), len) }
    }

    /// Drop every element, keeping the current storage
    pub fn clear(&mut self) {
        let len = self.len;
        // Leak rather than double-drop if an element's Drop panics
        self.len = 0;
        // SAFETY: the first len slots were initialized
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.as_mut_ptr(), len));
        }
    }
}

impl<T: Clone> GrowableList<'_, T> {
    /// Append `count` clones of `value`
    pub fn extend_with(&mut self, count: usize, value: T) {
        for _ in 0..count {
            self.push(value.clone());
        }
    }
}

impl<T> Extend<T> for GrowableList<'_, T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<T> Deref for GrowableList<'_, T> {
    type Target = [T];

    #[inline(always)]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for GrowableList<'_, T> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T> Drop for GrowableList<'_, T> {
    fn drop(&mut self) {
        self.clear();

        if let Storage::Heap { ptr, capacity } = self.storage {
            // SAFETY: heap storage was allocated by raw with `capacity` elements
            unsafe { raw::free(ptr, capacity, std::mem::align_of::<T>()) };
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for GrowableList<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrowableList")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .field("spilled", &self.is_spilled())
            .field("items", &self.as_slice())
            .finish()
    }
}
