/*!
 * Buffer Views
 * Non-owning pointer + length views over unmanaged memory
 *
 * Both views are `#[repr(C)]` so they cross the native boundary unchanged.
 * A view never frees. Whoever produced the memory keeps it alive for as
 * long as any view derived from it is in use.
 */

use std::fmt;
use std::marker::PhantomData;
use std::ptr;

/// Mutable view over `length` elements of `T`
#[repr(C)]
pub struct NativeBuffer<T> {
    ptr: *mut T,
    length: usize,
    _marker: PhantomData<T>,
}

/// Read-only view over `length` elements of `T`
///
/// Layout-identical to [`NativeBuffer`]. Going from mutable to read-only is
/// always allowed; the reverse needs [`ReadOnlyNativeBuffer::as_writable`].
#[repr(C)]
pub struct ReadOnlyNativeBuffer<T> {
    ptr: *const T,
    length: usize,
    _marker: PhantomData<T>,
}

impl<T> NativeBuffer<T> {
    #[inline]
    pub const fn new(ptr: *mut T, length: usize) -> Self {
        Self {
            ptr,
            length,
            _marker: PhantomData,
        }
    }

    /// View over a mutable slice. The slice must outlive every use of the view.
    #[inline]
    pub fn from_slice(slice: &mut [T]) -> Self {
        Self::new(slice.as_mut_ptr(), slice.len())
    }

    #[inline]
    pub const fn empty() -> Self {
        Self::new(ptr::null_mut(), 0)
    }

    #[inline(always)]
    pub const fn as_ptr(&self) -> *mut T {
        self.ptr
    }

    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.length
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Same memory, shorter length
    #[inline]
    pub fn truncated(self, length: usize) -> Self {
        debug_assert!(length <= self.length);
        Self::new(self.ptr, length.min(self.length))
    }

    #[inline(always)]
    pub const fn as_read_only(&self) -> ReadOnlyNativeBuffer<T> {
        ReadOnlyNativeBuffer::new(self.ptr, self.length)
    }

    /// # Safety
    /// The memory must be live, initialized, and not aliased mutably elsewhere
    /// for the chosen lifetime.
    #[inline]
    pub unsafe fn as_slice<'a>(&self) -> &'a [T] {
        if self.length == 0 {
            return &[];
        }
        std::slice::from_raw_parts(self.ptr, self.length)
    }

    /// # Safety
    /// The memory must be live, initialized, and exclusively borrowed for the
    /// chosen lifetime.
    #[inline]
    pub unsafe fn as_mut_slice<'a>(&self) -> &'a mut [T] {
        if self.length == 0 {
            return &mut [];
        }
        std::slice::from_raw_parts_mut(self.ptr, self.length)
    }
}

impl<T> ReadOnlyNativeBuffer<T> {
    #[inline]
    pub const fn new(ptr: *const T, length: usize) -> Self {
        Self {
            ptr,
            length,
            _marker: PhantomData,
        }
    }

    /// View over a slice. The slice must outlive every use of the view.
    #[inline]
    pub fn from_slice(slice: &[T]) -> Self {
        Self::new(slice.as_ptr(), slice.len())
    }

    #[inline]
    pub const fn empty() -> Self {
        Self::new(ptr::null(), 0)
    }

    #[inline(always)]
    pub const fn as_ptr(&self) -> *const T {
        self.ptr
    }

    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.length
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// # Safety
    /// The memory must be live and initialized for the chosen lifetime.
    #[inline]
    pub unsafe fn as_slice<'a>(&self) -> &'a [T] {
        if self.length == 0 {
            return &[];
        }
        std::slice::from_raw_parts(self.ptr, self.length)
    }

    /// Reinterpret as a mutable view
    ///
    /// # Safety
    /// The underlying memory must actually be writable by the caller.
    #[inline]
    pub const unsafe fn as_writable(&self) -> NativeBuffer<T> {
        NativeBuffer::new(self.ptr as *mut T, self.length)
    }
}

impl<T> From<NativeBuffer<T>> for ReadOnlyNativeBuffer<T> {
    #[inline(always)]
    fn from(buffer: NativeBuffer<T>) -> Self {
        buffer.as_read_only()
    }
}

impl<T> Clone for NativeBuffer<T> {
    #[inline(always)]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NativeBuffer<T> {}

impl<T> Clone for ReadOnlyNativeBuffer<T> {
    #[inline(always)]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ReadOnlyNativeBuffer<T> {}

impl<T> Default for NativeBuffer<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Default for ReadOnlyNativeBuffer<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> fmt::Debug for NativeBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeBuffer")
            .field("ptr", &self.ptr)
            .field("length", &self.length)
            .finish()
    }
}

impl<T> fmt::Debug for ReadOnlyNativeBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOnlyNativeBuffer")
            .field("ptr", &self.ptr)
            .field("length", &self.length)
            .finish()
    }
}
