/*!
 * Free-Handle Disposal
 *
 * Packs the handles of one result into a single native release call, and
 * guards single native allocations with scoped release.
 */

use crate::core::limits::MAX_FREE_HANDLES_PER_RESULT;
use crate::memory::ReadOnlyNativeBuffer;
use crate::native::{FreeHandle, NativeTokenizerApi};
use std::fmt;
use tinyvec::ArrayVec;

/// At most [`MAX_FREE_HANDLES_PER_RESULT`] handles, released together
///
/// Lives inline on the stack. Only valid (non-empty) handles are stored, so
/// the used-count is exactly what the native call receives.
#[derive(Clone, Default)]
pub struct HandleBatch {
    handles: ArrayVec<[FreeHandle; MAX_FREE_HANDLES_PER_RESULT]>,
}

impl HandleBatch {
    /// Pack the primary handle and, when present, the overflow handle
    #[inline]
    pub fn for_record(primary: FreeHandle, overflow: FreeHandle) -> Self {
        let mut handles = ArrayVec::new();
        for handle in [primary, overflow] {
            if !handle.is_empty() {
                handles.push(handle);
            }
        }
        Self { handles }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[FreeHandle] {
        &self.handles
    }

    /// Release every packed handle with one native call
    ///
    /// # Safety
    /// The handles belong to `native` and have not been released before.
    #[inline]
    pub unsafe fn release_with<N: NativeTokenizerApi + ?Sized>(self, native: &N) {
        if self.handles.is_empty() {
            return;
        }
        native.free_with_multiple_handles(ReadOnlyNativeBuffer::from_slice(&self.handles));
    }
}

impl fmt::Debug for HandleBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.handles.iter()).finish()
    }
}

/// Scoped owner of one native allocation
///
/// Released through `free_with_handle` exactly once, either explicitly via
/// [`NativeAllocation::release`] or on drop.
///
/// # Example
///
/// ```ignore
/// let allocation = tokenizer.ids_to_tokens_into(&ids, &mut views)?;
/// // Read views...
/// // Freed on drop
/// ```
#[must_use = "dropping the allocation frees the memory it guards"]
pub struct NativeAllocation<'n, N: NativeTokenizerApi + ?Sized> {
    handle: FreeHandle,
    native: &'n N,
}

impl<'n, N: NativeTokenizerApi + ?Sized> NativeAllocation<'n, N> {
    /// Adopt `handle`
    ///
    /// # Safety
    /// `handle` came from `native` and nothing else will release it.
    #[inline]
    pub unsafe fn new(native: &'n N, handle: FreeHandle) -> Self {
        Self { handle, native }
    }

    #[inline(always)]
    pub fn handle(&self) -> FreeHandle {
        self.handle
    }

    /// Release now instead of at scope exit
    #[inline]
    pub fn release(self) {
        drop(self);
    }

    /// Give up ownership without releasing
    ///
    /// The caller takes over the obligation to free the returned handle.
    #[inline]
    pub fn into_raw(self) -> FreeHandle {
        let handle = self.handle;
        std::mem::forget(self);
        handle
    }
}

impl<N: NativeTokenizerApi + ?Sized> Drop for NativeAllocation<'_, N> {
    fn drop(&mut self) {
        if !self.handle.is_empty() {
            // SAFETY: ownership was adopted in `new` and is released once here
            unsafe { self.native.free_with_handle(self.handle) };
        }
    }
}

impl<N: NativeTokenizerApi + ?Sized> fmt::Debug for NativeAllocation<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeAllocation")
            .field("handle", &self.handle)
            .finish()
    }
}
