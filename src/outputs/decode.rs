/*!
 * Decode Output
 * Owned UTF-8 text returned by the native decoder
 */

use crate::core::errors::Result;
use crate::native::{NativeTokenizerApi, RawDecodeOutput};
use std::fmt;
use std::mem::ManuallyDrop;
use std::ptr;

/// Decoded text whose native buffer is released exactly once
pub struct DecodeOutput<'n, N: NativeTokenizerApi + ?Sized> {
    raw: RawDecodeOutput,
    native: &'n N,
}

impl<'n, N: NativeTokenizerApi + ?Sized> DecodeOutput<'n, N> {
    /// Adopt a record written by `native`
    ///
    /// # Safety
    /// `raw` was produced by `native`, its text view is live, and nothing
    /// else will release its handle.
    #[inline]
    pub unsafe fn from_raw(native: &'n N, raw: RawDecodeOutput) -> Self {
        Self { raw, native }
    }

    /// Give up ownership, handing the disposal obligation to the caller
    #[inline]
    pub fn into_raw(self) -> RawDecodeOutput {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the record is moved out once
        unsafe { ptr::read(&this.raw) }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: the view stays live until this record is disposed
        unsafe { self.raw.text.as_slice() }
    }

    /// Text as `&str`
    ///
    /// # Errors
    /// `InvalidUtf8` if the native side produced malformed bytes.
    #[inline]
    pub fn to_str(&self) -> Result<&str> {
        Ok(std::str::from_utf8(self.as_bytes())?)
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.raw.text.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.raw.text.is_empty()
    }

    /// Release the native memory now
    #[inline]
    pub fn dispose(self) {
        drop(self);
    }
}

impl<N: NativeTokenizerApi + ?Sized> Drop for DecodeOutput<'_, N> {
    fn drop(&mut self) {
        if !self.raw.free_handle.is_empty() {
            // SAFETY: the record owns its handle and Drop runs once
            unsafe { self.native.free_with_handle(self.raw.free_handle) };
        }
    }
}

impl<N: NativeTokenizerApi + ?Sized> fmt::Display for DecodeOutput<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl<N: NativeTokenizerApi + ?Sized> fmt::Debug for DecodeOutput<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeOutput")
            .field("text", &String::from_utf8_lossy(self.as_bytes()))
            .field("free_handle", &self.raw.free_handle)
            .finish()
    }
}
