/*!
 * Tokenizer
 * Batch marshalling over a native tokenizer handle
 *
 * # Performance
 *
 * - **Staging**: inputs within the pool buffer size are written into pool
 *   buffers, larger ones into one-off blocks released after the native call
 * - **Views**: the per-batch view array lives on the stack for small batches
 * - **One native call** per encode, batch encode, decode or ids-to-tokens
 *
 * A tokenizer owns its pool and native handle as one unit. Encode takes
 * `&self` but the pool is not shared across threads: the type is `Send`
 * and not `Sync`, so concurrent callers need one tokenizer each or external
 * locking.
 */

use super::config::TokenizerConfig;
use super::input::EncodeInput;
use crate::core::errors::{Result, TokenizerError};
use crate::core::limits::{
    BATCH_VIEWS_STACK_CAPACITY, DECODE_NARROW_STACK_CAPACITY, ONE_OFF_STACK_CAPACITY,
    TOKEN_VIEWS_STACK_CAPACITY,
};
use crate::memory::{BufferPool, GrowableList, MemoryBlock, NativeBuffer, ReadOnlyNativeBuffer};
use crate::monitoring::span_native_call;
use crate::native::{NativeTokenizerApi, RawTokenizeOutput, TokenizerHandle};
use crate::outputs::{DecodeOutput, NativeAllocation, TokenizeOutput};
use std::cell::RefCell;
use std::fmt;
use std::mem::MaybeUninit;
use tracing::{debug, instrument, trace};

/// Native tokenizer plus the buffer pool that feeds it
pub struct Tokenizer<N: NativeTokenizerApi> {
    native: N,
    handle: TokenizerHandle,
    config: TokenizerConfig,
    pool: RefCell<BufferPool>,
}

impl<N: NativeTokenizerApi> Tokenizer<N> {
    /// Take ownership of an allocated native tokenizer
    pub(crate) fn from_parts(native: N, handle: TokenizerHandle, config: TokenizerConfig) -> Self {
        let pool = BufferPool::new(
            config.max_input_byte_length(),
            config.expected_max_batches() as usize,
        );

        debug!(
            ?handle,
            buffer_size = pool.buffer_size(),
            pool_buffers = pool.len(),
            truncates = config.truncates(),
            "tokenizer allocated"
        );

        Self {
            native,
            handle,
            config,
            pool: RefCell::new(pool),
        }
    }

    #[inline(always)]
    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    #[inline(always)]
    pub fn native(&self) -> &N {
        &self.native
    }

    #[inline(always)]
    pub fn handle(&self) -> TokenizerHandle {
        self.handle
    }

    #[inline(always)]
    pub fn truncates(&self) -> bool {
        self.config.truncates()
    }

    /// Buffers currently owned by the pool
    pub fn pool_len(&self) -> usize {
        self.pool.borrow().len()
    }

    /// Encode one text
    pub fn encode<I: EncodeInput + ?Sized>(
        &self,
        input: &I,
        add_special_tokens: bool,
    ) -> TokenizeOutput<'_, N> {
        let truncate = self.config.truncates();
        let required = input.max_utf8_len();
        let mut pool = self.pool.borrow_mut();
        let _call = span_native_call("encode", 1);

        let raw = if required <= pool.buffer_size() {
            let text = stage(input, pool.lease().acquire());
            // SAFETY: the staged view lives in the pool for the whole call
            unsafe {
                self.native
                    .encode(self.handle, text, add_special_tokens, truncate)
            }
        } else {
            trace!(
                required,
                buffer_size = pool.buffer_size(),
                "input exceeds pool buffer, staging in one-off block"
            );
            let mut block = MemoryBlock::<u8>::new(required);
            let written = input.encode_utf8(&mut block);
            let text = ReadOnlyNativeBuffer::from_slice(&block[..written]);
            // SAFETY: `block` outlives the call
            unsafe {
                self.native
                    .encode(self.handle, text, add_special_tokens, truncate)
            }
        };

        // SAFETY: the record was just produced by this backend
        unsafe { TokenizeOutput::from_raw(&self.native, raw) }
    }

    /// Encode every input, returning one record per input in input order
    #[instrument(level = "debug", skip_all, fields(inputs = inputs.len()))]
    pub fn encode_batch<I: EncodeInput>(
        &self,
        inputs: &[I],
        add_special_tokens: bool,
    ) -> Vec<TokenizeOutput<'_, N>> {
        let count = inputs.len();
        let mut raw: Vec<RawTokenizeOutput> = Vec::with_capacity(count);

        // Output storage is sized here, so no length check is needed
        let slots = NativeBuffer::from_slice(&mut raw.spare_capacity_mut()[..count]);
        self.encode_batch_raw(inputs, slots, add_special_tokens);
        // SAFETY: the native call wrote one record per input
        unsafe { raw.set_len(count) };

        raw.into_iter()
            // SAFETY: every record was produced by this backend
            .map(|record| unsafe { TokenizeOutput::from_raw(&self.native, record) })
            .collect()
    }

    /// Encode into caller-provided slots
    ///
    /// The returned records are owned by the caller: adopt each with
    /// [`TokenizeOutput::from_raw`] (for instance after `std::mem::take`)
    /// or release its handles some other way.
    ///
    /// # Errors
    /// `LengthMismatch` unless `outputs` has exactly one slot per input.
    #[instrument(level = "debug", skip_all, fields(inputs = inputs.len()))]
    pub fn encode_batch_into<'o, I: EncodeInput>(
        &self,
        inputs: &[I],
        outputs: &'o mut [MaybeUninit<RawTokenizeOutput>],
        add_special_tokens: bool,
    ) -> Result<&'o mut [RawTokenizeOutput]> {
        if outputs.len() != inputs.len() {
            return Err(TokenizerError::LengthMismatch {
                inputs: inputs.len(),
                outputs: outputs.len(),
            });
        }

        self.encode_batch_raw(
            inputs,
            NativeBuffer::from_slice(&mut *outputs),
            add_special_tokens,
        );

        let written = outputs as *mut [MaybeUninit<RawTokenizeOutput>] as *mut [RawTokenizeOutput];
        // SAFETY: every slot was written by the native call, and
        // MaybeUninit<T> has the layout of T
        Ok(unsafe { &mut *written })
    }

    fn encode_batch_raw<I: EncodeInput>(
        &self,
        inputs: &[I],
        outputs: NativeBuffer<MaybeUninit<RawTokenizeOutput>>,
        add_special_tokens: bool,
    ) {
        debug_assert_eq!(inputs.len(), outputs.len());
        if inputs.is_empty() {
            return;
        }

        let mut pool = self.pool.borrow_mut();
        let mut lease = pool.lease();
        let buffer_size = lease.buffer_size();

        let mut view_region =
            [const { MaybeUninit::<ReadOnlyNativeBuffer<u8>>::uninit() }; BATCH_VIEWS_STACK_CAPACITY];
        let mut views = GrowableList::new(&mut view_region);

        // Released when this scope ends, on every exit path
        let mut one_off_region =
            [const { MaybeUninit::<MemoryBlock<u8>>::uninit() }; ONE_OFF_STACK_CAPACITY];
        let mut one_offs = GrowableList::new(&mut one_off_region);

        for input in inputs {
            let required = input.max_utf8_len();

            let view = if required <= buffer_size {
                stage(input, lease.acquire())
            } else {
                trace!(
                    required,
                    buffer_size,
                    "input exceeds pool buffer, staging in one-off block"
                );
                let mut block = MemoryBlock::<u8>::new(required);
                let written = input.encode_utf8(&mut block);
                let view = ReadOnlyNativeBuffer::from_slice(&block[..written]);
                // Moving the block keeps its heap address
                one_offs.push(block);
                view
            };

            views.push(view);
        }

        let _call = span_native_call("encode_batch", views.len());
        // SAFETY: every view points at a leased pool buffer or a block in
        // `one_offs`, all alive until after the call
        unsafe {
            self.native.encode_batch(
                self.handle,
                ReadOnlyNativeBuffer::from_slice(&views),
                outputs,
                add_special_tokens,
                self.config.truncates(),
            );
        }
    }

    /// Decode ids back to text
    pub fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> DecodeOutput<'_, N> {
        let _call = span_native_call("decode", ids.len());
        // SAFETY: `ids` is borrowed for the whole call
        let raw = unsafe {
            self.native
                .decode(self.handle, ReadOnlyNativeBuffer::from_slice(ids), skip_special_tokens)
        };

        // SAFETY: the record was just produced by this backend
        unsafe { DecodeOutput::from_raw(&self.native, raw) }
    }

    /// Decode 64-bit ids, as produced by the widening gather
    ///
    /// # Errors
    /// `IdOutOfRange` for an id above `u32::MAX`; nothing is decoded then.
    pub fn decode_widened(
        &self,
        ids: &[u64],
        skip_special_tokens: bool,
    ) -> Result<DecodeOutput<'_, N>> {
        let mut region = [const { MaybeUninit::<u32>::uninit() }; DECODE_NARROW_STACK_CAPACITY];
        let mut narrowed = GrowableList::new(&mut region);

        for (index, &value) in ids.iter().enumerate() {
            let id = u32::try_from(value)
                .map_err(|_| TokenizerError::IdOutOfRange { index, value })?;
            narrowed.push(id);
        }

        Ok(self.decode(&narrowed, skip_special_tokens))
    }

    /// Resolve ids to token text views backed by one native allocation
    ///
    /// The views in `tokens` stay valid until the returned allocation drops.
    ///
    /// # Errors
    /// `BufferTooSmall` when `tokens` has fewer slots than `ids`.
    pub fn ids_to_tokens_into(
        &self,
        ids: &[u32],
        tokens: &mut [ReadOnlyNativeBuffer<u8>],
    ) -> Result<NativeAllocation<'_, N>> {
        if tokens.len() < ids.len() {
            return Err(TokenizerError::buffer_too_small(ids.len(), tokens.len()));
        }

        // SAFETY: both buffers are borrowed for the whole call and `tokens`
        // has a slot per id
        let handle = unsafe {
            self.native.ids_to_tokens(
                self.handle,
                ReadOnlyNativeBuffer::from_slice(ids),
                NativeBuffer::from_slice(tokens),
            )
        };

        // SAFETY: the handle was just produced by this backend
        Ok(unsafe { NativeAllocation::new(&self.native, handle) })
    }

    /// Resolve ids to owned token strings
    ///
    /// # Errors
    /// `InvalidUtf8` if a token is not valid UTF-8.
    pub fn ids_to_tokens(&self, ids: &[u32]) -> Result<Vec<String>> {
        let mut region =
            [const { MaybeUninit::<ReadOnlyNativeBuffer<u8>>::uninit() }; TOKEN_VIEWS_STACK_CAPACITY];
        let mut views = GrowableList::new(&mut region);
        views.extend_with(ids.len(), ReadOnlyNativeBuffer::empty());

        let allocation = self.ids_to_tokens_into(ids, &mut views)?;

        let tokens = views
            .iter()
            .map(|view| {
                // SAFETY: views point into memory guarded by `allocation`
                let bytes = unsafe { view.as_slice() };
                std::str::from_utf8(bytes)
                    .map(str::to_owned)
                    .map_err(TokenizerError::from)
            })
            .collect();

        allocation.release();
        tokens
    }
}

/// Write `input` into a leased pool buffer
#[inline]
fn stage<I: EncodeInput + ?Sized>(input: &I, buffer: NativeBuffer<u8>) -> ReadOnlyNativeBuffer<u8> {
    // SAFETY: a lease hands each pool buffer out once per call
    let written = input.encode_utf8(unsafe { buffer.as_mut_slice() });
    buffer.truncated(written).as_read_only()
}

impl<N: NativeTokenizerApi> Drop for Tokenizer<N> {
    fn drop(&mut self) {
        debug!(
            handle = ?self.handle,
            pool_buffers = self.pool.get_mut().len(),
            "freeing tokenizer"
        );
        // SAFETY: the handle is owned by this tokenizer and freed once; every
        // output borrowing the backend is gone by now
        unsafe { self.native.free_tokenizer(self.handle) };
    }
}

impl<N: NativeTokenizerApi> fmt::Debug for Tokenizer<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokenizer")
            .field("handle", &self.handle)
            .field("config", &self.config)
            .field("pool", &self.pool)
            .finish()
    }
}
