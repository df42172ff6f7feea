/*!
 * Shared test backend
 *
 * An in-process native tokenizer with a byte-level vocabulary:
 * id = byte + 3, with 0 = BOS, 1 = EOS and 2 = PAD. Truncation windows come
 * from `truncation.max_length` in the config JSON; the last overflow window
 * is padded to the window length. Every allocation is tracked so tests can
 * count free calls and catch double frees.
 */

#![allow(dead_code)]

use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::c_void;
use std::mem::MaybeUninit;
use tokenizers_bridge::memory::{NativeBuffer, ReadOnlyNativeBuffer};
use tokenizers_bridge::native::{
    FreeHandle, NativeTokenizerApi, OverflowSegment, RawDecodeOutput, RawTokenizeOutput,
    TokenizerHandle,
};
use tokenizers_bridge::{Tokenizer, TokenizerBuilder};

pub const BOS: u32 = 0;
pub const EOS: u32 = 1;
pub const PAD: u32 = 2;
pub const BYTE_OFFSET: u32 = 3;

const TOKENIZER_ADDRESS: usize = 0x7000_0000;

/// Storage kept alive until its handle is freed
#[derive(Default)]
struct Allocation {
    words: Vec<Box<[u32]>>,
    bytes: Option<Box<[u8]>>,
    segments: Option<Box<[OverflowSegment]>>,
}

#[derive(Default)]
pub struct MockNative {
    window: Cell<Option<usize>>,
    reject_config: bool,
    next_handle: Cell<usize>,
    live: RefCell<HashMap<usize, Allocation>>,
    free_log: RefCell<Vec<usize>>,
    double_frees: Cell<usize>,
    seen_texts: RefCell<Vec<Vec<u8>>>,
    seen_text_ptrs: RefCell<Vec<usize>>,
    seen_config: RefCell<Option<Value>>,
    encode_calls: Cell<usize>,
    batch_calls: Cell<usize>,
    truncate_flags: RefCell<Vec<bool>>,
    tokenizer_live: Cell<bool>,
    tokenizer_frees: Cell<usize>,
}

impl MockNative {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose `allocate_tokenizer` always fails
    pub fn rejecting() -> Self {
        Self {
            reject_config: true,
            ..Self::default()
        }
    }

    pub fn live_allocations(&self) -> usize {
        self.live.borrow().len()
    }

    /// Native free calls made so far
    pub fn free_calls(&self) -> usize {
        self.free_log.borrow().len()
    }

    /// Handle count of each free call, in call order
    pub fn handles_per_call(&self) -> Vec<usize> {
        self.free_log.borrow().clone()
    }

    pub fn double_frees(&self) -> usize {
        self.double_frees.get()
    }

    /// Every text the backend received, in call order
    pub fn seen_texts(&self) -> Vec<String> {
        self.seen_texts
            .borrow()
            .iter()
            .map(|bytes| String::from_utf8(bytes.clone()).unwrap())
            .collect()
    }

    /// Addresses of the staged text views, in call order
    pub fn seen_text_ptrs(&self) -> Vec<usize> {
        self.seen_text_ptrs.borrow().clone()
    }

    pub fn seen_config(&self) -> Option<Value> {
        self.seen_config.borrow().clone()
    }

    pub fn encode_calls(&self) -> usize {
        self.encode_calls.get()
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.get()
    }

    pub fn truncate_flags(&self) -> Vec<bool> {
        self.truncate_flags.borrow().clone()
    }

    pub fn tokenizer_live(&self) -> bool {
        self.tokenizer_live.get()
    }

    pub fn tokenizer_frees(&self) -> usize {
        self.tokenizer_frees.get()
    }

    fn register(&self, allocation: Allocation) -> FreeHandle {
        let id = 0x1000 + self.next_handle.get() * 8;
        self.next_handle.set(self.next_handle.get() + 1);
        self.live.borrow_mut().insert(id, allocation);
        FreeHandle::from_raw(id as *mut c_void)
    }

    fn release(&self, handle: FreeHandle) {
        if self.live.borrow_mut().remove(&(handle.as_raw() as usize)).is_none() {
            self.double_frees.set(self.double_frees.get() + 1);
        }
    }

    unsafe fn record_text(&self, text: ReadOnlyNativeBuffer<u8>) -> Vec<u8> {
        let bytes = text.as_slice().to_vec();
        self.seen_texts.borrow_mut().push(bytes.clone());
        self.seen_text_ptrs.borrow_mut().push(text.as_ptr() as usize);
        bytes
    }

    fn encode_bytes(&self, bytes: &[u8], add_special_tokens: bool, truncate: bool) -> RawTokenizeOutput {
        let mut ids = Vec::with_capacity(bytes.len() + 2);
        let mut special = Vec::with_capacity(bytes.len() + 2);
        if add_special_tokens {
            ids.push(BOS);
            special.push(1);
        }
        for &byte in bytes {
            ids.push(byte as u32 + BYTE_OFFSET);
            special.push(0);
        }
        if add_special_tokens {
            ids.push(EOS);
            special.push(1);
        }

        let window = self.window.get().filter(|_| truncate);
        let split = match window {
            Some(window) if ids.len() > window => window,
            _ => ids.len(),
        };

        let primary_ids: Box<[u32]> = ids[..split].into();
        let primary_special: Box<[u32]> = special[..split].into();
        let primary = Window::new(primary_ids, primary_special);

        let mut record = RawTokenizeOutput {
            ids: primary.view(0),
            attention_mask: primary.view(1),
            special_tokens_mask: primary.view(2),
            token_type_ids: primary.view(3),
            ..RawTokenizeOutput::default()
        };

        if let Some(window) = window.filter(|&w| ids.len() > w) {
            let mut overflow = Allocation::default();
            let mut segments = Vec::new();

            for (chunk_ids, chunk_special) in ids[split..].chunks(window).zip(special[split..].chunks(window)) {
                let mut seg_ids = chunk_ids.to_vec();
                let mut seg_special = chunk_special.to_vec();
                let mut seg_mask = vec![1u32; chunk_ids.len()];
                while seg_ids.len() < window {
                    seg_ids.push(PAD);
                    seg_special.push(1);
                    seg_mask.push(0);
                }

                let seg = Window::with_mask(seg_ids.into(), seg_special.into(), seg_mask.into());
                segments.push(OverflowSegment {
                    ids: seg.view(0),
                    attention_mask: seg.view(1),
                    special_tokens_mask: seg.view(2),
                    token_type_ids: seg.view(3),
                });
                overflow.words.extend(seg.into_words());
            }

            let segments: Box<[OverflowSegment]> = segments.into();
            record.overflowing_tokens = ReadOnlyNativeBuffer::from_slice(&segments);
            overflow.segments = Some(segments);
            record.overflowing_tokens_free_handle = self.register(overflow);
        }

        record.original_output_free_handle = self.register(Allocation {
            words: primary.into_words(),
            ..Allocation::default()
        });
        record
    }

    fn token_bytes(id: u32) -> Vec<u8> {
        match id {
            BOS => b"<s>".to_vec(),
            EOS => b"</s>".to_vec(),
            PAD => b"<pad>".to_vec(),
            id if id < 256 + BYTE_OFFSET => vec![(id - BYTE_OFFSET) as u8],
            _ => b"<unk>".to_vec(),
        }
    }
}

/// Four per-token arrays of one window
struct Window {
    words: [Box<[u32]>; 4],
}

impl Window {
    fn new(ids: Box<[u32]>, special: Box<[u32]>) -> Self {
        let mask = vec![1u32; ids.len()].into();
        Self::with_mask(ids, special, mask)
    }

    fn with_mask(ids: Box<[u32]>, special: Box<[u32]>, mask: Box<[u32]>) -> Self {
        let types = vec![0u32; ids.len()].into();
        Self {
            words: [ids, mask, special, types],
        }
    }

    fn view(&self, index: usize) -> ReadOnlyNativeBuffer<u32> {
        ReadOnlyNativeBuffer::from_slice(&self.words[index])
    }

    fn into_words(self) -> Vec<Box<[u32]>> {
        self.words.into()
    }
}

impl NativeTokenizerApi for MockNative {
    unsafe fn allocate_tokenizer(&self, config: ReadOnlyNativeBuffer<u8>) -> Option<TokenizerHandle> {
        let value: Value = serde_json::from_slice(config.as_slice()).ok()?;
        if self.reject_config {
            return None;
        }

        let window = value["truncation"]["max_length"].as_u64().map(|w| w as usize);
        self.window.set(window);
        *self.seen_config.borrow_mut() = Some(value);
        self.tokenizer_live.set(true);
        TokenizerHandle::from_raw(TOKENIZER_ADDRESS as *mut c_void)
    }

    unsafe fn free_tokenizer(&self, tokenizer: TokenizerHandle) {
        assert_eq!(tokenizer.as_raw() as usize, TOKENIZER_ADDRESS);
        self.tokenizer_live.set(false);
        self.tokenizer_frees.set(self.tokenizer_frees.get() + 1);
    }

    unsafe fn encode(
        &self,
        _tokenizer: TokenizerHandle,
        text: ReadOnlyNativeBuffer<u8>,
        add_special_tokens: bool,
        truncate: bool,
    ) -> RawTokenizeOutput {
        self.encode_calls.set(self.encode_calls.get() + 1);
        self.truncate_flags.borrow_mut().push(truncate);
        let bytes = self.record_text(text);
        self.encode_bytes(&bytes, add_special_tokens, truncate)
    }

    unsafe fn encode_batch(
        &self,
        _tokenizer: TokenizerHandle,
        texts: ReadOnlyNativeBuffer<ReadOnlyNativeBuffer<u8>>,
        outputs: NativeBuffer<MaybeUninit<RawTokenizeOutput>>,
        add_special_tokens: bool,
        truncate: bool,
    ) {
        self.batch_calls.set(self.batch_calls.get() + 1);
        self.truncate_flags.borrow_mut().push(truncate);
        assert_eq!(texts.len(), outputs.len());

        let slots = outputs.as_mut_slice();
        for (slot, &text) in slots.iter_mut().zip(texts.as_slice()) {
            let bytes = self.record_text(text);
            slot.write(self.encode_bytes(&bytes, add_special_tokens, truncate));
        }
    }

    unsafe fn decode(
        &self,
        _tokenizer: TokenizerHandle,
        ids: ReadOnlyNativeBuffer<u32>,
        skip_special_tokens: bool,
    ) -> RawDecodeOutput {
        let mut text = Vec::new();
        for &id in ids.as_slice() {
            if skip_special_tokens && id < BYTE_OFFSET {
                continue;
            }
            text.extend(Self::token_bytes(id));
        }

        let text: Box<[u8]> = text.into();
        let view = ReadOnlyNativeBuffer::from_slice(&text);
        let free_handle = self.register(Allocation {
            bytes: Some(text),
            ..Allocation::default()
        });

        RawDecodeOutput {
            text: view,
            free_handle,
        }
    }

    unsafe fn ids_to_tokens(
        &self,
        _tokenizer: TokenizerHandle,
        ids: ReadOnlyNativeBuffer<u32>,
        tokens: NativeBuffer<ReadOnlyNativeBuffer<u8>>,
    ) -> FreeHandle {
        let ids = ids.as_slice();
        let mut offsets = Vec::with_capacity(ids.len());
        let mut joined = Vec::new();
        for &id in ids {
            let bytes = Self::token_bytes(id);
            offsets.push((joined.len(), bytes.len()));
            joined.extend(bytes);
        }

        let joined: Box<[u8]> = joined.into();
        let slots = tokens.as_mut_slice();
        for (slot, &(start, len)) in slots.iter_mut().zip(&offsets) {
            *slot = ReadOnlyNativeBuffer::from_slice(&joined[start..start + len]);
        }

        self.register(Allocation {
            bytes: Some(joined),
            ..Allocation::default()
        })
    }

    unsafe fn free_with_handle(&self, handle: FreeHandle) {
        self.free_log.borrow_mut().push(1);
        self.release(handle);
    }

    unsafe fn free_with_multiple_handles(&self, handles: ReadOnlyNativeBuffer<FreeHandle>) {
        self.free_log.borrow_mut().push(handles.len());
        for &handle in handles.as_slice() {
            self.release(handle);
        }
    }
}

/// Minimal tokenizer.json accepted by the mock backend
pub fn config_json(truncation: Option<u64>) -> Vec<u8> {
    let truncation = truncation.map(|max_length| {
        json!({
            "direction": "Right",
            "max_length": max_length,
            "strategy": "LongestFirst",
            "stride": 0
        })
    });

    serde_json::to_vec(&json!({
        "version": "1.0",
        "truncation": truncation,
        "padding": null,
        "added_tokens": [
            { "id": 0, "content": "<s>", "single_word": false, "lstrip": false,
              "rstrip": false, "normalized": false, "special": true },
            { "id": 1, "content": "</s>", "single_word": false, "lstrip": false,
              "rstrip": false, "normalized": false, "special": true },
            { "id": 2, "content": "<pad>", "single_word": false, "lstrip": false,
              "rstrip": false, "normalized": false, "special": true }
        ],
        "model": { "type": "ByteLevel", "offset": BYTE_OFFSET }
    }))
    .unwrap()
}

/// Build a tokenizer over `native` with explicit sizing
pub fn build_tokenizer<N: NativeTokenizerApi>(
    native: N,
    max_input_length: u32,
    max_batches: u32,
    truncation: Option<u64>,
) -> Tokenizer<N> {
    TokenizerBuilder::new()
        .with_raw_tokenizer_data(config_json(truncation))
        .with_expected_max_input_length(max_input_length)
        .with_expected_max_batches(max_batches)
        .build_with(native)
        .unwrap()
}

/// Expected ids for `text` with BOS/EOS added
pub fn expected_ids(text: &str) -> Vec<u32> {
    std::iter::once(BOS)
        .chain(text.bytes().map(|b| b as u32 + BYTE_OFFSET))
        .chain(std::iter::once(EOS))
        .collect()
}
