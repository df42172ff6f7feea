/*!
 * Batch Stress Tests
 * Randomized batches straddling the pool buffer size
 */

mod common;

use common::{build_tokenizer, MockNative};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokenizers_bridge::TokenField;

fn random_text(rng: &mut StdRng, max_len: usize) -> String {
    let len = rng.gen_range(0..=max_len);
    (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}

#[test]
fn test_random_batches_keep_order_and_release_everything() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let native = MockNative::new();
    let tokenizer = build_tokenizer(&native, 8, 4, Some(6));

    for _ in 0..50 {
        let batch = rng.gen_range(0..70);
        // Pool buffers hold 27 bytes, so roughly half the inputs spill
        let inputs: Vec<String> = (0..batch).map(|_| random_text(&mut rng, 54)).collect();

        let outputs = tokenizer.encode_batch(&inputs, true);
        assert_eq!(outputs.len(), inputs.len());

        for (input, output) in inputs.iter().zip(&outputs) {
            let ids = output.gather_to_block(TokenField::Ids);
            let decoded = tokenizer.decode(&ids, true);
            assert_eq!(decoded.to_str().unwrap(), input);
        }
    }

    assert_eq!(native.live_allocations(), 0);
    assert_eq!(native.double_frees(), 0);
    assert!(tokenizer.pool_len() >= 4);
}

#[test]
fn test_pool_size_tracks_largest_batch() {
    let mut rng = StdRng::seed_from_u64(42);
    let native = MockNative::new();
    let tokenizer = build_tokenizer(&native, 32, 3, None);

    let mut largest = 3;
    for _ in 0..20 {
        let batch = rng.gen_range(1..40);
        let inputs: Vec<String> = (0..batch).map(|_| random_text(&mut rng, 20)).collect();
        drop(tokenizer.encode_batch(&inputs, false));

        largest = largest.max(batch);
        assert_eq!(tokenizer.pool_len(), largest);
    }
}
