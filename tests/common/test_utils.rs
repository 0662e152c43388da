use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use redis_bloom_rs::{BloomFilter, FilterConfigBuilder, InMemoryStore};

/// Random strings of `length` distinct lowercase letters.
/// `length` must not exceed 26.
#[allow(dead_code)]
pub fn sample_strings(length: usize, count: usize, seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut letters: Vec<u8> = (b'a'..=b'z').collect();
    (0..count)
        .map(|_| {
            letters.shuffle(&mut rng);
            String::from_utf8_lossy(&letters[..length]).into_owned()
        })
        .collect()
}

#[allow(dead_code)]
pub fn memory_filter(
    store: InMemoryStore,
    capacity: u64,
    fpr: f64,
) -> BloomFilter<InMemoryStore> {
    let config = FilterConfigBuilder::default()
        .name("bloomTesting")
        .capacity(capacity)
        .false_positive_rate(fpr)
        .build()
        .expect("Failed to build test config");
    BloomFilter::new(config, store).expect("Failed to create test filter")
}

#[allow(dead_code)]
pub const WORDS: [&str; 5] = ["hello", "how", "are", "you", "today"];
