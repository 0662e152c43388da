//! Splitting the logical bit array across store keys.
//!
//! Redis caps a string value at 512 MiB, which is exactly 2^32 bits, so a
//! filter longer than that is spread over `{name}.0`, `{name}.1`, ... with
//! each key covering a contiguous run of positions.
use std::ops::Range;

/// Bits stored in one shard key: 512 MiB expressed in bits.
pub const SHARD_BITS: u64 = 1 << 32;

/// Upper bound on shard keys per filter (512 GiB at full-size shards).
pub const MAX_SHARDS: u64 = 1 << 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardLayout {
    bit_count: u64,
    shard_bits: u64,
    keys: Vec<String>,
}

impl ShardLayout {
    /// `shard_bits` must be non-zero and the shard count at most
    /// [`MAX_SHARDS`]; [`FilterConfig::validate`] checks both before a layout
    /// is ever built.
    ///
    /// [`FilterConfig::validate`]: crate::FilterConfig::validate
    pub fn new(name: &str, bit_count: u64, shard_bits: u64) -> Self {
        let num_shards = bit_count.div_ceil(shard_bits);
        let keys = (0..num_shards).map(|i| format!("{name}.{i}")).collect();
        Self {
            bit_count,
            shard_bits,
            keys,
        }
    }

    /// Maps a logical position to `(shard index, offset within shard)`.
    #[inline]
    pub fn locate(&self, position: u64) -> (usize, u64) {
        debug_assert!(position < self.bit_count);
        (
            (position / self.shard_bits) as usize,
            position % self.shard_bits,
        )
    }

    pub fn key(&self, shard: usize) -> &str {
        &self.keys[shard]
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn num_shards(&self) -> usize {
        self.keys.len()
    }

    pub fn bit_count(&self) -> u64 {
        self.bit_count
    }

    pub fn shard_bits(&self) -> u64 {
        self.shard_bits
    }

    /// Logical positions covered by `shard`. The last shard may be short.
    pub fn shard_range(&self, shard: usize) -> Range<u64> {
        let start = shard as u64 * self.shard_bits;
        let end = (start + self.shard_bits).min(self.bit_count);
        start..end
    }
}
