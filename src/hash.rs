use fnv::FnvHasher;
use murmur3::murmur3_x64_128;
use std::hash::Hasher;
use std::io::Cursor;

/// Seed of the first digest. Part of the bit-array format: filters written
/// with a different seed address different bits.
pub const MURMUR_SEED: u32 = 314_159_265;

/// A type alias for the hash function used to place items in the filter.
///
/// **Parameters:**
///
/// - `item: &[u8]`
///   - A byte slice representing the item to be hashed.
/// - `num_hashes: usize`
///   - The number of positions to compute for the item.
/// - `bit_count: u64`
///   - The length of the logical bit array. Every position returned must be
///     in `[0, bit_count)`.
///
/// **Returns:**
///
/// - `Vec<u64>`
///   - Exactly `num_hashes` positions, in probe order.
///
/// Every process sharing a filter must use the same function, otherwise
/// they silently disagree about which bits belong to an item.
pub type HashFunction = fn(&[u8], usize, u64) -> Vec<u64>;

pub fn hash_murmur64(key: &[u8]) -> u64 {
    let mut cursor = Cursor::new(key);
    // Reading from an in-memory cursor cannot fail.
    murmur3_x64_128(&mut cursor, MURMUR_SEED)
        .expect("Failed to compute Murmur3 hash") as u64
}

pub fn hash_fnv64(key: &[u8]) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(key);
    hasher.finish()
}

/// Double hashing: position `i` is `(h1 + i * h2) mod bit_count`, where the
/// sum and product wrap at 2^64 before the reduction.
pub fn default_hash_function(
    item: &[u8],
    num_hashes: usize,
    bit_count: u64,
) -> Vec<u64> {
    let h1 = hash_murmur64(item);
    let h2 = hash_fnv64(item);
    (0..num_hashes as u64)
        .map(|i| h1.wrapping_add(i.wrapping_mul(h2)) % bit_count)
        .collect()
}

/// `ceil(-n * ln(p) / ln(2)^2)` before narrowing, so callers can reject
/// geometries that do not fit in a `u64`.
pub fn required_bits(n: u64, fpr: f64) -> f64 {
    let ln2 = std::f64::consts::LN_2;
    ((-(n as f64) * fpr.ln()) / (ln2 * ln2)).ceil()
}

/// [`required_bits`] as an integer. Saturates past `u64::MAX`;
/// [`FilterConfig::validate`](crate::FilterConfig::validate) rejects those
/// inputs first.
pub fn optimal_bit_count(n: u64, fpr: f64) -> u64 {
    required_bits(n, fpr) as u64
}

/// `max(1, round(m / n * ln(2)))`
pub fn optimal_num_hashes(n: u64, m: u64) -> usize {
    let k = ((m as f64 / n as f64) * std::f64::consts::LN_2).round() as usize;
    k.max(1)
}
