//! Bloom filter with its bit array stored in Redis.
//!
//! Several processes can share one filter by pointing at the same keys: the
//! store is the only source of truth and its per-bit `SETBIT`/`GETBIT` are
//! the only synchronization. The filter never caches bits locally.
//!
//! HowTo:
//!    * Sizing: capacity `n` and false positive rate `p` give
//!      `m = ceil(-n ln p / ln² 2)` bits and `k = max(1, round(m/n ln 2))` hashes.
//!    * Hashing: two 64-bit digests `h1`, `h2` give position `i` as
//!      `(h1 + i·h2) mod m` (double hashing).
//!    * Sharding: a Redis string holds at most 2^32 bits, so position `p` lives
//!      in key `{name}.{p / 2^32}` at offset `p mod 2^32`.
//!    * Batching: all `SETBIT`/`GETBIT` commands of a call, for one item or
//!      many, go out as one pipeline, so each call costs one round trip.
//!
//! Races:
//!     * A `contains` running alongside an `add` of the same item may see only
//!       some of its bits and report it absent.
//!     * `delete` is not atomic across shards; concurrent writers can leave
//!       some shards repopulated.
//!
//! ```no_run
//! use redis_bloom_rs::{BloomFilter, ConnectionConfig, FilterConfigBuilder};
//!
//! # fn main() -> redis_bloom_rs::Result<()> {
//! let config = FilterConfigBuilder::default()
//!     .name("seen-urls")
//!     .capacity(10_000)
//!     .false_positive_rate(0.01)
//!     .build()
//!     .expect("name is set");
//!
//! let mut filter = BloomFilter::connect(config, &ConnectionConfig::default())?;
//! filter.extend(["hello", "how", "are", "you"])?;
//! assert!(filter.contains(b"hello")?);
//! assert_eq!(filter.contains_many(&["hello", "today"])?, [&"hello"]);
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod common;
mod config;
mod error;
mod filter;
mod hash;
#[cfg(feature = "redis")]
mod redis_storage;
mod shard;
mod storage;

pub use command::{BitCommand, BitOp, CommandBatch};
pub use config::{
    ConnectionConfig, ConnectionConfigBuilder, ConnectionConfigBuilderError,
    FilterConfig, FilterConfigBuilder, FilterConfigBuilderError, FilterParams,
};
pub use error::{BloomError, Result, StoreError};
pub use filter::BloomFilter;
pub use hash::{
    HashFunction, MURMUR_SEED, default_hash_function, hash_fnv64, hash_murmur64,
    optimal_bit_count, optimal_num_hashes, required_bits,
};
#[cfg(feature = "redis")]
pub use redis_storage::RedisStore;
pub use shard::{MAX_SHARDS, SHARD_BITS, ShardLayout};
pub use storage::{BitStore, InMemoryStore, StoreResult};
