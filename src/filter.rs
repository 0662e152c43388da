use crate::command::CommandBatch;
use crate::config::{FilterConfig, FilterParams};
use crate::error::Result;
use crate::shard::ShardLayout;
use crate::storage::BitStore;
use tracing::{debug, info, warn};

/// A Bloom filter whose bits live in a [`BitStore`].
///
/// The filter keeps no bit state of its own. Every call is a round trip to
/// the store, and any number of filters built from the same [`FilterConfig`]
/// share their bits through it. Elements cannot be removed; [`delete`]
/// wipes the whole filter.
///
/// [`delete`]: BloomFilter::delete
pub struct BloomFilter<S: BitStore> {
    store: S,
    config: FilterConfig,
    params: FilterParams,
    layout: ShardLayout,
}

impl<S: BitStore> BloomFilter<S> {
    /// Validates `config` and derives the filter geometry. Nothing is sent
    /// to the store; shard keys are created by the first write.
    pub fn new(config: FilterConfig, store: S) -> Result<Self> {
        config.validate()?;

        let params = FilterParams::from(&config);
        let layout =
            ShardLayout::new(&config.name, params.bit_count, config.shard_bits);

        info!(
            name = %config.name,
            bit_count = params.bit_count,
            hash_count = params.hash_count,
            shards = params.num_shards,
            "Bloom filter ready"
        );

        Ok(Self {
            store,
            config,
            params,
            layout,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn capacity(&self) -> u64 {
        self.config.capacity
    }

    pub fn false_positive_rate(&self) -> f64 {
        self.config.false_positive_rate
    }

    pub fn bit_count(&self) -> u64 {
        self.params.bit_count
    }

    pub fn hash_count(&self) -> usize {
        self.params.hash_count
    }

    pub fn num_shards(&self) -> usize {
        self.layout.num_shards()
    }

    /// Shard keys in shard order: `{name}.0`, `{name}.1`, ...
    pub fn keys(&self) -> &[String] {
        self.layout.keys()
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    pub fn layout(&self) -> &ShardLayout {
        &self.layout
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Logical bit positions probed for `item`.
    pub fn positions(&self, item: &[u8]) -> Vec<u64> {
        (self.config.hash_function)(
            item,
            self.params.hash_count,
            self.params.bit_count,
        )
    }

    /// Sets the bits of `item` in one pipelined round trip.
    ///
    /// Returns `true` if every bit was already set, i.e. the item was (or
    /// looked like it was) present before the call.
    pub fn add(&mut self, item: &[u8]) -> Result<bool> {
        let positions = self.positions(item);
        let batch = CommandBatch::set_bits(
            &self.layout,
            self.params.hash_count,
            [positions],
        );
        let replies = run_batch(&mut self.store, &batch, "add")?;
        Ok(batch.demux(&replies).first().copied().unwrap_or(false))
    }

    /// Adds every item in a single pipelined round trip.
    ///
    /// Returns how many of them were not already present.
    pub fn extend<I, T>(&mut self, items: I) -> Result<usize>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let positions: Vec<Vec<u64>> = items
            .into_iter()
            .map(|item| self.positions(item.as_ref()))
            .collect();
        let batch = CommandBatch::set_bits(
            &self.layout,
            self.params.hash_count,
            positions,
        );
        let replies = run_batch(&mut self.store, &batch, "extend")?;
        Ok(batch
            .demux(&replies)
            .into_iter()
            .filter(|&present| !present)
            .count())
    }

    /// `true` if every bit of `item` is set. False positives are possible,
    /// false negatives are not.
    pub fn contains(&mut self, item: &[u8]) -> Result<bool> {
        let positions = self.positions(item);
        let batch = CommandBatch::get_bits(
            &self.layout,
            self.params.hash_count,
            [positions],
        );
        let replies = run_batch(&mut self.store, &batch, "contains")?;
        Ok(batch.demux(&replies).first().copied().unwrap_or(false))
    }

    /// Membership of each item, in input order, from one round trip.
    pub fn contains_each<T: AsRef<[u8]>>(&mut self, items: &[T]) -> Result<Vec<bool>> {
        let positions: Vec<Vec<u64>> = items
            .iter()
            .map(|item| self.positions(item.as_ref()))
            .collect();
        let batch = CommandBatch::get_bits(
            &self.layout,
            self.params.hash_count,
            positions,
        );
        let replies = run_batch(&mut self.store, &batch, "contains")?;
        Ok(batch.demux(&replies))
    }

    /// The items that are (probably) in the filter, in input order.
    ///
    /// This is a set intersection rather than a per-item answer; use
    /// [`contains_each`](BloomFilter::contains_each) to get one boolean per
    /// item.
    pub fn contains_many<'a, T: AsRef<[u8]>>(
        &mut self,
        items: &'a [T],
    ) -> Result<Vec<&'a T>> {
        let found = self.contains_each(items)?;
        Ok(items
            .iter()
            .zip(found)
            .filter_map(|(item, present)| present.then_some(item))
            .collect())
    }

    /// Removes every shard key. Deleting an empty filter is a no-op.
    ///
    /// Keys are removed by one `DEL`, which is not atomic with respect to
    /// writers on other connections: a concurrent `add` may recreate a shard
    /// right after it was removed.
    pub fn delete(&mut self) -> Result<()> {
        let removed = self.store.delete(self.layout.keys()).map_err(|e| {
            warn!(name = %self.config.name, error = %e, "Delete failed");
            e
        })?;
        debug!(name = %self.config.name, removed, "Filter deleted");
        Ok(())
    }
}

fn run_batch<S: BitStore>(
    store: &mut S,
    batch: &CommandBatch<'_>,
    operation: &'static str,
) -> Result<Vec<bool>> {
    debug!(
        operation,
        items = batch.num_items(),
        commands = batch.commands().len(),
        shards = batch.shards_touched(),
        "Executing batch"
    );
    let replies = store.execute_batch(batch.commands()).map_err(|e| {
        warn!(operation, error = %e, "Store batch failed");
        e
    })?;
    Ok(replies)
}

#[cfg(feature = "redis")]
impl BloomFilter<crate::redis_storage::RedisStore> {
    /// Validates `config`, then connects to Redis.
    ///
    /// Invalid parameters are reported before any network activity.
    pub fn connect(
        config: FilterConfig,
        connection: &crate::config::ConnectionConfig,
    ) -> Result<Self> {
        config.validate()?;
        let store = crate::redis_storage::RedisStore::connect(connection)?;
        Self::new(config, store)
    }
}

impl<S: BitStore> std::fmt::Debug for BloomFilter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BloomFilter {{ name: {}, capacity: {}, false_positive_rate: {}, bit_count: {}, hash_count: {}, shards: {} }}",
            self.config.name,
            self.config.capacity,
            self.config.false_positive_rate,
            self.params.bit_count,
            self.params.hash_count,
            self.layout.num_shards()
        )
    }
}
