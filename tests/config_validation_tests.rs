use redis_bloom_rs::{
    BloomError, BloomFilter, FilterConfig, FilterConfigBuilder, InMemoryStore,
    MAX_SHARDS, SHARD_BITS,
};

fn config(capacity: u64, fpr: f64) -> FilterConfig {
    FilterConfigBuilder::default()
        .name("validation")
        .capacity(capacity)
        .false_positive_rate(fpr)
        .build()
        .unwrap()
}

fn assert_invalid(config: FilterConfig, expected_msg: &str) {
    match BloomFilter::new(config, InMemoryStore::new()).unwrap_err() {
        BloomError::InvalidParameter(msg) => {
            assert!(
                msg.contains(expected_msg),
                "'{msg}' does not mention '{expected_msg}'"
            );
        }
        other => panic!("Expected InvalidParameter, got {other:?}"),
    }
}

#[cfg(test)]
mod capacity_validation_tests {
    use super::*;

    #[test]
    fn test_zero_capacity_fails() {
        assert_invalid(config(0, 0.01), "Capacity must be > 0");
    }

    #[test]
    fn test_minimum_valid_capacity() {
        let filter = BloomFilter::new(config(1, 0.01), InMemoryStore::new())
            .expect("capacity 1 is valid");
        assert_eq!(filter.bit_count(), 10);
        assert_eq!(filter.hash_count(), 7);
    }

    #[test]
    fn test_large_capacity_succeeds() {
        let filter =
            BloomFilter::new(config(100_000_000, 0.01), InMemoryStore::new())
                .unwrap();
        assert_eq!(filter.num_shards(), 1);
    }

    #[test]
    fn test_capacity_past_u64_bits_fails() {
        assert_invalid(config(u64::MAX, 0.5), "more than 2^64");
        assert_invalid(config(u64::MAX / 2, f64::MIN_POSITIVE), "more than 2^64");
    }

    #[test]
    fn test_capacity_past_shard_limit_fails() {
        // ~9.6e12 bits, 2232 full-size shards
        assert_invalid(config(1_000_000_000_000, 0.01), "at most");

        // ~9.6e11 bits, 224 shards
        let filter =
            BloomFilter::new(config(100_000_000_000, 0.01), InMemoryStore::new())
                .unwrap();
        assert_eq!(filter.num_shards(), 224);
        assert!(filter.num_shards() as u64 <= MAX_SHARDS);
    }
}

#[cfg(test)]
mod false_positive_rate_validation_tests {
    use super::*;

    #[test]
    fn test_zero_fpr_fails() {
        assert_invalid(config(1000, 0.0), "FPR must be between 0 and 1");
    }

    #[test]
    fn test_one_fpr_fails() {
        assert_invalid(config(1000, 1.0), "FPR must be between 0 and 1");
    }

    #[test]
    fn test_negative_fpr_fails() {
        assert_invalid(config(1000, -0.1), "FPR must be between 0 and 1");
    }

    #[test]
    fn test_greater_than_one_fpr_fails() {
        assert_invalid(config(1000, 1.5), "FPR must be between 0 and 1");
    }

    #[test]
    fn test_boundary_fprs_succeed() {
        for fpr in [f64::MIN_POSITIVE, 0.5, 0.999_999] {
            assert!(
                BloomFilter::new(config(1000, fpr), InMemoryStore::new()).is_ok(),
                "FPR {fpr} should be accepted"
            );
        }
    }
}

#[cfg(test)]
mod layout_validation_tests {
    use super::*;

    #[test]
    fn test_empty_name_fails() {
        let mut cfg = config(1000, 0.01);
        cfg.name.clear();
        assert_invalid(cfg, "Name must not be empty");
    }

    #[test]
    fn test_shard_size_bounds() {
        let mut cfg = config(1000, 0.01);
        cfg.shard_bits = 0;
        assert_invalid(cfg, "Shard size");

        let mut cfg = config(1000, 0.01);
        cfg.shard_bits = SHARD_BITS + 1;
        assert_invalid(cfg, "Shard size");

        let mut cfg = config(1000, 0.01);
        cfg.shard_bits = SHARD_BITS;
        assert!(BloomFilter::new(cfg, InMemoryStore::new()).is_ok());
    }

    #[test]
    fn test_shard_count_boundary() {
        // 47_926 bits: 1020 shards of 47 bits fit, 1042 shards of 46 do not
        let mut cfg = config(10_000, 0.1);
        cfg.shard_bits = 47;
        let filter = BloomFilter::new(cfg, InMemoryStore::new()).unwrap();
        assert_eq!(filter.num_shards(), 1020);

        let mut cfg = config(10_000, 0.1);
        cfg.shard_bits = 46;
        assert_invalid(cfg, "Filter needs 1042 shards");
    }
}

#[cfg(test)]
mod determinism_tests {
    use super::*;

    #[test]
    fn test_same_config_same_geometry() {
        let a = BloomFilter::new(config(10_000, 0.1), InMemoryStore::new()).unwrap();
        let b = BloomFilter::new(config(10_000, 0.1), InMemoryStore::new()).unwrap();

        assert_eq!(a.bit_count(), 47_926);
        assert_eq!(a.hash_count(), 3);
        assert_eq!(a.params(), b.params());
        assert_eq!(a.keys(), b.keys());
        assert_eq!(a.positions(b"hello"), b.positions(b"hello"));
    }

    #[test]
    fn test_invalid_config_never_touches_store() {
        let store = InMemoryStore::new();
        assert!(BloomFilter::new(config(0, 0.5), store.clone()).is_err());
        assert_eq!(store.round_trips(), 0);
    }
}
