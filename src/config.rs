use crate::error::{BloomError, Result};
use crate::hash::{
    HashFunction, default_hash_function, optimal_bit_count, optimal_num_hashes,
    required_bits,
};
use crate::shard::{MAX_SHARDS, SHARD_BITS};
use derive_builder::Builder;
use std::str::FromStr;
use std::time::Duration;

/// What a filter is: where its bits live and how they are sized.
///
/// Two filters built from equal configs against the same store address the
/// same bits, so the config is effectively the filter's identity.
#[derive(Clone, Debug, Builder)]
#[builder(pattern = "owned")]
pub struct FilterConfig {
    /// Key prefix; shard keys are `{name}.0`, `{name}.1`, ...
    #[builder(setter(into))]
    pub name: String,

    /// Maximum number of elements
    #[builder(default = "1_000_000")]
    pub capacity: u64,

    /// Target false positive rate (0.0 to 1.0)
    #[builder(default = "0.01")]
    pub false_positive_rate: f64,

    /// Hash function to use
    #[builder(default = "default_hash_function")]
    pub hash_function: HashFunction,

    /// Bits per shard key
    #[builder(default = "SHARD_BITS")]
    pub shard_bits: u64,
}

impl FilterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(BloomError::InvalidParameter(
                "Name must not be empty".into(),
            ));
        }
        if self.capacity == 0 {
            return Err(BloomError::InvalidParameter(
                "Capacity must be > 0".into(),
            ));
        }
        // Also rejects NaN
        if !(self.false_positive_rate > 0.0 && self.false_positive_rate < 1.0) {
            return Err(BloomError::InvalidParameter(format!(
                "FPR must be between 0 and 1, got {}",
                self.false_positive_rate
            )));
        }
        if self.shard_bits == 0 || self.shard_bits > SHARD_BITS {
            return Err(BloomError::InvalidParameter(format!(
                "Shard size must be between 1 and {SHARD_BITS} bits, got {}",
                self.shard_bits
            )));
        }

        // u64::MAX as f64 rounds up to exactly 2^64
        let bits = required_bits(self.capacity, self.false_positive_rate);
        if bits >= u64::MAX as f64 {
            return Err(BloomError::InvalidParameter(format!(
                "Capacity {} at FPR {} needs {bits:e} bits, more than 2^64",
                self.capacity, self.false_positive_rate
            )));
        }
        let shards = (bits as u64).div_ceil(self.shard_bits);
        if shards > MAX_SHARDS {
            return Err(BloomError::InvalidParameter(format!(
                "Filter needs {shards} shards of {} bits, at most {MAX_SHARDS} allowed",
                self.shard_bits
            )));
        }
        Ok(())
    }
}

/// Derived parameters calculated from FilterConfig
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterParams {
    pub bit_count: u64,
    pub hash_count: usize,
    pub num_shards: usize,
}

impl From<&FilterConfig> for FilterParams {
    fn from(config: &FilterConfig) -> Self {
        let bit_count =
            optimal_bit_count(config.capacity, config.false_positive_rate);
        let hash_count = optimal_num_hashes(config.capacity, bit_count);

        Self {
            bit_count,
            hash_count,
            num_shards: bit_count.div_ceil(config.shard_bits) as usize,
        }
    }
}

/// How to reach the Redis server holding the bits.
#[derive(Builder, Clone, Debug, PartialEq)]
#[builder(pattern = "owned")]
pub struct ConnectionConfig {
    #[builder(setter(into), default = "\"127.0.0.1\".to_string()")]
    pub host: String,
    #[builder(default = "6379")]
    pub port: u16,
    #[builder(setter(into, strip_option), default)]
    pub password: Option<String>,
    /// Logical database selected after connecting
    #[builder(default = "0")]
    pub db: i64,
    /// Applied to connect, read and write
    #[builder(default = "Duration::from_millis(1_500)")]
    pub timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            db: 0,
            timeout: Duration::from_millis(1_500),
        }
    }
}

impl ConnectionConfig {
    /// Reads `REDIS_HOST`, `REDIS_PORT`, `REDIS_PASSWORD`, `REDIS_DB` and
    /// `REDIS_TIMEOUT_MS`, after loading a `.env` file if there is one.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let password = std::env::var("REDIS_PASSWORD")
            .ok()
            .filter(|p| !p.is_empty());

        Ok(Self {
            host: std::env::var("REDIS_HOST").unwrap_or(defaults.host),
            port: env_or("REDIS_PORT", defaults.port)?,
            password,
            db: env_or("REDIS_DB", defaults.db)?,
            timeout: Duration::from_millis(env_or(
                "REDIS_TIMEOUT_MS",
                defaults.timeout.as_millis() as u64,
            )?),
        })
    }
}

fn env_or<T>(var_name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(var_name) {
        Ok(value) => parse_var(var_name, &value),
        Err(_) => Ok(default),
    }
}

fn parse_var<T>(var_name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| BloomError::EnvParseError {
        var_name: var_name.to_string(),
        value: value.to_string(),
        error: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = FilterConfigBuilder::default().name("f").build().unwrap();
        assert_eq!(config.capacity, 1_000_000);
        assert_eq!(config.false_positive_rate, 0.01);
        assert_eq!(config.shard_bits, SHARD_BITS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_name_is_required() {
        assert!(FilterConfigBuilder::default().capacity(10).build().is_err());
    }

    #[test]
    fn test_params_from_config() {
        let config = FilterConfigBuilder::default()
            .name("f")
            .capacity(10_000)
            .false_positive_rate(0.1)
            .build()
            .unwrap();
        let params = FilterParams::from(&config);
        assert_eq!(
            params,
            FilterParams {
                bit_count: 47_926,
                hash_count: 3,
                num_shards: 1,
            }
        );
    }

    #[test]
    fn test_validate_rejects_nan_rate() {
        let config = FilterConfigBuilder::default()
            .name("f")
            .false_positive_rate(f64::NAN)
            .build()
            .unwrap();
        assert!(config.validate().unwrap_err().is_invalid_parameter());
    }

    #[test]
    fn test_validate_rejects_geometry_past_u64() {
        let config = FilterConfigBuilder::default()
            .name("f")
            .capacity(u64::MAX)
            .false_positive_rate(0.5)
            .build()
            .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.is_invalid_parameter());
        assert!(err.to_string().contains("more than 2^64"), "{err}");
    }

    #[test]
    fn test_parse_var_reports_bad_value() {
        let err = parse_var::<u16>("REDIS_PORT", "not-a-port").unwrap_err();
        match err {
            BloomError::EnvParseError {
                var_name, value, ..
            } => {
                assert_eq!(var_name, "REDIS_PORT");
                assert_eq!(value, "not-a-port");
            }
            other => panic!("Expected EnvParseError, got {other:?}"),
        }
        assert_eq!(parse_var::<i64>("REDIS_DB", "3").unwrap(), 3);
    }

    #[test]
    fn test_connection_builder_matches_default() {
        let built = ConnectionConfigBuilder::default().build().unwrap();
        assert_eq!(built, ConnectionConfig::default());

        let built = ConnectionConfigBuilder::default()
            .host("redis.internal")
            .password("secret")
            .db(2)
            .build()
            .unwrap();
        assert_eq!(built.host, "redis.internal");
        assert_eq!(built.password.as_deref(), Some("secret"));
        assert_eq!(built.db, 2);
    }
}
