use clap::{Args, Parser, Subcommand};
use rand::seq::SliceRandom;
use redis_bloom_rs::{
    BloomFilter, ConnectionConfig, FilterConfigBuilder, RedisStore,
    common::bits2hr,
};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(flatten)]
    filter: FilterArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConnectionArgs {
    /// Redis host
    #[arg(long, env = "REDIS_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Redis port
    #[arg(long, env = "REDIS_PORT", default_value = "6379")]
    port: u16,

    /// Redis password
    #[arg(long, env = "REDIS_PASSWORD")]
    password: Option<String>,

    /// Logical database
    #[arg(long, env = "REDIS_DB", default_value = "0")]
    db: i64,

    /// Connect/read/write timeout in milliseconds
    #[arg(long, env = "REDIS_TIMEOUT_MS", default_value = "1500")]
    timeout_ms: u64,
}

#[derive(Args)]
struct FilterArgs {
    /// Filter name, used as the shard key prefix
    #[arg(short, long, default_value = "bloom")]
    name: String,

    /// Filter capacity
    #[arg(short, long, default_value = "10000")]
    capacity: u64,

    /// False positive rate (between 0 and 1)
    #[arg(short, long, default_value = "0.01")]
    fpr: f64,
}

#[derive(Subcommand)]
enum Commands {
    /// Add elements to the filter
    Add {
        /// Elements to add
        #[arg(required = true)]
        elements: Vec<String>,
    },

    /// Check which elements are in the filter
    Check {
        /// Elements to check
        #[arg(required = true)]
        elements: Vec<String>,
    },

    /// Delete every shard key of the filter
    Delete,

    /// Display the filter geometry
    Info,

    /// Compare batched and serial throughput on random words, using a
    /// scratch filter named `{name}:bench` that is wiped before and after
    Bench {
        /// Number of words to insert
        #[arg(long, default_value = "5000")]
        count: usize,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let connection = ConnectionConfig {
        host: cli.connection.host,
        port: cli.connection.port,
        password: cli.connection.password.filter(|p| !p.is_empty()),
        db: cli.connection.db,
        timeout: Duration::from_millis(cli.connection.timeout_ms),
    };
    let name = if matches!(cli.command, Commands::Bench { .. }) {
        bench_filter_name(&cli.filter.name)
    } else {
        cli.filter.name
    };
    let config = FilterConfigBuilder::default()
        .name(name)
        .capacity(cli.filter.capacity)
        .false_positive_rate(cli.filter.fpr)
        .build()?;

    let mut filter = BloomFilter::connect(config, &connection)?;

    match cli.command {
        Commands::Add { elements } => {
            let added = filter.extend(&elements)?;
            println!(
                "Added {} element(s), {} were new",
                elements.len(),
                added
            );
        }
        Commands::Check { elements } => {
            let found = filter.contains_each(&elements)?;
            for (element, present) in elements.iter().zip(found) {
                if present {
                    println!("{element}: probably present");
                } else {
                    println!("{element}: absent");
                }
            }
        }
        Commands::Delete => {
            filter.delete()?;
            println!("Deleted keys: {}", filter.keys().join(", "));
        }
        Commands::Info => print_info(&filter),
        Commands::Bench { count } => run_bench(&mut filter, count)?,
    }

    Ok(())
}

/// Bench deletes its filter, so it never runs against the one named by `--name`.
fn bench_filter_name(name: &str) -> String {
    format!("{name}:bench")
}

fn print_info(filter: &BloomFilter<RedisStore>) {
    println!("Bloom Filter Configuration:");
    println!("  Name: {}", filter.name());
    println!("  Capacity: {}", filter.capacity());
    println!("  False positive rate: {}", filter.false_positive_rate());
    println!("  Bits: {} ({})", filter.bit_count(), bits2hr(filter.bit_count()));
    println!("  Hash functions: {}", filter.hash_count());
    println!("  Keys: {}", filter.keys().join(", "));
}

fn sample_words(count: usize) -> Vec<String> {
    let mut rng = rand::rng();
    let mut letters: Vec<u8> = (b'a'..=b'z').collect();
    (0..count)
        .map(|_| {
            letters.shuffle(&mut rng);
            String::from_utf8_lossy(&letters[..20]).into_owned()
        })
        .collect()
}

fn rate(count: usize, elapsed: Duration) -> f64 {
    count as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
}

fn run_bench(
    filter: &mut BloomFilter<RedisStore>,
    count: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Generating {} random test words", count * 2);
    let included = sample_words(count);
    let excluded = sample_words(count);
    println!(
        "Filter using {} hash functions and {} bits",
        filter.hash_count(),
        filter.bit_count()
    );

    filter.delete()?;
    let start = Instant::now();
    filter.extend(&included)?;
    let elapsed = start.elapsed();
    println!(
        "Batch insert : {elapsed:?} ({:.0} words / second)",
        rate(count, elapsed)
    );

    filter.delete()?;
    let start = Instant::now();
    for word in &included {
        filter.add(word.as_bytes())?;
    }
    let elapsed = start.elapsed();
    println!(
        "Serial insert: {elapsed:?} ({:.0} words / second)",
        rate(count, elapsed)
    );

    let start = Instant::now();
    let found = filter.contains_many(&included)?;
    let elapsed = start.elapsed();
    println!(
        "Batch test   : {elapsed:?} ({:.0} words / second)",
        rate(count, elapsed)
    );
    if found.len() != included.len() {
        println!(
            "  {} inserted words were reported absent",
            included.len() - found.len()
        );
    }

    let start = Instant::now();
    for word in &included {
        filter.contains(word.as_bytes())?;
    }
    let elapsed = start.elapsed();
    println!(
        "Serial test  : {elapsed:?} ({:.0} words / second)",
        rate(count, elapsed)
    );

    let false_positives = filter.contains_many(&excluded)?;
    println!(
        "False positive rate: {:.6} ({} expected)",
        false_positives.len() as f64 / excluded.len().max(1) as f64,
        filter.false_positive_rate()
    );

    filter.delete()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bench_uses_scratch_filter() {
        let cli = Cli::parse_from(["rbloom", "--name", "live", "bench"]);
        assert_eq!(cli.filter.name, "live");
        assert!(matches!(cli.command, Commands::Bench { count: 5000 }));
        assert_eq!(bench_filter_name(&cli.filter.name), "live:bench");
        assert_ne!(bench_filter_name("live"), "live");
    }
}
