use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::execution::PoolSettings;

pub const TRADE_POOL_NAME: &str = "databaseTaskExecutor";
pub const PAYMENT_POOL_NAME: &str = "paymentTaskExecutor";

const DEFAULT_TRADE_PREFIX: &str = "db-io-";
const DEFAULT_PAYMENT_PREFIX: &str = "payment-io-";

/// How the pool monitor discovers worker threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadIntrospection {
    /// Each pool's own live-worker table.
    Tracked,
    /// Scan the process's OS threads (Linux `/proc/self/task`).
    Procfs,
}

impl ThreadIntrospection {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "tracked" => Some(ThreadIntrospection::Tracked),
            "procfs" | "proc" => Some(ThreadIntrospection::Procfs),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Worker pools
    pub trade_pool: PoolSettings,
    pub payment_pool: PoolSettings,

    // Hardcoded sources
    pub trade_source_latency: Duration,
    pub payment_source_latency: Duration,
    pub hardcoded_trade_count: i64,

    // Observability
    pub thread_introspection: ThreadIntrospection,
    pub metrics_addr: Option<SocketAddr>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let keep_alive = Duration::from_secs(parse_var("POOL_KEEP_ALIVE_SECS", 60u64)?);

        let trade_pool = PoolSettings {
            name: TRADE_POOL_NAME.into(),
            thread_name_prefix: prefix_var("TRADE_POOL_THREAD_PREFIX", DEFAULT_TRADE_PREFIX),
            core_size: parse_var("TRADE_POOL_CORE_SIZE", 10)?,
            max_size: parse_var("TRADE_POOL_MAX_SIZE", 50)?,
            queue_capacity: parse_var("TRADE_POOL_QUEUE_CAPACITY", 100)?,
            keep_alive,
        };

        let payment_pool = PoolSettings {
            name: PAYMENT_POOL_NAME.into(),
            thread_name_prefix: prefix_var("PAYMENT_POOL_THREAD_PREFIX", DEFAULT_PAYMENT_PREFIX),
            core_size: parse_var("PAYMENT_POOL_CORE_SIZE", 4)?,
            max_size: parse_var("PAYMENT_POOL_MAX_SIZE", 8)?,
            queue_capacity: parse_var("PAYMENT_POOL_QUEUE_CAPACITY", 50)?,
            keep_alive,
        };

        let introspection_raw =
            env::var("THREAD_INTROSPECTION").unwrap_or_else(|_| "tracked".into());
        let thread_introspection = ThreadIntrospection::from_str(&introspection_raw)
            .ok_or_else(|| {
                anyhow::anyhow!("THREAD_INTROSPECTION must be 'tracked' or 'procfs', got '{introspection_raw}'")
            })?;

        let metrics_addr = match env::var("METRICS_ADDR") {
            Ok(raw) if !raw.trim().is_empty() => Some(raw.trim().parse()?),
            _ => None,
        };

        Ok(Self {
            trade_pool,
            payment_pool,
            trade_source_latency: Duration::from_millis(parse_var("TRADE_SOURCE_LATENCY_MS", 150u64)?),
            payment_source_latency: Duration::from_millis(parse_var("PAYMENT_SOURCE_LATENCY_MS", 100u64)?),
            hardcoded_trade_count: parse_var("HARDCODED_TRADE_COUNT", 30i64)?,
            thread_introspection,
            metrics_addr,
        })
    }
}

/// Read `key` and parse it, falling back to `default` when unset.
/// A value that is set but malformed is an error.
fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} has invalid value '{raw}': {e}")),
        Err(_) => Ok(default),
    }
}

/// Thread name prefixes may be set to an empty string to leave workers unnamed.
fn prefix_var(key: &str, default: &str) -> Option<String> {
    let value = env::var(key).unwrap_or_else(|_| default.into());
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
