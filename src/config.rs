//! Process configuration, read once from the environment at entry-point
//! startup (Design Notes: "process-wide state... replace with an explicit
//! process context").

use std::env;
use std::time::Duration;

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Immutable snapshot of everything the binaries need from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub redis_host: String,
    pub redis_port: u16,
    pub driver_stream: String,
    pub order_stream: String,
    pub produce_interval: Duration,

    /// H3 resolutions this deployment aggregates at.
    pub resolutions: Vec<u8>,
    /// Default window length, in minutes, for windowed queries.
    pub window_minutes: i64,
    /// Base price the surge calculator multiplies against.
    pub base_price: f64,

    pub batch_size: usize,
    pub reclaim_interval: Duration,
    pub read_timeout: Duration,
    pub idle_sleep: Duration,
    pub min_idle_for_reclaim: Duration,

    /// Bind address for the Read API.
    pub api_bind_addr: String,

    /// Path to the SQLite database the persister writes to.
    pub persist_db_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Config {
    /// Loads configuration from the process environment, falling back to
    /// spec-mandated defaults for anything unset. Does not panic: every
    /// field has a usable default.
    pub fn from_env() -> Self {
        let _ = dotenv::dotenv();

        Self {
            redis_host: env_string("REDIS_HOST", "localhost"),
            redis_port: env_parsed("REDIS_PORT", 6379u16),
            driver_stream: env_string("REDIS_STREAM", "driver_position_stream"),
            order_stream: env_string("ORDER_REDIS_STREAM", "order_stream"),
            produce_interval: Duration::from_secs_f64(env_parsed("PRODUCE_INTERVAL", 1.0f64)),

            resolutions: vec![7, 8, 9],
            window_minutes: env_parsed("SURGE_WINDOW_MINUTES", 5i64),
            base_price: env_parsed("SURGE_BASE_PRICE", 10.0f64),

            batch_size: env_parsed("STREAM_BATCH_SIZE", 10usize),
            reclaim_interval: Duration::from_secs(env_parsed("STREAM_RECLAIM_INTERVAL_SECS", 60u64)),
            read_timeout: Duration::from_millis(env_parsed("STREAM_READ_TIMEOUT_MS", 2000u64)),
            idle_sleep: Duration::from_millis(env_parsed("STREAM_IDLE_SLEEP_MS", 100u64)),
            min_idle_for_reclaim: Duration::from_millis(env_parsed(
                "STREAM_MIN_IDLE_FOR_RECLAIM_MS",
                60_000u64,
            )),

            api_bind_addr: env_string("API_BIND_ADDR", "0.0.0.0:8080"),
            persist_db_path: env_string("PERSIST_DB_PATH", "surge_pricing_events.db"),
        }
    }

    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}", self.redis_host, self.redis_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        // SAFETY: tests run single-threaded within this process's test harness
        // for this module; no other test mutates these specific env vars.
        for key in [
            "REDIS_HOST",
            "REDIS_PORT",
            "REDIS_STREAM",
            "ORDER_REDIS_STREAM",
            "PRODUCE_INTERVAL",
        ] {
            env::remove_var(key);
        }
        let cfg = Config::from_env();
        assert_eq!(cfg.redis_host, "localhost");
        assert_eq!(cfg.redis_port, 6379);
        assert_eq!(cfg.driver_stream, "driver_position_stream");
        assert_eq!(cfg.order_stream, "order_stream");
        assert_eq!(cfg.produce_interval, Duration::from_secs_f64(1.0));
        assert_eq!(cfg.resolutions, vec![7, 8, 9]);
    }
}
