//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::cache::{ByteSize, DEFAULT_MAX_MEMORY};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Memory budget in bytes
    pub max_memory: u64,
    /// Interval between reaper sweeps
    pub reaper_interval: Duration,
    /// Each sweep examines `1 / sample_divisor` of the entries
    pub sample_divisor: usize,
    /// TTL the soak driver writes with
    pub default_ttl: Duration,
    /// Keys the soak driver writes per second
    pub writes_per_tick: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_MEMORY` - Memory budget as a size spec, e.g. `100MB` (default: 1KB)
    /// - `CACHE_REAPER_INTERVAL` - Seconds between reaper sweeps (default: 2)
    /// - `CACHE_SAMPLE_DIVISOR` - Sample 1/N of the entries per sweep (default: 10)
    /// - `CACHE_DEFAULT_TTL` - TTL in seconds used by the soak driver (default: 5)
    /// - `CACHE_WRITES_PER_TICK` - Soak driver writes per second (default: 100)
    ///
    /// Unparsable or zero values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_memory: env::var("CACHE_MAX_MEMORY")
                .ok()
                .and_then(|v| v.parse::<ByteSize>().ok())
                .map(ByteSize::bytes)
                .filter(|bytes| *bytes > 0)
                .unwrap_or(defaults.max_memory),
            reaper_interval: env_number("CACHE_REAPER_INTERVAL")
                .map(Duration::from_secs)
                .unwrap_or(defaults.reaper_interval),
            sample_divisor: env_number("CACHE_SAMPLE_DIVISOR")
                .map(|v| v as usize)
                .unwrap_or(defaults.sample_divisor),
            default_ttl: env_number("CACHE_DEFAULT_TTL")
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_ttl),
            writes_per_tick: env_number("CACHE_WRITES_PER_TICK")
                .map(|v| v as usize)
                .unwrap_or(defaults.writes_per_tick),
        }
    }

    pub fn with_max_memory(mut self, bytes: u64) -> Self {
        self.max_memory = bytes;
        self
    }

    pub fn with_reaper_interval(mut self, interval: Duration) -> Self {
        self.reaper_interval = interval;
        self
    }

    pub fn with_sample_divisor(mut self, divisor: usize) -> Self {
        self.sample_divisor = divisor.max(1);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_memory: DEFAULT_MAX_MEMORY,
            reaper_interval: Duration::from_secs(2),
            sample_divisor: 10,
            default_ttl: Duration::from_secs(5),
            writes_per_tick: 100,
        }
    }
}

/// Reads a positive integer from the environment.
fn env_number(name: &str) -> Option<u64> {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|v| *v > 0)
}
