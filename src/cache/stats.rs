//! Cache Statistics Module
//!
//! Tracks hits, misses, expirations, rejections and memory usage.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Reads that found a live entry
    pub hits: u64,
    /// Reads that found nothing live (absent or expired)
    pub misses: u64,
    /// Entries evicted lazily by a read that found them expired
    pub expired: u64,
    /// Entries evicted by a sweep (reaper or full purge)
    pub reaped: u64,
    /// Writes refused because of the memory budget
    pub rejected: u64,
    /// Entries physically present, including expired ones not yet evicted
    pub entries: u64,
    /// Estimated bytes in use
    pub used_memory: u64,
    /// Memory budget in bytes
    pub max_memory: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_expired(&mut self) {
        self.expired += 1;
    }

    pub fn record_reaped(&mut self, count: usize) {
        self.reaped += count as u64;
    }

    pub fn record_rejection(&mut self) {
        self.rejected += 1;
    }
}
