//! Cache Store Module
//!
//! Storage engine combining HashMap storage with memory accounting, lazy
//! expiry on reads, an expiry-ordered index for purges and a sampling index
//! for the reaper.

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::cache::memory::{entry_size, EstimateSize, MemoryBudget};
use crate::cache::{CacheEntry, CacheStats};
use crate::error::{CacheError, Result};

/// Outcome of the lazy-expiry check for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Liveness {
    Absent,
    Expired,
    Live,
}

/// Number of keys one sweep examines: `ceil(len / divisor)`.
pub fn sample_size(len: usize, divisor: usize) -> usize {
    len.div_ceil(divisor.max(1))
}

// == Cache Store ==
/// Key-value storage with TTL expiry and a memory budget.
///
/// Not synchronized; `Cache` keeps it behind a single mutex so the map, the
/// index and the budget always change together.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Every key in `entries`, at the position recorded in its entry's slot
    index: Vec<String>,
    /// Next index position the reaper examines
    cursor: usize,
    /// `(expire_at, key)` for every entry, soonest first
    expiries: BTreeSet<(Instant, String)>,
    /// Estimated memory in use and its limit
    budget: MemoryBudget,
    /// Performance statistics
    stats: CacheStats,
}

impl<V: EstimateSize + Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates an empty store with a budget of `max_memory` bytes.
    pub fn new(max_memory: u64) -> Self {
        Self {
            entries: HashMap::new(),
            index: Vec::new(),
            cursor: 0,
            expiries: BTreeSet::new(),
            budget: MemoryBudget::new(max_memory),
            stats: CacheStats::new(),
        }
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl`.
    ///
    /// An existing entry is replaced and its size given back to the budget.
    /// The budget check runs against the net change before anything is
    /// touched, so a rejected write leaves the store exactly as it was.
    pub fn set(&mut self, key: String, value: V, ttl: Duration) -> Result<()> {
        let size = entry_size(&key, &value);
        let reclaimed = self.entries.get(&key).map_or(0, |entry| entry.size);

        if !self.budget.admits(size, reclaimed) {
            self.stats.record_rejection();
            debug!(
                "Rejected set of '{}': {} bytes with {} of {} bytes in use",
                key,
                size,
                self.budget.used(),
                self.budget.max()
            );
            return Err(CacheError::CapacityExceeded {
                key,
                requested: size,
                used: self.budget.used(),
                max: self.budget.max(),
            });
        }

        let mut entry = CacheEntry::new(value, ttl, size, Instant::now());
        self.expiries.insert((entry.expire_at, key.clone()));
        match self.entries.get_mut(&key) {
            Some(existing) => {
                entry.slot = existing.slot;
                self.budget.release(existing.size);
                if existing.expire_at != entry.expire_at {
                    self.expiries.remove(&(existing.expire_at, key));
                }
                *existing = entry;
            }
            None => {
                entry.slot = self.index.len();
                self.index.push(key.clone());
                self.entries.insert(key, entry);
            }
        }
        self.budget.charge(size);

        Ok(())
    }

    // == Get ==
    /// Returns a copy of the value if the key is present and live.
    ///
    /// An expired entry is removed on the way out.
    pub fn get(&mut self, key: &str) -> Option<V> {
        match self.check_live(key, Instant::now()) {
            Liveness::Live => {
                self.stats.record_hit();
                self.entries.get(key).map(|entry| entry.value.clone())
            }
            Liveness::Expired => {
                self.stats.record_expired();
                self.stats.record_miss();
                None
            }
            Liveness::Absent => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether anything was removed.
    pub fn del(&mut self, key: &str) -> bool {
        self.remove_entry(key).is_some()
    }

    // == Exists ==
    /// Checks whether the key is present and live, evicting it if expired.
    pub fn exists(&mut self, key: &str) -> bool {
        match self.check_live(key, Instant::now()) {
            Liveness::Live => true,
            Liveness::Expired => {
                self.stats.record_expired();
                false
            }
            Liveness::Absent => false,
        }
    }

    // == Time To Live ==
    /// Returns the time left before `key` expires, if it is present and
    /// live. An expired entry is removed, as with `exists`.
    pub fn ttl(&mut self, key: &str) -> Option<Duration> {
        match self.check_live(key, Instant::now()) {
            Liveness::Live => self.entries.get(key).map(CacheEntry::ttl_remaining),
            Liveness::Expired => {
                self.stats.record_expired();
                None
            }
            Liveness::Absent => None,
        }
    }

    // == Flush ==
    /// Drops every entry and zeroes the memory in use.
    pub fn flush(&mut self) {
        let dropped = self.entries.len();
        self.entries.clear();
        self.index.clear();
        self.expiries.clear();
        self.cursor = 0;
        self.budget.reset();
        debug!("Flushed {} entries", dropped);
    }

    // == Keys ==
    /// Returns the number of live keys.
    ///
    /// Expired entries are purged first, so the count never includes a key
    /// that `exists` would deny. The purge only visits expired entries.
    pub fn keys(&mut self) -> u64 {
        self.purge_expired();
        self.entries.len() as u64
    }

    // == Reap Sample ==
    /// Examines `ceil(len / divisor)` keys and evicts the expired ones.
    ///
    /// The scan resumes where the previous one stopped and wraps around the
    /// index, so repeated sweeps cover every key. Returns the number of
    /// entries evicted.
    pub fn reap_sample(&mut self, divisor: usize) -> usize {
        let budget = sample_size(self.index.len(), divisor);
        let now = Instant::now();
        let mut removed = 0;

        for _ in 0..budget {
            if self.index.is_empty() {
                break;
            }
            if self.cursor >= self.index.len() {
                self.cursor = 0;
            }

            let key = self.index[self.cursor].clone();
            match self.check_live(&key, now) {
                // The last key was swapped into the cursor slot; look at it next.
                Liveness::Expired => removed += 1,
                Liveness::Live | Liveness::Absent => self.cursor += 1,
            }
        }

        self.stats.record_reaped(removed);
        removed
    }

    // == Purge Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Walks the expiry index from the soonest deadline and stops at the
    /// first live entry. Returns the number of entries removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        while self.expiries.first().is_some_and(|(expire_at, _)| *expire_at < now) {
            if let Some((_, key)) = self.expiries.pop_first() {
                self.remove_entry(&key);
                removed += 1;
            }
        }

        self.stats.record_reaped(removed);
        removed
    }

    // == Memory ==
    pub fn used_memory(&self) -> u64 {
        self.budget.used()
    }

    pub fn max_memory(&self) -> u64 {
        self.budget.max()
    }

    /// Replaces the budget. Entries already stored stay put even if they now
    /// exceed it; only later writes are held to the new limit.
    pub fn set_max_memory(&mut self, bytes: u64) {
        self.budget.set_max(bytes);
    }

    // == Length ==
    /// Returns the number of entries physically held, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.entries = self.entries.len() as u64;
        stats.used_memory = self.budget.used();
        stats.max_memory = self.budget.max();
        stats
    }

    /// Lazy-expiry check shared by reads and sweeps. Removes the entry when
    /// it turns out to be expired.
    fn check_live(&mut self, key: &str, now: Instant) -> Liveness {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired_at(now),
            None => return Liveness::Absent,
        };

        if expired {
            self.remove_entry(key);
            Liveness::Expired
        } else {
            Liveness::Live
        }
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let (key, entry) = self.entries.remove_entry(key)?;
        self.expiries.remove(&(entry.expire_at, key));

        self.index.swap_remove(entry.slot);
        if let Some(moved) = self.index.get(entry.slot) {
            if let Some(moved_entry) = self.entries.get_mut(moved) {
                moved_entry.slot = entry.slot;
            }
        }
        self.budget.release(entry.size);

        Some(entry)
    }

    /// Sum of entry sizes recomputed from scratch.
    #[cfg(test)]
    pub(crate) fn recomputed_memory(&self) -> u64 {
        self.entries.values().map(|entry| entry.size).sum()
    }

    /// Whether every key sits in the index at its recorded slot and in the
    /// expiry index under its current deadline.
    #[cfg(test)]
    pub(crate) fn index_is_consistent(&self) -> bool {
        self.index.len() == self.entries.len()
            && self.expiries.len() == self.entries.len()
            && self
                .index
                .iter()
                .enumerate()
                .all(|(slot, key)| self.entries.get(key).is_some_and(|e| e.slot == slot))
            && self
                .expiries
                .iter()
                .all(|(at, key)| self.entries.get(key).is_some_and(|e| e.expire_at == *at))
    }
}
