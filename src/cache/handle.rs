//! Cache Handle Module
//!
//! The public, thread-safe face of the cache: one store behind one lock,
//! plus the slot for its optional expiry reaper.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::cache::{parse_size, ByteSize, CacheStats, CacheStore, EstimateSize, SharedStore};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::tasks::Reaper;

// == Cache ==
/// Thread-safe cache handle.
///
/// Cloning is cheap and yields another handle to the same entries. Every
/// operation takes the store lock for its whole critical section, so
/// operations on one key are linearized.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use mini_cache::Cache;
///
/// let cache: Cache<String> = Cache::new();
/// assert!(cache.set_max_memory("1MB"));
///
/// cache.set("greeting", "hello".to_string(), Duration::from_secs(60)).unwrap();
/// assert_eq!(cache.get("greeting"), Some("hello".to_string()));
/// assert_eq!(cache.keys(), 1);
/// ```
pub struct Cache<V> {
    store: SharedStore<V>,
    reaper: Arc<Mutex<Option<Reaper>>>,
    reaper_interval: Duration,
    sample_divisor: usize,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            reaper: Arc::clone(&self.reaper),
            reaper_interval: self.reaper_interval,
            sample_divisor: self.sample_divisor,
        }
    }
}

impl<V> Cache<V>
where
    V: EstimateSize + Clone + Send + 'static,
{
    // == Constructors ==
    /// Creates a cache with the default configuration (1KB budget).
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        Self {
            store: Arc::new(Mutex::new(CacheStore::new(config.max_memory))),
            reaper: Arc::new(Mutex::new(None)),
            reaper_interval: config.reaper_interval,
            sample_divisor: config.sample_divisor.max(1),
        }
    }

    // == Set Max Memory ==
    /// Sets the memory budget from a size spec such as `100MB`.
    ///
    /// Returns `false` and keeps the current budget if the spec does not
    /// parse or is zero. Lowering the budget never evicts.
    pub fn set_max_memory(&self, spec: &str) -> bool {
        match self.try_set_max_memory(spec) {
            Ok(_) => true,
            Err(err) => {
                warn!("Memory budget unchanged: {}", err);
                false
            }
        }
    }

    /// Like `set_max_memory`, returning the new budget in bytes.
    pub fn try_set_max_memory(&self, spec: &str) -> Result<u64> {
        let bytes = parse_size(spec)?;
        if bytes == 0 {
            return Err(CacheError::InvalidSizeFormat(spec.to_string()));
        }

        self.store.lock().set_max_memory(bytes);
        debug!("Memory budget set to {}", ByteSize(bytes));
        Ok(bytes)
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl`, replacing any previous value.
    ///
    /// # Errors
    /// `CacheError::CapacityExceeded` if the write does not fit the budget;
    /// the cache is left unchanged.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) -> Result<()> {
        self.store.lock().set(key.into(), value, ttl)
    }

    // == Get ==
    /// Returns a copy of the live value stored under `key`.
    pub fn get(&self, key: &str) -> Option<V> {
        self.store.lock().get(key)
    }

    // == Del ==
    /// Removes `key`. Returns whether it was present.
    pub fn del(&self, key: &str) -> bool {
        self.store.lock().del(key)
    }

    // == Exists ==
    /// Whether `key` holds a live value. Expired entries are evicted.
    pub fn exists(&self, key: &str) -> bool {
        self.store.lock().exists(key)
    }

    // == TTL ==
    /// Time left before `key` expires, or `None` if it is absent or expired.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.store.lock().ttl(key)
    }

    // == Flush ==
    /// Removes every entry. Always succeeds.
    pub fn flush(&self) -> bool {
        self.store.lock().flush();
        true
    }

    // == Keys ==
    /// Number of live keys. Expired entries are evicted before counting.
    pub fn keys(&self) -> u64 {
        self.store.lock().keys()
    }

    // == Inspection ==
    /// Entries physically held, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    pub fn used_memory(&self) -> u64 {
        self.store.lock().used_memory()
    }

    pub fn max_memory(&self) -> u64 {
        self.store.lock().max_memory()
    }

    pub fn stats(&self) -> CacheStats {
        self.store.lock().stats()
    }

    /// Evicts every expired entry now. Returns the number evicted.
    pub fn purge_expired(&self) -> usize {
        self.store.lock().purge_expired()
    }

    // == Reaper ==
    /// Starts the background expiry reaper.
    ///
    /// Returns `Ok(false)` if one is already running for this cache.
    ///
    /// # Errors
    /// `CacheError::RuntimeUnavailable` outside of a Tokio runtime.
    pub fn start_reaper(&self) -> Result<bool> {
        let mut slot = self.reaper.lock();
        if slot.as_ref().is_some_and(|reaper| !reaper.is_finished()) {
            return Ok(false);
        }

        *slot = Some(Reaper::spawn(
            Arc::clone(&self.store),
            self.reaper_interval,
            self.sample_divisor,
        )?);
        Ok(true)
    }

    /// Stops the reaper and waits for it to exit.
    ///
    /// Returns `false` if none was running.
    pub async fn stop_reaper(&self) -> bool {
        let reaper = self.reaper.lock().take();
        match reaper {
            Some(reaper) => {
                reaper.stop().await;
                true
            }
            None => false,
        }
    }

    pub fn is_reaper_running(&self) -> bool {
        self.reaper
            .lock()
            .as_ref()
            .is_some_and(|reaper| !reaper.is_finished())
    }
}

impl<V> Default for Cache<V>
where
    V: EstimateSize + Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
