//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

/// Longest TTL honoured; anything larger is clamped to it.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

// == Cache Entry ==
/// A single cached value with its expiry and accounted size.
///
/// Entries are owned by the store; callers only ever see clones of `value`.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Instant after which the entry is no longer live
    pub expire_at: Instant,
    /// Estimated bytes charged against the memory budget
    pub size: u64,
    /// Position of the key in the store's sampling index
    pub(crate) slot: usize,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry expiring `ttl` after `now`.
    ///
    /// The TTL is clamped to `MAX_TTL`, then halved until `now + ttl` is
    /// representable on this platform's clock.
    pub fn new(value: V, ttl: Duration, size: u64, now: Instant) -> Self {
        let mut ttl = ttl.min(MAX_TTL);
        let expire_at = loop {
            match now.checked_add(ttl) {
                Some(at) => break at,
                None => ttl /= 2,
            }
        };

        Self {
            value,
            expire_at,
            size,
            slot: 0,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once its expiry instant lies strictly before
    /// `now`.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expire_at < now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    // == Time To Live ==
    /// Returns the time left before expiry, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expire_at.saturating_duration_since(Instant::now())
    }
}
