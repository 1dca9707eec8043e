//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and a memory budget.

mod entry;
mod handle;
mod memory;
mod size;
mod stats;
mod store;


use std::sync::Arc;

use parking_lot::Mutex;

// Re-export public types
pub use entry::{CacheEntry, MAX_TTL};
pub use handle::Cache;
pub use memory::{entry_size, EstimateSize, MemoryBudget, SizeHint, DEFAULT_MAX_MEMORY, ENTRY_OVERHEAD};
pub use size::{parse_size, ByteSize, GB, KB, MB, PB, TB};
pub use stats::CacheStats;
pub use store::{sample_size, CacheStore};

/// A store shared between callers and the reaper behind one lock.
pub type SharedStore<V> = Arc<Mutex<CacheStore<V>>>;
