//! Mini Cache - An embeddable in-memory key-value cache
//!
//! Provides TTL expiration with lazy eviction on access, a background reaper
//! for keys nobody reads again, and an enforced memory budget.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{parse_size, ByteSize, Cache, CacheStats, EstimateSize, SizeHint};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::Reaper;
