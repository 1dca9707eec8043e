//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the cache.
//!
//! # Tasks
//! - Expiry Reaper: samples a fraction of the entries each interval and
//!   evicts the expired ones

mod reaper;

pub use reaper::Reaper;
