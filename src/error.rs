//! Error types for the cache
//!
//! Provides unified error handling using thiserror. Every failure is
//! recoverable and reported as a value.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Admitting the write would push estimated memory past the budget
    #[error("Capacity exceeded for key '{key}': {requested} bytes requested, {used} of {max} bytes in use")]
    CapacityExceeded {
        key: String,
        requested: u64,
        used: u64,
        max: u64,
    },

    /// Size spec could not be parsed, or parsed to zero
    #[error("Invalid size format: {0:?}")]
    InvalidSizeFormat(String),

    /// The reaper was started outside of a Tokio runtime
    #[error("No Tokio runtime available to run the reaper")]
    RuntimeUnavailable,
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
