//! Size Parser Module
//!
//! Parses human-readable capacity strings such as `100KB` or `2GB`.

use std::fmt;
use std::str::FromStr;

use crate::error::{CacheError, Result};

// == Unit Constants ==
pub const KB: u64 = 1 << 10;
pub const MB: u64 = 1 << 20;
pub const GB: u64 = 1 << 30;
pub const TB: u64 = 1 << 40;
pub const PB: u64 = 1 << 50;

/// Suffixes, largest first.
const UNITS: [(&str, u64); 5] = [("PB", PB), ("TB", TB), ("GB", GB), ("MB", MB), ("KB", KB)];

// == Parse Size ==
/// Parses a size spec into a byte count.
///
/// The input is an unsigned decimal integer immediately followed by one of
/// `KB`, `MB`, `GB`, `TB`, `PB` (case-sensitive, binary multiples).
///
/// # Errors
/// Returns `CacheError::InvalidSizeFormat` for any other shape, including
/// whitespace, signs, lowercase units, a missing number, or a value that
/// overflows `u64`.
pub fn parse_size(spec: &str) -> Result<u64> {
    let invalid = || CacheError::InvalidSizeFormat(spec.to_string());

    let split = spec
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(invalid)?;
    let (digits, suffix) = spec.split_at(split);
    if digits.is_empty() {
        return Err(invalid());
    }

    let multiplier = UNITS
        .iter()
        .find(|(unit, _)| *unit == suffix)
        .map(|(_, bytes)| *bytes)
        .ok_or_else(invalid)?;

    let amount: u64 = digits.parse().map_err(|_| invalid())?;
    amount.checked_mul(multiplier).ok_or_else(invalid)
}

// == Byte Size ==
/// A byte count that parses from and renders as a size spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ByteSize(pub u64);

impl ByteSize {
    pub fn bytes(self) -> u64 {
        self.0
    }
}

impl FromStr for ByteSize {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        parse_size(s).map(ByteSize)
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 > 0 {
            for (unit, bytes) in UNITS {
                if self.0 % bytes == 0 {
                    return write!(f, "{}{}", self.0 / bytes, unit);
                }
            }
        }
        write!(f, "{}B", self.0)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_each_unit() {
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("12KB").unwrap(), 12 * 1024);
        assert_eq!(parse_size("2MB").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_size("1GB").unwrap(), GB);
        assert_eq!(parse_size("3TB").unwrap(), 3 * TB);
        assert_eq!(parse_size("1PB").unwrap(), PB);
    }

    #[test]
    fn test_parse_zero_is_not_a_format_error() {
        assert_eq!(parse_size("0KB").unwrap(), 0);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for spec in [
            "", "abc", "KB", "100", "100B", "100kb", "100Kb", " 1KB", "1KB ", "1 KB", "-1KB",
            "+1KB", "1.5MB", "1KBKB", "1KB1", "1EB",
        ] {
            assert!(
                matches!(parse_size(spec), Err(CacheError::InvalidSizeFormat(ref s)) if s == spec),
                "{:?} should be rejected",
                spec
            );
        }
    }

    #[test]
    fn test_parse_rejects_overflow() {
        assert!(parse_size("16384PB").is_err());
        assert!(parse_size("99999999999999999999999KB").is_err());
        assert_eq!(parse_size("16383PB").unwrap(), 16383 * PB);
    }

    #[test]
    fn test_byte_size_from_str() {
        let size: ByteSize = "100MB".parse().unwrap();
        assert_eq!(size.bytes(), 100 * MB);
        assert!("100mb".parse::<ByteSize>().is_err());
    }

    #[test]
    fn test_byte_size_display() {
        assert_eq!(ByteSize(12 * KB).to_string(), "12KB");
        assert_eq!(ByteSize(MB).to_string(), "1MB");
        assert_eq!(ByteSize(1536 * MB).to_string(), "1536MB");
        assert_eq!(ByteSize(1000).to_string(), "1000B");
        assert_eq!(ByteSize(0).to_string(), "0B");
    }
}
