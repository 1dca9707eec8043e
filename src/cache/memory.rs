//! Memory Accounting Module
//!
//! Tracks estimated bytes in use against a budget and defines how entries
//! are sized. Sizes are approximations of the payload footprint, not
//! measurements of the allocator.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::sync::Arc;

use crate::cache::size::KB;

/// Budget applied when none is configured.
pub const DEFAULT_MAX_MEMORY: u64 = KB;

/// Fixed bookkeeping charge added to every entry.
pub const ENTRY_OVERHEAD: u64 = 64;

// == Estimate Size ==
/// Approximates the number of bytes a value occupies.
///
/// Implementations must be deterministic and must size the payload, not the
/// handle: an `Arc<Vec<u8>>` costs its bytes, not one pointer.
pub trait EstimateSize {
    fn estimated_size(&self) -> u64;
}

macro_rules! fixed_width {
    ($($ty:ty),* $(,)?) => {
        $(
            impl EstimateSize for $ty {
                fn estimated_size(&self) -> u64 {
                    std::mem::size_of::<$ty>() as u64
                }
            }
        )*
    };
}

fixed_width!(
    bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64,
);

impl EstimateSize for () {
    fn estimated_size(&self) -> u64 {
        0
    }
}

impl EstimateSize for str {
    fn estimated_size(&self) -> u64 {
        self.len() as u64
    }
}

impl EstimateSize for String {
    fn estimated_size(&self) -> u64 {
        self.len() as u64
    }
}

impl<T: EstimateSize> EstimateSize for [T] {
    fn estimated_size(&self) -> u64 {
        self.iter()
            .map(EstimateSize::estimated_size)
            .fold(0, u64::saturating_add)
    }
}

impl<T: EstimateSize> EstimateSize for Vec<T> {
    fn estimated_size(&self) -> u64 {
        self.as_slice().estimated_size()
    }
}

impl<T: EstimateSize, const N: usize> EstimateSize for [T; N] {
    fn estimated_size(&self) -> u64 {
        self.as_slice().estimated_size()
    }
}

impl<T: EstimateSize> EstimateSize for Option<T> {
    fn estimated_size(&self) -> u64 {
        self.as_ref().map_or(0, EstimateSize::estimated_size)
    }
}

impl<T: EstimateSize + ?Sized> EstimateSize for Box<T> {
    fn estimated_size(&self) -> u64 {
        (**self).estimated_size()
    }
}

impl<T: EstimateSize + ?Sized> EstimateSize for Arc<T> {
    fn estimated_size(&self) -> u64 {
        (**self).estimated_size()
    }
}

impl<T: EstimateSize + ?Sized> EstimateSize for Rc<T> {
    fn estimated_size(&self) -> u64 {
        (**self).estimated_size()
    }
}

impl<A: EstimateSize, B: EstimateSize> EstimateSize for (A, B) {
    fn estimated_size(&self) -> u64 {
        self.0.estimated_size().saturating_add(self.1.estimated_size())
    }
}

impl<A: EstimateSize, B: EstimateSize, C: EstimateSize> EstimateSize for (A, B, C) {
    fn estimated_size(&self) -> u64 {
        self.0
            .estimated_size()
            .saturating_add(self.1.estimated_size())
            .saturating_add(self.2.estimated_size())
    }
}

impl<K: EstimateSize, V: EstimateSize, S> EstimateSize for HashMap<K, V, S> {
    fn estimated_size(&self) -> u64 {
        self.iter()
            .map(|(k, v)| k.estimated_size().saturating_add(v.estimated_size()))
            .fold(0, u64::saturating_add)
    }
}

impl<K: EstimateSize, V: EstimateSize> EstimateSize for BTreeMap<K, V> {
    fn estimated_size(&self) -> u64 {
        self.iter()
            .map(|(k, v)| k.estimated_size().saturating_add(v.estimated_size()))
            .fold(0, u64::saturating_add)
    }
}

// == Size Hint ==
/// Wraps a value whose size the caller states explicitly.
///
/// Useful for opaque types that have no `EstimateSize` impl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeHint<T> {
    value: T,
    bytes: u64,
}

impl<T> SizeHint<T> {
    pub fn new(value: T, bytes: u64) -> Self {
        Self { value, bytes }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> EstimateSize for SizeHint<T> {
    fn estimated_size(&self) -> u64 {
        self.bytes
    }
}

// == Entry Size ==
/// Estimated cost of storing `value` under `key`.
///
/// Saturates at `u64::MAX`, which no budget admits.
pub fn entry_size<V: EstimateSize + ?Sized>(key: &str, value: &V) -> u64 {
    (key.len() as u64)
        .saturating_add(value.estimated_size())
        .saturating_add(ENTRY_OVERHEAD)
}

// == Memory Budget ==
/// Running total of estimated bytes against a maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryBudget {
    used: u64,
    max: u64,
}

impl MemoryBudget {
    pub fn new(max: u64) -> Self {
        Self { used: 0, max }
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    /// Replaces the maximum. Usage above the new maximum is left in place;
    /// it only blocks further growth.
    pub fn set_max(&mut self, max: u64) {
        self.max = max;
    }

    /// Whether a write of `incoming` bytes fits once `reclaimed` bytes from
    /// the entry it replaces are given back.
    pub fn admits(&self, incoming: u64, reclaimed: u64) -> bool {
        let after = self.used.saturating_sub(reclaimed).saturating_add(incoming);
        after <= self.max
    }

    pub fn charge(&mut self, bytes: u64) {
        self.used = self.used.saturating_add(bytes);
    }

    pub fn release(&mut self, bytes: u64) {
        self.used = self.used.saturating_sub(bytes);
    }

    pub fn reset(&mut self) {
        self.used = 0;
    }
}
