//! Resource pair arithmetic
//!
//! A `ResourcePair` tracks total capacity against the amount already
//! committed, in a fixed unit: millicores for CPU pairs, bytes for memory and
//! storage, whole devices for GPUs. Debits never cross the pair's floor and
//! never mutate on failure, so a failed debit is always a no-op.

use serde::{Deserialize, Serialize};

/// Allocatable/allocated capacity for a single resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePair {
    /// Total capacity in the pair's unit
    pub allocatable: i64,

    /// Capacity already committed
    pub allocated: i64,

    /// Available capacity must not drop below this value
    pub floor: i64,
}

impl ResourcePair {
    /// Create a new pair with no floor
    pub fn new(allocatable: i64, allocated: i64) -> Self {
        Self {
            allocatable,
            allocated,
            floor: 0,
        }
    }

    /// Set the floor below which `available` must not drop
    pub fn with_floor(mut self, floor: i64) -> Self {
        self.floor = floor;
        self
    }

    /// Capacity still open for commitment
    pub fn available(&self) -> i64 {
        self.allocatable.saturating_sub(self.allocated).max(0)
    }

    /// Debit `quantity` from the pair.
    ///
    /// Returns `false` without mutating when the debit would push `available`
    /// below the floor or when the arithmetic would not fit an `i64`.
    pub fn sub_nlz(&mut self, quantity: i64) -> bool {
        let Some(remaining) = self.available().checked_sub(quantity) else {
            return false;
        };

        if remaining < self.floor {
            return false;
        }

        let Some(allocated) = self.allocated.checked_add(quantity) else {
            return false;
        };

        self.allocated = allocated;
        true
    }

    /// Debit a milli-scaled pair.
    ///
    /// `quantity` is already in milli-units; the separate name keeps the unit
    /// visible at CPU call sites.
    pub fn sub_milli_nlz(&mut self, quantity: i64) -> bool {
        self.sub_nlz(quantity)
    }
}
