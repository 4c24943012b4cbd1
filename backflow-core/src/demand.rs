// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Demand accounting for the backpressure protocol.
//!
//! Demand is a `u64`. [`UNBOUNDED`] means "emit as much as you like" and is
//! sticky: once reached, the counter never decreases. Additions saturate at
//! [`UNBOUNDED`] instead of overflowing.

use crate::{FlowError, Result};
use core::sync::atomic::{AtomicU64, Ordering};

/// Demand value meaning "no limit".
pub const UNBOUNDED: u64 = u64::MAX;

/// Rejects zero, the only non-positive amount a `u64` can carry.
///
/// # Errors
///
/// Returns [`FlowError::InvalidDemand`] when `n == 0`.
pub const fn validate_request(n: u64) -> Result<u64> {
    if n == 0 {
        return Err(FlowError::invalid_demand(n));
    }
    Ok(n)
}

/// Adds two demand values, saturating at [`UNBOUNDED`].
#[must_use]
pub const fn add_cap(current: u64, n: u64) -> u64 {
    if current == UNBOUNDED {
        return UNBOUNDED;
    }
    current.saturating_add(n)
}

/// Lock-free counter of outstanding demand for one subscription.
#[derive(Debug, Default)]
pub struct DemandCounter {
    outstanding: AtomicU64,
}

impl DemandCounter {
    /// Creates a counter with zero outstanding demand.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            outstanding: AtomicU64::new(0),
        }
    }

    /// Adds `n` to the outstanding demand and returns the previous value.
    pub fn add(&self, n: u64) -> u64 {
        let mut current = self.outstanding.load(Ordering::Acquire);
        loop {
            if current == UNBOUNDED {
                return UNBOUNDED;
            }
            let next = add_cap(current, n);
            match self.outstanding.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(previous) => return previous,
                Err(actual) => current = actual,
            }
        }
    }

    /// Subtracts `n` emitted items from the outstanding demand.
    ///
    /// Unbounded demand stays unbounded. Returns the remaining demand.
    pub fn produced(&self, n: u64) -> u64 {
        let mut current = self.outstanding.load(Ordering::Acquire);
        loop {
            if current == UNBOUNDED {
                return UNBOUNDED;
            }
            let next = current.saturating_sub(n);
            match self.outstanding.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }

    /// Current outstanding demand.
    #[must_use]
    pub fn current(&self) -> u64 {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Returns `true` if at least one more item may be emitted.
    #[must_use]
    pub fn has_demand(&self) -> bool {
        self.current() > 0
    }
}
