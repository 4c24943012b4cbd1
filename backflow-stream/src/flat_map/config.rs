// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use backflow_core::demand::validate_request;
use backflow_core::{FlowError, Result};

/// Tuning of the flattening engine behind merge and concatenate.
///
/// - `concurrency`: how many sub-streams may be active at once
/// - `inner_prefetch`: demand issued to each sub-stream up front, replenished
///   as its items are delivered
/// - `upstream_prefetch`: how many upstream items may be mapped ahead of the
///   active sub-streams; their sub-streams wait in a queue, in arrival order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlatMapConfig {
    concurrency: usize,
    inner_prefetch: u64,
    upstream_prefetch: u64,
}

impl FlatMapConfig {
    /// Merge defaults: 128 concurrent sub-streams, 32 items prefetched from each.
    #[must_use]
    pub const fn merge() -> Self {
        Self {
            concurrency: 128,
            inner_prefetch: 32,
            upstream_prefetch: 0,
        }
    }

    /// Concatenate defaults: one sub-stream at a time, no upstream prefetch.
    #[must_use]
    pub const fn concatenate() -> Self {
        Self {
            concurrency: 1,
            inner_prefetch: 32,
            upstream_prefetch: 0,
        }
    }

    /// Sets the maximum number of concurrently active sub-streams.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidDemand`] when `concurrency` is zero.
    pub fn with_concurrency(mut self, concurrency: usize) -> Result<Self> {
        if concurrency == 0 {
            return Err(FlowError::invalid_demand(0));
        }
        self.concurrency = concurrency;
        Ok(self)
    }

    /// Sets the demand issued to each sub-stream.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidDemand`] when `prefetch` is zero.
    pub fn with_inner_prefetch(mut self, prefetch: u64) -> Result<Self> {
        self.inner_prefetch = validate_request(prefetch)?;
        Ok(self)
    }

    /// Sets how many upstream items may be mapped ahead; zero is allowed.
    #[must_use]
    pub const fn with_upstream_prefetch(mut self, prefetch: u64) -> Self {
        self.upstream_prefetch = prefetch;
        self
    }

    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    #[must_use]
    pub const fn inner_prefetch(&self) -> u64 {
        self.inner_prefetch
    }

    #[must_use]
    pub const fn upstream_prefetch(&self) -> u64 {
        self.upstream_prefetch
    }

    /// Same prefetch settings, one sub-stream at a time.
    pub(crate) const fn sequential(mut self) -> Self {
        self.concurrency = 1;
        self
    }

    /// Items delivered from a sub-stream before its demand is replenished.
    pub(crate) const fn replenish_threshold(&self) -> u64 {
        let threshold = self.inner_prefetch - self.inner_prefetch / 4;
        if threshold == 0 {
            1
        } else {
            threshold
        }
    }

    /// Upstream items that may be outstanding, mapped or active at once.
    pub(crate) const fn capacity(&self) -> u64 {
        (self.concurrency as u64).saturating_add(self.upstream_prefetch)
    }
}

impl Default for FlatMapConfig {
    fn default() -> Self {
        Self::merge()
    }
}
