// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Serialization point for publishers whose signals may be triggered from
//! several threads or re-entrantly.
//!
//! Every trigger (a request, an emission, a cancellation) calls
//! [`WorkInProgress::enter`]. Exactly one caller wins and becomes the drainer; the
//! others only record that there is more work and return. The drainer keeps
//! looping until [`WorkInProgress::leave`] reports that nothing was missed.
//!
//! ```
//! use backflow_core::WorkInProgress;
//!
//! let wip = WorkInProgress::new();
//! assert!(wip.enter());
//! assert!(!wip.enter()); // re-entrant trigger: recorded, not run
//! let mut missed = 1;
//! missed = wip.leave(missed);
//! assert_eq!(missed, 1); // one more pass is needed
//! missed = wip.leave(missed);
//! assert_eq!(missed, 0);
//! ```

use core::sync::atomic::{AtomicUsize, Ordering};

/// Work-in-progress counter deciding which caller drains.
#[derive(Debug, Default)]
pub struct WorkInProgress {
    counter: AtomicUsize,
}

impl WorkInProgress {
    /// Creates an idle counter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            counter: AtomicUsize::new(0),
        }
    }

    /// Signals new work. Returns `true` if the caller must drain.
    pub fn enter(&self) -> bool {
        self.counter.fetch_add(1, Ordering::AcqRel) == 0
    }

    /// Acknowledges `missed` units of work. Returns the units that arrived
    /// meanwhile; the drainer stops when it gets zero.
    pub fn leave(&self, missed: usize) -> usize {
        self.counter.fetch_sub(missed, Ordering::AcqRel) - missed
    }

    /// Returns `true` while some caller is draining.
    #[must_use]
    pub fn is_draining(&self) -> bool {
        self.counter.load(Ordering::Acquire) != 0
    }
}
