// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use core::sync::atomic::{AtomicBool, Ordering};
use parking_lot::Mutex;
use std::sync::Arc;

/// The consumer side of one attachment between a publisher and a subscriber.
///
/// - `request(n)` adds `n` to the outstanding demand. `n == 0` is a protocol
///   violation, reported to the subscriber as
///   [`FlowError::InvalidDemand`](crate::FlowError::InvalidDemand).
/// - `cancel()` asks the publisher to stop. It is idempotent, and once it has
///   been observed no further signal reaches the subscriber.
///
/// Both methods may be called from any thread, including from inside the
/// subscriber's own callbacks.
pub trait Subscription: Send + Sync {
    /// Request `n` more items.
    fn request(&self, n: u64);

    /// Stop the flow of signals and release resources.
    fn cancel(&self);
}

/// Shared handle to a subscription.
pub type SubscriptionRef = Arc<dyn Subscription>;

/// A subscription that does nothing, handed out by publishers that terminate
/// immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptySubscription;

impl Subscription for EmptySubscription {
    fn request(&self, _n: u64) {}

    fn cancel(&self) {}
}

/// Holds the upstream subscription of an operator and cancels it at most once.
///
/// Cancellation can arrive before the upstream subscription does: it is then
/// cancelled as soon as it is set.
#[derive(Default)]
pub struct UpstreamSlot {
    upstream: Mutex<Option<SubscriptionRef>>,
    cancelled: AtomicBool,
}

impl UpstreamSlot {
    /// Creates an empty, non-cancelled slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the upstream subscription.
    ///
    /// Returns `false` when a subscription was already set (the new one is
    /// cancelled) or when the slot was cancelled before (the new one is
    /// cancelled too).
    pub fn set(&self, subscription: SubscriptionRef) -> bool {
        let mut upstream = self.upstream.lock();
        if self.is_cancelled() || upstream.is_some() {
            drop(upstream);
            subscription.cancel();
            return false;
        }
        *upstream = Some(subscription);
        true
    }

    /// Returns `true` once an upstream subscription has been set.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.upstream.lock().is_some()
    }

    /// Forwards a request upstream unless cancelled.
    pub fn request(&self, n: u64) {
        if self.is_cancelled() {
            return;
        }
        let upstream = self.upstream.lock().clone();
        if let Some(upstream) = upstream {
            upstream.request(n);
        }
    }

    /// Cancels upstream. Returns `true` for the call that did it.
    pub fn cancel(&self) -> bool {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return false;
        }
        let upstream = self.upstream.lock().take();
        if let Some(upstream) = upstream {
            upstream.cancel();
        }
        true
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Subscription for UpstreamSlot {
    fn request(&self, n: u64) {
        UpstreamSlot::request(self, n);
    }

    fn cancel(&self) {
        UpstreamSlot::cancel(self);
    }
}
