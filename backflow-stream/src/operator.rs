// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Shared skeleton of every single-upstream operator.
//!
//! An [`OperatorSubscriber`] sits between an upstream publisher and the
//! downstream subscriber. It hands the downstream an [`UpstreamSlot`] as its
//! subscription, so demand flows straight upstream and cancellation reaches
//! upstream exactly once.
//!
//! The base guarantees at most one terminal signal downstream, whether the
//! attachment ends because upstream terminated, because the operator decided to
//! stop ([`fail`](OperatorSubscriber::fail), [`finish`](OperatorSubscriber::finish))
//! or because downstream cancelled. It adds no locking of its own: upstream must
//! never call `on_next`, `on_error` and `on_complete` concurrently, which every
//! [`Publisher`](backflow_core::Publisher) promises.
//!
//! Signals received after termination are dropped. When the attachment was
//! terminated by upstream itself the late signal is a producer bug and is logged
//! with `warn!`; after an operator-initiated stop or a downstream cancellation it
//! is an ordinary race and logged with `trace!`.

use backflow_core::{BoxSubscriber, FlowError, SubscriptionRef, UpstreamSlot};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Termination {
    Live,
    ByUpstream,
    ByOperator,
}

/// Downstream half of an operator plus its exactly-once terminal guard.
pub struct OperatorSubscriber<U> {
    name: &'static str,
    downstream: BoxSubscriber<U>,
    upstream: Arc<UpstreamSlot>,
    termination: Termination,
}

impl<U> OperatorSubscriber<U> {
    /// Wraps `downstream` for the operator called `name` (used in logs).
    pub fn new(name: &'static str, downstream: BoxSubscriber<U>) -> Self {
        Self {
            name,
            downstream,
            upstream: Arc::new(UpstreamSlot::new()),
            termination: Termination::Live,
        }
    }

    /// Stores the upstream subscription and forwards the attachment downstream.
    ///
    /// A second subscription is a protocol violation: it is cancelled and the
    /// attachment fails.
    pub fn on_subscribe(&mut self, subscription: SubscriptionRef) {
        if self.upstream.set(subscription) {
            let handle: SubscriptionRef = self.upstream.clone();
            self.downstream.on_subscribe(handle);
            return;
        }

        if !self.upstream.is_cancelled() {
            crate::warn!("{}: on_subscribe called twice", self.name);
            self.fail(FlowError::protocol_violation(format!(
                "{}: subscription already set",
                self.name
            )));
        }
    }

    /// Returns `true` once the attachment is over, for whatever reason.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.termination != Termination::Live || self.upstream.is_cancelled()
    }

    /// Forwards one item downstream unless the attachment is over.
    pub fn emit(&mut self, item: U) {
        if self.is_done() {
            self.dropped("on_next");
            return;
        }
        self.downstream.on_next(item);
    }

    /// Requests more items from upstream, used by operators that filter items out.
    pub fn request_upstream(&self, n: u64) {
        self.upstream.request(n);
    }

    /// Ends the attachment with `error`: upstream is cancelled and downstream
    /// receives the failure, unless downstream already cancelled.
    pub fn fail(&mut self, error: FlowError) {
        if self.is_done() {
            self.dropped("on_error");
            return;
        }
        self.termination = Termination::ByOperator;
        self.upstream.cancel();
        self.downstream.on_error(error);
    }

    /// Ends the attachment early with a completion: upstream is cancelled and
    /// downstream completes, unless downstream already cancelled.
    pub fn finish(&mut self) {
        if self.is_done() {
            self.dropped("on_complete");
            return;
        }
        self.termination = Termination::ByOperator;
        self.upstream.cancel();
        self.downstream.on_complete();
    }

    /// Propagates an upstream failure unchanged.
    pub fn on_error(&mut self, error: FlowError) {
        if self.is_done() {
            self.dropped("on_error");
            return;
        }
        self.termination = Termination::ByUpstream;
        self.downstream.on_error(error);
    }

    /// Propagates an upstream completion.
    pub fn on_complete(&mut self) {
        if self.is_done() {
            self.dropped("on_complete");
            return;
        }
        self.termination = Termination::ByUpstream;
        self.downstream.on_complete();
    }

    fn dropped(&self, signal: &str) {
        match self.termination {
            Termination::ByUpstream => {
                crate::warn!("{}: {} received after the terminal signal, dropped", self.name, signal);
            }
            Termination::ByOperator | Termination::Live => {
                crate::trace!("{}: {} dropped, attachment already over", self.name, signal);
            }
        }
    }
}
