// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Emits items while a predicate holds.
//!
//! # Behavior
//!
//! - Items are forwarded while `predicate(&item)` returns `true`
//! - The first item failing the predicate is dropped, upstream is cancelled and
//!   the stream completes
//! - A panicking predicate cancels upstream and fails the stream with
//!   [`FlowError::CallbackPanic`](backflow_core::FlowError::CallbackPanic)
//! - Upstream failures are propagated unchanged
//!
//! # Example
//!
//! ```rust
//! use backflow_stream::{sources, PublisherExt};
//! use backflow_test_utils::AssertSubscriber;
//!
//! let collector = AssertSubscriber::create(10);
//! sources::from_iter(vec![1, 2, 3, 4, 1])
//!     .take_while(|x| *x < 4)
//!     .subscribe_with(collector.clone());
//!
//! collector.assert_completed().assert_items(&[1, 2, 3]);
//! ```

use crate::operator::OperatorSubscriber;
use backflow_core::{guarded, BoxSubscriber, FlowError, Publisher, Subscriber, SubscriptionRef};
use std::sync::Arc;

/// Publisher returned by [`PublisherExt::take_while`](crate::PublisherExt::take_while).
pub struct TakeWhile<P, F> {
    upstream: P,
    predicate: Arc<F>,
}

impl<P, F> TakeWhile<P, F> {
    pub(crate) fn new(upstream: P, predicate: F) -> Self {
        Self {
            upstream,
            predicate: Arc::new(predicate),
        }
    }
}

impl<T, P, F> Publisher<T> for TakeWhile<P, F>
where
    T: Send + 'static,
    P: Publisher<T>,
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    fn subscribe(&self, subscriber: BoxSubscriber<T>) {
        self.upstream.subscribe(Box::new(TakeWhileSubscriber {
            base: OperatorSubscriber::new("take_while", subscriber),
            predicate: Arc::clone(&self.predicate),
        }));
    }
}

struct TakeWhileSubscriber<T, F> {
    base: OperatorSubscriber<T>,
    predicate: Arc<F>,
}

impl<T, F> Subscriber<T> for TakeWhileSubscriber<T, F>
where
    T: Send + 'static,
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    fn on_subscribe(&mut self, subscription: SubscriptionRef) {
        self.base.on_subscribe(subscription);
    }

    fn on_next(&mut self, item: T) {
        if self.base.is_done() {
            return;
        }

        match guarded(|| (self.predicate)(&item)) {
            Ok(true) => self.base.emit(item),
            Ok(false) => self.base.finish(),
            Err(error) => self.base.fail(error),
        }
    }

    fn on_error(&mut self, error: FlowError) {
        self.base.on_error(error);
    }

    fn on_complete(&mut self) {
        self.base.on_complete();
    }
}
