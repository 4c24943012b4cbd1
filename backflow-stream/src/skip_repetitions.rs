// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Drops values equal to the immediately preceding one.
//!
//! Only the last forwarded value is retained. The first value always passes,
//! non-adjacent repetitions pass too. Dropped values are compensated with a
//! request of one upstream.
//!
//! A panic inside the equality check cancels upstream and fails the stream with
//! [`FlowError::CallbackPanic`].
//!
//! # Example
//!
//! ```rust
//! use backflow_stream::{sources, PublisherExt};
//! use backflow_test_utils::AssertSubscriber;
//!
//! let collector = AssertSubscriber::create(20);
//! sources::from_iter(vec![1, 2, 3, 4, 4, 2, 2, 4, 1, 1, 2, 4])
//!     .skip_repetitions()
//!     .subscribe_with(collector.clone());
//!
//! collector.assert_completed().assert_items(&[1, 2, 3, 4, 2, 4, 1, 2, 4]);
//! ```

use crate::operator::OperatorSubscriber;
use backflow_core::{guarded, BoxSubscriber, FlowError, Publisher, Subscriber, SubscriptionRef};
use std::sync::Arc;

/// Publisher returned by [`PublisherExt::skip_repetitions`](crate::PublisherExt::skip_repetitions)
/// and [`PublisherExt::skip_repetitions_by`](crate::PublisherExt::skip_repetitions_by).
pub struct SkipRepetitions<P, F> {
    upstream: P,
    equals: Arc<F>,
}

impl<P, F> SkipRepetitions<P, F> {
    pub(crate) fn new(upstream: P, equals: F) -> Self {
        Self {
            upstream,
            equals: Arc::new(equals),
        }
    }
}

impl<T, P, F> Publisher<T> for SkipRepetitions<P, F>
where
    T: Clone + Send + 'static,
    P: Publisher<T>,
    F: Fn(&T, &T) -> bool + Send + Sync + 'static,
{
    fn subscribe(&self, subscriber: BoxSubscriber<T>) {
        self.upstream.subscribe(Box::new(SkipRepetitionsSubscriber {
            base: OperatorSubscriber::new("skip_repetitions", subscriber),
            equals: Arc::clone(&self.equals),
            last: None,
        }));
    }
}

struct SkipRepetitionsSubscriber<T, F> {
    base: OperatorSubscriber<T>,
    equals: Arc<F>,
    last: Option<T>,
}

impl<T, F> Subscriber<T> for SkipRepetitionsSubscriber<T, F>
where
    T: Clone + Send + 'static,
    F: Fn(&T, &T) -> bool + Send + Sync + 'static,
{
    fn on_subscribe(&mut self, subscription: SubscriptionRef) {
        self.base.on_subscribe(subscription);
    }

    fn on_next(&mut self, item: T) {
        if self.base.is_done() {
            return;
        }

        let repeated = match &self.last {
            None => Ok(false),
            Some(last) => guarded(|| (self.equals)(last, &item)),
        };

        match repeated {
            Ok(true) => self.base.request_upstream(1),
            Ok(false) => {
                self.last = Some(item.clone());
                self.base.emit(item);
            }
            Err(error) => {
                self.last = None;
                self.base.fail(error);
            }
        }
    }

    fn on_error(&mut self, error: FlowError) {
        self.last = None;
        self.base.on_error(error);
    }

    fn on_complete(&mut self) {
        self.last = None;
        self.base.on_complete();
    }
}
