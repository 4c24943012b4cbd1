// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Forwards each value the first time it is seen.
//!
//! Every value seen by an attachment is retained for the lifetime of that
//! attachment, so memory grows with the number of distinct values. Filtered
//! values are compensated with a request of one upstream, so downstream demand
//! is always met by distinct values.
//!
//! - [`Distinct`] tracks values in a `HashSet`, using `Hash` and `Eq`
//! - [`DistinctBy`] tracks values in a sorted `Vec`, using a user comparator
//!
//! A panic inside `Hash`, `Eq` or the comparator cancels upstream and fails the
//! stream with [`FlowError::CallbackPanic`]; the offending value is not forwarded.
//!
//! # Example
//!
//! ```rust
//! use backflow_stream::{sources, PublisherExt};
//! use backflow_test_utils::AssertSubscriber;
//!
//! let collector = AssertSubscriber::create(10);
//! sources::from_iter(vec![1, 2, 3, 4, 2, 4, 2, 4])
//!     .distinct()
//!     .subscribe_with(collector.clone());
//!
//! collector.assert_completed().assert_items(&[1, 2, 3, 4]);
//! ```

use crate::operator::OperatorSubscriber;
use backflow_core::{guarded, BoxSubscriber, FlowError, Publisher, Result, Subscriber, SubscriptionRef};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

/// Publisher returned by [`PublisherExt::distinct`](crate::PublisherExt::distinct).
pub struct Distinct<P> {
    upstream: P,
}

impl<P> Distinct<P> {
    pub(crate) const fn new(upstream: P) -> Self {
        Self { upstream }
    }
}

impl<T, P> Publisher<T> for Distinct<P>
where
    T: Clone + Hash + Eq + Send + 'static,
    P: Publisher<T>,
{
    fn subscribe(&self, subscriber: BoxSubscriber<T>) {
        self.upstream.subscribe(Box::new(DistinctSubscriber {
            base: OperatorSubscriber::new("distinct", subscriber),
            seen: HashSeen(HashSet::new()),
        }));
    }
}

/// Publisher returned by [`PublisherExt::distinct_by`](crate::PublisherExt::distinct_by).
pub struct DistinctBy<P, F> {
    upstream: P,
    comparator: Arc<F>,
}

impl<P, F> DistinctBy<P, F> {
    pub(crate) fn new(upstream: P, comparator: F) -> Self {
        Self {
            upstream,
            comparator: Arc::new(comparator),
        }
    }
}

impl<T, P, F> Publisher<T> for DistinctBy<P, F>
where
    T: Clone + Send + 'static,
    P: Publisher<T>,
    F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
{
    fn subscribe(&self, subscriber: BoxSubscriber<T>) {
        self.upstream.subscribe(Box::new(DistinctSubscriber {
            base: OperatorSubscriber::new("distinct_by", subscriber),
            seen: OrderedSeen {
                values: Vec::new(),
                comparator: Arc::clone(&self.comparator),
            },
        }));
    }
}

/// Per-attachment memory of the values already forwarded.
trait Seen<T>: Send {
    /// Records `item`, returning `true` if it had not been seen before.
    fn first_sighting(&mut self, item: &T) -> Result<bool>;
}

struct HashSeen<T>(HashSet<T>);

impl<T> Seen<T> for HashSeen<T>
where
    T: Clone + Hash + Eq + Send,
{
    fn first_sighting(&mut self, item: &T) -> Result<bool> {
        guarded(|| self.0.insert(item.clone()))
    }
}

struct OrderedSeen<T, F> {
    values: Vec<T>,
    comparator: Arc<F>,
}

impl<T, F> Seen<T> for OrderedSeen<T, F>
where
    T: Clone + Send,
    F: Fn(&T, &T) -> Ordering + Send + Sync,
{
    fn first_sighting(&mut self, item: &T) -> Result<bool> {
        let comparator = &self.comparator;
        let position = guarded(|| self.values.binary_search_by(|seen| comparator(seen, item)))?;
        match position {
            Ok(_) => Ok(false),
            Err(index) => {
                self.values.insert(index, item.clone());
                Ok(true)
            }
        }
    }
}

struct DistinctSubscriber<T, S> {
    base: OperatorSubscriber<T>,
    seen: S,
}

impl<T, S> Subscriber<T> for DistinctSubscriber<T, S>
where
    T: Send + 'static,
    S: Seen<T>,
{
    fn on_subscribe(&mut self, subscription: SubscriptionRef) {
        self.base.on_subscribe(subscription);
    }

    fn on_next(&mut self, item: T) {
        if self.base.is_done() {
            return;
        }

        match self.seen.first_sighting(&item) {
            Ok(true) => self.base.emit(item),
            Ok(false) => self.base.request_upstream(1),
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
