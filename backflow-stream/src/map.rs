// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::operator::OperatorSubscriber;
use backflow_core::{guarded, BoxSubscriber, FlowError, Publisher, Subscriber, SubscriptionRef};
use std::marker::PhantomData;
use std::sync::Arc;

/// Publisher returned by [`PublisherExt::map`](crate::PublisherExt::map).
///
/// A panicking mapper cancels upstream and fails the stream.
pub struct Map<P, F, T> {
    upstream: P,
    mapper: Arc<F>,
    _input: PhantomData<fn(T)>,
}

impl<P, F, T> Map<P, F, T> {
    pub(crate) fn new(upstream: P, mapper: F) -> Self {
        Self {
            upstream,
            mapper: Arc::new(mapper),
            _input: PhantomData,
        }
    }
}

impl<T, U, P, F> Publisher<U> for Map<P, F, T>
where
    T: Send + 'static,
    U: Send + 'static,
    P: Publisher<T>,
    F: Fn(T) -> U + Send + Sync + 'static,
{
    fn subscribe(&self, subscriber: BoxSubscriber<U>) {
        self.upstream.subscribe(Box::new(MapSubscriber {
            base: OperatorSubscriber::new("map", subscriber),
            mapper: Arc::clone(&self.mapper),
        }));
    }
}

struct MapSubscriber<U, F> {
    base: OperatorSubscriber<U>,
    mapper: Arc<F>,
}

impl<T, U, F> Subscriber<T> for MapSubscriber<U, F>
where
    U: Send + 'static,
    F: Fn(T) -> U + Send + Sync + 'static,
{
    fn on_subscribe(&mut self, subscription: SubscriptionRef) {
        self.base.on_subscribe(subscription);
    }

    fn on_next(&mut self, item: T) {
        if self.base.is_done() {
            return;
        }

        match guarded(|| (self.mapper)(item)) {
            Ok(mapped) => self.base.emit(mapped),
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
