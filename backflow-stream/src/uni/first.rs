// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use super::{Uni, UniCallback};
use backflow_core::{CancellationToken, FlowError, Publisher, Subscriber, SubscriptionRef};
use std::marker::PhantomData;

/// Uni resolving to the first item of a publisher, see
/// [`PublisherExt::first`](crate::PublisherExt::first).
///
/// Every resolution subscribes to the publisher, requests one item and cancels
/// the subscription once it arrives. A publisher completing without items
/// resolves to [`FlowError::StreamProcessingError`].
pub struct First<P, T> {
    upstream: P,
    _item: PhantomData<fn() -> T>,
}

impl<P, T> First<P, T> {
    pub(crate) const fn new(upstream: P) -> Self {
        Self {
            upstream,
            _item: PhantomData,
        }
    }
}

impl<P, T> Uni<T> for First<P, T>
where
    P: Publisher<T>,
    T: Send + 'static,
{
    fn on_result(&self, callback: UniCallback<T>) -> CancellationToken {
        let token = CancellationToken::new();
        self.upstream.subscribe(Box::new(FirstSubscriber {
            callback: Some(callback),
            subscription: None,
            token: token.clone(),
        }));
        token
    }
}

struct FirstSubscriber<T> {
    callback: Option<UniCallback<T>>,
    subscription: Option<SubscriptionRef>,
    token: CancellationToken,
}

impl<T> FirstSubscriber<T> {
    fn resolve(&mut self, outcome: backflow_core::Result<T>) {
        let Some(callback) = self.callback.take() else {
            crate::trace!("first: signal dropped, already resolved");
            return;
        };
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
        if !self.token.is_cancelled() {
            callback(outcome);
        }
    }
}

impl<T: Send> Subscriber<T> for FirstSubscriber<T> {
    fn on_subscribe(&mut self, subscription: SubscriptionRef) {
        if self.token.is_cancelled() || self.subscription.is_some() {
            subscription.cancel();
            return;
        }

        let on_cancel = subscription.clone();
        self.token.on_cancel(move || on_cancel.cancel());
        self.subscription = Some(subscription.clone());
        subscription.request(1);
    }

    fn on_next(&mut self, item: T) {
        self.resolve(Ok(item));
    }

    fn on_error(&mut self, error: FlowError) {
        self.subscription = None;
        self.resolve(Err(error));
    }

    fn on_complete(&mut self) {
        self.subscription = None;
        self.resolve(Err(FlowError::stream_error(
            "stream completed without emitting an item",
        )));
    }
}
