// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{FlowError, SubscriptionRef};

/// The receiving side of the backpressure protocol.
///
/// A publisher drives its subscriber through this sequence:
///
/// ```text
/// on_subscribe (on_next)* (on_error | on_complete)?
/// ```
///
/// Publishers must never call two of these methods concurrently for the same
/// subscriber, and must never call anything after `on_error` or `on_complete`.
/// That serialization is an obligation of every publisher implementation;
/// subscribers, including operator subscribers, do not lock around their own
/// callbacks.
pub trait Subscriber<T>: Send {
    /// Receives the subscription handle. Nothing flows until it is used to
    /// request demand.
    fn on_subscribe(&mut self, subscription: SubscriptionRef);

    /// Receives one item. Never called more often than requested.
    fn on_next(&mut self, item: T);

    /// Receives the terminal failure.
    fn on_error(&mut self, error: FlowError);

    /// Receives the terminal completion.
    fn on_complete(&mut self);
}

/// Owned, type-erased subscriber.
pub type BoxSubscriber<T> = Box<dyn Subscriber<T>>;

impl<T, S> Subscriber<T> for Box<S>
where
    S: Subscriber<T> + ?Sized,
{
    fn on_subscribe(&mut self, subscription: SubscriptionRef) {
        (**self).on_subscribe(subscription);
    }

    fn on_next(&mut self, item: T) {
        (**self).on_next(item);
    }

    fn on_error(&mut self, error: FlowError) {
        (**self).on_error(error);
    }

    fn on_complete(&mut self) {
        (**self).on_complete();
    }
}
