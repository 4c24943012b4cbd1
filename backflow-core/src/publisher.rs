// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::BoxSubscriber;
use std::sync::Arc;

/// A source of items under the backpressure protocol.
///
/// `subscribe` creates a fresh attachment for every call: publishers are
/// factories holding configuration only, and per-attachment state lives in the
/// subscription they create. Each attachment ends with exactly one terminal
/// signal unless it is cancelled first.
///
/// Implementations must deliver `on_subscribe` before anything else and must
/// serialize all signals to one subscriber.
pub trait Publisher<T>: Send + Sync {
    /// Attach `subscriber` and start a new subscription.
    fn subscribe(&self, subscriber: BoxSubscriber<T>);
}

/// Shared, type-erased publisher.
pub type Multi<T> = Arc<dyn Publisher<T>>;

impl<T, P> Publisher<T> for Arc<P>
where
    P: Publisher<T> + ?Sized,
{
    fn subscribe(&self, subscriber: BoxSubscriber<T>) {
        (**self).subscribe(subscriber);
    }
}

impl<T, P> Publisher<T> for Box<P>
where
    P: Publisher<T> + ?Sized,
{
    fn subscribe(&self, subscriber: BoxSubscriber<T>) {
        (**self).subscribe(subscriber);
    }
}
