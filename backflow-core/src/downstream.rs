// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{BoxSubscriber, FlowError, SubscriptionRef};
use parking_lot::{Mutex, MutexGuard};

struct Slot<T> {
    subscriber: Option<BoxSubscriber<T>>,
    pending_subscription: Option<SubscriptionRef>,
    subscribed: bool,
}

/// Delivery slot holding the subscriber of a draining publisher.
///
/// Only the current drainer (see [`WorkInProgress`](crate::WorkInProgress))
/// locks the slot, so the lock is never contended and re-entrant calls made by
/// the subscriber from inside its callbacks never touch it. `on_subscribe` is
/// delivered lazily by the first drainer, which lets a subscriber request demand
/// from inside `on_subscribe` without re-entering the publisher.
///
/// After a terminal signal or [`DeliveryGuard::release`] the subscriber is
/// dropped and every later delivery is ignored.
pub struct Downstream<T> {
    slot: Mutex<Slot<T>>,
}

impl<T> Downstream<T> {
    /// Wraps `subscriber`. Nothing is delivered until
    /// [`set_subscription`](Self::set_subscription) has been called.
    pub fn new(subscriber: BoxSubscriber<T>) -> Self {
        Self {
            slot: Mutex::new(Slot {
                subscriber: Some(subscriber),
                pending_subscription: None,
                subscribed: false,
            }),
        }
    }

    /// Sets the subscription handed to the subscriber on the first lock.
    ///
    /// Publishers usually implement [`Subscription`](crate::Subscription) on the
    /// same shared state that owns this slot, hence the two-step setup.
    pub fn set_subscription(&self, subscription: SubscriptionRef) {
        let mut slot = self.slot.lock();
        if slot.subscriber.is_some() && !slot.subscribed {
            slot.pending_subscription = Some(subscription);
        }
    }

    /// Locks the slot for delivery, sending `on_subscribe` first if it is still
    /// pending. Call only while holding the work-in-progress token.
    pub fn lock(&self) -> DeliveryGuard<'_, T> {
        let mut guard = self.slot.lock();
        let slot = &mut *guard;
        if let (Some(subscription), Some(subscriber)) =
            (slot.pending_subscription.take(), slot.subscriber.as_mut())
        {
            slot.subscribed = true;
            subscriber.on_subscribe(subscription);
        }
        DeliveryGuard { guard }
    }
}

/// Exclusive access to a [`Downstream`] for the duration of one drain pass.
pub struct DeliveryGuard<'a, T> {
    guard: MutexGuard<'a, Slot<T>>,
}

impl<T> DeliveryGuard<'_, T> {
    /// Returns `true` while the subscriber is subscribed and has been neither
    /// terminated nor released.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.guard.subscribed && self.guard.subscriber.is_some()
    }

    /// Delivers one item. Ignored unless active.
    pub fn next(&mut self, item: T) {
        if !self.guard.subscribed {
            return;
        }
        if let Some(subscriber) = self.guard.subscriber.as_mut() {
            subscriber.on_next(item);
        }
    }

    /// Delivers the terminal failure and drops the subscriber.
    pub fn error(&mut self, error: FlowError) {
        if !self.guard.subscribed {
            return;
        }
        if let Some(mut subscriber) = self.guard.subscriber.take() {
            subscriber.on_error(error);
        }
    }

    /// Delivers the terminal completion and drops the subscriber.
    pub fn complete(&mut self) {
        if !self.guard.subscribed {
            return;
        }
        if let Some(mut subscriber) = self.guard.subscriber.take() {
            subscriber.on_complete();
        }
    }

    /// Drops the subscriber without a terminal signal (cancellation).
    pub fn release(&mut self) {
        self.guard.pending_subscription = None;
        self.guard.subscriber = None;
    }
}
