// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Cold publishers built from plain values.
//!
//! Every subscription gets its own pass over the source, so these publishers
//! can be subscribed any number of times. The emitter sources live in
//! [`crate::emitter`] and are re-exported here.

use backflow_core::demand::validate_request;
use backflow_core::{
    BoxSubscriber, DemandCounter, Downstream, FlowError, Publisher, Subscription, WorkInProgress,
};
use core::sync::atomic::{AtomicBool, Ordering};
use parking_lot::Mutex;
use std::iter::Peekable;
use std::ops::Range;
use std::sync::Arc;

pub use crate::emitter::{emitter, emitter_with};

/// Publisher emitting the items of a cloneable collection, honoring demand.
///
/// Completion is signalled as soon as the iterator is exhausted, without
/// waiting for demand, so an empty collection completes right after
/// `on_subscribe`.
pub struct FromIter<I> {
    items: I,
}

/// Emits every item of `items`, then completes.
pub fn from_iter<I>(items: I) -> FromIter<I>
where
    I: IntoIterator + Clone,
{
    FromIter { items }
}

/// Emits the integers of `range` in ascending order, then completes.
pub fn range(range: Range<i64>) -> FromIter<Range<i64>> {
    from_iter(range)
}

/// Emits `item`, then completes.
pub fn just<T: Clone>(item: T) -> FromIter<Option<T>> {
    from_iter(Some(item))
}

impl<I> Publisher<I::Item> for FromIter<I>
where
    I: IntoIterator + Clone + Send + Sync,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    fn subscribe(&self, subscriber: BoxSubscriber<I::Item>) {
        let state = Arc::new(IterSubscription {
            items: Mutex::new(Some(self.items.clone().into_iter().peekable())),
            requested: DemandCounter::new(),
            failure: Mutex::new(None),
            cancelled: AtomicBool::new(false),
            wip: WorkInProgress::new(),
            downstream: Downstream::new(subscriber),
        });
        state.downstream.set_subscription(state.clone());
        state.drain();
    }
}

struct IterSubscription<It: Iterator> {
    items: Mutex<Option<Peekable<It>>>,
    requested: DemandCounter,
    failure: Mutex<Option<FlowError>>,
    cancelled: AtomicBool,
    wip: WorkInProgress,
    downstream: Downstream<It::Item>,
}

impl<It> IterSubscription<It>
where
    It: Iterator + Send,
    It::Item: Send,
{
    fn drain(&self) {
        if !self.wip.enter() {
            return;
        }

        let mut missed = 1;
        loop {
            self.drain_pass();
            missed = self.wip.leave(missed);
            if missed == 0 {
                break;
            }
        }
    }

    fn drain_pass(&self) {
        let mut downstream = self.downstream.lock();
        loop {
            if !downstream.is_active() {
                return;
            }
            if self.cancelled.load(Ordering::Acquire) {
                self.items.lock().take();
                downstream.release();
                return;
            }
            let failure = self.failure.lock().take();
            if let Some(error) = failure {
                self.items.lock().take();
                downstream.error(error);
                return;
            }

            let next = {
                let mut items = self.items.lock();
                match items.as_mut() {
                    None => Step::Idle,
                    Some(iter) => {
                        if iter.peek().is_none() {
                            Step::Exhausted
                        } else if self.requested.has_demand() {
                            iter.next().map_or(Step::Exhausted, Step::Item)
                        } else {
                            Step::Idle
                        }
                    }
                }
            };

            match next {
                Step::Item(item) => {
                    self.requested.produced(1);
                    downstream.next(item);
                }
                Step::Exhausted => {
                    self.items.lock().take();
                    downstream.complete();
                    return;
                }
                Step::Idle => return,
            }
        }
    }
}

enum Step<T> {
    Item(T),
    Exhausted,
    Idle,
}

impl<It> Subscription for IterSubscription<It>
where
    It: Iterator + Send,
    It::Item: Send,
{
    fn request(&self, n: u64) {
        match validate_request(n) {
            Ok(n) => {
                self.requested.add(n);
            }
            Err(error) => {
                self.failure.lock().get_or_insert(error);
            }
        }
        self.drain();
    }

    fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            crate::trace!("from_iter: cancelled");
        }
        self.drain();
    }
}

/// Publisher that terminates right after `on_subscribe`, see [`empty`],
/// [`failure`] and [`never`].
pub struct Terminal<T> {
    outcome: Outcome,
    _item: core::marker::PhantomData<fn() -> T>,
}

#[derive(Clone)]
enum Outcome {
    Complete,
    Fail(FlowError),
    Never,
}

/// Completes immediately without emitting.
pub fn empty<T>() -> Terminal<T> {
    Terminal {
        outcome: Outcome::Complete,
        _item: core::marker::PhantomData,
    }
}

/// Fails immediately with `error`. Every subscription receives its own clone.
pub fn failure<T>(error: FlowError) -> Terminal<T> {
    Terminal {
        outcome: Outcome::Fail(error),
        _item: core::marker::PhantomData,
    }
}

/// Never emits and never terminates; only cancellation ends the attachment.
pub fn never<T>() -> Terminal<T> {
    Terminal {
        outcome: Outcome::Never,
        _item: core::marker::PhantomData,
    }
}

impl<T: Send + 'static> Publisher<T> for Terminal<T> {
    fn subscribe(&self, subscriber: BoxSubscriber<T>) {
        let state = Arc::new(TerminalSubscription {
            outcome: Mutex::new(Some(self.outcome.clone())),
            failure: Mutex::new(None),
            cancelled: AtomicBool::new(false),
            wip: WorkInProgress::new(),
            downstream: Downstream::new(subscriber),
        });
        state.downstream.set_subscription(state.clone());
        state.drain();
    }
}

struct TerminalSubscription<T> {
    outcome: Mutex<Option<Outcome>>,
    failure: Mutex<Option<FlowError>>,
    cancelled: AtomicBool,
    wip: WorkInProgress,
    downstream: Downstream<T>,
}

impl<T: Send> TerminalSubscription<T> {
    fn drain(&self) {
        if !self.wip.enter() {
            return;
        }

        let mut missed = 1;
        loop {
            self.drain_pass();
            missed = self.wip.leave(missed);
            if missed == 0 {
                break;
            }
        }
    }

    fn drain_pass(&self) {
        let mut downstream = self.downstream.lock();
        if !downstream.is_active() {
            return;
        }
        if self.cancelled.load(Ordering::Acquire) {
            downstream.release();
            return;
        }
        let failure = self.failure.lock().take();
        if let Some(error) = failure {
            downstream.error(error);
            return;
        }

        // Never keeps the subscriber until it cancels or misbehaves.
        let outcome = self.outcome.lock().take();
        match outcome {
            Some(Outcome::Complete) => downstream.complete(),
            Some(Outcome::Fail(error)) => downstream.error(error),
            Some(Outcome::Never) | None => {}
        }
    }
}

impl<T: Send> Subscription for TerminalSubscription<T> {
    fn request(&self, n: u64) {
        if let Err(error) = validate_request(n) {
            self.failure.lock().get_or_insert(error);
            self.drain();
        }
    }

    fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            self.drain();
        }
    }
}
