// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use super::FlatMapConfig;
use backflow_core::demand::validate_request;
use backflow_core::{
    guarded, BoxSubscriber, DemandCounter, Downstream, FlowError, Publisher, Subscriber,
    Subscription, SubscriptionRef, UpstreamSlot, WorkInProgress,
};
use core::sync::atomic::{AtomicBool, Ordering};
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

/// Publisher returned by the `flat_map_*` and `concat_map*` operators of
/// [`PublisherExt`](crate::PublisherExt).
pub struct FlatMap<P, F, T> {
    upstream: P,
    mapper: Arc<F>,
    config: FlatMapConfig,
    name: &'static str,
    _item: PhantomData<fn(T)>,
}

impl<P, F, T> FlatMap<P, F, T> {
    pub(crate) fn new(upstream: P, mapper: F, config: FlatMapConfig, name: &'static str) -> Self {
        Self {
            upstream,
            mapper: Arc::new(mapper),
            config,
            name,
            _item: PhantomData,
        }
    }
}

impl<T, U, P, F, Q> Publisher<U> for FlatMap<P, F, T>
where
    T: Send + 'static,
    U: Send + 'static,
    P: Publisher<T>,
    F: Fn(T) -> Q + Send + Sync + 'static,
    Q: Publisher<U> + 'static,
{
    fn subscribe(&self, subscriber: BoxSubscriber<U>) {
        let coordinator = Coordinator::new(self.config, self.name, subscriber);
        self.upstream.subscribe(Box::new(MainSubscriber {
            mapper: Arc::clone(&self.mapper),
            coordinator,
        }));
    }
}

struct Inner<U> {
    subscription: Option<SubscriptionRef>,
    queue: VecDeque<U>,
    done: bool,
    consumed: u64,
}

impl<U> Inner<U> {
    const fn new() -> Self {
        Self {
            subscription: None,
            queue: VecDeque::new(),
            done: false,
            consumed: 0,
        }
    }
}

struct State<Q, U> {
    inners: BTreeMap<u64, Inner<U>>,
    pending: VecDeque<Q>,
    next_id: u64,
    cursor: u64,
    upstream_outstanding: u64,
    upstream_done: bool,
    failure: Option<FlowError>,
    started: bool,
    terminated: bool,
}

/// Work decided under the state lock, carried out after releasing it.
struct Plan<Q> {
    activate: Vec<(u64, Q)>,
    upstream_request: u64,
    complete: bool,
}

impl<Q, U> State<Q, U> {
    /// Pops the next queued item, visiting sub-streams round-robin, and tells
    /// whether that sub-stream needs more demand.
    fn poll_item(&mut self, threshold: u64) -> Option<(U, Option<(SubscriptionRef, u64)>)> {
        let id = self
            .inners
            .range(self.cursor..)
            .chain(self.inners.range(..self.cursor))
            .find(|(_, inner)| !inner.queue.is_empty())
            .map(|(id, _)| *id)?;

        let inner = self.inners.get_mut(&id)?;
        let item = inner.queue.pop_front()?;
        self.cursor = id + 1;
        inner.consumed += 1;

        let refill = if !inner.done && inner.consumed >= threshold {
            let amount = inner.consumed;
            inner.consumed = 0;
            inner.subscription.clone().map(|subscription| (subscription, amount))
        } else {
            None
        };
        Some((item, refill))
    }

    fn plan(&mut self, config: &FlatMapConfig) -> Plan<Q> {
        let mut plan = Plan {
            activate: Vec::new(),
            upstream_request: 0,
            complete: false,
        };
        if self.terminated || self.failure.is_some() {
            return plan;
        }

        self.inners.retain(|_, inner| !(inner.done && inner.queue.is_empty()));

        while self.inners.len() < config.concurrency() {
            let Some(publisher) = self.pending.pop_front() else {
                break;
            };
            let id = self.next_id;
            self.next_id += 1;
            self.inners.insert(id, Inner::new());
            plan.activate.push((id, publisher));
        }

        if self.upstream_done {
            if self.inners.is_empty() && self.pending.is_empty() {
                self.terminated = true;
                plan.complete = true;
            }
        } else if self.started {
            let in_flight =
                (self.inners.len() + self.pending.len()) as u64 + self.upstream_outstanding;
            plan.upstream_request = config.capacity().saturating_sub(in_flight);
            self.upstream_outstanding += plan.upstream_request;
        }
        plan
    }
}

/// Shared state of one flat-map attachment.
///
/// Upstream items, sub-stream signals, downstream requests and cancellation all
/// record their effect in `state` and then trigger a drain; the single drainer
/// delivers to the subscriber, subscribes activated sub-streams and issues
/// demand.
struct Coordinator<Q, U> {
    this: Weak<Self>,
    config: FlatMapConfig,
    name: &'static str,
    state: Mutex<State<Q, U>>,
    requested: DemandCounter,
    cancelled: AtomicBool,
    wip: WorkInProgress,
    upstream: UpstreamSlot,
    downstream: Downstream<U>,
}

impl<Q, U> Coordinator<Q, U>
where
    Q: Publisher<U> + 'static,
    U: Send + 'static,
{
    fn new(config: FlatMapConfig, name: &'static str, subscriber: BoxSubscriber<U>) -> Arc<Self> {
        let coordinator = Arc::new_cyclic(|this| Self {
            this: this.clone(),
            config,
            name,
            state: Mutex::new(State {
                inners: BTreeMap::new(),
                pending: VecDeque::new(),
                next_id: 0,
                cursor: 0,
                upstream_outstanding: 0,
                upstream_done: false,
                failure: None,
                started: false,
                terminated: false,
            }),
            requested: DemandCounter::new(),
            cancelled: AtomicBool::new(false),
            wip: WorkInProgress::new(),
            upstream: UpstreamSlot::new(),
            downstream: Downstream::new(subscriber),
        });
        coordinator.downstream.set_subscription(coordinator.clone());
        coordinator
    }

    fn on_upstream_subscribe(&self, subscription: SubscriptionRef) {
        if self.upstream.set(subscription) {
            self.drain();
        } else if !self.upstream.is_cancelled() {
            crate::warn!("{}: on_subscribe called twice", self.name);
            self.record_failure(FlowError::protocol_violation(format!(
                "{}: subscription already set",
                self.name
            )));
        }
    }

    fn is_over(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
            || self.upstream.is_cancelled()
            || self.state.lock().terminated
    }

    fn on_upstream_next(&self, publisher: Q) {
        {
            let mut state = self.state.lock();
            if state.terminated {
                crate::trace!("{}: mapped sub-stream dropped, attachment already over", self.name);
                return;
            }
            state.upstream_outstanding = state.upstream_outstanding.saturating_sub(1);
            state.pending.push_back(publisher);
        }
        self.drain();
    }

    fn on_upstream_complete(&self) {
        {
            let mut state = self.state.lock();
            if state.upstream_done {
                crate::warn!("{}: on_complete received after the terminal signal, dropped", self.name);
                return;
            }
            state.upstream_done = true;
        }
        self.drain();
    }

    fn record_failure(&self, error: FlowError) {
        {
            let mut state = self.state.lock();
            if state.terminated || state.failure.is_some() {
                crate::trace!("{}: failure dropped, attachment already failing: {}", self.name, error);
                return;
            }
            state.failure = Some(error);
        }
        self.drain();
    }

    fn on_inner_subscribe(&self, id: u64, subscription: SubscriptionRef) {
        let accepted = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            match state.inners.get_mut(&id) {
                Some(inner) if !state.terminated && inner.subscription.is_none() => {
                    inner.subscription = Some(subscription.clone());
                    true
                }
                _ => false,
            }
        };

        if accepted {
            subscription.request(self.config.inner_prefetch());
        } else {
            subscription.cancel();
        }
    }

    fn on_inner_next(&self, id: u64, item: U) {
        {
            let mut state = self.state.lock();
            let terminated = state.terminated;
            match state.inners.get_mut(&id) {
                Some(inner) if !terminated => inner.queue.push_back(item),
                _ => {
                    crate::trace!("{}: sub-stream item dropped, attachment already over", self.name);
                    return;
                }
            }
        }
        self.drain();
    }

    fn on_inner_error(&self, id: u64, error: FlowError) {
        if let Some(inner) = self.state.lock().inners.get_mut(&id) {
            inner.done = true;
        }
        self.record_failure(error);
    }

    fn on_inner_complete(&self, id: u64) {
        if let Some(inner) = self.state.lock().inners.get_mut(&id) {
            inner.done = true;
        }
        self.drain();
    }

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

        loop {
            if self.cancelled.load(Ordering::Acquire) {
                self.shutdown();
                downstream.release();
                return;
            }

            let failure = self.state.lock().failure.take();
            if let Some(error) = failure {
                crate::debug!("{}: failing, cancelling upstream and sub-streams: {}", self.name, error);
                self.shutdown();
                downstream.error(error);
                return;
            }

            if !self.requested.has_demand() {
                break;
            }

            let polled = self
                .state
                .lock()
                .poll_item(self.config.replenish_threshold());
            let Some((item, refill)) = polled else {
                break;
            };

            self.requested.produced(1);
            downstream.next(item);
            if let Some((subscription, amount)) = refill {
                subscription.request(amount);
            }
        }

        let plan = self.state.lock().plan(&self.config);
        if plan.complete {
            downstream.complete();
            return;
        }

        if let Some(this) = self.this.upgrade() {
            for (id, publisher) in plan.activate {
                publisher.subscribe(Box::new(InnerSubscriber {
                    id,
                    coordinator: Arc::clone(&this),
                }));
            }
        }
        if plan.upstream_request > 0 {
            self.upstream.request(plan.upstream_request);
        }
    }

    /// Cancels upstream and every sub-stream, then discards what is queued.
    fn shutdown(&self) {
        self.upstream.cancel();

        let (inners, pending) = {
            let mut state = self.state.lock();
            state.terminated = true;
            (
                std::mem::take(&mut state.inners),
                std::mem::take(&mut state.pending),
            )
        };

        for inner in inners.into_values() {
            if let Some(subscription) = inner.subscription {
                subscription.cancel();
            }
        }
        drop(pending);
    }
}

impl<Q, U> Subscription for Coordinator<Q, U>
where
    Q: Publisher<U> + 'static,
    U: Send + 'static,
{
    fn request(&self, n: u64) {
        match validate_request(n) {
            Ok(n) => {
                self.requested.add(n);
                self.state.lock().started = true;
                self.drain();
            }
            Err(error) => self.record_failure(error),
        }
    }

    fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            crate::trace!("{}: cancelled by downstream", self.name);
        }
        self.drain();
    }
}

struct MainSubscriber<F, Q, U> {
    mapper: Arc<F>,
    coordinator: Arc<Coordinator<Q, U>>,
}

impl<T, F, Q, U> Subscriber<T> for MainSubscriber<F, Q, U>
where
    F: Fn(T) -> Q + Send + Sync + 'static,
    Q: Publisher<U> + 'static,
    U: Send + 'static,
{
    fn on_subscribe(&mut self, subscription: SubscriptionRef) {
        self.coordinator.on_upstream_subscribe(subscription);
    }

    fn on_next(&mut self, item: T) {
        if self.coordinator.is_over() {
            crate::trace!("{}: upstream item dropped, attachment already over", self.coordinator.name);
            return;
        }

        match guarded(|| (self.mapper)(item)) {
            Ok(publisher) => self.coordinator.on_upstream_next(publisher),
            Err(error) => self.coordinator.record_failure(error),
        }
    }

    fn on_error(&mut self, error: FlowError) {
        self.coordinator.record_failure(error);
    }

    fn on_complete(&mut self) {
        self.coordinator.on_upstream_complete();
    }
}

struct InnerSubscriber<Q, U> {
    id: u64,
    coordinator: Arc<Coordinator<Q, U>>,
}

impl<Q, U> Subscriber<U> for InnerSubscriber<Q, U>
where
    Q: Publisher<U> + 'static,
    U: Send + 'static,
{
    fn on_subscribe(&mut self, subscription: SubscriptionRef) {
        self.coordinator.on_inner_subscribe(self.id, subscription);
    }

    fn on_next(&mut self, item: U) {
        self.coordinator.on_inner_next(self.id, item);
    }

    fn on_error(&mut self, error: FlowError) {
        self.coordinator.on_inner_error(self.id, error);
    }

    fn on_complete(&mut self) {
        self.coordinator.on_inner_complete(self.id);
    }
}
