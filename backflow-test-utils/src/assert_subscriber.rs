// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use backflow_core::{FlowError, Subscriber, SubscriptionRef};
use event_listener::Event;
use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
struct Record<T> {
    items: Vec<T>,
    failure: Option<FlowError>,
    completed: bool,
    subscriptions: usize,
    terminal_signals: usize,
    late_signals: usize,
}

struct Shared<T> {
    record: Mutex<Record<T>>,
    subscription: Mutex<Option<SubscriptionRef>>,
    pending_request: Mutex<u64>,
    changed: Event,
}

/// Recording subscriber for tests.
///
/// Clones share the same recording: subscribe one clone, keep another to drive
/// demand and inspect what was received.
///
/// # Example
///
/// ```rust
/// use backflow_core::Publisher;
/// use backflow_test_utils::AssertSubscriber;
///
/// fn check(publisher: impl Publisher<i32>) {
///     let collector = AssertSubscriber::create(0);
///     publisher.subscribe(Box::new(collector.clone()));
///
///     collector.assert_subscribed().assert_items(&[]);
///     collector.request(2);
/// }
/// ```
pub struct AssertSubscriber<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for AssertSubscriber<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> AssertSubscriber<T> {
    /// Creates a collector requesting `initial` items as soon as it is subscribed.
    #[must_use]
    pub fn create(initial: u64) -> Self {
        Self {
            shared: Arc::new(Shared {
                record: Mutex::new(Record {
                    items: Vec::new(),
                    failure: None,
                    completed: false,
                    subscriptions: 0,
                    terminal_signals: 0,
                    late_signals: 0,
                }),
                subscription: Mutex::new(None),
                pending_request: Mutex::new(initial),
                changed: Event::new(),
            }),
        }
    }

    /// Creates a collector requesting unbounded demand.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::create(backflow_core::UNBOUNDED)
    }

    /// Requests `n` more items; before subscription the amount is requested on
    /// `on_subscribe`.
    pub fn request(&self, n: u64) -> &Self {
        let subscription = self.shared.subscription.lock().clone();
        match subscription {
            Some(subscription) => subscription.request(n),
            None => {
                let mut pending = self.shared.pending_request.lock();
                *pending = pending.saturating_add(n);
            }
        }
        self
    }

    /// Cancels the subscription.
    pub fn cancel(&self) -> &Self {
        let subscription = self.shared.subscription.lock().clone();
        if let Some(subscription) = subscription {
            subscription.cancel();
        }
        self
    }

    /// Items received so far.
    #[must_use]
    pub fn items(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.shared.record.lock().items.clone()
    }

    /// Number of items received so far.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.shared.record.lock().items.len()
    }

    /// The failure received, if any.
    #[must_use]
    pub fn failure(&self) -> Option<FlowError> {
        self.shared.record.lock().failure.clone()
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.shared.record.lock().completed
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.shared.record.lock().terminal_signals > 0
    }

    /// Asserts that `on_subscribe` was received exactly once.
    #[track_caller]
    pub fn assert_subscribed(&self) -> &Self {
        let subscriptions = self.shared.record.lock().subscriptions;
        assert_eq!(subscriptions, 1, "expected exactly one on_subscribe");
        self
    }

    /// Asserts that the items received so far are exactly `expected`.
    #[track_caller]
    pub fn assert_items(&self, expected: &[T]) -> &Self
    where
        T: PartialEq + Debug,
    {
        let record = self.shared.record.lock();
        assert_eq!(record.items.as_slice(), expected, "unexpected items");
        drop(record);
        self
    }

    /// Asserts a single completion and nothing after it.
    #[track_caller]
    pub fn assert_completed(&self) -> &Self {
        let record = self.shared.record.lock();
        assert!(
            record.completed,
            "expected completion, got failure {:?}",
            record.failure
        );
        assert_eq!(record.terminal_signals, 1, "expected exactly one terminal signal");
        assert_eq!(record.late_signals, 0, "signals received after the terminal signal");
        drop(record);
        self
    }

    /// Asserts a single failure and nothing after it.
    #[track_caller]
    pub fn assert_failed(&self) -> &Self {
        self.assert_failed_with(|_| true)
    }

    /// Asserts a single failure matching `predicate` and nothing after it.
    #[track_caller]
    pub fn assert_failed_with(&self, predicate: impl FnOnce(&FlowError) -> bool) -> &Self {
        let record = self.shared.record.lock();
        let failure = record
            .failure
            .as_ref()
            .unwrap_or_else(|| panic!("expected a failure, completed: {}", record.completed));
        assert!(predicate(failure), "unexpected failure: {failure:?}");
        assert_eq!(record.terminal_signals, 1, "expected exactly one terminal signal");
        assert_eq!(record.late_signals, 0, "signals received after the terminal signal");
        drop(record);
        self
    }

    /// Asserts that no terminal signal was received.
    #[track_caller]
    pub fn assert_not_terminated(&self) -> &Self {
        let record = self.shared.record.lock();
        assert_eq!(
            record.terminal_signals, 0,
            "unexpected terminal signal, failure: {:?}",
            record.failure
        );
        drop(record);
        self
    }

    /// Waits until at least `count` items were received.
    ///
    /// # Panics
    ///
    /// Panics when `timeout` elapses first.
    pub async fn await_items(&self, count: usize, timeout: Duration) -> &Self {
        self.await_until(timeout, |record| record.items.len() >= count)
            .await;
        self
    }

    /// Waits until a terminal signal was received.
    ///
    /// # Panics
    ///
    /// Panics when `timeout` elapses first.
    pub async fn await_termination(&self, timeout: Duration) -> &Self {
        self.await_until(timeout, |record| record.terminal_signals > 0)
            .await;
        self
    }

    /// Waits until the stream completed, then asserts it did so cleanly.
    ///
    /// # Panics
    ///
    /// Panics when `timeout` elapses first.
    pub async fn await_completion(&self, timeout: Duration) -> &Self {
        self.await_termination(timeout).await.assert_completed()
    }

    /// Waits until the stream failed, then asserts it did so cleanly.
    ///
    /// # Panics
    ///
    /// Panics when `timeout` elapses first.
    pub async fn await_failure(&self, timeout: Duration) -> &Self {
        self.await_termination(timeout).await.assert_failed()
    }

    async fn await_until(&self, timeout: Duration, condition: impl Fn(&Record<T>) -> bool) {
        let wait = async {
            loop {
                let listener = self.shared.changed.listen();
                if condition(&self.shared.record.lock()) {
                    return;
                }
                listener.await;
            }
        };

        if tokio::time::timeout(timeout, wait).await.is_err() {
            let record = self.shared.record.lock();
            panic!(
                "timed out after {timeout:?}: {} items, completed: {}, failure: {:?}",
                record.items.len(),
                record.completed,
                record.failure
            );
        }
    }

    fn record_terminal(&self, apply: impl FnOnce(&mut Record<T>)) {
        {
            let mut record = self.shared.record.lock();
            if record.terminal_signals > 0 {
                record.late_signals += 1;
            } else {
                apply(&mut record);
            }
            record.terminal_signals += 1;
        }
        self.shared.changed.notify(usize::MAX);
    }
}

impl<T: Send> Subscriber<T> for AssertSubscriber<T> {
    fn on_subscribe(&mut self, subscription: SubscriptionRef) {
        self.shared.record.lock().subscriptions += 1;
        *self.shared.subscription.lock() = Some(subscription.clone());
        let pending = std::mem::take(&mut *self.shared.pending_request.lock());
        self.shared.changed.notify(usize::MAX);
        if pending > 0 {
            subscription.request(pending);
        }
    }

    fn on_next(&mut self, item: T) {
        {
            let mut record = self.shared.record.lock();
            if record.terminal_signals > 0 {
                record.late_signals += 1;
            } else {
                record.items.push(item);
            }
        }
        self.shared.changed.notify(usize::MAX);
    }

    fn on_error(&mut self, error: FlowError) {
        self.record_terminal(|record| record.failure = Some(error));
    }

    fn on_complete(&mut self) {
        self.record_terminal(|record| record.completed = true);
    }
}
