// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use backflow_core::{EmptySubscription, FlowError, Subscriber, Subscription};
use backflow_test_utils::AssertSubscriber;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct Recording {
    requested: AtomicU64,
    cancels: AtomicUsize,
}

impl Subscription for Recording {
    fn request(&self, n: u64) {
        self.requested.fetch_add(n, Ordering::SeqCst);
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_records_items_and_completion() {
    let collector = AssertSubscriber::unbounded();
    let mut subscriber = collector.clone();

    subscriber.on_subscribe(Arc::new(EmptySubscription));
    subscriber.on_next(1);
    subscriber.on_next(2);
    subscriber.on_complete();

    collector
        .assert_subscribed()
        .assert_items(&[1, 2])
        .assert_completed();
    assert!(collector.is_terminated());
    assert!(collector.failure().is_none());
}

#[test]
fn test_requests_buffered_until_subscribed() {
    let collector = AssertSubscriber::<i32>::create(2);
    let mut subscriber = collector.clone();
    let subscription = Arc::new(Recording::default());

    collector.request(3);
    subscriber.on_subscribe(subscription.clone());
    collector.request(1).cancel();

    assert_eq!(subscription.requested.load(Ordering::SeqCst), 6);
    assert_eq!(subscription.cancels.load(Ordering::SeqCst), 1);
}

#[test]
#[should_panic(expected = "signals received after the terminal signal")]
fn test_late_signal_is_detected() {
    let collector = AssertSubscriber::unbounded();
    let mut subscriber = collector.clone();

    subscriber.on_subscribe(Arc::new(EmptySubscription));
    subscriber.on_error(FlowError::stream_error("first"));
    subscriber.on_next(1);

    collector.assert_failed();
}

#[test]
#[should_panic(expected = "expected exactly one terminal signal")]
fn test_double_terminal_is_detected() {
    let collector = AssertSubscriber::<i32>::unbounded();
    let mut subscriber = collector.clone();

    subscriber.on_subscribe(Arc::new(EmptySubscription));
    subscriber.on_complete();
    subscriber.on_complete();

    collector.assert_completed();
}

#[test]
#[should_panic(expected = "unexpected items")]
fn test_item_mismatch_is_reported() {
    let collector = AssertSubscriber::unbounded();
    let mut subscriber = collector.clone();

    subscriber.on_subscribe(Arc::new(EmptySubscription));
    subscriber.on_next("a");

    collector.assert_items(&["b"]);
}

#[test]
#[should_panic(expected = "unexpected terminal signal")]
fn test_not_terminated_fails_after_completion() {
    let collector = AssertSubscriber::<i32>::unbounded();
    let mut subscriber = collector.clone();

    subscriber.on_subscribe(Arc::new(EmptySubscription));
    subscriber.on_complete();

    collector.assert_not_terminated();
}

#[tokio::test]
async fn test_await_items_wakes_on_delivery() {
    let collector = AssertSubscriber::unbounded();
    let mut subscriber = collector.clone();
    subscriber.on_subscribe(Arc::new(EmptySubscription));

    let producer = tokio::spawn(async move {
        for item in 0..3 {
            tokio::time::sleep(Duration::from_millis(2)).await;
            subscriber.on_next(item);
        }
        subscriber.on_complete();
    });

    collector
        .await_items(3, Duration::from_secs(5))
        .await
        .assert_items(&[0, 1, 2]);
    collector.await_completion(Duration::from_secs(5)).await;
    assert!(producer.await.is_ok());
}

#[tokio::test]
#[should_panic(expected = "timed out after")]
async fn test_await_items_times_out() {
    let collector = AssertSubscriber::<i32>::unbounded();

    collector.await_items(1, Duration::from_millis(50)).await;
}
