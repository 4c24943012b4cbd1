// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use backflow_core::{FlowError, Multi, Subscriber, SubscriptionRef};
use backflow_stream::uni::{self, UniExt};
use backflow_stream::{sources, Emitter, FlatMapConfig, PublisherExt};
use backflow_test_utils::AssertSubscriber;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn delayed(millis: u64) -> impl uni::Uni<u64> {
    uni::from_future(move || async move {
        tokio::time::sleep(Duration::from_millis(millis)).await;
        Ok::<_, FlowError>(millis)
    })
}

#[test]
fn test_concat_map_preserves_upstream_order() -> anyhow::Result<()> {
    // Arrange
    let collector = AssertSubscriber::unbounded();

    // Act
    sources::from_iter(vec![1, 2, 3])
        .concat_map(|x| sources::from_iter(vec![x * 10, x * 10 + 1]))
        .subscribe_with(collector.clone());

    // Assert
    collector
        .assert_items(&[10, 11, 20, 21, 30, 31])
        .assert_completed();
    Ok(())
}

#[tokio::test]
async fn test_concat_map_uni_waits_for_each_resolution_in_turn() -> anyhow::Result<()> {
    // Arrange
    let collector = AssertSubscriber::unbounded();

    // Act
    sources::from_iter(vec![30_u64, 20, 10])
        .concat_map_uni(delayed)
        .subscribe_with(collector.clone());

    // Assert
    collector.await_completion(Duration::from_secs(5)).await;
    collector.assert_items(&[30, 20, 10]);
    Ok(())
}

#[tokio::test]
async fn test_concat_map_with_ignores_configured_concurrency() -> anyhow::Result<()> {
    // Arrange
    let collector = AssertSubscriber::unbounded();
    let config = FlatMapConfig::merge().with_concurrency(8)?;

    // Act
    sources::from_iter(vec![25_u64, 5, 15])
        .concat_map_with(|d| delayed(d).to_multi(), config)
        .subscribe_with(collector.clone());

    // Assert
    collector.await_completion(Duration::from_secs(5)).await;
    collector.assert_items(&[25, 5, 15]);
    Ok(())
}

#[test]
fn test_flat_map_merge_drops_nothing() -> anyhow::Result<()> {
    // Arrange
    let collector = AssertSubscriber::unbounded();

    // Act
    sources::range(0..100)
        .flat_map_merge(|x| sources::from_iter(vec![x, x + 1_000]))
        .subscribe_with(collector.clone());

    // Assert
    collector.assert_completed();
    let mut items = collector.items();
    items.sort_unstable();
    let mut expected: Vec<i64> = (0..100).chain(1_000..1_100).collect();
    expected.sort_unstable();
    assert_eq!(items, expected);
    Ok(())
}

#[test]
fn test_flat_map_merge_with_small_prefetch_drops_nothing() -> anyhow::Result<()> {
    // Arrange
    let collector = AssertSubscriber::unbounded();
    let config = FlatMapConfig::merge()
        .with_concurrency(2)?
        .with_inner_prefetch(1)?
        .with_upstream_prefetch(1);

    // Act
    sources::range(0..20)
        .flat_map_merge_with(|x| sources::from_iter(vec![x; 3]), config)
        .subscribe_with(collector.clone());

    // Assert
    collector.assert_completed();
    let items = collector.items();
    assert_eq!(items.len(), 60);
    for value in 0..20 {
        assert_eq!(items.iter().filter(|item| **item == value).count(), 3);
    }
    Ok(())
}

#[tokio::test]
async fn test_flat_map_uni_merge_emits_in_resolution_order() -> anyhow::Result<()> {
    // Arrange
    let collector = AssertSubscriber::unbounded();

    // Act
    sources::from_iter(vec![60_u64, 1, 30])
        .flat_map_uni_merge(delayed)
        .subscribe_with(collector.clone());

    // Assert
    collector.await_completion(Duration::from_secs(5)).await;
    collector.assert_items(&[1, 30, 60]);
    Ok(())
}

#[test]
fn test_concat_map_honors_downstream_demand() -> anyhow::Result<()> {
    // Arrange
    let collector = AssertSubscriber::create(3);
    sources::range(0..5)
        .concat_map(|x| sources::from_iter(vec![x, x]))
        .subscribe_with(collector.clone());
    collector.assert_items(&[0, 0, 1]).assert_not_terminated();

    // Act
    collector.request(100);

    // Assert
    collector
        .assert_items(&[0, 0, 1, 1, 2, 2, 3, 3, 4, 4])
        .assert_completed();
    Ok(())
}

#[test]
fn test_inner_failure_terminates_eagerly() -> anyhow::Result<()> {
    // Arrange
    let collector = AssertSubscriber::unbounded();
    let subscribed = Arc::new(AtomicUsize::new(0));
    let counter = subscribed.clone();

    // Act
    sources::from_iter(vec![1, 2, 3])
        .concat_map(move |x| -> Multi<i32> {
            counter.fetch_add(1, Ordering::SeqCst);
            if x == 2 {
                sources::failure(FlowError::stream_error("inner broke")).boxed()
            } else {
                sources::just(x).boxed()
            }
        })
        .subscribe_with(collector.clone());

    // Assert
    collector
        .assert_items(&[1])
        .assert_failed_with(|error| error.to_string().contains("inner broke"));
    assert_eq!(subscribed.load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
fn test_mapper_panic_fails_once() -> anyhow::Result<()> {
    // Arrange
    let collector = AssertSubscriber::unbounded();

    // Act
    sources::from_iter(vec![1, 2, 3])
        .flat_map_merge(|x| {
            assert!(x != 3, "mapper exploded");
            sources::just(x)
        })
        .subscribe_with(collector.clone());

    // Assert
    collector.assert_items(&[1, 2]).assert_failed_with(
        |error| matches!(error, FlowError::CallbackPanic { context } if context == "mapper exploded"),
    );
    Ok(())
}

#[test]
fn test_upstream_failure_propagates() -> anyhow::Result<()> {
    // Arrange
    let collector = AssertSubscriber::<i32>::unbounded();

    // Act
    sources::failure::<i32>(FlowError::stream_error("upstream broke"))
        .concat_map(sources::just)
        .subscribe_with(collector.clone());

    // Assert
    collector.assert_items(&[]).assert_failed();
    Ok(())
}

#[test]
fn test_zero_request_fails_flat_map() -> anyhow::Result<()> {
    // Arrange
    let collector = AssertSubscriber::create(0);
    sources::range(0..3)
        .flat_map_merge(sources::just)
        .subscribe_with(collector.clone());

    // Act
    collector.request(0);

    // Assert
    collector.assert_failed_with(|error| matches!(error, FlowError::InvalidDemand { .. }));
    Ok(())
}

#[test]
fn test_cancel_reaches_active_inner_publishers() -> anyhow::Result<()> {
    // Arrange
    let collector = AssertSubscriber::unbounded();
    let terminated = Arc::new(AtomicUsize::new(0));
    let hits = terminated.clone();
    sources::from_iter(vec![1, 2])
        .flat_map_merge(move |x| {
            let hits = hits.clone();
            sources::emitter(move |emitter: Emitter<i32>| {
                let hits = hits.clone();
                emitter.emit(x).on_termination(move || {
                    hits.fetch_add(1, Ordering::SeqCst);
                });
            })
        })
        .subscribe_with(collector.clone());
    collector.assert_items(&[1, 2]).assert_not_terminated();

    // Act
    collector.cancel();
    collector.cancel();

    // Assert
    assert_eq!(terminated.load(Ordering::SeqCst), 2);
    collector.assert_not_terminated();
    Ok(())
}

#[test]
fn test_flat_map_config_rejects_zero() -> anyhow::Result<()> {
    // Arrange
    let config = FlatMapConfig::default();

    // Act & Assert
    assert!(config.with_concurrency(0).is_err());
    assert!(config.with_inner_prefetch(0).is_err());

    let tuned = config.with_concurrency(4)?.with_inner_prefetch(8)?;
    assert_eq!(tuned.concurrency(), 4);
    assert_eq!(tuned.inner_prefetch(), 8);
    assert_eq!(FlatMapConfig::concatenate().concurrency(), 1);
    Ok(())
}

/// Forwards to an [`AssertSubscriber`] and counts `on_next` calls that
/// overlap another one still in progress.
struct Exclusive<T> {
    inner: AssertSubscriber<T>,
    busy: Arc<AtomicBool>,
    overlaps: Arc<AtomicUsize>,
}

impl<T: Send> Subscriber<T> for Exclusive<T> {
    fn on_subscribe(&mut self, subscription: SubscriptionRef) {
        self.inner.on_subscribe(subscription);
    }

    fn on_next(&mut self, item: T) {
        if self.busy.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        thread::yield_now();
        self.inner.on_next(item);
        self.busy.store(false, Ordering::SeqCst);
    }

    fn on_error(&mut self, error: FlowError) {
        self.inner.on_error(error);
    }

    fn on_complete(&mut self) {
        self.inner.on_complete();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_flat_map_merge_serializes_inners_emitting_from_threads() -> anyhow::Result<()> {
    // Arrange
    const SOURCES: i64 = 16;
    const PER_SOURCE: u32 = 200;
    let collector = AssertSubscriber::unbounded();
    let overlaps = Arc::new(AtomicUsize::new(0));
    let subscriber = Exclusive {
        inner: collector.clone(),
        busy: Arc::new(AtomicBool::new(false)),
        overlaps: overlaps.clone(),
    };

    // Act
    sources::range(0..SOURCES)
        .flat_map_merge(|id| {
            sources::emitter(move |emitter: Emitter<(i64, u32)>| {
                thread::spawn(move || {
                    for seq in 0..PER_SOURCE {
                        emitter.emit((id, seq));
                    }
                    emitter.complete();
                });
            })
        })
        .subscribe_with(subscriber);

    // Assert
    collector.await_completion(Duration::from_secs(10)).await;
    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    assert_eq!(collector.item_count(), (SOURCES as usize) * (PER_SOURCE as usize));

    let mut per_source: BTreeMap<i64, Vec<u32>> = BTreeMap::new();
    for (id, seq) in collector.items() {
        per_source.entry(id).or_default().push(seq);
    }
    assert_eq!(per_source.len(), SOURCES as usize);
    let expected: Vec<u32> = (0..PER_SOURCE).collect();
    for sequence in per_source.values() {
        assert_eq!(sequence, &expected);
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_flat_map_merge_never_exceeds_concurrency() -> anyhow::Result<()> {
    // Arrange
    let collector = AssertSubscriber::unbounded();
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let subscribed = Arc::new(AtomicUsize::new(0));
    let config = FlatMapConfig::merge().with_concurrency(3)?;
    let (active_in, peak_in, subscribed_in) = (active.clone(), peak.clone(), subscribed.clone());

    // Act
    sources::range(0..10)
        .flat_map_merge_with(
            move |x| {
                let (active, peak, subscribed) =
                    (active_in.clone(), peak_in.clone(), subscribed_in.clone());
                sources::emitter(move |emitter: Emitter<i64>| {
                    subscribed.fetch_add(1, Ordering::SeqCst);
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    let active = active.clone();
                    thread::spawn(move || {
                        thread::sleep(Duration::from_millis(15));
                        emitter.emit(x);
                        active.fetch_sub(1, Ordering::SeqCst);
                        emitter.complete();
                    });
                })
            },
            config,
        )
        .subscribe_with(collector.clone());

    // Assert
    collector.await_completion(Duration::from_secs(10)).await;
    assert_eq!(subscribed.load(Ordering::SeqCst), 10);
    assert_eq!(peak.load(Ordering::SeqCst), 3);
    let mut items = collector.items();
    items.sort_unstable();
    assert_eq!(items, (0..10).collect::<Vec<i64>>());
    Ok(())
}
