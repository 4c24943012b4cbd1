// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use backflow_core::{FlowError, StreamItem, UNBOUNDED};
use backflow_exec::IntoStreamExt;
use backflow_stream::{sources, Emitter, OverflowStrategy, PublisherExt};
use futures::StreamExt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::test]
async fn test_into_stream_yields_items_then_ends() -> anyhow::Result<()> {
    // Arrange
    let stream = sources::from_iter(vec![1, 2, 3, 4, 1])
        .take_while(|x| *x < 4)
        .into_stream(2);

    // Act
    let items: Vec<i32> = stream.map(StreamItem::unwrap).collect().await;

    // Assert
    assert_eq!(items, vec![1, 2, 3]);
    Ok(())
}

#[tokio::test]
async fn test_into_stream_yields_failure_last() -> anyhow::Result<()> {
    // Arrange
    let mut stream = sources::from_iter(vec![1, 2])
        .concat_map(|x| {
            if x == 2 {
                sources::failure(FlowError::stream_error("broken")).boxed()
            } else {
                sources::just(x).boxed()
            }
        })
        .into_stream(UNBOUNDED);

    // Act & Assert
    assert_eq!(stream.next().await.and_then(StreamItem::ok), Some(1));
    assert!(matches!(
        stream.next().await,
        Some(StreamItem::Error(FlowError::StreamProcessingError { .. }))
    ));
    assert!(stream.next().await.is_none());
    Ok(())
}

#[tokio::test]
async fn test_into_stream_zero_batch_is_invalid_demand() -> anyhow::Result<()> {
    // Arrange
    let mut stream = sources::range(0..3).into_stream(0);

    // Act
    let first = stream.next().await;

    // Assert
    assert!(matches!(
        first,
        Some(StreamItem::Error(FlowError::InvalidDemand { requested: 0 }))
    ));
    assert!(stream.next().await.is_none());
    Ok(())
}

#[tokio::test]
async fn test_into_stream_requests_in_batches() -> anyhow::Result<()> {
    // Arrange
    let slot: Arc<Mutex<Option<Emitter<u32>>>> = Arc::new(Mutex::new(None));
    let sink = slot.clone();
    let mut stream = sources::emitter_with(OverflowStrategy::Buffer, move |emitter| {
        if let Ok(mut slot) = sink.lock() {
            *slot = Some(emitter);
        }
    })
    .into_stream(4);
    let emitter = slot
        .lock()
        .map_err(|_| anyhow::anyhow!("emitter slot poisoned"))?
        .take()
        .ok_or_else(|| anyhow::anyhow!("consumer was not invoked"))?;

    // Act & Assert
    assert_eq!(emitter.requested(), 4);
    for item in 0..4 {
        emitter.emit(item);
    }
    for expected in 0..3 {
        assert_eq!(stream.next().await.and_then(StreamItem::ok), Some(expected));
    }
    // Three quarters of the batch consumed: replenished by three
    assert_eq!(emitter.requested(), 3);

    emitter.complete();
    assert_eq!(stream.next().await.and_then(StreamItem::ok), Some(3));
    assert!(stream.next().await.is_none());
    Ok(())
}

#[tokio::test]
async fn test_dropping_the_stream_cancels_upstream() -> anyhow::Result<()> {
    // Arrange
    let slot: Arc<Mutex<Option<Emitter<u32>>>> = Arc::new(Mutex::new(None));
    let sink = slot.clone();
    let stream = sources::emitter(move |emitter| {
        if let Ok(mut slot) = sink.lock() {
            *slot = Some(emitter);
        }
    })
    .into_stream(UNBOUNDED);
    let emitter = slot
        .lock()
        .map_err(|_| anyhow::anyhow!("emitter slot poisoned"))?
        .take()
        .ok_or_else(|| anyhow::anyhow!("consumer was not invoked"))?;

    // Act
    drop(stream);

    // Assert
    assert!(emitter.is_cancelled());
    Ok(())
}

#[tokio::test]
async fn test_collect_items_gathers_async_sources() -> anyhow::Result<()> {
    // Arrange
    let slot: Arc<Mutex<Option<Emitter<u32>>>> = Arc::new(Mutex::new(None));
    let sink = slot.clone();
    let collected = sources::emitter(move |emitter| {
        if let Ok(mut slot) = sink.lock() {
            *slot = Some(emitter);
        }
    })
    .distinct()
    .collect_items();
    let emitter = slot
        .lock()
        .map_err(|_| anyhow::anyhow!("emitter slot poisoned"))?
        .take()
        .ok_or_else(|| anyhow::anyhow!("consumer was not invoked"))?;

    // Act
    let producer = tokio::spawn(async move {
        for item in [5, 6, 5, 7] {
            emitter.emit(item);
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        emitter.complete();
    });

    // Assert
    let items = tokio::time::timeout(Duration::from_secs(5), collected).await??;
    producer.await?;
    assert_eq!(items, vec![5, 6, 7]);
    Ok(())
}

#[tokio::test]
async fn test_collect_items_surfaces_failure() -> anyhow::Result<()> {
    // Arrange
    let collected = sources::failure::<i32>(FlowError::overflow("full")).collect_items();

    // Act
    let result = collected.await;

    // Assert
    assert!(matches!(result, Err(FlowError::Overflow { .. })));
    Ok(())
}
