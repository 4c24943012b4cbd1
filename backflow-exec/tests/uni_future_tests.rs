// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use backflow_core::FlowError;
use backflow_exec::UniAwaitExt;
use backflow_stream::uni::{self, UniEmitter, UniExt};
use backflow_stream::{sources, PublisherExt};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::test]
async fn test_into_future_resolves_value() -> anyhow::Result<()> {
    // Arrange
    let source = uni::item(20).map(|x| x + 1);

    // Act
    let value = source.into_future().await?;

    // Assert
    assert_eq!(value, 21);
    Ok(())
}

#[tokio::test]
async fn test_into_future_resolves_failure() -> anyhow::Result<()> {
    // Arrange
    let source = uni::failure::<i32>(FlowError::stream_error("no value"));

    // Act
    let result = source.into_future().await;

    // Assert
    assert!(matches!(result, Err(FlowError::StreamProcessingError { .. })));
    Ok(())
}

#[tokio::test]
async fn test_into_future_of_first_item() -> anyhow::Result<()> {
    // Arrange
    let source = sources::range(10..20).skip_repetitions().first();

    // Act
    let value = source.into_future().await?;

    // Assert
    assert_eq!(value, 10);
    Ok(())
}

#[tokio::test]
async fn test_into_future_awaits_from_future() -> anyhow::Result<()> {
    // Arrange
    let source = uni::from_future(|| async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok::<_, FlowError>("late")
    });

    // Act
    let value = tokio::time::timeout(Duration::from_secs(5), source.into_future()).await??;

    // Assert
    assert_eq!(value, "late");
    Ok(())
}

#[tokio::test]
async fn test_dropping_the_future_cancels_the_resolution() -> anyhow::Result<()> {
    // Arrange
    let slot: Arc<Mutex<Option<UniEmitter<i32>>>> = Arc::new(Mutex::new(None));
    let sink = slot.clone();
    let source = uni::emitter(move |emitter| {
        if let Ok(mut slot) = sink.lock() {
            *slot = Some(emitter);
        }
    });
    let future = source.into_future();
    let emitter = slot
        .lock()
        .map_err(|_| anyhow::anyhow!("emitter slot poisoned"))?
        .take()
        .ok_or_else(|| anyhow::anyhow!("consumer was not invoked"))?;

    // Act
    drop(future);
    emitter.complete(1);

    // Assert
    assert!(emitter.is_cancelled());
    Ok(())
}
