// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use backflow_core::CancellationToken;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_cancel_runs_hooks_once() {
    // Arrange
    let token = CancellationToken::new();
    let hits = Arc::new(AtomicUsize::new(0));
    for _ in 0..3 {
        let hits = hits.clone();
        token.on_cancel(move || {
            hits.fetch_add(1, Ordering::SeqCst);
        });
    }

    // Act
    let first = token.clone().cancel();
    let second = token.cancel();

    // Assert
    assert!(first);
    assert!(!second);
    assert!(token.is_cancelled());
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[test]
fn test_hook_registered_after_cancel_runs_immediately() {
    // Arrange
    let token = CancellationToken::default();
    token.cancel();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    // Act
    token.on_cancel(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    // Assert
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_hook_may_touch_the_token() {
    // Arrange
    let token = CancellationToken::new();
    let observed = Arc::new(AtomicUsize::new(0));
    let inner = token.clone();
    let counter = observed.clone();
    token.on_cancel(move || {
        if inner.is_cancelled() {
            counter.fetch_add(1, Ordering::SeqCst);
        }
        inner.cancel();
    });

    // Act
    token.cancel();

    // Assert
    assert_eq!(observed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cancelled_future_wakes_waiters() -> anyhow::Result<()> {
    // Arrange
    let token = CancellationToken::new();
    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let token = token.clone();
            tokio::spawn(async move { token.cancelled().await })
        })
        .collect();

    // Act
    tokio::time::sleep(Duration::from_millis(10)).await;
    token.cancel();

    // Assert
    for waiter in waiters {
        tokio::time::timeout(Duration::from_secs(1), waiter).await??;
    }
    Ok(())
}

#[tokio::test]
async fn test_cancelled_future_ready_when_already_cancelled() -> anyhow::Result<()> {
    // Arrange
    let token = CancellationToken::new();
    token.cancel();

    // Act & Assert
    tokio::time::timeout(Duration::from_millis(100), token.cancelled()).await?;
    Ok(())
}
