// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use backflow_core::FlowError;
use backflow_stream::{sources, PublisherExt};
use backflow_test_utils::{AssertSubscriber, BadlyComparable, COMPARISON_PANIC};

#[test]
fn test_skip_repetitions_drops_consecutive_duplicates() -> anyhow::Result<()> {
    // Arrange
    let collector = AssertSubscriber::unbounded();

    // Act
    sources::from_iter(vec![1, 2, 3, 4, 4, 2, 2, 4, 1, 1, 2, 4])
        .skip_repetitions()
        .subscribe_with(collector.clone());

    // Assert
    collector
        .assert_items(&[1, 2, 3, 4, 2, 4, 1, 2, 4])
        .assert_completed();
    Ok(())
}

#[test]
fn test_skip_repetitions_single_item() -> anyhow::Result<()> {
    // Arrange
    let collector = AssertSubscriber::unbounded();

    // Act
    sources::just(7).skip_repetitions().subscribe_with(collector.clone());

    // Assert
    collector.assert_items(&[7]).assert_completed();
    Ok(())
}

#[test]
fn test_skip_repetitions_honors_demand() -> anyhow::Result<()> {
    // Arrange
    let collector = AssertSubscriber::create(2);

    // Act
    sources::from_iter(vec![5, 5, 5, 6, 6, 7])
        .skip_repetitions()
        .subscribe_with(collector.clone());

    // Assert
    collector.assert_items(&[5, 6]).assert_not_terminated();
    collector.request(1);
    collector.assert_items(&[5, 6, 7]).assert_completed();
    Ok(())
}

#[test]
fn test_skip_repetitions_by_custom_equality() -> anyhow::Result<()> {
    // Arrange
    let collector = AssertSubscriber::unbounded();

    // Act
    sources::from_iter(vec![10, 11, 25, 29, 31, 12])
        .skip_repetitions_by(|a: &i32, b: &i32| a / 10 == b / 10)
        .subscribe_with(collector.clone());

    // Assert
    collector.assert_items(&[10, 25, 31, 12]).assert_completed();
    Ok(())
}

#[test]
fn test_skip_repetitions_equality_panic_fails_once() -> anyhow::Result<()> {
    // Arrange
    let collector = AssertSubscriber::unbounded();

    // Act
    sources::from_iter(vec![
        BadlyComparable::safe(1),
        BadlyComparable::armed(2),
        BadlyComparable::safe(3),
    ])
    .skip_repetitions()
    .subscribe_with(collector.clone());

    // Assert
    assert_eq!(collector.item_count(), 1);
    collector.assert_failed_with(
        |error| matches!(error, FlowError::CallbackPanic { context } if context == COMPARISON_PANIC),
    );
    Ok(())
}
