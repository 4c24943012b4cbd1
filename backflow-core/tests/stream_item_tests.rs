// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use backflow_core::{FlowError, StreamItem};

#[test]
fn test_stream_item_accessors() {
    let value: StreamItem<i32> = StreamItem::Value(3);
    let error: StreamItem<i32> = StreamItem::Error(FlowError::stream_error("x"));

    assert!(value.is_value());
    assert!(error.is_error());
    assert_eq!(value.clone().ok(), Some(3));
    assert!(error.clone().err().is_some());
    assert_eq!(value.map(|v| v * 2).unwrap(), 6);
}

#[test]
fn test_stream_item_errors_never_equal() {
    let a: StreamItem<i32> = StreamItem::Error(FlowError::stream_error("x"));
    let b: StreamItem<i32> = StreamItem::Error(FlowError::stream_error("x"));

    assert_ne!(a, b);
    assert_eq!(StreamItem::Value(1), StreamItem::Value(1));
}

#[test]
fn test_stream_item_result_conversions() {
    let item: StreamItem<i32> = Ok(5).into();
    assert_eq!(item, StreamItem::Value(5));

    let result: Result<i32, FlowError> = StreamItem::Error(FlowError::overflow("full")).into();
    assert!(matches!(result, Err(FlowError::Overflow { .. })));
}
