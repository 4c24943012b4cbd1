// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use backflow_core::FlowError;
use std::io;

#[test]
fn test_error_display() {
    let err = FlowError::invalid_demand(0);
    assert_eq!(
        err.to_string(),
        "Invalid demand: requested 0, must be greater than zero"
    );

    let err = FlowError::stream_error("processing failed");
    assert_eq!(
        err.to_string(),
        "Stream processing error: processing failed"
    );

    let err = FlowError::callback_panic("boom");
    assert_eq!(err.to_string(), "User callback panicked: boom");
}

#[test]
fn test_error_classification() {
    assert!(FlowError::invalid_demand(0).is_protocol_violation());
    assert!(FlowError::protocol_violation("subscribed twice").is_protocol_violation());
    assert!(!FlowError::stream_error("test").is_protocol_violation());

    assert!(FlowError::callback_panic("test").is_user_error());
    assert!(FlowError::user_error(io::Error::other("test")).is_user_error());
    assert!(!FlowError::overflow("test").is_user_error());
}

#[test]
fn test_clone_keeps_variant_and_message() {
    let original = FlowError::overflow("no demand");

    let cloned = original.clone();

    assert!(matches!(cloned, FlowError::Overflow { ref context } if context == "no demand"));
    assert_eq!(
        FlowError::user_error(io::Error::other("lost source"))
            .clone()
            .to_string(),
        "Stream processing error: User error: lost source"
    );
}
