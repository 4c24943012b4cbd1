// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{FlowError, Result};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Runs user-supplied code, turning a panic into [`FlowError::CallbackPanic`].
///
/// Predicates, comparators, `Hash`/`Eq` implementations and mapping functions
/// all run through this guard, so a misbehaving callback ends the attachment
/// with a failure instead of unwinding through the publisher.
///
/// # Errors
///
/// Returns [`FlowError::CallbackPanic`] carrying the panic message when `f`
/// panics.
///
/// # Examples
///
/// ```
/// use backflow_core::{guarded, FlowError};
///
/// assert_eq!(guarded(|| 2 + 2).ok(), Some(4));
///
/// let failed = guarded(|| -> i32 { panic!("boom") });
/// assert!(matches!(failed, Err(FlowError::CallbackPanic { context }) if context == "boom"));
/// ```
pub fn guarded<R>(f: impl FnOnce() -> R) -> Result<R> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| FlowError::callback_panic(message(&*payload)))
}

/// Like [`guarded`] for callbacks that already report failures through a `Result`.
///
/// # Errors
///
/// Returns the callback's own error, or [`FlowError::CallbackPanic`] on panic.
pub fn try_guarded<R>(f: impl FnOnce() -> Result<R>) -> Result<R> {
    guarded(f)?
}

fn message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
