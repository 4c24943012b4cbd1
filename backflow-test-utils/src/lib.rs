// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Test infrastructure for the backflow workspace.
//!
//! - [`AssertSubscriber`]: a cloneable recording subscriber with demand
//!   control, assertions and timed waits
//! - [`fixtures`]: values and comparators that panic on demand

pub mod assert_subscriber;
pub mod fixtures;

pub use assert_subscriber::AssertSubscriber;
pub use fixtures::{exploding_comparator, BadlyComparable, COMPARISON_PANIC};
