// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Values whose comparison code panics on demand, for exercising the failure
//! paths of operators that compare items.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Message carried by every panic raised from this module.
pub const COMPARISON_PANIC: &str = "comparison exploded";

/// A value whose `Hash` and `PartialEq` implementations panic when it is armed.
#[derive(Debug, Clone, Copy)]
pub struct BadlyComparable {
    value: i32,
    armed: bool,
}

impl BadlyComparable {
    /// A value that compares normally.
    #[must_use]
    pub const fn safe(value: i32) -> Self {
        Self {
            value,
            armed: false,
        }
    }

    /// A value whose comparison panics.
    #[must_use]
    pub const fn armed(value: i32) -> Self {
        Self { value, armed: true }
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.value
    }
}

impl PartialEq for BadlyComparable {
    fn eq(&self, other: &Self) -> bool {
        assert!(!self.armed && !other.armed, "{COMPARISON_PANIC}");
        self.value == other.value
    }
}

impl Eq for BadlyComparable {}

impl Hash for BadlyComparable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        assert!(!self.armed, "{COMPARISON_PANIC}");
        self.value.hash(state);
    }
}

/// Natural ordering of `i32` that panics whenever `trigger` takes part.
pub fn exploding_comparator(trigger: i32) -> impl Fn(&i32, &i32) -> Ordering + Send + Sync + 'static {
    move |left, right| {
        assert!(*left != trigger && *right != trigger, "{COMPARISON_PANIC}");
        left.cmp(right)
    }
}
