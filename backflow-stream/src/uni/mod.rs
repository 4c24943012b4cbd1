// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! One-shot asynchronous values.
//!
//! A [`Uni`] resolves at most once, to a value or to a [`FlowError`](backflow_core::FlowError).
//! Every call to [`Uni::on_result`] starts a fresh resolution and returns a
//! [`CancellationToken`]; once the token is cancelled the callback is never
//! invoked.
//!
//! [`UniExt::to_multi`] turns a uni into a publisher of at most one item, which
//! is how unis take part in the flattening combinators.
//!
//! # Example
//!
//! ```rust
//! use backflow_stream::uni::{self, UniExt};
//! use backflow_test_utils::AssertSubscriber;
//! use backflow_stream::PublisherExt;
//!
//! let collector = AssertSubscriber::create(1);
//! uni::item(21).map(|x| x * 2).to_multi().subscribe_with(collector.clone());
//!
//! collector.assert_completed().assert_items(&[42]);
//! ```

mod first;
mod map;
mod sources;
mod to_multi;

pub use first::First;
pub use map::UniMap;
#[cfg(feature = "runtime-tokio")]
pub use sources::{from_future, FromFuture};
pub use sources::{emitter, failure, item, UniEmitter, UniEmitterSource, UniFailure, UniItem};
pub use to_multi::UniToMulti;

use crate::flat_map::{FlatMap, FlatMapConfig};
use backflow_core::{CancellationToken, Result};
use std::sync::Arc;

/// Callback receiving the outcome of a [`Uni`].
pub type UniCallback<T> = Box<dyn FnOnce(Result<T>) + Send>;

/// Shared, type-erased uni.
pub type BoxUni<T> = Arc<dyn Uni<T>>;

/// A source resolving at most once.
pub trait Uni<T>: Send + Sync {
    /// Starts a resolution. `callback` runs at most once, never after the
    /// returned token has been cancelled.
    fn on_result(&self, callback: UniCallback<T>) -> CancellationToken;
}

impl<T, N> Uni<T> for Arc<N>
where
    N: Uni<T> + ?Sized,
{
    fn on_result(&self, callback: UniCallback<T>) -> CancellationToken {
        (**self).on_result(callback)
    }
}

impl<T, N> Uni<T> for Box<N>
where
    N: Uni<T> + ?Sized,
{
    fn on_result(&self, callback: UniCallback<T>) -> CancellationToken {
        (**self).on_result(callback)
    }
}

/// Combinators available on every [`Uni`].
pub trait UniExt<T>: Uni<T> + Sized {
    /// Publisher emitting the value of this uni, then completing.
    ///
    /// The uni is resolved on the first positive request; a failure is
    /// delivered as the stream failure.
    fn to_multi(self) -> UniToMulti<Self, T> {
        UniToMulti::new(self)
    }

    /// Maps the value of this uni to a sub-stream and emits that sub-stream.
    fn transform_to_multi<F, Q>(self, mapper: F) -> FlatMap<UniToMulti<Self, T>, F, T>
    where
        F: Fn(T) -> Q + Send + Sync + 'static,
    {
        FlatMap::new(
            self.to_multi(),
            mapper,
            FlatMapConfig::concatenate(),
            "transform_to_multi",
        )
    }

    /// Transforms the value; a panicking mapper resolves to a failure.
    fn map<F, R>(self, mapper: F) -> UniMap<Self, F, T>
    where
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        UniMap::new(self, mapper)
    }

    /// Erases the concrete type.
    fn boxed(self) -> BoxUni<T>
    where
        Self: 'static,
    {
        Arc::new(self)
    }
}

impl<T, N: Uni<T>> UniExt<T> for N {}
