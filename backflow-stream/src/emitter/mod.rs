// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Hot source fed by code outside the protocol.
//!
//! [`emitter`] builds a publisher that, for every subscription, hands an
//! [`Emitter`] to a user closure. The closure (or anything it passes the emitter
//! to, on any thread) then pushes items, a completion or a failure.
//!
//! # Behavior
//!
//! - Concurrent calls are serialized: signals reach the subscriber one at a time
//! - Items pushed without downstream demand follow the [`OverflowStrategy`]
//!   (unbounded buffering by default)
//! - Completion is delivered once buffered items are drained; a failure is
//!   delivered right away and discards them
//! - Calls made after cancellation or after the terminal signal are discarded
//!   silently
//!
//! # Example
//!
//! ```rust
//! use backflow_stream::{sources, PublisherExt};
//! use backflow_test_utils::AssertSubscriber;
//!
//! let collector = AssertSubscriber::create(10);
//! sources::emitter(|emitter| {
//!     emitter.emit(1).emit(2).emit(3).complete();
//! })
//! .subscribe_with(collector.clone());
//!
//! collector.assert_completed().assert_items(&[1, 2, 3]);
//! ```

mod implementation;
mod overflow;

pub use overflow::OverflowStrategy;

use backflow_core::{guarded, BoxSubscriber, FlowError, Publisher};
use implementation::EmitterState;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Handle used to push signals into one subscription of an [`EmitterSource`].
///
/// Cheap to clone, usable from any thread.
pub struct Emitter<T> {
    state: Arc<EmitterState<T>>,
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter").finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Emitter<T> {
    /// Pushes one item.
    pub fn emit(&self, item: T) -> &Self {
        self.state.emit(item);
        self
    }

    /// Completes the stream once every buffered item has been delivered.
    pub fn complete(&self) {
        self.state.complete();
    }

    /// Fails the stream, discarding buffered items.
    pub fn fail(&self, error: FlowError) {
        self.state.fail(error);
    }

    /// Returns `true` once downstream has cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }

    /// Outstanding downstream demand.
    #[must_use]
    pub fn requested(&self) -> u64 {
        self.state.requested()
    }

    /// Registers `callback`, run once when the subscription ends by
    /// cancellation, completion or failure.
    pub fn on_termination(&self, callback: impl FnOnce() + Send + 'static) -> &Self {
        self.state.on_termination(callback);
        self
    }
}

/// Publisher returned by [`emitter`] and [`emitter_with`].
pub struct EmitterSource<T, F> {
    strategy: OverflowStrategy,
    consumer: Arc<F>,
    _item: PhantomData<fn() -> T>,
}

/// Creates an emitter-driven publisher that buffers items without demand.
pub fn emitter<T, F>(consumer: F) -> EmitterSource<T, F>
where
    F: Fn(Emitter<T>) + Send + Sync + 'static,
{
    emitter_with(OverflowStrategy::default(), consumer)
}

/// Creates an emitter-driven publisher with an explicit overflow strategy.
pub fn emitter_with<T, F>(strategy: OverflowStrategy, consumer: F) -> EmitterSource<T, F>
where
    F: Fn(Emitter<T>) + Send + Sync + 'static,
{
    EmitterSource {
        strategy,
        consumer: Arc::new(consumer),
        _item: PhantomData,
    }
}

impl<T, F> Publisher<T> for EmitterSource<T, F>
where
    T: Send + 'static,
    F: Fn(Emitter<T>) + Send + Sync + 'static,
{
    fn subscribe(&self, subscriber: BoxSubscriber<T>) {
        let emitter = Emitter {
            state: EmitterState::attach(self.strategy, subscriber),
        };
        let handle = emitter.clone();
        if let Err(error) = guarded(|| (self.consumer)(handle)) {
            emitter.fail(error);
        }
    }
}
