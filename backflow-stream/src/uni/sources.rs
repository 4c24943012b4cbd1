// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use super::{Uni, UniCallback};
use backflow_core::{guarded, CancellationToken, FlowError, Result};
use parking_lot::Mutex;
use std::marker::PhantomData;
use std::sync::Arc;

/// Uni resolving immediately to a clone of a value, see [`item`].
#[derive(Debug, Clone)]
pub struct UniItem<T> {
    value: T,
}

/// Resolves to `value` on every resolution.
pub fn item<T: Clone + Send + Sync>(value: T) -> UniItem<T> {
    UniItem { value }
}

impl<T: Clone + Send + Sync> Uni<T> for UniItem<T> {
    fn on_result(&self, callback: UniCallback<T>) -> CancellationToken {
        callback(Ok(self.value.clone()));
        CancellationToken::new()
    }
}

/// Uni resolving immediately to a failure, see [`failure`].
pub struct UniFailure<T> {
    error: FlowError,
    _item: PhantomData<fn() -> T>,
}

/// Fails with a clone of `error` on every resolution.
pub fn failure<T>(error: FlowError) -> UniFailure<T> {
    UniFailure {
        error,
        _item: PhantomData,
    }
}

impl<T> Uni<T> for UniFailure<T> {
    fn on_result(&self, callback: UniCallback<T>) -> CancellationToken {
        callback(Err(self.error.clone()));
        CancellationToken::new()
    }
}

/// Handle completing one resolution of an [`emitter`] uni.
///
/// Usable from any thread. The first call to [`complete`](Self::complete) or
/// [`fail`](Self::fail) wins; later calls and calls after cancellation are
/// ignored. Dropping every clone without resolving fails the resolution.
pub struct UniEmitter<T> {
    resolution: Arc<Resolution<T>>,
}

struct Resolution<T> {
    callback: Arc<Mutex<Option<UniCallback<T>>>>,
    token: CancellationToken,
}

impl<T> Resolution<T> {
    fn resolve(&self, result: Result<T>) {
        let callback = self.callback.lock().take();
        match callback {
            Some(callback) if !self.token.is_cancelled() => callback(result),
            Some(_) => crate::trace!("uni emitter: result discarded, resolution cancelled"),
            None => crate::trace!("uni emitter: result discarded, already resolved"),
        }
    }
}

impl<T> Drop for Resolution<T> {
    fn drop(&mut self) {
        let callback = self.callback.lock().take();
        if let Some(callback) = callback {
            if !self.token.is_cancelled() {
                callback(Err(FlowError::stream_error(
                    "uni emitter dropped without a result",
                )));
            }
        }
    }
}

impl<T> Clone for UniEmitter<T> {
    fn clone(&self) -> Self {
        Self {
            resolution: Arc::clone(&self.resolution),
        }
    }
}

impl<T> UniEmitter<T> {
    /// Resolves with `value`.
    pub fn complete(&self, value: T) {
        self.resolution.resolve(Ok(value));
    }

    /// Resolves with `error`.
    pub fn fail(&self, error: FlowError) {
        self.resolution.resolve(Err(error));
    }

    /// Returns `true` once the consumer cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.resolution.token.is_cancelled()
    }
}

/// Uni completed by user code, see [`emitter`].
pub struct UniEmitterSource<T, F> {
    consumer: Arc<F>,
    _item: PhantomData<fn() -> T>,
}

/// For every resolution, hands a [`UniEmitter`] to `consumer`.
///
/// A panic in `consumer` fails the resolution.
pub fn emitter<T, F>(consumer: F) -> UniEmitterSource<T, F>
where
    F: Fn(UniEmitter<T>) + Send + Sync + 'static,
{
    UniEmitterSource {
        consumer: Arc::new(consumer),
        _item: PhantomData,
    }
}

impl<T, F> Uni<T> for UniEmitterSource<T, F>
where
    T: Send + 'static,
    F: Fn(UniEmitter<T>) + Send + Sync + 'static,
{
    fn on_result(&self, callback: UniCallback<T>) -> CancellationToken {
        let token = CancellationToken::new();
        let slot = Arc::new(Mutex::new(Some(callback)));
        {
            let slot = Arc::clone(&slot);
            token.on_cancel(move || {
                slot.lock().take();
            });
        }

        let emitter = UniEmitter {
            resolution: Arc::new(Resolution {
                callback: slot,
                token: token.clone(),
            }),
        };
        let handle = emitter.clone();
        if let Err(error) = guarded(|| (self.consumer)(handle)) {
            emitter.fail(error);
        }
        token
    }
}

/// Uni resolving to the output of a future spawned on the tokio runtime, see
/// [`from_future`].
#[cfg(feature = "runtime-tokio")]
pub struct FromFuture<F> {
    factory: Arc<F>,
}

/// Resolves to the output of `factory()`, spawned on the current tokio runtime.
///
/// Cancelling the token abandons the spawned task. Resolving outside a tokio
/// runtime fails with [`FlowError::StreamProcessingError`].
#[cfg(feature = "runtime-tokio")]
pub fn from_future<T, F, Fut>(factory: F) -> FromFuture<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: core::future::Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    FromFuture {
        factory: Arc::new(factory),
    }
}

#[cfg(feature = "runtime-tokio")]
impl<T, F, Fut> Uni<T> for FromFuture<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: core::future::Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    fn on_result(&self, callback: UniCallback<T>) -> CancellationToken {
        let token = CancellationToken::new();
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            callback(Err(FlowError::stream_error(
                "from_future resolved outside of a tokio runtime",
            )));
            return token;
        };

        let future = match guarded(|| (self.factory)()) {
            Ok(future) => future,
            Err(error) => {
                callback(Err(error));
                return token;
            }
        };

        let watcher = token.clone();
        runtime.spawn(async move {
            tokio::select! {
                () = watcher.cancelled() => {
                    crate::trace!("from_future: resolution cancelled");
                }
                result = future => {
                    if !watcher.is_cancelled() {
                        callback(result);
                    }
                }
            }
        });
        token
    }
}
