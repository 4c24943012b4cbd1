// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Runtime-agnostic cancellation token.
//!
//! One-shot values hand a [`CancellationToken`] back to whoever registered a
//! result callback, and terminal consumers return one so the subscription can be
//! torn down from the outside. Cancellation can be observed by polling
//! [`is_cancelled`](CancellationToken::is_cancelled), awaiting
//! [`cancelled`](CancellationToken::cancelled) or registering a hook with
//! [`on_cancel`](CancellationToken::on_cancel).

use core::future::Future;
use core::pin::Pin;
use core::sync::atomic::{AtomicBool, Ordering};
use core::task::{Context, Poll};
use event_listener::{Event, EventListener};
use parking_lot::Mutex;
use std::sync::Arc;

type CancelHook = Box<dyn FnOnce() + Send>;

/// Runtime-agnostic cancellation token.
///
/// A `CancellationToken` can be cloned to create multiple handles to the same
/// cancellation state. When `cancel()` is called on any clone, all waiters on
/// `cancelled()` are notified and every registered hook runs once.
///
/// # Example
///
/// ```
/// use backflow_core::CancellationToken;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let token = CancellationToken::new();
/// let hits = Arc::new(AtomicUsize::new(0));
/// let counter = hits.clone();
/// token.on_cancel(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// assert!(token.cancel());
/// assert!(!token.cancel());
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// ```
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

struct Inner {
    cancelled: AtomicBool,
    event: Event,
    hooks: Mutex<Vec<CancelHook>>,
}

impl CancellationToken {
    /// Create a new cancellation token.
    ///
    /// The token is initially not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                event: Event::new(),
                hooks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Cancel the token, waking all listeners and running the registered hooks.
    ///
    /// Returns `true` for the call that actually cancelled; every later call is a
    /// no-op returning `false`.
    pub fn cancel(&self) -> bool {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return false;
        }

        self.inner.event.notify(usize::MAX);

        // Hooks run outside the lock so they may touch the token again
        let hooks = core::mem::take(&mut *self.inner.hooks.lock());
        for hook in hooks {
            hook();
        }
        true
    }

    /// Check if the token has been cancelled (non-blocking).
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Register a hook that runs once when the token is cancelled.
    ///
    /// When the token is already cancelled the hook runs immediately on the
    /// calling thread.
    pub fn on_cancel(&self, hook: impl FnOnce() + Send + 'static) {
        {
            let mut hooks = self.inner.hooks.lock();
            if !self.is_cancelled() {
                hooks.push(Box::new(hook));
                return;
            }
        }
        hook();
    }

    /// Wait asynchronously until the token is cancelled.
    ///
    /// If the token is already cancelled, this returns immediately.
    ///
    /// # Example
    ///
    /// ```
    /// use backflow_core::CancellationToken;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let token = CancellationToken::new();
    /// let token_clone = token.clone();
    ///
    /// let waiter = tokio::spawn(async move {
    ///     token_clone.cancelled().await;
    /// });
    ///
    /// token.cancel();
    /// waiter.await.unwrap();
    /// # }
    /// ```
    pub fn cancelled(&self) -> Cancelled<'_> {
        Cancelled {
            token: self,
            listener: None,
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Future returned by [`CancellationToken::cancelled()`].
pub struct Cancelled<'a> {
    token: &'a CancellationToken,
    listener: Option<EventListener>,
}

impl Future for Cancelled<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        loop {
            if this.token.is_cancelled() {
                return Poll::Ready(());
            }

            match &mut this.listener {
                // Loop re-checks the flag: cancel() may have run before listen()
                None => this.listener = Some(this.token.inner.event.listen()),
                Some(listener) => {
                    if Pin::new(listener).poll(cx).is_pending() {
                        return Poll::Pending;
                    }
                    this.listener = None;
                }
            }
        }
    }
}
