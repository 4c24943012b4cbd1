// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use backflow_core::{
    guarded, CancellationToken, FlowError, Publisher, Subscriber, SubscriptionRef, UNBOUNDED,
};

/// Subscriber invoking plain callbacks, with unbounded demand.
///
/// A panic in `on_next` cancels the subscription and is reported to `on_error`
/// as [`FlowError::CallbackPanic`]. Signals arriving after the terminal one are
/// ignored.
pub struct CallbackSubscriber<N, E, C> {
    on_next: N,
    on_error: Option<E>,
    on_complete: Option<C>,
    token: Option<CancellationToken>,
    subscription: Option<SubscriptionRef>,
}

impl<N, E, C> CallbackSubscriber<N, E, C> {
    /// Creates a subscriber cancelled through `token`.
    pub fn new(on_next: N, on_error: E, on_complete: C, token: CancellationToken) -> Self {
        Self {
            on_next,
            on_error: Some(on_error),
            on_complete: Some(on_complete),
            token: Some(token),
            subscription: None,
        }
    }

    fn is_done(&self) -> bool {
        self.on_error.is_none()
    }
}

impl<T, N, E, C> Subscriber<T> for CallbackSubscriber<N, E, C>
where
    N: FnMut(T) + Send,
    E: FnOnce(FlowError) + Send,
    C: FnOnce() + Send,
{
    fn on_subscribe(&mut self, subscription: SubscriptionRef) {
        let Some(token) = self.token.take() else {
            crate::warn!("subscribe_callbacks: on_subscribe called twice");
            subscription.cancel();
            return;
        };

        let on_cancel = subscription.clone();
        token.on_cancel(move || on_cancel.cancel());
        if !token.is_cancelled() {
            self.subscription = Some(subscription.clone());
            subscription.request(UNBOUNDED);
        }
    }

    fn on_next(&mut self, item: T) {
        if self.is_done() {
            crate::trace!("subscribe_callbacks: item dropped after termination");
            return;
        }

        let on_next = &mut self.on_next;
        if let Err(error) = guarded(|| on_next(item)) {
            if let Some(subscription) = self.subscription.take() {
                subscription.cancel();
            }
            self.on_complete = None;
            if let Some(on_error) = self.on_error.take() {
                on_error(error);
            }
        }
    }

    fn on_error(&mut self, error: FlowError) {
        self.subscription = None;
        self.on_complete = None;
        match self.on_error.take() {
            Some(on_error) => on_error(error),
            None => crate::trace!("subscribe_callbacks: failure dropped after termination: {}", error),
        }
    }

    fn on_complete(&mut self) {
        self.subscription = None;
        if self.on_error.take().is_none() {
            crate::trace!("subscribe_callbacks: completion dropped after termination");
            return;
        }
        if let Some(on_complete) = self.on_complete.take() {
            on_complete();
        }
    }
}

/// Callback-based subscription for any [`Publisher`].
pub trait SubscribeExt<T>: Publisher<T> {
    /// Subscribes with callbacks and unbounded demand.
    ///
    /// Returns the token that cancels the subscription.
    ///
    /// # Example
    ///
    /// ```rust
    /// use backflow_exec::SubscribeExt;
    /// use backflow_stream::sources;
    /// use std::sync::{Arc, Mutex};
    ///
    /// let seen = Arc::new(Mutex::new(Vec::new()));
    /// let sink = seen.clone();
    /// let _token = sources::range(1..4).subscribe_callbacks(
    ///     move |x| sink.lock().unwrap().push(x),
    ///     |error| panic!("unexpected failure: {error}"),
    ///     || {},
    /// );
    ///
    /// assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    /// ```
    fn subscribe_callbacks<N, E, C>(&self, on_next: N, on_error: E, on_complete: C) -> CancellationToken
    where
        T: 'static,
        N: FnMut(T) + Send + 'static,
        E: FnOnce(FlowError) + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        let token = CancellationToken::new();
        self.subscribe(Box::new(CallbackSubscriber::new(
            on_next,
            on_error,
            on_complete,
            token.clone(),
        )));
        token
    }
}

impl<T, P: Publisher<T> + ?Sized> SubscribeExt<T> for P {}
