// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use super::Uni;
use backflow_core::demand::validate_request;
use backflow_core::{
    BoxSubscriber, CancellationToken, Downstream, FlowError, Publisher, Result, Subscription,
    WorkInProgress,
};
use core::sync::atomic::{AtomicBool, Ordering};
use parking_lot::Mutex;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

/// Publisher of the single value of a uni, see
/// [`UniExt::to_multi`](super::UniExt::to_multi).
pub struct UniToMulti<N, T> {
    uni: Arc<N>,
    _item: PhantomData<fn() -> T>,
}

impl<N, T> UniToMulti<N, T> {
    pub(crate) fn new(uni: N) -> Self {
        Self {
            uni: Arc::new(uni),
            _item: PhantomData,
        }
    }
}

impl<N, T> Publisher<T> for UniToMulti<N, T>
where
    N: Uni<T> + 'static,
    T: Send + 'static,
{
    fn subscribe(&self, subscriber: BoxSubscriber<T>) {
        let state = Arc::new_cyclic(|this| UniSubscription {
            this: this.clone(),
            uni: Arc::clone(&self.uni),
            requested: AtomicBool::new(false),
            resolving: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            failure: Mutex::new(None),
            outcome: Mutex::new(None),
            token: Mutex::new(None),
            wip: WorkInProgress::new(),
            downstream: Downstream::new(subscriber),
        });
        state.downstream.set_subscription(state.clone());
        state.drain();
    }
}

struct UniSubscription<N, T> {
    this: Weak<Self>,
    uni: Arc<N>,
    requested: AtomicBool,
    resolving: AtomicBool,
    cancelled: AtomicBool,
    failure: Mutex<Option<FlowError>>,
    outcome: Mutex<Option<Result<T>>>,
    token: Mutex<Option<CancellationToken>>,
    wip: WorkInProgress,
    downstream: Downstream<T>,
}

impl<N, T> UniSubscription<N, T>
where
    N: Uni<T> + 'static,
    T: Send + 'static,
{
    fn resolve(&self) {
        let Some(this) = self.this.upgrade() else {
            return;
        };
        let token = self.uni.on_result(Box::new(move |outcome| {
            *this.outcome.lock() = Some(outcome);
            this.drain();
        }));

        *self.token.lock() = Some(token.clone());
        if self.cancelled.load(Ordering::Acquire) {
            token.cancel();
        }
    }

    fn drain(&self) {
        if !self.wip.enter() {
            return;
        }

        let mut missed = 1;
        loop {
            self.drain_pass();
            missed = self.wip.leave(missed);
            if missed == 0 {
                break;
            }
        }
    }

    fn drain_pass(&self) {
        let mut downstream = self.downstream.lock();
        if !downstream.is_active() {
            return;
        }

        if self.cancelled.load(Ordering::Acquire) {
            self.outcome.lock().take();
            self.token.lock().take();
            downstream.release();
            return;
        }

        let failure = self.failure.lock().take();
        if let Some(error) = failure {
            let token = self.token.lock().take();
            if let Some(token) = token {
                token.cancel();
            }
            downstream.error(error);
            return;
        }

        if !self.requested.load(Ordering::Acquire) {
            return;
        }

        let outcome = self.outcome.lock().take();
        match outcome {
            Some(Ok(value)) => {
                self.token.lock().take();
                downstream.next(value);
                if self.cancelled.load(Ordering::Acquire) {
                    downstream.release();
                } else {
                    downstream.complete();
                }
            }
            Some(Err(error)) => {
                self.token.lock().take();
                downstream.error(error);
            }
            None => {}
        }
    }
}

impl<N, T> Subscription for UniSubscription<N, T>
where
    N: Uni<T> + 'static,
    T: Send + 'static,
{
    fn request(&self, n: u64) {
        match validate_request(n) {
            Ok(_) => {
                self.requested.store(true, Ordering::Release);
                if !self.resolving.swap(true, Ordering::AcqRel) {
                    self.resolve();
                }
            }
            Err(error) => {
                self.failure.lock().get_or_insert(error);
            }
        }
        self.drain();
    }

    fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        crate::trace!("to_multi: cancelled by downstream");
        let token = self.token.lock().take();
        if let Some(token) = token {
            token.cancel();
        }
        self.drain();
    }
}
