// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use super::OverflowStrategy;
use backflow_core::demand::validate_request;
use backflow_core::{
    BoxSubscriber, CancellationToken, DemandCounter, Downstream, FlowError, Subscription,
    WorkInProgress,
};
use core::sync::atomic::{AtomicBool, Ordering};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

struct Inbox<T> {
    items: VecDeque<T>,
    completed: bool,
    failure: Option<FlowError>,
    closed: bool,
}

/// Per-subscription state shared by every clone of an [`Emitter`](super::Emitter).
///
/// Callers push into the inbox under a short lock; whoever wins the
/// work-in-progress counter drains it to the subscriber.
pub(super) struct EmitterState<T> {
    strategy: OverflowStrategy,
    inbox: Mutex<Inbox<T>>,
    requested: DemandCounter,
    cancelled: AtomicBool,
    wip: WorkInProgress,
    termination: CancellationToken,
    downstream: Downstream<T>,
}

impl<T: Send + 'static> EmitterState<T> {
    pub(super) fn attach(strategy: OverflowStrategy, subscriber: BoxSubscriber<T>) -> Arc<Self> {
        let state = Arc::new(Self {
            strategy,
            inbox: Mutex::new(Inbox {
                items: VecDeque::new(),
                completed: false,
                failure: None,
                closed: false,
            }),
            requested: DemandCounter::new(),
            cancelled: AtomicBool::new(false),
            wip: WorkInProgress::new(),
            termination: CancellationToken::new(),
            downstream: Downstream::new(subscriber),
        });
        state.downstream.set_subscription(state.clone());
        state.drain();
        state
    }

    pub(super) fn emit(&self, item: T) {
        {
            let mut inbox = self.inbox.lock();
            if inbox.closed || self.is_cancelled() {
                crate::trace!("emitter: item discarded, stream is over");
                return;
            }

            let room = self.requested.current().saturating_sub(inbox.items.len() as u64);
            match self.strategy {
                OverflowStrategy::Buffer => inbox.items.push_back(item),
                _ if room > 0 => inbox.items.push_back(item),
                OverflowStrategy::Drop => {
                    crate::trace!("emitter: no demand, item dropped");
                    return;
                }
                OverflowStrategy::Latest => {
                    if inbox.items.len() as u64 > self.requested.current() {
                        inbox.items.pop_back();
                    }
                    inbox.items.push_back(item);
                }
                OverflowStrategy::Fail => {
                    inbox.closed = true;
                    inbox.items.clear();
                    inbox.failure = Some(FlowError::overflow(
                        "emitter received an item while downstream had no demand",
                    ));
                }
            }
        }
        self.drain();
    }

    pub(super) fn complete(&self) {
        {
            let mut inbox = self.inbox.lock();
            if inbox.closed || self.is_cancelled() {
                crate::trace!("emitter: completion discarded, stream is over");
                return;
            }
            inbox.closed = true;
            inbox.completed = true;
        }
        self.drain();
    }

    pub(super) fn fail(&self, error: FlowError) {
        {
            let mut inbox = self.inbox.lock();
            if inbox.closed || self.is_cancelled() {
                crate::trace!("emitter: failure discarded, stream is over: {}", error);
                return;
            }
            inbox.closed = true;
            inbox.items.clear();
            inbox.failure = Some(error);
        }
        self.drain();
    }

    pub(super) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub(super) fn requested(&self) -> u64 {
        self.requested.current()
    }

    pub(super) fn on_termination(&self, callback: impl FnOnce() + Send + 'static) {
        self.termination.on_cancel(callback);
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
        loop {
            if !downstream.is_active() {
                return;
            }
            if self.is_cancelled() {
                self.close();
                downstream.release();
                self.termination.cancel();
                return;
            }

            let step = {
                let mut inbox = self.inbox.lock();
                if let Some(error) = inbox.failure.take() {
                    Step::Fail(error)
                } else if !self.requested.has_demand() {
                    if inbox.completed && inbox.items.is_empty() {
                        Step::Complete
                    } else {
                        Step::Idle
                    }
                } else if let Some(item) = inbox.items.pop_front() {
                    Step::Item(item)
                } else if inbox.completed {
                    Step::Complete
                } else {
                    Step::Idle
                }
            };

            match step {
                Step::Item(item) => {
                    self.requested.produced(1);
                    downstream.next(item);
                }
                Step::Fail(error) => {
                    self.close();
                    downstream.error(error);
                    self.termination.cancel();
                    return;
                }
                Step::Complete => {
                    downstream.complete();
                    self.termination.cancel();
                    return;
                }
                Step::Idle => return,
            }
        }
    }

    fn close(&self) {
        let mut inbox = self.inbox.lock();
        inbox.closed = true;
        inbox.items.clear();
    }
}

enum Step<T> {
    Item(T),
    Fail(FlowError),
    Complete,
    Idle,
}

impl<T: Send + 'static> Subscription for EmitterState<T> {
    fn request(&self, n: u64) {
        match validate_request(n) {
            Ok(n) => {
                self.requested.add(n);
            }
            Err(error) => {
                let mut inbox = self.inbox.lock();
                if !inbox.closed {
                    inbox.closed = true;
                    inbox.items.clear();
                    inbox.failure = Some(error);
                }
            }
        }
        self.drain();
    }

    fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            crate::trace!("emitter: cancelled by downstream");
        }
        self.drain();
    }
}
