// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use backflow_core::{
    FlowError, Publisher, Result, StreamItem, Subscriber, SubscriptionRef, UpstreamSlot, UNBOUNDED,
};
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{Stream, StreamExt};
use futures::task::{Context, Poll};
use pin_project::{pin_project, pinned_drop};
use std::pin::Pin;
use std::sync::Arc;

/// A [`Publisher`] subscription consumed as a `futures::Stream`.
///
/// Items are requested in batches: `batch` up front, then the consumed amount
/// again once three quarters of a batch has been polled. A failure is yielded
/// as a [`StreamItem::Error`] and ends the stream. Dropping the stream cancels
/// the subscription.
#[pin_project(PinnedDrop)]
pub struct SubscriberStream<T> {
    #[pin]
    receiver: UnboundedReceiver<StreamItem<T>>,
    upstream: Arc<UpstreamSlot>,
    threshold: Option<u64>,
    consumed: u64,
}

impl<T> Stream for SubscriberStream<T> {
    type Item = StreamItem<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let polled = this.receiver.poll_next(cx);

        if let (Poll::Ready(Some(StreamItem::Value(_))), Some(threshold)) = (&polled, *this.threshold) {
            *this.consumed += 1;
            if *this.consumed >= threshold {
                this.upstream.request(*this.consumed);
                *this.consumed = 0;
            }
        }
        polled
    }
}

#[pinned_drop]
impl<T> PinnedDrop for SubscriberStream<T> {
    fn drop(self: Pin<&mut Self>) {
        self.project().upstream.cancel();
    }
}

struct ChannelSubscriber<T> {
    sender: UnboundedSender<StreamItem<T>>,
    upstream: Arc<UpstreamSlot>,
    batch: u64,
}

impl<T: Send> Subscriber<T> for ChannelSubscriber<T> {
    fn on_subscribe(&mut self, subscription: SubscriptionRef) {
        if self.upstream.set(subscription) {
            self.upstream.request(self.batch);
        } else if !self.upstream.is_cancelled() {
            crate::warn!("into_stream: on_subscribe called twice");
        }
    }

    fn on_next(&mut self, item: T) {
        if self.sender.unbounded_send(StreamItem::Value(item)).is_err() {
            crate::trace!("into_stream: stream dropped, cancelling");
            self.upstream.cancel();
        }
    }

    fn on_error(&mut self, error: FlowError) {
        if self.sender.unbounded_send(StreamItem::Error(error)).is_err() {
            crate::trace!("into_stream: failure dropped, stream already gone");
        }
        self.sender.close_channel();
    }

    fn on_complete(&mut self) {
        self.sender.close_channel();
    }
}

/// Conversion of any [`Publisher`] into a `futures::Stream`.
pub trait IntoStreamExt<T>: Publisher<T> {
    /// Subscribes and exposes the subscription as a stream, requesting `batch`
    /// items at a time ([`UNBOUNDED`] requests everything at once).
    ///
    /// A zero `batch` is a protocol violation: the stream yields
    /// [`FlowError::InvalidDemand`] and ends.
    fn into_stream(&self, batch: u64) -> SubscriberStream<T>
    where
        T: Send + 'static,
    {
        let (sender, receiver) = unbounded();
        let upstream = Arc::new(UpstreamSlot::new());
        self.subscribe(Box::new(ChannelSubscriber {
            sender,
            upstream: Arc::clone(&upstream),
            batch,
        }));

        let threshold = match batch {
            0 | UNBOUNDED => None,
            batch => Some((batch - batch / 4).max(1)),
        };
        SubscriberStream {
            receiver,
            upstream,
            threshold,
            consumed: 0,
        }
    }

    /// Collects every item with unbounded demand.
    ///
    /// # Errors
    ///
    /// Resolves to the failure of the publisher, if it fails.
    ///
    /// # Example
    ///
    /// ```rust
    /// use backflow_exec::IntoStreamExt;
    /// use backflow_stream::{sources, PublisherExt};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> backflow_core::Result<()> {
    /// let items = sources::from_iter(vec![1, 2, 2, 3]).distinct().collect_items().await?;
    /// assert_eq!(items, vec![1, 2, 3]);
    /// # Ok(())
    /// # }
    /// ```
    fn collect_items(&self) -> BoxFuture<'static, Result<Vec<T>>>
    where
        T: Send + 'static,
    {
        let mut stream = self.into_stream(UNBOUNDED);
        async move {
            let mut items = Vec::new();
            while let Some(item) = stream.next().await {
                match item {
                    StreamItem::Value(value) => items.push(value),
                    StreamItem::Error(error) => return Err(error),
                }
            }
            Ok(items)
        }
        .boxed()
    }
}

impl<T, P: Publisher<T> + ?Sized> IntoStreamExt<T> for P {}
