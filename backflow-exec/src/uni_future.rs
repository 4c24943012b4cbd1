// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use backflow_core::{CancellationToken, FlowError, Result};
use backflow_stream::Uni;
use futures::channel::oneshot;
use futures::task::{Context, Poll};
use pin_project::{pin_project, pinned_drop};
use std::future::Future;
use std::pin::Pin;

/// Future resolving to the outcome of one [`Uni`] resolution.
///
/// Dropping the future cancels the resolution.
#[pin_project(PinnedDrop)]
pub struct UniFuture<T> {
    #[pin]
    receiver: oneshot::Receiver<Result<T>>,
    token: CancellationToken,
}

impl<T> Future for UniFuture<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project().receiver.poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(FlowError::stream_error(
                "uni dropped its callback without resolving",
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[pinned_drop]
impl<T> PinnedDrop for UniFuture<T> {
    fn drop(self: Pin<&mut Self>) {
        self.project().token.cancel();
    }
}

/// Awaiting of any [`Uni`].
pub trait UniAwaitExt<T>: Uni<T> {
    /// Starts a resolution and returns a future of its outcome.
    ///
    /// # Example
    ///
    /// ```rust
    /// use backflow_exec::UniAwaitExt;
    /// use backflow_stream::uni::{self, UniExt};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> backflow_core::Result<()> {
    /// let value = uni::item(20).map(|x| x + 1).into_future().await?;
    /// assert_eq!(value, 21);
    /// # Ok(())
    /// # }
    /// ```
    fn into_future(&self) -> UniFuture<T>
    where
        T: Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let token = self.on_result(Box::new(move |outcome| {
            if sender.send(outcome).is_err() {
                crate::trace!("into_future: outcome dropped, future already gone");
            }
        }));
        UniFuture { receiver, token }
    }
}

impl<T, N: Uni<T> + ?Sized> UniAwaitExt<T> for N {}
