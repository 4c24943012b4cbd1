// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Terminal consumers for backflow publishers and unis.
//!
//! - [`SubscribeExt::subscribe_callbacks`]: plain callbacks, unbounded demand,
//!   cancelled through the returned [`CancellationToken`](backflow_core::CancellationToken)
//! - [`IntoStreamExt::into_stream`]: a `futures::Stream` requesting in batches
//! - [`IntoStreamExt::collect_items`]: every item in a `Vec`
//! - [`UniAwaitExt::into_future`]: the outcome of a [`Uni`](backflow_stream::Uni)

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
mod logging;
pub mod into_stream;
pub mod subscribe;
pub mod uni_future;

pub use into_stream::{IntoStreamExt, SubscriberStream};
pub use subscribe::{CallbackSubscriber, SubscribeExt};
pub use uni_future::{UniAwaitExt, UniFuture};
