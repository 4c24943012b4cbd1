// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Core protocol of the backflow reactive streaming library.
//!
//! A [`Publisher`] emits items to a [`Subscriber`] only as fast as the subscriber
//! asks for them through its [`Subscription`]. Each attachment ends with at most
//! one terminal signal (`on_error` or `on_complete`), and nothing is delivered
//! after cancellation has been observed.
//!
//! Besides the three protocol traits this crate provides the primitives every
//! publisher in the workspace is built from:
//!
//! - [`DemandCounter`]: saturating, lock-free demand accounting
//! - [`WorkInProgress`]: the serialization point that lets exactly one thread
//!   deliver signals at a time
//! - [`Downstream`]: the subscriber slot owned by whoever holds that point
//! - [`UpstreamSlot`]: an operator's handle on its upstream, cancelled once
//! - [`guarded`]: converts panics in user callbacks into [`FlowError`]s

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
pub mod callback_guard;
pub mod cancellation_token;
pub mod demand;
pub mod downstream;
pub mod error;
pub mod publisher;
pub mod stream_item;
pub mod subscriber;
pub mod subscription;
pub mod work_in_progress;

pub use self::callback_guard::{guarded, try_guarded};
pub use self::cancellation_token::{CancellationToken, Cancelled};
pub use self::demand::{DemandCounter, UNBOUNDED};
pub use self::downstream::{DeliveryGuard, Downstream};
pub use self::error::{FlowError, Result};
pub use self::publisher::{Multi, Publisher};
pub use self::stream_item::StreamItem;
pub use self::subscriber::{BoxSubscriber, Subscriber};
pub use self::subscription::{EmptySubscription, Subscription, SubscriptionRef, UpstreamSlot};
pub use self::work_in_progress::WorkInProgress;
