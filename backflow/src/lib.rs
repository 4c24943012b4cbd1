// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! # Backflow
//!
//! Reactive streams with backpressure. A [`Publisher`] produces items only
//! after its subscriber has requested them, and every operator respects that
//! demand end to end.
//!
//! ## Crates
//!
//! - `backflow-core`: the protocol ([`Publisher`], [`Subscriber`], [`Subscription`]),
//!   demand accounting and [`FlowError`]
//! - `backflow-stream`: sources, operators, the [`Emitter`] and [`Uni`]
//! - `backflow-exec`: callbacks, `futures::Stream` and `Future` bridges
//!
//! ## Quick Start
//!
//! ```rust
//! use backflow::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> backflow::Result<()> {
//! let items = sources::from_iter(vec![1, 2, 3, 4, 1])
//!     .take_while(|x| *x < 4)
//!     .concat_map(|x| sources::from_iter(vec![x * 10, x * 10 + 1]))
//!     .collect_items()
//!     .await?;
//!
//! assert_eq!(items, vec![10, 11, 20, 21, 30, 31]);
//! # Ok(())
//! # }
//! ```

pub use backflow_core::{
    CancellationToken, FlowError, Publisher, Result, StreamItem, Subscriber, Subscription,
    SubscriptionRef, UNBOUNDED,
};
pub use backflow_exec::{
    CallbackSubscriber, IntoStreamExt, SubscribeExt, SubscriberStream, UniAwaitExt, UniFuture,
};
pub use backflow_stream::{
    sources, uni, BoxUni, Emitter, FlatMapConfig, OverflowStrategy, PublisherExt, Uni, UniExt,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use backflow_core::{FlowError, Publisher, Result, StreamItem, Subscriber, UNBOUNDED};
    pub use backflow_exec::{IntoStreamExt, SubscribeExt, UniAwaitExt};
    pub use backflow_stream::{
        sources, uni, Emitter, FlatMapConfig, OverflowStrategy, PublisherExt, Uni, UniExt,
    };
}
