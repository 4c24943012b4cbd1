// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Flattening of per-item sub-streams into one stream.
//!
//! Each upstream item is mapped to a publisher (the sub-stream); the items of
//! the sub-streams are delivered downstream through a single serialization
//! point, so two sub-streams never deliver concurrently.
//!
//! # Ordering policies
//!
//! - **Merge** ([`FlatMapConfig::merge`]): up to `concurrency` sub-streams run
//!   at once and their items interleave in arrival order. Items of one
//!   sub-stream keep their relative order.
//! - **Concatenate** ([`FlatMapConfig::concatenate`]): one sub-stream at a time,
//!   in the order of the upstream items. The next upstream item is requested
//!   only once the active sub-stream is fully drained, unless
//!   `upstream_prefetch` allows mapping ahead; prefetched sub-streams are queued
//!   and subscribed in order.
//!
//! # Termination
//!
//! A failure of upstream, of the mapping function or of any sub-stream fails the
//! whole stream right away: upstream and every active sub-stream are cancelled
//! and queued items are discarded. Completion is delivered once upstream has
//! completed and every sub-stream it produced has completed and drained.
//!
//! # Example
//!
//! ```rust
//! use backflow_stream::{sources, PublisherExt};
//! use backflow_test_utils::AssertSubscriber;
//!
//! let collector = AssertSubscriber::create(100);
//! sources::from_iter(vec![1, 2, 3])
//!     .concat_map(|x| sources::from_iter(vec![x * 10, x * 10 + 1]))
//!     .subscribe_with(collector.clone());
//!
//! collector.assert_completed().assert_items(&[10, 11, 20, 21, 30, 31]);
//! ```

mod config;
mod implementation;

pub use config::FlatMapConfig;
pub use implementation::FlatMap;
