// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Operators, sources and one-shot values for backflow publishers.
//!
//! Every operator is a factory holding its configuration only. Subscribing to
//! an operator subscribes a fresh operator subscriber upstream, so one pipeline
//! description can serve any number of independent subscriptions.
//!
//! # Operator Categories
//!
//! ### Filtering Operators
//!
//! - **[`take_while`](PublisherExt::take_while)**: forwards items while a predicate holds, then completes
//! - **[`distinct`](PublisherExt::distinct)** / **[`distinct_by`](PublisherExt::distinct_by)**:
//!   forwards each value the first time it is seen
//! - **[`skip_repetitions`](PublisherExt::skip_repetitions)**: drops values equal to their predecessor
//!
//! ### Flattening Operators
//!
//! - **[`flat_map_merge`](PublisherExt::flat_map_merge)**: item to sub-stream, sub-streams interleaved
//! - **[`concat_map`](PublisherExt::concat_map)**: item to sub-stream, sub-streams one after the other
//! - **[`flat_map_uni_merge`](PublisherExt::flat_map_uni_merge)** /
//!   **[`concat_map_uni`](PublisherExt::concat_map_uni)**: the same for one-shot values
//!
//! ### Sources
//!
//! - [`sources`]: collections, ranges, single values, terminal publishers
//! - [`sources::emitter`]: hot source fed from any thread through an [`Emitter`]
//! - [`uni`]: one-shot values and their conversion to publishers
//!
//! # Error Handling
//!
//! Predicates, comparators, mappers and the `Hash`/`Eq` implementations used by
//! [`distinct`](PublisherExt::distinct) run under a panic guard: a panic cancels
//! upstream and fails the stream with
//! [`FlowError::CallbackPanic`](backflow_core::FlowError::CallbackPanic).
//! Upstream failures pass through unchanged. Every subscription ends with at
//! most one terminal signal.
//!
//! # Logging
//!
//! With the `tracing` feature, dropped late signals, discarded emitter calls and
//! flattening failures are reported through `tracing`. Without it, only
//! warnings are printed to stderr.

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
mod logging;
pub mod distinct;
pub mod emitter;
pub mod flat_map;
pub mod map;
pub mod operator;
pub mod publisher_ext;
pub mod skip_repetitions;
pub mod sources;
pub mod take_while;
pub mod uni;

pub use distinct::{Distinct, DistinctBy};
pub use emitter::{Emitter, EmitterSource, OverflowStrategy};
pub use flat_map::{FlatMap, FlatMapConfig};
pub use map::Map;
pub use operator::OperatorSubscriber;
pub use publisher_ext::{EqualsFn, PublisherExt, UniMapper};
pub use skip_repetitions::SkipRepetitions;
pub use take_while::TakeWhile;
pub use uni::{BoxUni, Uni, UniExt};
