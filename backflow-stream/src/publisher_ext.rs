// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::distinct::{Distinct, DistinctBy};
use crate::flat_map::{FlatMap, FlatMapConfig};
use crate::map::Map;
use crate::skip_repetitions::SkipRepetitions;
use crate::take_while::TakeWhile;
use crate::uni::{First, Uni, UniExt, UniToMulti};
use backflow_core::{Multi, Publisher, Subscriber};
use std::cmp::Ordering;
use std::hash::Hash;
use std::sync::Arc;

/// Equality used by [`PublisherExt::skip_repetitions`].
pub type EqualsFn<T> = fn(&T, &T) -> bool;

/// Mapper of the uni flattening operators: item to the publisher of its uni.
pub type UniMapper<T, N, U> = Box<dyn Fn(T) -> UniToMulti<N, U> + Send + Sync>;

/// Operators available on every [`Publisher`].
///
/// Operators are factories: chaining them builds a description of the
/// pipeline, and every subscription to the result creates fresh per-attachment
/// state in each stage.
pub trait PublisherExt<T>: Publisher<T> + Sized {
    /// Forwards items while `predicate` holds, then completes.
    ///
    /// The first item failing the predicate is not forwarded.
    fn take_while<F>(self, predicate: F) -> TakeWhile<Self, F>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        TakeWhile::new(self, predicate)
    }

    /// Forwards each value the first time it is seen, by `Hash` and `Eq`.
    fn distinct(self) -> Distinct<Self>
    where
        T: Clone + Hash + Eq,
    {
        Distinct::new(self)
    }

    /// Forwards each value the first time it is seen, by `comparator`.
    ///
    /// Values comparing [`Ordering::Equal`] are the same value.
    fn distinct_by<F>(self, comparator: F) -> DistinctBy<Self, F>
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        DistinctBy::new(self, comparator)
    }

    /// Drops values equal to the preceding one.
    fn skip_repetitions(self) -> SkipRepetitions<Self, EqualsFn<T>>
    where
        T: PartialEq,
    {
        let equals: EqualsFn<T> = <T as PartialEq>::eq;
        SkipRepetitions::new(self, equals)
    }

    /// Drops values that `equals` considers equal to the preceding one.
    fn skip_repetitions_by<F>(self, equals: F) -> SkipRepetitions<Self, F>
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        SkipRepetitions::new(self, equals)
    }

    /// Transforms every item.
    fn map<F, U>(self, mapper: F) -> Map<Self, F, T>
    where
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        Map::new(self, mapper)
    }

    /// Maps every item to a sub-stream and merges the sub-streams.
    fn flat_map_merge<F, Q>(self, mapper: F) -> FlatMap<Self, F, T>
    where
        F: Fn(T) -> Q + Send + Sync + 'static,
    {
        self.flat_map_merge_with(mapper, FlatMapConfig::merge())
    }

    /// [`flat_map_merge`](Self::flat_map_merge) with explicit tuning.
    fn flat_map_merge_with<F, Q>(self, mapper: F, config: FlatMapConfig) -> FlatMap<Self, F, T>
    where
        F: Fn(T) -> Q + Send + Sync + 'static,
    {
        FlatMap::new(self, mapper, config, "flat_map_merge")
    }

    /// Maps every item to a sub-stream and emits the sub-streams one after the
    /// other, in upstream order.
    fn concat_map<F, Q>(self, mapper: F) -> FlatMap<Self, F, T>
    where
        F: Fn(T) -> Q + Send + Sync + 'static,
    {
        self.concat_map_with(mapper, FlatMapConfig::concatenate())
    }

    /// [`concat_map`](Self::concat_map) with explicit tuning.
    ///
    /// The concurrency of `config` is forced to one; only the prefetch settings
    /// apply.
    fn concat_map_with<F, Q>(self, mapper: F, config: FlatMapConfig) -> FlatMap<Self, F, T>
    where
        F: Fn(T) -> Q + Send + Sync + 'static,
    {
        FlatMap::new(self, mapper, config.sequential(), "concat_map")
    }

    /// Maps every item to a uni and emits the values as they resolve.
    fn flat_map_uni_merge<F, N, U>(self, mapper: F) -> FlatMap<Self, UniMapper<T, N, U>, T>
    where
        F: Fn(T) -> N + Send + Sync + 'static,
        N: Uni<U> + 'static,
    {
        let mapper: UniMapper<T, N, U> = Box::new(move |item| mapper(item).to_multi());
        FlatMap::new(self, mapper, FlatMapConfig::merge(), "flat_map_uni_merge")
    }

    /// Maps every item to a uni and emits the values in upstream order.
    fn concat_map_uni<F, N, U>(self, mapper: F) -> FlatMap<Self, UniMapper<T, N, U>, T>
    where
        F: Fn(T) -> N + Send + Sync + 'static,
        N: Uni<U> + 'static,
    {
        let mapper: UniMapper<T, N, U> = Box::new(move |item| mapper(item).to_multi());
        FlatMap::new(self, mapper, FlatMapConfig::concatenate(), "concat_map_uni")
    }

    /// Uni resolving to the first item.
    fn first(self) -> First<Self, T> {
        First::new(self)
    }

    /// Erases the concrete publisher type.
    fn boxed(self) -> Multi<T>
    where
        Self: 'static,
    {
        Arc::new(self)
    }

    /// Subscribes `subscriber` without boxing it by hand.
    fn subscribe_with<S>(&self, subscriber: S)
    where
        S: Subscriber<T> + 'static,
    {
        self.subscribe(Box::new(subscriber));
    }
}

impl<T, P: Publisher<T>> PublisherExt<T> for P {}
