// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use super::{Uni, UniCallback};
use backflow_core::{guarded, CancellationToken};
use std::marker::PhantomData;
use std::sync::Arc;

/// Uni returned by [`UniExt::map`](super::UniExt::map).
pub struct UniMap<N, F, T> {
    uni: N,
    mapper: Arc<F>,
    _input: PhantomData<fn(T)>,
}

impl<N, F, T> UniMap<N, F, T> {
    pub(crate) fn new(uni: N, mapper: F) -> Self {
        Self {
            uni,
            mapper: Arc::new(mapper),
            _input: PhantomData,
        }
    }
}

impl<T, R, N, F> Uni<R> for UniMap<N, F, T>
where
    T: 'static,
    R: 'static,
    N: Uni<T>,
    F: Fn(T) -> R + Send + Sync + 'static,
{
    fn on_result(&self, callback: UniCallback<R>) -> CancellationToken {
        let mapper = Arc::clone(&self.mapper);
        self.uni.on_result(Box::new(move |outcome| {
            callback(outcome.and_then(|value| guarded(|| mapper(value))));
        }))
    }
}
