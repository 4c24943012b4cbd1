// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

mod skip_repetitions_bench;

use criterion::{criterion_group, criterion_main};
use distinct_bench::bench_distinct;
use flat_map_bench::bench_flat_map;
use skip_repetitions_bench::bench_skip_repetitions;

criterion_group!(
    stream_benches,
    bench_distinct,
    bench_flat_map,
    bench_skip_repetitions
);
criterion_main!(stream_benches);
