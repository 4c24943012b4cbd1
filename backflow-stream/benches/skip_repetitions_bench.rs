// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use backflow_stream::{sources, PublisherExt};
use backflow_test_utils::AssertSubscriber;
use criterion::{BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

pub fn bench_skip_repetitions(c: &mut Criterion) {
    let mut group = c.benchmark_group("skip_repetitions");
    let sizes = [100usize, 1000usize, 10000];
    let run_lengths = [1usize, 2usize, 10usize]; // 1 = nothing skipped

    for &size in &sizes {
        for &run in &run_lengths {
            let id = BenchmarkId::from_parameter(format!("m{size}_run{run}"));
            group.throughput(Throughput::Elements(size as u64));
            group.bench_with_input(id, &(size, run), |bencher, &(size, run)| {
                let items: Vec<i32> = (0..size).map(|i| (i / run) as i32).collect();
                bencher.iter(|| {
                    let collector = AssertSubscriber::unbounded();
                    sources::from_iter(items.clone())
                        .skip_repetitions()
                        .subscribe_with(collector.clone());
                    black_box(collector.item_count());
                });
            });
        }
    }

    group.finish();
}
