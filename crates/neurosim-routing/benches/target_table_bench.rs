// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Target table construction benchmarks
//!
//! Measures a full construction phase (prepare, insert, compress) across the
//! worker pool, and per-thread compression of heavily duplicated secondary
//! positions.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use neurosim_routing::{StaticTopology, TableSettings, TargetData, TargetTable};

const MAX_LID_BOUND: usize = 10_000;

fn feed(num_threads: usize, records_per_thread: u32) -> Vec<Vec<(u32, TargetData)>> {
    (0..num_threads)
        .map(|tid| {
            (0..records_per_thread)
                .map(|i| {
                    let lid = (i.wrapping_mul(2_654_435_761) >> 4) % MAX_LID_BOUND as u32;
                    if i % 4 == 0 {
                        (0, TargetData::secondary(lid, i % 512))
                    } else {
                        (0, TargetData::primary(lid, (tid % 4) as u16, 0, i))
                    }
                })
                .collect()
        })
        .collect()
}

fn bench_construction_phase(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction_phase");
    for num_threads in [1usize, 4] {
        let records = feed(num_threads, 200_000);
        group.bench_with_input(
            BenchmarkId::from_parameter(num_threads),
            &records,
            |b, records| {
                b.iter(|| {
                    let mut table = TargetTable::new(TableSettings::default()).unwrap();
                    table
                        .initialize(&StaticTopology::single_rank(num_threads).unwrap())
                        .unwrap();
                    black_box(table.run_construction_phase(MAX_LID_BOUND, records).unwrap());
                })
            },
        );
    }
    group.finish();
}

fn bench_compress(c: &mut Criterion) {
    let records = feed(1, 500_000);
    c.bench_function("compress_secondary_send_buffer_pos", |b| {
        b.iter_batched(
            || {
                let mut table = TargetTable::new(TableSettings::default()).unwrap();
                table
                    .initialize(&StaticTopology::single_rank(1).unwrap())
                    .unwrap();
                table.prepare(0, MAX_LID_BOUND).unwrap();
                for (rank, data) in &records[0] {
                    table.add_target(0, *rank, data).unwrap();
                }
                table
            },
            |mut table| {
                table.compress_secondary_send_buffer_pos(0).unwrap();
                black_box(table)
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, bench_construction_phase, bench_compress);
criterion_main!(benches);
