//! Micro benchmarks for `Term`/`Range` leaf evaluation, comparing the
//! index-covered and scan-only branches.
#![forbid(unsafe_code)]
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use scalarband::testing::FakeSegment;
use scalarband::{Executor, PredicateNode, RangeCond, RangeOp};

const ROWS: i64 = 65_536;
const CHUNK_SIZE: usize = 4_096;
const NUM_CHUNKS: usize = (ROWS as usize).div_ceil(CHUNK_SIZE);

fn build_segment(barrier_chunks: usize) -> FakeSegment {
    let mut seg = FakeSegment::new(CHUNK_SIZE);
    let values: Vec<i64> = (0..ROWS).collect();
    seg.add_i64_field("tag", values, barrier_chunks);
    seg
}

fn leaf_eval(c: &mut Criterion) {
    let mut group = c.benchmark_group("leaf_eval/range");
    group.throughput(Throughput::Elements(ROWS as u64));

    let fully_indexed = build_segment(NUM_CHUNKS);
    let pred = PredicateNode::range::<i64>(
        "tag",
        vec![
            RangeCond::new(RangeOp::Ge, ROWS / 4),
            RangeCond::new(RangeOp::Lt, ROWS / 2),
        ],
    );
    group.bench_function(BenchmarkId::new("range", "fully_indexed"), |bencher| {
        bencher.iter(|| {
            let executor = Executor::new(&fully_indexed, &fully_indexed, &fully_indexed);
            black_box(executor.execute(&pred).expect("valid predicate"));
        });
    });

    let fully_scanned = build_segment(0);
    group.bench_function(BenchmarkId::new("range", "fully_scanned"), |bencher| {
        bencher.iter(|| {
            let executor = Executor::new(&fully_scanned, &fully_scanned, &fully_scanned);
            black_box(executor.execute(&pred).expect("valid predicate"));
        });
    });

    let half_indexed = build_segment(NUM_CHUNKS / 2);
    group.bench_function(BenchmarkId::new("range", "half_indexed"), |bencher| {
        bencher.iter(|| {
            let executor = Executor::new(&half_indexed, &half_indexed, &half_indexed);
            black_box(executor.execute(&pred).expect("valid predicate"));
        });
    });

    group.finish();
}

criterion_group!(benches, leaf_eval);
criterion_main!(benches);
