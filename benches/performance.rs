use criterion::{criterion_group, criterion_main, Criterion};
use vecta::prelude::*;
use vecta::vecta_kernels::aggregate::count_distinct;
use vecta::vecta_kernels::{Expr, Filter};

const ROWS: usize = 64 * 1024;

fn make_column(rows: usize, distinct: i64) -> Vector {
    let mut state = 0x9e37_79b9_7f4a_7c15u64;
    let values = (0..rows)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state % distinct as u64) as i64
        })
        .collect();
    Vector::int64(values).unwrap()
}

fn fingerprints(v: &Vector) -> Vec<u64> {
    let mut out = vec![0u64; v.len()];
    v.hash_into(&mut out, 0).unwrap();
    out
}

fn bench_hash_into(c: &mut Criterion) {
    let column = make_column(ROWS, 1 << 20);
    let mut out = vec![0u64; ROWS];
    c.bench_function("hash_into_portable", |b| {
        b.iter(|| {
            out.fill(0);
            column
                .hash_into_with(&CpuCapabilities::portable(), &mut out, 0)
                .unwrap();
        })
    });
    let detected = CpuCapabilities::detect();
    c.bench_function("hash_into_detected", |b| {
        b.iter(|| {
            out.fill(0);
            column.hash_into_with(&detected, &mut out, 0).unwrap();
        })
    });
}

fn bench_count_distinct(c: &mut Criterion) {
    let chunks: Vec<Vector> = (0..8).map(|_| make_column(ROWS / 8, 10_000)).collect();
    let caps = CpuCapabilities::detect();
    c.bench_function("count_distinct_8_chunks", |b| {
        b.iter(|| count_distinct(&chunks, None, &caps).unwrap().0)
    });
}

fn bench_flat_hash_set(c: &mut Criterion) {
    let fps = fingerprints(&make_column(ROWS, 50_000));
    c.bench_function("flat_hash_set_insert_many", |b| {
        b.iter(|| {
            let mut set = FlatHashSet::new();
            set.insert_many(&fps).unwrap()
        })
    });
}

fn bench_bloom_filter(c: &mut Criterion) {
    let fps = fingerprints(&make_column(ROWS, 1 << 30));
    let mut bloom = BloomFilter::with_expected_items(ROWS, 0.01).unwrap();
    bloom.add_many(&fps);
    c.bench_function("bloom_probe_many", |b| {
        b.iter(|| bloom.possibly_contains_many(&fps).unwrap().count_true())
    });
}

fn bench_filter_operator(c: &mut Criterion) {
    let ctx = KernelContext::portable();
    let morsel = Morsel::try_new(vec![("v".to_string(), make_column(ROWS, 1000))]).unwrap();
    let filter = Filter::new(Expr::binary(Op::LessThan, Expr::col("v"), Expr::lit(500i64)));
    c.bench_function("filter_operator", |b| {
        b.iter(|| filter.eval_morsel(&[morsel.clone()], &ctx).unwrap().num_rows())
    });
}

criterion_group!(
    kernels,
    bench_hash_into,
    bench_count_distinct,
    bench_flat_hash_set,
    bench_bloom_filter,
    bench_filter_operator
);
criterion_main!(kernels);
