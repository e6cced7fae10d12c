//! Running count-distinct over chunked columns.

mod test_data_gen;

use std::collections::HashSet;

use vecta::prelude::*;
use vecta::vecta_kernels::aggregate::{
    aggregate, count_distinct, DistinctAccumulator, FingerprintDistinct, VerifiedDistinct,
};
use test_data_gen::{int64_column, ints, strings};

#[test]
fn test_two_chunks_count_four() {
    let caps = CpuCapabilities::portable();
    let chunks = [
        Vector::int64(vec![1, 2, 2, 3]).unwrap(),
        Vector::int64(vec![3, 4]).unwrap(),
    ];
    let (count, set) = count_distinct(&chunks, None, &caps).unwrap();
    assert_eq!(count, 4);
    assert_eq!(set.len(), 4);
}

#[test]
fn test_refeeding_a_chunk_is_idempotent() {
    let caps = CpuCapabilities::portable();
    let chunk = Vector::int64(vec![1, 2, 2, 3]).unwrap();
    let (first, set) = count_distinct(std::slice::from_ref(&chunk), None, &caps).unwrap();
    let (again, set) = count_distinct(std::slice::from_ref(&chunk), Some(set), &caps).unwrap();
    assert_eq!(first, again);
    assert_eq!(set.len(), 3);
}

#[test]
fn test_chunking_does_not_change_count() {
    let caps = CpuCapabilities::detect();
    let column = int64_column(2_000, 300, 17, 1234);
    let expected: HashSet<i64> = ints(&column).into_iter().flatten().collect();

    for splits in [1usize, 2, 7, 64] {
        let step = column.len().div_ceil(splits);
        let chunks: Vec<Vector> = (0..column.len())
            .step_by(step)
            .map(|start| column.slice_owned(start, step.min(column.len() - start)).unwrap())
            .collect();
        let mut set = None;
        let mut count = 0;
        for chunk in &chunks {
            let (c, s) = count_distinct(std::slice::from_ref(chunk), set.take(), &caps).unwrap();
            count = c;
            set = Some(s);
        }
        assert_eq!(count, expected.len(), "splits = {splits}");
    }
}

#[test]
fn test_works_for_any_vector_kind() {
    let caps = CpuCapabilities::portable();
    let (n, _) = count_distinct(
        &[strings(&[Some("a"), Some("b"), None]), strings(&[Some("a"), Some("c")])],
        None,
        &caps,
    )
    .unwrap();
    assert_eq!(n, 3);

    let (n, _) = count_distinct(
        &[Vector::boolean(&[Some(true), Some(false), Some(true), None]).unwrap()],
        None,
        &caps,
    )
    .unwrap();
    assert_eq!(n, 2);
}

#[test]
fn test_empty_input() {
    let (n, set) = count_distinct(&[], None, &CpuCapabilities::portable()).unwrap();
    assert_eq!(n, 0);
    assert!(set.is_empty());
}

#[test]
fn test_accumulators_are_interchangeable() {
    let caps = CpuCapabilities::portable();
    let column = int64_column(500, 40, 9, 77);
    let mut impls: Vec<Box<dyn DistinctAccumulator>> = vec![
        Box::new(FingerprintDistinct::new(caps)),
        Box::new(VerifiedDistinct::new(caps)),
    ];
    for acc in impls.iter_mut() {
        acc.update(&column.slice_owned(0, 250).unwrap()).unwrap();
        acc.update(&column.slice_owned(250, 250).unwrap()).unwrap();
    }
    assert_eq!(impls[0].count(), impls[1].count());
}

#[test]
fn test_aggregate_entry_point() {
    let caps = CpuCapabilities::portable();
    let chunks = [Vector::int64(vec![5, 5]).unwrap(), Vector::int64(vec![6]).unwrap()];
    assert_eq!(
        aggregate(AggregateFunction::CountDistinct, &chunks, caps).unwrap(),
        Scalar::Int64(2)
    );
    assert_eq!(aggregate(AggregateFunction::Sum, &chunks, caps).unwrap(), Scalar::Int64(16));
    assert_eq!(aggregate(AggregateFunction::Avg, &chunks, caps).unwrap(), Scalar::Float64(16.0 / 3.0));
    assert_eq!(aggregate(AggregateFunction::Last, &chunks, caps).unwrap(), Scalar::Int64(6));
}
