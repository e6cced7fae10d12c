//! Morsel construction and column-level transforms.

mod test_data_gen;

use vecta::prelude::*;
use vecta::vecta_vector::{MASK_FALSE, MASK_NULL, MASK_TRUE};
use test_data_gen::{ints, sample_morsel, sequence};

fn two_columns() -> Morsel {
    Morsel::try_new(vec![
        ("a".to_string(), sequence(0, 5)),
        ("b".to_string(), Vector::float64(vec![0.0, 0.5, 1.0, 1.5, 2.0]).unwrap()),
    ])
    .unwrap()
}

#[test]
fn test_construction_rejects_bad_shapes() {
    let err = Morsel::try_new(vec![
        ("a".to_string(), sequence(0, 3)),
        ("b".to_string(), sequence(0, 2)),
    ])
    .unwrap_err();
    assert!(matches!(err, Error::Contract(_)));

    let err = Morsel::try_new(vec![
        ("a".to_string(), sequence(0, 3)),
        ("a".to_string(), sequence(0, 3)),
    ])
    .unwrap_err();
    assert!(matches!(err, Error::Contract(_)));

    let empty = Morsel::empty(7);
    assert_eq!(empty.num_rows(), 7);
    assert_eq!(empty.num_columns(), 0);
}

#[test]
fn test_schema_reflects_columns() {
    let m = sample_morsel(6, 2);
    let schema = m.schema();
    assert_eq!(schema.fields.len(), 3);
    assert_eq!(schema.field_named("k").unwrap().data_type, DataType::Utf8);
    assert_eq!(m.names(), vec!["k", "v", "f"]);
}

#[test]
fn test_select_rename_with_column() {
    let m = two_columns();
    let s = m.select(&["b", "a"]).unwrap();
    assert_eq!(s.names(), vec!["b", "a"]);
    assert!(matches!(m.select(&["zz"]).unwrap_err(), Error::Contract(_)));

    let r = m.rename("a", "id").unwrap();
    assert_eq!(r.names(), vec!["id", "b"]);
    assert!(m.rename("a", "b").is_err());

    let w = m.with_column("c", sequence(10, 5)).unwrap();
    assert_eq!(w.num_columns(), 3);
    let replaced = w.with_column("a", sequence(100, 5)).unwrap();
    assert_eq!(ints(replaced.column("a").unwrap())[0], Some(100));
    assert!(m.with_column("short", sequence(0, 2)).is_err());
}

#[test]
fn test_filter_drops_false_and_null_rows() {
    let m = two_columns();
    let mask = Mask::from_bytes(vec![MASK_TRUE, MASK_FALSE, MASK_NULL, MASK_TRUE, MASK_FALSE]);
    let out = m.filter(&mask).unwrap();
    assert_eq!(out.num_rows(), 2);
    assert_eq!(ints(out.column("a").unwrap()), vec![Some(0), Some(3)]);

    let short = Mask::from_bytes(vec![MASK_TRUE]);
    assert!(m.filter(&short).is_err());
}

#[test]
fn test_slice_and_take() {
    let m = two_columns();
    let s = m.slice(1, 3).unwrap();
    assert_eq!(ints(s.column("a").unwrap()), vec![Some(1), Some(2), Some(3)]);
    assert!(m.slice(4, 3).is_err());

    let t = m.take(&[4, 4, 0]).unwrap();
    assert_eq!(
        t.to_rows().unwrap()[0],
        vec![Scalar::Int64(4), Scalar::Float64(2.0)]
    );
}

#[test]
fn test_detached_drops_reservation() {
    let budget = MemoryBudgetImpl::new(1 << 20);
    let m = two_columns();
    let guard = budget.reserve(m.memory_size(), "test").unwrap();
    let charged = m.with_reservation(guard);
    assert_eq!(budget.used_bytes(), charged.reserved_bytes());

    let copy = charged.detached();
    assert_eq!(copy.reserved_bytes(), 0);
    drop(charged);
    assert_eq!(budget.used_bytes(), 0);
    assert_eq!(copy.num_rows(), 5);
}

fn floats(v: &Vector) -> Vec<Option<f64>> {
    v.to_materialized_list()
        .unwrap()
        .into_iter()
        .map(|s| match s {
            Scalar::Float64(f) => Some(f),
            _ => None,
        })
        .collect()
}

#[test]
fn test_align_pairs_rows_from_both_sides() {
    let left = Morsel::try_new(vec![
        ("a".to_string(), Vector::int64(vec![1, 2, 3, 4, 5]).unwrap()),
        ("b".to_string(), Vector::float64(vec![10.0, 20.0, 30.0, 40.0, 50.0]).unwrap()),
    ])
    .unwrap();
    let right = Morsel::try_new(vec![
        ("c".to_string(), Vector::int64(vec![100, 200, 300, 400, 500]).unwrap()),
        ("d".to_string(), Vector::float64(vec![1.1, 2.2, 3.3, 4.4, 5.5]).unwrap()),
    ])
    .unwrap();

    let out = Morsel::align(&left, &[0, 2, 4], &right, &[1, 3, 4]).unwrap();
    assert_eq!(out.num_rows(), 3);
    assert_eq!(out.names(), vec!["a", "b", "c", "d"]);
    assert_eq!(ints(out.column("a").unwrap()), vec![Some(1), Some(3), Some(5)]);
    assert_eq!(floats(out.column("b").unwrap()), vec![Some(10.0), Some(30.0), Some(50.0)]);
    assert_eq!(ints(out.column("c").unwrap()), vec![Some(200), Some(400), Some(500)]);
    assert_eq!(floats(out.column("d").unwrap()), vec![Some(2.2), Some(4.4), Some(5.5)]);
}

#[test]
fn test_align_keeps_left_on_name_clash() {
    let left = Morsel::try_new(vec![
        ("id".to_string(), sequence(1, 3)),
        ("value".to_string(), Vector::float64(vec![10.0, 20.0, 30.0]).unwrap()),
    ])
    .unwrap();
    let right = Morsel::try_new(vec![
        ("id".to_string(), sequence(4, 3)),
        ("extra".to_string(), Vector::int64(vec![100, 200, 300]).unwrap()),
    ])
    .unwrap();
    let out = Morsel::align(&left, &[2, 1], &right, &[0, 0]).unwrap();
    assert_eq!(out.names(), vec!["id", "value", "extra"]);
    assert_eq!(ints(out.column("id").unwrap()), vec![Some(3), Some(2)]);
    assert_eq!(ints(out.column("extra").unwrap()), vec![Some(100), Some(100)]);
}

#[test]
fn test_align_empty_and_mismatched_indices() {
    let left = Morsel::try_new(vec![("a".to_string(), sequence(1, 3))]).unwrap();
    let right = Morsel::try_new(vec![("b".to_string(), sequence(4, 3))]).unwrap();
    let empty = Morsel::align(&left, &[], &right, &[]).unwrap();
    assert_eq!(empty.num_rows(), 0);
    assert_eq!(empty.num_columns(), 2);

    let err = Morsel::align(&left, &[0, 1], &right, &[0]).unwrap_err();
    assert!(matches!(err, Error::Contract(_)));
}
