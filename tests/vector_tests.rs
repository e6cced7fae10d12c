//! Vector layer: take, comparisons, null tests, reductions.

mod test_data_gen;

use vecta::prelude::*;
use vecta::vecta_vector::primitive::{timestamps, PrimitiveVector};
use vecta::vecta_vector::{ArrayVector, MASK_FALSE, MASK_NULL, MASK_TRUE};
use test_data_gen::{int64_column, ints, inverse, mask_bytes, shuffled, strings};

fn columns_with_nulls(rows: usize) -> Vec<Vector> {
    let words: Vec<String> = (0..rows).map(|i| "w".repeat(i % 5)).collect();
    let texts: Vec<Option<&str>> = words
        .iter()
        .enumerate()
        .map(|(i, w)| (i % 4 != 1).then_some(w.as_str()))
        .collect();
    let flags: Vec<Option<bool>> = (0..rows)
        .map(|i| (i % 6 != 0).then_some(i % 3 == 0))
        .collect();
    let lengths: Vec<Option<usize>> = (0..rows).map(|i| (i % 7 != 3).then_some(i % 3)).collect();
    let child_len = lengths.iter().flatten().sum();
    let child = int64_column(child_len, 9, 4, 11);
    let intervals: Vec<Scalar> = (0..rows)
        .map(|i| {
            if i % 5 == 2 {
                Scalar::Null
            } else {
                Scalar::Interval(IntervalMonthDayNano::new(i as i32, -(i as i32), i as i64 * 1_000))
            }
        })
        .collect();
    vec![
        int64_column(rows, 20, 5, 42),
        strings(&texts),
        Vector::boolean(&flags).unwrap(),
        Vector::Array(ArrayVector::from_lengths(&lengths, child).unwrap()),
        Vector::from_scalars(DataType::Interval, &intervals).unwrap(),
    ]
}

#[test]
fn test_take_then_inverse_restores_column() {
    for (k, v) in columns_with_nulls(64).into_iter().enumerate() {
        let original = v.to_materialized_list().unwrap();
        for seed in [3u64, 77, 1_000_003] {
            let perm = shuffled(v.len(), seed + k as u64);
            let taken = v.take(&perm).unwrap();
            let moved = taken.to_materialized_list().unwrap();
            for (pos, &src) in perm.iter().enumerate() {
                assert_eq!(moved[pos], original[src as usize], "{} row {pos}", v.data_type());
            }
            let back = taken.take(&inverse(&perm)).unwrap();
            assert_eq!(back.to_materialized_list().unwrap(), original, "{}", v.data_type());
            assert_eq!(back.null_count(), v.null_count());
            assert_eq!(back.data_type(), v.data_type());
        }
    }
}

#[test]
fn test_take_keeps_nulls_for_strings_and_arrays() {
    let s = strings(&[Some("a"), None, Some("ccc")]);
    let taken = s.take(&[2, 1, 0, 2]).unwrap();
    assert_eq!(
        taken.to_materialized_list().unwrap(),
        vec![
            Scalar::Utf8("ccc".into()),
            Scalar::Null,
            Scalar::Utf8("a".into()),
            Scalar::Utf8("ccc".into()),
        ]
    );

    let child = Vector::int64(vec![1, 2, 3]).unwrap();
    let arr = Vector::Array(ArrayVector::from_lengths(&[Some(2), None, Some(1)], child).unwrap());
    let taken = arr.take(&[2, 0]).unwrap();
    assert_eq!(
        taken.to_materialized_list().unwrap(),
        vec![
            Scalar::List(vec![Scalar::Int64(3)]),
            Scalar::List(vec![Scalar::Int64(1), Scalar::Int64(2)]),
        ]
    );
}

#[test]
#[should_panic]
fn test_take_out_of_range_panics() {
    let v = Vector::int64(vec![1, 2, 3]).unwrap();
    let _ = v.take(&[3]);
}

#[test]
fn test_equals_and_not_equals_are_complementary() {
    let v = int64_column(100, 4, 7, 9);
    let s = Scalar::Int64(2);
    let eq = v.equals(&s).unwrap();
    let ne = v.not_equals(&s).unwrap();
    for i in 0..v.len() {
        let (a, b) = (eq.as_bytes()[i], ne.as_bytes()[i]);
        if v.is_valid(i) {
            assert_ne!(a, b);
            assert!(a == MASK_TRUE || b == MASK_TRUE);
        } else {
            assert_eq!((a, b), (MASK_NULL, MASK_NULL));
        }
    }
}

#[test]
fn test_comparisons_over_kinds() {
    let v = PrimitiveVector::from_options(DataType::Int32, &[Some(1), None, Some(5)]).unwrap();
    let v = Vector::Int32(v);
    assert_eq!(
        mask_bytes(&v.greater_than(&Scalar::Int32(2)).unwrap()),
        vec![MASK_FALSE, MASK_NULL, MASK_TRUE]
    );

    let s = strings(&[Some("apple"), Some("pear")]);
    assert_eq!(
        mask_bytes(&s.less_than(&Scalar::from("banana")).unwrap()),
        vec![MASK_TRUE, MASK_FALSE]
    );

    let b = Vector::boolean(&[Some(true), None]).unwrap();
    assert_eq!(
        mask_bytes(&b.equals(&Scalar::Boolean(true)).unwrap()),
        vec![MASK_TRUE, MASK_NULL]
    );

    let t = timestamps(TimeUnit::Millisecond, &[Some(10), Some(20)]).unwrap();
    let mask = t
        .greater_than_or_equals(&Scalar::Timestamp64(20, TimeUnit::Millisecond))
        .unwrap();
    assert_eq!(mask_bytes(&mask), vec![MASK_FALSE, MASK_TRUE]);
}

#[test]
fn test_null_scalar_gives_all_null_mask() {
    let v = Vector::int64(vec![1, 2, 3]).unwrap();
    let mask = v.less_than_or_equals(&Scalar::Null).unwrap();
    assert_eq!(mask.count_null(), 3);
}

#[test]
fn test_mismatched_scalar_kind_is_not_implemented() {
    let v = Vector::int64(vec![1, 2]).unwrap();
    let err = v.equals(&Scalar::from("1")).unwrap_err();
    assert!(err.is_not_implemented());

    let child = Vector::int64(vec![1]).unwrap();
    let arr = Vector::Array(ArrayVector::from_lengths(&[Some(1)], child).unwrap());
    assert!(arr.equals(&Scalar::Int64(1)).unwrap_err().is_not_implemented());
}

#[test]
fn test_is_null_mask() {
    let v = int64_column(20, 5, 4, 3);
    let mask = v.is_null().unwrap();
    assert_eq!(mask.count_true(), v.null_count());
    assert_eq!(mask.count_null(), 0);
}

#[test]
fn test_min_max_sum() {
    let v = Vector::Int64(
        PrimitiveVector::from_options(DataType::Int64, &[Some(4), None, Some(-3), Some(9)]).unwrap(),
    );
    assert_eq!(v.min().unwrap(), Scalar::Int64(-3));
    assert_eq!(v.max().unwrap(), Scalar::Int64(9));
    assert_eq!(v.sum().unwrap(), Scalar::Int64(10));

    let f = Vector::float64(vec![1.5, f64::NAN, -2.0]).unwrap();
    assert_eq!(f.min().unwrap(), Scalar::Float64(-2.0));
    assert_eq!(f.max().unwrap(), Scalar::Float64(1.5));

    let s = strings(&[Some("m"), Some("a"), None]);
    assert_eq!(s.min().unwrap(), Scalar::Utf8("a".into()));
    assert!(s.sum().unwrap_err().is_not_implemented());
}

#[test]
fn test_reductions_on_empty_and_all_null_are_null() {
    let empty = Vector::int64(vec![]).unwrap();
    assert_eq!(empty.min().unwrap(), Scalar::Null);
    assert_eq!(empty.sum().unwrap(), Scalar::Null);

    let nulls = Vector::from_scalars(DataType::Float64, &[Scalar::Null, Scalar::Null]).unwrap();
    assert_eq!(nulls.max().unwrap(), Scalar::Null);
}

#[test]
fn test_from_scalars_rejects_mixed_kinds() {
    let err = Vector::from_scalars(DataType::Int64, &[Scalar::Int64(1), Scalar::from("x")]).unwrap_err();
    assert!(matches!(err, Error::Contract(_)));
}

#[test]
fn test_slice_owned() {
    let v = Vector::int64((0..10).collect()).unwrap();
    let s = v.slice_owned(3, 4).unwrap();
    assert_eq!(ints(&s), vec![Some(3), Some(4), Some(5), Some(6)]);
    assert!(!s.is_borrowed());
    assert!(v.slice_owned(8, 5).is_err());
}

#[test]
fn test_invalid_utf8_is_reported_not_replaced() {
    use vecta::vecta_mem::Buffer;
    use vecta::vecta_vector::BinaryVector;

    // Built directly, skipping the checks the safe constructors run.
    let raw = BinaryVector::try_new(
        DataType::Utf8,
        Buffer::from_vec(vec![0, 1, 2]),
        Buffer::from_vec(vec![b'a', 0xFE]),
        None,
    )
    .unwrap();
    assert!(raw.validate_utf8().is_err());
    let v = Vector::Utf8(raw);
    assert_eq!(v.get_scalar(0).unwrap(), Scalar::Utf8("a".into()));
    assert!(matches!(v.get_scalar(1), Err(Error::Contract(_))));
    assert!(v.to_materialized_list().is_err());
    assert!(v.max().is_err());
}
