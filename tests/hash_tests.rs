//! Row fingerprints: determinism, multi-column mixing, normalisation.

mod test_data_gen;

use vecta::prelude::*;
use vecta::vecta_core::hash::{mix_hash, NULL_HASH};
use vecta::vecta_vector::primitive::PrimitiveVector;
use test_data_gen::{int64_column, sample_morsel, strings};

fn fingerprints(v: &Vector) -> Vec<u64> {
    let mut out = vec![0u64; v.len()];
    v.hash_into(&mut out, 0).unwrap();
    out
}

#[test]
fn test_equal_values_fingerprint_equally_across_chunks() {
    let whole = int64_column(300, 50, 11, 7);
    let first = whole.slice_owned(0, 120).unwrap();
    let second = whole.slice_owned(120, 180).unwrap();

    let mut chunked = vec![0u64; 300];
    first.hash_into(&mut chunked, 0).unwrap();
    second.hash_into(&mut chunked, 120).unwrap();
    assert_eq!(chunked, fingerprints(&whole));
}

#[test]
fn test_integer_width_does_not_change_fingerprint() {
    let narrow = Vector::Int8(PrimitiveVector::from_values(DataType::Int8, vec![-1, 0, 7]).unwrap());
    let wide = Vector::int64(vec![-1, 0, 7]).unwrap();
    assert_eq!(fingerprints(&narrow), fingerprints(&wide));
}

#[test]
fn test_null_rows_mix_null_hash() {
    let v = Vector::from_scalars(DataType::Int64, &[Scalar::Null, Scalar::Int64(3)]).unwrap();
    let fp = fingerprints(&v);
    assert_eq!(fp[0], mix_hash(0, NULL_HASH));
    assert_ne!(fp[0], fp[1]);

    let s = strings(&[None]);
    assert_eq!(fingerprints(&s)[0], fp[0]);
}

#[test]
fn test_float_zero_and_nan_normalised() {
    let v = Vector::float64(vec![0.0, -0.0, f64::NAN, -f64::NAN]).unwrap();
    let fp = fingerprints(&v);
    assert_eq!(fp[0], fp[1]);
    assert_eq!(fp[2], fp[3]);
    assert_ne!(fp[0], fp[2]);
}

#[test]
fn test_strings_fingerprint_by_content() {
    let a = strings(&[Some("alpha"), Some("beta"), Some("alpha")]);
    let fp = fingerprints(&a);
    assert_eq!(fp[0], fp[2]);
    assert_ne!(fp[0], fp[1]);
}

#[test]
fn test_multi_column_fingerprint_depends_on_order() {
    let x = Vector::int64(vec![1, 2]).unwrap();
    let y = Vector::int64(vec![2, 1]).unwrap();
    let mut xy = vec![0u64; 2];
    x.hash_into(&mut xy, 0).unwrap();
    y.hash_into(&mut xy, 0).unwrap();
    let mut yx = vec![0u64; 2];
    y.hash_into(&mut yx, 0).unwrap();
    x.hash_into(&mut yx, 0).unwrap();
    assert_ne!(xy[0], xy[1]);
    assert_eq!(xy[0], yx[1]);
}

#[test]
fn test_short_buffer_is_contract_error() {
    let v = Vector::int64(vec![1, 2, 3]).unwrap();
    let mut out = vec![7u64; 4];
    let err = v.hash_into(&mut out, 2).unwrap_err();
    assert!(matches!(err, Error::Contract(_)));
    assert_eq!(out, vec![7u64; 4]);
}

#[test]
fn test_wide_simd_path_matches_portable() {
    let v = int64_column(1031, 1000, 13, 99);
    let mut portable = vec![0u64; v.len()];
    let mut detected = vec![0u64; v.len()];
    v.hash_into_with(&CpuCapabilities::portable(), &mut portable, 0).unwrap();
    v.hash_into_with(&CpuCapabilities::detect(), &mut detected, 0).unwrap();
    assert_eq!(portable, detected);
}

#[test]
fn test_morsel_hash_matches_column_by_column() {
    let m = sample_morsel(16, 3);
    let mut manual = vec![0u64; 16];
    for (_, v) in m.columns() {
        v.hash_into(&mut manual, 0).unwrap();
    }
    assert_eq!(m.hash().unwrap(), manual);

    let parts = m.hash_columns(&["k"], 4).unwrap();
    assert!(parts.iter().all(|p| *p < 4));
    assert_eq!(parts[0], parts[3]);
}
