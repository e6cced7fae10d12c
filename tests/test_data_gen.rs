//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use vecta::prelude::*;
use vecta::vecta_vector::primitive::PrimitiveVector;

/// Deterministic pseudo-random i64s (xorshift), `None` every `null_every` rows.
pub fn int64_column(rows: usize, distinct: i64, null_every: usize, seed: u64) -> Vector {
    let mut state = seed | 1;
    let values: Vec<Option<i64>> = (0..rows)
        .map(|i| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            if null_every > 0 && i % null_every == null_every - 1 {
                None
            } else {
                Some((state % distinct.max(1) as u64) as i64)
            }
        })
        .collect();
    Vector::Int64(PrimitiveVector::from_options(DataType::Int64, &values).expect("int64 column"))
}

pub fn sequence(start: i64, len: usize) -> Vector {
    Vector::int64((start..start + len as i64).collect()).expect("sequence")
}

pub fn strings(values: &[Option<&str>]) -> Vector {
    Vector::utf8(values).expect("utf8 column")
}

/// `k` (utf8, cycles through `groups` names), `v` (int64 = row index), `f` (float64).
pub fn sample_morsel(rows: usize, groups: usize) -> Morsel {
    let names: Vec<String> = (0..rows).map(|i| format!("g{}", i % groups.max(1))).collect();
    let keys: Vec<Option<&str>> = names.iter().map(|s| Some(s.as_str())).collect();
    Morsel::try_new(vec![
        ("k".to_string(), strings(&keys)),
        ("v".to_string(), sequence(0, rows)),
        (
            "f".to_string(),
            Vector::float64((0..rows).map(|i| i as f64 * 0.5).collect()).expect("f column"),
        ),
    ])
    .expect("sample morsel")
}

pub fn ints(v: &Vector) -> Vec<Option<i64>> {
    v.to_materialized_list()
        .expect("materialize")
        .into_iter()
        .map(|s| s.as_i64())
        .collect()
}

pub fn mask_bytes(m: &Mask) -> Vec<u8> {
    m.as_bytes().to_vec()
}

/// A deterministic shuffle of `0..len` (Fisher-Yates over xorshift).
pub fn shuffled(len: usize, seed: u64) -> Vec<u32> {
    let mut perm: Vec<u32> = (0..len as u32).collect();
    let mut state = seed | 1;
    for i in (1..len).rev() {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        perm.swap(i, (state % (i as u64 + 1)) as usize);
    }
    perm
}

pub fn inverse(perm: &[u32]) -> Vec<u32> {
    let mut out = vec![0u32; perm.len()];
    for (pos, &src) in perm.iter().enumerate() {
        out[src as usize] = pos as u32;
    }
    out
}
