//! Bloom filter sizing and membership.

use vecta::prelude::*;
use vecta::vecta_hash::optimal_num_bits;
use vecta::vecta_vector::{MASK_FALSE, MASK_TRUE};

fn filled_4096() -> BloomFilter {
    let mut bloom = BloomFilter::new(4096).unwrap();
    for key in (0..5000u64).step_by(10) {
        bloom.add(key);
    }
    bloom
}

#[test]
fn test_no_false_negatives() {
    let bloom = filled_4096();
    let inserted: Vec<u64> = (0..5000u64).step_by(10).collect();
    assert_eq!(inserted.len(), 500);
    assert!(inserted.iter().all(|k| bloom.possibly_contains(*k)));
}

#[test]
fn test_false_positive_rate_is_bounded() {
    let bloom = filled_4096();
    let absent: Vec<u64> = (0..5000u64).filter(|k| k % 10 == 5).collect();
    assert_eq!(absent.len(), 500);
    let hits = absent.iter().filter(|k| bloom.possibly_contains(**k)).count();
    // Two probes, 500 keys, 4096 bits: expected rate is about 5%.
    assert!(hits < 250, "false positives: {hits}/500");
}

#[test]
fn test_batch_probe_matches_single_probe() {
    let mut bloom = BloomFilter::new(1 << 12).unwrap();
    bloom.add_many(&[1, 2, 3, 1_000_000]);
    let keys = [1u64, 4, 1_000_000, 77];
    let mask = bloom.possibly_contains_many(&keys).unwrap();
    for (i, k) in keys.iter().enumerate() {
        let expected = if bloom.possibly_contains(*k) { MASK_TRUE } else { MASK_FALSE };
        assert_eq!(mask.as_bytes()[i], expected);
    }
    assert_eq!(mask.as_bytes()[0], MASK_TRUE);
    assert_eq!(mask.as_bytes()[2], MASK_TRUE);
}

#[test]
fn test_zero_bits_rejected() {
    assert!(matches!(BloomFilter::new(0).unwrap_err(), Error::Config(_)));
}

#[test]
fn test_sizing_helper() {
    let bits = optimal_num_bits(1000, 0.01).unwrap();
    // About 9.6 bits per key at 1%.
    assert!((9000..10_500).contains(&bits), "bits = {bits}");
    assert!(optimal_num_bits(1000, 0.0).is_err());
    assert!(optimal_num_bits(1000, 1.0).is_err());

    let sized = BloomFilter::with_expected_items(1000, 0.01).unwrap();
    assert_eq!(sized.num_bits(), bits);
}

#[test]
fn test_default_size_from_config() {
    let cfg = KernelConfig {
        bloom_default_bits: 2048,
        ..KernelConfig::default()
    };
    let bloom = BloomFilter::from_config(&cfg).unwrap();
    assert_eq!(bloom.num_bits(), 2048);
    assert_eq!(bloom.count_set_bits(), 0);
}
