//! Flat hash set / map behaviour through the public surface.

mod test_data_gen;

use vecta::prelude::*;
use vecta::vecta_hash::RowIndexMap;
use test_data_gen::int64_column;

#[test]
fn test_insert_reports_new_members() {
    let mut set = FlatHashSet::new();
    assert!(set.insert(42).unwrap());
    assert!(!set.insert(42).unwrap());
    assert!(set.insert(0).unwrap());
    assert!(!set.insert(0).unwrap());
    assert_eq!(set.len(), 2);
    assert!(set.contains(0));
    assert!(!set.contains(1));
}

#[test]
fn test_bulk_insert_counts_only_new() {
    let mut set = FlatHashSet::with_capacity(8).unwrap();
    let added = set.insert_many(&[1, 2, 3, 2, 1]).unwrap();
    assert_eq!(added, 3);
    assert_eq!(set.insert_many(&[3, 4]).unwrap(), 1);
    assert_eq!(set.len(), 4);
}

#[test]
fn test_growth_keeps_every_member() {
    let mut set = FlatHashSet::new();
    let start = set.capacity();
    for fp in 0..10_000u64 {
        set.insert(fp.wrapping_mul(0x2545_F491_4F6C_DD1D)).unwrap();
    }
    assert_eq!(set.len(), 10_000);
    assert!(set.capacity() >= 20_000);
    assert!(set.capacity() > start);
    assert!(set.capacity().is_power_of_two());
    for fp in 0..10_000u64 {
        assert!(set.contains(fp.wrapping_mul(0x2545_F491_4F6C_DD1D)));
    }
}

#[test]
fn test_reserve_avoids_rehash_during_bulk_insert() {
    let mut set = FlatHashSet::new();
    set.reserve(1000).unwrap();
    let cap = set.capacity();
    let fps: Vec<u64> = (1..=1000).collect();
    set.insert_many(&fps).unwrap();
    assert_eq!(set.capacity(), cap);
}

#[test]
fn test_merge_is_union() {
    let mut a = FlatHashSet::new();
    let mut b = FlatHashSet::new();
    a.insert_many(&[1, 2, 3]).unwrap();
    b.insert_many(&[3, 4, 0]).unwrap();
    assert_eq!(a.merge(&b).unwrap(), 2);
    let mut members: Vec<u64> = a.iter().collect();
    members.sort_unstable();
    assert_eq!(members, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_fingerprint_set_trait_object() {
    let mut set: Box<dyn FingerprintSet> = Box::new(FlatHashSet::new());
    assert_eq!(set.insert_many(&[9, 9, 8]).unwrap(), 2);
    assert!(set.contains(8));
    assert_eq!(set.len(), 2);
}

#[test]
fn test_map_accumulates_lazily() {
    let mut map: FlatHashMap<Vec<&str>> = FlatHashMap::new();
    map.entry_or_insert_with(7, Vec::new).unwrap().push("a");
    map.entry_or_insert_with(3, Vec::new).unwrap().push("b");
    map.entry_or_insert_with(7, Vec::new).unwrap().push("c");
    assert_eq!(map.len(), 2);
    assert_eq!(map.get(7), Some(&vec!["a", "c"]));
    assert!(map.get(99).is_none());
    let keys: Vec<u64> = map.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![7, 3]);
}

#[test]
fn test_row_index_map_groups_rows() {
    let v = int64_column(500, 10, 0, 5);
    let mut fps = vec![0u64; v.len()];
    v.hash_into(&mut fps, 0).unwrap();
    let groups = RowIndexMap::from_fingerprints(&fps).unwrap();
    assert!(groups.len() <= 10);
    let total: usize = groups.values().iter().map(Vec::len).sum();
    assert_eq!(total, 500);
    for rows in groups.values() {
        let first = v.get_scalar(rows[0] as usize).unwrap();
        assert!(rows.iter().all(|r| v.get_scalar(*r as usize).unwrap() == first));
        assert!(rows.windows(2).all(|w| w[0] < w[1]));
    }
}
