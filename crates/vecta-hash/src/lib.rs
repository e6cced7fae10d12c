//! vecta-hash: containers keyed directly by 64-bit row fingerprints.
//!
//! The set and map never compare source values, only fingerprints. See
//! [`set::FingerprintSet`] for the seam where a stricter policy plugs in.
//! A single container is not safe for concurrent mutation; parallel
//! workers each own one and the caller merges.

pub mod bloom;
pub mod map;
pub mod set;

pub use bloom::{optimal_num_bits, BloomFilter};
pub use map::{FlatHashMap, RowIndexMap};
pub use set::{FingerprintSet, FlatHashSet};
