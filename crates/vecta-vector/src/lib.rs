//! vecta-vector: typed columnar vectors and the morsels that carry them.
//!
//! Every vector kind supports the same operation set: comparisons against a
//! scalar, `take`, `hash_into`, null tests, reductions, and materialisation.
//! Vectors either own their buffers or borrow them zero-copy from an external
//! producer through [`ffi`]; the distinction lives in `vecta_mem::Buffer`.
//!
//! Null propagation is uniform: a comparison row with a null input yields
//! [`mask::MASK_NULL`], never false.

pub mod array;
pub mod binary;
pub mod boolean;
pub mod compare;
pub mod ffi;
pub mod hash;
pub mod mask;
pub mod morsel;
pub mod opaque;
pub mod primitive;
pub mod reduce;
pub mod take;
pub mod vector;

pub use array::ArrayVector;
pub use binary::{BinaryVector, BinaryVectorBuilder};
pub use boolean::BooleanVector;
pub use compare::{compare_rows, compare_sides, CmpOp, Side};
pub use hash::mix_hashes;
pub use mask::{Mask, MASK_FALSE, MASK_NULL, MASK_TRUE};
pub use morsel::Morsel;
pub use opaque::OpaqueVector;
pub use primitive::{PrimitiveType, PrimitiveVector};
pub use vector::Vector;
