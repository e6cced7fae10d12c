//! vecta: a vectorized execution kernel.
//!
//! Re-exports the workspace crates under one roof for executors that do
//! not want to track them individually.
//!
//! ```
//! use vecta::prelude::*;
//!
//! let ctx = KernelContext::portable();
//! let l = Vector::int64(vec![1, 2, 3])?;
//! let r = Scalar::Int64(2);
//! let out = ctx.registry().evaluate(
//!     Op::GreaterThan,
//!     &Operand::Vector(&l),
//!     &Operand::Scalar(&r, DataType::Int64),
//! )?;
//! assert_eq!(out.len(), 3);
//! # Ok::<(), vecta::vecta_core::Error>(())
//! ```

pub use vecta_core;
pub use vecta_hash;
pub use vecta_kernels;
pub use vecta_mem;
pub use vecta_vector;

pub mod prelude {
    pub use vecta_core::prelude::*;
    pub use vecta_hash::{BloomFilter, FingerprintSet, FlatHashMap, FlatHashSet};
    pub use vecta_kernels::{
        AggregateFunction, AggregateSpec, KernelContext, Op, Operand, Operator, Registry,
    };
    pub use vecta_mem::MemoryBudgetImpl;
    pub use vecta_vector::{Mask, Morsel, Vector};
}
