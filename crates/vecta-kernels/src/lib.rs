#![forbid(unsafe_code)]
//! vecta-kernels: dispatch, typed kernels, and morsel operators.
//!
//! - Binary operations are resolved through the [`Registry`], keyed by
//!   operation, operand types and arity. A miss is `Error::NotImplemented`,
//!   which the executor answers with a cast.
//! - Operators are pure and synchronous. Every output morsel is charged to
//!   the memory budget held by the [`KernelContext`].
//! - Aggregates take either the fingerprint path (count-distinct) or the
//!   typed reduction path (sum, min, max and friends).

mod arith;
mod compare;
mod logic;

pub mod aggregate;
pub mod context;
pub mod evaluate;
pub mod expr;
pub mod filter;
pub mod metrics;
pub mod plan;
pub mod project;
pub mod registry;
pub mod traits;

pub use aggregate::{
    aggregate, aggregate_groups, count_distinct, group_rows, Accumulator, AggregateFunction,
    AggregateSpec, DistinctAccumulator, DistinctCount, FingerprintDistinct, GroupAggregate,
    VerifiedDistinct,
};
pub use context::KernelContext;
pub use evaluate::Evaluate;
pub use expr::{Datum, Expr};
pub use filter::{predicate_mask, Filter};
pub use plan::{Footprint, OpPlan};
pub use project::Project;
pub use registry::{Arity, Kernel, KernelFn, KernelKey, Op, Operand, Registry};
pub use traits::Operator;
