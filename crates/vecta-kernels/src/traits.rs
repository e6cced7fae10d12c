//! The operator interface the external executor drives.
//!
//! The executor calls `plan(...)` once to learn the output schema and the
//! footprint, then `eval_morsel(...)` for every morsel it pulls. Operators
//! never block and never schedule; fan-out across workers is the
//! executor's business.

use vecta_core::schema::Schema;
use vecta_core::Result;
use vecta_vector::Morsel;

use crate::context::KernelContext;
use crate::plan::{Footprint, OpPlan};

/// Invariants:
/// - `eval_morsel` is deterministic for the same input morsel and state.
/// - Output morsels are charged to the context's memory budget.
pub trait Operator: Send + Sync {
    /// Stable operator name.
    fn name(&self) -> &'static str;

    /// Rough memory model for a morsel of `rows` rows and `bytes` bytes.
    fn memory_need(&self, rows: u64, bytes: u64) -> Footprint;

    /// Output schema for the given input schemas.
    fn plan(&self, input_schemas: &[Schema]) -> Result<OpPlan>;

    /// Consume one morsel (two for binary operators) and produce the next.
    fn eval_morsel(&self, inputs: &[Morsel], ctx: &KernelContext) -> Result<Morsel>;
}

/// First input, or a contract error naming the operator.
pub(crate) fn single_input<'a>(name: &str, inputs: &'a [Morsel]) -> Result<&'a Morsel> {
    inputs
        .first()
        .ok_or_else(|| vecta_core::Error::Contract(format!("{name} expects one input morsel")))
}

pub(crate) fn single_schema<'a>(name: &str, schemas: &'a [Schema]) -> Result<&'a Schema> {
    schemas
        .first()
        .ok_or_else(|| vecta_core::Error::Contract(format!("{name} expects one input schema")))
}
