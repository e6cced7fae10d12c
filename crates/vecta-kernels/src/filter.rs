//! Filter operator: keep rows whose predicate is TRUE.
//!
//! False and null predicate rows are both dropped.

use vecta_core::scalar::Scalar;
use vecta_core::schema::Schema;
use vecta_core::types::DataType;
use vecta_core::{Error, Result};
use vecta_vector::{Mask, Morsel, Vector, MASK_FALSE, MASK_TRUE};

use crate::context::KernelContext;
use crate::expr::{Datum, Expr};
use crate::metrics;
use crate::plan::{Footprint, OpPlan};
use crate::registry::Registry;
use crate::traits::{single_input, single_schema, Operator};

#[derive(Debug, Clone)]
pub struct Filter {
    pub predicate: Expr,
}

impl Filter {
    pub fn new(predicate: Expr) -> Self {
        Self { predicate }
    }
}

/// Three-valued selection mask for `predicate` over `morsel`.
pub fn predicate_mask(predicate: &Expr, morsel: &Morsel, registry: &Registry) -> Result<Mask> {
    let rows = morsel.num_rows();
    match predicate.evaluate(morsel, registry)? {
        Datum::Vector(Vector::Boolean(b)) => b.to_mask(),
        Datum::Scalar(Scalar::Boolean(true)) => Mask::filled(rows, MASK_TRUE),
        Datum::Scalar(Scalar::Boolean(false)) => Mask::filled(rows, MASK_FALSE),
        Datum::Scalar(Scalar::Null) => Mask::all_null(rows),
        other => Err(Error::Contract(format!(
            "filter predicate must be boolean, got {}",
            other.data_type().map_or("null".to_string(), |t| t.to_string())
        ))),
    }
}

impl Operator for Filter {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn memory_need(&self, rows: u64, bytes: u64) -> Footprint {
        // Worst case keeps every row, plus one mask byte per row.
        Footprint {
            bytes_per_row: bytes / rows.max(1) + 1,
            overhead_bytes: 0,
        }
    }

    fn plan(&self, input_schemas: &[Schema]) -> Result<OpPlan> {
        let schema = single_schema(self.name(), input_schemas)?;
        let (dt, _) = self.predicate.output_type(schema, &Registry::shared())?;
        if let Some(t) = dt.filter(|t| *t != DataType::Boolean) {
            return Err(Error::Contract(format!(
                "filter predicate must be boolean, got {t}"
            )));
        }
        let width = schema
            .fields
            .iter()
            .map(|f| f.data_type.byte_width().unwrap_or(16) as u64)
            .sum::<u64>();
        Ok(OpPlan::new(schema.clone(), self.memory_need(1, width)))
    }

    fn eval_morsel(&self, inputs: &[Morsel], ctx: &KernelContext) -> Result<Morsel> {
        let input = single_input(self.name(), inputs)?;
        let mask = predicate_mask(&self.predicate, input, ctx.registry())?;
        let out = input.filter(&mask)?;
        metrics::record_morsel(self.name(), input.num_rows(), out.num_rows(), out.memory_size());
        ctx.charge(out, "filter")
    }
}
