//! Evaluate operator: append computed columns.
//!
//! Outputs are evaluated in order against the growing morsel, so a later
//! output may reference an earlier alias. An alias equal to an existing
//! column replaces it.

use vecta_core::schema::{Field, Schema};
use vecta_core::{Error, Result};
use vecta_vector::Morsel;

use crate::context::KernelContext;
use crate::expr::Expr;
use crate::metrics;
use crate::plan::{Footprint, OpPlan};
use crate::registry::Registry;
use crate::traits::{single_input, single_schema, Operator};

#[derive(Debug, Clone, Default)]
pub struct Evaluate {
    pub outputs: Vec<(String, Expr)>,
}

impl Evaluate {
    pub fn new(outputs: Vec<(String, Expr)>) -> Self {
        Self { outputs }
    }

    pub fn with_output(mut self, alias: impl Into<String>, expr: Expr) -> Self {
        self.outputs.push((alias.into(), expr));
        self
    }
}

impl Operator for Evaluate {
    fn name(&self) -> &'static str {
        "evaluate"
    }

    fn memory_need(&self, rows: u64, bytes: u64) -> Footprint {
        // Input columns are shared; each output adds at most a wide column.
        Footprint {
            bytes_per_row: bytes / rows.max(1) + 9 * self.outputs.len() as u64,
            overhead_bytes: 0,
        }
    }

    fn plan(&self, input_schemas: &[Schema]) -> Result<OpPlan> {
        let registry = Registry::shared();
        let mut schema = single_schema(self.name(), input_schemas)?.clone();
        for (alias, expr) in &self.outputs {
            let (dt, _) = expr.output_type(&schema, &registry)?;
            let dt = dt.ok_or_else(|| {
                Error::Contract(format!("cannot infer the type of output '{alias}'"))
            })?;
            let field = Field::new(alias.clone(), dt, true);
            match schema.index_of(alias) {
                Some(i) => schema.fields[i] = field,
                None => schema.fields.push(field),
            }
        }
        let footprint = self.memory_need(1, 0);
        Ok(OpPlan::new(schema, footprint))
    }

    fn eval_morsel(&self, inputs: &[Morsel], ctx: &KernelContext) -> Result<Morsel> {
        let input = single_input(self.name(), inputs)?;
        let mut out = input.detached();
        for (alias, expr) in &self.outputs {
            let column = expr.evaluate_vector(&out, ctx.registry())?;
            out = out.with_column(alias, column)?;
        }
        metrics::record_morsel(self.name(), input.num_rows(), out.num_rows(), out.memory_size());
        ctx.charge(out, "evaluate")
    }
}
