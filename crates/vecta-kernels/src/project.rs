//! Project operator: column selection and renaming.

use std::collections::HashMap;

use vecta_core::schema::Schema;
use vecta_core::{Error, Result};
use vecta_vector::Morsel;

use crate::context::KernelContext;
use crate::metrics;
use crate::plan::{Footprint, OpPlan};
use crate::traits::{single_input, single_schema, Operator};

#[derive(Debug, Clone, Default)]
pub struct Project {
    /// Columns to keep, in output order. Empty keeps every column.
    pub columns: Vec<String>,
    /// Column rename map: old_name -> new_name, applied after selection.
    pub renames: HashMap<String, String>,
}

impl Project {
    pub fn select<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            renames: HashMap::new(),
        }
    }

    pub fn rename(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.renames.insert(from.into(), to.into());
        self
    }

    fn output_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.renames.get(name).map_or(name, String::as_str)
    }
}

impl Operator for Project {
    fn name(&self) -> &'static str {
        "project"
    }

    fn memory_need(&self, _rows: u64, _bytes: u64) -> Footprint {
        // Columns are shared with the input, never copied.
        Footprint::default()
    }

    fn plan(&self, input_schemas: &[Schema]) -> Result<OpPlan> {
        let input = single_schema(self.name(), input_schemas)?;
        let mut fields = Vec::with_capacity(input.fields.len());
        if self.columns.is_empty() {
            fields.extend(input.fields.iter().cloned());
        } else {
            for name in &self.columns {
                let field = input
                    .field_named(name)
                    .ok_or_else(|| Error::Contract(format!("column '{name}' not in schema")))?;
                fields.push(field.clone());
            }
        }
        for field in &mut fields {
            field.name = self.output_name(&field.name).to_string();
        }
        Ok(OpPlan::new(Schema::new(fields), self.memory_need(0, 0)))
    }

    fn eval_morsel(&self, inputs: &[Morsel], ctx: &KernelContext) -> Result<Morsel> {
        let input = single_input(self.name(), inputs)?;
        let selected = if self.columns.is_empty() {
            input.detached()
        } else {
            let names: Vec<&str> = self.columns.iter().map(String::as_str).collect();
            input.select(&names)?
        };
        let out = if self.renames.is_empty() {
            selected
        } else {
            // One pass, so swapping two names works.
            let columns = selected
                .columns()
                .map(|(name, v)| (self.output_name(name).to_string(), v.clone()))
                .collect();
            Morsel::with_row_count(columns, selected.num_rows())?
        };
        metrics::record_morsel(self.name(), input.num_rows(), out.num_rows(), out.memory_size());
        ctx.charge(out, "project")
    }
}
