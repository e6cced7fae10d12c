//! Aggregation operators.

use std::sync::{Mutex, MutexGuard};

use vecta_core::schema::{Field, Schema};
use vecta_core::types::DataType;
use vecta_core::{Error, Result};
use vecta_hash::FlatHashSet;
use vecta_vector::{Morsel, Vector};

use super::distinct::{DistinctAccumulator, FingerprintDistinct};
use super::group::{aggregate_groups, AggregateSpec};
use crate::context::KernelContext;
use crate::metrics;
use crate::plan::{Footprint, OpPlan};
use crate::traits::{single_input, single_schema, Operator};

/// Running distinct count over one column.
///
/// State persists across `eval_morsel` calls; every call returns the count
/// so far as a single-row morsel.
#[derive(Debug, Default)]
pub struct DistinctCount {
    pub column: String,
    state: Mutex<Option<FingerprintDistinct>>,
}

impl DistinctCount {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            state: Mutex::new(None),
        }
    }

    pub fn output_name(&self) -> String {
        format!("count_distinct({})", self.column)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<FingerprintDistinct>>> {
        self.state
            .lock()
            .map_err(|_| Error::Invariant("distinct count state poisoned".into()))
    }

    /// Distinct values seen so far.
    pub fn count(&self) -> Result<usize> {
        Ok(self.lock()?.as_ref().map_or(0, |acc| acc.count()))
    }

    /// Drop the running set; the next morsel starts a fresh count.
    pub fn reset(&self) -> Result<()> {
        *self.lock()? = None;
        Ok(())
    }
}

impl Operator for DistinctCount {
    fn name(&self) -> &'static str {
        "count_distinct"
    }

    fn memory_need(&self, _rows: u64, _bytes: u64) -> Footprint {
        // Two u64 slots per distinct value at worst, plus the scratch fingerprint.
        Footprint {
            bytes_per_row: 24,
            overhead_bytes: 0,
        }
    }

    fn plan(&self, input_schemas: &[Schema]) -> Result<OpPlan> {
        let input = single_schema(self.name(), input_schemas)?;
        if input.field_named(&self.column).is_none() {
            return Err(Error::Contract(format!("column '{}' not in schema", self.column)));
        }
        let schema = Schema::new(vec![Field::new(self.output_name(), DataType::Int64, false)]);
        Ok(OpPlan::new(schema, self.memory_need(0, 0)))
    }

    fn eval_morsel(&self, inputs: &[Morsel], ctx: &KernelContext) -> Result<Morsel> {
        let input = single_input(self.name(), inputs)?;
        let column = input
            .column(&self.column)
            .ok_or_else(|| Error::Contract(format!("column '{}' not in morsel", self.column)))?;

        let mut state = self.lock()?;
        if state.is_none() {
            let set = FlatHashSet::with_capacity(ctx.config().distinct_initial_capacity)?;
            *state = Some(FingerprintDistinct::with_set(set, *ctx.caps()));
        }
        let acc = state
            .as_mut()
            .ok_or_else(|| Error::Invariant("distinct count state missing".into()))?;
        acc.update(column)?;
        let count = acc.count();
        drop(state);

        let out = Morsel::try_new(vec![(self.output_name(), Vector::int64(vec![count as i64])?)])?;
        metrics::record_morsel(self.name(), input.num_rows(), out.num_rows(), out.memory_size());
        ctx.charge(out, "count_distinct")
    }
}

/// Grouped aggregation over a single morsel.
///
/// Each morsel is aggregated on its own; combining partial results across
/// morsels is left to the executor.
#[derive(Debug, Clone, Default)]
pub struct GroupAggregate {
    pub keys: Vec<String>,
    pub aggregates: Vec<AggregateSpec>,
}

impl GroupAggregate {
    pub fn new<S: Into<String>>(keys: impl IntoIterator<Item = S>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            aggregates: Vec::new(),
        }
    }

    pub fn with_aggregate(mut self, spec: AggregateSpec) -> Self {
        self.aggregates.push(spec);
        self
    }
}

impl Operator for GroupAggregate {
    fn name(&self) -> &'static str {
        "group_aggregate"
    }

    fn memory_need(&self, rows: u64, bytes: u64) -> Footprint {
        // Fingerprint and row index per row, plus one gathered copy per aggregate.
        let per_row = bytes / rows.max(1);
        Footprint {
            bytes_per_row: 12 + per_row * self.aggregates.len() as u64,
            overhead_bytes: 0,
        }
    }

    fn plan(&self, input_schemas: &[Schema]) -> Result<OpPlan> {
        let input = single_schema(self.name(), input_schemas)?;
        let lookup = |name: &str| {
            input
                .field_named(name)
                .ok_or_else(|| Error::Contract(format!("column '{name}' not in schema")))
        };
        let mut fields = Vec::with_capacity(self.keys.len() + self.aggregates.len());
        for key in &self.keys {
            fields.push(lookup(key)?.clone());
        }
        for spec in &self.aggregates {
            let dt = spec.function.output_type(lookup(&spec.column)?.data_type)?;
            fields.push(Field::new(spec.output_name(), dt, true));
        }
        Ok(OpPlan::new(Schema::new(fields), self.memory_need(1, 16)))
    }

    fn eval_morsel(&self, inputs: &[Morsel], ctx: &KernelContext) -> Result<Morsel> {
        let input = single_input(self.name(), inputs)?;
        let keys: Vec<&str> = self.keys.iter().map(String::as_str).collect();
        let out = aggregate_groups(input, &keys, &self.aggregates, ctx.caps())?;
        metrics::record_morsel(self.name(), input.num_rows(), out.num_rows(), out.memory_size());
        ctx.charge(out, "group_aggregate")
    }
}
