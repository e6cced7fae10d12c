//! Hash grouping over key columns.
//!
//! Rows are bucketed by the fingerprint of their key columns; two key
//! tuples with equal fingerprints land in the same group.

use serde::{Deserialize, Serialize};
use vecta_core::caps::CpuCapabilities;
use vecta_core::scalar::Scalar;
use vecta_core::{Error, Result};
use vecta_hash::RowIndexMap;
use vecta_mem::alloc;
use vecta_vector::{Morsel, Vector};

use super::AggregateFunction;

/// One output column of a grouped aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSpec {
    pub column: String,
    pub function: AggregateFunction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl AggregateSpec {
    pub fn new(function: AggregateFunction, column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            function,
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// `alias`, or `function(column)`.
    pub fn output_name(&self) -> String {
        match &self.alias {
            Some(a) => a.clone(),
            None => format!("{}({})", self.function, self.column),
        }
    }
}

/// Row indices per group, groups in first-seen order.
pub fn group_rows(morsel: &Morsel, keys: &[&str], caps: &CpuCapabilities) -> Result<RowIndexMap> {
    let fingerprints = morsel.hash_keys(keys, caps)?;
    RowIndexMap::from_fingerprints(&fingerprints)
}

/// One output row per group: the key columns taken from each group's first
/// row, then one column per spec.
///
/// With no keys every row falls into a single group.
pub fn aggregate_groups(
    morsel: &Morsel,
    keys: &[&str],
    specs: &[AggregateSpec],
    caps: &CpuCapabilities,
) -> Result<Morsel> {
    let groups = group_rows(morsel, keys, caps)?;
    let firsts = alloc::try_collect(
        groups.values().iter().map(|rows| rows.first().copied().unwrap_or(0)),
        "group_firsts",
    )?;

    let mut columns = Vec::with_capacity(keys.len() + specs.len());
    for key in keys {
        let column = require(morsel, key)?;
        columns.push((key.to_string(), column.take(&firsts)?));
    }
    for spec in specs {
        let column = require(morsel, &spec.column)?;
        let output_type = spec.function.output_type(column.data_type())?;
        let mut results: Vec<Scalar> = alloc::try_vec_with_capacity(groups.len(), "group_results")?;
        for rows in groups.values() {
            let members = column.take(rows)?;
            let mut acc = spec.function.accumulator(*caps);
            acc.update(&members)?;
            results.push(acc.finish()?);
        }
        columns.push((spec.output_name(), Vector::from_scalars(output_type, &results)?));
    }
    Morsel::with_row_count(columns, groups.len())
}

fn require<'a>(morsel: &'a Morsel, name: &str) -> Result<&'a Vector> {
    morsel
        .column(name)
        .ok_or_else(|| Error::Contract(format!("column '{name}' not in morsel")))
}
