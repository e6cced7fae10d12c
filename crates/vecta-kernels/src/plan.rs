//! Planning surfaces: `Footprint` and `OpPlan`.
//!
//! The executor asks an operator for its plan once per query and uses the
//! footprint to size morsels against the memory cap.

use serde::{Deserialize, Serialize};
use vecta_core::schema::Schema;

/// Coarse memory model for one morsel flowing through an operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    /// Estimated output bytes per input row.
    pub bytes_per_row: u64,
    /// State held across morsels (hash sets, accumulators).
    pub overhead_bytes: u64,
}

impl Footprint {
    /// Live bytes for a morsel of `rows` at this operator.
    pub fn estimate_live(&self, rows: u64) -> u64 {
        self.overhead_bytes
            .saturating_add(self.bytes_per_row.saturating_mul(rows))
    }

    /// Largest row count whose estimate fits in `cap_bytes`.
    pub fn max_rows_within(&self, cap_bytes: u64) -> u64 {
        match cap_bytes.checked_sub(self.overhead_bytes) {
            None => 0,
            Some(_) if self.bytes_per_row == 0 => u64::MAX,
            Some(room) => room / self.bytes_per_row,
        }
    }
}

/// Output schema and cached footprint of a planned operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpPlan {
    pub output_schema: Schema,
    pub footprint: Footprint,
}

impl OpPlan {
    pub fn new(output_schema: Schema, footprint: Footprint) -> Self {
        Self {
            output_schema,
            footprint,
        }
    }
}
