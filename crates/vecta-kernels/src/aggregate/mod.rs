//! Aggregation kernels.
//!
//! Two shapes: set-membership aggregates go Vector -> fingerprints -> hash
//! container and never look at the physical type; summation-style
//! aggregates run the typed reductions on `Vector`. Both are fed one chunk
//! at a time through [`Accumulator`].

pub mod distinct;
pub mod group;
pub mod numeric;
mod operator;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vecta_core::caps::CpuCapabilities;
use vecta_core::scalar::Scalar;
use vecta_core::types::DataType;
use vecta_core::{Error, Result};
use vecta_vector::Vector;

pub use distinct::{count_distinct, DistinctAccumulator, FingerprintDistinct, VerifiedDistinct};
pub use group::{aggregate_groups, group_rows, AggregateSpec};
pub use operator::{DistinctCount, GroupAggregate};

/// Running state of one aggregate over a stream of chunks.
pub trait Accumulator: Send {
    fn update(&mut self, values: &Vector) -> Result<()>;

    /// Current result; `Scalar::Null` when nothing non-null was seen.
    fn finish(&self) -> Result<Scalar>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunction {
    /// Non-null rows.
    Count,
    Sum,
    Min,
    Max,
    Avg,
    /// First non-null value in arrival order.
    First,
    /// Last non-null value in arrival order.
    Last,
    CountDistinct,
}

impl AggregateFunction {
    pub fn name(self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::Avg => "avg",
            AggregateFunction::First => "first",
            AggregateFunction::Last => "last",
            AggregateFunction::CountDistinct => "count_distinct",
        }
    }

    /// Result type over an input column of type `input`.
    pub fn output_type(self, input: DataType) -> Result<DataType> {
        let miss = || Error::not_implemented(self.name(), input, "-");
        match self {
            AggregateFunction::Count | AggregateFunction::CountDistinct => Ok(DataType::Int64),
            AggregateFunction::Sum if input.is_integer() => Ok(DataType::Int64),
            AggregateFunction::Sum if input.is_float() => Ok(DataType::Float64),
            AggregateFunction::Avg if input.is_numeric() => Ok(DataType::Float64),
            AggregateFunction::Sum | AggregateFunction::Avg => Err(miss()),
            AggregateFunction::Min | AggregateFunction::Max => match input {
                DataType::Interval | DataType::Array | DataType::NonNative => Err(miss()),
                other => Ok(other),
            },
            AggregateFunction::First | AggregateFunction::Last => match input {
                DataType::NonNative => Err(miss()),
                other => Ok(other),
            },
        }
    }

    pub fn accumulator(self, caps: CpuCapabilities) -> Box<dyn Accumulator> {
        use numeric::{AvgAccumulator, CountAccumulator, ExtremeAccumulator, PositionalAccumulator, SumAccumulator};
        match self {
            AggregateFunction::Count => Box::<CountAccumulator>::default(),
            AggregateFunction::Sum => Box::<SumAccumulator>::default(),
            AggregateFunction::Min => Box::new(ExtremeAccumulator::min()),
            AggregateFunction::Max => Box::new(ExtremeAccumulator::max()),
            AggregateFunction::Avg => Box::<AvgAccumulator>::default(),
            AggregateFunction::First => Box::new(PositionalAccumulator::first()),
            AggregateFunction::Last => Box::new(PositionalAccumulator::last()),
            AggregateFunction::CountDistinct => Box::new(FingerprintDistinct::new(caps)),
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AggregateFunction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "count" => AggregateFunction::Count,
            "sum" => AggregateFunction::Sum,
            "min" => AggregateFunction::Min,
            "max" => AggregateFunction::Max,
            "avg" | "mean" => AggregateFunction::Avg,
            "first" => AggregateFunction::First,
            "last" => AggregateFunction::Last,
            "count_distinct" => AggregateFunction::CountDistinct,
            other => return Err(Error::Config(format!("unknown aggregate '{other}'"))),
        })
    }
}

/// Run `function` over `chunks` in order.
pub fn aggregate(function: AggregateFunction, chunks: &[Vector], caps: CpuCapabilities) -> Result<Scalar> {
    let mut acc = function.accumulator(caps);
    for chunk in chunks {
        acc.update(chunk)?;
    }
    acc.finish()
}
