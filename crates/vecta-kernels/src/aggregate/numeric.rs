//! Summation-style and positional accumulators.
//!
//! Per chunk these call the typed reductions on `Vector` and fold the
//! chunk result into the running value.

use std::cmp::Ordering;

use vecta_core::scalar::Scalar;
use vecta_core::{Error, Result};
use vecta_vector::Vector;

use super::Accumulator;

#[derive(Debug, Default)]
pub struct CountAccumulator {
    count: i64,
}

impl Accumulator for CountAccumulator {
    fn update(&mut self, values: &Vector) -> Result<()> {
        self.count += (values.len() - values.null_count()) as i64;
        Ok(())
    }

    fn finish(&self) -> Result<Scalar> {
        Ok(Scalar::Int64(self.count))
    }
}

#[derive(Debug, Default)]
pub struct SumAccumulator {
    total: Option<Scalar>,
}

impl Accumulator for SumAccumulator {
    fn update(&mut self, values: &Vector) -> Result<()> {
        let chunk = values.sum()?;
        self.total = match (self.total.take(), chunk) {
            (None, c) | (Some(Scalar::Null), c) => Some(c),
            (Some(t), Scalar::Null) => Some(t),
            (Some(Scalar::Int64(a)), Scalar::Int64(b)) => Some(Scalar::Int64(a.wrapping_add(b))),
            (Some(Scalar::Float64(a)), Scalar::Float64(b)) => Some(Scalar::Float64(a + b)),
            (Some(t), c) => {
                return Err(Error::Invariant(format!(
                    "sum chunks disagree on type: {t:?} and {c:?}"
                )))
            }
        };
        Ok(())
    }

    fn finish(&self) -> Result<Scalar> {
        Ok(self.total.clone().unwrap_or(Scalar::Null))
    }
}

#[derive(Debug, Default)]
pub struct AvgAccumulator {
    sum: f64,
    count: usize,
}

impl Accumulator for AvgAccumulator {
    fn update(&mut self, values: &Vector) -> Result<()> {
        let chunk = values.sum()?;
        if let Some(s) = chunk.as_f64() {
            self.sum += s;
            self.count += values.len() - values.null_count();
        }
        Ok(())
    }

    fn finish(&self) -> Result<Scalar> {
        if self.count == 0 {
            return Ok(Scalar::Null);
        }
        Ok(Scalar::Float64(self.sum / self.count as f64))
    }
}

/// Min or max across chunks.
#[derive(Debug)]
pub struct ExtremeAccumulator {
    want: Ordering,
    best: Option<Scalar>,
}

impl ExtremeAccumulator {
    pub fn min() -> Self {
        Self {
            want: Ordering::Less,
            best: None,
        }
    }

    pub fn max() -> Self {
        Self {
            want: Ordering::Greater,
            best: None,
        }
    }
}

impl Accumulator for ExtremeAccumulator {
    fn update(&mut self, values: &Vector) -> Result<()> {
        let chunk = if self.want == Ordering::Less {
            values.min()?
        } else {
            values.max()?
        };
        if chunk.is_null() {
            return Ok(());
        }
        self.best = match self.best.take() {
            Some(b) if chunk.total_cmp(&b) != self.want => Some(b),
            _ => Some(chunk),
        };
        Ok(())
    }

    fn finish(&self) -> Result<Scalar> {
        Ok(self.best.clone().unwrap_or(Scalar::Null))
    }
}

/// First or last non-null value by position.
#[derive(Debug)]
pub struct PositionalAccumulator {
    last: bool,
    value: Option<Scalar>,
}

impl PositionalAccumulator {
    pub fn first() -> Self {
        Self {
            last: false,
            value: None,
        }
    }

    pub fn last() -> Self {
        Self {
            last: true,
            value: None,
        }
    }
}

impl Accumulator for PositionalAccumulator {
    fn update(&mut self, values: &Vector) -> Result<()> {
        if !self.last && self.value.is_some() {
            return Ok(());
        }
        let found = if self.last {
            (0..values.len()).rev().find(|i| values.is_valid(*i))
        } else {
            (0..values.len()).find(|i| values.is_valid(*i))
        };
        if let Some(i) = found {
            self.value = Some(values.get_scalar(i)?);
        }
        Ok(())
    }

    fn finish(&self) -> Result<Scalar> {
        Ok(self.value.clone().unwrap_or(Scalar::Null))
    }
}
