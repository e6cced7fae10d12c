//! Convenient re-exports for downstream crates.

pub use crate::caps::CpuCapabilities;
pub use crate::config::KernelConfig;
pub use crate::error::{Error, Result};
pub use crate::native::{NativeType, Numeric};
pub use crate::scalar::Scalar;
pub use crate::schema::{Field, Schema};
pub use crate::types::{DataType, IntervalMonthDayNano, TimeUnit};
