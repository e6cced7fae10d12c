//! Logical data types understood by the kernel.
//!
//! Type codes are stable: the dispatch registry and the interchange boundary
//! both key on them.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 4] = [
        TimeUnit::Second,
        TimeUnit::Millisecond,
        TimeUnit::Microsecond,
        TimeUnit::Nanosecond,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Second => "s",
            TimeUnit::Millisecond => "ms",
            TimeUnit::Microsecond => "us",
            TimeUnit::Nanosecond => "ns",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    /// Days since the Unix epoch.
    Date32,
    Timestamp64(TimeUnit),
    /// Seconds or milliseconds since midnight.
    Time32(TimeUnit),
    /// Micro- or nanoseconds since midnight.
    Time64(TimeUnit),
    /// Month/day/nanosecond interval.
    Interval,
    Boolean,
    Utf8,
    Binary,
    /// Variable-length list over a child vector.
    Array,
    /// Passthrough tag for types the kernel does not interpret.
    NonNative,
}

impl DataType {
    /// Stable numeric code of the type family.
    pub const fn code(&self) -> u8 {
        match self {
            DataType::Int8 => 1,
            DataType::Int16 => 2,
            DataType::Int32 => 3,
            DataType::Int64 => 4,
            DataType::Float32 => 20,
            DataType::Float64 => 21,
            DataType::Date32 => 30,
            DataType::Timestamp64(_) => 40,
            DataType::Time32(_) => 41,
            DataType::Time64(_) => 42,
            DataType::Interval => 43,
            DataType::Boolean => 50,
            DataType::Utf8 => 60,
            DataType::Binary => 61,
            DataType::Array => 70,
            DataType::NonNative => 255,
        }
    }

    /// Bytes per element for fixed-width layouts. Booleans are bit-packed.
    pub const fn byte_width(&self) -> Option<usize> {
        match self {
            DataType::Int8 => Some(1),
            DataType::Int16 => Some(2),
            DataType::Int32 | DataType::Float32 | DataType::Date32 | DataType::Time32(_) => {
                Some(4)
            }
            DataType::Int64
            | DataType::Float64
            | DataType::Timestamp64(_)
            | DataType::Time64(_) => Some(8),
            DataType::Interval => Some(16),
            _ => None,
        }
    }

    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
        )
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    pub const fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub const fn is_temporal(&self) -> bool {
        matches!(
            self,
            DataType::Date32
                | DataType::Timestamp64(_)
                | DataType::Time32(_)
                | DataType::Time64(_)
                | DataType::Interval
        )
    }

    /// Every concrete type the kernel can hold natively (timestamps/times in all units).
    pub fn native_types() -> Vec<DataType> {
        let mut out = vec![
            DataType::Int8,
            DataType::Int16,
            DataType::Int32,
            DataType::Int64,
            DataType::Float32,
            DataType::Float64,
            DataType::Date32,
            DataType::Interval,
            DataType::Boolean,
            DataType::Utf8,
            DataType::Binary,
            DataType::Array,
        ];
        for unit in TimeUnit::ALL {
            out.push(DataType::Timestamp64(unit));
        }
        out.push(DataType::Time32(TimeUnit::Second));
        out.push(DataType::Time32(TimeUnit::Millisecond));
        out.push(DataType::Time64(TimeUnit::Microsecond));
        out.push(DataType::Time64(TimeUnit::Nanosecond));
        out
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int8 => write!(f, "int8"),
            DataType::Int16 => write!(f, "int16"),
            DataType::Int32 => write!(f, "int32"),
            DataType::Int64 => write!(f, "int64"),
            DataType::Float32 => write!(f, "float32"),
            DataType::Float64 => write!(f, "float64"),
            DataType::Date32 => write!(f, "date32"),
            DataType::Timestamp64(u) => write!(f, "timestamp[{}]", u.suffix()),
            DataType::Time32(u) => write!(f, "time32[{}]", u.suffix()),
            DataType::Time64(u) => write!(f, "time64[{}]", u.suffix()),
            DataType::Interval => write!(f, "interval"),
            DataType::Boolean => write!(f, "bool"),
            DataType::Utf8 => write!(f, "utf8"),
            DataType::Binary => write!(f, "binary"),
            DataType::Array => write!(f, "array"),
            DataType::NonNative => write!(f, "non_native"),
        }
    }
}

/// Numeric promotion for arithmetic and mixed comparisons.
///
/// Integers widen to the wider width. Any float operand makes the result a
/// float; Float32 only survives against Int8/Int16/Float32.
pub fn promote_numeric(left: DataType, right: DataType) -> Option<DataType> {
    use DataType::*;
    if !left.is_numeric() || !right.is_numeric() {
        return None;
    }
    let width = |t: DataType| t.byte_width().unwrap_or(8);
    let out = match (left, right) {
        (Float64, _) | (_, Float64) => Float64,
        (Float32, Float32) => Float32,
        (Float32, other) | (other, Float32) => {
            if width(other) <= 2 {
                Float32
            } else {
                Float64
            }
        }
        (l, r) => {
            if width(l) >= width(r) {
                l
            } else {
                r
            }
        }
    };
    Some(out)
}

/// Month/day/nanosecond interval, laid out as in the columnar interchange format.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IntervalMonthDayNano {
    pub months: i32,
    pub days: i32,
    pub nanos: i64,
}

impl IntervalMonthDayNano {
    pub const fn new(months: i32, days: i32, nanos: i64) -> Self {
        Self {
            months,
            days,
            nanos,
        }
    }
}
