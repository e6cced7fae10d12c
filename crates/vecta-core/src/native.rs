//! Physical element types that back fixed-width buffers.

use std::fmt::Debug;

use crate::types::IntervalMonthDayNano;

/// A plain-old-data element stored in a fixed-width buffer.
///
/// Several logical types share one physical type (`i32` backs Int32, Date32
/// and Time32), so this trait only knows about bits, not semantics.
pub trait NativeType: Copy + Debug + Default + PartialEq + PartialOrd + Send + Sync + 'static {
    /// Whether `<`/`>` are meaningful for this type.
    const ORDERED: bool = true;

    /// Logical bit pattern fed to the fingerprint mixer.
    fn fingerprint_bits(self) -> u64;
}

macro_rules! native_int {
    ($($t:ty),*) => {$(
        impl NativeType for $t {
            #[inline]
            fn fingerprint_bits(self) -> u64 {
                // Sign-extend so equal integers fingerprint equally across widths.
                self as i64 as u64
            }
        }
    )*};
}

native_int!(i8, i16, i32, i64);

impl NativeType for u8 {
    #[inline]
    fn fingerprint_bits(self) -> u64 {
        self as u64
    }
}

impl NativeType for f32 {
    #[inline]
    fn fingerprint_bits(self) -> u64 {
        canonical_f64_bits(self as f64)
    }
}

impl NativeType for f64 {
    #[inline]
    fn fingerprint_bits(self) -> u64 {
        canonical_f64_bits(self)
    }
}

impl NativeType for IntervalMonthDayNano {
    const ORDERED: bool = false;

    #[inline]
    fn fingerprint_bits(self) -> u64 {
        let packed = ((self.months as u32 as u64) << 32) | (self.days as u32 as u64);
        crate::hash::mix_hash(packed, self.nanos as u64)
    }
}

/// -0.0 folds into 0.0 and every NaN payload folds into one NaN.
#[inline]
fn canonical_f64_bits(v: f64) -> u64 {
    if v == 0.0 {
        0
    } else if v.is_nan() {
        f64::NAN.to_bits()
    } else {
        v.to_bits()
    }
}

/// Numeric element types usable by arithmetic kernels and numeric promotion.
pub trait Numeric: NativeType {
    const IS_FLOAT: bool;

    fn to_i64(self) -> i64;
    fn to_f64(self) -> f64;
    fn from_i64(v: i64) -> Self;
    fn from_f64(v: f64) -> Self;

    fn add(self, rhs: Self) -> Self;
    fn sub(self, rhs: Self) -> Self;
    fn mul(self, rhs: Self) -> Self;
    /// `None` for integer division by zero.
    fn div(self, rhs: Self) -> Option<Self>;

    /// Convert from another numeric, assuming `Self` is the promoted type.
    #[inline]
    fn promote_from<S: Numeric>(v: S) -> Self {
        if Self::IS_FLOAT {
            Self::from_f64(v.to_f64())
        } else {
            Self::from_i64(v.to_i64())
        }
    }
}

macro_rules! numeric_int {
    ($($t:ty),*) => {$(
        impl Numeric for $t {
            const IS_FLOAT: bool = false;
            #[inline] fn to_i64(self) -> i64 { self as i64 }
            #[inline] fn to_f64(self) -> f64 { self as f64 }
            #[inline] fn from_i64(v: i64) -> Self { v as $t }
            #[inline] fn from_f64(v: f64) -> Self { v as $t }
            #[inline] fn add(self, rhs: Self) -> Self { self.wrapping_add(rhs) }
            #[inline] fn sub(self, rhs: Self) -> Self { self.wrapping_sub(rhs) }
            #[inline] fn mul(self, rhs: Self) -> Self { self.wrapping_mul(rhs) }
            #[inline]
            fn div(self, rhs: Self) -> Option<Self> {
                if rhs == 0 { None } else { Some(self.wrapping_div(rhs)) }
            }
        }
    )*};
}

numeric_int!(i8, i16, i32, i64);

macro_rules! numeric_float {
    ($($t:ty),*) => {$(
        impl Numeric for $t {
            const IS_FLOAT: bool = true;
            #[inline] fn to_i64(self) -> i64 { self as i64 }
            #[inline] fn to_f64(self) -> f64 { self as f64 }
            #[inline] fn from_i64(v: i64) -> Self { v as $t }
            #[inline] fn from_f64(v: f64) -> Self { v as $t }
            #[inline] fn add(self, rhs: Self) -> Self { self + rhs }
            #[inline] fn sub(self, rhs: Self) -> Self { self - rhs }
            #[inline] fn mul(self, rhs: Self) -> Self { self * rhs }
            #[inline] fn div(self, rhs: Self) -> Option<Self> { Some(self / rhs) }
        }
    )*};
}

numeric_float!(f32, f64);
