//! Fixed-width vectors: integers, floats, temporal types, and intervals.

use vecta_core::native::NativeType;
use vecta_core::scalar::Scalar;
use vecta_core::types::{DataType, IntervalMonthDayNano, TimeUnit};
use vecta_core::{Error, Result};
use vecta_mem::{alloc, Bitmap, Buffer, MutableBitmap};

use crate::vector::Vector;

#[derive(Debug, Clone)]
pub struct PrimitiveVector<T: NativeType> {
    data_type: DataType,
    values: Buffer<T>,
    validity: Option<Bitmap>,
}

impl<T: PrimitiveType> PrimitiveVector<T> {
    pub fn try_new(data_type: DataType, values: Buffer<T>, validity: Option<Bitmap>) -> Result<Self> {
        if !T::accepts(data_type) {
            return Err(Error::Contract(format!(
                "{data_type} cannot be stored as {}",
                std::any::type_name::<T>()
            )));
        }
        if let Some(v) = &validity {
            if v.len() != values.len() {
                return Err(Error::Contract(format!(
                    "validity has {} bits for {} values",
                    v.len(),
                    values.len()
                )));
            }
        }
        Ok(Self {
            data_type,
            values,
            validity,
        })
    }

    /// All rows valid.
    pub fn from_values(data_type: DataType, values: Vec<T>) -> Result<Self> {
        Self::try_new(data_type, Buffer::from_vec(values), None)
    }

    pub fn from_options(data_type: DataType, values: &[Option<T>]) -> Result<Self> {
        let mut data = alloc::try_vec_with_capacity(values.len(), "primitive")?;
        let mut validity = MutableBitmap::with_capacity(values.len(), "primitive_validity")?;
        for v in values {
            data.push(v.unwrap_or_default());
            validity.push(v.is_some());
        }
        Self::try_new(data_type, Buffer::from_vec(data), validity.freeze_validity())
    }
}

impl<T: NativeType> PrimitiveVector<T> {
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw values; null slots hold unspecified data.
    pub fn values(&self) -> &[T] {
        self.values.as_slice()
    }

    pub fn buffer(&self) -> &Buffer<T> {
        &self.values
    }

    pub fn validity(&self) -> Option<&Bitmap> {
        self.validity.as_ref()
    }

    #[inline]
    pub fn is_valid(&self, i: usize) -> bool {
        self.validity.as_ref().map_or(true, |v| v.get(i))
    }

    pub fn null_count(&self) -> usize {
        self.validity.as_ref().map_or(0, |v| v.count_unset())
    }

    pub fn get(&self, i: usize) -> Option<T> {
        if self.is_valid(i) {
            Some(self.values[i])
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = Option<T>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    pub fn is_borrowed(&self) -> bool {
        self.values.is_borrowed()
    }

    pub fn memory_size(&self) -> usize {
        self.values.size_bytes() + self.validity.as_ref().map_or(0, |v| v.memory_size())
    }

    /// Same logical type with new storage; used by kernels producing this type.
    pub(crate) fn with_parts(&self, values: Buffer<T>, validity: Option<Bitmap>) -> Self {
        Self {
            data_type: self.data_type,
            values,
            validity,
        }
    }
}

/// Physical types that back a `Vector` variant, and the glue between a
/// physical value and its logical scalar.
pub trait PrimitiveType: NativeType {
    /// Whether `data_type` is stored with this physical type.
    fn accepts(data_type: DataType) -> bool;

    fn downcast(vector: &Vector) -> Option<&PrimitiveVector<Self>>;

    fn wrap(vector: PrimitiveVector<Self>) -> Vector;

    /// Physical value of a scalar; the caller checks the logical type.
    fn from_scalar(scalar: &Scalar) -> Option<Self>;

    fn to_scalar(self, data_type: DataType) -> Scalar;
}

impl PrimitiveType for i8 {
    fn accepts(data_type: DataType) -> bool {
        data_type == DataType::Int8
    }
    fn downcast(vector: &Vector) -> Option<&PrimitiveVector<Self>> {
        match vector {
            Vector::Int8(p) => Some(p),
            _ => None,
        }
    }
    fn wrap(vector: PrimitiveVector<Self>) -> Vector {
        Vector::Int8(vector)
    }
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Int8(v) => Some(*v),
            _ => None,
        }
    }
    fn to_scalar(self, _: DataType) -> Scalar {
        Scalar::Int8(self)
    }
}

impl PrimitiveType for i16 {
    fn accepts(data_type: DataType) -> bool {
        data_type == DataType::Int16
    }
    fn downcast(vector: &Vector) -> Option<&PrimitiveVector<Self>> {
        match vector {
            Vector::Int16(p) => Some(p),
            _ => None,
        }
    }
    fn wrap(vector: PrimitiveVector<Self>) -> Vector {
        Vector::Int16(vector)
    }
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Int16(v) => Some(*v),
            _ => None,
        }
    }
    fn to_scalar(self, _: DataType) -> Scalar {
        Scalar::Int16(self)
    }
}

impl PrimitiveType for i32 {
    fn accepts(data_type: DataType) -> bool {
        matches!(
            data_type,
            DataType::Int32 | DataType::Date32 | DataType::Time32(_)
        )
    }
    fn downcast(vector: &Vector) -> Option<&PrimitiveVector<Self>> {
        match vector {
            Vector::Int32(p) | Vector::Date32(p) | Vector::Time32(p) => Some(p),
            _ => None,
        }
    }
    fn wrap(vector: PrimitiveVector<Self>) -> Vector {
        match vector.data_type {
            DataType::Date32 => Vector::Date32(vector),
            DataType::Time32(_) => Vector::Time32(vector),
            _ => Vector::Int32(vector),
        }
    }
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Int32(v) | Scalar::Date32(v) | Scalar::Time32(v, _) => Some(*v),
            _ => None,
        }
    }
    fn to_scalar(self, data_type: DataType) -> Scalar {
        match data_type {
            DataType::Date32 => Scalar::Date32(self),
            DataType::Time32(unit) => Scalar::Time32(self, unit),
            _ => Scalar::Int32(self),
        }
    }
}

impl PrimitiveType for i64 {
    fn accepts(data_type: DataType) -> bool {
        matches!(
            data_type,
            DataType::Int64 | DataType::Timestamp64(_) | DataType::Time64(_)
        )
    }
    fn downcast(vector: &Vector) -> Option<&PrimitiveVector<Self>> {
        match vector {
            Vector::Int64(p) | Vector::Timestamp64(p) | Vector::Time64(p) => Some(p),
            _ => None,
        }
    }
    fn wrap(vector: PrimitiveVector<Self>) -> Vector {
        match vector.data_type {
            DataType::Timestamp64(_) => Vector::Timestamp64(vector),
            DataType::Time64(_) => Vector::Time64(vector),
            _ => Vector::Int64(vector),
        }
    }
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Int64(v) | Scalar::Timestamp64(v, _) | Scalar::Time64(v, _) => Some(*v),
            _ => None,
        }
    }
    fn to_scalar(self, data_type: DataType) -> Scalar {
        match data_type {
            DataType::Timestamp64(unit) => Scalar::Timestamp64(self, unit),
            DataType::Time64(unit) => Scalar::Time64(self, unit),
            _ => Scalar::Int64(self),
        }
    }
}

impl PrimitiveType for f32 {
    fn accepts(data_type: DataType) -> bool {
        data_type == DataType::Float32
    }
    fn downcast(vector: &Vector) -> Option<&PrimitiveVector<Self>> {
        match vector {
            Vector::Float32(p) => Some(p),
            _ => None,
        }
    }
    fn wrap(vector: PrimitiveVector<Self>) -> Vector {
        Vector::Float32(vector)
    }
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Float32(v) => Some(*v),
            _ => None,
        }
    }
    fn to_scalar(self, _: DataType) -> Scalar {
        Scalar::Float32(self)
    }
}

impl PrimitiveType for f64 {
    fn accepts(data_type: DataType) -> bool {
        data_type == DataType::Float64
    }
    fn downcast(vector: &Vector) -> Option<&PrimitiveVector<Self>> {
        match vector {
            Vector::Float64(p) => Some(p),
            _ => None,
        }
    }
    fn wrap(vector: PrimitiveVector<Self>) -> Vector {
        Vector::Float64(vector)
    }
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Float64(v) => Some(*v),
            _ => None,
        }
    }
    fn to_scalar(self, _: DataType) -> Scalar {
        Scalar::Float64(self)
    }
}

impl PrimitiveType for IntervalMonthDayNano {
    fn accepts(data_type: DataType) -> bool {
        data_type == DataType::Interval
    }
    fn downcast(vector: &Vector) -> Option<&PrimitiveVector<Self>> {
        match vector {
            Vector::Interval(p) => Some(p),
            _ => None,
        }
    }
    fn wrap(vector: PrimitiveVector<Self>) -> Vector {
        Vector::Interval(vector)
    }
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Interval(v) => Some(*v),
            _ => None,
        }
    }
    fn to_scalar(self, _: DataType) -> Scalar {
        Scalar::Interval(self)
    }
}

/// Convenience constructor for timestamp columns.
pub fn timestamps(unit: TimeUnit, values: &[Option<i64>]) -> Result<Vector> {
    Ok(Vector::Timestamp64(PrimitiveVector::from_options(
        DataType::Timestamp64(unit),
        values,
    )?))
}
