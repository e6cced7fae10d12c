//! Zero-copy columnar interchange using the Arrow C Data Interface layout.
//!
//! Import wraps an external array as borrowing vectors: payload bytes are
//! never copied, and the producer's release callback runs when the last
//! vector borrowing from the array is dropped. Export moves an owned vector
//! into the private data of a fresh `ArrowArray`; the receiver becomes
//! responsible for calling `release`.
//!
//! Supported formats: `c s i l f g b u z tdD tts ttm ttu ttn tss: tsm: tsu:
//! tsn: tin +l`, plus `+s` at the morsel level. Timestamp time zones are
//! accepted and dropped. Anything else, dictionary-encoded columns included,
//! imports as a passthrough column that remembers its source array and
//! exports again by sharing that array's buffers. Schema metadata of a
//! passthrough column is not carried over.

use std::ffi::{c_char, c_void, CStr, CString};
use std::ptr::{self, NonNull};
use std::sync::Arc;

use vecta_core::native::NativeType;
use vecta_core::types::{DataType, IntervalMonthDayNano, TimeUnit};
use vecta_core::{Error, Result};
use vecta_mem::bitmap::bytes_for;
use vecta_mem::{alloc, Bitmap, Buffer, ForeignOwner};

use crate::array::ArrayVector;
use crate::binary::BinaryVector;
use crate::boolean::BooleanVector;
use crate::morsel::Morsel;
use crate::opaque::OpaqueVector;
use crate::primitive::{PrimitiveType, PrimitiveVector};
use crate::vector::{dispatch_primitive, Vector};

pub const ARROW_FLAG_DICTIONARY_ORDERED: i64 = 1;
pub const ARROW_FLAG_NULLABLE: i64 = 2;
pub const ARROW_FLAG_MAP_KEYS_SORTED: i64 = 4;

/// Type descriptor, bit-exact with `struct ArrowSchema`.
#[repr(C)]
#[derive(Debug)]
pub struct ArrowSchema {
    pub format: *const c_char,
    pub name: *const c_char,
    pub metadata: *const c_char,
    pub flags: i64,
    pub n_children: i64,
    pub children: *mut *mut ArrowSchema,
    pub dictionary: *mut ArrowSchema,
    pub release: Option<unsafe extern "C" fn(*mut ArrowSchema)>,
    pub private_data: *mut c_void,
}

/// Data descriptor, bit-exact with `struct ArrowArray`.
#[repr(C)]
#[derive(Debug)]
pub struct ArrowArray {
    pub length: i64,
    pub null_count: i64,
    pub offset: i64,
    pub n_buffers: i64,
    pub n_children: i64,
    pub buffers: *mut *const c_void,
    pub children: *mut *mut ArrowArray,
    pub dictionary: *mut ArrowArray,
    pub release: Option<unsafe extern "C" fn(*mut ArrowArray)>,
    pub private_data: *mut c_void,
}

impl ArrowSchema {
    /// A released (inert) schema, for use as an out-parameter.
    pub fn empty() -> Self {
        Self {
            format: ptr::null(),
            name: ptr::null(),
            metadata: ptr::null(),
            flags: 0,
            n_children: 0,
            children: ptr::null_mut(),
            dictionary: ptr::null_mut(),
            release: None,
            private_data: ptr::null_mut(),
        }
    }

    pub fn is_released(&self) -> bool {
        self.release.is_none()
    }
}

impl ArrowArray {
    /// A released (inert) array, for use as an out-parameter.
    pub fn empty() -> Self {
        Self {
            length: 0,
            null_count: 0,
            offset: 0,
            n_buffers: 0,
            n_children: 0,
            buffers: ptr::null_mut(),
            children: ptr::null_mut(),
            dictionary: ptr::null_mut(),
            release: None,
            private_data: ptr::null_mut(),
        }
    }

    pub fn is_released(&self) -> bool {
        self.release.is_none()
    }
}

impl Drop for ArrowSchema {
    fn drop(&mut self) {
        if let Some(release) = self.release {
            // SAFETY: a live struct's release callback may be called exactly once.
            unsafe { release(self) };
        }
    }
}

impl Drop for ArrowArray {
    fn drop(&mut self) {
        if let Some(release) = self.release {
            // SAFETY: a live struct's release callback may be called exactly once.
            unsafe { release(self) };
        }
    }
}

// ----- import -----

/// Keeps an imported array alive; dropping it runs the producer's release.
struct ImportedArray {
    array: ArrowArray,
}

// SAFETY: the interchange contract lets release run on any thread, and the
// buffers are never written through while imported.
unsafe impl Send for ImportedArray {}
unsafe impl Sync for ImportedArray {}

impl ForeignOwner for ImportedArray {}

/// Owned copy of a passthrough column's type description.
#[derive(Debug)]
pub(crate) struct ForeignSchema {
    format: String,
    name: Option<String>,
    flags: i64,
    children: Vec<ForeignSchema>,
    dictionary: Option<Box<ForeignSchema>>,
}

impl ForeignSchema {
    unsafe fn capture(schema: &ArrowSchema) -> Result<Self> {
        let format = read_cstr(schema.format, "format")?.ok_or_else(|| malformed("format is null"))?;
        let n = non_negative(schema.n_children, "n_children")?;
        if n > 0 && schema.children.is_null() {
            return Err(malformed("children pointer is null"));
        }
        let mut children = Vec::with_capacity(n);
        for i in 0..n {
            let child = (*schema.children.add(i))
                .as_ref()
                .ok_or_else(|| malformed(format!("child schema {i} is null")))?;
            children.push(Self::capture(child)?);
        }
        let dictionary = match schema.dictionary.as_ref() {
            Some(d) => Some(Box::new(Self::capture(d)?)),
            None => None,
        };
        Ok(Self {
            format,
            name: read_cstr(schema.name, "name")?,
            flags: schema.flags,
            children,
            dictionary,
        })
    }
}

/// Bytes per value of the fixed-width formats the kernel does not interpret.
fn passthrough_width(format: &str) -> Option<usize> {
    let width = match format {
        "C" => 1,
        "S" | "e" => 2,
        "I" | "tiM" => 4,
        "L" | "tdm" | "tDs" | "tDm" | "tDu" | "tDn" | "tiD" => 8,
        f => {
            if let Some(n) = f.strip_prefix("w:") {
                n.parse().ok()?
            } else if let Some(spec) = f.strip_prefix("d:") {
                match spec.split(',').nth(2) {
                    None | Some("128") => 16,
                    Some("32") => 4,
                    Some("64") => 8,
                    Some("256") => 32,
                    Some(_) => return None,
                }
            } else {
                return None;
            }
        }
    };
    (width > 0).then_some(width)
}

/// Where a passthrough column's rows live: an array inside an import that
/// is kept alive by `_owner`.
pub(crate) struct ForeignColumn {
    array: NonNull<ArrowArray>,
    schema: ForeignSchema,
    offset: usize,
    len: usize,
    /// Value width and buffer 1, for fixed-width formats only.
    fixed: Option<(usize, NonNull<u8>)>,
    _owner: Arc<dyn ForeignOwner>,
}

// SAFETY: the array and its buffers are immutable while imported and the
// owner that releases them is `Send + Sync`.
unsafe impl Send for ForeignColumn {}
unsafe impl Sync for ForeignColumn {}

impl ForeignColumn {
    unsafe fn capture(
        array: &ArrowArray,
        schema: &ArrowSchema,
        offset: usize,
        len: usize,
        owner: &Arc<dyn ForeignOwner>,
    ) -> Result<Self> {
        let schema = ForeignSchema::capture(schema)?;
        let fixed = match passthrough_width(&schema.format) {
            Some(width)
                if schema.dictionary.is_none() && array.n_children == 0 && array.n_buffers == 2 =>
            {
                NonNull::new(buffer_ptr(array, 1)? as *mut u8).map(|values| (width, values))
            }
            _ => None,
        };
        Ok(Self {
            array: NonNull::from(array),
            schema,
            offset,
            len,
            fixed,
            _owner: Arc::clone(owner),
        })
    }

    fn source(&self) -> &ArrowArray {
        // SAFETY: `_owner` keeps the imported array, and every struct nested
        // in it, alive for as long as this column exists.
        unsafe { self.array.as_ref() }
    }

    pub(crate) fn byte_width(&self) -> Option<usize> {
        self.fixed.map(|(width, _)| width)
    }

    /// Raw bytes of logical row `row` of the source, if fixed-width.
    pub(crate) fn row_bytes(&self, row: usize) -> Option<&[u8]> {
        let (width, values) = self.fixed?;
        if row >= self.len {
            return None;
        }
        // SAFETY: the producer guarantees buffer 1 holds `offset + len`
        // values of `width` bytes, alive while `_owner` is.
        Some(unsafe {
            std::slice::from_raw_parts(values.as_ptr().add((self.offset + row) * width), width)
        })
    }
}

impl std::fmt::Debug for ForeignColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForeignColumn")
            .field("format", &self.schema.format)
            .field("offset", &self.offset)
            .field("len", &self.len)
            .finish()
    }
}

fn malformed(msg: impl Into<String>) -> Error {
    Error::Interchange(msg.into())
}

/// Structural failures of imported data are interchange errors, not contract ones.
fn as_interchange(e: Error) -> Error {
    match e {
        Error::Contract(m) => Error::Interchange(m),
        other => other,
    }
}

enum Layout {
    Fixed(DataType),
    Boolean,
    Variable(DataType),
    List,
    Struct,
    Opaque,
}

fn layout_of(format: &str) -> Layout {
    let fixed = Layout::Fixed;
    match format {
        "c" => fixed(DataType::Int8),
        "s" => fixed(DataType::Int16),
        "i" => fixed(DataType::Int32),
        "l" => fixed(DataType::Int64),
        "f" => fixed(DataType::Float32),
        "g" => fixed(DataType::Float64),
        "tdD" => fixed(DataType::Date32),
        "tts" => fixed(DataType::Time32(TimeUnit::Second)),
        "ttm" => fixed(DataType::Time32(TimeUnit::Millisecond)),
        "ttu" => fixed(DataType::Time64(TimeUnit::Microsecond)),
        "ttn" => fixed(DataType::Time64(TimeUnit::Nanosecond)),
        "tin" => fixed(DataType::Interval),
        "b" => Layout::Boolean,
        "u" => Layout::Variable(DataType::Utf8),
        "z" => Layout::Variable(DataType::Binary),
        "+l" => Layout::List,
        "+s" => Layout::Struct,
        f => match f.strip_prefix("ts").and_then(|rest| rest.split_once(':')) {
            Some(("s", _)) => fixed(DataType::Timestamp64(TimeUnit::Second)),
            Some(("m", _)) => fixed(DataType::Timestamp64(TimeUnit::Millisecond)),
            Some(("u", _)) => fixed(DataType::Timestamp64(TimeUnit::Microsecond)),
            Some(("n", _)) => fixed(DataType::Timestamp64(TimeUnit::Nanosecond)),
            _ => Layout::Opaque,
        },
    }
}

fn check_live(array: &ArrowArray, schema: &ArrowSchema) -> Result<()> {
    if array.is_released() {
        return Err(malformed("array has already been released"));
    }
    if schema.is_released() {
        return Err(malformed("schema has already been released"));
    }
    Ok(())
}

fn non_negative(v: i64, what: &str) -> Result<usize> {
    usize::try_from(v).map_err(|_| malformed(format!("negative {what}: {v}")))
}

unsafe fn read_cstr(p: *const c_char, what: &str) -> Result<Option<String>> {
    if p.is_null() {
        return Ok(None);
    }
    CStr::from_ptr(p)
        .to_str()
        .map(|s| Some(s.to_string()))
        .map_err(|_| malformed(format!("{what} is not valid UTF-8")))
}

unsafe fn buffer_ptr(array: &ArrowArray, index: usize) -> Result<*const c_void> {
    if index as i64 >= array.n_buffers || array.buffers.is_null() {
        return Err(malformed(format!(
            "buffer {index} missing (array has {})",
            array.n_buffers
        )));
    }
    Ok(*array.buffers.add(index))
}

fn expect_buffers(array: &ArrowArray, n: i64, format: &str) -> Result<()> {
    if array.n_buffers != n {
        return Err(malformed(format!(
            "format '{format}' needs {n} buffers, got {}",
            array.n_buffers
        )));
    }
    Ok(())
}

/// Borrow `count` elements starting `start` elements into buffer `index`.
unsafe fn foreign_buffer<T: NativeType>(
    array: &ArrowArray,
    index: usize,
    start: usize,
    count: usize,
    owner: &Arc<dyn ForeignOwner>,
) -> Result<Buffer<T>> {
    let raw = buffer_ptr(array, index)? as *mut T;
    if count == 0 {
        return Ok(Buffer::empty());
    }
    let base = NonNull::new(raw).ok_or_else(|| malformed(format!("buffer {index} is null")))?;
    if base.as_ptr() as usize % std::mem::align_of::<T>() != 0 {
        return Err(malformed(format!(
            "buffer {index} is not aligned to {} bytes",
            std::mem::align_of::<T>()
        )));
    }
    let data = NonNull::new_unchecked(base.as_ptr().add(start));
    Ok(Buffer::from_foreign(data, count, Arc::clone(owner)))
}

unsafe fn import_bitmap(
    array: &ArrowArray,
    index: usize,
    offset: usize,
    len: usize,
    owner: &Arc<dyn ForeignOwner>,
) -> Result<Bitmap> {
    let bytes = foreign_buffer::<u8>(array, index, 0, bytes_for(offset + len), owner)?;
    Bitmap::try_new(bytes, offset, len).ok_or_else(|| malformed("bitmap buffer too short"))
}

unsafe fn import_validity(
    array: &ArrowArray,
    offset: usize,
    len: usize,
    owner: &Arc<dyn ForeignOwner>,
) -> Result<Option<Bitmap>> {
    if array.null_count == 0 || array.n_buffers == 0 {
        return Ok(None);
    }
    if buffer_ptr(array, 0)?.is_null() {
        if array.null_count > 0 {
            return Err(malformed(format!(
                "null_count is {} but the validity buffer is null",
                array.null_count
            )));
        }
        return Ok(None);
    }
    import_bitmap(array, 0, offset, len, owner).map(Some)
}

/// `len + 1` offsets starting at row `offset`; an empty array may omit the buffer.
unsafe fn import_offsets(
    array: &ArrowArray,
    offset: usize,
    len: usize,
    owner: &Arc<dyn ForeignOwner>,
) -> Result<Buffer<i32>> {
    if len == 0 && buffer_ptr(array, 1)?.is_null() {
        return Ok(Buffer::from_vec(vec![0]));
    }
    foreign_buffer::<i32>(array, 1, offset, len + 1, owner)
}

unsafe fn import_primitive<T: PrimitiveType>(
    data_type: DataType,
    array: &ArrowArray,
    offset: usize,
    len: usize,
    owner: &Arc<dyn ForeignOwner>,
) -> Result<Vector> {
    let values = foreign_buffer::<T>(array, 1, offset, len, owner)?;
    let validity = import_validity(array, offset, len, owner)?;
    let p = PrimitiveVector::try_new(data_type, values, validity).map_err(as_interchange)?;
    Ok(T::wrap(p))
}

unsafe fn child_at<'a>(
    array: &'a ArrowArray,
    schema: &'a ArrowSchema,
    i: usize,
) -> Result<(&'a ArrowArray, &'a ArrowSchema)> {
    if array.children.is_null() || schema.children.is_null() {
        return Err(malformed("children pointer is null"));
    }
    let a = *array.children.add(i);
    let s = *schema.children.add(i);
    match (a.as_ref(), s.as_ref()) {
        (Some(a), Some(s)) => Ok((a, s)),
        _ => Err(malformed(format!("child {i} is null"))),
    }
}

unsafe fn import_array(
    array: &ArrowArray,
    schema: &ArrowSchema,
    owner: &Arc<dyn ForeignOwner>,
) -> Result<Vector> {
    let format = read_cstr(schema.format, "format")?.ok_or_else(|| malformed("format is null"))?;
    let len = non_negative(array.length, "length")?;
    let offset = non_negative(array.offset, "offset")?;
    if array.null_count < -1 {
        return Err(malformed(format!("invalid null_count {}", array.null_count)));
    }
    if !schema.dictionary.is_null() {
        // Dictionary-encoded columns are passed through untouched.
        let validity = import_validity(array, offset, len, owner)?;
        return import_passthrough(array, schema, format, offset, len, validity, owner);
    }

    match layout_of(&format) {
        Layout::Fixed(dt) => {
            expect_buffers(array, 2, &format)?;
            match dt {
                DataType::Int8 => import_primitive::<i8>(dt, array, offset, len, owner),
                DataType::Int16 => import_primitive::<i16>(dt, array, offset, len, owner),
                DataType::Int32 | DataType::Date32 | DataType::Time32(_) => {
                    import_primitive::<i32>(dt, array, offset, len, owner)
                }
                DataType::Int64 | DataType::Timestamp64(_) | DataType::Time64(_) => {
                    import_primitive::<i64>(dt, array, offset, len, owner)
                }
                DataType::Float32 => import_primitive::<f32>(dt, array, offset, len, owner),
                DataType::Float64 => import_primitive::<f64>(dt, array, offset, len, owner),
                DataType::Interval => {
                    import_primitive::<IntervalMonthDayNano>(dt, array, offset, len, owner)
                }
                other => Err(Error::Invariant(format!("{other} is not fixed-width"))),
            }
        }
        Layout::Boolean => {
            expect_buffers(array, 2, &format)?;
            let values = import_bitmap(array, 1, offset, len, owner)?;
            let validity = import_validity(array, offset, len, owner)?;
            Ok(Vector::Boolean(
                BooleanVector::try_new(values, validity).map_err(as_interchange)?,
            ))
        }
        Layout::Variable(dt) => {
            expect_buffers(array, 3, &format)?;
            let offsets = import_offsets(array, offset, len, owner)?;
            let end = offsets.last().copied().unwrap_or(0);
            let end = non_negative(end as i64, "value offset")?;
            let values = foreign_buffer::<u8>(array, 2, 0, end, owner)?;
            let validity = import_validity(array, offset, len, owner)?;
            let b = BinaryVector::try_new(dt, offsets, values, validity).map_err(as_interchange)?;
            b.validate_utf8().map_err(as_interchange)?;
            Ok(match dt {
                DataType::Utf8 => Vector::Utf8(b),
                _ => Vector::Binary(b),
            })
        }
        Layout::List => {
            expect_buffers(array, 2, &format)?;
            if array.n_children != 1 || schema.n_children != 1 {
                return Err(malformed(format!(
                    "list needs exactly one child, got {}",
                    array.n_children
                )));
            }
            let (child_array, child_schema) = child_at(array, schema, 0)?;
            let child = import_array(child_array, child_schema, owner)?;
            let offsets = import_offsets(array, offset, len, owner)?;
            let validity = import_validity(array, offset, len, owner)?;
            Ok(Vector::Array(
                ArrayVector::try_new(offsets, child, validity).map_err(as_interchange)?,
            ))
        }
        Layout::Struct | Layout::Opaque => {
            let validity = if format == "n" {
                Some(Bitmap::filled(len, false)?)
            } else if format.starts_with("+u") {
                None
            } else {
                import_validity(array, offset, len, owner)?
            };
            import_passthrough(array, schema, format, offset, len, validity, owner)
        }
    }
}

unsafe fn import_passthrough(
    array: &ArrowArray,
    schema: &ArrowSchema,
    format: String,
    offset: usize,
    len: usize,
    validity: Option<Bitmap>,
    owner: &Arc<dyn ForeignOwner>,
) -> Result<Vector> {
    let source = ForeignColumn::capture(array, schema, offset, len, owner)?;
    #[cfg(feature = "tracing")]
    tracing::debug!(format = %format, len, fixed = ?source.byte_width(), "passthrough column imported");
    Ok(Vector::NonNative(
        OpaqueVector::try_new(format, len, validity)
            .map_err(as_interchange)?
            .with_source(Arc::new(source)),
    ))
}

/// Wrap an external array as a borrowing vector without copying payload.
///
/// Ownership of both structs moves into this call. The schema is released
/// before returning; the array is released when the last vector (or child
/// buffer) borrowing from it is dropped, including on error.
///
/// # Safety
/// `array` and `schema` must come from a producer that follows the C data
/// interface: every non-null pointer must be valid for the lengths the
/// structs describe and remain so until `array.release` is called.
pub unsafe fn import_vector(array: ArrowArray, schema: ArrowSchema) -> Result<Vector> {
    check_live(&array, &schema)?;
    let imported = Arc::new(ImportedArray { array });
    let owner: Arc<dyn ForeignOwner> = imported.clone();
    let result = import_array(&imported.array, &schema, &owner);
    drop(schema);
    #[cfg(feature = "tracing")]
    {
        if let Ok(v) = &result {
            tracing::trace!(rows = v.len(), data_type = %v.data_type(), "vector imported");
        }
    }
    result
}

/// Import a `+s` struct array as a morsel; child names become column names.
///
/// # Safety
/// Same contract as [`import_vector`].
pub unsafe fn import_morsel(array: ArrowArray, schema: ArrowSchema) -> Result<Morsel> {
    check_live(&array, &schema)?;
    let imported = Arc::new(ImportedArray { array });
    let owner: Arc<dyn ForeignOwner> = imported.clone();
    let array = &imported.array;

    let format = read_cstr(schema.format, "format")?.unwrap_or_default();
    if format != "+s" {
        return Err(malformed(format!("morsel import needs '+s', got '{format}'")));
    }
    let len = non_negative(array.length, "length")?;
    let offset = non_negative(array.offset, "offset")?;
    if array.null_count > 0 {
        return Err(malformed("struct-level nulls cannot be represented in a morsel"));
    }
    if array.n_children != schema.n_children {
        return Err(malformed(format!(
            "array has {} children, schema has {}",
            array.n_children, schema.n_children
        )));
    }

    let n = non_negative(array.n_children, "n_children")?;
    let mut columns = Vec::with_capacity(n);
    for i in 0..n {
        let (child_array, child_schema) = child_at(array, &schema, i)?;
        let name = read_cstr(child_schema.name, "name")?.unwrap_or_else(|| format!("column_{i}"));
        let mut column = import_array(child_array, child_schema, &owner)?;
        if offset > 0 || column.len() != len {
            column = column.slice_owned(offset, len).map_err(as_interchange)?;
        }
        columns.push((name, column));
    }
    #[cfg(feature = "tracing")]
    tracing::debug!(rows = len, columns = n, offset, "morsel imported");
    Morsel::with_row_count(columns, len).map_err(as_interchange)
}

// ----- export -----

struct SchemaPrivate {
    format: CString,
    name: CString,
    children: Box<[*mut ArrowSchema]>,
    dictionary: *mut ArrowSchema,
}

/// Everything an exported array must keep alive besides its own structs.
#[derive(Default)]
struct Retained {
    vector: Option<Vector>,
    repacked: Vec<Buffer<u8>>,
    gathered: Vec<u64>,
}

struct ArrayPrivate {
    _retained: Retained,
    buffers: Box<[*const c_void]>,
    children: Box<[*mut ArrowArray]>,
    dictionary: *mut ArrowArray,
}

unsafe extern "C" fn release_schema(schema: *mut ArrowSchema) {
    let Some(schema) = schema.as_mut() else {
        return;
    };
    if !schema.private_data.is_null() {
        let private = Box::from_raw(schema.private_data as *mut SchemaPrivate);
        for &child in private.children.iter() {
            // Dropping the box releases the child unless the consumer moved it out.
            drop(Box::from_raw(child));
        }
        if !private.dictionary.is_null() {
            drop(Box::from_raw(private.dictionary));
        }
    }
    schema.private_data = ptr::null_mut();
    schema.release = None;
}

unsafe extern "C" fn release_array(array: *mut ArrowArray) {
    let Some(array) = array.as_mut() else {
        return;
    };
    if !array.private_data.is_null() {
        let private = Box::from_raw(array.private_data as *mut ArrayPrivate);
        for &child in private.children.iter() {
            drop(Box::from_raw(child));
        }
        if !private.dictionary.is_null() {
            drop(Box::from_raw(private.dictionary));
        }
    }
    array.private_data = ptr::null_mut();
    array.release = None;
}

fn build_schema(
    format: &str,
    name: &str,
    flags: i64,
    children: Vec<ArrowSchema>,
    dictionary: Option<ArrowSchema>,
) -> Result<ArrowSchema> {
    let format = CString::new(format).map_err(|e| Error::Invariant(e.to_string()))?;
    let name = CString::new(name)
        .map_err(|_| Error::Contract(format!("column name {name:?} contains a NUL byte")))?;
    let children: Box<[*mut ArrowSchema]> = children
        .into_iter()
        .map(|c| Box::into_raw(Box::new(c)))
        .collect();
    let mut private = Box::new(SchemaPrivate {
        format,
        name,
        children,
        dictionary: dictionary.map_or(ptr::null_mut(), |d| Box::into_raw(Box::new(d))),
    });
    Ok(ArrowSchema {
        format: private.format.as_ptr(),
        name: private.name.as_ptr(),
        metadata: ptr::null(),
        flags,
        n_children: private.children.len() as i64,
        children: private.children.as_mut_ptr(),
        dictionary: private.dictionary,
        release: Some(release_schema),
        private_data: Box::into_raw(private) as *mut c_void,
    })
}

fn build_array(
    len: usize,
    null_count: usize,
    buffers: Vec<*const c_void>,
    children: Vec<ArrowArray>,
    dictionary: Option<ArrowArray>,
    retained: Retained,
) -> ArrowArray {
    let children: Box<[*mut ArrowArray]> = children
        .into_iter()
        .map(|c| Box::into_raw(Box::new(c)))
        .collect();
    let mut private = Box::new(ArrayPrivate {
        _retained: retained,
        buffers: buffers.into_boxed_slice(),
        children,
        dictionary: dictionary.map_or(ptr::null_mut(), |d| Box::into_raw(Box::new(d))),
    });
    ArrowArray {
        length: len as i64,
        null_count: null_count as i64,
        offset: 0,
        n_buffers: private.buffers.len() as i64,
        n_children: private.children.len() as i64,
        buffers: private.buffers.as_mut_ptr(),
        children: private.children.as_mut_ptr(),
        dictionary: private.dictionary,
        release: Some(release_array),
        private_data: Box::into_raw(private) as *mut c_void,
    }
}

fn format_of(vector: &Vector) -> Result<String> {
    let dt = vector.data_type();
    let unsupported = || Error::not_implemented("export", dt, "-");
    Ok(match dt {
        DataType::Int8 => "c".into(),
        DataType::Int16 => "s".into(),
        DataType::Int32 => "i".into(),
        DataType::Int64 => "l".into(),
        DataType::Float32 => "f".into(),
        DataType::Float64 => "g".into(),
        DataType::Date32 => "tdD".into(),
        DataType::Timestamp64(unit) => format!("ts{}:", unit_char(unit)),
        DataType::Time32(TimeUnit::Second) => "tts".into(),
        DataType::Time32(TimeUnit::Millisecond) => "ttm".into(),
        DataType::Time64(TimeUnit::Microsecond) => "ttu".into(),
        DataType::Time64(TimeUnit::Nanosecond) => "ttn".into(),
        DataType::Interval => "tin".into(),
        DataType::Boolean => "b".into(),
        DataType::Utf8 => "u".into(),
        DataType::Binary => "z".into(),
        DataType::Array => "+l".into(),
        DataType::Time32(_) | DataType::Time64(_) | DataType::NonNative => return Err(unsupported()),
    })
}

fn unit_char(unit: TimeUnit) -> char {
    match unit {
        TimeUnit::Second => 's',
        TimeUnit::Millisecond => 'm',
        TimeUnit::Microsecond => 'u',
        TimeUnit::Nanosecond => 'n',
    }
}

fn passthrough_unsupported() -> Error {
    Error::not_implemented("export", DataType::NonNative, "-")
}

fn mirror_schema(schema: &ForeignSchema, name: &str) -> Result<ArrowSchema> {
    let children = schema
        .children
        .iter()
        .map(|c| mirror_schema(c, c.name.as_deref().unwrap_or("")))
        .collect::<Result<Vec<_>>>()?;
    let dictionary = match &schema.dictionary {
        Some(d) => Some(mirror_schema(d, d.name.as_deref().unwrap_or(""))?),
        None => None,
    };
    build_schema(&schema.format, name, schema.flags, children, dictionary)
}

fn export_schema(vector: &Vector, name: &str) -> Result<ArrowSchema> {
    if let Vector::NonNative(o) = vector {
        let source = o.source().ok_or_else(passthrough_unsupported)?;
        return mirror_schema(&source.schema, name);
    }
    let format = format_of(vector)?;
    let children = match vector {
        Vector::Array(a) => vec![export_schema(a.child(), "item")?],
        _ => Vec::new(),
    };
    build_schema(&format, name, ARROW_FLAG_NULLABLE, children, None)
}

/// Pointer to the first logical bit; unaligned bitmaps are re-packed first.
fn bitmap_ptr(bitmap: &Bitmap, repacked: &mut Vec<Buffer<u8>>) -> Result<*const c_void> {
    if bitmap.offset() % 8 == 0 {
        let bytes = bitmap.bytes();
        return Ok(bytes.as_ptr().wrapping_add(bitmap.offset() / 8) as *const c_void);
    }
    let packed = bitmap.to_packed()?;
    let bytes = packed.bytes().clone();
    let p = bytes.as_ptr() as *const c_void;
    repacked.push(bytes);
    Ok(p)
}

/// A fresh struct tree sharing `src`'s buffers. Every level retains `keep`,
/// so a consumer that moves a child out still keeps the source alive.
unsafe fn mirror_array(src: &ArrowArray, keep: &Vector) -> Result<ArrowArray> {
    let n_buffers = non_negative(src.n_buffers, "n_buffers")?;
    let mut buffers = Vec::with_capacity(n_buffers);
    for i in 0..n_buffers {
        buffers.push(buffer_ptr(src, i)?);
    }
    let n_children = non_negative(src.n_children, "n_children")?;
    if n_children > 0 && src.children.is_null() {
        return Err(malformed("children pointer is null"));
    }
    let mut children = Vec::with_capacity(n_children);
    for i in 0..n_children {
        let child = (*src.children.add(i))
            .as_ref()
            .ok_or_else(|| malformed(format!("child {i} is null")))?;
        children.push(mirror_array(child, keep)?);
    }
    let dictionary = match src.dictionary.as_ref() {
        Some(d) => Some(mirror_array(d, keep)?),
        None => None,
    };
    let retained = Retained {
        vector: Some(keep.clone()),
        ..Retained::default()
    };
    let mut out = build_array(0, 0, buffers, children, dictionary, retained);
    out.length = src.length;
    out.null_count = src.null_count;
    out.offset = src.offset;
    Ok(out)
}

/// Re-export a passthrough column over its source array.
///
/// Contiguous selections (and layouts without buffers) share the source
/// zero-copy through the offset. Other selections of fixed-width formats
/// gather their values into a fresh buffer; anything else cannot be
/// represented and is `NotImplemented`.
fn export_passthrough(o: &OpaqueVector, keep: &Vector) -> Result<ArrowArray> {
    let source = o.source().ok_or_else(passthrough_unsupported)?;
    let src = source.source();
    let shares_source = src.n_buffers == 0 && src.n_children == 0;
    let mut array = match o.contiguous_start() {
        Some(start) => {
            // SAFETY: `keep` holds the column, which keeps the source alive.
            let mut a = unsafe { mirror_array(src, keep)? };
            a.offset = (source.offset + start) as i64;
            a
        }
        // SAFETY: as above.
        None if shares_source => unsafe { mirror_array(src, keep)? },
        None => {
            let width = o.byte_width().ok_or_else(passthrough_unsupported)?;
            let mut retained = Retained {
                vector: Some(keep.clone()),
                ..Retained::default()
            };
            let validity = match o.validity() {
                Some(b) => bitmap_ptr(b, &mut retained.repacked)?,
                None => ptr::null(),
            };
            // Gathered as words so the values buffer is 8-byte aligned.
            let total = o.len() * width;
            let mut words = alloc::try_alloc_zeroed::<u64>(total.div_ceil(8), "export_gather")?;
            {
                // SAFETY: the byte view covers exactly the words' allocation.
                let bytes = unsafe {
                    std::slice::from_raw_parts_mut(words.as_mut_ptr() as *mut u8, words.len() * 8)
                };
                for (i, slot) in bytes[..total].chunks_exact_mut(width).enumerate() {
                    if let Some(value) = o.value_bytes(i) {
                        slot.copy_from_slice(value);
                    }
                }
            }
            let values = words.as_ptr() as *const c_void;
            retained.gathered = words;
            build_array(0, 0, vec![validity, values], Vec::new(), None, retained)
        }
    };
    array.length = o.len() as i64;
    array.null_count = o.null_count() as i64;
    #[cfg(feature = "tracing")]
    tracing::debug!(format = o.format(), rows = o.len(), offset = array.offset, "passthrough column exported");
    Ok(array)
}

fn export_array(vector: Vector) -> Result<ArrowArray> {
    if let Vector::NonNative(o) = &vector {
        return export_passthrough(o, &vector);
    }
    format_of(&vector)?;
    let mut repacked = Vec::new();
    let validity = match vector.validity() {
        Some(b) => bitmap_ptr(b, &mut repacked)?,
        None => ptr::null(),
    };
    let (buffers, children) = dispatch_primitive!(
        &vector,
        p => (vec![validity, p.buffer().as_ptr() as *const c_void], Vec::new()),
        other => match other {
            Vector::Boolean(b) => (vec![validity, bitmap_ptr(b.values(), &mut repacked)?], Vec::new()),
            Vector::Utf8(b) | Vector::Binary(b) => (
                vec![
                    validity,
                    b.offsets().as_ptr() as *const c_void,
                    b.payload().as_ptr() as *const c_void,
                ],
                Vec::new(),
            ),
            Vector::Array(a) => (
                vec![validity, a.offsets().as_ptr() as *const c_void],
                vec![export_array(a.child().clone())?],
            ),
            _ => return Err(Error::not_implemented("export", vector.data_type(), "-")),
        }
    );
    let (len, null_count) = (vector.len(), vector.null_count());
    let retained = Retained {
        vector: Some(vector),
        repacked,
        ..Retained::default()
    };
    Ok(build_array(len, null_count, buffers, children, None, retained))
}

/// Export a vector; the receiver must eventually call both `release`s.
///
/// Borrowed vectors export zero-copy and keep their own producer alive until
/// the exported array is released. A passthrough column exports only if it
/// was imported (it has no payload otherwise); see [`OpaqueVector`] for
/// which row selections survive.
pub fn export_vector(vector: Vector) -> Result<(ArrowArray, ArrowSchema)> {
    let schema = export_schema(&vector, "")?;
    let array = export_array(vector)?;
    #[cfg(feature = "tracing")]
    tracing::trace!(rows = array.length, "vector exported");
    Ok((array, schema))
}

/// Export a morsel as a `+s` struct array with one child per column.
pub fn export_morsel(morsel: Morsel) -> Result<(ArrowArray, ArrowSchema)> {
    let num_rows = morsel.num_rows();
    let columns = morsel.into_columns();
    let mut child_schemas = Vec::with_capacity(columns.len());
    let mut child_arrays = Vec::with_capacity(columns.len());
    for (name, vector) in columns {
        child_schemas.push(export_schema(&vector, &name)?);
        child_arrays.push(export_array(vector)?);
    }
    let schema = build_schema("+s", "", 0, child_schemas, None)?;
    let array = build_array(
        num_rows,
        0,
        vec![ptr::null()],
        child_arrays,
        None,
        Retained::default(),
    );
    #[cfg(feature = "tracing")]
    tracing::debug!(rows = num_rows, columns = array.n_children, "morsel exported");
    Ok((array, schema))
}
