//! Operator dispatch registry.
//!
//! Maps `(op, left type, left arity, right type, right arity)` to exactly one
//! typed kernel. The table is built once and is read-only afterwards, so one
//! instance can be shared by every worker. A key with no entry is a
//! `NotImplemented` error; there is no generic fallback kernel.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use vecta_core::scalar::Scalar;
use vecta_core::types::{promote_numeric, DataType, TimeUnit};
use vecta_core::{Error, Result};
use vecta_mem::Bitmap;
use vecta_vector::{CmpOp, Vector};

use crate::{arith, compare, logic};

/// Operation codes understood by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Op {
    Add = 1,
    Subtract = 2,
    Multiply = 3,
    Divide = 4,
    Equals = 10,
    NotEquals = 11,
    GreaterThan = 12,
    GreaterThanOrEquals = 13,
    LessThan = 14,
    LessThanOrEquals = 15,
    And = 20,
    Or = 21,
    Xor = 22,
}

impl Op {
    pub const ALL: [Op; 13] = [
        Op::Add,
        Op::Subtract,
        Op::Multiply,
        Op::Divide,
        Op::Equals,
        Op::NotEquals,
        Op::GreaterThan,
        Op::GreaterThanOrEquals,
        Op::LessThan,
        Op::LessThanOrEquals,
        Op::And,
        Op::Or,
        Op::Xor,
    ];

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Op> {
        Op::ALL.into_iter().find(|op| op.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            Op::Add => "add",
            Op::Subtract => "subtract",
            Op::Multiply => "multiply",
            Op::Divide => "divide",
            Op::Equals => "equals",
            Op::NotEquals => "not_equals",
            Op::GreaterThan => "greater_than",
            Op::GreaterThanOrEquals => "greater_than_or_equals",
            Op::LessThan => "less_than",
            Op::LessThanOrEquals => "less_than_or_equals",
            Op::And => "and",
            Op::Or => "or",
            Op::Xor => "xor",
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(self, Op::Add | Op::Subtract | Op::Multiply | Op::Divide)
    }

    pub fn is_comparison(self) -> bool {
        self.cmp_op().is_some()
    }

    pub fn is_logical(self) -> bool {
        matches!(self, Op::And | Op::Or | Op::Xor)
    }

    pub fn cmp_op(self) -> Option<CmpOp> {
        Some(match self {
            Op::Equals => CmpOp::Eq,
            Op::NotEquals => CmpOp::NotEq,
            Op::GreaterThan => CmpOp::Gt,
            Op::GreaterThanOrEquals => CmpOp::GtEq,
            Op::LessThan => CmpOp::Lt,
            Op::LessThanOrEquals => CmpOp::LtEq,
            _ => return None,
        })
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Case-insensitive; accepts the operation name or its usual symbol.
impl FromStr for Op {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let op = match s.trim().to_ascii_lowercase().as_str() {
            "add" | "+" => Op::Add,
            "subtract" | "-" => Op::Subtract,
            "multiply" | "*" => Op::Multiply,
            "divide" | "/" => Op::Divide,
            "equals" | "=" | "==" => Op::Equals,
            "not_equals" | "!=" | "<>" => Op::NotEquals,
            "greater_than" | ">" => Op::GreaterThan,
            "greater_than_or_equals" | ">=" => Op::GreaterThanOrEquals,
            "less_than" | "<" => Op::LessThan,
            "less_than_or_equals" | "<=" => Op::LessThanOrEquals,
            "and" => Op::And,
            "or" => Op::Or,
            "xor" => Op::Xor,
            other => return Err(Error::Config(format!("unknown operation '{other}'"))),
        };
        Ok(op)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arity {
    Vector,
    Scalar,
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Vector => f.write_str("vector"),
            Arity::Scalar => f.write_str("scalar"),
        }
    }
}

/// Operand arities a kernel is registered for. Scalar against scalar is
/// left to constant folding upstream.
pub const SUPPORTED_ARITIES: [(Arity, Arity); 3] = [
    (Arity::Vector, Arity::Vector),
    (Arity::Vector, Arity::Scalar),
    (Arity::Scalar, Arity::Vector),
];

pub const NUMERIC_TYPES: [DataType; 6] = [
    DataType::Int8,
    DataType::Int16,
    DataType::Int32,
    DataType::Int64,
    DataType::Float32,
    DataType::Float64,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KernelKey {
    pub op: Op,
    pub left: DataType,
    pub left_arity: Arity,
    pub right: DataType,
    pub right_arity: Arity,
}

impl KernelKey {
    pub fn new(op: Op, left: DataType, left_arity: Arity, right: DataType, right_arity: Arity) -> Self {
        Self {
            op,
            left,
            left_arity,
            right,
            right_arity,
        }
    }

    pub fn of(op: Op, left: &Operand<'_>, right: &Operand<'_>) -> Self {
        Self::new(op, left.data_type(), left.arity(), right.data_type(), right.arity())
    }

    fn miss(&self) -> Error {
        Error::not_implemented(
            self.op.name(),
            format!("{} {}", self.left, self.left_arity),
            format!("{} {}", self.right, self.right_arity),
        )
    }
}

impl fmt::Display for KernelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({} {}, {} {})",
            self.op, self.left, self.left_arity, self.right, self.right_arity
        )
    }
}

/// One kernel input: a column, or a literal broadcast to every row.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    Vector(&'a Vector),
    /// Literal plus its declared type. A null literal carries its partner's type.
    Scalar(&'a Scalar, DataType),
}

impl<'a> Operand<'a> {
    pub fn data_type(&self) -> DataType {
        match self {
            Operand::Vector(v) => v.data_type(),
            Operand::Scalar(_, dt) => *dt,
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Operand::Vector(_) => Arity::Vector,
            Operand::Scalar(..) => Arity::Scalar,
        }
    }

    pub fn validity(&self) -> Option<&'a Bitmap> {
        match *self {
            Operand::Vector(v) => v.validity(),
            Operand::Scalar(..) => None,
        }
    }

    pub fn is_null_literal(&self) -> bool {
        matches!(self, Operand::Scalar(s, _) if s.is_null())
    }
}

/// Rows produced by a kernel call; vector operands must agree.
pub(crate) fn row_count(left: &Operand<'_>, right: &Operand<'_>) -> Result<usize> {
    match (left, right) {
        (Operand::Vector(l), Operand::Vector(r)) if l.len() != r.len() => Err(Error::Contract(
            format!("operand lengths differ: {} vs {}", l.len(), r.len()),
        )),
        (Operand::Vector(v), _) | (_, Operand::Vector(v)) => Ok(v.len()),
        _ => Err(Error::Contract("kernel needs at least one vector operand".into())),
    }
}

/// Typed kernel entry point. The op is passed so related ops can share one
/// monomorphised body.
pub type KernelFn = fn(Op, &Operand<'_>, &Operand<'_>) -> Result<Vector>;

#[derive(Clone, Copy)]
pub struct Kernel {
    pub key: KernelKey,
    pub result_type: DataType,
    func: KernelFn,
}

impl Kernel {
    pub fn invoke(&self, left: &Operand<'_>, right: &Operand<'_>) -> Result<Vector> {
        (self.func)(self.key.op, left, right)
    }
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("key", &self.key)
            .field("result_type", &self.result_type)
            .finish()
    }
}

pub struct Registry {
    kernels: HashMap<KernelKey, Kernel>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("kernels", &self.kernels.len())
            .finish()
    }
}

impl Registry {
    /// Build the full table.
    pub fn new() -> Self {
        let mut registry = Self {
            kernels: HashMap::new(),
        };
        registry.register_arithmetic();
        registry.register_comparisons();
        registry.register_logical();
        #[cfg(feature = "tracing")]
        tracing::debug!(kernels = registry.len(), "dispatch registry built");
        registry
    }

    /// Process-wide instance, built on first use.
    pub fn shared() -> Arc<Registry> {
        static SHARED: OnceLock<Arc<Registry>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(Registry::new())).clone()
    }

    fn register(&mut self, op: Op, left: DataType, right: DataType, result_type: DataType, func: KernelFn) {
        for (left_arity, right_arity) in SUPPORTED_ARITIES {
            let key = KernelKey::new(op, left, left_arity, right, right_arity);
            self.kernels.insert(
                key,
                Kernel {
                    key,
                    result_type,
                    func,
                },
            );
        }
    }

    fn register_arithmetic(&mut self) {
        for op in Op::ALL.into_iter().filter(|op| op.is_arithmetic()) {
            for left in NUMERIC_TYPES {
                for right in NUMERIC_TYPES {
                    let Some(out) = promote_numeric(left, right) else {
                        continue;
                    };
                    if let Some(func) = arith::kernel_for(out) {
                        self.register(op, left, right, out, func);
                    }
                }
            }
        }
    }

    fn register_comparisons(&mut self) {
        let mut same_typed: Vec<DataType> = vec![DataType::Date32];
        same_typed.extend(TimeUnit::ALL.map(DataType::Timestamp64));
        same_typed.extend([
            DataType::Time32(TimeUnit::Second),
            DataType::Time32(TimeUnit::Millisecond),
            DataType::Time64(TimeUnit::Microsecond),
            DataType::Time64(TimeUnit::Nanosecond),
            DataType::Boolean,
            DataType::Utf8,
            DataType::Binary,
        ]);

        for op in Op::ALL.into_iter().filter(|op| op.is_comparison()) {
            for left in NUMERIC_TYPES {
                for right in NUMERIC_TYPES {
                    let Some(promoted) = promote_numeric(left, right) else {
                        continue;
                    };
                    if let Some(func) = compare::numeric_kernel_for(promoted) {
                        self.register(op, left, right, DataType::Boolean, func);
                    }
                }
            }
            for dt in &same_typed {
                if let Some(func) = compare::same_type_kernel_for(*dt) {
                    self.register(op, *dt, *dt, DataType::Boolean, func);
                }
            }
            if matches!(op, Op::Equals | Op::NotEquals) {
                if let Some(func) = compare::same_type_kernel_for(DataType::Interval) {
                    self.register(op, DataType::Interval, DataType::Interval, DataType::Boolean, func);
                }
            }
        }
    }

    fn register_logical(&mut self) {
        for op in Op::ALL.into_iter().filter(|op| op.is_logical()) {
            self.register(op, DataType::Boolean, DataType::Boolean, DataType::Boolean, logic::logical_kernel);
        }
    }

    pub fn lookup(&self, key: &KernelKey) -> Result<&Kernel> {
        self.kernels.get(key).ok_or_else(|| key.miss())
    }

    pub fn supports(&self, key: &KernelKey) -> bool {
        self.kernels.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &KernelKey> + '_ {
        self.kernels.keys()
    }

    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }

    /// Look up and run the kernel for `op` over the two operands.
    pub fn evaluate(&self, op: Op, left: &Operand<'_>, right: &Operand<'_>) -> Result<Vector> {
        let kernel = self.lookup(&KernelKey::of(op, left, right))?;
        row_count(left, right)?;
        let out = kernel.invoke(left, right)?;
        #[cfg(feature = "tracing")]
        tracing::trace!(kernel = %kernel.key, rows = out.len(), "kernel evaluated");
        Ok(out)
    }
}
