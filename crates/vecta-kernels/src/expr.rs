//! Operand expressions evaluated through the dispatch registry.
//!
//! The executor hands us an already-planned tree: column references,
//! typed literals, and binary operations. There is no parsing or
//! rewriting here; a literal-only subtree is a registry miss.

use serde::{Deserialize, Serialize};
use vecta_core::scalar::Scalar;
use vecta_core::schema::Schema;
use vecta_core::types::DataType;
use vecta_core::{Error, Result};
use vecta_mem::alloc;
use vecta_vector::{Morsel, Vector};

use crate::registry::{Arity, KernelKey, Op, Operand, Registry};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Column(String),
    Literal(Scalar),
    Binary {
        op: Op,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

/// Value of an expression over one morsel.
#[derive(Debug, Clone)]
pub enum Datum {
    Vector(Vector),
    Scalar(Scalar),
}

impl Datum {
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Datum::Vector(v) => Some(v.data_type()),
            Datum::Scalar(s) => s.data_type(),
        }
    }

    /// Materialise as a column of `num_rows`, broadcasting a literal.
    pub fn into_vector(self, num_rows: usize) -> Result<Vector> {
        match self {
            Datum::Vector(v) => Ok(v),
            Datum::Scalar(s) => {
                let dt = s
                    .data_type()
                    .ok_or_else(|| Error::Contract("cannot infer the type of a bare null literal".into()))?;
                let values = alloc::try_collect((0..num_rows).map(|_| s.clone()), "broadcast")?;
                Vector::from_scalars(dt, &values)
            }
        }
    }
}

fn operand<'a>(datum: &'a Datum, data_type: DataType) -> Operand<'a> {
    match datum {
        Datum::Vector(v) => Operand::Vector(v),
        Datum::Scalar(s) => Operand::Scalar(s, data_type),
    }
}

impl Expr {
    pub fn col(name: impl Into<String>) -> Self {
        Expr::Column(name.into())
    }

    pub fn lit(value: impl Into<Scalar>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn binary(op: Op, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Column names referenced anywhere in the tree.
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Column(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Expr::Literal(_) => {}
            Expr::Binary { left, right, .. } => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
        }
    }

    pub fn evaluate(&self, morsel: &Morsel, registry: &Registry) -> Result<Datum> {
        match self {
            Expr::Column(name) => morsel
                .column(name)
                .cloned()
                .map(Datum::Vector)
                .ok_or_else(|| Error::Contract(format!("column '{name}' not found"))),
            Expr::Literal(s) => Ok(Datum::Scalar(s.clone())),
            Expr::Binary { op, left, right } => {
                let l = left.evaluate(morsel, registry)?;
                let r = right.evaluate(morsel, registry)?;
                let lt = l.data_type().or(r.data_type()).unwrap_or(DataType::NonNative);
                let rt = r.data_type().unwrap_or(lt);
                let out = registry.evaluate(*op, &operand(&l, lt), &operand(&r, rt))?;
                Ok(Datum::Vector(out))
            }
        }
    }

    /// Evaluate and broadcast to the morsel's row count.
    pub fn evaluate_vector(&self, morsel: &Morsel, registry: &Registry) -> Result<Vector> {
        self.evaluate(morsel, registry)?.into_vector(morsel.num_rows())
    }

    /// Type and arity this expression produces over `schema`; `None` type
    /// for a bare null literal.
    pub fn output_type(&self, schema: &Schema, registry: &Registry) -> Result<(Option<DataType>, Arity)> {
        match self {
            Expr::Column(name) => schema
                .field_named(name)
                .map(|f| (Some(f.data_type), Arity::Vector))
                .ok_or_else(|| Error::Contract(format!("column '{name}' not in schema"))),
            Expr::Literal(s) => Ok((s.data_type(), Arity::Scalar)),
            Expr::Binary { op, left, right } => {
                let (l, la) = left.output_type(schema, registry)?;
                let (r, ra) = right.output_type(schema, registry)?;
                let lt = l.or(r).unwrap_or(DataType::NonNative);
                let rt = r.unwrap_or(lt);
                let kernel = registry.lookup(&KernelKey::new(*op, lt, la, rt, ra))?;
                Ok((Some(kernel.result_type), Arity::Vector))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn morsel() -> Morsel {
        Morsel::try_new(vec![
            ("a".into(), Vector::int64(vec![1, 2, 3]).unwrap()),
            ("b".into(), Vector::float64(vec![0.5, 1.5, 2.5]).unwrap()),
        ])
        .unwrap()
    }

    #[test]
    fn test_nested_expression() {
        let registry = Registry::new();
        // (a + b) > 3
        let expr = Expr::binary(
            Op::GreaterThan,
            Expr::binary(Op::Add, Expr::col("a"), Expr::col("b")),
            Expr::lit(3i64),
        );
        let out = expr.evaluate_vector(&morsel(), &registry).unwrap();
        assert_eq!(
            out.to_materialized_list().unwrap(),
            vec![Scalar::Boolean(false), Scalar::Boolean(true), Scalar::Boolean(true)]
        );
    }

    #[test]
    fn test_null_literal_takes_partner_type() {
        let registry = Registry::new();
        let expr = Expr::binary(Op::Equals, Expr::col("a"), Expr::Literal(Scalar::Null));
        let out = expr.evaluate_vector(&morsel(), &registry).unwrap();
        assert_eq!(out.null_count(), 3);
    }

    #[test]
    fn test_literal_only_is_registry_miss() {
        let registry = Registry::new();
        let expr = Expr::binary(Op::Add, Expr::lit(1i64), Expr::lit(2i64));
        let err = expr.evaluate(&morsel(), &registry).unwrap_err();
        assert!(err.is_not_implemented());
    }

    #[test]
    fn test_output_type_matches_kernel() {
        let registry = Registry::new();
        let schema = morsel().schema();
        let expr = Expr::binary(Op::Multiply, Expr::col("a"), Expr::col("b"));
        assert_eq!(
            expr.output_type(&schema, &registry).unwrap(),
            (Some(DataType::Float64), Arity::Vector)
        );
        assert_eq!(expr.columns(), vec!["a", "b"]);
    }

    #[test]
    fn test_literal_broadcast() {
        let registry = Registry::new();
        let out = Expr::lit("x").evaluate_vector(&morsel(), &registry).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out.data_type(), DataType::Utf8);
    }
}
