//! Dispatch registry: totality over registered keys, explicit misses,
//! promotion and null propagation.

mod test_data_gen;

use vecta::prelude::*;
use vecta::vecta_kernels::registry::{Arity, KernelKey, NUMERIC_TYPES};
use vecta::vecta_vector::{MASK_FALSE, MASK_NULL, MASK_TRUE};
use test_data_gen::ints;

fn sample_scalar(dt: DataType) -> Scalar {
    match dt {
        DataType::Int8 => Scalar::Int8(3),
        DataType::Int16 => Scalar::Int16(3),
        DataType::Int32 => Scalar::Int32(3),
        DataType::Int64 => Scalar::Int64(3),
        DataType::Float32 => Scalar::Float32(3.0),
        DataType::Float64 => Scalar::Float64(3.0),
        DataType::Date32 => Scalar::Date32(3),
        DataType::Timestamp64(u) => Scalar::Timestamp64(3, u),
        DataType::Time32(u) => Scalar::Time32(3, u),
        DataType::Time64(u) => Scalar::Time64(3, u),
        DataType::Interval => Scalar::Interval(IntervalMonthDayNano::new(0, 3, 0)),
        DataType::Boolean => Scalar::Boolean(true),
        DataType::Utf8 => Scalar::Utf8("c".into()),
        DataType::Binary => Scalar::Binary(vec![3]),
        DataType::Array | DataType::NonNative => Scalar::Null,
    }
}

fn sample_vector(dt: DataType) -> Vector {
    Vector::from_scalars(dt, &[sample_scalar(dt), Scalar::Null, sample_scalar(dt)]).unwrap()
}

#[test]
fn test_every_registered_key_evaluates() {
    let registry = Registry::new();
    assert!(!registry.is_empty());
    for key in registry.keys() {
        let lv = sample_vector(key.left);
        let rv = sample_vector(key.right);
        let ls = sample_scalar(key.left);
        let rs = sample_scalar(key.right);
        let left = match key.left_arity {
            Arity::Vector => Operand::Vector(&lv),
            Arity::Scalar => Operand::Scalar(&ls, key.left),
        };
        let right = match key.right_arity {
            Arity::Vector => Operand::Vector(&rv),
            Arity::Scalar => Operand::Scalar(&rs, key.right),
        };
        let kernel = registry.lookup(key).unwrap();
        let out = registry
            .evaluate(key.op, &left, &right)
            .unwrap_or_else(|e| panic!("{key} failed: {e}"));
        assert_eq!(out.len(), 3, "{key}");
        assert_eq!(out.data_type(), kernel.result_type, "{key}");
        // Row 1 is null on every vector side.
        assert!(!out.is_valid(1), "{key} did not propagate null");
    }
}

#[test]
fn test_arithmetic_covers_all_numeric_pairs_and_arities() {
    let registry = Registry::shared();
    for op in [Op::Add, Op::Subtract, Op::Multiply, Op::Divide] {
        for l in NUMERIC_TYPES {
            for r in NUMERIC_TYPES {
                for (la, ra) in [
                    (Arity::Vector, Arity::Vector),
                    (Arity::Vector, Arity::Scalar),
                    (Arity::Scalar, Arity::Vector),
                ] {
                    assert!(registry.supports(&KernelKey::new(op, l, la, r, ra)), "{op} {l} {r}");
                }
                let ss = KernelKey::new(op, l, Arity::Scalar, r, Arity::Scalar);
                assert!(registry.lookup(&ss).unwrap_err().is_not_implemented());
            }
        }
    }
}

#[test]
fn test_unsupported_pairs_are_typed_misses() {
    let registry = Registry::shared();
    let v = Arity::Vector;
    let misses = [
        KernelKey::new(Op::Add, DataType::Int64, v, DataType::Utf8, v),
        KernelKey::new(Op::Equals, DataType::Int64, v, DataType::Utf8, v),
        KernelKey::new(Op::And, DataType::Int64, v, DataType::Int64, v),
        KernelKey::new(Op::Equals, DataType::Array, v, DataType::Array, v),
        KernelKey::new(Op::LessThan, DataType::Interval, v, DataType::Interval, v),
        KernelKey::new(Op::Add, DataType::Date32, v, DataType::Date32, v),
        KernelKey::new(Op::Equals, DataType::NonNative, v, DataType::NonNative, v),
    ];
    for key in misses {
        let err = registry.lookup(&key).unwrap_err();
        assert!(err.is_not_implemented(), "{key}: {err}");
        assert!(!err.is_fatal());
    }
}

#[test]
fn test_promotion_rules() {
    let registry = Registry::shared();
    let result = |op, l, r| {
        registry
            .lookup(&KernelKey::new(op, l, Arity::Vector, r, Arity::Vector))
            .unwrap()
            .result_type
    };
    assert_eq!(result(Op::Add, DataType::Int8, DataType::Int32), DataType::Int32);
    assert_eq!(result(Op::Multiply, DataType::Int16, DataType::Float32), DataType::Float32);
    assert_eq!(result(Op::Subtract, DataType::Int32, DataType::Float32), DataType::Float64);
    assert_eq!(result(Op::Divide, DataType::Float64, DataType::Int8), DataType::Float64);
    assert_eq!(result(Op::Equals, DataType::Int8, DataType::Float64), DataType::Boolean);
}

#[test]
fn test_scalar_broadcast_and_integer_divide_by_zero() {
    let registry = Registry::shared();
    let v = Vector::int64(vec![10, 20, 30]).unwrap();
    let zero = Scalar::Int64(0);
    let out = registry
        .evaluate(Op::Divide, &Operand::Vector(&v), &Operand::Scalar(&zero, DataType::Int64))
        .unwrap();
    assert_eq!(out.null_count(), 3);

    let two = Scalar::Int32(2);
    let out = registry
        .evaluate(Op::Subtract, &Operand::Scalar(&two, DataType::Int32), &Operand::Vector(&v))
        .unwrap();
    assert_eq!(out.data_type(), DataType::Int64);
    assert_eq!(ints(&out), vec![Some(-8), Some(-18), Some(-28)]);
}

#[test]
fn test_integer_overflow_wraps() {
    let registry = Registry::shared();
    let v = Vector::int64(vec![i64::MAX]).unwrap();
    let one = Scalar::Int64(1);
    let out = registry
        .evaluate(Op::Add, &Operand::Vector(&v), &Operand::Scalar(&one, DataType::Int64))
        .unwrap();
    assert_eq!(ints(&out), vec![Some(i64::MIN)]);
}

#[test]
fn test_comparison_and_logic_propagate_nulls() {
    let registry = Registry::shared();
    let a = Vector::boolean(&[Some(true), Some(false), None, Some(true)]).unwrap();
    let b = Vector::boolean(&[Some(true), None, Some(false), Some(false)]).unwrap();
    let and = registry.evaluate(Op::And, &Operand::Vector(&a), &Operand::Vector(&b)).unwrap();
    let Vector::Boolean(and) = and else {
        panic!("and must produce booleans");
    };
    assert_eq!(
        and.to_mask().unwrap().as_bytes(),
        &[MASK_TRUE, MASK_NULL, MASK_NULL, MASK_FALSE]
    );

    let x = Vector::from_scalars(DataType::Float64, &[Scalar::Float64(1.0), Scalar::Null]).unwrap();
    let y = Vector::int64(vec![1, 1]).unwrap();
    let eq = registry.evaluate(Op::Equals, &Operand::Vector(&x), &Operand::Vector(&y)).unwrap();
    let Vector::Boolean(eq) = eq else {
        panic!("equals must produce booleans");
    };
    assert_eq!(eq.to_mask().unwrap().as_bytes(), &[MASK_TRUE, MASK_NULL]);
}

#[test]
fn test_length_mismatch_is_contract_error() {
    let registry = Registry::shared();
    let a = Vector::int64(vec![1, 2]).unwrap();
    let b = Vector::int64(vec![1]).unwrap();
    let err = registry.evaluate(Op::Add, &Operand::Vector(&a), &Operand::Vector(&b)).unwrap_err();
    assert!(matches!(err, Error::Contract(_)));
}

#[test]
fn test_op_parsing() {
    assert_eq!("GREATER_THAN".parse::<Op>().unwrap(), Op::GreaterThan);
    assert_eq!(">=".parse::<Op>().unwrap(), Op::GreaterThanOrEquals);
    assert!(matches!("modulo".parse::<Op>().unwrap_err(), Error::Config(_)));
    assert_eq!(Op::Xor.code(), 22);
}
