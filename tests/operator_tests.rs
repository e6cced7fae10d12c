//! Operators driven the way an executor drives them: plan once, then
//! `eval_morsel` per morsel under a shared budget.

mod test_data_gen;

use vecta::prelude::*;
use vecta::vecta_kernels::{DistinctCount, Evaluate, Expr, Filter, GroupAggregate, Project};
use test_data_gen::{ints, sample_morsel, sequence};

fn gt(column: &str, value: i64) -> Expr {
    Expr::binary(Op::GreaterThan, Expr::col(column), Expr::lit(value))
}

#[test]
fn test_filter_plan_and_eval() {
    let ctx = KernelContext::portable();
    let input = sample_morsel(10, 3);
    let op = Filter::new(gt("v", 4));
    let plan = op.plan(&[input.schema()]).unwrap();
    assert_eq!(plan.output_schema, input.schema());

    let out = op.eval_morsel(&[input], &ctx).unwrap();
    assert_eq!(ints(out.column("v").unwrap()), (5..10).map(Some).collect::<Vec<_>>());
    assert_eq!(ctx.budget().used_bytes(), out.reserved_bytes());
}

#[test]
fn test_filter_rejects_non_boolean_predicate() {
    let input = sample_morsel(4, 2);
    let op = Filter::new(Expr::binary(Op::Add, Expr::col("v"), Expr::lit(1i64)));
    assert!(matches!(op.plan(&[input.schema()]).unwrap_err(), Error::Contract(_)));
    let err = op.eval_morsel(&[input], &KernelContext::portable()).unwrap_err();
    assert!(matches!(err, Error::Contract(_)));
}

#[test]
fn test_evaluate_chains_outputs() {
    let ctx = KernelContext::portable();
    let input = sample_morsel(8, 2);
    let op = Evaluate::default()
        .with_output("w", Expr::binary(Op::Multiply, Expr::col("v"), Expr::lit(2i64)))
        .with_output("big", gt("w", 10));
    let plan = op.plan(&[input.schema()]).unwrap();
    assert_eq!(plan.output_schema.field_named("big").unwrap().data_type, DataType::Boolean);

    let out = op.eval_morsel(&[input], &ctx).unwrap();
    assert_eq!(out.names(), vec!["k", "v", "f", "w", "big"]);
    assert_eq!(ints(out.column("w").unwrap())[7], Some(14));
    assert_eq!(out.column("big").unwrap().get_scalar(5).unwrap(), Scalar::Boolean(false));
    assert_eq!(out.column("big").unwrap().get_scalar(6).unwrap(), Scalar::Boolean(true));
}

#[test]
fn test_evaluate_unsupported_expression_is_not_implemented() {
    let input = sample_morsel(3, 1);
    let op = Evaluate::default().with_output("x", Expr::binary(Op::Add, Expr::col("k"), Expr::col("v")));
    assert!(op.plan(&[input.schema()]).unwrap_err().is_not_implemented());
    let err = op.eval_morsel(&[input], &KernelContext::portable()).unwrap_err();
    assert!(err.is_not_implemented());
    assert!(!err.is_fatal());
}

#[test]
fn test_project_select_and_swap() {
    let ctx = KernelContext::portable();
    let input = sample_morsel(4, 2);
    let op = Project::select(["v", "f"]).rename("v", "f").rename("f", "v");
    let plan = op.plan(&[input.schema()]).unwrap();
    let out = op.eval_morsel(&[input], &ctx).unwrap();
    assert_eq!(out.names(), vec!["f", "v"]);
    assert_eq!(out.schema(), plan.output_schema);
    assert_eq!(out.column("f").unwrap().data_type(), DataType::Int64);
}

#[test]
fn test_distinct_count_over_morsel_stream() {
    let ctx = KernelContext::portable();
    let op = DistinctCount::new("x");
    let morsel = |v: Vec<i64>| Morsel::try_new(vec![("x".to_string(), Vector::int64(v).unwrap())]).unwrap();
    op.eval_morsel(&[morsel(vec![1, 2, 2, 3])], &ctx).unwrap();
    let out = op.eval_morsel(&[morsel(vec![3, 4])], &ctx).unwrap();
    assert_eq!(out.num_rows(), 1);
    assert_eq!(ints(out.column("count_distinct(x)").unwrap()), vec![Some(4)]);
    op.eval_morsel(&[morsel(vec![1, 2, 2, 3])], &ctx).unwrap();
    assert_eq!(op.count().unwrap(), 4);
}

#[test]
fn test_group_aggregate_per_key() {
    let ctx = KernelContext::portable();
    let input = sample_morsel(9, 3);
    let op = GroupAggregate::new(["k"])
        .with_aggregate(AggregateSpec::new(AggregateFunction::Sum, "v"))
        .with_aggregate(AggregateSpec::new(AggregateFunction::Count, "v").with_alias("n"));
    let out = op.eval_morsel(&[input], &ctx).unwrap();
    assert_eq!(out.names(), vec!["k", "sum(v)", "n"]);
    assert_eq!(
        out.to_rows().unwrap(),
        vec![
            vec![Scalar::from("g0"), Scalar::Int64(9), Scalar::Int64(3)],
            vec![Scalar::from("g1"), Scalar::Int64(12), Scalar::Int64(3)],
            vec![Scalar::from("g2"), Scalar::Int64(15), Scalar::Int64(3)],
        ]
    );
}

#[test]
fn test_tiny_budget_fails_with_out_of_memory() {
    let cfg = KernelConfig {
        mem_cap_bytes: 16,
        ..KernelConfig::default()
    };
    let ctx = KernelContext::new(cfg).unwrap();
    let input = Morsel::try_new(vec![("v".to_string(), sequence(0, 100))]).unwrap();
    let err = Filter::new(gt("v", -1)).eval_morsel(&[input], &ctx).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, Error::OutOfMemory { .. }));
}

#[test]
fn test_outputs_release_budget_when_dropped() {
    let ctx = KernelContext::portable().with_budget(MemoryBudgetImpl::new(1 << 20));
    let input = sample_morsel(32, 4);
    let a = Project::select(["v"]).eval_morsel(&[input.clone()], &ctx).unwrap();
    let b = Filter::new(gt("v", 10)).eval_morsel(&[input], &ctx).unwrap();
    assert_eq!(ctx.budget().used_bytes(), a.reserved_bytes() + b.reserved_bytes());
    drop((a, b));
    assert_eq!(ctx.budget().used_bytes(), 0);
}

#[test]
fn test_config_requirements() {
    let cfg = KernelConfig::from_json_str(r#"{"disable_simd": true, "require_avx2": true}"#).unwrap();
    assert!(matches!(KernelContext::new(cfg).unwrap_err(), Error::Config(_)));

    let cfg = KernelConfig::from_json_str(r#"{"distinct_initial_capacity": 8}"#).unwrap();
    assert_eq!(cfg.distinct_initial_capacity, 8);
    assert_eq!(cfg.mem_cap_bytes, KernelConfig::default().mem_cap_bytes);
}
