//! Logical operators, their boolean-dtype guard, and comparison values.

use std::sync::Arc;

use tenrs::engine::spec::DType;
use tenrs::error::OpError;
use tenrs::tensor::{HostTensor, Shape, Tensor};
use tenrs_engine_ref_cpu::CpuEngine;

fn engine() -> Arc<CpuEngine> {
    Arc::new(CpuEngine::new())
}

fn floats(engine: &Arc<CpuEngine>, values: &[f32]) -> Tensor<CpuEngine> {
    let host = HostTensor::from_vec(Shape::new(vec![values.len()]), values.to_vec()).unwrap();
    Tensor::from_host(Arc::clone(engine), &host).unwrap()
}

fn bools(engine: &Arc<CpuEngine>, values: &[bool]) -> Tensor<CpuEngine> {
    let host = HostTensor::from_bool(Shape::new(vec![values.len()]), values.to_vec()).unwrap();
    Tensor::from_host(Arc::clone(engine), &host).unwrap()
}

#[test]
fn logical_binaries_compute_elementwise() {
    let engine = engine();
    let a = bools(&engine, &[true, true, false, false]);
    let b = bools(&engine, &[true, false, true, false]);

    assert_eq!(
        (&a & &b).to_host().unwrap().data_bool(),
        &[1, 0, 0, 0]
    );
    assert_eq!(
        (&a | &b).to_host().unwrap().data_bool(),
        &[1, 1, 1, 0]
    );
    assert_eq!(
        (&a ^ &b).to_host().unwrap().data_bool(),
        &[0, 1, 1, 0]
    );
    assert_eq!((!&a).to_host().unwrap().data_bool(), &[0, 0, 1, 1]);
}

#[test]
fn logical_ops_never_coerce_numeric_operands() {
    let engine = engine();
    let numeric = floats(&engine, &[1.0, 0.0]);
    let boolean = bools(&engine, &[true, false]);

    match numeric.try_logical_and(&boolean) {
        Err(OpError::TypeMismatch { op: "and", dtype }) => assert_eq!(dtype, DType::F32),
        other => panic!("expected TypeMismatch, got {other:?}"),
    }
    assert!(boolean.try_logical_or(&numeric).is_err());
    assert!(numeric.try_logical_xor(&numeric).is_err());
    assert!(numeric.try_logical_not().is_err());
}

#[test]
fn guard_fires_before_the_primitive_is_applied() {
    let engine = engine();
    let numeric = floats(&engine, &[1.0, 0.0]);
    // The reference engine would also reject And on f32; the guard must
    // report the dispatch-level TypeMismatch instead of an engine error.
    match numeric.try_logical_and(&numeric) {
        Err(OpError::TypeMismatch { .. }) => {}
        Err(OpError::Engine(inner)) => panic!("guard must fire before apply: {inner}"),
        other => panic!("expected TypeMismatch, got {other:?}"),
    }
}

#[test]
fn scalar_bool_operands_pass_the_guard() {
    let engine = engine();
    let a = bools(&engine, &[true, false]);
    assert_eq!((&a & true).to_host().unwrap().data_bool(), &[1, 0]);
    assert_eq!((false | &a).to_host().unwrap().data_bool(), &[1, 0]);
    assert_eq!((true ^ &a).to_host().unwrap().data_bool(), &[0, 1]);
}

#[test]
fn comparisons_return_bool_values() {
    let engine = engine();
    let a = floats(&engine, &[1.0, 2.0, 3.0]);
    let b = floats(&engine, &[2.0, 2.0, 2.0]);

    let less = a.try_less(&b).unwrap();
    assert_eq!(less.dtype(), DType::Bool);
    assert_eq!(less.to_host().unwrap().data_bool(), &[1, 0, 0]);

    assert_eq!(
        a.try_less_equal(&b).unwrap().to_host().unwrap().data_bool(),
        &[1, 1, 0]
    );
    assert_eq!(
        a.try_greater(&b).unwrap().to_host().unwrap().data_bool(),
        &[0, 0, 1]
    );
    assert_eq!(
        a.try_greater_equal(&b).unwrap().to_host().unwrap().data_bool(),
        &[0, 1, 1]
    );
    assert_eq!(
        a.try_equal(&b).unwrap().to_host().unwrap().data_bool(),
        &[0, 1, 0]
    );
    assert_eq!(
        a.try_not_equal(&b).unwrap().to_host().unwrap().data_bool(),
        &[1, 0, 1]
    );
}

#[test]
fn not_equal_agrees_with_negated_equal_on_nan() {
    let engine = engine();
    let a = floats(&engine, &[f32::NAN, 1.0]);
    let b = floats(&engine, &[f32::NAN, 1.0]);

    // NaN != NaN under IEEE equality, so both definitions agree.
    let ne = a.try_not_equal(&b).unwrap();
    assert_eq!(ne.to_host().unwrap().data_bool(), &[1, 0]);
}

#[test]
fn comparisons_accept_scalar_operands() {
    let engine = engine();
    let a = floats(&engine, &[1.0, 2.0, 3.0]);
    assert_eq!(
        a.try_greater(2.0).unwrap().to_host().unwrap().data_bool(),
        &[0, 0, 1]
    );
    assert_eq!(
        a.try_equal(2.0).unwrap().to_host().unwrap().data_bool(),
        &[0, 1, 0]
    );
}
