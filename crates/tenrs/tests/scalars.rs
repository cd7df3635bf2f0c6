//! Scalar extraction and numeric conversion behavior.

use std::sync::Arc;

use tenrs::engine::spec::{DType, Literal};
use tenrs::error::OpError;
use tenrs::tensor::{HostTensor, Shape, Tensor};
use tenrs_engine_ref_cpu::CpuEngine;

fn engine() -> Arc<CpuEngine> {
    Arc::new(CpuEngine::new())
}

fn tensor(engine: &Arc<CpuEngine>, dims: &[usize], values: &[f32]) -> Tensor<CpuEngine> {
    let host = HostTensor::from_vec(Shape::new(dims.to_vec()), values.to_vec()).unwrap();
    Tensor::from_host(Arc::clone(engine), &host).unwrap()
}

#[test]
fn single_element_tensors_convert_to_native_scalars() {
    let engine = engine();
    let x = tensor(&engine, &[1], &[5.0]);

    assert_eq!(x.to_int().unwrap(), 5);
    assert_eq!(x.to_float().unwrap(), 5.0);
    assert!(x.to_bool().unwrap());

    let z = x.to_complex().unwrap();
    assert_eq!(z.re, 5.0);
    assert_eq!(z.im, 0.0);
}

#[test]
fn multi_element_tensors_refuse_scalar_conversion() {
    let engine = engine();
    let x = tensor(&engine, &[2], &[5.0, 6.0]);

    for result in [x.to_int().err(), x.to_float().err(), x.item().err()] {
        match result {
            Some(OpError::ScalarRequired { size: 2 }) => {}
            other => panic!("expected ScalarRequired, got {other:?}"),
        }
    }
}

#[test]
fn int_conversion_truncates_toward_zero() {
    let engine = engine();
    assert_eq!(tensor(&engine, &[1], &[5.9]).to_int().unwrap(), 5);
    assert_eq!(tensor(&engine, &[1], &[-5.9]).to_int().unwrap(), -5);
}

#[test]
fn bool_conversion_is_truthiness() {
    let engine = engine();
    assert!(!tensor(&engine, &[1], &[0.0]).to_bool().unwrap());
    assert!(tensor(&engine, &[1], &[-0.5]).to_bool().unwrap());
}

#[test]
fn index_conversion_requires_an_integer_dtype() {
    let engine = engine();
    let ints = HostTensor::from_i32(Shape::new(vec![1]), vec![7]).unwrap();
    let ints = Tensor::from_host(Arc::clone(&engine), &ints).unwrap();
    assert_eq!(ints.to_index().unwrap(), 7);

    let floats = tensor(&engine, &[1], &[7.0]);
    match floats.to_index() {
        Err(OpError::TypeMismatch { op: "index", .. }) => {}
        other => panic!("expected TypeMismatch, got {other:?}"),
    }
}

#[test]
fn try_from_mirrors_the_conversion_methods() {
    let engine = engine();
    let x = tensor(&engine, &[1], &[3.5]);
    assert_eq!(f64::try_from(&x).unwrap(), 3.5);
    assert_eq!(i64::try_from(&x).unwrap(), 3);
    assert!(bool::try_from(&x).unwrap());
}

#[test]
fn item_preserves_the_literal_kind() {
    let engine = engine();
    let floats = tensor(&engine, &[1], &[2.5]);
    assert_eq!(floats.item().unwrap(), Literal::Float(2.5));

    let bools = HostTensor::from_bool(Shape::new(vec![1]), vec![true]).unwrap();
    let bools = Tensor::from_host(Arc::clone(&engine), &bools).unwrap();
    assert_eq!(bools.item().unwrap(), Literal::Bool(true));
}

#[test]
fn astype_round_trips_and_truncates() {
    let engine = engine();
    let x = tensor(&engine, &[3], &[1.9, -2.9, 0.0]);

    let ints = x.astype(DType::I32).unwrap();
    assert_eq!(ints.dtype(), DType::I32);
    assert_eq!(ints.to_host().unwrap().data_i32(), &[1, -2, 0]);

    let bools = x.astype(DType::Bool).unwrap();
    assert_eq!(bools.to_host().unwrap().data_bool(), &[1, 1, 0]);

    let back = ints.astype(DType::F32).unwrap();
    assert_eq!(back.to_host().unwrap().data(), &[1.0, -2.0, 0.0]);
}

#[test]
fn rank_zero_tensors_still_convert() {
    let engine = engine();
    let scalar =
        Tensor::from_host(Arc::clone(&engine), &HostTensor::scalar(Literal::Int(9))).unwrap();
    assert_eq!(scalar.size(), 1);
    assert_eq!(scalar.to_int().unwrap(), 9);
    assert_eq!(scalar.to_index().unwrap(), 9);
}
