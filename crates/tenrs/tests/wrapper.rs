//! Wrapper lifecycle: construction, reference sharing, rebind, in-place
//! operators, and the sequence protocol.

use std::sync::Arc;

use tenrs::engine::spec::{DType, IndexItem, Literal};
use tenrs::error::OpError;
use tenrs::tensor::{HostTensor, Shape, Tensor, TensorSource};
use tenrs_engine_ref_cpu::CpuEngine;

fn engine() -> Arc<CpuEngine> {
    Arc::new(CpuEngine::new())
}

fn tensor(engine: &Arc<CpuEngine>, dims: &[usize], values: &[f32]) -> Tensor<CpuEngine> {
    let host = HostTensor::from_vec(Shape::new(dims.to_vec()), values.to_vec()).unwrap();
    Tensor::from_host(Arc::clone(engine), &host).unwrap()
}

#[test]
fn construction_from_none_fails_loudly() {
    let engine = engine();
    let err = Tensor::new(Arc::clone(&engine), None, None, None).unwrap_err();
    match &err {
        OpError::InvalidPayload { reason } => {
            assert!(reason.contains("no data"), "unexpected reason: {reason}")
        }
        other => panic!("expected InvalidPayload, got {other:?}"),
    }
}

#[test]
fn construction_from_wrapper_shares_the_reference() {
    let engine = engine();
    let a = tensor(&engine, &[2], &[1.0, 2.0]);
    let b = a.clone();
    assert!(Arc::ptr_eq(a.raw(), b.raw()));
}

#[test]
fn construction_respects_requested_dtype() {
    let engine = engine();
    let host = HostTensor::from_vec(Shape::new(vec![3]), vec![1.9, -2.9, 3.0]).unwrap();
    let ints = Tensor::new(Arc::clone(&engine), Some(&host), Some(DType::I32), None).unwrap();
    assert_eq!(ints.dtype(), DType::I32);
    assert_eq!(ints.to_host().unwrap().data_i32(), &[1, -2, 3]);
}

#[test]
fn inplace_add_updates_the_value_behind_the_same_wrapper() {
    let engine = engine();
    let mut x = tensor(&engine, &[3], &[1.0, 2.0, 3.0]);
    let y = tensor(&engine, &[3], &[10.0, 20.0, 30.0]);
    let before = Arc::clone(x.raw());

    x += &y;

    assert!(!Arc::ptr_eq(x.raw(), &before), "reference must be replaced");
    assert_eq!(x.to_host().unwrap().data(), &[11.0, 22.0, 33.0]);
}

#[test]
fn failed_inplace_op_leaves_the_wrapper_untouched() {
    let engine = engine();
    let mut x = tensor(&engine, &[3], &[1.0, 2.0, 3.0]);
    let y = tensor(&engine, &[4], &[0.0; 4]);
    let before = Arc::clone(x.raw());

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        x += &y;
    }));
    assert!(result.is_err(), "shape-mismatched += must fail");
    assert!(Arc::ptr_eq(x.raw(), &before));
    assert_eq!(x.to_host().unwrap().data(), &[1.0, 2.0, 3.0]);
}

#[test]
fn rebind_with_a_foreign_engine_is_an_identity_error() {
    let first = engine();
    let second = engine();
    let mut x = tensor(&first, &[2], &[1.0, 2.0]);
    let y = tensor(&second, &[2], &[3.0, 4.0]);

    match x.rebind(&y) {
        Err(OpError::IdentityMismatch { .. }) => {}
        other => panic!("expected IdentityMismatch, got {other:?}"),
    }
}

#[test]
fn rebind_with_host_data_keeps_dtype_and_device() {
    let engine = engine();
    let host = HostTensor::from_i32(Shape::new(vec![2]), vec![1, 2]).unwrap();
    let mut x = Tensor::from_host(Arc::clone(&engine), &host).unwrap();
    assert_eq!(x.dtype(), DType::I32);

    let replacement = HostTensor::from_vec(Shape::new(vec![2]), vec![7.9, 8.1]).unwrap();
    x.rebind(TensorSource::Host(replacement)).unwrap();

    assert_eq!(x.dtype(), DType::I32, "host rebind adopts the wrapper dtype");
    assert_eq!(x.to_host().unwrap().data_i32(), &[7, 8]);
}

#[test]
fn len_reports_the_first_dimension() {
    let engine = engine();
    let x = tensor(&engine, &[3, 4], &[0.0; 12]);
    assert_eq!(x.len().unwrap(), 3);

    let scalar =
        Tensor::from_host(Arc::clone(&engine), &HostTensor::scalar(Literal::Float(7.0))).unwrap();
    match scalar.len() {
        Err(OpError::ZeroRank) => {}
        other => panic!("expected ZeroRank, got {other:?}"),
    }
}

#[test]
fn iteration_walks_the_first_axis_and_restarts() {
    let engine = engine();
    let x = tensor(&engine, &[3, 2], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

    let rows: Vec<_> = x.iter().unwrap().map(|row| row.unwrap()).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].shape().dims(), &[2]);
    assert_eq!(rows[2].to_host().unwrap().data(), &[5.0, 6.0]);

    // A fresh call restarts from the beginning.
    let first_again = x.iter().unwrap().next().unwrap().unwrap();
    assert_eq!(first_again.to_host().unwrap().data(), &[1.0, 2.0]);
}

#[test]
fn get_supports_negative_indices() {
    let engine = engine();
    let x = tensor(&engine, &[3], &[1.0, 2.0, 3.0]);
    assert_eq!(x.get(-1).unwrap().to_float().unwrap(), 3.0);
    assert!(x.get(3).is_err());
}

#[test]
fn set_writes_through_the_engine_and_rebinds() {
    let engine = engine();
    let mut x = tensor(&engine, &[3], &[1.0, 2.0, 3.0]);
    let before = Arc::clone(x.raw());

    x.set(1, 9.0).unwrap();

    assert!(!Arc::ptr_eq(x.raw(), &before));
    assert_eq!(x.to_host().unwrap().data(), &[1.0, 9.0, 3.0]);
}

#[test]
fn set_with_a_bare_ellipsis_replaces_the_whole_value() {
    let engine = engine();
    let mut x = tensor(&engine, &[2], &[1.0, 2.0]);
    let y = tensor(&engine, &[5], &[0.0; 5]);

    x.set(IndexItem::Ellipsis, &y).unwrap();

    assert!(Arc::ptr_eq(x.raw(), y.raw()), "ellipsis adopts the value's reference");
    assert_eq!(x.shape().dims(), &[5]);
}

#[test]
fn contains_is_not_implemented() {
    let engine = engine();
    let x = tensor(&engine, &[2], &[1.0, 2.0]);
    match x.contains(1.0) {
        Err(OpError::Unsupported { op: "contains" }) => {}
        other => panic!("expected Unsupported, got {other:?}"),
    }
}

#[test]
fn pos_returns_the_same_logical_value() {
    let engine = engine();
    let x = tensor(&engine, &[2], &[1.0, 2.0]);
    let same = x.pos();
    assert_eq!(same.to_host().unwrap().data(), x.to_host().unwrap().data());
}

#[test]
fn trunc_is_not_implemented() {
    let engine = engine();
    let x = tensor(&engine, &[2], &[1.5, 2.5]);
    match x.trunc() {
        Err(OpError::Unsupported { op: "trunc" }) => {}
        other => panic!("expected Unsupported, got {other:?}"),
    }
}

#[test]
fn derived_properties_follow_the_shape() {
    let engine = engine();
    let x = tensor(&engine, &[2, 3, 4], &[0.0; 24]);
    assert_eq!(x.ndim(), 3);
    assert_eq!(x.size(), 24);

    let scalar =
        Tensor::from_host(Arc::clone(&engine), &HostTensor::scalar(Literal::Float(1.0))).unwrap();
    assert_eq!(scalar.ndim(), 0);
    assert_eq!(scalar.size(), 1, "empty shape still holds one element");
}
