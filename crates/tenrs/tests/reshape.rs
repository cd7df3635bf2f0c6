//! Reshape validation and shape-coercion behavior against the reference
//! engine.

use std::sync::Arc;

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
fn reshape_infers_a_single_negative_one() {
    let engine = engine();
    let x = tensor(&engine, &[2, 6], &[0.0; 12]);

    assert_eq!(x.try_reshape([3, 4]).unwrap().shape().dims(), &[3, 4]);
    assert_eq!(x.try_reshape([-1]).unwrap().shape().dims(), &[12]);
    assert_eq!(x.try_reshape([4, -1]).unwrap().shape().dims(), &[4, 3]);
    assert_eq!(x.try_reshape([-1, 2, 3]).unwrap().shape().dims(), &[2, 2, 3]);
}

#[test]
fn reshape_rejects_values_below_minus_one_with_the_offending_position() {
    let engine = engine();
    let x = tensor(&engine, &[6], &[0.0; 6]);

    match x.try_reshape([2, -3]) {
        Err(OpError::InvalidShapeValue { index: 1, value: -3 }) => {}
        other => panic!("expected InvalidShapeValue, got {other:?}"),
    }
    let err = x.try_reshape([3, -2]).unwrap_err();
    assert_eq!(err.to_string(), "expect shape[1] >= -1, got -2");
}

#[test]
fn reshape_rejects_multiple_inferred_axes_with_both_positions() {
    let engine = engine();
    let x = tensor(&engine, &[6], &[0.0; 6]);

    match x.try_reshape([-1, 2, -1]) {
        Err(OpError::MultipleInferredAxes {
            first: 0,
            second: 2,
        }) => {}
        other => panic!("expected MultipleInferredAxes, got {other:?}"),
    }
    let err = x.try_reshape([-1, -1]).unwrap_err();
    assert_eq!(err.to_string(), "multiple -1 in shape: 0 & 1");
}

#[test]
fn reshape_rejects_targets_with_the_wrong_element_count() {
    let engine = engine();
    let x = tensor(&engine, &[6], &[0.0; 6]);
    assert!(x.try_reshape([4]).is_err());
    assert!(x.try_reshape([4, -1]).is_err());
}

#[test]
fn reshape_accepts_a_tensor_valued_target() -> anyhow::Result<()> {
    let engine = engine();
    let x = tensor(&engine, &[2, 6], &[0.0; 12]);
    let target = HostTensor::from_i32(Shape::new(vec![2]), vec![3, 4])?;
    let target = Tensor::from_host(Arc::clone(&engine), &target)?;

    let reshaped = x.try_reshape(&target)?;
    assert_eq!(reshaped.shape().dims(), &[3, 4]);
    Ok(())
}

#[test]
fn reshape_preserves_values_in_row_major_order() {
    let engine = engine();
    let x = tensor(&engine, &[2, 3], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let reshaped = x.try_reshape([3, 2]).unwrap();
    assert_eq!(
        reshaped.to_host().unwrap().data(),
        &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
    );
}

#[test]
fn flatten_is_reshape_to_rank_one() {
    let engine = engine();
    let x = tensor(&engine, &[2, 2, 2], &[0.0; 8]);
    let flat = x.try_flatten().unwrap();
    assert_eq!(flat.shape().dims(), &[8]);
    assert_eq!(flat.size(), x.size());
}

#[test]
fn broadcast_expands_unit_axes() {
    let engine = engine();
    let x = tensor(&engine, &[1, 3], &[1.0, 2.0, 3.0]);
    let wide = x.try_broadcast_to([2, 3]).unwrap();
    assert_eq!(wide.shape().dims(), &[2, 3]);
    assert_eq!(
        wide.to_host().unwrap().data(),
        &[1.0, 2.0, 3.0, 1.0, 2.0, 3.0]
    );
}

#[test]
fn broadcast_rejects_negative_targets() {
    let engine = engine();
    let x = tensor(&engine, &[1, 3], &[1.0, 2.0, 3.0]);
    match x.try_broadcast_to([2, -1]) {
        Err(OpError::InvalidShapeValue { index: 1, value: -1 }) => {}
        other => panic!("expected InvalidShapeValue, got {other:?}"),
    }
}

#[test]
fn transpose_reverses_axes_by_default() {
    let engine = engine();
    let x = tensor(&engine, &[2, 3], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

    let flipped = x.try_t().unwrap();
    assert_eq!(flipped.shape().dims(), &[3, 2]);
    assert_eq!(
        flipped.to_host().unwrap().data(),
        &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]
    );

    let round_trip = flipped.try_t().unwrap();
    assert_eq!(round_trip.to_host().unwrap().data(), x.to_host().unwrap().data());
}

#[test]
fn transpose_validates_the_permutation() {
    let engine = engine();
    let x = tensor(&engine, &[2, 3], &[0.0; 6]);

    assert_eq!(x.try_transpose(&[1, 0]).unwrap().shape().dims(), &[3, 2]);
    for bad in [vec![0usize], vec![0, 0], vec![0, 2]] {
        match x.try_transpose(&bad) {
            Err(OpError::InvalidAxisOrder { rank: 2, .. }) => {}
            other => panic!("expected InvalidAxisOrder for {bad:?}, got {other:?}"),
        }
    }
}
