//! Engine-generic invariant suites.
//!
//! Each function exercises one dispatch-contract invariant against an
//! arbitrary engine; per-engine test targets call them with their own
//! instance.

use std::sync::Arc;

use tenrs::engine::spec::{DType, Engine, Literal};
use tenrs::error::OpError;
use tenrs::tensor::{HostTensor, Shape, Tensor};

fn tensor<E: Engine + 'static>(engine: &Arc<E>, dims: &[usize], values: &[f32]) -> Tensor<E> {
    let host = HostTensor::from_vec(Shape::new(dims.to_vec()), values.to_vec()).unwrap();
    Tensor::from_host(Arc::clone(engine), &host).unwrap()
}

fn bool_tensor<E: Engine + 'static>(engine: &Arc<E>, dims: &[usize], values: &[bool]) -> Tensor<E> {
    let host = HostTensor::from_bool(Shape::new(dims.to_vec()), values.to_vec()).unwrap();
    Tensor::from_host(Arc::clone(engine), &host).unwrap()
}

fn values_of<E: Engine + 'static>(tensor: &Tensor<E>) -> Vec<f32> {
    let host = tensor.to_host().unwrap();
    host.data().to_vec()
}

pub fn wrapper_shares_reference_on_clone<E: Engine + 'static>(engine: &Arc<E>) {
    let a = tensor(engine, &[2], &[1.0, 2.0]);
    let b = a.clone();
    assert!(
        Arc::ptr_eq(a.raw(), b.raw()),
        "cloning must share the underlying reference, not copy it"
    );
}

pub fn rebind_replaces_reference<E: Engine + 'static>(engine: &Arc<E>) {
    let mut a = tensor(engine, &[2], &[1.0, 2.0]);
    let b = tensor(engine, &[3], &[5.0, 6.0, 7.0]);
    let old = Arc::clone(a.raw());
    a.rebind(&b).unwrap();
    assert!(!Arc::ptr_eq(a.raw(), &old));
    assert!(Arc::ptr_eq(a.raw(), b.raw()));
    assert_eq!(a.shape().dims(), &[3]);
}

pub fn inplace_add_rebinds_with_sum<E: Engine + 'static>(engine: &Arc<E>) {
    let mut x = tensor(engine, &[3], &[1.0, 2.0, 3.0]);
    let y = tensor(engine, &[3], &[10.0, 10.0, 10.0]);
    x += &y;
    assert_eq!(values_of(&x), vec![11.0, 12.0, 13.0]);
}

pub fn comparisons_produce_bool<E: Engine + 'static>(engine: &Arc<E>) {
    let a = tensor(engine, &[3], &[1.0, 2.0, 3.0]);
    let b = tensor(engine, &[3], &[2.0, 2.0, 2.0]);
    for result in [
        a.try_less(&b).unwrap(),
        a.try_less_equal(&b).unwrap(),
        a.try_greater(&b).unwrap(),
        a.try_greater_equal(&b).unwrap(),
        a.try_equal(&b).unwrap(),
        a.try_not_equal(&b).unwrap(),
    ] {
        assert_eq!(result.dtype(), DType::Bool);
        assert_eq!(result.shape().dims(), &[3]);
    }
}

pub fn not_equal_matches_negated_equal<E: Engine + 'static>(engine: &Arc<E>) {
    let a = tensor(engine, &[4], &[1.0, 2.0, 3.0, 4.0]);
    let b = tensor(engine, &[4], &[1.0, 0.0, 3.0, 5.0]);
    let ne = a.try_not_equal(&b).unwrap();
    let negated = a.try_equal(&b).unwrap().try_logical_not().unwrap();
    let ne_host = ne.to_host().unwrap();
    let negated_host = negated.to_host().unwrap();
    assert_eq!(ne_host.data_bool(), negated_host.data_bool());
}

pub fn reshape_preserves_element_count<E: Engine + 'static>(engine: &Arc<E>) {
    let x = tensor(engine, &[2, 6], &[0.0; 12]);
    for target in [vec![3isize, 4], vec![12], vec![-1, 2], vec![2, -1, 3]] {
        let reshaped = x.try_reshape(target.clone()).unwrap();
        assert_eq!(
            reshaped.size(),
            x.size(),
            "reshape to {target:?} changed the element count"
        );
    }
}

pub fn flatten_sum_equals_axisless_sum<E: Engine + 'static>(engine: &Arc<E>) {
    let x = tensor(engine, &[2, 3], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let direct = x.try_sum(None).unwrap().to_float().unwrap();
    let flattened = x.try_flatten().unwrap().try_sum(None).unwrap();
    assert_eq!(direct, flattened.to_float().unwrap());
    assert_eq!(direct, 21.0);
}

pub fn logical_ops_require_bool<E: Engine + 'static>(engine: &Arc<E>) {
    let numeric = tensor(engine, &[2], &[1.0, 0.0]);
    let boolean = bool_tensor(engine, &[2], &[true, false]);
    for result in [
        numeric.try_logical_and(&boolean),
        boolean.try_logical_or(&numeric),
        numeric.try_logical_xor(&numeric),
        numeric.try_logical_not(),
    ] {
        match result {
            Err(OpError::TypeMismatch { .. }) => {}
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }
    let ok = boolean.try_logical_and(&boolean).unwrap();
    assert_eq!(ok.dtype(), DType::Bool);
}

pub fn scalar_conversions_require_single_element<E: Engine + 'static>(engine: &Arc<E>) {
    let single = tensor(engine, &[1], &[5.0]);
    assert_eq!(single.to_int().unwrap(), 5);
    assert!(single.to_bool().unwrap());

    let pair = tensor(engine, &[2], &[5.0, 6.0]);
    match pair.to_int() {
        Err(OpError::ScalarRequired { size: 2 }) => {}
        other => panic!("expected ScalarRequired, got {other:?}"),
    }
}

pub fn len_requires_rank<E: Engine + 'static>(engine: &Arc<E>) {
    let matrix = tensor(engine, &[3, 4], &[0.0; 12]);
    assert_eq!(matrix.len().unwrap(), 3);

    let scalar = Tensor::from_host(Arc::clone(engine), &HostTensor::scalar(Literal::Float(1.0)))
        .unwrap();
    match scalar.len() {
        Err(OpError::ZeroRank) => {}
        other => panic!("expected ZeroRank, got {other:?}"),
    }
}

pub fn construction_requires_payload<E: Engine + 'static>(engine: &Arc<E>) {
    match Tensor::new(Arc::clone(engine), None, None, None) {
        Err(OpError::InvalidPayload { .. }) => {}
        other => panic!("constructing without data must fail, got {other:?}"),
    }
}

pub fn transpose_involutive_rank2<E: Engine + 'static>(engine: &Arc<E>) {
    let x = tensor(engine, &[2, 3], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let round_trip = x.try_t().unwrap().try_t().unwrap();
    assert_eq!(round_trip.shape().dims(), x.shape().dims());
    assert_eq!(values_of(&round_trip), values_of(&x));
}

/// Runs every suite against the given engine.
pub fn run_all<E: Engine + 'static>(engine: &Arc<E>) {
    wrapper_shares_reference_on_clone(engine);
    rebind_replaces_reference(engine);
    inplace_add_rebinds_with_sum(engine);
    comparisons_produce_bool(engine);
    not_equal_matches_negated_equal(engine);
    reshape_preserves_element_count(engine);
    flatten_sum_equals_axisless_sum(engine);
    logical_ops_require_bool(engine);
    scalar_conversions_require_single_element(engine);
    len_requires_rank(engine);
    construction_requires_payload(engine);
    transpose_involutive_rank2(engine);
}
