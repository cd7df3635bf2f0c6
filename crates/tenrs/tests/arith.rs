//! Value-level behavior of the arithmetic operator surface.

use std::sync::Arc;

use tenrs::engine::spec::DType;
use tenrs::tensor::{HostTensor, Shape, Tensor};
use tenrs_engine_ref_cpu::CpuEngine;

fn engine() -> Arc<CpuEngine> {
    Arc::new(CpuEngine::new())
}

fn floats(engine: &Arc<CpuEngine>, values: &[f32]) -> Tensor<CpuEngine> {
    let host = HostTensor::from_vec(Shape::new(vec![values.len()]), values.to_vec()).unwrap();
    Tensor::from_host(Arc::clone(engine), &host).unwrap()
}

fn ints(engine: &Arc<CpuEngine>, values: &[i32]) -> Tensor<CpuEngine> {
    let host = HostTensor::from_i32(Shape::new(vec![values.len()]), values.to_vec()).unwrap();
    Tensor::from_host(Arc::clone(engine), &host).unwrap()
}

fn data(tensor: &Tensor<CpuEngine>) -> Vec<f32> {
    tensor.to_host().unwrap().data().to_vec()
}

#[test]
fn elementwise_binary_operators() {
    let engine = engine();
    let x = floats(&engine, &[1.0, 2.0, 3.0]);
    let y = floats(&engine, &[4.0, 5.0, 6.0]);

    assert_eq!(data(&(&x + &y)), vec![5.0, 7.0, 9.0]);
    assert_eq!(data(&(&x - &y)), vec![-3.0, -3.0, -3.0]);
    assert_eq!(data(&(&x * &y)), vec![4.0, 10.0, 18.0]);
    assert_eq!(data(&(&y / &x)), vec![4.0, 2.5, 2.0]);
}

#[test]
fn scalar_operands_work_on_both_sides() {
    let engine = engine();
    let x = floats(&engine, &[1.0, 2.0, 3.0]);

    assert_eq!(data(&(&x + 1.0)), vec![2.0, 3.0, 4.0]);
    assert_eq!(data(&(10.0 - &x)), vec![9.0, 8.0, 7.0]);
    assert_eq!(data(&(6.0 / &x)), vec![6.0, 3.0, 2.0]);
    assert_eq!(data(&(&x * 2)), vec![2.0, 4.0, 6.0]);
}

#[test]
fn remainder_and_floor_division_follow_python_sign_rules() {
    let engine = engine();
    let x = floats(&engine, &[5.5, -5.5]);
    let m = data(&(&x % 2.0));
    assert!((m[0] - 1.5).abs() < 1e-6);
    assert!((m[1] - 0.5).abs() < 1e-6);

    let ints_pos = ints(&engine, &[7, -7]);
    let divided = ints_pos.try_floor_div(2).unwrap();
    assert_eq!(divided.to_host().unwrap().data_i32(), &[3, -4]);
    let remainder = &ints_pos % -2;
    assert_eq!(remainder.to_host().unwrap().data_i32(), &[-1, -1]);
}

#[test]
fn power_and_its_reflected_form() {
    let engine = engine();
    let x = floats(&engine, &[1.0, 2.0, 3.0]);

    assert_eq!(data(&x.try_pow(2.0).unwrap()), vec![1.0, 4.0, 9.0]);
    assert_eq!(data(&x.try_rpow(2.0).unwrap()), vec![2.0, 4.0, 8.0]);
}

#[test]
fn shifts_operate_on_integers() {
    let engine = engine();
    let x = ints(&engine, &[1, 2, 3]);

    let left = &x << 2;
    assert_eq!(left.to_host().unwrap().data_i32(), &[4, 8, 12]);
    let right = &left >> 1;
    assert_eq!(right.to_host().unwrap().data_i32(), &[2, 4, 6]);
    assert!(floats(&engine, &[1.0]).try_shl(1).is_err());
}

#[test]
fn unary_operators() {
    let engine = engine();
    let x = floats(&engine, &[1.5, -2.5]);

    assert_eq!(data(&(-&x)), vec![-1.5, 2.5]);
    assert_eq!(data(&x.try_abs().unwrap()), vec![1.5, 2.5]);
    assert_eq!(data(&x.try_floor().unwrap()), vec![1.0, -3.0]);
    assert_eq!(data(&x.try_ceil().unwrap()), vec![2.0, -2.0]);
    // Rounding is ties-to-even.
    let halves = floats(&engine, &[2.5, 3.5]);
    assert_eq!(data(&halves.try_round().unwrap()), vec![2.0, 4.0]);
}

#[test]
fn matmul_contracts_rank_two_operands() -> anyhow::Result<()> {
    let engine = engine();
    let a = floats(&engine, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).try_reshape([2, 3])?;
    let b = floats(&engine, &[7.0, 8.0, 9.0, 10.0, 11.0, 12.0]).try_reshape([3, 2])?;

    let product = a.try_matmul(&b)?;
    assert_eq!(product.shape().dims(), &[2, 2]);
    assert_eq!(data(&product), vec![58.0, 64.0, 139.0, 154.0]);

    let reflected = b.try_rmatmul(&a)?;
    assert_eq!(data(&reflected), data(&product));
    Ok(())
}

#[test]
fn inplace_matmul_and_pow_rebind_the_wrapper() {
    let engine = engine();
    let mut a = floats(&engine, &[1.0, 2.0, 3.0, 4.0])
        .try_reshape([2, 2])
        .unwrap();
    let b = floats(&engine, &[0.0, 1.0, 1.0, 0.0])
        .try_reshape([2, 2])
        .unwrap();

    a.try_matmul_assign(&b).unwrap();
    assert_eq!(data(&a), vec![2.0, 1.0, 4.0, 3.0]);

    let mut x = floats(&engine, &[2.0, 3.0]);
    x.try_pow_assign(2.0).unwrap();
    assert_eq!(data(&x), vec![4.0, 9.0]);
}

#[test]
fn assign_operators_cover_scalars_and_tensors() {
    let engine = engine();
    let mut x = floats(&engine, &[1.0, 2.0]);
    x *= 3.0;
    assert_eq!(data(&x), vec![3.0, 6.0]);
    x -= &floats(&engine, &[1.0, 1.0]);
    assert_eq!(data(&x), vec![2.0, 5.0]);
    x /= 2.0;
    assert_eq!(data(&x), vec![1.0, 2.5]);

    let mut n = ints(&engine, &[8, 16]);
    n >>= 3;
    assert_eq!(n.to_host().unwrap().data_i32(), &[1, 2]);
}

#[test]
fn int_division_promotes_to_float() {
    let engine = engine();
    let x = ints(&engine, &[7, 8]);
    let halved = x.try_div(2).unwrap();
    assert_eq!(halved.dtype(), DType::F32);
    assert_eq!(data(&halved), vec![3.5, 4.0]);
}

#[test]
fn reductions_compute_expected_values() {
    let engine = engine();
    let x = floats(&engine, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
        .try_reshape([2, 3])
        .unwrap();

    assert_eq!(x.try_sum(None).unwrap().to_float().unwrap(), 21.0);
    assert_eq!(x.try_prod(None).unwrap().to_float().unwrap(), 720.0);
    assert_eq!(x.try_min(None).unwrap().to_float().unwrap(), 1.0);
    assert_eq!(x.try_max(None).unwrap().to_float().unwrap(), 6.0);
    assert_eq!(x.try_mean(None).unwrap().to_float().unwrap(), 3.5);

    let by_row = x.try_sum(Some(1)).unwrap();
    assert_eq!(by_row.shape().dims(), &[2]);
    assert_eq!(data(&by_row), vec![6.0, 15.0]);
}
