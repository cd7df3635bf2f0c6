//! Rendering of tensors honors the print configuration.

use std::sync::Arc;

use tenrs::engine::spec::Literal;
use tenrs::tensor::{HostTensor, Shape, Tensor};
use tenrs_engine_ref_cpu::CpuEngine;

#[test]
fn display_formats_values_with_env_configured_limits() {
    // Print settings are read once per process; set them before the first
    // tensor is rendered. This file holds a single test for that reason.
    std::env::set_var("TENRS_PRINT_LIMIT", "4");
    std::env::set_var("TENRS_PRINT_PRECISION", "2");

    let engine = Arc::new(CpuEngine::new());

    let host = HostTensor::from_vec(
        Shape::new(vec![6]),
        vec![1.0, 2.5, 3.0, 4.0, 5.0, 6.0],
    )
    .unwrap();
    let x = Tensor::from_host(Arc::clone(&engine), &host).unwrap();
    assert_eq!(
        x.to_string(),
        "Tensor([1.00 2.50 3.00 4.00 ...], device=cpu)"
    );

    let ints = HostTensor::from_i32(Shape::new(vec![2]), vec![1, 2]).unwrap();
    let ints = Tensor::from_host(Arc::clone(&engine), &ints).unwrap();
    assert_eq!(ints.to_string(), "Tensor([1 2], dtype=i32, device=cpu)");

    let scalar =
        Tensor::from_host(Arc::clone(&engine), &HostTensor::scalar(Literal::Float(1.5))).unwrap();
    assert_eq!(scalar.to_string(), "Tensor(1.50, device=cpu)");

    let debug = format!("{x:?}");
    assert!(debug.contains("ref-cpu"), "debug output: {debug}");
}
