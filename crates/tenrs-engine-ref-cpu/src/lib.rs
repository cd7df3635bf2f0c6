//! Reference CPU engine for tenrs.
//!
//! Eager, allocation-happy, and deliberately naive: this crate exists so
//! the dispatch layer has something concrete to execute against in tests
//! and demos. Anything outside the contract's reference scope fails with
//! an explicit error instead of guessing.

pub mod cpu;

pub use cpu::{CpuEngine, CpuTensor, TensorData};
