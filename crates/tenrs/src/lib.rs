//! tenrs: the operator-overloading and dispatch layer of an engine-backed
//! tensor abstraction.
//!
//! Rust-level arithmetic, comparison, indexing, and shape syntax on
//! [`Tensor`] resolves through static dispatch tables into single
//! primitive-operation descriptors executed by an opaque [`Engine`]. The
//! wrapper holds one rebindable reference to the engine's tensor
//! representation, which is how in-place operators work without mutating
//! primitive tensors.

pub mod engine;
mod env;
pub mod error;
pub mod ops;
pub mod tensor;

pub use engine::spec::{
    ComputeMode, ConstantSpec, DType, Device, ElemwiseMode, ElemwiseSpec, Engine, EngineError,
    EngineResult, IndexItem, IndexSpec, Literal, MatMulFormat, MatMulSpec, Operation, ReduceMode,
    ReduceSpec, ReshapeSpec, TensorInit, TensorLiteral, TensorSpec, TransposeSpec, TypeCvtSpec,
};
pub use error::{OpError, OpResult};
pub use ops::{as_raw_tensor, Rows, ShapeTarget, TensorArg};
pub use tensor::{HostTensor, Shape, Tensor, TensorSource};
