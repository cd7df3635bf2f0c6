use thiserror::Error;

use crate::engine::spec::{DType, EngineError};

/// Failure modes of the dispatch layer. Every operation either fully
/// succeeds or surfaces one of these with no observable mutation; the
/// wrapper's reference is only replaced after the replacement value has
/// been fully computed.
#[derive(Debug, Error)]
pub enum OpError {
    #[error("expect shape[{index}] >= -1, got {value}")]
    InvalidShapeValue { index: usize, value: isize },

    #[error("multiple -1 in shape: {first} & {second}")]
    MultipleInferredAxes { first: usize, second: usize },

    #[error("{op} requires bool tensors, got {dtype}")]
    TypeMismatch { op: &'static str, dtype: DType },

    #[error("{op} is not implemented")]
    Unsupported { op: &'static str },

    #[error("cannot interpret a tensor of {size} elements as a scalar")]
    ScalarRequired { size: usize },

    #[error("len() of a rank-0 tensor")]
    ZeroRank,

    #[error("tensor is bound to a different engine instance ('{found}', expected '{expected}')")]
    IdentityMismatch { expected: String, found: String },

    #[error("invalid tensor payload: {reason}")]
    InvalidPayload { reason: String },

    #[error("axis order {perm:?} is not a permutation of 0..{rank}")]
    InvalidAxisOrder { perm: Vec<usize>, rank: usize },

    #[error("{op} produced {got} results, expected exactly 1")]
    ResultArity { op: &'static str, got: usize },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Convenience alias for results returned by dispatch routines.
pub type OpResult<T> = Result<T, OpError>;
