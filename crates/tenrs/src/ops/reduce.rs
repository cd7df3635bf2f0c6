//! Reductions. The axis-less form flattens to rank 1 and reduces over
//! axis 0; there is no reduce-over-all-axes primitive.

use std::sync::Arc;

use crate::engine::spec::{Engine, Operation, ReduceMode, ReduceSpec};
use crate::error::OpResult;
use crate::tensor::Tensor;

use super::convert;

pub(crate) fn reduce<E: Engine + 'static>(
    engine: &Arc<E>,
    input: &E::Handle,
    mode: ReduceMode,
    axis: Option<usize>,
) -> OpResult<E::Handle> {
    let (input, axis) = match axis {
        Some(axis) => (input.clone(), axis),
        None => (super::shape::reshape(engine, input, &[-1])?, 0),
    };
    let op = Operation::Reduce(ReduceSpec { mode, axis });
    convert::single(engine.apply(&op, &[input])?, "reduce")
}

impl<E: Engine + 'static> Tensor<E> {
    fn reduce_with(&self, mode: ReduceMode, axis: Option<usize>) -> OpResult<Tensor<E>> {
        let handle = reduce(self.engine_ref(), self.raw(), mode, axis)?;
        Ok(self.adopt(handle))
    }

    pub fn try_sum(&self, axis: Option<usize>) -> OpResult<Tensor<E>> {
        self.reduce_with(ReduceMode::Sum, axis)
    }

    pub fn sum(&self, axis: Option<usize>) -> Tensor<E> {
        super::arith::unwrap_op(self.try_sum(axis), "sum")
    }

    pub fn try_prod(&self, axis: Option<usize>) -> OpResult<Tensor<E>> {
        self.reduce_with(ReduceMode::Product, axis)
    }

    pub fn prod(&self, axis: Option<usize>) -> Tensor<E> {
        super::arith::unwrap_op(self.try_prod(axis), "prod")
    }

    pub fn try_min(&self, axis: Option<usize>) -> OpResult<Tensor<E>> {
        self.reduce_with(ReduceMode::Min, axis)
    }

    pub fn min(&self, axis: Option<usize>) -> Tensor<E> {
        super::arith::unwrap_op(self.try_min(axis), "min")
    }

    pub fn try_max(&self, axis: Option<usize>) -> OpResult<Tensor<E>> {
        self.reduce_with(ReduceMode::Max, axis)
    }

    pub fn max(&self, axis: Option<usize>) -> Tensor<E> {
        super::arith::unwrap_op(self.try_max(axis), "max")
    }

    pub fn try_mean(&self, axis: Option<usize>) -> OpResult<Tensor<E>> {
        self.reduce_with(ReduceMode::Mean, axis)
    }

    pub fn mean(&self, axis: Option<usize>) -> Tensor<E> {
        super::arith::unwrap_op(self.try_mean(axis), "mean")
    }
}
