//! Matrix multiply dispatch. Both transpose flags stay false and the
//! descriptor requests default compute precision and operand format.

use std::sync::Arc;

use crate::engine::spec::{Engine, MatMulSpec, Operation};
use crate::error::OpResult;
use crate::tensor::Tensor;

use super::convert::{self, TensorArg};

pub(crate) fn matmul<E: Engine + 'static>(
    engine: &Arc<E>,
    lhs: TensorArg<'_, E>,
    rhs: TensorArg<'_, E>,
) -> OpResult<E::Handle> {
    let handles = convert::convert_inputs(engine, &[lhs, rhs])?;
    let op = Operation::MatMul(MatMulSpec::default());
    convert::single(engine.apply(&op, &handles)?, "matmul")
}

impl<E: Engine + 'static> Tensor<E> {
    pub fn try_matmul<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> OpResult<Tensor<E>> {
        let handle = matmul(self.engine_ref(), TensorArg::Tensor(self), rhs.into())?;
        Ok(self.adopt(handle))
    }

    pub fn matmul<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> Tensor<E> {
        super::arith::unwrap_op(self.try_matmul(rhs), "matmul")
    }

    /// Reflected matrix multiply: operand order swapped.
    pub fn try_rmatmul<'a>(&self, lhs: impl Into<TensorArg<'a, E>>) -> OpResult<Tensor<E>> {
        let handle = matmul(self.engine_ref(), lhs.into(), TensorArg::Tensor(self))?;
        Ok(self.adopt(handle))
    }

    pub fn rmatmul<'a>(&self, lhs: impl Into<TensorArg<'a, E>>) -> Tensor<E> {
        super::arith::unwrap_op(self.try_rmatmul(lhs), "rmatmul")
    }

    /// In-place matrix multiply: the non-mutating product replaces the
    /// wrapper's reference.
    pub fn try_matmul_assign<'a>(&mut self, rhs: impl Into<TensorArg<'a, E>>) -> OpResult<()> {
        let result = self.try_matmul(rhs)?;
        self.rebind(result)
    }

    pub fn matmul_assign<'a>(&mut self, rhs: impl Into<TensorArg<'a, E>>) {
        super::arith::unwrap_op(self.try_matmul_assign(rhs), "matmul_assign");
    }
}
