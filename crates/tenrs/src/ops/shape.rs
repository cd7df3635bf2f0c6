//! Shape coercion: reshape (with `-1` inference), broadcast, transpose.

use std::sync::Arc;

use crate::engine::spec::{Engine, Operation, ReshapeSpec, TransposeSpec};
use crate::error::{OpError, OpResult};
use crate::tensor::Tensor;

use super::convert;

/// A reshape/broadcast target: either concrete entries or a tensor-like
/// object materialized to them first.
pub enum ShapeTarget<'a, E: Engine + 'static> {
    Dims(Vec<isize>),
    Tensor(&'a Tensor<E>),
}

impl<E: Engine + 'static> From<Vec<isize>> for ShapeTarget<'_, E> {
    fn from(dims: Vec<isize>) -> Self {
        ShapeTarget::Dims(dims)
    }
}

impl<E: Engine + 'static> From<&[isize]> for ShapeTarget<'_, E> {
    fn from(dims: &[isize]) -> Self {
        ShapeTarget::Dims(dims.to_vec())
    }
}

impl<E: Engine + 'static, const N: usize> From<[isize; N]> for ShapeTarget<'_, E> {
    fn from(dims: [isize; N]) -> Self {
        ShapeTarget::Dims(dims.to_vec())
    }
}

impl<E: Engine + 'static, const N: usize> From<[i32; N]> for ShapeTarget<'_, E> {
    fn from(dims: [i32; N]) -> Self {
        ShapeTarget::Dims(dims.iter().map(|&value| value as isize).collect())
    }
}

impl<'a, E: Engine + 'static> From<&'a Tensor<E>> for ShapeTarget<'a, E> {
    fn from(tensor: &'a Tensor<E>) -> Self {
        ShapeTarget::Tensor(tensor)
    }
}

fn resolve_dims<E: Engine + 'static>(target: ShapeTarget<'_, E>) -> OpResult<Vec<isize>> {
    match target {
        ShapeTarget::Dims(dims) => Ok(dims),
        ShapeTarget::Tensor(tensor) => {
            let host = tensor.to_host()?;
            Ok((0..host.len())
                .map(|index| host.element(index).to_int() as isize)
                .collect())
        }
    }
}

/// Validates a reshape target: entries must be >= -1 and at most one entry
/// may be the inference marker. Returns the inferred axis, if any.
fn validate_reshape(dims: &[isize]) -> OpResult<Option<usize>> {
    let mut unspec_axis = None;
    for (index, &value) in dims.iter().enumerate() {
        if value < 0 {
            if value != -1 {
                return Err(OpError::InvalidShapeValue { index, value });
            }
            if let Some(first) = unspec_axis {
                return Err(OpError::MultipleInferredAxes {
                    first,
                    second: index,
                });
            }
            unspec_axis = Some(index);
        }
    }
    Ok(unspec_axis)
}

/// Reshapes through the engine: the validated target is embedded as an I32
/// constant on the input's device and a single `Reshape` is applied to
/// `[input, shape]`.
pub(crate) fn reshape<E: Engine + 'static>(
    engine: &Arc<E>,
    input: &E::Handle,
    dims: &[isize],
) -> OpResult<E::Handle> {
    let unspec_axis = validate_reshape(dims)?;
    let device = engine.device_of(input);
    let shape = convert::astensor1d(
        engine,
        &dims.iter().map(|&value| value as i64).collect::<Vec<_>>(),
        device,
    )?;
    let op = Operation::Reshape(ReshapeSpec { unspec_axis });
    convert::single(engine.apply(&op, &[input.clone(), shape])?, "reshape")
}

/// Broadcasts through the engine after materializing the target shape the
/// same way reshape does. Broadcast targets admit no negative entries.
pub(crate) fn broadcast_to<E: Engine + 'static>(
    engine: &Arc<E>,
    input: &E::Handle,
    dims: &[isize],
) -> OpResult<E::Handle> {
    for (index, &value) in dims.iter().enumerate() {
        if value < 0 {
            return Err(OpError::InvalidShapeValue { index, value });
        }
    }
    let device = engine.device_of(input);
    let shape = convert::astensor1d(
        engine,
        &dims.iter().map(|&value| value as i64).collect::<Vec<_>>(),
        device,
    )?;
    convert::single(
        engine.apply(&Operation::Broadcast, &[input.clone(), shape])?,
        "broadcast",
    )
}

/// Permutes axes, validating the permutation before `apply`.
pub(crate) fn transpose<E: Engine + 'static>(
    engine: &Arc<E>,
    input: &E::Handle,
    perm: &[usize],
) -> OpResult<E::Handle> {
    let rank = engine.spec_of(input).shape.rank();
    let mut seen = vec![false; rank];
    let mut valid = perm.len() == rank;
    for &axis in perm {
        if axis >= rank || seen[axis] {
            valid = false;
            break;
        }
        seen[axis] = true;
    }
    if !valid {
        return Err(OpError::InvalidAxisOrder {
            perm: perm.to_vec(),
            rank,
        });
    }
    let op = Operation::Transpose(TransposeSpec {
        perm: perm.to_vec(),
    });
    convert::single(engine.apply(&op, &[input.clone()])?, "transpose")
}

impl<E: Engine + 'static> Tensor<E> {
    /// Reshapes to `target`, which may contain one `-1` entry to infer.
    pub fn try_reshape<'a>(&self, target: impl Into<ShapeTarget<'a, E>>) -> OpResult<Tensor<E>> {
        let dims = resolve_dims(target.into())?;
        let handle = reshape(self.engine_ref(), self.raw(), &dims)?;
        Ok(self.adopt(handle))
    }

    pub fn reshape<'a>(&self, target: impl Into<ShapeTarget<'a, E>>) -> Tensor<E> {
        super::arith::unwrap_op(self.try_reshape(target), "reshape")
    }

    /// Collapses to rank 1.
    pub fn try_flatten(&self) -> OpResult<Tensor<E>> {
        self.try_reshape([-1])
    }

    pub fn flatten(&self) -> Tensor<E> {
        super::arith::unwrap_op(self.try_flatten(), "flatten")
    }

    /// Broadcasts to an explicit target shape.
    pub fn try_broadcast_to<'a>(
        &self,
        target: impl Into<ShapeTarget<'a, E>>,
    ) -> OpResult<Tensor<E>> {
        let dims = resolve_dims(target.into())?;
        let handle = broadcast_to(self.engine_ref(), self.raw(), &dims)?;
        Ok(self.adopt(handle))
    }

    pub fn broadcast_to<'a>(&self, target: impl Into<ShapeTarget<'a, E>>) -> Tensor<E> {
        super::arith::unwrap_op(self.try_broadcast_to(target), "broadcast_to")
    }

    /// Permutes axes according to `perm`.
    pub fn try_transpose(&self, perm: &[usize]) -> OpResult<Tensor<E>> {
        let handle = transpose(self.engine_ref(), self.raw(), perm)?;
        Ok(self.adopt(handle))
    }

    pub fn transpose(&self, perm: &[usize]) -> Tensor<E> {
        super::arith::unwrap_op(self.try_transpose(perm), "transpose")
    }

    /// Transpose with reversed axis order (the zero-argument form).
    pub fn try_t(&self) -> OpResult<Tensor<E>> {
        let perm: Vec<usize> = (0..self.ndim()).rev().collect();
        self.try_transpose(&perm)
    }

    pub fn t(&self) -> Tensor<E> {
        super::arith::unwrap_op(self.try_t(), "t")
    }
}
