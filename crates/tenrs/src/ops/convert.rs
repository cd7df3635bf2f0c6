//! Operand normalization at the dispatch boundary.
//!
//! Heterogeneous operands (wrapped tensors, host payloads, scalars) are
//! resolved once, here, into uniform primitive-tensor handles before any
//! `apply` call. No other module inspects operand kinds at runtime.

use std::sync::Arc;

use crate::engine::spec::{
    ConstantSpec, DType, Device, Engine, Literal, Operation, TensorInit, TensorLiteral,
    TypeCvtSpec,
};
use crate::error::{OpError, OpResult};
use crate::tensor::{HostTensor, Shape, Tensor};

/// One positional operand of a dispatched operation.
pub enum TensorArg<'a, E: Engine + 'static> {
    Tensor(&'a Tensor<E>),
    Host(&'a HostTensor),
    Scalar(Literal),
}

impl<'a, E: Engine + 'static> From<&'a Tensor<E>> for TensorArg<'a, E> {
    fn from(tensor: &'a Tensor<E>) -> Self {
        TensorArg::Tensor(tensor)
    }
}

impl<'a, E: Engine + 'static> From<&'a HostTensor> for TensorArg<'a, E> {
    fn from(host: &'a HostTensor) -> Self {
        TensorArg::Host(host)
    }
}

impl<E: Engine + 'static> From<Literal> for TensorArg<'_, E> {
    fn from(literal: Literal) -> Self {
        TensorArg::Scalar(literal)
    }
}

impl<E: Engine + 'static> From<f64> for TensorArg<'_, E> {
    fn from(value: f64) -> Self {
        TensorArg::Scalar(Literal::Float(value))
    }
}

impl<E: Engine + 'static> From<f32> for TensorArg<'_, E> {
    fn from(value: f32) -> Self {
        TensorArg::Scalar(Literal::Float(value as f64))
    }
}

impl<E: Engine + 'static> From<i64> for TensorArg<'_, E> {
    fn from(value: i64) -> Self {
        TensorArg::Scalar(Literal::Int(value))
    }
}

impl<E: Engine + 'static> From<i32> for TensorArg<'_, E> {
    fn from(value: i32) -> Self {
        TensorArg::Scalar(Literal::Int(value as i64))
    }
}

impl<E: Engine + 'static> From<bool> for TensorArg<'_, E> {
    fn from(value: bool) -> Self {
        TensorArg::Scalar(Literal::Bool(value))
    }
}

impl<E: Engine + 'static> TensorArg<'_, E> {
    fn dtype(&self) -> DType {
        match self {
            TensorArg::Tensor(tensor) => tensor.dtype(),
            TensorArg::Host(host) => host.dtype(),
            TensorArg::Scalar(literal) => literal.dtype(),
        }
    }
}

/// Verifies that a wrapped operand is bound to the dispatching engine
/// instance.
pub(crate) fn ensure_same_engine<E: Engine + 'static>(
    engine: &Arc<E>,
    tensor: &Tensor<E>,
) -> OpResult<()> {
    if !Arc::ptr_eq(engine, tensor.engine_ref()) {
        return Err(OpError::IdentityMismatch {
            expected: engine.engine_name().to_string(),
            found: tensor.engine_ref().engine_name().to_string(),
        });
    }
    Ok(())
}

/// Enforces the exactly-one-result postcondition on an `apply` outcome.
pub(crate) fn single<H>(outputs: Vec<H>, op: &'static str) -> OpResult<H> {
    let got = outputs.len();
    if got != 1 {
        return Err(OpError::ResultArity { op, got });
    }
    let mut outputs = outputs;
    Ok(outputs.pop().expect("length checked above"))
}

/// Applies `TypeCvt` to a single handle.
pub(crate) fn cast<E: Engine + 'static>(
    engine: &Arc<E>,
    handle: &E::Handle,
    dtype: DType,
) -> OpResult<E::Handle> {
    let op = Operation::TypeCvt(TypeCvtSpec { dtype });
    single(engine.apply(&op, &[handle.clone()])?, "typecvt")
}

/// Normalizes positional operands into primitive-tensor handles.
///
/// Wrapped tensors pass their current reference through (no copy); host
/// payloads and scalars materialize on the first tensor operand's device.
/// If any operand is floating point, integer operands are promoted to F32
/// so the elementwise primitive sees a uniform dtype. Bool operands never
/// promote implicitly.
pub(crate) fn convert_inputs<E: Engine + 'static>(
    engine: &Arc<E>,
    args: &[TensorArg<'_, E>],
) -> OpResult<Vec<E::Handle>> {
    let mut device = Device::Cpu;
    let mut promote = false;
    for arg in args {
        if let TensorArg::Tensor(tensor) = arg {
            ensure_same_engine(engine, tensor)?;
        }
        promote |= arg.dtype().is_float();
    }
    if let Some(TensorArg::Tensor(tensor)) =
        args.iter().find(|arg| matches!(arg, TensorArg::Tensor(_)))
    {
        device = tensor.device();
    }

    let mut handles = Vec::with_capacity(args.len());
    for arg in args {
        let handle = match arg {
            TensorArg::Tensor(tensor) => {
                let handle = tensor.raw().as_ref().clone();
                if promote && tensor.dtype().is_integer() {
                    cast(engine, &handle, DType::F32)?
                } else {
                    handle
                }
            }
            TensorArg::Host(host) => {
                let host = if promote && host.dtype().is_integer() {
                    host.astype(DType::F32)
                } else {
                    (*host).clone()
                };
                engine.materialize(TensorInit::Literal(host.to_literal()), device)?
            }
            TensorArg::Scalar(literal) => {
                let literal = match literal {
                    Literal::Int(value) if promote => Literal::Float(*value as f64),
                    other => *other,
                };
                let host = HostTensor::scalar(literal);
                engine.materialize(TensorInit::Literal(host.to_literal()), device)?
            }
        };
        handles.push(handle);
    }
    Ok(handles)
}

/// Materializes a fresh primitive tensor from host data.
///
/// This is the single wrapper-construction funnel: passing no data at all
/// fails loudly rather than producing an unbound wrapper.
pub fn as_raw_tensor<E: Engine + 'static>(
    engine: &Arc<E>,
    data: Option<&HostTensor>,
    dtype: Option<DType>,
    device: Option<Device>,
) -> OpResult<E::Handle> {
    let host = data.ok_or_else(|| OpError::InvalidPayload {
        reason: "no data given for tensor construction".to_string(),
    })?;
    let host = match dtype {
        Some(dtype) if dtype != host.dtype() => host.astype(dtype),
        _ => host.clone(),
    };
    let device = device.unwrap_or(Device::Cpu);
    Ok(engine.materialize(TensorInit::Literal(host.to_literal()), device)?)
}

/// Embeds a fixed payload as a constant on the given device.
pub(crate) fn constant<E: Engine + 'static>(
    engine: &Arc<E>,
    literal: TensorLiteral,
    device: Device,
) -> OpResult<E::Handle> {
    let op = Operation::Constant(ConstantSpec { literal, device });
    single(engine.apply(&op, &[])?, "constant")
}

/// Embeds a rank-1 I32 tensor holding `values` on `device` (shape
/// arguments for reshape and broadcast).
pub(crate) fn astensor1d<E: Engine + 'static>(
    engine: &Arc<E>,
    values: &[i64],
    device: Device,
) -> OpResult<E::Handle> {
    let host = HostTensor::from_i32(
        Shape::new(vec![values.len()]),
        values.iter().map(|&value| value as i32).collect(),
    )?;
    constant(engine, host.to_literal(), device)
}
