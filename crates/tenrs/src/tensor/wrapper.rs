//! User-facing tensor wrapper with a rebindable engine reference.

use std::fmt;
use std::sync::Arc;

use num_complex::Complex64;

use crate::engine::spec::{DType, Device, Engine, Literal, TensorSpec};
use crate::env;
use crate::error::{OpError, OpResult};
use crate::ops::convert;

use super::host::HostTensor;
use super::shape::Shape;

/// A tensor handle that forwards metadata queries to its engine and owns
/// exactly one primitive-tensor reference at a time.
///
/// Non-mutating operators return a fresh wrapper; in-place operators
/// compute the non-mutating result and then [`Tensor::rebind`] the
/// reference, so observers of `dtype`/`shape`/`device`/`to_host` never see
/// a half-updated wrapper.
pub struct Tensor<E: Engine + 'static> {
    engine: Arc<E>,
    raw: Arc<E::Handle>,
}

impl<E: Engine + 'static> Clone for Tensor<E> {
    fn clone(&self) -> Self {
        Tensor {
            engine: Arc::clone(&self.engine),
            raw: Arc::clone(&self.raw),
        }
    }
}

/// Replacement value accepted by [`Tensor::rebind`].
pub enum TensorSource<E: Engine + 'static> {
    /// Adopt another wrapper's reference (shared, no copy).
    Wrapper(Tensor<E>),
    /// Adopt a primitive tensor directly.
    Raw(E::Handle),
    /// Re-materialize host data with the wrapper's current dtype and device.
    Host(HostTensor),
}

impl<E: Engine + 'static> From<Tensor<E>> for TensorSource<E> {
    fn from(tensor: Tensor<E>) -> Self {
        TensorSource::Wrapper(tensor)
    }
}

impl<E: Engine + 'static> From<&Tensor<E>> for TensorSource<E> {
    fn from(tensor: &Tensor<E>) -> Self {
        TensorSource::Wrapper(tensor.clone())
    }
}

impl<E: Engine + 'static> From<HostTensor> for TensorSource<E> {
    fn from(host: HostTensor) -> Self {
        TensorSource::Host(host)
    }
}

impl<E: Engine + 'static> Tensor<E> {
    /// Materializes a brand-new underlying tensor from host data.
    ///
    /// `None` data is a hard error: there is no unbound wrapper state.
    pub fn new(
        engine: Arc<E>,
        data: Option<&HostTensor>,
        dtype: Option<DType>,
        device: Option<Device>,
    ) -> OpResult<Self> {
        let handle = convert::as_raw_tensor(&engine, data, dtype, device)?;
        Ok(Self::from_raw(engine, handle))
    }

    /// Wraps host data with default dtype and device.
    pub fn from_host(engine: Arc<E>, host: &HostTensor) -> OpResult<Self> {
        Self::new(engine, Some(host), None, None)
    }

    /// Wraps an existing primitive tensor.
    pub fn from_raw(engine: Arc<E>, handle: E::Handle) -> Self {
        Tensor {
            engine,
            raw: Arc::new(handle),
        }
    }

    /// Returns the engine instance the tensor is bound to.
    pub fn engine(&self) -> Arc<E> {
        Arc::clone(&self.engine)
    }

    pub(crate) fn engine_ref(&self) -> &Arc<E> {
        &self.engine
    }

    /// Borrows the underlying primitive-tensor reference.
    pub fn raw(&self) -> &Arc<E::Handle> {
        &self.raw
    }

    /// Wraps an operation result produced on this tensor's engine.
    pub(crate) fn adopt(&self, handle: E::Handle) -> Tensor<E> {
        Tensor::from_raw(Arc::clone(&self.engine), handle)
    }

    /// Atomically replaces the owned reference. This is the sole state
    /// transition of a wrapper and runs only after `source` has been fully
    /// resolved.
    pub fn rebind(&mut self, source: impl Into<TensorSource<E>>) -> OpResult<()> {
        match source.into() {
            TensorSource::Wrapper(other) => {
                if !Arc::ptr_eq(&self.engine, &other.engine) {
                    return Err(OpError::IdentityMismatch {
                        expected: self.engine.engine_name().to_string(),
                        found: other.engine.engine_name().to_string(),
                    });
                }
                self.raw = other.raw;
            }
            TensorSource::Raw(handle) => {
                self.raw = Arc::new(handle);
            }
            TensorSource::Host(host) => {
                let handle = convert::as_raw_tensor(
                    &self.engine,
                    Some(&host),
                    Some(self.dtype()),
                    Some(self.device()),
                )?;
                self.raw = Arc::new(handle);
            }
        }
        Ok(())
    }

    /// Dtype and shape of the underlying tensor.
    pub fn spec(&self) -> TensorSpec {
        self.engine.spec_of(&self.raw)
    }

    pub fn dtype(&self) -> DType {
        self.spec().dtype
    }

    pub fn shape(&self) -> Shape {
        self.spec().shape
    }

    pub fn device(&self) -> Device {
        self.engine.device_of(&self.raw)
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.shape().rank()
    }

    /// Total element count; the rank-0 shape holds one element.
    pub fn size(&self) -> usize {
        self.shape().num_elements()
    }

    /// Copies the underlying tensor back to the host.
    pub fn to_host(&self) -> OpResult<HostTensor> {
        let literal = self.engine.to_literal(&self.raw)?;
        HostTensor::from_literal(&literal)
    }

    /// Extracts the scalar value of a single-element tensor.
    pub fn item(&self) -> OpResult<Literal> {
        let size = self.size();
        if size != 1 {
            return Err(OpError::ScalarRequired { size });
        }
        Ok(self.to_host()?.element(0))
    }

    /// Truthiness of a single-element tensor.
    pub fn to_bool(&self) -> OpResult<bool> {
        Ok(self.item()?.to_bool())
    }

    /// Integer value of a single-element tensor; floats truncate toward
    /// zero.
    pub fn to_int(&self) -> OpResult<i64> {
        Ok(self.item()?.to_int())
    }

    pub fn to_float(&self) -> OpResult<f64> {
        Ok(self.item()?.to_float())
    }

    pub fn to_complex(&self) -> OpResult<Complex64> {
        Ok(self.item()?.to_complex())
    }

    /// Index value of a single-element tensor; unlike [`Tensor::to_int`]
    /// this requires an integer dtype.
    pub fn to_index(&self) -> OpResult<i64> {
        match self.item()? {
            Literal::Int(value) => Ok(value),
            _ => Err(OpError::TypeMismatch {
                op: "index",
                dtype: self.dtype(),
            }),
        }
    }

    /// Returns a tensor of the same values with another dtype.
    pub fn astype(&self, dtype: DType) -> OpResult<Tensor<E>> {
        let handle = convert::cast(&self.engine, &self.raw, dtype)?;
        Ok(self.adopt(handle))
    }

    /// Unary plus: the same logical value under a fresh wrapper.
    pub fn pos(&self) -> Tensor<E> {
        self.clone()
    }
}

impl<E: Engine + 'static> fmt::Debug for Tensor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spec = self.spec();
        f.debug_struct("Tensor")
            .field("engine", &self.engine.engine_name())
            .field("shape", &spec.shape.dims())
            .field("dtype", &spec.dtype)
            .field("device", &self.device())
            .finish()
    }
}

impl<E: Engine + 'static> fmt::Display for Tensor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor(")?;
        match self.to_host() {
            Ok(host) => write_values(f, &host)?,
            Err(_) => write!(f, "<unrealized>")?,
        }
        if self.dtype() != DType::F32 {
            write!(f, ", dtype={}", self.dtype())?;
        }
        write!(f, ", device={})", self.device())
    }
}

fn write_values(f: &mut fmt::Formatter<'_>, host: &HostTensor) -> fmt::Result {
    let limit = env::print_limit();
    let precision = env::print_precision();
    let count = host.len().min(limit);
    let scalar = host.shape().rank() == 0;
    if !scalar {
        write!(f, "[")?;
    }
    for index in 0..count {
        if index > 0 {
            write!(f, " ")?;
        }
        match host.element(index) {
            Literal::Bool(value) => write!(f, "{value}")?,
            Literal::Int(value) => write!(f, "{value}")?,
            Literal::Float(value) => write!(f, "{value:.precision$}")?,
        }
    }
    if host.len() > limit {
        write!(f, " ...")?;
    }
    if !scalar {
        write!(f, "]")?;
    }
    Ok(())
}

impl<E: Engine + 'static> TryFrom<&Tensor<E>> for f64 {
    type Error = OpError;

    fn try_from(tensor: &Tensor<E>) -> OpResult<f64> {
        tensor.to_float()
    }
}

impl<E: Engine + 'static> TryFrom<&Tensor<E>> for i64 {
    type Error = OpError;

    fn try_from(tensor: &Tensor<E>) -> OpResult<i64> {
        tensor.to_int()
    }
}

impl<E: Engine + 'static> TryFrom<&Tensor<E>> for bool {
    type Error = OpError;

    fn try_from(tensor: &Tensor<E>) -> OpResult<bool> {
        tensor.to_bool()
    }
}
