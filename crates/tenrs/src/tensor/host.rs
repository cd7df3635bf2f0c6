//! Host-backed tensor payloads used for construction, readback, and tests.

use std::mem::{size_of, ManuallyDrop};
use std::sync::Arc;

use rand::Rng;

use crate::engine::spec::{DType, Literal, TensorLiteral, TensorSpec};
use crate::error::{OpError, OpResult};

use super::shape::Shape;

/// Simple host-backed tensor used as the raw-data side of wrapper
/// construction and as the readback target of `to_host`.
#[derive(Debug, Clone)]
pub struct HostTensor {
    shape: Shape,
    dtype: DType,
    data: Vec<u8>,
}

impl HostTensor {
    /// Constructs an `F32` tensor from raw values, validating the length
    /// against the shape.
    pub fn from_vec(shape: Shape, data: Vec<f32>) -> OpResult<Self> {
        check_len(&shape, data.len())?;
        Ok(HostTensor {
            shape,
            dtype: DType::F32,
            data: vec_into_bytes(data),
        })
    }

    /// Constructs an `I32` tensor, ensuring the payload matches the
    /// expected element count.
    pub fn from_i32(shape: Shape, data: Vec<i32>) -> OpResult<Self> {
        check_len(&shape, data.len())?;
        Ok(HostTensor {
            shape,
            dtype: DType::I32,
            data: vec_into_bytes(data),
        })
    }

    /// Constructs a `Bool` tensor stored as one byte per element.
    pub fn from_bool(shape: Shape, data: Vec<bool>) -> OpResult<Self> {
        check_len(&shape, data.len())?;
        Ok(HostTensor {
            shape,
            dtype: DType::Bool,
            data: data.into_iter().map(u8::from).collect(),
        })
    }

    /// Wraps a scalar literal as a rank-0 tensor.
    pub fn scalar(value: Literal) -> Self {
        let shape = Shape::scalar();
        match value {
            Literal::Bool(v) => HostTensor {
                shape,
                dtype: DType::Bool,
                data: vec![u8::from(v)],
            },
            Literal::Int(v) => HostTensor {
                shape,
                dtype: DType::I32,
                data: vec_into_bytes(vec![v as i32]),
            },
            Literal::Float(v) => HostTensor {
                shape,
                dtype: DType::F32,
                data: vec_into_bytes(vec![v as f32]),
            },
        }
    }

    /// Returns a zero-initialized `F32` tensor of the requested shape.
    pub fn zeros(shape: Shape) -> Self {
        let len = shape.num_elements();
        HostTensor {
            shape,
            dtype: DType::F32,
            data: vec_into_bytes(vec![0.0f32; len]),
        }
    }

    /// Returns a one-initialized `F32` tensor of the requested shape.
    pub fn ones(shape: Shape) -> Self {
        let len = shape.num_elements();
        HostTensor {
            shape,
            dtype: DType::F32,
            data: vec_into_bytes(vec![1.0f32; len]),
        }
    }

    /// Samples from `N(0, std^2)` using the Box-Muller transform.
    pub fn randn(shape: Shape, std: f32, rng: &mut impl Rng) -> Self {
        let len = shape.num_elements();
        let mut values = Vec::with_capacity(len);
        while values.len() < len {
            let u1: f32 = rng.gen::<f32>().max(f32::MIN_POSITIVE);
            let u2: f32 = rng.gen::<f32>();
            let r = (-2.0 * u1.ln()).sqrt();
            let theta = 2.0 * std::f32::consts::PI * u2;
            values.push(r * theta.cos() * std);
            if values.len() < len {
                values.push(r * theta.sin() * std);
            }
        }
        HostTensor {
            shape,
            dtype: DType::F32,
            data: vec_into_bytes(values),
        }
    }

    /// Returns the total number of elements stored in the tensor.
    pub fn len(&self) -> usize {
        self.shape.num_elements()
    }

    /// Reports whether the tensor contains zero elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Provides access to the tensor shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the scalar dtype of the tensor payload.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Borrows the underlying `f32` data slice, panicking if the dtype
    /// differs.
    pub fn data(&self) -> &[f32] {
        match self.dtype {
            DType::F32 => bytes_as_slice::<f32>(&self.data),
            _ => panic!("tensor data is not stored as f32"),
        }
    }

    /// Borrows the underlying `i32` data slice, panicking if the dtype
    /// differs.
    pub fn data_i32(&self) -> &[i32] {
        match self.dtype {
            DType::I32 => bytes_as_slice::<i32>(&self.data),
            _ => panic!("tensor data is not stored as i32"),
        }
    }

    /// Borrows the underlying bool bytes, panicking if the dtype differs.
    pub fn data_bool(&self) -> &[u8] {
        match self.dtype {
            DType::Bool => &self.data,
            _ => panic!("tensor data is not stored as bool"),
        }
    }

    /// Reads a single element in row-major order as a scalar literal.
    pub fn element(&self, index: usize) -> Literal {
        assert!(index < self.len(), "element index {index} out of range");
        match self.dtype {
            DType::Bool => Literal::Bool(self.data[index] != 0),
            DType::I32 => Literal::Int(bytes_as_slice::<i32>(&self.data)[index] as i64),
            DType::F32 => Literal::Float(bytes_as_slice::<f32>(&self.data)[index] as f64),
        }
    }

    /// Converts the payload to another dtype on the host side. Float to
    /// int truncates toward zero; conversions to bool are "non-zero".
    pub fn astype(&self, dtype: DType) -> HostTensor {
        if dtype == self.dtype {
            return self.clone();
        }
        let literals: Vec<Literal> = (0..self.len()).map(|i| self.element(i)).collect();
        let shape = self.shape.clone();
        match dtype {
            DType::Bool => HostTensor {
                shape,
                dtype,
                data: literals.iter().map(|l| u8::from(l.to_bool())).collect(),
            },
            DType::I32 => HostTensor {
                shape,
                dtype,
                data: vec_into_bytes(literals.iter().map(|l| l.to_int() as i32).collect()),
            },
            DType::F32 => HostTensor {
                shape,
                dtype,
                data: vec_into_bytes(literals.iter().map(|l| l.to_float() as f32).collect()),
            },
        }
    }

    /// Wraps the tensor in an engine-neutral literal for materialization.
    pub fn to_literal(&self) -> TensorLiteral {
        let spec = TensorSpec::new(self.dtype, self.shape.clone());
        TensorLiteral::new(spec, Arc::from(self.data.clone().into_boxed_slice()))
    }

    /// Reconstructs a host tensor from an engine literal.
    pub fn from_literal(literal: &TensorLiteral) -> OpResult<Self> {
        let expected = literal.spec.byte_len();
        if literal.bytes.len() != expected {
            return Err(OpError::InvalidPayload {
                reason: format!(
                    "literal byte length {} does not match expected {}",
                    literal.bytes.len(),
                    expected
                ),
            });
        }
        Ok(HostTensor {
            shape: literal.spec.shape.clone(),
            dtype: literal.spec.dtype,
            data: literal.bytes.as_ref().to_vec(),
        })
    }
}

fn check_len(shape: &Shape, len: usize) -> OpResult<()> {
    if len != shape.num_elements() {
        return Err(OpError::InvalidPayload {
            reason: format!(
                "data length ({}) does not match shape {:?}",
                len,
                shape.dims()
            ),
        });
    }
    Ok(())
}

/// Converts an owned vector into a raw byte buffer without copying.
fn vec_into_bytes<T>(data: Vec<T>) -> Vec<u8> {
    let mut data = ManuallyDrop::new(data);
    let ptr = data.as_mut_ptr() as *mut u8;
    let len = data.len() * size_of::<T>();
    let cap = data.capacity() * size_of::<T>();
    unsafe { Vec::from_raw_parts(ptr, len, cap) }
}

/// Views a byte slice as a typed slice, asserting that the layout matches.
fn bytes_as_slice<T>(bytes: &[u8]) -> &[T] {
    assert_eq!(
        bytes.len() % size_of::<T>(),
        0,
        "byte length {} is not a multiple of element size {}",
        bytes.len(),
        size_of::<T>()
    );
    unsafe { std::slice::from_raw_parts(bytes.as_ptr() as *const T, bytes.len() / size_of::<T>()) }
}
