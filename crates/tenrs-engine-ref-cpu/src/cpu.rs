use std::sync::Arc;

use tenrs::engine::spec::{
    ConstantSpec, DType, Device, ElemwiseMode, Engine, EngineError, EngineResult, IndexItem,
    IndexSpec, MatMulSpec, Operation, ReduceMode, ReduceSpec, ReshapeSpec, TensorInit,
    TensorLiteral, TensorSpec, TransposeSpec, TypeCvtSpec,
};
use tenrs::tensor::Shape;

/// Dense host tensor carrying its own metadata.
#[derive(Clone)]
pub struct CpuTensor {
    pub spec: TensorSpec,
    pub data: TensorData,
}

#[derive(Clone)]
pub enum TensorData {
    F32(Arc<[f32]>),
    I32(Arc<[i32]>),
    Bool(Arc<[u8]>),
}

impl CpuTensor {
    fn dims(&self) -> &[usize] {
        self.spec.shape.dims()
    }
}

/// Eager reference engine: every `apply` materializes its result
/// immediately.
pub struct CpuEngine;

impl CpuEngine {
    pub fn new() -> Self {
        CpuEngine
    }
}

impl Default for CpuEngine {
    fn default() -> Self {
        CpuEngine::new()
    }
}

impl Engine for CpuEngine {
    type Handle = CpuTensor;

    fn engine_name(&self) -> &str {
        "ref-cpu"
    }

    fn materialize(&self, init: TensorInit, device: Device) -> EngineResult<CpuTensor> {
        ensure_cpu(device)?;
        match init {
            TensorInit::Literal(literal) => literal_to_tensor(&literal),
            TensorInit::Zeroed(spec) => zeroed_tensor(&spec),
        }
    }

    fn to_literal(&self, handle: &CpuTensor) -> EngineResult<TensorLiteral> {
        Ok(tensor_to_literal(handle))
    }

    fn spec_of(&self, handle: &CpuTensor) -> TensorSpec {
        handle.spec.clone()
    }

    fn device_of(&self, _handle: &CpuTensor) -> Device {
        Device::Cpu
    }

    fn apply(&self, op: &Operation, inputs: &[CpuTensor]) -> EngineResult<Vec<CpuTensor>> {
        let result = match op {
            Operation::Constant(spec) => op_constant(spec)?,
            Operation::Elemwise(spec) => op_elemwise(spec.mode, inputs)?,
            Operation::MatMul(spec) => op_matmul(spec, inputs)?,
            Operation::Reduce(spec) => op_reduce(spec, inputs)?,
            Operation::Reshape(spec) => op_reshape(spec, inputs)?,
            Operation::Broadcast => op_broadcast(inputs)?,
            Operation::Transpose(spec) => op_transpose(spec, inputs)?,
            Operation::TypeCvt(spec) => op_typecvt(spec, inputs)?,
        };
        Ok(vec![result])
    }

    fn index_read(&self, handle: &CpuTensor, index: &IndexSpec) -> EngineResult<CpuTensor> {
        let plan = IndexPlan::resolve(index, handle.dims())?;
        Ok(plan.read(handle))
    }

    fn index_write(
        &self,
        handle: &CpuTensor,
        index: &IndexSpec,
        value: &CpuTensor,
    ) -> EngineResult<CpuTensor> {
        let plan = IndexPlan::resolve(index, handle.dims())?;
        plan.write(handle, value)
    }
}

fn ensure_cpu(device: Device) -> EngineResult<()> {
    match device {
        Device::Cpu => Ok(()),
        other => Err(EngineError::unsupported(
            "materialize",
            format!("device {other} is not available on the reference engine"),
        )),
    }
}

fn literal_to_tensor(literal: &TensorLiteral) -> EngineResult<CpuTensor> {
    let expected = literal.spec.byte_len();
    if literal.bytes.len() != expected {
        return Err(EngineError::execution(format!(
            "literal byte length {} does not match expected {}",
            literal.bytes.len(),
            expected
        )));
    }
    let data = match literal.spec.dtype {
        DType::F32 => TensorData::F32(Arc::from(bytes_to_f32(&literal.bytes))),
        DType::I32 => TensorData::I32(Arc::from(bytes_to_i32(&literal.bytes))),
        DType::Bool => TensorData::Bool(Arc::from(literal.bytes.as_ref().to_vec())),
    };
    Ok(CpuTensor {
        spec: literal.spec.clone(),
        data,
    })
}

fn zeroed_tensor(spec: &TensorSpec) -> EngineResult<CpuTensor> {
    let count = spec.element_count();
    let data = match spec.dtype {
        DType::F32 => TensorData::F32(Arc::from(vec![0.0; count])),
        DType::I32 => TensorData::I32(Arc::from(vec![0; count])),
        DType::Bool => TensorData::Bool(Arc::from(vec![0; count])),
    };
    Ok(CpuTensor {
        spec: spec.clone(),
        data,
    })
}

fn tensor_to_literal(tensor: &CpuTensor) -> TensorLiteral {
    let bytes = match &tensor.data {
        TensorData::F32(values) => f32_to_bytes(values),
        TensorData::I32(values) => i32_to_bytes(values),
        TensorData::Bool(values) => Arc::clone(values),
    };
    TensorLiteral::new(tensor.spec.clone(), bytes)
}

fn op_constant(spec: &ConstantSpec) -> EngineResult<CpuTensor> {
    ensure_cpu(spec.device)?;
    literal_to_tensor(&spec.literal)
}

// ---- elementwise ----

fn op_elemwise(mode: ElemwiseMode, inputs: &[CpuTensor]) -> EngineResult<CpuTensor> {
    match inputs {
        [input] => elemwise_unary(mode, input),
        [lhs, rhs] => elemwise_binary(mode, lhs, rhs),
        _ => Err(EngineError::execution(format!(
            "elemwise {mode:?} expects 1 or 2 inputs, got {}",
            inputs.len()
        ))),
    }
}

fn elemwise_unary(mode: ElemwiseMode, input: &CpuTensor) -> EngineResult<CpuTensor> {
    let shape = input.spec.shape.clone();
    match (&input.data, mode) {
        (TensorData::F32(values), _) => {
            let mapped: Vec<f32> = match mode {
                ElemwiseMode::Neg => values.iter().map(|&x| -x).collect(),
                ElemwiseMode::Abs => values.iter().map(|&x| x.abs()).collect(),
                ElemwiseMode::Round => values.iter().map(|&x| x.round_ties_even()).collect(),
                ElemwiseMode::Floor => values.iter().map(|&x| x.floor()).collect(),
                ElemwiseMode::Ceil => values.iter().map(|&x| x.ceil()).collect(),
                _ => return Err(unary_type_error(mode, DType::F32)),
            };
            Ok(f32_tensor(shape, mapped))
        }
        (TensorData::I32(values), _) => {
            let mapped: Vec<i32> = match mode {
                ElemwiseMode::Neg => values.iter().map(|&x| -x).collect(),
                ElemwiseMode::Abs => values.iter().map(|&x| x.abs()).collect(),
                ElemwiseMode::Round | ElemwiseMode::Floor | ElemwiseMode::Ceil => values.to_vec(),
                _ => return Err(unary_type_error(mode, DType::I32)),
            };
            Ok(i32_tensor(shape, mapped))
        }
        (TensorData::Bool(values), ElemwiseMode::Not) => {
            let mapped: Vec<u8> = values.iter().map(|&x| u8::from(x == 0)).collect();
            Ok(bool_tensor(shape, mapped))
        }
        (TensorData::Bool(_), _) => Err(unary_type_error(mode, DType::Bool)),
    }
}

fn unary_type_error(mode: ElemwiseMode, dtype: DType) -> EngineError {
    EngineError::type_error("elemwise", format!("{mode:?} is not defined for {dtype}"))
}

fn elemwise_binary(mode: ElemwiseMode, lhs: &CpuTensor, rhs: &CpuTensor) -> EngineResult<CpuTensor> {
    match (&lhs.data, &rhs.data) {
        (TensorData::F32(a), TensorData::F32(b)) => {
            binary_f32(mode, a, lhs.dims(), b, rhs.dims())
        }
        (TensorData::I32(a), TensorData::I32(b)) => {
            binary_i32(mode, a, lhs.dims(), b, rhs.dims())
        }
        (TensorData::Bool(a), TensorData::Bool(b)) => {
            binary_bool(mode, a, lhs.dims(), b, rhs.dims())
        }
        _ => Err(EngineError::type_error(
            "elemwise",
            format!(
                "{mode:?} operand dtypes {} and {} do not match",
                lhs.spec.dtype, rhs.spec.dtype
            ),
        )),
    }
}

fn binary_f32(
    mode: ElemwiseMode,
    a: &[f32],
    a_dims: &[usize],
    b: &[f32],
    b_dims: &[usize],
) -> EngineResult<CpuTensor> {
    let apply = |x: f32, y: f32| -> EngineResult<f32> {
        Ok(match mode {
            ElemwiseMode::Add => x + y,
            ElemwiseMode::Sub => x - y,
            ElemwiseMode::Mul => x * y,
            ElemwiseMode::TrueDiv => x / y,
            ElemwiseMode::FloorDiv => (x / y).floor(),
            // Python-style remainder: the result takes the divisor's sign.
            ElemwiseMode::Mod => x - y * (x / y).floor(),
            ElemwiseMode::Pow => x.powf(y),
            ElemwiseMode::Lt => f32::from(x < y),
            ElemwiseMode::Leq => f32::from(x <= y),
            ElemwiseMode::Eq => f32::from(x == y),
            _ => return Err(binary_type_error(mode, DType::F32)),
        })
    };
    let (values, dims) = zip_broadcast(a, a_dims, b, b_dims, apply)?;
    Ok(f32_tensor(Shape::new(dims), values))
}

fn binary_i32(
    mode: ElemwiseMode,
    a: &[i32],
    a_dims: &[usize],
    b: &[i32],
    b_dims: &[usize],
) -> EngineResult<CpuTensor> {
    if mode == ElemwiseMode::TrueDiv {
        // True division always lands in floating point.
        let apply = |x: i32, y: i32| -> EngineResult<f32> { Ok(x as f32 / y as f32) };
        let (values, dims) = zip_broadcast(a, a_dims, b, b_dims, apply)?;
        return Ok(f32_tensor(Shape::new(dims), values));
    }
    let apply = |x: i32, y: i32| -> EngineResult<i32> {
        Ok(match mode {
            ElemwiseMode::Add => x.wrapping_add(y),
            ElemwiseMode::Sub => x.wrapping_sub(y),
            ElemwiseMode::Mul => x.wrapping_mul(y),
            ElemwiseMode::FloorDiv => floor_div_i32(x, y)?,
            ElemwiseMode::Mod => py_mod_i32(x, y)?,
            ElemwiseMode::Pow => pow_i32(x, y)?,
            ElemwiseMode::Shl => shift_i32(x, y, true)?,
            ElemwiseMode::Shr => shift_i32(x, y, false)?,
            ElemwiseMode::Lt => i32::from(x < y),
            ElemwiseMode::Leq => i32::from(x <= y),
            ElemwiseMode::Eq => i32::from(x == y),
            _ => return Err(binary_type_error(mode, DType::I32)),
        })
    };
    let (values, dims) = zip_broadcast(a, a_dims, b, b_dims, apply)?;
    Ok(i32_tensor(Shape::new(dims), values))
}

fn binary_bool(
    mode: ElemwiseMode,
    a: &[u8],
    a_dims: &[usize],
    b: &[u8],
    b_dims: &[usize],
) -> EngineResult<CpuTensor> {
    let apply = |x: u8, y: u8| -> EngineResult<u8> {
        let (x, y) = (x != 0, y != 0);
        Ok(u8::from(match mode {
            ElemwiseMode::And => x & y,
            ElemwiseMode::Or => x | y,
            ElemwiseMode::Xor => x ^ y,
            ElemwiseMode::Eq => x == y,
            _ => return Err(binary_type_error(mode, DType::Bool)),
        }))
    };
    let (values, dims) = zip_broadcast(a, a_dims, b, b_dims, apply)?;
    Ok(bool_tensor(Shape::new(dims), values))
}

fn binary_type_error(mode: ElemwiseMode, dtype: DType) -> EngineError {
    EngineError::type_error("elemwise", format!("{mode:?} is not defined for {dtype}"))
}

fn floor_div_i32(x: i32, y: i32) -> EngineResult<i32> {
    if y == 0 {
        return Err(EngineError::execution("integer division by zero"));
    }
    let quotient = x / y;
    let remainder = x % y;
    if remainder != 0 && ((remainder < 0) != (y < 0)) {
        Ok(quotient - 1)
    } else {
        Ok(quotient)
    }
}

fn py_mod_i32(x: i32, y: i32) -> EngineResult<i32> {
    if y == 0 {
        return Err(EngineError::execution("integer modulo by zero"));
    }
    let remainder = x % y;
    if remainder != 0 && ((remainder < 0) != (y < 0)) {
        Ok(remainder + y)
    } else {
        Ok(remainder)
    }
}

fn pow_i32(x: i32, y: i32) -> EngineResult<i32> {
    if y < 0 {
        return Err(EngineError::type_error(
            "elemwise",
            "integer power with negative exponent",
        ));
    }
    x.checked_pow(y as u32)
        .ok_or_else(|| EngineError::execution("integer power overflow"))
}

fn shift_i32(x: i32, y: i32, left: bool) -> EngineResult<i32> {
    if !(0..32).contains(&y) {
        return Err(EngineError::execution(format!(
            "shift amount {y} out of range"
        )));
    }
    Ok(if left { x << y } else { x >> y })
}

// ---- broadcasting ----

fn broadcast_dims(a: &[usize], b: &[usize]) -> EngineResult<Vec<usize>> {
    let rank = a.len().max(b.len());
    let mut out = vec![0; rank];
    for axis in 0..rank {
        let ad = aligned_dim(a, rank, axis);
        let bd = aligned_dim(b, rank, axis);
        out[axis] = if ad == bd || bd == 1 {
            ad
        } else if ad == 1 {
            bd
        } else {
            return Err(EngineError::execution(format!(
                "cannot broadcast {a:?} with {b:?}"
            )));
        };
    }
    Ok(out)
}

fn aligned_dim(dims: &[usize], rank: usize, axis: usize) -> usize {
    let offset = rank - dims.len();
    if axis < offset {
        1
    } else {
        dims[axis - offset]
    }
}

/// Strides of `dims` aligned to a broadcast output of rank `out_rank`,
/// with zero strides on expanded axes.
fn aligned_strides(dims: &[usize], out_rank: usize) -> Vec<usize> {
    let strides = Shape::new(dims.to_vec()).contiguous_strides();
    let offset = out_rank - dims.len();
    let mut out = vec![0; out_rank];
    for axis in 0..dims.len() {
        out[offset + axis] = if dims[axis] == 1 { 0 } else { strides[axis] };
    }
    out
}

fn zip_broadcast<T: Copy, U>(
    a: &[T],
    a_dims: &[usize],
    b: &[T],
    b_dims: &[usize],
    apply: impl Fn(T, T) -> EngineResult<U>,
) -> EngineResult<(Vec<U>, Vec<usize>)> {
    let out_dims = broadcast_dims(a_dims, b_dims)?;
    let out_strides = Shape::new(out_dims.clone()).contiguous_strides();
    let a_strides = aligned_strides(a_dims, out_dims.len());
    let b_strides = aligned_strides(b_dims, out_dims.len());
    let count: usize = out_dims.iter().product();
    let mut values = Vec::with_capacity(count);
    for flat in 0..count {
        let mut remaining = flat;
        let mut a_index = 0;
        let mut b_index = 0;
        for axis in 0..out_dims.len() {
            let coord = remaining / out_strides[axis];
            remaining %= out_strides[axis];
            a_index += coord * a_strides[axis];
            b_index += coord * b_strides[axis];
        }
        values.push(apply(a[a_index], b[b_index])?);
    }
    Ok((values, out_dims))
}

// ---- matmul ----

fn op_matmul(spec: &MatMulSpec, inputs: &[CpuTensor]) -> EngineResult<CpuTensor> {
    let [lhs, rhs] = expect_two(inputs, "matmul")?;
    if lhs.dims().len() != 2 || rhs.dims().len() != 2 {
        return Err(EngineError::unsupported(
            "matmul",
            format!(
                "reference engine multiplies rank-2 operands only, got {:?} x {:?}",
                lhs.dims(),
                rhs.dims()
            ),
        ));
    }
    let (a, b) = match (&lhs.data, &rhs.data) {
        (TensorData::F32(a), TensorData::F32(b)) => (a, b),
        _ => {
            return Err(EngineError::type_error(
                "matmul",
                format!(
                    "operands must both be f32, got {} and {}",
                    lhs.spec.dtype, rhs.spec.dtype
                ),
            ))
        }
    };
    let (m, k_a) = oriented(lhs.dims(), spec.transpose_a);
    let (k_b, n) = oriented(rhs.dims(), spec.transpose_b);
    if k_a != k_b {
        return Err(EngineError::execution(format!(
            "matmul contraction mismatch: {k_a} vs {k_b}"
        )));
    }
    let mut out = vec![0.0f32; m * n];
    for i in 0..m {
        for j in 0..n {
            let mut acc = 0.0f32;
            for k in 0..k_a {
                let a_value = if spec.transpose_a {
                    a[k * m + i]
                } else {
                    a[i * k_a + k]
                };
                let b_value = if spec.transpose_b {
                    b[j * k_a + k]
                } else {
                    b[k * n + j]
                };
                acc += a_value * b_value;
            }
            out[i * n + j] = acc;
        }
    }
    Ok(f32_tensor(Shape::new(vec![m, n]), out))
}

fn oriented(dims: &[usize], transposed: bool) -> (usize, usize) {
    if transposed {
        (dims[1], dims[0])
    } else {
        (dims[0], dims[1])
    }
}

// ---- reduce ----

fn op_reduce(spec: &ReduceSpec, inputs: &[CpuTensor]) -> EngineResult<CpuTensor> {
    let input = expect_one(inputs, "reduce")?;
    let dims = input.dims().to_vec();
    if spec.axis >= dims.len() {
        return Err(EngineError::execution(format!(
            "reduce axis {} out of range for rank {}",
            spec.axis,
            dims.len()
        )));
    }
    let axis_len = dims[spec.axis];
    if axis_len == 0 {
        return Err(EngineError::execution("reduce over an empty axis"));
    }
    let mut out_dims = dims.clone();
    out_dims.remove(spec.axis);

    let strides = Shape::new(dims.clone()).contiguous_strides();
    let inner = strides[spec.axis];
    let outer = dims.iter().product::<usize>() / (axis_len * inner);

    match (&input.data, spec.mode) {
        (TensorData::F32(values), _) => {
            let mut out = Vec::with_capacity(outer * inner);
            for outer_idx in 0..outer {
                for inner_idx in 0..inner {
                    let base = outer_idx * axis_len * inner + inner_idx;
                    let mut acc = match spec.mode {
                        ReduceMode::Sum | ReduceMode::Mean => 0.0f32,
                        ReduceMode::Product => 1.0f32,
                        ReduceMode::Max => f32::NEG_INFINITY,
                        ReduceMode::Min => f32::INFINITY,
                    };
                    for step in 0..axis_len {
                        let value = values[base + step * inner];
                        acc = match spec.mode {
                            ReduceMode::Sum | ReduceMode::Mean => acc + value,
                            ReduceMode::Product => acc * value,
                            ReduceMode::Max => acc.max(value),
                            ReduceMode::Min => acc.min(value),
                        };
                    }
                    if spec.mode == ReduceMode::Mean {
                        acc /= axis_len as f32;
                    }
                    out.push(acc);
                }
            }
            Ok(f32_tensor(Shape::new(out_dims), out))
        }
        (TensorData::I32(values), ReduceMode::Mean) => {
            // Integer mean lands in floating point.
            let mut out = Vec::with_capacity(outer * inner);
            for outer_idx in 0..outer {
                for inner_idx in 0..inner {
                    let base = outer_idx * axis_len * inner + inner_idx;
                    let total: i64 = (0..axis_len)
                        .map(|step| values[base + step * inner] as i64)
                        .sum();
                    out.push(total as f32 / axis_len as f32);
                }
            }
            Ok(f32_tensor(Shape::new(out_dims), out))
        }
        (TensorData::I32(values), _) => {
            let mut out = Vec::with_capacity(outer * inner);
            for outer_idx in 0..outer {
                for inner_idx in 0..inner {
                    let base = outer_idx * axis_len * inner + inner_idx;
                    let mut acc = match spec.mode {
                        ReduceMode::Sum => 0i32,
                        ReduceMode::Product => 1i32,
                        ReduceMode::Max => i32::MIN,
                        ReduceMode::Min => i32::MAX,
                        ReduceMode::Mean => unreachable!("handled above"),
                    };
                    for step in 0..axis_len {
                        let value = values[base + step * inner];
                        acc = match spec.mode {
                            ReduceMode::Sum => acc.wrapping_add(value),
                            ReduceMode::Product => acc.wrapping_mul(value),
                            ReduceMode::Max => acc.max(value),
                            ReduceMode::Min => acc.min(value),
                            ReduceMode::Mean => unreachable!("handled above"),
                        };
                    }
                    out.push(acc);
                }
            }
            Ok(i32_tensor(Shape::new(out_dims), out))
        }
        (TensorData::Bool(_), _) => Err(EngineError::type_error(
            "reduce",
            "reductions over bool tensors are not defined",
        )),
    }
}

// ---- shape ops ----

fn shape_operand(tensor: &CpuTensor, op: &'static str) -> EngineResult<Vec<i64>> {
    if tensor.dims().len() != 1 {
        return Err(EngineError::execution(format!(
            "{op} shape operand must be rank 1"
        )));
    }
    match &tensor.data {
        TensorData::I32(values) => Ok(values.iter().map(|&v| v as i64).collect()),
        _ => Err(EngineError::type_error(
            op,
            format!("shape operand must be i32, got {}", tensor.spec.dtype),
        )),
    }
}

fn op_reshape(spec: &ReshapeSpec, inputs: &[CpuTensor]) -> EngineResult<CpuTensor> {
    let [input, shape] = expect_two(inputs, "reshape")?;
    let entries = shape_operand(shape, "reshape")?;
    let numel = input.spec.element_count();

    let mut dims: Vec<usize> = Vec::with_capacity(entries.len());
    let mut known = 1usize;
    for (index, &entry) in entries.iter().enumerate() {
        if Some(index) == spec.unspec_axis {
            dims.push(0);
            continue;
        }
        if entry < 0 {
            return Err(EngineError::execution(format!(
                "reshape entry {entry} at axis {index} is negative but not the inferred axis"
            )));
        }
        known = known.saturating_mul(entry as usize);
        dims.push(entry as usize);
    }
    if let Some(axis) = spec.unspec_axis {
        if axis >= entries.len() {
            return Err(EngineError::execution(format!(
                "inferred axis {axis} out of range for target rank {}",
                entries.len()
            )));
        }
        if known == 0 || numel % known != 0 {
            return Err(EngineError::execution(format!(
                "cannot infer axis {axis}: {numel} elements do not divide by {known}"
            )));
        }
        dims[axis] = numel / known;
    } else if known != numel {
        return Err(EngineError::execution(format!(
            "reshape target holds {known} elements, input holds {numel}"
        )));
    }

    Ok(CpuTensor {
        spec: TensorSpec::new(input.spec.dtype, Shape::new(dims)),
        data: input.data.clone(),
    })
}

fn op_broadcast(inputs: &[CpuTensor]) -> EngineResult<CpuTensor> {
    let [input, shape] = expect_two(inputs, "broadcast")?;
    let target: Vec<usize> = shape_operand(shape, "broadcast")?
        .into_iter()
        .map(|v| v as usize)
        .collect();
    let in_dims = input.dims().to_vec();
    if in_dims.len() > target.len() {
        return Err(EngineError::execution(format!(
            "cannot broadcast {in_dims:?} down to {target:?}"
        )));
    }
    for axis in 0..in_dims.len() {
        let target_dim = target[target.len() - in_dims.len() + axis];
        let in_dim = in_dims[axis];
        if in_dim != target_dim && in_dim != 1 {
            return Err(EngineError::execution(format!(
                "cannot broadcast {in_dims:?} to {target:?}"
            )));
        }
    }
    let out_strides = Shape::new(target.clone()).contiguous_strides();
    let in_strides = aligned_strides(&in_dims, target.len());
    let count: usize = target.iter().product();
    let mut indices = Vec::with_capacity(count);
    for flat in 0..count {
        let mut remaining = flat;
        let mut index = 0;
        for axis in 0..target.len() {
            let coord = remaining / out_strides[axis];
            remaining %= out_strides[axis];
            index += coord * in_strides[axis];
        }
        indices.push(index);
    }
    let shape = Shape::new(target);
    Ok(match &input.data {
        TensorData::F32(values) => {
            f32_tensor(shape, indices.iter().map(|&i| values[i]).collect())
        }
        TensorData::I32(values) => {
            i32_tensor(shape, indices.iter().map(|&i| values[i]).collect())
        }
        TensorData::Bool(values) => {
            bool_tensor(shape, indices.iter().map(|&i| values[i]).collect())
        }
    })
}

fn op_transpose(spec: &TransposeSpec, inputs: &[CpuTensor]) -> EngineResult<CpuTensor> {
    let input = expect_one(inputs, "transpose")?;
    let in_dims = input.dims().to_vec();
    if spec.perm.len() != in_dims.len() {
        return Err(EngineError::execution(format!(
            "transpose perm {:?} does not match rank {}",
            spec.perm,
            in_dims.len()
        )));
    }
    let out_dims: Vec<usize> = spec.perm.iter().map(|&axis| in_dims[axis]).collect();
    let out_strides = Shape::new(out_dims.clone()).contiguous_strides();
    let in_strides = Shape::new(in_dims).contiguous_strides();
    let count: usize = out_dims.iter().product();
    let mut indices = Vec::with_capacity(count);
    for flat in 0..count {
        let mut remaining = flat;
        let mut index = 0;
        for axis in 0..out_dims.len() {
            let coord = remaining / out_strides[axis];
            remaining %= out_strides[axis];
            index += coord * in_strides[spec.perm[axis]];
        }
        indices.push(index);
    }
    let shape = Shape::new(out_dims);
    Ok(match &input.data {
        TensorData::F32(values) => {
            f32_tensor(shape, indices.iter().map(|&i| values[i]).collect())
        }
        TensorData::I32(values) => {
            i32_tensor(shape, indices.iter().map(|&i| values[i]).collect())
        }
        TensorData::Bool(values) => {
            bool_tensor(shape, indices.iter().map(|&i| values[i]).collect())
        }
    })
}

fn op_typecvt(spec: &TypeCvtSpec, inputs: &[CpuTensor]) -> EngineResult<CpuTensor> {
    let input = expect_one(inputs, "typecvt")?;
    if spec.dtype == input.spec.dtype {
        return Ok(input.clone());
    }
    let shape = input.spec.shape.clone();
    let count = input.spec.element_count();
    let value_at = |index: usize| -> f64 {
        match &input.data {
            TensorData::F32(values) => values[index] as f64,
            TensorData::I32(values) => values[index] as f64,
            TensorData::Bool(values) => f64::from(values[index] != 0),
        }
    };
    Ok(match spec.dtype {
        DType::F32 => f32_tensor(shape, (0..count).map(|i| value_at(i) as f32).collect()),
        // Conversions to integer truncate toward zero.
        DType::I32 => i32_tensor(shape, (0..count).map(|i| value_at(i) as i32).collect()),
        DType::Bool => bool_tensor(shape, (0..count).map(|i| u8::from(value_at(i) != 0.0)).collect()),
    })
}

// ---- indexing ----

enum AxisSelect {
    /// Single position; the axis is removed from the result.
    Pick(usize),
    /// Contiguous range `[start, stop)`; the axis survives.
    Span { start: usize, stop: usize },
}

struct IndexPlan {
    selects: Vec<AxisSelect>,
    in_dims: Vec<usize>,
}

impl IndexPlan {
    fn resolve(index: &IndexSpec, dims: &[usize]) -> EngineResult<IndexPlan> {
        let explicit = index
            .items
            .iter()
            .filter(|item| !matches!(item, IndexItem::Ellipsis))
            .count();
        if explicit > dims.len() {
            return Err(EngineError::execution(format!(
                "index has {explicit} items for rank {}",
                dims.len()
            )));
        }
        if index
            .items
            .iter()
            .filter(|item| matches!(item, IndexItem::Ellipsis))
            .count()
            > 1
        {
            return Err(EngineError::execution("index has multiple ellipses"));
        }

        let mut selects = Vec::with_capacity(dims.len());
        let mut axis = 0usize;
        for item in &index.items {
            match item {
                IndexItem::Ellipsis => {
                    let skip = dims.len() - explicit;
                    for _ in 0..skip {
                        selects.push(AxisSelect::Span {
                            start: 0,
                            stop: dims[axis],
                        });
                        axis += 1;
                    }
                }
                IndexItem::All => {
                    selects.push(AxisSelect::Span {
                        start: 0,
                        stop: dims[axis],
                    });
                    axis += 1;
                }
                IndexItem::At(position) => {
                    let extent = dims[axis] as i64;
                    let resolved = if *position < 0 {
                        position + extent
                    } else {
                        *position
                    };
                    if !(0..extent).contains(&resolved) {
                        return Err(EngineError::execution(format!(
                            "index {position} out of range for axis {axis} of extent {extent}"
                        )));
                    }
                    selects.push(AxisSelect::Pick(resolved as usize));
                    axis += 1;
                }
                IndexItem::Range { start, stop } => {
                    let extent = dims[axis] as i64;
                    let clamp = |bound: i64| -> usize {
                        let resolved = if bound < 0 { bound + extent } else { bound };
                        resolved.clamp(0, extent) as usize
                    };
                    let start = clamp(start.unwrap_or(0));
                    let stop = clamp(stop.unwrap_or(extent)).max(start);
                    selects.push(AxisSelect::Span { start, stop });
                    axis += 1;
                }
            }
        }
        while axis < dims.len() {
            selects.push(AxisSelect::Span {
                start: 0,
                stop: dims[axis],
            });
            axis += 1;
        }
        Ok(IndexPlan {
            selects,
            in_dims: dims.to_vec(),
        })
    }

    /// Shape of the selected region with `Pick` axes removed.
    fn out_dims(&self) -> Vec<usize> {
        self.selects
            .iter()
            .filter_map(|select| match select {
                AxisSelect::Pick(_) => None,
                AxisSelect::Span { start, stop } => Some(stop - start),
            })
            .collect()
    }

    /// Flat source indices of the region in row-major region order.
    fn source_indices(&self) -> Vec<usize> {
        let in_strides = Shape::new(self.in_dims.clone()).contiguous_strides();
        let mut indices = vec![0usize];
        for (axis, select) in self.selects.iter().enumerate() {
            let stride = in_strides[axis];
            let positions: Vec<usize> = match select {
                AxisSelect::Pick(position) => vec![*position],
                AxisSelect::Span { start, stop } => (*start..*stop).collect(),
            };
            let mut next = Vec::with_capacity(indices.len() * positions.len());
            for &base in &indices {
                for &position in &positions {
                    next.push(base + position * stride);
                }
            }
            indices = next;
        }
        indices
    }

    fn read(&self, input: &CpuTensor) -> CpuTensor {
        let indices = self.source_indices();
        let shape = Shape::new(self.out_dims());
        match &input.data {
            TensorData::F32(values) => {
                f32_tensor(shape, indices.iter().map(|&i| values[i]).collect())
            }
            TensorData::I32(values) => {
                i32_tensor(shape, indices.iter().map(|&i| values[i]).collect())
            }
            TensorData::Bool(values) => {
                bool_tensor(shape, indices.iter().map(|&i| values[i]).collect())
            }
        }
    }

    fn write(&self, input: &CpuTensor, value: &CpuTensor) -> EngineResult<CpuTensor> {
        let indices = self.source_indices();
        let region_dims = self.out_dims();
        let region_count: usize = region_dims.iter().product();
        let fill = value.spec.element_count() == 1;
        if !fill && value.dims() != region_dims.as_slice() {
            return Err(EngineError::execution(format!(
                "cannot write value of shape {:?} into region {:?}",
                value.dims(),
                region_dims
            )));
        }
        let spec = input.spec.clone();
        match (&input.data, &value.data) {
            (TensorData::F32(dst), TensorData::F32(src)) => {
                let mut out = dst.to_vec();
                for slot in 0..region_count {
                    out[indices[slot]] = src[if fill { 0 } else { slot }];
                }
                Ok(CpuTensor {
                    spec,
                    data: TensorData::F32(Arc::from(out)),
                })
            }
            (TensorData::I32(dst), TensorData::I32(src)) => {
                let mut out = dst.to_vec();
                for slot in 0..region_count {
                    out[indices[slot]] = src[if fill { 0 } else { slot }];
                }
                Ok(CpuTensor {
                    spec,
                    data: TensorData::I32(Arc::from(out)),
                })
            }
            (TensorData::Bool(dst), TensorData::Bool(src)) => {
                let mut out = dst.to_vec();
                for slot in 0..region_count {
                    out[indices[slot]] = src[if fill { 0 } else { slot }];
                }
                Ok(CpuTensor {
                    spec,
                    data: TensorData::Bool(Arc::from(out)),
                })
            }
            _ => Err(EngineError::type_error(
                "index_write",
                format!(
                    "value dtype {} does not match tensor dtype {}",
                    value.spec.dtype, input.spec.dtype
                ),
            )),
        }
    }
}

// ---- small constructors and codecs ----

fn f32_tensor(shape: Shape, values: Vec<f32>) -> CpuTensor {
    CpuTensor {
        spec: TensorSpec::new(DType::F32, shape),
        data: TensorData::F32(Arc::from(values)),
    }
}

fn i32_tensor(shape: Shape, values: Vec<i32>) -> CpuTensor {
    CpuTensor {
        spec: TensorSpec::new(DType::I32, shape),
        data: TensorData::I32(Arc::from(values)),
    }
}

fn bool_tensor(shape: Shape, values: Vec<u8>) -> CpuTensor {
    CpuTensor {
        spec: TensorSpec::new(DType::Bool, shape),
        data: TensorData::Bool(Arc::from(values)),
    }
}

fn expect_one<'a>(inputs: &'a [CpuTensor], op: &'static str) -> EngineResult<&'a CpuTensor> {
    match inputs {
        [input] => Ok(input),
        _ => Err(EngineError::execution(format!(
            "{op} expects 1 input, got {}",
            inputs.len()
        ))),
    }
}

fn expect_two<'a>(
    inputs: &'a [CpuTensor],
    op: &'static str,
) -> EngineResult<[&'a CpuTensor; 2]> {
    match inputs {
        [lhs, rhs] => Ok([lhs, rhs]),
        _ => Err(EngineError::execution(format!(
            "{op} expects 2 inputs, got {}",
            inputs.len()
        ))),
    }
}

fn bytes_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn bytes_to_i32(bytes: &[u8]) -> Vec<i32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn f32_to_bytes(values: &[f32]) -> Arc<[u8]> {
    let mut bytes = Vec::with_capacity(values.len() * 4);
    for value in values {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    Arc::from(bytes)
}

fn i32_to_bytes(values: &[i32]) -> Arc<[u8]> {
    let mut bytes = Vec::with_capacity(values.len() * 4);
    for value in values {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    Arc::from(bytes)
}
