use std::fmt;
use std::sync::Arc;

use serde::{ser::SerializeStruct, Deserialize, Serialize};

use crate::tensor::Shape;

/// Enumerates scalar element types covered by the engine contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    Bool,
    I32,
    F32,
}

impl DType {
    /// Returns `true` when the dtype is a floating-point representation.
    pub fn is_float(self) -> bool {
        matches!(self, DType::F32)
    }

    /// Returns `true` when the dtype is an integer representation.
    pub fn is_integer(self) -> bool {
        matches!(self, DType::I32)
    }

    /// Returns `true` for the boolean element type.
    pub fn is_bool(self) -> bool {
        matches!(self, DType::Bool)
    }

    /// Returns the number of bytes required per scalar element.
    pub fn size_in_bytes(self) -> usize {
        match self {
            DType::Bool => 1,
            DType::I32 => 4,
            DType::F32 => 4,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::Bool => write!(f, "bool"),
            DType::I32 => write!(f, "i32"),
            DType::F32 => write!(f, "f32"),
        }
    }
}

/// Placement of a primitive tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Device {
    Cpu,
    Cuda(usize),
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda(ordinal) => write!(f, "cuda:{ordinal}"),
        }
    }
}

/// Tensor metadata coupling dtype and shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TensorSpec {
    pub dtype: DType,
    pub shape: Shape,
}

impl TensorSpec {
    pub fn new(dtype: DType, shape: Shape) -> Self {
        Self { dtype, shape }
    }

    /// Returns the total element count (1 for the rank-0 shape).
    pub fn element_count(&self) -> usize {
        self.shape.num_elements()
    }

    /// Returns the total byte length of a dense payload.
    pub fn byte_len(&self) -> usize {
        self.element_count() * self.dtype.size_in_bytes()
    }
}

/// Scalar literal: the payload of `item()` and the input form of scalar
/// operands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Literal {
    /// Returns the dtype a rank-0 tensor holding this literal would carry.
    pub fn dtype(self) -> DType {
        match self {
            Literal::Bool(_) => DType::Bool,
            Literal::Int(_) => DType::I32,
            Literal::Float(_) => DType::F32,
        }
    }

    /// Truthiness of the scalar (non-zero for numerics).
    pub fn to_bool(self) -> bool {
        match self {
            Literal::Bool(value) => value,
            Literal::Int(value) => value != 0,
            Literal::Float(value) => value != 0.0,
        }
    }

    /// Integer value; floats truncate toward zero.
    pub fn to_int(self) -> i64 {
        match self {
            Literal::Bool(value) => value as i64,
            Literal::Int(value) => value,
            Literal::Float(value) => value.trunc() as i64,
        }
    }

    pub fn to_float(self) -> f64 {
        match self {
            Literal::Bool(value) => value as u8 as f64,
            Literal::Int(value) => value as f64,
            Literal::Float(value) => value,
        }
    }

    /// Complex value with zero imaginary part.
    pub fn to_complex(self) -> num_complex::Complex64 {
        num_complex::Complex64::new(self.to_float(), 0.0)
    }
}

/// Dense literal tensor payload.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorLiteral {
    pub spec: TensorSpec,
    pub bytes: Arc<[u8]>,
}

impl TensorLiteral {
    pub fn new(spec: TensorSpec, bytes: Arc<[u8]>) -> Self {
        Self { spec, bytes }
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}

impl Serialize for TensorLiteral {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("TensorLiteral", 2)?;
        state.serialize_field("spec", &self.spec)?;
        state.serialize_field("bytes", &self.bytes.as_ref())?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for TensorLiteral {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct TensorLiteralHelper {
            spec: TensorSpec,
            bytes: Vec<u8>,
        }

        let helper = TensorLiteralHelper::deserialize(deserializer)?;
        Ok(TensorLiteral {
            spec: helper.spec,
            bytes: Arc::<[u8]>::from(helper.bytes),
        })
    }
}

/// Initialization payload when materialising tensors on an engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TensorInit {
    Literal(TensorLiteral),
    Zeroed(TensorSpec),
}

/// Elementwise primitive modes.
///
/// Comparisons are covered by `Lt`, `Leq`, and `Eq` alone; the dispatch
/// layer expresses the remaining comparison operators through operand
/// swaps and negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElemwiseMode {
    Add,
    Sub,
    Mul,
    TrueDiv,
    FloorDiv,
    Mod,
    Pow,
    Shl,
    Shr,
    And,
    Or,
    Xor,
    Not,
    Neg,
    Abs,
    Round,
    Floor,
    Ceil,
    Lt,
    Leq,
    Eq,
}

/// Attribute payload for `Elemwise`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElemwiseSpec {
    pub mode: ElemwiseMode,
}

/// Accumulation precision requested from the matmul primitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComputeMode {
    #[default]
    Default,
}

/// Operand memory format requested from the matmul primitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatMulFormat {
    #[default]
    Default,
}

/// Fully describes a matrix-multiply invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatMulSpec {
    pub transpose_a: bool,
    pub transpose_b: bool,
    pub compute_mode: ComputeMode,
    pub format: MatMulFormat,
}

/// Reduction families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReduceMode {
    Sum,
    Product,
    Min,
    Max,
    Mean,
}

/// Attribute payload for `Reduce`. The reduced axis is removed from the
/// result shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReduceSpec {
    pub mode: ReduceMode,
    pub axis: usize,
}

/// Attribute payload for `Reshape`; operands are `[input, shape]` where
/// `shape` is a rank-1 I32 tensor and `unspec_axis` names the entry the
/// engine must infer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReshapeSpec {
    pub unspec_axis: Option<usize>,
}

/// Permutation payload for `Transpose`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransposeSpec {
    pub perm: Vec<usize>,
}

/// Attribute payload for `TypeCvt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCvtSpec {
    pub dtype: DType,
}

/// Zero-operand payload embedding a fixed tensor on a device (shape
/// arguments for reshape and broadcast travel this way).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantSpec {
    pub literal: TensorLiteral,
    pub device: Device,
}

/// Declarative form of the primitive operations the dispatch layer emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    Elemwise(ElemwiseSpec),
    MatMul(MatMulSpec),
    Reduce(ReduceSpec),
    Reshape(ReshapeSpec),
    Broadcast,
    Transpose(TransposeSpec),
    TypeCvt(TypeCvtSpec),
    Constant(ConstantSpec),
}

impl Operation {
    /// Short name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Elemwise(_) => "elemwise",
            Operation::MatMul(_) => "matmul",
            Operation::Reduce(_) => "reduce",
            Operation::Reshape(_) => "reshape",
            Operation::Broadcast => "broadcast",
            Operation::Transpose(_) => "transpose",
            Operation::TypeCvt(_) => "typecvt",
            Operation::Constant(_) => "constant",
        }
    }
}

/// A single item of an index expression, one per axis (with `Ellipsis`
/// standing for any number of skipped axes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexItem {
    /// Select one position along the axis (negative wraps from the end);
    /// the axis is removed from the result.
    At(i64),
    /// Half-open range along the axis; `None` bounds take the axis extremes.
    Range {
        start: Option<i64>,
        stop: Option<i64>,
    },
    /// Keep the whole axis.
    All,
    /// Expand to `All` for every axis not otherwise covered.
    Ellipsis,
}

/// Index expression handed to the engine's indexing collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub items: Vec<IndexItem>,
}

impl IndexSpec {
    pub fn new(items: impl Into<Vec<IndexItem>>) -> Self {
        Self {
            items: items.into(),
        }
    }

    /// A bare ellipsis denotes the whole object; `set` with it replaces the
    /// wrapper's value outright instead of delegating to the engine.
    pub fn is_whole(&self) -> bool {
        matches!(self.items.as_slice(), [IndexItem::Ellipsis])
    }
}

impl From<i64> for IndexSpec {
    fn from(index: i64) -> Self {
        IndexSpec::new(vec![IndexItem::At(index)])
    }
}

impl From<i32> for IndexSpec {
    fn from(index: i32) -> Self {
        IndexSpec::new(vec![IndexItem::At(index as i64)])
    }
}

impl From<IndexItem> for IndexSpec {
    fn from(item: IndexItem) -> Self {
        IndexSpec::new(vec![item])
    }
}

impl From<Vec<IndexItem>> for IndexSpec {
    fn from(items: Vec<IndexItem>) -> Self {
        IndexSpec::new(items)
    }
}

impl From<&[IndexItem]> for IndexSpec {
    fn from(items: &[IndexItem]) -> Self {
        IndexSpec::new(items.to_vec())
    }
}

/// Engine failure surfaced to the dispatch layer.
#[derive(Debug)]
pub enum EngineError {
    Unsupported { op: &'static str, reason: String },
    TypeError { op: &'static str, message: String },
    Execution { message: String },
}

impl EngineError {
    pub fn unsupported(op: &'static str, reason: impl Into<String>) -> Self {
        EngineError::Unsupported {
            op,
            reason: reason.into(),
        }
    }

    pub fn type_error(op: &'static str, message: impl Into<String>) -> Self {
        EngineError::TypeError {
            op,
            message: message.into(),
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        EngineError::Execution {
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Unsupported { op, reason } => {
                write!(f, "{op} is not implemented: {reason}")
            }
            EngineError::TypeError { op, message } => {
                write!(f, "{op} type error: {message}")
            }
            EngineError::Execution { message } => {
                write!(f, "engine execution failure: {message}")
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// Convenience alias for results returned by engine routines.
pub type EngineResult<T> = Result<T, EngineError>;

/// Execution-engine contract consumed by the dispatch layer.
///
/// `apply` executes exactly one primitive operation and returns its
/// results; graph construction, device placement, and differentiation
/// bookkeeping are the engine's business. The indexing collaborators are
/// separate entry points because their semantics (advanced indexing) sit
/// outside the primitive-operation set.
pub trait Engine: Send + Sync {
    type Handle: Clone + Send + Sync + 'static;

    /// Returns a human-readable engine identifier (e.g. `"ref-cpu"`).
    fn engine_name(&self) -> &str;

    /// Materialises a primitive tensor from host initialisation data.
    fn materialize(&self, init: TensorInit, device: Device) -> EngineResult<Self::Handle>;

    /// Reads a primitive tensor back into a dense literal.
    fn to_literal(&self, handle: &Self::Handle) -> EngineResult<TensorLiteral>;

    /// Reports dtype and shape of a primitive tensor.
    fn spec_of(&self, handle: &Self::Handle) -> TensorSpec;

    /// Reports the placement of a primitive tensor.
    fn device_of(&self, handle: &Self::Handle) -> Device;

    /// Executes one primitive operation over already materialised operands.
    fn apply(&self, op: &Operation, inputs: &[Self::Handle]) -> EngineResult<Vec<Self::Handle>>;

    /// Reads a sub-tensor selected by `index`.
    fn index_read(&self, handle: &Self::Handle, index: &IndexSpec) -> EngineResult<Self::Handle>;

    /// Returns a copy of `handle` with the region selected by `index`
    /// replaced by `value`.
    fn index_write(
        &self,
        handle: &Self::Handle,
        index: &IndexSpec,
        value: &Self::Handle,
    ) -> EngineResult<Self::Handle>;
}
