//! Generic elementwise dispatch: the single funnel between operator
//! tables and the engine's `Elemwise` primitive.

use std::sync::Arc;

use crate::engine::spec::{DType, ElemwiseMode, ElemwiseSpec, Engine, Operation, TypeCvtSpec};
use crate::error::{OpError, OpResult};

use super::convert::{self, TensorArg};
use super::table::{BinaryDispatch, CompareDispatch, UnaryDispatch};

/// Applies one elementwise primitive over already converted handles.
pub(crate) fn apply_mode<E: Engine + 'static>(
    engine: &Arc<E>,
    mode: ElemwiseMode,
    inputs: &[E::Handle],
) -> OpResult<E::Handle> {
    let op = Operation::Elemwise(ElemwiseSpec { mode });
    convert::single(engine.apply(&op, inputs)?, "elemwise")
}

/// Normalizes operands and applies one elementwise primitive.
pub(crate) fn elemwise<E: Engine + 'static>(
    engine: &Arc<E>,
    mode: ElemwiseMode,
    args: &[TensorArg<'_, E>],
) -> OpResult<E::Handle> {
    let handles = convert::convert_inputs(engine, args)?;
    apply_mode(engine, mode, &handles)
}

/// Rejects non-Bool operands of a guarded (logical) operator before the
/// primitive is invoked.
fn check_bool_operands<E: Engine + 'static>(
    engine: &Arc<E>,
    op: &'static str,
    handles: &[E::Handle],
) -> OpResult<()> {
    for handle in handles {
        let dtype = engine.spec_of(handle).dtype;
        if !dtype.is_bool() {
            return Err(OpError::TypeMismatch { op, dtype });
        }
    }
    Ok(())
}

/// Table-driven binary dispatch: convert, guard, honor the reversed flag,
/// apply.
pub(crate) fn dispatch_binary<E: Engine + 'static>(
    engine: &Arc<E>,
    entry: &BinaryDispatch,
    lhs: TensorArg<'_, E>,
    rhs: TensorArg<'_, E>,
) -> OpResult<E::Handle> {
    let mut handles = convert::convert_inputs(engine, &[lhs, rhs])?;
    if entry.bool_guard {
        check_bool_operands(engine, entry.token, &handles)?;
    }
    if entry.reversed {
        handles.swap(0, 1);
    }
    apply_mode(engine, entry.mode, &handles)
}

/// Table-driven unary dispatch.
pub(crate) fn dispatch_unary<E: Engine + 'static>(
    engine: &Arc<E>,
    entry: &UnaryDispatch,
    input: TensorArg<'_, E>,
) -> OpResult<E::Handle> {
    let handles = convert::convert_inputs(engine, &[input])?;
    if entry.bool_guard {
        check_bool_operands(engine, entry.token, &handles)?;
    }
    apply_mode(engine, entry.mode, &handles)
}

/// Table-driven comparison dispatch; the raw comparison result is cast to
/// Bool before it reaches the caller.
pub(crate) fn dispatch_compare<E: Engine + 'static>(
    engine: &Arc<E>,
    entry: &CompareDispatch,
    lhs: TensorArg<'_, E>,
    rhs: TensorArg<'_, E>,
) -> OpResult<E::Handle> {
    let mut handles = convert::convert_inputs(engine, &[lhs, rhs])?;
    if entry.swapped {
        handles.swap(0, 1);
    }
    let raw = apply_mode(engine, entry.mode, &handles)?;
    let op = Operation::TypeCvt(TypeCvtSpec { dtype: DType::Bool });
    convert::single(engine.apply(&op, &[raw])?, "typecvt")
}
