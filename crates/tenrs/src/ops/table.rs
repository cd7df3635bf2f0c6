//! Static operator-to-primitive dispatch tables.
//!
//! Each language-level operator maps to one table entry naming the
//! elementwise mode, whether operand order is swapped, and whether the
//! boolean-dtype guard applies. One generic routine per arity consumes the
//! tables (see `elwise`), so the mapping stays auditable as data.

use crate::engine::spec::ElemwiseMode;

/// Dispatch entry for a binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryDispatch {
    pub token: &'static str,
    pub mode: ElemwiseMode,
    /// Swap operand order before applying (right-hand-side dispatch).
    pub reversed: bool,
    /// Both operands must carry the Bool dtype.
    pub bool_guard: bool,
}

const fn binary(
    token: &'static str,
    mode: ElemwiseMode,
    reversed: bool,
    bool_guard: bool,
) -> BinaryDispatch {
    BinaryDispatch {
        token,
        mode,
        reversed,
        bool_guard,
    }
}

pub const BINARY_DISPATCH: &[BinaryDispatch] = &[
    binary("add", ElemwiseMode::Add, false, false),
    binary("sub", ElemwiseMode::Sub, false, false),
    binary("mul", ElemwiseMode::Mul, false, false),
    binary("true_div", ElemwiseMode::TrueDiv, false, false),
    binary("floor_div", ElemwiseMode::FloorDiv, false, false),
    binary("mod", ElemwiseMode::Mod, false, false),
    binary("pow", ElemwiseMode::Pow, false, false),
    binary("shl", ElemwiseMode::Shl, false, false),
    binary("shr", ElemwiseMode::Shr, false, false),
    binary("and", ElemwiseMode::And, false, true),
    binary("or", ElemwiseMode::Or, false, true),
    binary("xor", ElemwiseMode::Xor, false, true),
    binary("radd", ElemwiseMode::Add, true, false),
    binary("rsub", ElemwiseMode::Sub, true, false),
    binary("rmul", ElemwiseMode::Mul, true, false),
    binary("rtrue_div", ElemwiseMode::TrueDiv, true, false),
    binary("rfloor_div", ElemwiseMode::FloorDiv, true, false),
    binary("rmod", ElemwiseMode::Mod, true, false),
    binary("rpow", ElemwiseMode::Pow, true, false),
    binary("rshl", ElemwiseMode::Shl, true, false),
    binary("rshr", ElemwiseMode::Shr, true, false),
    binary("rand", ElemwiseMode::And, true, true),
    binary("ror", ElemwiseMode::Or, true, true),
    binary("rxor", ElemwiseMode::Xor, true, true),
];

/// Dispatch entry for a unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnaryDispatch {
    pub token: &'static str,
    pub mode: ElemwiseMode,
    pub bool_guard: bool,
}

const fn unary(token: &'static str, mode: ElemwiseMode, bool_guard: bool) -> UnaryDispatch {
    UnaryDispatch {
        token,
        mode,
        bool_guard,
    }
}

pub const UNARY_DISPATCH: &[UnaryDispatch] = &[
    unary("neg", ElemwiseMode::Neg, false),
    unary("abs", ElemwiseMode::Abs, false),
    unary("round", ElemwiseMode::Round, false),
    unary("floor", ElemwiseMode::Floor, false),
    unary("ceil", ElemwiseMode::Ceil, false),
    unary("not", ElemwiseMode::Not, true),
];

/// Dispatch entry for a comparison operator. There are no Gt/Geq primitive
/// modes; `greater` and `greater_equal` swap operands instead. Every
/// comparison result is cast to Bool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareDispatch {
    pub token: &'static str,
    pub mode: ElemwiseMode,
    pub swapped: bool,
}

const fn compare(token: &'static str, mode: ElemwiseMode, swapped: bool) -> CompareDispatch {
    CompareDispatch {
        token,
        mode,
        swapped,
    }
}

pub const COMPARE_DISPATCH: &[CompareDispatch] = &[
    compare("less", ElemwiseMode::Lt, false),
    compare("less_equal", ElemwiseMode::Leq, false),
    compare("greater", ElemwiseMode::Lt, true),
    compare("greater_equal", ElemwiseMode::Leq, true),
    compare("equal", ElemwiseMode::Eq, false),
];

/// Looks up a binary entry. Tokens are compile-time constants; a missing
/// entry is a table bug, not a runtime condition.
pub(crate) fn binary_entry(token: &'static str) -> &'static BinaryDispatch {
    BINARY_DISPATCH
        .iter()
        .find(|entry| entry.token == token)
        .unwrap_or_else(|| panic!("no binary dispatch entry for '{token}'"))
}

pub(crate) fn unary_entry(token: &'static str) -> &'static UnaryDispatch {
    UNARY_DISPATCH
        .iter()
        .find(|entry| entry.token == token)
        .unwrap_or_else(|| panic!("no unary dispatch entry for '{token}'"))
}

pub(crate) fn compare_entry(token: &'static str) -> &'static CompareDispatch {
    COMPARE_DISPATCH
        .iter()
        .find(|entry| entry.token == token)
        .unwrap_or_else(|| panic!("no compare dispatch entry for '{token}'"))
}
