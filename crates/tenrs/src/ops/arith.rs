//! Arithmetic, logical, and comparison surface of the tensor wrapper.
//!
//! Every operator resolves through the static dispatch tables: fallible
//! `try_*` methods are the checked path, the infallible twins panic with
//! the operator token, and the `std::ops` impls ride on the infallible
//! forms so expression syntax stays ergonomic.

use std::ops::{
    Add, AddAssign, BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Div, DivAssign,
    Mul, MulAssign, Neg, Not, Rem, RemAssign, Shl, ShlAssign, Shr, ShrAssign, Sub, SubAssign,
};

use crate::engine::spec::{ElemwiseMode, Engine};
use crate::error::{OpError, OpResult};
use crate::tensor::Tensor;

use super::convert::TensorArg;
use super::{elwise, table};

pub(crate) fn unwrap_op<T>(result: OpResult<T>, op: &str) -> T {
    result.unwrap_or_else(|err| panic!("tensor {op} failed: {err}"))
}

impl<E: Engine + 'static> Tensor<E> {
    fn binary_op(&self, token: &'static str, rhs: TensorArg<'_, E>) -> OpResult<Tensor<E>> {
        let entry = table::binary_entry(token);
        let handle =
            elwise::dispatch_binary(self.engine_ref(), entry, TensorArg::Tensor(self), rhs)?;
        Ok(self.adopt(handle))
    }

    fn unary_op(&self, token: &'static str) -> OpResult<Tensor<E>> {
        let entry = table::unary_entry(token);
        let handle = elwise::dispatch_unary(self.engine_ref(), entry, TensorArg::Tensor(self))?;
        Ok(self.adopt(handle))
    }

    fn compare_op(&self, token: &'static str, rhs: TensorArg<'_, E>) -> OpResult<Tensor<E>> {
        let entry = table::compare_entry(token);
        let handle =
            elwise::dispatch_compare(self.engine_ref(), entry, TensorArg::Tensor(self), rhs)?;
        Ok(self.adopt(handle))
    }

    fn inplace_op(&mut self, token: &'static str, rhs: TensorArg<'_, E>) -> OpResult<()> {
        let result = self.binary_op(token, rhs)?;
        self.rebind(result)
    }

    // ---- binary arithmetic ----

    pub fn try_add<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> OpResult<Tensor<E>> {
        self.binary_op("add", rhs.into())
    }

    pub fn add<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> Tensor<E> {
        unwrap_op(self.try_add(rhs), "add")
    }

    pub fn try_sub<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> OpResult<Tensor<E>> {
        self.binary_op("sub", rhs.into())
    }

    pub fn sub<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> Tensor<E> {
        unwrap_op(self.try_sub(rhs), "sub")
    }

    pub fn try_mul<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> OpResult<Tensor<E>> {
        self.binary_op("mul", rhs.into())
    }

    pub fn mul<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> Tensor<E> {
        unwrap_op(self.try_mul(rhs), "mul")
    }

    pub fn try_div<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> OpResult<Tensor<E>> {
        self.binary_op("true_div", rhs.into())
    }

    pub fn div<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> Tensor<E> {
        unwrap_op(self.try_div(rhs), "true_div")
    }

    pub fn try_floor_div<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> OpResult<Tensor<E>> {
        self.binary_op("floor_div", rhs.into())
    }

    pub fn floor_div<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> Tensor<E> {
        unwrap_op(self.try_floor_div(rhs), "floor_div")
    }

    pub fn try_rem<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> OpResult<Tensor<E>> {
        self.binary_op("mod", rhs.into())
    }

    pub fn rem<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> Tensor<E> {
        unwrap_op(self.try_rem(rhs), "mod")
    }

    pub fn try_pow<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> OpResult<Tensor<E>> {
        self.binary_op("pow", rhs.into())
    }

    pub fn pow<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> Tensor<E> {
        unwrap_op(self.try_pow(rhs), "pow")
    }

    /// Reflected power: `lhs ** self`.
    pub fn try_rpow<'a>(&self, lhs: impl Into<TensorArg<'a, E>>) -> OpResult<Tensor<E>> {
        self.binary_op("rpow", lhs.into())
    }

    pub fn rpow<'a>(&self, lhs: impl Into<TensorArg<'a, E>>) -> Tensor<E> {
        unwrap_op(self.try_rpow(lhs), "rpow")
    }

    pub fn try_shl<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> OpResult<Tensor<E>> {
        self.binary_op("shl", rhs.into())
    }

    pub fn try_shr<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> OpResult<Tensor<E>> {
        self.binary_op("shr", rhs.into())
    }

    /// In-place power; the non-mutating result replaces the reference.
    pub fn try_pow_assign<'a>(&mut self, rhs: impl Into<TensorArg<'a, E>>) -> OpResult<()> {
        self.inplace_op("pow", rhs.into())
    }

    pub fn pow_assign<'a>(&mut self, rhs: impl Into<TensorArg<'a, E>>) {
        unwrap_op(self.try_pow_assign(rhs), "pow_assign");
    }

    // ---- logical ----

    pub fn try_logical_and<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> OpResult<Tensor<E>> {
        self.binary_op("and", rhs.into())
    }

    pub fn logical_and<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> Tensor<E> {
        unwrap_op(self.try_logical_and(rhs), "and")
    }

    pub fn try_logical_or<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> OpResult<Tensor<E>> {
        self.binary_op("or", rhs.into())
    }

    pub fn logical_or<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> Tensor<E> {
        unwrap_op(self.try_logical_or(rhs), "or")
    }

    pub fn try_logical_xor<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> OpResult<Tensor<E>> {
        self.binary_op("xor", rhs.into())
    }

    pub fn logical_xor<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> Tensor<E> {
        unwrap_op(self.try_logical_xor(rhs), "xor")
    }

    pub fn try_logical_not(&self) -> OpResult<Tensor<E>> {
        self.unary_op("not")
    }

    pub fn logical_not(&self) -> Tensor<E> {
        unwrap_op(self.try_logical_not(), "not")
    }

    // ---- unary arithmetic ----

    pub fn try_neg(&self) -> OpResult<Tensor<E>> {
        self.unary_op("neg")
    }

    pub fn neg(&self) -> Tensor<E> {
        unwrap_op(self.try_neg(), "neg")
    }

    pub fn try_abs(&self) -> OpResult<Tensor<E>> {
        self.unary_op("abs")
    }

    pub fn abs(&self) -> Tensor<E> {
        unwrap_op(self.try_abs(), "abs")
    }

    pub fn try_round(&self) -> OpResult<Tensor<E>> {
        self.unary_op("round")
    }

    pub fn round(&self) -> Tensor<E> {
        unwrap_op(self.try_round(), "round")
    }

    pub fn try_floor(&self) -> OpResult<Tensor<E>> {
        self.unary_op("floor")
    }

    pub fn floor(&self) -> Tensor<E> {
        unwrap_op(self.try_floor(), "floor")
    }

    pub fn try_ceil(&self) -> OpResult<Tensor<E>> {
        self.unary_op("ceil")
    }

    pub fn ceil(&self) -> Tensor<E> {
        unwrap_op(self.try_ceil(), "ceil")
    }

    /// Truncation toward zero is not part of the dispatch contract.
    pub fn trunc(&self) -> OpResult<Tensor<E>> {
        Err(OpError::Unsupported { op: "trunc" })
    }

    // ---- comparisons ----

    pub fn try_less<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> OpResult<Tensor<E>> {
        self.compare_op("less", rhs.into())
    }

    pub fn less<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> Tensor<E> {
        unwrap_op(self.try_less(rhs), "less")
    }

    pub fn try_less_equal<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> OpResult<Tensor<E>> {
        self.compare_op("less_equal", rhs.into())
    }

    pub fn less_equal<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> Tensor<E> {
        unwrap_op(self.try_less_equal(rhs), "less_equal")
    }

    pub fn try_greater<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> OpResult<Tensor<E>> {
        self.compare_op("greater", rhs.into())
    }

    pub fn greater<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> Tensor<E> {
        unwrap_op(self.try_greater(rhs), "greater")
    }

    pub fn try_greater_equal<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> OpResult<Tensor<E>> {
        self.compare_op("greater_equal", rhs.into())
    }

    pub fn greater_equal<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> Tensor<E> {
        unwrap_op(self.try_greater_equal(rhs), "greater_equal")
    }

    pub fn try_equal<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> OpResult<Tensor<E>> {
        self.compare_op("equal", rhs.into())
    }

    pub fn equal<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> Tensor<E> {
        unwrap_op(self.try_equal(rhs), "equal")
    }

    /// Defined as NOT over the boolean equality result rather than a
    /// dedicated primitive; the two-step op stream is part of the
    /// contract.
    pub fn try_not_equal<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> OpResult<Tensor<E>> {
        let equal = self.try_equal(rhs)?;
        let handle = elwise::elemwise(
            self.engine_ref(),
            ElemwiseMode::Not,
            &[TensorArg::Tensor(&equal)],
        )?;
        Ok(self.adopt(handle))
    }

    pub fn not_equal<'a>(&self, rhs: impl Into<TensorArg<'a, E>>) -> Tensor<E> {
        unwrap_op(self.try_not_equal(rhs), "not_equal")
    }
}

// Operator sugar. Each macro expansion routes one `std::ops` trait through
// the dispatch table and panics with the operator token on failure.

macro_rules! impl_tensor_binop {
    ($op_trait:ident, $method:ident, $token:literal) => {
        impl<E: Engine + 'static> $op_trait<&Tensor<E>> for &Tensor<E> {
            type Output = Tensor<E>;

            fn $method(self, rhs: &Tensor<E>) -> Tensor<E> {
                unwrap_op(self.binary_op($token, TensorArg::Tensor(rhs)), $token)
            }
        }

        impl<E: Engine + 'static> $op_trait<Tensor<E>> for &Tensor<E> {
            type Output = Tensor<E>;

            fn $method(self, rhs: Tensor<E>) -> Tensor<E> {
                unwrap_op(self.binary_op($token, TensorArg::Tensor(&rhs)), $token)
            }
        }

        impl<E: Engine + 'static> $op_trait<&Tensor<E>> for Tensor<E> {
            type Output = Tensor<E>;

            fn $method(self, rhs: &Tensor<E>) -> Tensor<E> {
                unwrap_op(self.binary_op($token, TensorArg::Tensor(rhs)), $token)
            }
        }

        impl<E: Engine + 'static> $op_trait<Tensor<E>> for Tensor<E> {
            type Output = Tensor<E>;

            fn $method(self, rhs: Tensor<E>) -> Tensor<E> {
                unwrap_op(self.binary_op($token, TensorArg::Tensor(&rhs)), $token)
            }
        }
    };
}

impl_tensor_binop!(Add, add, "add");
impl_tensor_binop!(Sub, sub, "sub");
impl_tensor_binop!(Mul, mul, "mul");
impl_tensor_binop!(Div, div, "true_div");
impl_tensor_binop!(Rem, rem, "mod");
impl_tensor_binop!(BitAnd, bitand, "and");
impl_tensor_binop!(BitOr, bitor, "or");
impl_tensor_binop!(BitXor, bitxor, "xor");
impl_tensor_binop!(Shl, shl, "shl");
impl_tensor_binop!(Shr, shr, "shr");

macro_rules! impl_scalar_binop {
    ($op_trait:ident, $method:ident, $token:literal, $rtoken:literal, $scalar:ty) => {
        impl<E: Engine + 'static> $op_trait<$scalar> for &Tensor<E> {
            type Output = Tensor<E>;

            fn $method(self, rhs: $scalar) -> Tensor<E> {
                unwrap_op(self.binary_op($token, TensorArg::from(rhs)), $token)
            }
        }

        impl<E: Engine + 'static> $op_trait<$scalar> for Tensor<E> {
            type Output = Tensor<E>;

            fn $method(self, rhs: $scalar) -> Tensor<E> {
                unwrap_op(self.binary_op($token, TensorArg::from(rhs)), $token)
            }
        }

        impl<E: Engine + 'static> $op_trait<&Tensor<E>> for $scalar {
            type Output = Tensor<E>;

            fn $method(self, rhs: &Tensor<E>) -> Tensor<E> {
                unwrap_op(rhs.binary_op($rtoken, TensorArg::from(self)), $rtoken)
            }
        }

        impl<E: Engine + 'static> $op_trait<Tensor<E>> for $scalar {
            type Output = Tensor<E>;

            fn $method(self, rhs: Tensor<E>) -> Tensor<E> {
                unwrap_op(rhs.binary_op($rtoken, TensorArg::from(self)), $rtoken)
            }
        }
    };
}

impl_scalar_binop!(Add, add, "add", "radd", f64);
impl_scalar_binop!(Sub, sub, "sub", "rsub", f64);
impl_scalar_binop!(Mul, mul, "mul", "rmul", f64);
impl_scalar_binop!(Div, div, "true_div", "rtrue_div", f64);
impl_scalar_binop!(Rem, rem, "mod", "rmod", f64);
impl_scalar_binop!(Add, add, "add", "radd", i64);
impl_scalar_binop!(Sub, sub, "sub", "rsub", i64);
impl_scalar_binop!(Mul, mul, "mul", "rmul", i64);
impl_scalar_binop!(Div, div, "true_div", "rtrue_div", i64);
impl_scalar_binop!(Rem, rem, "mod", "rmod", i64);
impl_scalar_binop!(Shl, shl, "shl", "rshl", i64);
impl_scalar_binop!(Shr, shr, "shr", "rshr", i64);
impl_scalar_binop!(BitAnd, bitand, "and", "rand", bool);
impl_scalar_binop!(BitOr, bitor, "or", "ror", bool);
impl_scalar_binop!(BitXor, bitxor, "xor", "rxor", bool);

macro_rules! impl_tensor_assign {
    ($op_trait:ident, $method:ident, $token:literal) => {
        impl<E: Engine + 'static> $op_trait<&Tensor<E>> for Tensor<E> {
            fn $method(&mut self, rhs: &Tensor<E>) {
                unwrap_op(self.inplace_op($token, TensorArg::Tensor(rhs)), $token);
            }
        }

        impl<E: Engine + 'static> $op_trait<Tensor<E>> for Tensor<E> {
            fn $method(&mut self, rhs: Tensor<E>) {
                unwrap_op(self.inplace_op($token, TensorArg::Tensor(&rhs)), $token);
            }
        }
    };
}

impl_tensor_assign!(AddAssign, add_assign, "add");
impl_tensor_assign!(SubAssign, sub_assign, "sub");
impl_tensor_assign!(MulAssign, mul_assign, "mul");
impl_tensor_assign!(DivAssign, div_assign, "true_div");
impl_tensor_assign!(RemAssign, rem_assign, "mod");
impl_tensor_assign!(BitAndAssign, bitand_assign, "and");
impl_tensor_assign!(BitOrAssign, bitor_assign, "or");
impl_tensor_assign!(BitXorAssign, bitxor_assign, "xor");
impl_tensor_assign!(ShlAssign, shl_assign, "shl");
impl_tensor_assign!(ShrAssign, shr_assign, "shr");

macro_rules! impl_scalar_assign {
    ($op_trait:ident, $method:ident, $token:literal, $scalar:ty) => {
        impl<E: Engine + 'static> $op_trait<$scalar> for Tensor<E> {
            fn $method(&mut self, rhs: $scalar) {
                unwrap_op(self.inplace_op($token, TensorArg::from(rhs)), $token);
            }
        }
    };
}

impl_scalar_assign!(AddAssign, add_assign, "add", f64);
impl_scalar_assign!(SubAssign, sub_assign, "sub", f64);
impl_scalar_assign!(MulAssign, mul_assign, "mul", f64);
impl_scalar_assign!(DivAssign, div_assign, "true_div", f64);
impl_scalar_assign!(RemAssign, rem_assign, "mod", f64);
impl_scalar_assign!(AddAssign, add_assign, "add", i64);
impl_scalar_assign!(SubAssign, sub_assign, "sub", i64);
impl_scalar_assign!(MulAssign, mul_assign, "mul", i64);
impl_scalar_assign!(DivAssign, div_assign, "true_div", i64);
impl_scalar_assign!(RemAssign, rem_assign, "mod", i64);
impl_scalar_assign!(ShlAssign, shl_assign, "shl", i64);
impl_scalar_assign!(ShrAssign, shr_assign, "shr", i64);

impl<E: Engine + 'static> Neg for &Tensor<E> {
    type Output = Tensor<E>;

    fn neg(self) -> Tensor<E> {
        unwrap_op(self.try_neg(), "neg")
    }
}

impl<E: Engine + 'static> Neg for Tensor<E> {
    type Output = Tensor<E>;

    fn neg(self) -> Tensor<E> {
        unwrap_op(self.try_neg(), "neg")
    }
}

impl<E: Engine + 'static> Not for &Tensor<E> {
    type Output = Tensor<E>;

    fn not(self) -> Tensor<E> {
        unwrap_op(self.try_logical_not(), "not")
    }
}

impl<E: Engine + 'static> Not for Tensor<E> {
    type Output = Tensor<E>;

    fn not(self) -> Tensor<E> {
        unwrap_op(self.try_logical_not(), "not")
    }
}
