use crate::{Arg, BinaryOp, Col, F};
use std::ops;

/// Comparison and membership helpers shared by columns and expressions.
///
/// `==` and the other comparison operators keep their Rust meaning, these
/// methods build the corresponding SQL node instead.
pub trait Operators {
    fn as_arg(&self) -> Arg;

    fn equals(&self, other: impl Into<Arg>) -> F {
        F::binary(BinaryOp::Equal, self.as_arg(), other)
    }

    fn not_equals(&self, other: impl Into<Arg>) -> F {
        F::binary(BinaryOp::NotEqual, self.as_arg(), other)
    }

    fn less(&self, other: impl Into<Arg>) -> F {
        F::binary(BinaryOp::Less, self.as_arg(), other)
    }

    fn less_or_equals(&self, other: impl Into<Arg>) -> F {
        F::binary(BinaryOp::LessEqual, self.as_arg(), other)
    }

    fn greater(&self, other: impl Into<Arg>) -> F {
        F::binary(BinaryOp::Greater, self.as_arg(), other)
    }

    fn greater_or_equals(&self, other: impl Into<Arg>) -> F {
        F::binary(BinaryOp::GreaterEqual, self.as_arg(), other)
    }

    fn is_in(&self, other: impl Into<Arg>) -> F {
        F::binary(BinaryOp::In, self.as_arg(), in_operand(other.into()))
    }

    fn is_not_in(&self, other: impl Into<Arg>) -> F {
        F::binary(BinaryOp::NotIn, self.as_arg(), in_operand(other.into()))
    }

    fn like(&self, pattern: impl Into<Arg>) -> F {
        F::binary(BinaryOp::Like, self.as_arg(), pattern)
    }

    fn not_like(&self, pattern: impl Into<Arg>) -> F {
        F::binary(BinaryOp::NotLike, self.as_arg(), pattern)
    }

    fn int_div(&self, other: impl Into<Arg>) -> F {
        F::new("intDiv", vec![self.as_arg(), other.into()])
    }
}

/// Lists on the right of `IN` are written as tuples.
fn in_operand(arg: Arg) -> Arg {
    match arg {
        Arg::Array(items) => Arg::Tuple(items),
        v => v,
    }
}

impl Operators for F {
    fn as_arg(&self) -> Arg {
        self.into()
    }
}

impl Operators for Col {
    fn as_arg(&self) -> Arg {
        self.into()
    }
}

macro_rules! impl_binary_ops {
    ($($ty:ty),+) => {
        $(
            impl_binary_ops!(@op $ty, Add, add, Addition);
            impl_binary_ops!(@op $ty, Sub, sub, Subtraction);
            impl_binary_ops!(@op $ty, Mul, mul, Multiplication);
            impl_binary_ops!(@op $ty, Div, div, Division);
            impl_binary_ops!(@op $ty, Rem, rem, Remainder);
            impl_binary_ops!(@op $ty, BitAnd, bitand, And);
            impl_binary_ops!(@op $ty, BitOr, bitor, Or);
            impl<R: Into<Arg>> ops::BitXor<R> for $ty {
                type Output = F;
                fn bitxor(self, rhs: R) -> F {
                    F::new("xor", vec![self.into(), rhs.into()])
                }
            }
            impl ops::Neg for $ty {
                type Output = F;
                fn neg(self) -> F {
                    F::new("negate", vec![self.into()])
                }
            }
            impl ops::Not for $ty {
                type Output = F;
                fn not(self) -> F {
                    F::new("not", vec![self.into()])
                }
            }
        )+
    };
    (@op $ty:ty, $trait:ident, $method:ident, $op:ident) => {
        impl<R: Into<Arg>> ops::$trait<R> for $ty {
            type Output = F;
            fn $method(self, rhs: R) -> F {
                F::binary(BinaryOp::$op, self, rhs)
            }
        }
    };
}
impl_binary_ops!(F, &F, Col, &Col);
