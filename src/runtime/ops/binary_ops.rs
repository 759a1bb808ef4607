use std::ops::{Add, BitXor, Div, Mul, Neg, Rem, Sub};

use crate::runtime::{
    error::{TypeError, TypeResult},
    value::Value,
};

use super::{Operands, resolve};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArithOp {
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

impl ArithOp {
    fn name(self) -> &'static str {
        match self {
            ArithOp::Sub => "subtract",
            ArithOp::Mul => "multiply",
            ArithOp::Div => "divide",
            ArithOp::Rem => "take the remainder of",
            ArithOp::Pow => "exponentiate",
        }
    }

    fn apply(self, l: f64, r: f64) -> f64 {
        match self {
            ArithOp::Sub => l - r,
            ArithOp::Mul => l * r,
            ArithOp::Div => l / r,
            // `%` on f64 truncates toward zero, matching C's fmod.
            ArithOp::Rem => l % r,
            ArithOp::Pow => l.powf(r),
        }
    }
}

impl Value {
    /// Adds two numbers or concatenates two strings.
    pub fn try_add(&self, rhs: &Value) -> TypeResult<Value> {
        match resolve(self, rhs, "add")? {
            Operands::Numbers(l, r) => Ok(Value::from(l + r)),
            Operands::Strings => {
                let mut joined = self.string_content()?;
                rhs.with_str(|text| joined.push_str(text));
                Ok(Value::from(joined))
            }
            Operands::Same(kind) => Err(TypeError::conflict("add", kind, kind)),
        }
    }

    pub fn try_sub(&self, rhs: &Value) -> TypeResult<Value> {
        self.arith(rhs, ArithOp::Sub)
    }

    pub fn try_mul(&self, rhs: &Value) -> TypeResult<Value> {
        self.arith(rhs, ArithOp::Mul)
    }

    pub fn try_div(&self, rhs: &Value) -> TypeResult<Value> {
        self.arith(rhs, ArithOp::Div)
    }

    pub fn try_rem(&self, rhs: &Value) -> TypeResult<Value> {
        self.arith(rhs, ArithOp::Rem)
    }

    pub fn try_pow(&self, rhs: &Value) -> TypeResult<Value> {
        self.arith(rhs, ArithOp::Pow)
    }

    pub fn try_neg(&self) -> TypeResult<Value> {
        match self.as_number() {
            Some(n) => Ok(Value::from(-n)),
            None => Err(TypeError::mismatch("negate", self.kind())),
        }
    }

    fn arith(&self, rhs: &Value, op: ArithOp) -> TypeResult<Value> {
        match resolve(self, rhs, op.name())? {
            Operands::Numbers(l, r) => Ok(Value::from(op.apply(l, r))),
            Operands::Strings => Err(TypeError::conflict(
                op.name(),
                self.kind(),
                rhs.kind(),
            )),
            Operands::Same(kind) => Err(TypeError::conflict(op.name(), kind, kind)),
        }
    }
}

macro_rules! binary_operator {
    ($($trait:ident :: $method:ident => $call:ident),* $(,)?) => {
        $(
            impl $trait<&Value> for &Value {
                type Output = TypeResult<Value>;

                fn $method(self, rhs: &Value) -> Self::Output {
                    self.$call(rhs)
                }
            }

            impl $trait<Value> for Value {
                type Output = TypeResult<Value>;

                fn $method(self, rhs: Value) -> Self::Output {
                    self.$call(&rhs)
                }
            }
        )*
    };
}

binary_operator!(
    Add::add => try_add,
    Sub::sub => try_sub,
    Mul::mul => try_mul,
    Div::div => try_div,
    Rem::rem => try_rem,
    BitXor::bitxor => try_pow,
);

impl Neg for &Value {
    type Output = TypeResult<Value>;

    fn neg(self) -> Self::Output {
        self.try_neg()
    }
}

impl Neg for Value {
    type Output = TypeResult<Value>;

    fn neg(self) -> Self::Output {
        self.try_neg()
    }
}
