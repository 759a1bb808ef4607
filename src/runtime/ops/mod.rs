//! Arithmetic and comparison over values.
//!
//! Every binary operation requires both operands to share a kind; a mix
//! reports a [`TypeError::KindConflict`](crate::runtime::error::TypeError)
//! naming both. Nothing is coerced.

mod binary_ops;
mod comparison_ops;

use crate::runtime::{
    error::{TypeError, TypeResult},
    value::{Kind, Repr, Value},
};

/// Operands resolved to a common kind.
enum Operands {
    Numbers(f64, f64),
    Strings,
    Same(Kind),
}

fn resolve(lhs: &Value, rhs: &Value, op: &'static str) -> TypeResult<Operands> {
    match (lhs.live_repr(), rhs.live_repr()) {
        (Repr::Number(l), Repr::Number(r)) => Ok(Operands::Numbers(l, r)),
        (Repr::String(_), Repr::String(_)) => Ok(Operands::Strings),
        _ => {
            let (lk, rk) = (lhs.kind(), rhs.kind());
            if lk == rk {
                Ok(Operands::Same(lk))
            } else {
                Err(TypeError::conflict(op, lk, rk))
            }
        }
    }
}
