use std::cmp::Ordering;

use crate::runtime::{
    error::{TypeError, TypeResult},
    value::Value,
};

use super::{Operands, resolve};

impl Value {
    /// Orders two numbers or two strings (byte-wise). Any other pairing is
    /// a type error; unordered numbers (NaN) yield `None`.
    pub fn try_cmp(&self, rhs: &Value) -> TypeResult<Option<Ordering>> {
        match resolve(self, rhs, "compare")? {
            Operands::Numbers(l, r) => Ok(l.partial_cmp(&r)),
            Operands::Strings => {
                let ordering = self
                    .with_str(|l| rhs.with_str(|r| l.cmp(r)))
                    .flatten();
                Ok(ordering)
            }
            Operands::Same(kind) => Err(TypeError::conflict("compare", kind, kind)),
        }
    }

    pub fn try_lt(&self, rhs: &Value) -> TypeResult<bool> {
        Ok(self.try_cmp(rhs)? == Some(Ordering::Less))
    }

    pub fn try_gt(&self, rhs: &Value) -> TypeResult<bool> {
        Ok(self.try_cmp(rhs)? == Some(Ordering::Greater))
    }

    pub fn try_le(&self, rhs: &Value) -> TypeResult<bool> {
        Ok(matches!(
            self.try_cmp(rhs)?,
            Some(Ordering::Less | Ordering::Equal)
        ))
    }

    pub fn try_ge(&self, rhs: &Value) -> TypeResult<bool> {
        Ok(matches!(
            self.try_cmp(rhs)?,
            Some(Ordering::Greater | Ordering::Equal)
        ))
    }

    /// Equality that refuses to compare different kinds.
    ///
    /// `==` on [`Value`] simply answers `false` for a kind mix; this variant
    /// reports it instead.
    pub fn try_eq(&self, rhs: &Value) -> TypeResult<bool> {
        let (lk, rk) = (self.kind(), rhs.kind());
        if lk != rk {
            return Err(TypeError::conflict("compare", lk, rk));
        }
        Ok(self == rhs)
    }

    pub fn try_ne(&self, rhs: &Value) -> TypeResult<bool> {
        Ok(!self.try_eq(rhs)?)
    }
}
