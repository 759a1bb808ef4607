use thiserror::Error;

use crate::runtime::value::Kind;

/// Misuse of a value: the operation does not apply to the kind(s) involved.
///
/// A weak value whose payload has been freed behaves as nil, so operating on
/// it reports a [`TypeError::KindMismatch`] against `nil`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("cannot {op} a {kind} value")]
    KindMismatch { op: &'static str, kind: Kind },

    #[error("cannot {op} {lhs} and {rhs}")]
    KindConflict {
        op: &'static str,
        lhs: Kind,
        rhs: Kind,
    },
}

impl TypeError {
    pub fn mismatch(op: &'static str, kind: Kind) -> Self {
        TypeError::KindMismatch { op, kind }
    }

    pub fn conflict(op: &'static str, lhs: Kind, rhs: Kind) -> Self {
        TypeError::KindConflict { op, lhs, rhs }
    }
}

pub type TypeResult<T> = Result<T, TypeError>;
