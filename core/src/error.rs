use crate::{Def, Qualifier};
use thiserror::Error;

/// Producer-side errors raised while building the term graph.
///
/// These indicate a bug in the code driving the [`World`](crate::World),
/// never in the program being represented: object-language errors become
/// [`Tag::Error`](crate::Tag::Error) sentinels instead. The `try_*` factories
/// return them; the plain factories treat them as fatal.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum KernelError {
    #[error("type mismatch: expected {expected:?}, found {found:?}")]
    TypeMismatch { expected: Def, found: Def },

    #[error("{def:?} is not a {expected}")]
    ExpectedShape { expected: &'static str, def: Def },

    #[error("arity mismatch: expected {expected}, found {found}")]
    ArityMismatch { expected: u64, found: u64 },

    #[error("{def:?} is {qualifier} and has already been used")]
    QualifierViolation { def: Def, qualifier: Qualifier },

    #[error("malformed construction: {0}")]
    Malformed(&'static str),

    #[error("binder depth {level} exceeds the configured limit of {limit}")]
    BitsetOverflow { level: usize, limit: usize },
}

pub type Result<T, E = KernelError> = core::result::Result<T, E>;

/// Aborts construction after a producer-side invariant violation.
#[cold]
#[track_caller]
pub(crate) fn fatal(err: KernelError) -> ! {
    tracing::error!(%err, "kernel invariant violated");
    panic!("{err}")
}

pub(crate) trait OrFatal<T> {
    fn or_fatal(self) -> T;
}

impl<T> OrFatal<T> for Result<T> {
    #[track_caller]
    fn or_fatal(self) -> T {
        match self {
            Ok(value) => value,
            Err(err) => fatal(err),
        }
    }
}
