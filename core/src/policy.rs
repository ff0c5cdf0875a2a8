//! Usage enforcement for substructural qualifiers.
//!
//! The lattice in [`crate::qualifier`] only attaches usage classes to types.
//! Whether a construction site rejects an over-used value is decided by the
//! [`UsagePolicy`] configured on the world. A rejected application becomes an
//! [`Tag::Error`] sentinel rather than aborting construction.

use crate::{Def, KernelError, Sort, Tag, World};
use core::fmt;

/// Admission check run by [`World::app`] for the callee and every argument.
///
/// `operands` is the callee followed by the arguments of the application
/// being built, `value` among them.
///
/// The check only runs for applications built by the caller. Applications
/// rebuilt while reducing (beta, uncurrying, dependent extraction) are
/// re-expressions of existing uses and are never checked.
pub trait UsagePolicy: fmt::Debug {
    fn admit(&self, world: &World<'_>, value: Def, operands: &[Def]) -> Result<(), KernelError>;
}

/// Rejects a second application use of any value whose qualifier is known to
/// carry the affine restriction (Affine or Linear).
///
/// Only literal qualifiers are checked; a value whose qualifier is a type
/// variable is admitted. Relevance ("used at least once") cannot be decided
/// while the graph is still growing and is left to a later pass.
///
/// A value may not occur twice among the operands of one application. Beyond
/// that, use counting is by application node: building the same application
/// twice returns the same node, and the second request is rejected because
/// the value already has a use in that node.
///
/// Variables are only checked within one application. `Var(ty, 0)` is a
/// single node shared by every binder of type `ty`, so its use list mixes
/// unrelated scopes.
#[derive(Clone, Copy, Debug, Default)]
pub struct EagerSubstructural;

impl UsagePolicy for EagerSubstructural {
    fn admit(&self, world: &World<'_>, value: Def, operands: &[Def]) -> Result<(), KernelError> {
        if value.sort(world) != Sort::Term {
            return Ok(());
        }
        let Some(qualifier) = value.known_qualifier(world) else {
            return Ok(());
        };
        if !qualifier.is_affine() {
            return Ok(());
        }
        let repeated = operands.iter().filter(|&&op| op == value).count() > 1;
        let used = !matches!(value.tag(world), Tag::Var(_))
            && value
                .uses(world)
                .iter()
                .any(|u| u.user.tag(world) == Tag::App);
        if repeated || used {
            Err(KernelError::QualifierViolation {
                def: value,
                qualifier,
            })
        } else {
            Ok(())
        }
    }
}

/// Admits everything, leaving usage checking to a separate pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unchecked;

impl UsagePolicy for Unchecked {
    fn admit(
        &self,
        _world: &World<'_>,
        _value: Def,
        _operands: &[Def],
    ) -> Result<(), KernelError> {
        Ok(())
    }
}
