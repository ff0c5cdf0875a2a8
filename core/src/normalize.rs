//! Extension point for rewriting applications of opaque axioms.
//!
//! The kernel knows nothing about arithmetic or any other concrete operator.
//! Instead, an axiom can be created with a [`Normalizer`]; whenever an
//! application whose head is that axiom cannot be beta-reduced, the
//! normalizer gets to look at the operands and decide what the application
//! means.
//!
//! ```
//! use bumpalo::Bump;
//! use ural_core::{Def, Rewrite, Tag, World};
//!
//! fn fold_add(w: &mut World<'_>, _callee: Def, args: &[Def]) -> Rewrite {
//!     match (args[0].tag(w), args[1].tag(w)) {
//!         (Tag::Lit(a), Tag::Lit(b)) => match a.checked_add(b) {
//!             Some(sum) => Rewrite::Replace(w.lit_nat(sum)),
//!             None => Rewrite::Undefined,
//!         },
//!         _ => Rewrite::Keep,
//!     }
//! }
//!
//! let arena = Bump::new();
//! let mut w = World::new(&arena);
//! let nat = w.type_nat();
//! let add_ty = w.pi(&[nat, nat], nat);
//! let add = w.axiom_with_normalizer(add_ty, fold_add, "add");
//!
//! let two = w.lit_nat(2);
//! let three = w.lit_nat(3);
//! let sum = w.app(add, &[two, three]);
//! assert_eq!(sum, w.lit_nat(5));
//! ```

use crate::{Def, World};

/// What a normalizer decided about an application.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rewrite {
    /// No simplification; the application stays a neutral term.
    Keep,
    /// The application equals this term.
    Replace(Def),
    /// The application has no defined value (e.g. arithmetic overflow); it
    /// becomes an error sentinel of the application's type.
    Undefined,
}

/// Rewrites `callee(args)`. `callee` may itself be a partial application
/// whose head is the axiom the normalizer is registered on.
pub type Normalizer = for<'w> fn(&mut World<'w>, Def, &[Def]) -> Rewrite;
