//! The node model.
//!
//! Every program fragment, type, kind and the universe itself is a [`Def`]:
//! a small copyable handle into the [`World`] that owns the node. Accessors
//! take the world explicitly, e.g. `def.ty(&world)` or `def.ops(&world)`.

mod free_vars;

pub use free_vars::FreeVars;

use crate::{Qualifier, World};
use bitflags::bitflags;
use core::fmt;
use smallvec::SmallVec;

/// Handle to a node owned by a [`World`].
///
/// Handles are assigned in allocation order, so the raw index doubles as the
/// node's global id: it orders commutative operand lists and answers "newer
/// than" queries. Two structural handles are equal iff the nodes are equal.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Def(u32);

static_assertions::assert_eq_size!(Def, u32);

impl Def {
    /// Operand slot of a nominal node whose operand is not installed yet.
    pub(crate) const UNSET: Def = Def(u32::MAX);

    pub(crate) fn from_index(index: usize) -> Def {
        debug_assert!(index < u32::MAX as usize);
        Def(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// Unique id, increasing with allocation order.
    pub fn gid(self) -> u32 {
        self.0
    }

    pub fn tag(self, w: &World<'_>) -> Tag {
        w.data(self).tag
    }

    pub fn sort(self, w: &World<'_>) -> Sort {
        w.data(self).sort
    }

    /// The type of this node; `None` only for the universe.
    pub fn ty(self, w: &World<'_>) -> Option<Def> {
        w.data(self).ty
    }

    /// Operand list. Slots of a nominal node that are not installed yet are
    /// skipped by [`Def::op_slot`], but appear here as placeholders.
    pub fn ops<'a>(self, w: &World<'a>) -> &'a [Def] {
        w.data(self).ops
    }

    pub fn op(self, w: &World<'_>, i: usize) -> Def {
        self.ops(w)[i]
    }

    /// Operand `i`, or `None` for a nominal slot still awaiting its operand.
    pub fn op_slot(self, w: &World<'_>, i: usize) -> Option<Def> {
        self.ops(w).get(i).copied().filter(|&op| op != Def::UNSET)
    }

    pub fn num_ops(self, w: &World<'_>) -> usize {
        self.ops(w).len()
    }

    /// The last operand: the body of a binder or quantifier.
    pub fn body(self, w: &World<'_>) -> Def {
        let ops = self.ops(w);
        ops[ops.len() - 1]
    }

    pub fn free_vars<'w>(self, w: &'w World<'_>) -> &'w FreeVars {
        &w.data(self).free_vars
    }

    pub fn has_free_var(self, w: &World<'_>, level: usize) -> bool {
        self.free_vars(w).contains(level)
    }

    /// No de Bruijn level occurs free.
    pub fn is_closed(self, w: &World<'_>) -> bool {
        self.free_vars(w).is_empty()
    }

    pub fn uses<'w>(self, w: &'w World<'_>) -> &'w [Use] {
        &w.data(self).uses
    }

    pub fn flags(self, w: &World<'_>) -> DefFlags {
        w.data(self).flags
    }

    pub fn is_nominal(self, w: &World<'_>) -> bool {
        self.flags(w).contains(DefFlags::NOMINAL)
    }

    pub fn is_structural(self, w: &World<'_>) -> bool {
        !self.is_nominal(w)
    }

    /// All operand slots of this node are installed.
    pub fn is_tied(self, w: &World<'_>) -> bool {
        !self.ops(w).contains(&Def::UNSET)
    }

    pub fn is_error(self, w: &World<'_>) -> bool {
        self.tag(w) == Tag::Error
    }

    /// This node or some node below it is an error sentinel.
    pub fn has_error(self, w: &World<'_>) -> bool {
        self.flags(w).contains(DefFlags::HAS_ERROR)
    }

    pub fn name<'a>(self, w: &World<'a>) -> Option<&'a str> {
        w.data(self).name
    }

    /// The usage qualifier of this node, possibly symbolic.
    ///
    /// Values inherit the qualifier of their type, types carry the qualifier
    /// of their `Star` kind, and everything else is unrestricted.
    pub fn qualifier(self, w: &World<'_>) -> Def {
        let data = w.data(self);
        match (data.sort, data.ty) {
            (Sort::Term, Some(ty)) => ty.qualifier(w),
            (Sort::Type, Some(kind)) if kind.tag(w) == Tag::Star => kind.op(w, 0),
            _ => w.qualifier(Qualifier::Unrestricted),
        }
    }

    /// The qualifier, when it is a literal.
    pub fn known_qualifier(self, w: &World<'_>) -> Option<Qualifier> {
        match self.qualifier(w).tag(w) {
            Tag::Qualifier(q) => Some(q),
            _ => None,
        }
    }
}

impl fmt::Debug for Def {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Def::UNSET {
            f.write_str("%unset")
        } else {
            write!(f, "%{}", self.0)
        }
    }
}

/// Node kinds, with the literal payload a few of them carry.
///
/// Operand layouts:
///
/// | tag | operands | binders |
/// |-----|----------|---------|
/// | `Star` | `[qualifier]` | |
/// | `Pi` | `[domain_0, .., domain_{n-1}, codomain]` | op `i` under `i` |
/// | `Lambda` | `[body]` | under the `n` domains of its type |
/// | `App` | `[callee, arg_0, .., arg_{n-1}]` | |
/// | `Sigma` / `Tuple` | components | Sigma op `i` under `i` |
/// | `Extract` | `[tuple, index]` | |
/// | `Variadic` / `Pack` | `[arity, body]` | body under 1 |
/// | `Variant` / `Intersection` | members sorted by gid | |
/// | `Any` / `Pick` / `Singleton` | `[value]` | |
/// | `Match` | `[value, handler_0, ..]` | |
/// | `All` | one value per member | |
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Tag {
    Universe,
    /// `*q`, the kind of types whose values carry qualifier `q`.
    Star,
    /// `ℚ`, the kind of qualifiers.
    QualifierType,
    Qualifier(Qualifier),
    /// `𝔸`, the kind of arities.
    ArityKind,
    Arity(u64),
    /// An index literal; its type is the arity it ranges over.
    Index(u64),
    Lit(u64),
    Axiom,
    Var(u32),
    Error,
    Pi,
    Lambda,
    App,
    Sigma,
    Tuple,
    Extract,
    Variadic,
    Pack,
    Variant,
    Any,
    Match,
    Intersection,
    All,
    Pick,
    Singleton,
}

impl Tag {
    /// Number of binders operand `i` of an `n`-operand node lives under.
    ///
    /// Lambdas bind the domains of their type, which the caller supplies as
    /// `lambda_arity`.
    pub fn binders_of_op(self, i: usize, lambda_arity: usize) -> usize {
        match self {
            Tag::Pi | Tag::Sigma | Tag::Variadic | Tag::Pack => i,
            Tag::Lambda => lambda_arity,
            _ => 0,
        }
    }
}

/// Position in the hierarchy. A node's sort is one below its type's.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Sort {
    Term,
    Type,
    Kind,
    Universe,
}

impl Sort {
    /// Sort of the nodes classified by a node of this sort.
    pub(crate) fn below(self) -> Option<Sort> {
        match self {
            Sort::Universe => Some(Sort::Kind),
            Sort::Kind => Some(Sort::Type),
            Sort::Type => Some(Sort::Term),
            Sort::Term => None,
        }
    }
}

bitflags! {
    /// Properties computed once when a node is allocated.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct DefFlags: u8 {
        const NOMINAL = 1;
        const HAS_ERROR = 1 << 1;
    }
}

impl DefFlags {
    /// Flags inherited from operands and type.
    pub(crate) const PROPAGATED: DefFlags = DefFlags::HAS_ERROR;
}

/// A back-reference: `user` holds this node in operand slot `index`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Use {
    pub user: Def,
    pub index: u32,
}

pub(crate) struct DefData<'a> {
    pub(crate) tag: Tag,
    pub(crate) sort: Sort,
    pub(crate) ty: Option<Def>,
    pub(crate) ops: &'a [Def],
    pub(crate) free_vars: FreeVars,
    pub(crate) flags: DefFlags,
    pub(crate) hash: u64,
    pub(crate) name: Option<&'a str>,
    pub(crate) uses: SmallVec<[Use; 2]>,
    /// Reduced form of an application.
    pub(crate) cache: Option<Def>,
}
