//! Formation rules: one factory per node kind, each returning the canonical
//! node after checking, canonicalizing and reducing what it can.
//!
//! Every factory comes in two flavors. `try_*` returns producer-side errors
//! as [`KernelError`]s; the plain form treats them as fatal. Object-language
//! errors (a qualifier violation, an out-of-bounds array index) never surface
//! as `Err`; they produce [`Tag::Error`] sentinels.

mod atoms;
mod pi;
mod sigma;
mod variadic;
mod variant;

#[cfg(test)]
mod sigma_test;

use crate::{Def, KernelError, Qualifier, Result, Sort, Tag, World, error::fatal};
use smallvec::SmallVec;

pub(crate) type Ops = SmallVec<[Def; 8]>;

impl<'a> World<'a> {
    pub(crate) fn try_type_of(&self, def: Def) -> Result<Def> {
        def.ty(self)
            .ok_or(KernelError::Malformed("the universe has no type"))
    }

    pub(crate) fn type_of(&self, def: Def) -> Def {
        match self.try_type_of(def) {
            Ok(ty) => ty,
            Err(err) => fatal(err),
        }
    }

    /// Operand of a type former: a type or a kind.
    pub(crate) fn expect_type_like(&self, def: Def) -> Result<()> {
        match def.sort(self) {
            Sort::Type | Sort::Kind => Ok(()),
            Sort::Term => Err(KernelError::ExpectedShape {
                expected: "type",
                def,
            }),
            Sort::Universe => Err(KernelError::Malformed("the universe cannot be an operand")),
        }
    }

    pub(crate) fn check_qualifier(&self, q: Def) -> Result<()> {
        let ty = self.try_type_of(q)?;
        if ty == self.qualifier_type() {
            Ok(())
        } else {
            Err(KernelError::TypeMismatch {
                expected: self.qualifier_type(),
                found: ty,
            })
        }
    }

    /// The qualifier a type was declared with: the operand of its `Star`
    /// kind, unrestricted for anything living in the universe.
    pub(crate) fn declared_qualifier(&self, kind: Def) -> Def {
        match kind.tag(self) {
            Tag::Star => kind.op(self, 0),
            _ => self.qualifier(Qualifier::Unrestricted),
        }
    }

    /// Kind of a type former over `ops`: `*q`, or the universe as soon as
    /// one operand is itself a kind.
    pub(crate) fn kind_above(&mut self, ops: &[Def], q: Def) -> Def {
        if ops.iter().any(|&op| op.sort(self) >= Sort::Kind) {
            self.universe()
        } else {
            self.star_of(q)
        }
    }

    /// The qualifier of `def`, which lives under `binders` binders, as seen
    /// from outside them. Falls back to linear when the qualifier mentions a
    /// bound level.
    pub(crate) fn qualifier_outside(&mut self, def: Def, binders: usize) -> Def {
        let q = def.qualifier(self);
        if binders == 0 || q.is_closed(self) {
            q
        } else if q.free_vars(self).any_below(binders) {
            self.qualifier(Qualifier::Linear)
        } else {
            self.shift_free_vars(q, -(binders as isize))
        }
    }

    /// Number of components of a tuple type whose arity is a literal.
    pub fn literal_arity(&self, ty: Def) -> Option<u64> {
        match ty.tag(self) {
            Tag::Sigma => Some(ty.num_ops(self) as u64),
            Tag::Variadic => match ty.op(self, 0).tag(self) {
                Tag::Arity(n) => Some(n),
                _ => None,
            },
            _ => None,
        }
    }

    /// Component types of a tuple type with literal arity, each under as
    /// many binders as components precede it.
    pub(crate) fn tuple_components(&mut self, ty: Def) -> Option<Ops> {
        match ty.tag(self) {
            Tag::Sigma if ty.is_tied(self) => Some(Ops::from_slice(ty.ops(self))),
            Tag::Variadic => {
                let Tag::Arity(n) = ty.op(self, 0).tag(self) else {
                    return None;
                };
                let body = ty.op(self, 1);
                let mut components = Ops::with_capacity(n as usize);
                for i in 0..n {
                    let index = self.index(n, i);
                    let component = self.reduce(body, &[index]);
                    components.push(self.shift_free_vars(component, i as isize));
                }
                Some(components)
            }
            _ => None,
        }
    }

    /// A tuple of fresh variables, one per component, typed `ty` shifted
    /// under those `components.len()` binders. Used when a single tuple
    /// binder is split into one binder per component.
    pub(crate) fn bound_tuple(&mut self, ty: Def, components: &[Def]) -> Def {
        let n = components.len();
        let mut vars = Ops::with_capacity(n);
        for (j, &component) in components.iter().enumerate() {
            let var_ty = self.shift_free_vars(component, (n - j) as isize);
            vars.push(self.var(var_ty, n - 1 - j));
        }
        let ty = self.shift_free_vars(ty, n as isize);
        self.tuple_typed(ty, &vars)
    }

    /// Splits a single binder over a tuple type into one binder per
    /// component and rewrites `body` accordingly.
    ///
    /// Returns `None` when `ty` is not a structural tuple type of literal
    /// arity of at least two.
    pub(crate) fn split_binder(&mut self, ty: Def, body: Def) -> Option<(Ops, Def)> {
        if ty.is_nominal(self) || !matches!(ty.tag(self), Tag::Sigma | Tag::Variadic) {
            return None;
        }
        let components = self.tuple_components(ty)?;
        if components.len() < 2 {
            return None;
        }
        let n = components.len();
        let packed = self.bound_tuple(ty, &components);
        let body = self.substitute(body, &[packed], n);
        Some((components, body))
    }
}

/// Members sorted by id with duplicates removed.
pub(crate) fn sorted_unique(ops: &[Def]) -> Ops {
    let mut members = Ops::from_slice(ops);
    members.sort_unstable();
    members.dedup();
    members
}
