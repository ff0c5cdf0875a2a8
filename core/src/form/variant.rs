//! Tagged unions, intersections and qualifier bounds.
//!
//! Members of a Variant or Intersection are kept sorted by id without
//! duplicates, so the same set of members always yields the same node.
//! Over qualifiers, Variant is the join and Intersection the meet: literal
//! members fold eagerly and only symbolic ones remain in a residual node.

use super::{Ops, sorted_unique};
use crate::{Def, KernelError, Qualifier, Result, Tag, World, error::OrFatal};
use smallvec::smallvec;

#[derive(Clone, Copy)]
enum Bound {
    Join,
    Meet,
}

impl Bound {
    fn identity(self) -> Qualifier {
        match self {
            Bound::Join => Qualifier::Unrestricted,
            Bound::Meet => Qualifier::Linear,
        }
    }

    fn absorbing(self) -> Qualifier {
        match self {
            Bound::Join => Qualifier::Linear,
            Bound::Meet => Qualifier::Unrestricted,
        }
    }

    fn apply(self, a: Qualifier, b: Qualifier) -> Qualifier {
        match self {
            Bound::Join => a.combine(b),
            Bound::Meet => a.meet(b),
        }
    }

    fn residual_tag(self) -> Tag {
        match self {
            Bound::Join => Tag::Variant,
            Bound::Meet => Tag::Intersection,
        }
    }
}

impl<'a> World<'a> {
    /// Least upper bound of qualifiers.
    pub fn lub(&mut self, qualifiers: &[Def]) -> Def {
        self.try_lub(qualifiers).or_fatal()
    }

    pub fn try_lub(&mut self, qualifiers: &[Def]) -> Result<Def> {
        self.bound(Bound::Join, qualifiers)
    }

    /// Greatest lower bound of qualifiers.
    pub fn glb(&mut self, qualifiers: &[Def]) -> Def {
        self.try_glb(qualifiers).or_fatal()
    }

    pub fn try_glb(&mut self, qualifiers: &[Def]) -> Result<Def> {
        self.bound(Bound::Meet, qualifiers)
    }

    fn bound(&mut self, bound: Bound, qualifiers: &[Def]) -> Result<Def> {
        let residual_tag = bound.residual_tag();
        let mut acc = bound.identity();
        let mut symbolic = Ops::new();
        for &q in qualifiers {
            self.check_qualifier(q)?;
            match q.tag(self) {
                Tag::Qualifier(literal) => acc = bound.apply(acc, literal),
                tag if tag == residual_tag => {
                    for &member in q.ops(self) {
                        match member.tag(self) {
                            Tag::Qualifier(literal) => acc = bound.apply(acc, literal),
                            _ => symbolic.push(member),
                        }
                    }
                }
                _ => symbolic.push(q),
            }
        }
        if acc == bound.absorbing() || symbolic.is_empty() {
            return Ok(self.qualifier(acc));
        }
        if acc != bound.identity() {
            symbolic.push(self.qualifier(acc));
        }
        let members = sorted_unique(&symbolic);
        if let [member] = *members {
            return Ok(member);
        }
        let qualifier_type = self.qualifier_type();
        Ok(self.intern(residual_tag, Some(qualifier_type), &members))
    }

    fn all_qualifiers(&self, ops: &[Def]) -> bool {
        !ops.is_empty() && ops.iter().all(|&op| op.ty(self) == Some(self.qualifier_type()))
    }

    /// Tagged union of `ops`. A union of qualifiers is their join.
    pub fn variant(&mut self, ops: &[Def]) -> Def {
        let q = self.unrestricted();
        self.try_variant(ops, q).or_fatal()
    }

    pub fn variant_q(&mut self, ops: &[Def], q: Def) -> Def {
        self.try_variant(ops, q).or_fatal()
    }

    pub fn try_variant(&mut self, ops: &[Def], q: Def) -> Result<Def> {
        if self.all_qualifiers(ops) {
            return self.try_lub(ops);
        }
        self.check_qualifier(q)?;
        for &op in ops {
            self.expect_type_like(op)?;
        }
        let members = sorted_unique(ops);
        if let [member] = *members {
            return Ok(member);
        }
        let mut qualifiers: Ops = smallvec![q];
        qualifiers.extend(members.iter().map(|&m| m.qualifier(self)));
        let q = self.try_lub(&qualifiers)?;
        let ty = self.kind_above(&members, q);
        Ok(self.intern(Tag::Variant, Some(ty), &members))
    }

    fn is_union_type(&self, ty: Def) -> bool {
        ty.tag(self) == Tag::Variant && ty.ty(self) != Some(self.qualifier_type())
    }

    /// Injects `value` into the union type `variant`.
    pub fn any(&mut self, variant: Def, value: Def) -> Def {
        self.try_any(variant, value).or_fatal()
    }

    pub fn try_any(&mut self, variant: Def, value: Def) -> Result<Def> {
        let found = self.try_type_of(value)?;
        if !self.is_union_type(variant) {
            return if found == variant {
                Ok(value)
            } else {
                Err(KernelError::ExpectedShape {
                    expected: "variant type",
                    def: variant,
                })
            };
        }
        if !variant.ops(self).contains(&found) {
            return Err(KernelError::TypeMismatch {
                expected: variant,
                found,
            });
        }
        Ok(self.intern(Tag::Any, Some(variant), &[value]))
    }

    /// Eliminates a union value with one single-domain handler per member.
    ///
    /// Handlers may be given in any order; each is matched to the member its
    /// domain names, and all must return the same non-dependent type. A
    /// literal injection applies its handler directly.
    pub fn match_variant(&mut self, value: Def, handlers: &[Def]) -> Def {
        self.try_match_variant(value, handlers).or_fatal()
    }

    pub fn try_match_variant(&mut self, value: Def, handlers: &[Def]) -> Result<Def> {
        let value_ty = self.try_type_of(value)?;
        let members: Ops = if self.is_union_type(value_ty) {
            Ops::from_slice(value_ty.ops(self))
        } else {
            smallvec![value_ty]
        };
        if handlers.len() != members.len() {
            return Err(KernelError::ArityMismatch {
                expected: members.len() as u64,
                found: handlers.len() as u64,
            });
        }

        let mut ordered = Ops::with_capacity(handlers.len());
        let mut result_ty = None;
        for &member in &members {
            let handler = handlers.iter().copied().find(|&h| {
                h.ty(self).is_some_and(|pi| {
                    pi.tag(self) == Tag::Pi && pi.num_ops(self) == 2 && pi.op(self, 0) == member
                })
            });
            let Some(handler) = handler else {
                return Err(KernelError::ExpectedShape {
                    expected: "variant member with a handler",
                    def: member,
                });
            };
            let codomain = self.type_of(handler).op(self, 1);
            if codomain.has_free_var(self, 0) {
                return Err(KernelError::Malformed("match handlers must not be dependent"));
            }
            let codomain = self.shift_free_vars(codomain, -1);
            match result_ty {
                Some(expected) if expected != codomain => {
                    return Err(KernelError::TypeMismatch {
                        expected,
                        found: codomain,
                    });
                }
                _ => result_ty = Some(codomain),
            }
            ordered.push(handler);
        }
        let Some(result_ty) = result_ty else {
            return Err(KernelError::Malformed("match on an empty variant"));
        };

        if value.tag(self) == Tag::Any {
            let inner = value.op(self, 0);
            let inner_ty = self.type_of(inner);
            if let Some(i) = members.iter().position(|&m| m == inner_ty) {
                return self.try_app(ordered[i], &[inner]);
            }
        }
        if let [handler] = *ordered {
            return self.try_app(handler, &[value]);
        }
        if value.is_error(self) {
            return Ok(self.error(result_ty));
        }
        let mut ops: Ops = smallvec![value];
        ops.extend_from_slice(&ordered);
        Ok(self.intern(Tag::Match, Some(result_ty), &ops))
    }

    /// Intersection of `ops`. An intersection of qualifiers is their meet.
    pub fn intersection(&mut self, ops: &[Def]) -> Def {
        let q = self.unrestricted();
        self.try_intersection(ops, q).or_fatal()
    }

    pub fn intersection_q(&mut self, ops: &[Def], q: Def) -> Def {
        self.try_intersection(ops, q).or_fatal()
    }

    pub fn try_intersection(&mut self, ops: &[Def], q: Def) -> Result<Def> {
        if self.all_qualifiers(ops) {
            return self.try_glb(ops);
        }
        self.check_qualifier(q)?;
        for &op in ops {
            self.expect_type_like(op)?;
        }
        let members = sorted_unique(ops);
        if let [member] = *members {
            return Ok(member);
        }
        let q = if members.is_empty() {
            q
        } else {
            let qualifiers: Ops = members.iter().map(|&m| m.qualifier(self)).collect();
            let members_q = self.try_glb(&qualifiers)?;
            self.try_lub(&[q, members_q])?
        };
        let ty = self.kind_above(&members, q);
        Ok(self.intern(Tag::Intersection, Some(ty), &members))
    }

    fn is_intersection_type(&self, ty: Def) -> bool {
        ty.tag(self) == Tag::Intersection && ty.ty(self) != Some(self.qualifier_type())
    }

    /// A value of every member of `intersection`, one per member in any
    /// order.
    pub fn all(&mut self, intersection: Def, values: &[Def]) -> Def {
        self.try_all(intersection, values).or_fatal()
    }

    pub fn try_all(&mut self, intersection: Def, values: &[Def]) -> Result<Def> {
        if !self.is_intersection_type(intersection) {
            return match *values {
                [value] if self.try_type_of(value)? == intersection => Ok(value),
                _ => Err(KernelError::ExpectedShape {
                    expected: "intersection type",
                    def: intersection,
                }),
            };
        }
        let members = intersection.ops(self);
        if values.len() != members.len() {
            return Err(KernelError::ArityMismatch {
                expected: members.len() as u64,
                found: values.len() as u64,
            });
        }
        let mut ordered = Ops::with_capacity(values.len());
        for (i, &member) in members.iter().enumerate() {
            match values.iter().copied().find(|&v| v.ty(self) == Some(member)) {
                Some(value) => ordered.push(value),
                None => {
                    return Err(KernelError::TypeMismatch {
                        expected: member,
                        found: self.try_type_of(values[i])?,
                    });
                }
            }
        }
        Ok(self.intern(Tag::All, Some(intersection), &ordered))
    }

    /// Views `value` at one member type `ty` of its intersection type.
    pub fn pick(&mut self, ty: Def, value: Def) -> Def {
        self.try_pick(ty, value).or_fatal()
    }

    pub fn try_pick(&mut self, ty: Def, value: Def) -> Result<Def> {
        let value_ty = self.try_type_of(value)?;
        if value_ty == ty {
            return Ok(value);
        }
        let position = if self.is_intersection_type(value_ty) {
            value_ty.ops(self).iter().position(|&m| m == ty)
        } else {
            None
        };
        let Some(i) = position else {
            return Err(KernelError::TypeMismatch {
                expected: ty,
                found: value_ty,
            });
        };
        if value.tag(self) == Tag::All {
            return Ok(value.op(self, i));
        }
        if value.is_error(self) {
            return Ok(self.error(ty));
        }
        Ok(self.intern(Tag::Pick, Some(ty), &[value]))
    }
}
