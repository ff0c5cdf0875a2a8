use crate::{
    Def, KernelError, Normalizer, Qualifier, Result, Sort, Tag, World, error::OrFatal,
};
use tracing::debug;

impl<'a> World<'a> {
    /// `*q` for a possibly symbolic qualifier `q`.
    pub fn star_of(&mut self, q: Def) -> Def {
        self.try_star_of(q).or_fatal()
    }

    pub fn try_star_of(&mut self, q: Def) -> Result<Def> {
        self.check_qualifier(q)?;
        if let Tag::Qualifier(literal) = q.tag(self) {
            return Ok(self.star(literal));
        }
        let universe = self.universe();
        Ok(self.intern(Tag::Star, Some(universe), &[q]))
    }

    pub fn arity(&mut self, n: u64) -> Def {
        let kind = self.arity_kind();
        self.intern(Tag::Arity(n), Some(kind), &[])
    }

    /// Index literal `i` ranging over `arity(n)`.
    pub fn index(&mut self, n: u64, i: u64) -> Def {
        self.try_index(n, i).or_fatal()
    }

    pub fn try_index(&mut self, n: u64, i: u64) -> Result<Def> {
        if i >= n {
            return Err(KernelError::ArityMismatch {
                expected: n,
                found: i,
            });
        }
        let arity = self.arity(n);
        Ok(self.intern(Tag::Index(i), Some(arity), &[]))
    }

    /// An opaque literal value of type `ty`.
    ///
    /// Literals of an unrestricted type are shared. A literal whose type
    /// restricts usage is a fresh node on every call, so two constructions
    /// are two separate resources.
    pub fn lit(&mut self, ty: Def, value: u64) -> Def {
        self.try_lit(ty, value).or_fatal()
    }

    pub fn try_lit(&mut self, ty: Def, value: u64) -> Result<Def> {
        if ty.sort(self) != Sort::Type {
            return Err(KernelError::ExpectedShape {
                expected: "type",
                def: ty,
            });
        }
        let restricted = ty
            .known_qualifier(self)
            .is_some_and(|q| q != Qualifier::Unrestricted);
        if restricted && ty.is_closed(self) {
            return Ok(self.alloc_nominal(Tag::Lit(value), ty, 0, None));
        }
        Ok(self.intern(Tag::Lit(value), Some(ty), &[]))
    }

    pub fn lit_nat(&mut self, value: u64) -> Def {
        let nat = self.type_nat();
        self.lit(nat, value)
    }

    pub fn lit_bool(&mut self, value: bool) -> Def {
        let bool = self.type_bool();
        self.lit(bool, value as u64)
    }

    /// De Bruijn variable referring to the binder `level` levels out.
    pub fn var(&mut self, ty: Def, level: usize) -> Def {
        self.try_var(ty, level).or_fatal()
    }

    pub fn try_var(&mut self, ty: Def, level: usize) -> Result<Def> {
        self.expect_type_like(ty)?;
        self.check_level(level)?;
        let level = u32::try_from(level).map_err(|_| KernelError::BitsetOverflow {
            level,
            limit: u32::MAX as usize,
        })?;
        Ok(self.intern(Tag::Var(level), Some(ty), &[]))
    }

    /// A fresh opaque constant. Never equal to any other node.
    pub fn axiom(&mut self, ty: Def, name: &str) -> Def {
        self.try_axiom(ty, name).or_fatal()
    }

    pub fn try_axiom(&mut self, ty: Def, name: &str) -> Result<Def> {
        self.expect_type_like(ty)?;
        if !ty.is_closed(self) {
            return Err(KernelError::Malformed("an axiom's type must be closed"));
        }
        let name = self.intern_str(name);
        Ok(self.alloc_nominal(Tag::Axiom, ty, 0, Some(name)))
    }

    /// An axiom whose applications are handed to `normalizer` once they
    /// cannot be beta-reduced.
    pub fn axiom_with_normalizer(&mut self, ty: Def, normalizer: Normalizer, name: &str) -> Def {
        let axiom = self.axiom(ty, name);
        self.set_normalizer(axiom, normalizer);
        axiom
    }

    /// The error sentinel of type `ty`.
    pub fn error(&mut self, ty: Def) -> Def {
        debug!(?ty, "error sentinel");
        self.intern(Tag::Error, Some(ty), &[])
    }

    /// The type inhabited only by `term`.
    pub fn singleton(&mut self, term: Def) -> Def {
        self.try_singleton(term).or_fatal()
    }

    pub fn try_singleton(&mut self, term: Def) -> Result<Def> {
        if term.sort(self) != Sort::Term {
            return Err(KernelError::ExpectedShape {
                expected: "term",
                def: term,
            });
        }
        let ty = self.type_of(term);
        let kind = self.type_of(ty);
        Ok(self.intern(Tag::Singleton, Some(kind), &[term]))
    }

    /// The empty tuple type.
    pub fn unit(&mut self) -> Def {
        self.sigma(&[])
    }

    /// The only value of [`World::unit`].
    pub fn unit_value(&mut self) -> Def {
        self.tuple(&[])
    }

    pub(crate) fn unrestricted(&self) -> Def {
        self.qualifier(Qualifier::Unrestricted)
    }
}
