//! Uniform arrays: `Variadic(arity, body)` is `arity` copies of `body`,
//! and `Pack(arity, body)` its value. The body lives under one binder, the
//! running index.

use super::Ops;
use crate::{Def, KernelError, Result, Tag, World, error::OrFatal};
use tracing::debug;

impl<'a> World<'a> {
    pub fn variadic(&mut self, arity: Def, body: Def) -> Def {
        let q = self.unrestricted();
        self.try_variadic(arity, body, q).or_fatal()
    }

    pub fn variadic_q(&mut self, arity: Def, body: Def, q: Def) -> Def {
        self.try_variadic(arity, body, q).or_fatal()
    }

    /// `Variadic(arity(n), body)`.
    pub fn variadic_n(&mut self, n: u64, body: Def) -> Def {
        let arity = self.arity(n);
        self.variadic(arity, body)
    }

    /// Nested variadics, outermost first: `variadic_nd(&[3, 8], t)` is a
    /// 3-array of 8-arrays of `t`. `body` does not see the indices, and no
    /// dimensions at all leave it as is.
    pub fn variadic_nd(&mut self, arities: &[u64], body: Def) -> Def {
        if arities.is_empty() {
            return body;
        }
        let arity = self.arities(arities);
        let body = self.shift_free_vars(body, 1);
        self.variadic(arity, body)
    }

    /// A literal arity keeps the compressed form only while `body` ignores
    /// the index: otherwise it expands into an explicit Sigma. Arity 0 is
    /// the unit type and arity 1 is `body` at index 0. An arity that is a
    /// tuple of arities yields nested variadics.
    pub fn try_variadic(&mut self, arity: Def, body: Def, q: Def) -> Result<Def> {
        self.check_qualifier(q)?;
        self.expect_type_like(body)?;
        if self.try_type_of(arity)? != self.arity_kind() {
            return self.nest(arity, body, &mut |w, arity, body| w.try_variadic(arity, body, q));
        }
        match arity.tag(self) {
            Tag::Arity(0) => return self.try_sigma(&[], q),
            Tag::Arity(1) => {
                let index = self.index(1, 0);
                let component = self.reduce(body, &[index]);
                return self.try_sigma(&[component], q);
            }
            Tag::Arity(n) if body.has_free_var(self, 0) => {
                let mut components = Ops::with_capacity(n as usize);
                for i in 0..n {
                    let index = self.index(n, i);
                    let component = self.reduce(body, &[index]);
                    components.push(self.shift_free_vars(component, i as isize));
                }
                debug!(?arity, ?body, "expanded dependent variadic");
                return self.try_sigma(&components, q);
            }
            _ => {}
        }
        let body_q = self.qualifier_outside(body, 1);
        let q = self.try_lub(&[q, body_q])?;
        let ty = self.kind_above(&[body], q);
        Ok(self.intern(Tag::Variadic, Some(ty), &[arity, body]))
    }

    pub fn pack(&mut self, arity: Def, body: Def) -> Def {
        self.try_pack(arity, body).or_fatal()
    }

    pub fn pack_n(&mut self, n: u64, body: Def) -> Def {
        let arity = self.arity(n);
        self.pack(arity, body)
    }

    /// Nested packs, outermost first. `body` does not see the indices.
    pub fn pack_nd(&mut self, arities: &[u64], body: Def) -> Def {
        if arities.is_empty() {
            return body;
        }
        let arity = self.arities(arities);
        let body = self.shift_free_vars(body, 1);
        self.pack(arity, body)
    }

    /// Value-level dual of [`World::try_variadic`], plus eta:
    /// `Pack(a, x.i)` is `x` when `x` is an `a`-array and `i` the index.
    pub fn try_pack(&mut self, arity: Def, body: Def) -> Result<Def> {
        let body_ty = self.try_type_of(body)?;
        if self.try_type_of(arity)? != self.arity_kind() {
            return self.nest(arity, body, &mut |w, arity, body| w.try_pack(arity, body));
        }
        if let Some(x) = self.pack_eta(arity, body) {
            debug!(?x, "pack eta");
            return Ok(x);
        }
        match arity.tag(self) {
            Tag::Arity(0) => return self.try_tuple(&[]),
            Tag::Arity(1) => {
                let index = self.index(1, 0);
                return Ok(self.reduce(body, &[index]));
            }
            Tag::Arity(n) if body.has_free_var(self, 0) => {
                let mut elems = Ops::with_capacity(n as usize);
                for i in 0..n {
                    let index = self.index(n, i);
                    elems.push(self.reduce(body, &[index]));
                }
                return self.try_tuple(&elems);
            }
            _ => {}
        }
        let q = self.unrestricted();
        let ty = self.try_variadic(arity, body_ty, q)?;
        Ok(self.intern(Tag::Pack, Some(ty), &[arity, body]))
    }

    fn pack_eta(&mut self, arity: Def, body: Def) -> Option<Def> {
        if body.tag(self) != Tag::Extract {
            return None;
        }
        let (inner, index) = (body.op(self, 0), body.op(self, 1));
        if !matches!(index.tag(self), Tag::Var(0)) || inner.has_free_var(self, 0) {
            return None;
        }
        let x = self.shift_free_vars(inner, -1);
        let ty = self.type_of(x);
        (ty.tag(self) == Tag::Variadic && ty.op(self, 0) == arity).then_some(x)
    }

    /// The tuple of arity literals used to index nested arrays.
    fn arities(&mut self, arities: &[u64]) -> Def {
        let ops: Ops = arities.iter().map(|&n| self.arity(n)).collect();
        self.sigma(&ops)
    }

    /// Builds one binder per component of the multi-dimensional `arity`,
    /// innermost first.
    fn nest(
        &mut self,
        arity: Def,
        body: Def,
        build: &mut dyn FnMut(&mut Self, Def, Def) -> Result<Def>,
    ) -> Result<Def> {
        let arity_kind = self.arity_kind();
        let Some((components, mut acc)) = self.split_binder(arity, body) else {
            return Err(KernelError::TypeMismatch {
                expected: arity_kind,
                found: self.try_type_of(arity)?,
            });
        };
        for &component in &components {
            let found = self.type_of(component);
            if found != arity_kind {
                return Err(KernelError::TypeMismatch {
                    expected: arity_kind,
                    found,
                });
            }
        }
        for &component in components.iter().rev() {
            acc = build(self, component, acc)?;
        }
        Ok(acc)
    }
}
