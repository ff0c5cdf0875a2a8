use super::Ops;
use crate::{Def, KernelError, Qualifier, Result, Sort, Tag, World, error::OrFatal};
use smallvec::smallvec;
use tracing::debug;

impl<'a> World<'a> {
    /// Dependent tuple type. Component `i` may refer to components `0..i`.
    pub fn sigma(&mut self, ops: &[Def]) -> Def {
        let q = self.unrestricted();
        self.try_sigma(ops, q).or_fatal()
    }

    pub fn sigma_q(&mut self, ops: &[Def], q: Def) -> Def {
        self.try_sigma(ops, q).or_fatal()
    }

    /// A Sigma of one component is that component, unless `q` would raise
    /// its qualifier. A Sigma of `n` identical, non-dependent components is
    /// `Variadic(n, component)`. Otherwise its qualifier is the join of `q`
    /// and every component's.
    pub fn try_sigma(&mut self, ops: &[Def], q: Def) -> Result<Def> {
        self.check_qualifier(q)?;
        for &op in ops {
            self.expect_type_like(op)?;
        }
        if let [op] = *ops {
            if self.keeps_qualifier(op, q) {
                return Ok(op);
            }
        }
        if ops.len() >= 2 && self.is_homogeneous(ops) {
            let arity = self.arity(ops.len() as u64);
            let body = self.shift_free_vars(ops[0], 1);
            return self.try_variadic(arity, body, q);
        }

        let mut qualifiers: Ops = smallvec![q];
        for (i, &op) in ops.iter().enumerate() {
            qualifiers.push(self.qualifier_outside(op, i));
        }
        let q = self.try_lub(&qualifiers)?;
        let ty = self.kind_above(ops, q);
        Ok(self.intern(Tag::Sigma, Some(ty), ops))
    }

    /// `op` alone already carries at least `q`.
    fn keeps_qualifier(&self, op: Def, q: Def) -> bool {
        if op.sort(self) >= Sort::Kind {
            return true;
        }
        let op_q = op.qualifier(self);
        match (q.tag(self), op_q.tag(self)) {
            (Tag::Qualifier(Qualifier::Unrestricted), _) => true,
            (Tag::Qualifier(q), Tag::Qualifier(op_q)) => q.is_below(op_q),
            _ => q == op_q,
        }
    }

    fn is_homogeneous(&mut self, ops: &[Def]) -> bool {
        let first = ops[0];
        for (i, &op) in ops.iter().enumerate().skip(1) {
            if self.shift_free_vars(first, i as isize) != op {
                return false;
            }
        }
        true
    }

    /// Stub of a recursive tuple type of kind `kind` with `num_ops`
    /// components; tie each with [`World::set_op`].
    pub fn sigma_nominal(&mut self, kind: Def, num_ops: usize, name: &str) -> Def {
        self.try_sigma_nominal(kind, num_ops, name).or_fatal()
    }

    pub fn try_sigma_nominal(&mut self, kind: Def, num_ops: usize, name: &str) -> Result<Def> {
        if !matches!(kind.tag(self), Tag::Star | Tag::Universe) {
            return Err(KernelError::ExpectedShape {
                expected: "kind",
                def: kind,
            });
        }
        let name = self.intern_str(name);
        Ok(self.alloc_nominal(Tag::Sigma, kind, num_ops, Some(name)))
    }

    /// Installs component `i` of a nominal sigma.
    pub fn set_op(&mut self, sigma: Def, i: usize, op: Def) {
        self.try_set_op(sigma, i, op).or_fatal()
    }

    pub fn try_set_op(&mut self, sigma: Def, i: usize, op: Def) -> Result<()> {
        if sigma.tag(self) != Tag::Sigma {
            return Err(KernelError::ExpectedShape {
                expected: "tuple type",
                def: sigma,
            });
        }
        self.expect_type_like(op)?;
        self.install_op(sigma, i, op)
    }

    /// Tuple value whose type is computed from its elements.
    pub fn tuple(&mut self, ops: &[Def]) -> Def {
        self.try_tuple(ops).or_fatal()
    }

    pub fn try_tuple(&mut self, ops: &[Def]) -> Result<Def> {
        if let [op] = *ops {
            return Ok(op);
        }
        let mut components = Ops::with_capacity(ops.len());
        for (i, &op) in ops.iter().enumerate() {
            let ty = self.try_type_of(op)?;
            components.push(self.shift_free_vars(ty, i as isize));
        }
        let q = self.unrestricted();
        let ty = self.try_sigma(&components, q)?;
        self.try_tuple_typed(ty, ops)
    }

    /// Tuple value of the given tuple type.
    pub fn tuple_typed(&mut self, ty: Def, ops: &[Def]) -> Def {
        self.try_tuple_typed(ty, ops).or_fatal()
    }

    pub fn try_tuple_typed(&mut self, ty: Def, ops: &[Def]) -> Result<Def> {
        let Some(components) = self.tuple_components(ty) else {
            return match *ops {
                [op] if self.try_type_of(op)? == ty => Ok(op),
                _ => Err(KernelError::ExpectedShape {
                    expected: "tuple type with literal arity",
                    def: ty,
                }),
            };
        };
        if components.len() != ops.len() {
            return Err(KernelError::ArityMismatch {
                expected: components.len() as u64,
                found: ops.len() as u64,
            });
        }
        for (i, &op) in ops.iter().enumerate() {
            let expected = self.reduce(components[i], &ops[..i]);
            let found = self.try_type_of(op)?;
            if expected != found {
                return Err(KernelError::TypeMismatch { expected, found });
            }
        }

        if let Some(x) = self.tuple_eta(ty, ops) {
            debug!(?x, "tuple eta");
            return Ok(x);
        }
        if ops.len() >= 2 && ty.tag(self) == Tag::Variadic && ops.iter().all(|&op| op == ops[0]) {
            let arity = ty.op(self, 0);
            let body = self.shift_free_vars(ops[0], 1);
            return self.try_pack(arity, body);
        }
        Ok(self.intern(Tag::Tuple, Some(ty), ops))
    }

    /// `(x.0, .., x.{n-1})` is `x` when `x` has exactly this type.
    fn tuple_eta(&self, ty: Def, ops: &[Def]) -> Option<Def> {
        let (&first, _) = ops.split_first()?;
        if first.tag(self) != Tag::Extract {
            return None;
        }
        let x = first.op(self, 0);
        let all_projections = ops.iter().enumerate().all(|(i, &op)| {
            op.tag(self) == Tag::Extract
                && op.op(self, 0) == x
                && op.op(self, 1).tag(self) == Tag::Index(i as u64)
        });
        (all_projections && x.ty(self) == Some(ty)).then_some(x)
    }

    /// Component `i` of `tuple`, for a literal `i`.
    ///
    /// An index past the end of a uniform array is an object-language error
    /// and yields an error sentinel of the element type. Past the end of a
    /// heterogeneous tuple it is a producer error. A value of a non-tuple
    /// type is its own component 0.
    pub fn extract(&mut self, tuple: Def, i: u64) -> Def {
        self.try_extract(tuple, i).or_fatal()
    }

    pub fn try_extract(&mut self, tuple: Def, i: u64) -> Result<Def> {
        let ty = self.try_type_of(tuple)?;
        let tag = ty.tag(self);
        let Some(n) = self.literal_arity(ty) else {
            return match tag {
                Tag::Variadic => Err(KernelError::ExpectedShape {
                    expected: "tuple type with literal arity",
                    def: ty,
                }),
                _ if i == 0 => Ok(tuple),
                _ => Err(KernelError::ArityMismatch {
                    expected: 1,
                    found: i,
                }),
            };
        };
        if i < n {
            let index = self.index(n, i);
            return self.try_extract_at(tuple, index);
        }
        if tag == Tag::Variadic {
            let body = ty.body(self);
            if !body.has_free_var(self, 0) {
                debug!(?tuple, index = i, arity = n, "extract out of bounds");
                let elem = self.shift_free_vars(body, -1);
                return Ok(self.error(elem));
            }
        }
        Err(KernelError::ArityMismatch {
            expected: n,
            found: i,
        })
    }

    /// Component `index` of `tuple`, where `index` is an index term.
    ///
    /// The type of component `i` of a dependent tuple is its template with
    /// components `0..i` of `tuple` substituted in.
    pub fn extract_at(&mut self, tuple: Def, index: Def) -> Def {
        self.try_extract_at(tuple, index).or_fatal()
    }

    pub fn try_extract_at(&mut self, tuple: Def, index: Def) -> Result<Def> {
        let ty = self.try_type_of(tuple)?;
        let index_ty = self.try_type_of(index)?;
        let component = match ty.tag(self) {
            Tag::Sigma => {
                let n = ty.num_ops(self) as u64;
                let arity = self.arity(n);
                if index_ty != arity {
                    return Err(KernelError::TypeMismatch {
                        expected: arity,
                        found: index_ty,
                    });
                }
                let Tag::Index(i) = index.tag(self) else {
                    return Err(KernelError::Malformed(
                        "a heterogeneous tuple can only be indexed by a literal",
                    ));
                };
                if tuple.tag(self) == Tag::Tuple {
                    return Ok(tuple.op(self, i as usize));
                }
                let Some(template) = ty.op_slot(self, i as usize) else {
                    return Err(KernelError::Malformed("extract from an untied tuple type"));
                };
                let mut prefix = Ops::with_capacity(i as usize);
                for j in 0..i {
                    prefix.push(self.try_extract(tuple, j)?);
                }
                self.reduce(template, &prefix)
            }
            Tag::Variadic => {
                let arity = ty.op(self, 0);
                if index_ty != arity {
                    return Err(KernelError::TypeMismatch {
                        expected: arity,
                        found: index_ty,
                    });
                }
                match (tuple.tag(self), index.tag(self)) {
                    (Tag::Tuple, Tag::Index(i)) => return Ok(tuple.op(self, i as usize)),
                    (Tag::Pack, _) => {
                        let body = tuple.op(self, 1);
                        return Ok(self.reduce(body, &[index]));
                    }
                    _ => {}
                }
                let body = ty.op(self, 1);
                self.reduce(body, &[index])
            }
            _ => {
                let one = self.arity(1);
                return if index_ty == one {
                    Ok(tuple)
                } else {
                    Err(KernelError::ExpectedShape {
                        expected: "tuple",
                        def: tuple,
                    })
                };
            }
        };
        if tuple.is_error(self) {
            return Ok(self.error(component));
        }
        Ok(self.intern(Tag::Extract, Some(component), &[tuple, index]))
    }
}
