//! De Bruijn shifting and simultaneous substitution.
//!
//! Both are folds over the term graph that rebuild changed nodes through the
//! ordinary factories, so every rebuilt node is re-canonicalized (and
//! re-reduced: substituting a lambda into a callee position beta-reduces).
//!
//! Two properties keep this cheap on large graphs:
//!
//! - A subtree whose free variables contain nothing at or above the current
//!   binder depth is returned as is, without being visited.
//! - Results are memoized per `(node, depth)` for the lifetime of one fold,
//!   so shared subgraphs are rewritten once.

use crate::form::Ops;
use crate::{Def, KernelError, Tag, World, error::fatal};
use hashbrown::HashMap;

/// A rewrite of the free variables of a term.
///
/// Implementors decide what happens to a variable; the provided methods
/// handle short-circuiting, memoization and rebuilding.
pub(crate) trait DefFolder<'a> {
    fn world(&mut self) -> &mut World<'a>;

    fn memo(&mut self) -> &mut HashMap<(Def, usize), Def>;

    /// Rewrites the variable `level` found under `depth` binders. `ty` is
    /// the variable's type, already folded.
    fn fold_var(&mut self, ty: Def, level: usize, depth: usize) -> Def;

    fn fold_def(&mut self, def: Def, depth: usize) -> Def {
        let w = self.world();
        if def.is_nominal(w) || !def.free_vars(w).any_from(depth) {
            return def;
        }
        if let Some(&folded) = self.memo().get(&(def, depth)) {
            return folded;
        }
        let folded = self.super_fold_def(def, depth);
        self.memo().insert((def, depth), folded);
        folded
    }

    fn super_fold_def(&mut self, def: Def, depth: usize) -> Def {
        let w = self.world();
        let tag = def.tag(w);
        let ty = def.ty(w);
        let ops = def.ops(w);

        match tag {
            Tag::Var(level) => {
                let ty = self.fold_def(typed(ty), depth);
                return self.fold_var(ty, level as usize, depth);
            }
            // Rebuilt from its domains rather than its type: the new domains
            // may uncurry differently, and the factory re-splits the body.
            Tag::Lambda => {
                let pi = typed(ty);
                let w = self.world();
                let pi_ops = pi.ops(w);
                let kind = w.type_of(pi);
                let q = w.declared_qualifier(kind);
                let n = pi_ops.len() - 1;
                let domains: Ops = pi_ops[..n]
                    .iter()
                    .enumerate()
                    .map(|(i, &domain)| self.fold_def(domain, depth + i))
                    .collect();
                let q = self.fold_def(q, depth);
                let body = self.fold_def(ops[0], depth + n);
                return self.world().lambda_q(&domains, body, q);
            }
            _ => {}
        }

        let ty = ty.map(|ty| self.fold_def(ty, depth));
        let ops: Ops = ops
            .iter()
            .enumerate()
            .map(|(i, &op)| self.fold_def(op, depth + tag.binders_of_op(i, 0)))
            .collect();
        self.world().rebuild(tag, ty, &ops)
    }
}

fn typed(ty: Option<Def>) -> Def {
    ty.unwrap_or_else(|| fatal(KernelError::Malformed("variable or function without a type")))
}

/// Moves free variables at or above a cutoff by `delta`.
struct Shifter<'w, 'a> {
    world: &'w mut World<'a>,
    delta: isize,
    memo: HashMap<(Def, usize), Def>,
}

impl<'a> DefFolder<'a> for Shifter<'_, 'a> {
    fn world(&mut self) -> &mut World<'a> {
        &mut *self.world
    }

    fn memo(&mut self) -> &mut HashMap<(Def, usize), Def> {
        &mut self.memo
    }

    fn fold_var(&mut self, ty: Def, level: usize, depth: usize) -> Def {
        if level < depth {
            return self.world.var(ty, level);
        }
        let shifted = level as isize + self.delta;
        if shifted < depth as isize {
            fatal(KernelError::Malformed("variable escapes its binder"));
        }
        self.world.var(ty, shifted as usize)
    }
}

/// Replaces the `args.len()` levels at the fold depth by `args` (the
/// outermost binder by `args[0]`) and moves every deeper level by
/// `lift - args.len()`.
struct Substituter<'w, 'a, 's> {
    world: &'w mut World<'a>,
    args: &'s [Def],
    lift: usize,
    memo: HashMap<(Def, usize), Def>,
}

impl<'a> DefFolder<'a> for Substituter<'_, 'a, '_> {
    fn world(&mut self) -> &mut World<'a> {
        &mut *self.world
    }

    fn memo(&mut self) -> &mut HashMap<(Def, usize), Def> {
        &mut self.memo
    }

    fn fold_var(&mut self, ty: Def, level: usize, depth: usize) -> Def {
        if level < depth {
            return self.world.var(ty, level);
        }
        let k = self.args.len();
        let j = level - depth;
        if j < k {
            let arg = self.args[k - 1 - j];
            self.world.shift_free_vars(arg, depth as isize)
        } else {
            self.world.var(ty, level - k + self.lift)
        }
    }
}

impl<'a> World<'a> {
    /// `def` with every free variable moved by `delta` levels.
    ///
    /// Returns `def` itself when it has no free variables. A variable pushed
    /// below zero is a producer error.
    pub fn shift_free_vars(&mut self, def: Def, delta: isize) -> Def {
        if delta == 0 || def.is_closed(self) {
            return def;
        }
        self.enter_reduction();
        let shifted = Shifter {
            world: self,
            delta,
            memo: HashMap::new(),
        }
        .fold_def(def, 0);
        self.exit_reduction();
        shifted
    }

    /// `def`, which lives under `args.len()` binders, with those binders
    /// replaced by `args`: the outermost binder by `args[0]`. Deeper free
    /// variables move down by `args.len()`.
    ///
    /// Returns `def` itself when none of its free variables is affected.
    pub fn reduce(&mut self, def: Def, args: &[Def]) -> Def {
        self.substitute(def, args, 0)
    }

    /// Like [`World::reduce`], but deeper free variables move by
    /// `lift - args.len()`, for when the replaced binders are themselves
    /// replaced by `lift` new ones.
    pub(crate) fn substitute(&mut self, def: Def, args: &[Def], lift: usize) -> Def {
        if (args.is_empty() && lift == 0) || def.is_closed(self) {
            return def;
        }
        self.enter_reduction();
        let reduced = Substituter {
            world: self,
            args,
            lift,
            memo: HashMap::new(),
        }
        .fold_def(def, 0);
        self.exit_reduction();
        reduced
    }

    /// Re-creates a node of kind `tag` from rewritten parts.
    fn rebuild(&mut self, tag: Tag, ty: Option<Def>, ops: &[Def]) -> Def {
        let q = match ty {
            Some(kind) => self.declared_qualifier(kind),
            None => self.unrestricted(),
        };
        match tag {
            Tag::Star => self.star_of(ops[0]),
            Tag::Lit(value) => self.lit(typed(ty), value),
            Tag::Error => self.error(typed(ty)),
            Tag::Pi => {
                let (codomain, domains) = ops.split_last().unwrap_or_else(|| {
                    fatal(KernelError::Malformed("function type without a codomain"))
                });
                self.pi_q(domains, *codomain, q)
            }
            Tag::App => self.app(ops[0], &ops[1..]),
            Tag::Sigma => self.sigma_q(ops, q),
            Tag::Tuple => self.tuple_typed(typed(ty), ops),
            Tag::Extract => self.extract_at(ops[0], ops[1]),
            Tag::Variadic => self.variadic_q(ops[0], ops[1], q),
            Tag::Pack => self.pack(ops[0], ops[1]),
            Tag::Variant => self.variant_q(ops, q),
            Tag::Any => self.any(typed(ty), ops[0]),
            Tag::Match => self.match_variant(ops[0], &ops[1..]),
            Tag::Intersection => self.intersection_q(ops, q),
            Tag::All => self.all(typed(ty), ops),
            Tag::Pick => self.pick(typed(ty), ops[0]),
            Tag::Singleton => self.singleton(ops[0]),
            // Closed or nominal: never reached by a fold.
            Tag::Universe
            | Tag::QualifierType
            | Tag::Qualifier(_)
            | Tag::ArityKind
            | Tag::Arity(_)
            | Tag::Index(_)
            | Tag::Axiom
            | Tag::Var(_)
            | Tag::Lambda => fatal(KernelError::Malformed("rebuild of a leaf or binder node")),
        }
    }
}

#[cfg(test)]
#[path = "subst_test.rs"]
mod subst_test;
