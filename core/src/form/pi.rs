//! Function types, functions and application.
//!
//! A function over a single tuple-typed domain is stored as a function over
//! one domain per component. `λ(p: Σ[A, B]). e` and `λ(a: A, b: B). e[(a, b)/p]`
//! are the same node, and application splits a tuple argument to match.

use super::Ops;
use crate::{Def, KernelError, Result, Rewrite, Tag, World, error::OrFatal};
use core::iter;
use smallvec::smallvec;
use tracing::debug;

impl<'a> World<'a> {
    /// `Π(domains). codomain`, where `codomain` and each domain may refer to
    /// the domains before it.
    pub fn pi(&mut self, domains: &[Def], codomain: Def) -> Def {
        let q = self.unrestricted();
        self.try_pi(domains, codomain, q).or_fatal()
    }

    /// A function type whose values carry qualifier `q`.
    pub fn pi_q(&mut self, domains: &[Def], codomain: Def, q: Def) -> Def {
        self.try_pi(domains, codomain, q).or_fatal()
    }

    pub fn try_pi(&mut self, domains: &[Def], codomain: Def, q: Def) -> Result<Def> {
        self.check_qualifier(q)?;
        for &domain in domains.iter().chain(iter::once(&codomain)) {
            self.expect_type_like(domain)?;
        }
        let (mut ops, codomain) = self.uncurry(domains, codomain);
        ops.push(codomain);
        let ty = self.kind_above(&ops, q);
        Ok(self.intern(Tag::Pi, Some(ty), &ops))
    }

    pub fn lambda(&mut self, domains: &[Def], body: Def) -> Def {
        let q = self.unrestricted();
        self.try_lambda(domains, body, q).or_fatal()
    }

    pub fn lambda_q(&mut self, domains: &[Def], body: Def, q: Def) -> Def {
        self.try_lambda(domains, body, q).or_fatal()
    }

    pub fn try_lambda(&mut self, domains: &[Def], body: Def, q: Def) -> Result<Def> {
        self.check_qualifier(q)?;
        for &domain in domains {
            self.expect_type_like(domain)?;
        }
        self.try_type_of(body)?;
        let (domains, body) = self.uncurry(domains, body);
        let codomain = self.type_of(body);
        let pi = self.try_pi(&domains, codomain, q)?;
        if let Some(f) = self.eta_reduce(domains.len(), body, pi) {
            return Ok(f);
        }
        Ok(self.intern(Tag::Lambda, Some(pi), &[body]))
    }

    /// Stub of a recursive function of type `pi`; tie it with
    /// [`World::set_body`].
    pub fn lambda_nominal(&mut self, pi: Def, name: &str) -> Def {
        self.try_lambda_nominal(pi, name).or_fatal()
    }

    pub fn try_lambda_nominal(&mut self, pi: Def, name: &str) -> Result<Def> {
        if pi.tag(self) != Tag::Pi {
            return Err(KernelError::ExpectedShape {
                expected: "function type",
                def: pi,
            });
        }
        if !pi.is_closed(self) {
            return Err(KernelError::Malformed("a nominal function's type must be closed"));
        }
        let name = self.intern_str(name);
        Ok(self.alloc_nominal(Tag::Lambda, pi, 1, Some(name)))
    }

    pub fn set_body(&mut self, lambda: Def, body: Def) {
        self.try_set_body(lambda, body).or_fatal()
    }

    pub fn try_set_body(&mut self, lambda: Def, body: Def) -> Result<()> {
        if lambda.tag(self) != Tag::Lambda {
            return Err(KernelError::ExpectedShape {
                expected: "function",
                def: lambda,
            });
        }
        let pi = self.type_of(lambda);
        let expected = pi.body(self);
        let found = self.try_type_of(body)?;
        if expected != found {
            return Err(KernelError::TypeMismatch { expected, found });
        }
        self.install_op(lambda, 0, body)
    }

    fn uncurry(&mut self, domains: &[Def], body: Def) -> (Ops, Def) {
        if let [domain] = *domains {
            if let Some((components, body)) = self.split_binder(domain, body) {
                debug!(?domain, arity = components.len(), "uncurried tuple domain");
                return (components, body);
            }
        }
        (Ops::from_slice(domains), body)
    }

    /// `λ(x_0 .. x_{n-1}). f(x_0, .., x_{n-1})` is `f` when `f` does not
    /// mention the parameters and has exactly the function's type.
    fn eta_reduce(&mut self, n: usize, body: Def, pi: Def) -> Option<Def> {
        if body.tag(self) != Tag::App {
            return None;
        }
        let (&callee, args) = body.ops(self).split_first()?;
        if args.len() != n {
            return None;
        }
        let in_order = args
            .iter()
            .enumerate()
            .all(|(j, &arg)| arg.tag(self) == Tag::Var((n - 1 - j) as u32));
        if !in_order || callee.free_vars(self).any_below(n) {
            return None;
        }
        let f = self.shift_free_vars(callee, -(n as isize));
        if f.ty(self) == Some(pi) {
            debug!(?body, ?f, "eta");
            Some(f)
        } else {
            None
        }
    }

    /// `callee(args)`, reduced as far as possible.
    ///
    /// A single argument for a function of several domains is split into
    /// its components. The application of a lambda is beta-reduced; the
    /// application of an axiom with a normalizer is handed to it. Either way
    /// the result is cached, so rebuilding the same application is O(1).
    pub fn app(&mut self, callee: Def, args: &[Def]) -> Def {
        self.try_app(callee, args).or_fatal()
    }

    pub fn try_app(&mut self, callee: Def, args: &[Def]) -> Result<Def> {
        let pi = self.try_type_of(callee)?;
        if pi.tag(self) != Tag::Pi {
            return Err(KernelError::ExpectedShape {
                expected: "function",
                def: callee,
            });
        }
        let pi_ops = pi.ops(self);
        let n = pi_ops.len() - 1;

        let args: Ops = match *args {
            [arg] if n != 1 => self.split_arg(arg, n)?,
            _ => Ops::from_slice(args),
        };
        if args.len() != n {
            return Err(KernelError::ArityMismatch {
                expected: n as u64,
                found: args.len() as u64,
            });
        }
        for (i, &arg) in args.iter().enumerate() {
            let expected = self.reduce(pi_ops[i], &args[..i]);
            let found = self.try_type_of(arg)?;
            if expected != found {
                return Err(KernelError::TypeMismatch { expected, found });
            }
        }

        let ty = self.reduce(pi_ops[n], &args);
        if callee.is_error(self) || args.iter().any(|&arg| arg.is_error(self)) {
            return Ok(self.error(ty));
        }
        let mut ops: Ops = smallvec![callee];
        ops.extend_from_slice(&args);
        if !self.is_reducing() {
            for &value in &ops {
                if let Err(err) = self.policy_admits(value, &ops) {
                    debug!(%err, "usage rejected");
                    return Ok(self.error(ty));
                }
            }
        }

        let app = self.intern(Tag::App, Some(ty), &ops);
        if let Some(reduced) = self.cached_reduction(app) {
            return Ok(reduced);
        }
        let reduced = self.reduce_app(app, callee, &args);
        self.cache_reduction(app, reduced);
        Ok(reduced)
    }

    fn split_arg(&mut self, arg: Def, n: usize) -> Result<Ops> {
        let ty = self.try_type_of(arg)?;
        if self.literal_arity(ty) != Some(n as u64) {
            return Err(KernelError::ArityMismatch {
                expected: n as u64,
                found: 1,
            });
        }
        (0..n as u64).map(|i| self.try_extract(arg, i)).collect()
    }

    fn reduce_app(&mut self, app: Def, callee: Def, args: &[Def]) -> Def {
        // Recursive (nominal) functions are not unfolded.
        if callee.tag(self) == Tag::Lambda && callee.is_structural(self) {
            let body = callee.op(self, 0);
            let reduced = self.reduce(body, args);
            debug!(?app, ?reduced, "beta");
            return reduced;
        }
        let Some(normalize) = self.normalizer_of(callee) else {
            return app;
        };
        match normalize(self, callee, args) {
            Rewrite::Keep => app,
            Rewrite::Replace(replacement) => {
                debug!(?app, ?replacement, "normalized");
                replacement
            }
            Rewrite::Undefined => {
                let ty = self.type_of(app);
                self.error(ty)
            }
        }
    }
}
