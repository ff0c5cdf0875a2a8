//! Read-only traversal of the term graph.

use crate::{Def, DefFlags, KernelError, Sort, Tag, Use, Vec, World};
use hashbrown::HashSet;
use tracing::warn;

/// Trait for walking a term graph without modifying it.
///
/// The default implementation visits a node's type, then its operands
/// (skipping nominal slots not yet tied). Shared subgraphs are visited once
/// per occurrence; implementors that care keep their own visited set.
///
/// # Example
///
/// ```
/// use bumpalo::Bump;
/// use ural_core::{Def, DefVisitor, Tag, World};
///
/// struct CountVars(usize);
///
/// impl DefVisitor for CountVars {
///     fn visit_def(&mut self, w: &World<'_>, def: Def) {
///         if matches!(def.tag(w), Tag::Var(_)) {
///             self.0 += 1;
///         }
///         self.super_visit_def(w, def);
///     }
/// }
///
/// let arena = Bump::new();
/// let mut w = World::new(&arena);
/// let nat = w.type_nat();
/// let x = w.var(nat, 0);
/// let pair = w.tuple(&[x, x]);
///
/// let mut counter = CountVars(0);
/// counter.visit_def(&w, pair);
/// assert!(counter.0 >= 1);
/// ```
pub trait DefVisitor {
    fn visit_def(&mut self, w: &World<'_>, def: Def) {
        self.super_visit_def(w, def);
    }

    fn super_visit_def(&mut self, w: &World<'_>, def: Def) {
        if let Some(ty) = def.ty(w) {
            self.visit_def(w, ty);
        }
        for i in 0..def.num_ops(w) {
            if let Some(op) = def.op_slot(w, i) {
                self.visit_def(w, op);
            }
        }
    }
}

/// Re-checks the kernel invariants on every node reachable from a root.
struct Verifier {
    seen: HashSet<Def>,
    violation: Option<(Def, &'static str)>,
}

impl DefVisitor for Verifier {
    fn visit_def(&mut self, w: &World<'_>, def: Def) {
        if self.violation.is_some() || !self.seen.insert(def) {
            return;
        }
        if let Err(reason) = check(w, def) {
            warn!(?def, reason, "invariant violated");
            self.violation = Some((def, reason));
            return;
        }
        self.super_visit_def(w, def);
    }
}

fn check(w: &World<'_>, def: Def) -> Result<(), &'static str> {
    let tag = def.tag(w);
    let ty = def.ty(w);
    let ops = def.ops(w);

    let expected_sort = match ty {
        None => Some(Sort::Universe),
        Some(ty) => ty.sort(w).below(),
    };
    if expected_sort != Some(def.sort(w)) {
        return Err("sort is not one below the sort of its type");
    }

    if *def.free_vars(w) != w.compute_free_vars(tag, ty, ops) {
        return Err("cached free variables are stale");
    }

    if def.is_structural(w) && w.lookup(tag, ty, ops) != Some(def) {
        return Err("structural node is not the canonical instance");
    }

    for (index, &op) in ops.iter().enumerate() {
        if op == Def::UNSET {
            continue;
        }
        let edge = Use {
            user: def,
            index: index as u32,
        };
        if !op.uses(w).contains(&edge) {
            return Err("operand is missing its use edge");
        }
    }

    let has_error = tag == Tag::Error
        || ty
            .iter()
            .chain(ops.iter().filter(|&&op| op != Def::UNSET))
            .any(|&child| child.has_error(w));
    if has_error != def.flags(w).contains(DefFlags::HAS_ERROR) {
        return Err("error flag disagrees with the children");
    }

    if matches!(tag, Tag::Sigma | Tag::Variant) && def.is_structural(w) {
        if let Some(q) = def.known_qualifier(w) {
            let monotone = ops
                .iter()
                .all(|&op| op.known_qualifier(w).is_none_or(|c| c.is_below(q)));
            if !monotone {
                return Err("compound qualifier is below a component's");
            }
        }
    }
    Ok(())
}

impl<'a> World<'a> {
    /// Checks sort monotonicity, exact free variables, content addressing,
    /// use edges, error propagation and qualifier monotonicity on every node
    /// reachable from `root`.
    pub fn verify(&self, root: Def) -> Result<(), KernelError> {
        self.verify_roots(core::iter::once(root))
    }

    /// [`World::verify`] over every node of the world.
    pub fn verify_all(&self) -> Result<(), KernelError> {
        self.verify_roots(self.defs())
    }

    fn verify_roots(&self, roots: impl IntoIterator<Item = Def>) -> Result<(), KernelError> {
        let mut verifier = Verifier {
            seen: HashSet::new(),
            violation: None,
        };
        for root in roots {
            verifier.visit_def(self, root);
        }
        match verifier.violation {
            None => Ok(()),
            Some((_, reason)) => Err(KernelError::Malformed(reason)),
        }
    }

    /// Every node reachable from `roots` through types and operands, each
    /// listed once, operands before users.
    pub fn reachable(&self, roots: &[Def]) -> Vec<Def> {
        struct Collect {
            seen: HashSet<Def>,
            order: Vec<Def>,
        }
        impl DefVisitor for Collect {
            fn visit_def(&mut self, w: &World<'_>, def: Def) {
                if self.seen.insert(def) {
                    self.super_visit_def(w, def);
                    self.order.push(def);
                }
            }
        }
        let mut collect = Collect {
            seen: HashSet::new(),
            order: Vec::new(),
        };
        for &root in roots {
            collect.visit_def(self, root);
        }
        collect.order
    }
}
