//! The [`World`]: arena, interning table and node storage.

mod options;

#[cfg(test)]
mod world_test;

pub use options::WorldOptions;

use crate::{
    Def, DefFlags, FreeVars, KernelError, Normalizer, Qualifier, Sort, String, Tag, Use, Vec,
    def::DefData, error::fatal, format,
};
use bumpalo::Bump;
use core::hash::BuildHasher;
use hashbrown::{DefaultHashBuilder, HashMap, HashSet, HashTable};
use smallvec::SmallVec;
use tracing::{debug, trace};

/// Nodes built once at world creation.
#[derive(Clone, Copy)]
struct Builtins {
    universe: Def,
    qualifier_type: Def,
    qualifiers: [Def; 4],
    stars: [Def; 4],
    arity_kind: Def,
    nats: [Def; 4],
    bool: Def,
}

/// Owner of every node in a term graph.
///
/// All structural nodes are hash-consed: building the same `(tag, type,
/// operands)` twice returns the same [`Def`], so handle equality is value
/// equality. Nominal nodes (axioms, recursive lambdas and sigmas) are never
/// shared.
///
/// Factories take `&mut self`; whoever owns the world has exclusive write
/// access, and shared references give read-only traversal. Operand slices and
/// debug names live in the arena the world borrows, so dropping the arena
/// releases every node at once.
///
/// # Example
///
/// ```
/// use bumpalo::Bump;
/// use ural_core::World;
///
/// let arena = Bump::new();
/// let mut w = World::new(&arena);
/// let nat = w.type_nat();
/// let x = w.var(nat, 0);
/// let id = w.lambda(&[nat], x);
/// assert_eq!(id, w.lambda(&[nat], x));
///
/// let answer = w.lit_nat(42);
/// assert_eq!(w.app(id, &[answer]), answer);
/// ```
pub struct World<'a> {
    arena: &'a Bump,
    defs: Vec<DefData<'a>>,
    table: HashTable<Def, &'a Bump>,
    hasher: DefaultHashBuilder,
    interned_strs: HashMap<&'a str, &'a str, DefaultHashBuilder, &'a Bump>,
    externals: HashSet<Def, DefaultHashBuilder, &'a Bump>,
    normalizers: HashMap<Def, Normalizer, DefaultHashBuilder, &'a Bump>,
    options: WorldOptions,
    /// Nesting depth of internal reductions; usage checks are off while > 0.
    reducing: u32,
    builtins: Builtins,
}

impl<'a> World<'a> {
    pub fn new(arena: &'a Bump) -> Self {
        Self::with_options(arena, WorldOptions::default())
    }

    pub fn with_options(arena: &'a Bump, options: WorldOptions) -> Self {
        let placeholder = Def::UNSET;
        let mut w = World {
            arena,
            defs: Vec::with_capacity(options.initial_capacity),
            table: HashTable::with_capacity_in(options.initial_capacity, arena),
            hasher: DefaultHashBuilder::default(),
            interned_strs: HashMap::new_in(arena),
            externals: HashSet::new_in(arena),
            normalizers: HashMap::new_in(arena),
            options,
            reducing: 0,
            builtins: Builtins {
                universe: placeholder,
                qualifier_type: placeholder,
                qualifiers: [placeholder; 4],
                stars: [placeholder; 4],
                arity_kind: placeholder,
                nats: [placeholder; 4],
                bool: placeholder,
            },
        };

        let universe = w.intern(Tag::Universe, None, &[]);
        let qualifier_type = w.intern(Tag::QualifierType, Some(universe), &[]);
        let qualifiers = Qualifier::ALL.map(|q| w.intern(Tag::Qualifier(q), Some(qualifier_type), &[]));
        let stars = qualifiers.map(|q| w.intern(Tag::Star, Some(universe), &[q]));
        let arity_kind = w.intern(Tag::ArityKind, Some(universe), &[]);
        w.builtins = Builtins {
            universe,
            qualifier_type,
            qualifiers,
            stars,
            arity_kind,
            ..w.builtins
        };

        let nats = Qualifier::ALL.map(|q| {
            let name = match q {
                Qualifier::Unrestricted => String::from("nat"),
                _ => format!("{}nat", q.symbol()),
            };
            let name = w.intern_str(&name);
            w.alloc_nominal(Tag::Axiom, stars[q as usize], 0, Some(name))
        });
        let name = w.intern_str("bool");
        let bool = w.alloc_nominal(Tag::Axiom, stars[0], 0, Some(name));
        w.builtins.nats = nats;
        w.builtins.bool = bool;
        w
    }

    pub fn options(&self) -> &WorldOptions {
        &self.options
    }

    /// Number of nodes allocated so far.
    pub fn num_defs(&self) -> usize {
        self.defs.len()
    }

    /// Every node, in allocation order.
    pub fn defs(&self) -> impl Iterator<Item = Def> + '_ {
        (0..self.defs.len()).map(Def::from_index)
    }

    pub(crate) fn data(&self, def: Def) -> &DefData<'a> {
        &self.defs[def.index()]
    }

    pub(crate) fn intern_str(&mut self, s: &str) -> &'a str {
        if let Some(&interned) = self.interned_strs.get(s) {
            return interned;
        }
        let arena_str: &'a str = self.arena.alloc_str(s);
        self.interned_strs.insert(arena_str, arena_str);
        arena_str
    }

    /// Attaches a debug name to `def` unless it already has one.
    ///
    /// Structural nodes are shared, so the first name given wins.
    pub fn named(&mut self, def: Def, name: &str) -> Def {
        if self.data(def).name.is_none() {
            let name = self.intern_str(name);
            self.defs[def.index()].name = Some(name);
        }
        def
    }

    // ---- builtins ----

    pub fn universe(&self) -> Def {
        self.builtins.universe
    }

    /// `ℚ`, the kind of qualifiers.
    pub fn qualifier_type(&self) -> Def {
        self.builtins.qualifier_type
    }

    pub fn qualifier(&self, q: Qualifier) -> Def {
        self.builtins.qualifiers[q as usize]
    }

    /// `*q`, the kind of types whose values carry qualifier `q`.
    pub fn star(&self, q: Qualifier) -> Def {
        self.builtins.stars[q as usize]
    }

    /// `𝔸`, the kind of arities.
    pub fn arity_kind(&self) -> Def {
        self.builtins.arity_kind
    }

    /// The opaque natural number type, qualified by `q`.
    pub fn nat(&self, q: Qualifier) -> Def {
        self.builtins.nats[q as usize]
    }

    pub fn type_nat(&self) -> Def {
        self.nat(Qualifier::Unrestricted)
    }

    pub fn type_bool(&self) -> Def {
        self.builtins.bool
    }

    // ---- externals ----

    /// Pins `def` as a root that is referenced from outside the graph.
    pub fn make_external(&mut self, def: Def) {
        self.externals.insert(def);
    }

    /// Unpins `def`; returns whether it was pinned.
    pub fn make_internal(&mut self, def: Def) -> bool {
        self.externals.remove(&def)
    }

    pub fn is_external(&self, def: Def) -> bool {
        self.externals.contains(&def)
    }

    /// Pinned roots, in allocation order.
    pub fn externals(&self) -> Vec<Def> {
        let mut externals: Vec<Def> = self.externals.iter().copied().collect();
        externals.sort_unstable();
        externals
    }

    // ---- normalizers ----

    pub(crate) fn set_normalizer(&mut self, axiom: Def, normalizer: Normalizer) {
        self.normalizers.insert(axiom, normalizer);
    }

    /// The normalizer registered on the head of `callee`, looking through
    /// partial applications.
    pub(crate) fn normalizer_of(&self, callee: Def) -> Option<Normalizer> {
        let mut head = callee;
        while head.tag(self) == Tag::App {
            head = head.op(self, 0);
        }
        self.normalizers.get(&head).copied()
    }

    // ---- reduction depth ----

    pub(crate) fn is_reducing(&self) -> bool {
        self.reducing > 0
    }

    pub(crate) fn enter_reduction(&mut self) {
        self.reducing += 1;
    }

    pub(crate) fn exit_reduction(&mut self) {
        self.reducing -= 1;
    }

    pub(crate) fn cached_reduction(&self, app: Def) -> Option<Def> {
        self.data(app).cache
    }

    pub(crate) fn cache_reduction(&mut self, app: Def, reduced: Def) {
        self.defs[app.index()].cache = Some(reduced);
    }

    // ---- allocation ----

    /// Returns the canonical structural node for `(tag, ty, ops)`.
    ///
    /// The table is probed with the borrowed operands before anything is
    /// allocated, so a hit costs no arena space and a miss commits directly.
    pub(crate) fn intern(&mut self, tag: Tag, ty: Option<Def>, ops: &[Def]) -> Def {
        let hash = self.hasher.hash_one((tag, ty, ops));
        let defs = &self.defs;
        let found = self.table.find(hash, |&candidate| {
            let data = &defs[candidate.index()];
            data.tag == tag && data.ty == ty && data.ops == ops
        });
        if let Some(&def) = found {
            trace!(?def, ?tag, "intern hit");
            return def;
        }

        let ops: &'a [Def] = self.arena.alloc_slice_copy(ops);
        let def = self.alloc(tag, ty, ops, DefFlags::empty(), hash);
        let defs = &self.defs;
        self.table
            .insert_unique(hash, def, |&existing| defs[existing.index()].hash);
        trace!(?def, ?tag, "intern miss");
        def
    }

    /// Allocates a nominal node with `num_slots` operand slots to be tied
    /// later through [`World::set_op`].
    pub(crate) fn alloc_nominal(
        &mut self,
        tag: Tag,
        ty: Def,
        num_slots: usize,
        name: Option<&'a str>,
    ) -> Def {
        if !ty.is_closed(self) {
            fatal(KernelError::Malformed("nominal nodes must have a closed type"));
        }
        let ops: &'a [Def] = self.arena.alloc_slice_fill_copy(num_slots, Def::UNSET);
        let hash = self.hasher.hash_one(self.defs.len());
        let def = self.alloc(tag, Some(ty), ops, DefFlags::NOMINAL, hash);
        self.defs[def.index()].name = name;
        debug!(?def, ?tag, ?name, "nominal stub");
        def
    }

    fn alloc(
        &mut self,
        tag: Tag,
        ty: Option<Def>,
        ops: &'a [Def],
        flags: DefFlags,
        hash: u64,
    ) -> Def {
        let sort = match ty {
            None => Sort::Universe,
            Some(ty) => match ty.sort(self).below() {
                Some(sort) => sort,
                None => fatal(KernelError::Malformed("a term cannot be the type of a node")),
            },
        };

        let free_vars = self.compute_free_vars(tag, ty, ops);
        let mut flags = flags;
        if tag == Tag::Error {
            flags |= DefFlags::HAS_ERROR;
        }
        for &child in ty.iter().chain(ops.iter()) {
            if child != Def::UNSET {
                flags |= self.data(child).flags & DefFlags::PROPAGATED;
            }
        }

        let def = Def::from_index(self.defs.len());
        self.defs.push(DefData {
            tag,
            sort,
            ty,
            ops,
            free_vars,
            flags,
            hash,
            name: None,
            uses: SmallVec::new(),
            cache: None,
        });
        for (index, &op) in ops.iter().enumerate() {
            if op != Def::UNSET {
                self.add_use(op, def, index);
            }
        }
        def
    }

    fn add_use(&mut self, op: Def, user: Def, index: usize) {
        self.defs[op.index()].uses.push(Use {
            user,
            index: index as u32,
        });
    }

    /// Exact free variables of a node with the given shape: the node's own
    /// reference, its type's variables, and each operand's variables seen
    /// from outside the binders that operand lives under.
    pub(crate) fn compute_free_vars(&self, tag: Tag, ty: Option<Def>, ops: &[Def]) -> FreeVars {
        let mut fv = match tag {
            Tag::Var(level) => FreeVars::single(level as usize),
            _ => FreeVars::new(),
        };
        if let Some(ty) = ty {
            fv.union_with(ty.free_vars(self));
        }
        let lambda_arity = self.lambda_arity(tag, ty);
        for (i, &op) in ops.iter().enumerate() {
            if op != Def::UNSET {
                fv.union_under_binders(op.free_vars(self), tag.binders_of_op(i, lambda_arity));
            }
        }
        fv
    }

    pub(crate) fn lambda_arity(&self, tag: Tag, ty: Option<Def>) -> usize {
        match (tag, ty) {
            (Tag::Lambda, Some(pi)) => pi.num_ops(self) - 1,
            _ => 0,
        }
    }

    /// Installs operand `i` of a nominal node. Each slot is set exactly once.
    pub(crate) fn install_op(&mut self, def: Def, i: usize, op: Def) -> Result<(), KernelError> {
        if !def.is_nominal(self) {
            return Err(KernelError::Malformed("operands of structural nodes are immutable"));
        }
        let data = self.data(def);
        if i >= data.ops.len() {
            return Err(KernelError::ArityMismatch {
                expected: data.ops.len() as u64,
                found: i as u64 + 1,
            });
        }
        if data.ops[i] != Def::UNSET {
            return Err(KernelError::Malformed("nominal operand installed twice"));
        }

        let binders = data.tag.binders_of_op(i, self.lambda_arity(data.tag, data.ty));
        let mut free_vars = data.free_vars.clone();
        free_vars.union_under_binders(op.free_vars(self), binders);
        if !free_vars.is_empty() {
            return Err(KernelError::Malformed("nominal node would capture a free variable"));
        }

        let mut ops: SmallVec<[Def; 8]> = SmallVec::from_slice(data.ops);
        ops[i] = op;
        let ops: &'a [Def] = self.arena.alloc_slice_copy(&ops);
        let inherited = self.data(op).flags & DefFlags::PROPAGATED;

        let data = &mut self.defs[def.index()];
        data.ops = ops;
        data.free_vars = free_vars;
        data.flags |= inherited;
        self.add_use(op, def, i);
        debug!(?def, slot = i, ?op, "tied nominal operand");
        Ok(())
    }

    /// Re-probes the table for a structural node; used by the verifier.
    pub(crate) fn lookup(&self, tag: Tag, ty: Option<Def>, ops: &[Def]) -> Option<Def> {
        let hash = self.hasher.hash_one((tag, ty, ops));
        self.table
            .find(hash, |&candidate| {
                let data = self.data(candidate);
                data.tag == tag && data.ty == ty && data.ops == ops
            })
            .copied()
    }

    pub(crate) fn check_level(&self, level: usize) -> Result<(), KernelError> {
        match self.options.max_binder_depth {
            Some(limit) if level >= limit => Err(KernelError::BitsetOverflow { level, limit }),
            _ => Ok(()),
        }
    }

    pub(crate) fn policy_admits(&self, value: Def, operands: &[Def]) -> Result<(), KernelError> {
        self.options.usage_policy.admit(self, value, operands)
    }
}
