use fixedbitset::FixedBitSet;

/// The set of de Bruijn levels referenced freely by a subtree.
///
/// Backed by a growable bit-vector: deep binder stacks simply grow the set
/// instead of hitting a fixed-width ceiling.
#[derive(Clone, Default, Debug)]
pub struct FreeVars(FixedBitSet);

impl FreeVars {
    pub fn new() -> Self {
        FreeVars(FixedBitSet::new())
    }

    pub fn single(level: usize) -> Self {
        let mut fv = FreeVars::new();
        fv.insert(level);
        fv
    }

    pub fn insert(&mut self, level: usize) {
        if level >= self.0.len() {
            self.0.grow(level + 1);
        }
        self.0.insert(level);
    }

    pub fn contains(&self, level: usize) -> bool {
        self.0.contains(level)
    }

    pub fn is_empty(&self) -> bool {
        self.0.ones().next().is_none()
    }

    /// Any level `>= level` is free.
    pub fn any_from(&self, level: usize) -> bool {
        level < self.0.len() && self.0.count_ones(level..) != 0
    }

    /// Any level `< level` is free.
    pub fn any_below(&self, level: usize) -> bool {
        let end = level.min(self.0.len());
        end != 0 && self.0.count_ones(..end) != 0
    }

    /// The highest free level, if any.
    pub fn max(&self) -> Option<usize> {
        self.0.ones().last()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.ones()
    }

    pub fn union_with(&mut self, other: &FreeVars) {
        self.0.union_with(&other.0);
    }

    /// Adds the levels of `other` as seen from outside `binders` binders:
    /// levels below `binders` are bound there and dropped, the rest move down.
    pub fn union_under_binders(&mut self, other: &FreeVars, binders: usize) {
        if binders == 0 {
            self.union_with(other);
            return;
        }
        for level in other.iter().filter(|&level| level >= binders) {
            self.insert(level - binders);
        }
    }
}

impl PartialEq for FreeVars {
    // The backing bit-vectors may differ in length for the same set.
    fn eq(&self, other: &Self) -> bool {
        self.0.ones().eq(other.0.ones())
    }
}

impl Eq for FreeVars {}

impl FromIterator<usize> for FreeVars {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut fv = FreeVars::new();
        for level in iter {
            fv.insert(level);
        }
        fv
    }
}
