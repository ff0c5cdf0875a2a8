//! Substructural usage qualifiers.
//!
//! Qualifiers form a four-element lattice ordered by restriction:
//!
//! ```text
//!          Linear
//!         /      \
//!    Affine      Relevant
//!         \      /
//!       Unrestricted
//! ```
//!
//! Each qualifier is a pair of restriction bits: *affine* (use at most once)
//! and *relevant* (use at least once). Join is the union of the bits, meet is
//! the intersection, and `a ⊑ b` holds when the bits of `a` are a subset of
//! the bits of `b`.

use core::fmt;

const AFFINE_BIT: u8 = 0b01;
const RELEVANT_BIT: u8 = 0b10;

/// A usage restriction attached to every type-level node.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[repr(u8)]
pub enum Qualifier {
    /// No restriction. Bottom of the lattice.
    #[default]
    Unrestricted = 0,
    /// Used at most once.
    Affine = AFFINE_BIT,
    /// Used at least once.
    Relevant = RELEVANT_BIT,
    /// Used exactly once. Top of the lattice.
    Linear = AFFINE_BIT | RELEVANT_BIT,
}

impl Qualifier {
    pub const ALL: [Qualifier; 4] = [
        Qualifier::Unrestricted,
        Qualifier::Affine,
        Qualifier::Relevant,
        Qualifier::Linear,
    ];

    fn from_bits(bits: u8) -> Self {
        match bits & (AFFINE_BIT | RELEVANT_BIT) {
            0 => Qualifier::Unrestricted,
            AFFINE_BIT => Qualifier::Affine,
            RELEVANT_BIT => Qualifier::Relevant,
            _ => Qualifier::Linear,
        }
    }

    fn bits(self) -> u8 {
        self as u8
    }

    /// Lattice join: the least qualifier at least as restrictive as both.
    ///
    /// Using two values together is at least as restricted as using either
    /// one, so compound types combine the qualifiers of their components.
    ///
    /// ```
    /// use ural_core::Qualifier;
    ///
    /// assert_eq!(
    ///     Qualifier::Affine.combine(Qualifier::Relevant),
    ///     Qualifier::Linear
    /// );
    /// assert_eq!(
    ///     Qualifier::Unrestricted.combine(Qualifier::Affine),
    ///     Qualifier::Affine
    /// );
    /// ```
    pub fn combine(self, other: Qualifier) -> Qualifier {
        Qualifier::from_bits(self.bits() | other.bits())
    }

    /// Lattice meet: the most restrictive qualifier below both.
    pub fn meet(self, other: Qualifier) -> Qualifier {
        Qualifier::from_bits(self.bits() & other.bits())
    }

    /// `self ⊑ other`.
    pub fn is_below(self, other: Qualifier) -> bool {
        self.bits() & !other.bits() == 0
    }

    /// Values may be used at most once (Affine or Linear).
    pub fn is_affine(self) -> bool {
        self.bits() & AFFINE_BIT != 0
    }

    /// Values must be used at least once (Relevant or Linear).
    pub fn is_relevant(self) -> bool {
        self.bits() & RELEVANT_BIT != 0
    }

    /// Join over any number of qualifiers. The empty join is `Unrestricted`.
    pub fn join_all(qualifiers: impl IntoIterator<Item = Qualifier>) -> Qualifier {
        let mut acc = Qualifier::Unrestricted;
        for q in qualifiers {
            acc = acc.combine(q);
            if acc == Qualifier::Linear {
                break;
            }
        }
        acc
    }

    /// Meet over any number of qualifiers. The empty meet is `Linear`.
    pub fn meet_all(qualifiers: impl IntoIterator<Item = Qualifier>) -> Qualifier {
        let mut acc = Qualifier::Linear;
        for q in qualifiers {
            acc = acc.meet(q);
            if acc == Qualifier::Unrestricted {
                break;
            }
        }
        acc
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Qualifier::Unrestricted => "ᵁ",
            Qualifier::Affine => "ᴬ",
            Qualifier::Relevant => "ᴿ",
            Qualifier::Linear => "ᴸ",
        }
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Qualifier::Unrestricted => "unrestricted",
            Qualifier::Affine => "affine",
            Qualifier::Relevant => "relevant",
            Qualifier::Linear => "linear",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
#[path = "qualifier_test.rs"]
mod qualifier_test;
