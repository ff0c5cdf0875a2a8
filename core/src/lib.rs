#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]

//! The kernel of a dependently typed, substructural intermediate
//! representation.
//!
//! Terms, types, kinds and the universe are all [`Def`]s living in one
//! hash-consed [`World`]. Binders use de Bruijn levels; every type-level
//! node carries a [`Qualifier`]. Factories canonicalize as they build:
//! functions over tuples are uncurried, homogeneous tuples are compressed
//! into arrays, and applications of lambdas are beta-reduced on the spot.

extern crate alloc;

// Re-export for convenience so other modules don't need alloc:: prefix
#[allow(unused_imports)]
pub(crate) use alloc::{boxed::Box, format, string::String, vec, vec::Vec};

pub mod def;
pub mod error;
mod form;
pub mod normalize;
pub mod policy;
pub mod qualifier;
mod subst;
pub mod visit;
pub mod world;

pub use def::{Def, DefFlags, FreeVars, Sort, Tag, Use};
pub use error::{KernelError, Result};
pub use normalize::{Normalizer, Rewrite};
pub use policy::UsagePolicy;
pub use qualifier::Qualifier;
pub use visit::DefVisitor;
pub use world::{World, WorldOptions};

/// Test utilities for enabling logging in tests
#[cfg(test)]
pub mod test_utils {
    /// Initialize tracing subscriber for tests with DEBUG level
    /// Call this at the start of tests where you want to see logging output
    ///
    /// # Example
    /// ```ignore
    /// #[test]
    /// fn test_beta() {
    ///     test_utils::init_test_logging();
    ///     // ... your test code
    /// }
    /// ```
    pub fn init_test_logging() {
        use tracing_subscriber::{EnvFilter, fmt};

        // Try to initialize, ignore error if already initialized
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}
