//! Configuration options for a [`World`](crate::World).

use crate::Box;
use crate::policy::{EagerSubstructural, UsagePolicy};

/// Configuration options for a world.
///
/// # Example
///
/// ```
/// use bumpalo::Bump;
/// use ural_core::{World, WorldOptions, policy::Unchecked};
///
/// let arena = Bump::new();
/// let world = World::with_options(
///     &arena,
///     WorldOptions {
///         max_binder_depth: Some(64),
///         usage_policy: Box::new(Unchecked),
///         ..Default::default()
///     },
/// );
/// assert!(world.num_defs() > 0);
/// ```
#[derive(Debug)]
pub struct WorldOptions {
    /// Number of nodes to reserve room for up front.
    ///
    /// Default: 1024
    pub initial_capacity: usize,

    /// Deepest de Bruijn level a variable may refer to.
    ///
    /// Free variables are tracked in a growable bit-vector, so this is only
    /// a guard against runaway binder nesting. Exceeding it is reported as
    /// [`KernelError::BitsetOverflow`](crate::KernelError::BitsetOverflow).
    ///
    /// Default: None
    pub max_binder_depth: Option<usize>,

    /// Decides whether a value may appear in another application.
    ///
    /// Default: [`EagerSubstructural`]
    pub usage_policy: Box<dyn UsagePolicy>,
}

impl Default for WorldOptions {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            max_binder_depth: None,
            usage_policy: Box::new(EagerSubstructural),
        }
    }
}
