//! Ural - a hash-consed, dependently typed intermediate representation
//!
//! # Overview
//!
//! Ural is the kernel of a compiler IR in which terms, types and kinds share
//! one graph. Every node lives in a [`World`] and is addressed by a small
//! [`Def`] handle. Structurally equal nodes are the same node, so comparing
//! two types is comparing two integers.
//!
//! Types carry a usage [`Qualifier`] (unrestricted, affine, relevant or
//! linear), and the default [`UsagePolicy`] rejects a second use of an affine
//! value by producing an error sentinel.
//!
//! # Quick Start
//!
//! ```
//! use bumpalo::Bump;
//! use ural::{Qualifier, World};
//!
//! let arena = Bump::new();
//! let mut w = World::new(&arena);
//!
//! // λ(T: *). λ(x: T). x
//! let star = w.star(Qualifier::Unrestricted);
//! let t = w.var(star, 0);
//! // Under both binders `T` is one level further out.
//! let t_outer = w.var(star, 1);
//! let x = w.var(t_outer, 0);
//! let inner = w.lambda(&[t], x);
//! let poly_id = w.lambda(&[star], inner);
//!
//! let nat = w.type_nat();
//! let nat_id = w.app(poly_id, &[nat]);
//! let forty_two = w.lit_nat(42);
//! assert_eq!(w.app(nat_id, &[forty_two]), forty_two);
//! ```
//!
//! # Architecture
//!
//! - [`World`]: arena, intern table and the factories for every node kind
//! - [`Def`]: node handle with accessors taking the world
//! - [`Qualifier`]: the usage lattice
//! - [`Normalizer`]: hook for folding applications of axioms
//! - [`DefVisitor`]: read-only traversal, used by [`World::verify`]

pub use ural_core::*;
