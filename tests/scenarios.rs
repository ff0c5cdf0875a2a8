//! End-to-end reductions through the public API.

use bumpalo::Bump;
use pretty_assertions::assert_eq;
use ural::{Def, Qualifier, Tag, World};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// `λ(T: *). λ(x: T). x`
fn poly_id(w: &mut World<'_>) -> Def {
    let star = w.star(Qualifier::Unrestricted);
    let t = w.var(star, 0);
    let t_outer = w.var(star, 1);
    let x = w.var(t_outer, 0);
    let inner = w.lambda(&[t], x);
    w.lambda(&[star], inner)
}

#[test]
fn polymorphic_identity() {
    init_logging();
    let arena = Bump::new();
    let mut w = World::new(&arena);
    let star = w.star(Qualifier::Unrestricted);
    let id = poly_id(&mut w);

    let t = w.var(star, 0);
    let t_outer = w.var(star, 1);
    let inner_ty = w.pi(&[t], t_outer);
    assert_eq!(id.ty(&w), Some(w.pi(&[star], inner_ty)));

    let nat = w.type_nat();
    let nat_id = w.app(id, &[nat]);
    let x = w.var(nat, 0);
    assert_eq!(nat_id, w.lambda(&[nat], x));

    let forty_two = w.lit_nat(42);
    assert_eq!(w.app(nat_id, &[forty_two]), forty_two);
    assert_eq!(w.verify_all(), Ok(()));
}

#[test]
fn nested_lambdas_apply_back_to_the_body() {
    init_logging();
    let arena = Bump::new();
    let mut w = World::new(&arena);
    let nat = w.type_nat();

    let zero = w.lit_nat(0);
    let mut term = zero;
    for _ in 0..100 {
        term = w.lambda(&[nat], term);
    }
    for i in 0..100 {
        let arg = w.lit_nat(i + 1);
        term = w.app(term, &[arg]);
    }
    assert_eq!(term, zero);
}

#[test]
fn nested_lambdas_select_the_outermost_argument() {
    let arena = Bump::new();
    let mut w = World::new(&arena);
    let nat = w.type_nat();

    // The innermost body refers to the outermost of 100 binders.
    let mut term = w.var(nat, 99);
    for _ in 0..100 {
        term = w.lambda(&[nat], term);
    }
    assert!(term.is_closed(&w));

    let first = w.lit_nat(1000);
    term = w.app(term, &[first]);
    for i in 1..100 {
        let arg = w.lit_nat(i);
        term = w.app(term, &[arg]);
    }
    assert_eq!(term, first);
}

#[test]
fn deep_curried_application() {
    let arena = Bump::new();
    let mut w = World::new(&arena);
    let nat = w.type_nat();
    let pair = w.sigma(&[nat, nat]);
    let op_ty = w.pi(&[pair], nat);
    let op = w.axiom(op_ty, "op");

    let mut term = w.var(nat, 0);
    for i in 0..100 {
        let x = w.var(nat, i);
        let arg = w.tuple(&[x, term]);
        term = w.app(op, &[arg]);
    }
    assert!(term.has_free_var(&w, 99));
    for _ in 0..100 {
        term = w.lambda(&[nat], term);
    }
    assert!(term.is_closed(&w));
    assert_eq!(term.tag(&w), Tag::Lambda);

    for i in 0..100 {
        let arg = w.lit_nat(i);
        term = w.app(term, &[arg]);
    }
    assert!(term.is_closed(&w));
    assert!(!term.has_error(&w));
    assert_eq!(term.tag(&w), Tag::App);
    assert_eq!(term.op(&w, 0), op);
}

#[test]
fn currying_round_trip() {
    let arena = Bump::new();
    let mut w = World::new(&arena);
    let nat = w.type_nat();
    let bool = w.type_bool();
    let pair = w.sigma(&[nat, bool]);

    let p = w.var(pair, 0);
    let second = w.extract(p, 1);
    let packed = w.lambda(&[pair], second);

    let b = w.var(bool, 0);
    let spread = w.lambda(&[nat, bool], b);
    assert_eq!(packed, spread);
    assert_eq!(w.pi(&[pair], bool), w.pi(&[nat, bool], bool));

    let seven = w.lit_nat(7);
    let no = w.lit_bool(false);
    let arg = w.tuple(&[seven, no]);
    assert_eq!(w.app(packed, &[arg]), no);
    assert_eq!(w.app(spread, &[seven, no]), no);
}

#[test]
fn closed_terms_are_shift_invariant() {
    let arena = Bump::new();
    let mut w = World::new(&arena);
    let id = poly_id(&mut w);

    assert!(id.is_closed(&w));
    assert!(id.free_vars(&w).is_empty());
    for delta in [-100, -1, 1, 100] {
        assert_eq!(w.shift_free_vars(id, delta), id);
    }
}

#[test]
fn structural_equality_is_identity() {
    let arena = Bump::new();
    let mut w = World::new(&arena);
    let nat = w.type_nat();
    let bool = w.type_bool();

    let a = {
        let pair = w.sigma(&[nat, bool]);
        w.pi(&[pair], nat)
    };
    let b = {
        let pair = w.sigma(&[nat, bool]);
        w.pi(&[pair], nat)
    };
    assert_eq!(a, b);

    // Nominal constructions never coincide.
    let star = w.star(Qualifier::Unrestricted);
    let first = w.sigma_nominal(star, 1, "box");
    let second = w.sigma_nominal(star, 1, "box");
    w.set_op(first, 0, nat);
    w.set_op(second, 0, nat);
    assert_ne!(first, second);
}

#[test]
fn externals_survive_as_roots() {
    let arena = Bump::new();
    let mut w = World::new(&arena);
    let id = poly_id(&mut w);
    w.make_external(id);

    let reachable = w.reachable(&w.externals());
    assert_eq!(reachable.last(), Some(&id));
    assert!(reachable.contains(&w.universe()));
}
