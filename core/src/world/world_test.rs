use crate::{KernelError, Qualifier, Sort, Tag, Use, World, WorldOptions, test_utils};
use bumpalo::Bump;
use pretty_assertions::assert_eq;

#[test]
fn test_builtins() {
    let bump = Bump::new();
    let w = World::new(&bump);

    let universe = w.universe();
    assert_eq!(universe.ty(&w), None);
    assert_eq!(universe.sort(&w), Sort::Universe);

    for q in Qualifier::ALL {
        let star = w.star(q);
        assert_eq!(star.ty(&w), Some(universe));
        assert_eq!(star.sort(&w), Sort::Kind);
        assert_eq!(star.tag(&w), Tag::Star);

        let literal = w.qualifier(q);
        assert_eq!(literal.ty(&w), Some(w.qualifier_type()));
        assert_eq!(literal.tag(&w), Tag::Qualifier(q));
        // Qualifier literals are types of kind ℚ, not `Star`.
        assert_eq!(literal.qualifier(&w), w.qualifier(Qualifier::Unrestricted));

        let nat = w.nat(q);
        assert_eq!(nat.sort(&w), Sort::Type);
        assert_eq!(nat.known_qualifier(&w), Some(q));
        assert!(nat.is_nominal(&w));
    }
    assert_eq!(w.type_nat().name(&w), Some("nat"));
    assert_eq!(w.nat(Qualifier::Affine).name(&w), Some("ᴬnat"));
    assert_eq!(w.arity_kind().ty(&w), Some(universe));
}

#[test]
fn test_interning() {
    test_utils::init_test_logging();
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let nat = w.type_nat();

    let x1 = w.var(nat, 0);
    let x2 = w.var(nat, 0);
    assert_eq!(x1, x2);
    assert_ne!(x1, w.var(nat, 1));

    let one = w.lit_nat(1);
    assert_eq!(one, w.lit_nat(1));
    assert_ne!(one, w.lit_nat(2));

    let before = w.num_defs();
    let f1 = w.pi(&[nat], nat);
    let after_first = w.num_defs();
    let f2 = w.pi(&[nat], nat);
    assert_eq!(f1, f2);
    assert!(after_first > before);
    assert_eq!(w.num_defs(), after_first);
}

#[test]
fn test_nominal_never_shared() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let nat = w.type_nat();

    let a = w.axiom(nat, "a");
    let b = w.axiom(nat, "a");
    assert_ne!(a, b);
    assert!(a.is_nominal(&w));
    assert!(b.gid() > a.gid());
}

#[test]
fn test_uses_are_wired() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let seven = w.lit_nat(7);
    let yes = w.lit_bool(true);

    let pair = w.tuple(&[seven, yes]);
    assert_eq!(pair.tag(&w), Tag::Tuple);
    assert!(seven.uses(&w).contains(&Use {
        user: pair,
        index: 0,
    }));
    assert!(yes.uses(&w).contains(&Use {
        user: pair,
        index: 1,
    }));
}

#[test]
fn test_free_vars() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let nat = w.type_nat();

    let x = w.var(nat, 3);
    assert_eq!(x.free_vars(&w).iter().collect::<Vec<_>>(), vec![3]);

    // The body's level 3 is level 2 outside the binder.
    let f = w.lambda(&[nat], x);
    assert_eq!(f.free_vars(&w).iter().collect::<Vec<_>>(), vec![2]);

    let bound = w.var(nat, 0);
    let id = w.lambda(&[nat], bound);
    assert!(id.is_closed(&w));

    // A variable's type is part of its free variables.
    let star = w.star(Qualifier::Unrestricted);
    let t = w.var(star, 1);
    let y = w.var(t, 0);
    assert_eq!(y.free_vars(&w).iter().collect::<Vec<_>>(), vec![0, 1]);
}

#[test]
fn test_named() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let nat = w.type_nat();
    let x = w.var(nat, 0);

    assert_eq!(x.name(&w), None);
    w.named(x, "x");
    w.named(x, "y");
    assert_eq!(x.name(&w), Some("x"));
}

#[test]
fn test_externals() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let nat = w.type_nat();
    let main = w.axiom(nat, "main");
    let other = w.axiom(nat, "other");

    w.make_external(other);
    w.make_external(main);
    assert!(w.is_external(main));
    assert_eq!(w.externals(), vec![main, other]);

    assert!(w.make_internal(main));
    assert!(!w.make_internal(main));
    assert_eq!(w.externals(), vec![other]);
}

#[test]
fn test_binder_depth_limit() {
    let bump = Bump::new();
    let mut w = World::with_options(
        &bump,
        WorldOptions {
            max_binder_depth: Some(4),
            ..Default::default()
        },
    );
    let nat = w.type_nat();

    assert!(w.try_var(nat, 3).is_ok());
    assert_eq!(
        w.try_var(nat, 4),
        Err(KernelError::BitsetOverflow { level: 4, limit: 4 })
    );
}

#[test]
fn test_deep_levels_without_limit() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let nat = w.type_nat();

    let deep = w.var(nat, 1000);
    assert!(deep.has_free_var(&w, 1000));
    let shifted = w.shift_free_vars(deep, -990);
    assert_eq!(shifted, w.var(nat, 10));
}

#[test]
fn test_nominal_sigma_tie() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let nat = w.type_nat();
    let star = w.star(Qualifier::Unrestricted);

    let list = w.sigma_nominal(star, 2, "list");
    assert!(!list.is_tied(&w));
    assert_eq!(list.op_slot(&w, 0), None);

    w.set_op(list, 0, nat);
    w.set_op(list, 1, list);
    assert!(list.is_tied(&w));
    assert_eq!(list.ops(&w), &[nat, list]);
    assert!(list.uses(&w).contains(&Use {
        user: list,
        index: 1,
    }));

    assert_eq!(
        w.try_set_op(list, 0, nat),
        Err(KernelError::Malformed("nominal operand installed twice"))
    );
    assert_eq!(w.verify(list), Ok(()));
}

#[test]
fn test_structural_is_immutable() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let nat = w.type_nat();
    let bool = w.type_bool();
    let pair = w.sigma(&[nat, bool]);

    assert_eq!(
        w.try_set_op(pair, 0, bool),
        Err(KernelError::Malformed("operands of structural nodes are immutable"))
    );
}

#[test]
fn test_nominal_must_stay_closed() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let nat = w.type_nat();
    let star = w.star(Qualifier::Unrestricted);
    let open = w.var(star, 0);

    let s = w.sigma_nominal(star, 1, "s");
    assert_eq!(
        w.try_set_op(s, 0, open),
        Err(KernelError::Malformed("nominal node would capture a free variable"))
    );
    w.set_op(s, 0, nat);
}

#[test]
fn test_verify_all() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let nat = w.type_nat();
    let bool = w.type_bool();

    let x = w.var(nat, 0);
    let id = w.lambda(&[nat], x);
    let seven = w.lit_nat(7);
    w.app(id, &[seven]);
    let pair = w.sigma(&[nat, bool]);
    let p = w.var(pair, 0);
    let first = w.extract(p, 0);
    w.lambda(&[pair], first);
    let e = w.error(nat);
    w.tuple(&[e, seven]);

    assert_eq!(w.verify_all(), Ok(()));
}
