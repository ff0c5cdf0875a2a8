use crate::{KernelError, Qualifier, Tag, World};
use bumpalo::Bump;
use pretty_assertions::assert_eq;

#[test]
fn test_sigma_of_one_is_its_component() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let nat = w.type_nat();

    assert_eq!(w.sigma(&[nat]), nat);
}

#[test]
fn test_sigma_of_one_keeps_requested_qualifier() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let nat = w.type_nat();
    let anat = w.nat(Qualifier::Affine);
    let lnat = w.nat(Qualifier::Linear);
    let affine = w.qualifier(Qualifier::Affine);
    let relevant = w.qualifier(Qualifier::Relevant);
    let linear = w.qualifier(Qualifier::Linear);

    let boxed = w.sigma_q(&[nat], linear);
    assert_eq!(boxed.tag(&w), Tag::Sigma);
    assert_eq!(boxed.ops(&w), &[nat]);
    assert_eq!(boxed.known_qualifier(&w), Some(Qualifier::Linear));
    assert_eq!(
        w.sigma_q(&[nat, nat], linear).known_qualifier(&w),
        Some(Qualifier::Linear)
    );

    // Already at least as restricted as requested.
    assert_eq!(w.sigma_q(&[lnat], affine), lnat);
    let raised = w.sigma_q(&[anat], relevant);
    assert_eq!(raised.known_qualifier(&w), Some(Qualifier::Linear));

    let one = w.arity(1);
    assert_eq!(w.variadic_q(one, nat, linear), boxed);

    let seven = w.lit_nat(7);
    let v = w.tuple_typed(boxed, &[seven]);
    assert_eq!(v.tag(&w), Tag::Tuple);
    assert_eq!(w.extract(v, 0), seven);
    assert_eq!(w.verify_all(), Ok(()));
}

#[test]
fn test_homogeneous_sigma_is_variadic() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let nat = w.type_nat();
    let bool = w.type_bool();

    let triple = w.sigma(&[nat, nat, nat]);
    assert_eq!(triple.tag(&w), Tag::Variadic);
    assert_eq!(triple, w.variadic_n(3, nat));
    assert_eq!(w.literal_arity(triple), Some(3));

    let mixed = w.sigma(&[nat, bool]);
    assert_eq!(mixed.tag(&w), Tag::Sigma);
    assert_eq!(mixed.ops(&w), &[nat, bool]);
    assert_eq!(mixed.ty(&w), Some(w.star(Qualifier::Unrestricted)));
}

#[test]
fn test_sigma_with_kind_lands_in_universe() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let nat = w.type_nat();
    let star = w.star(Qualifier::Unrestricted);

    let s = w.sigma(&[star, nat]);
    assert_eq!(s.tag(&w), Tag::Sigma);
    assert_eq!(s.ty(&w), Some(w.universe()));
}

#[test]
fn test_sigma_qualifier_is_join() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let anat = w.nat(Qualifier::Affine);
    let rnat = w.nat(Qualifier::Relevant);
    let nat = w.type_nat();
    let bool = w.type_bool();
    let affine = w.qualifier(Qualifier::Affine);

    let both = w.sigma(&[anat, rnat]);
    assert_eq!(both.known_qualifier(&w), Some(Qualifier::Linear));

    let plain = w.sigma(&[nat, bool]);
    assert_eq!(plain.known_qualifier(&w), Some(Qualifier::Unrestricted));

    let marked = w.sigma_q(&[nat, bool], affine);
    assert_eq!(marked.known_qualifier(&w), Some(Qualifier::Affine));

    let with_affine = w.sigma(&[anat, bool]);
    assert_eq!(with_affine.known_qualifier(&w), Some(Qualifier::Affine));
    assert_eq!(w.verify(with_affine), Ok(()));
}

#[test]
fn test_dependent_extract() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let star = w.star(Qualifier::Unrestricted);
    let t = w.var(star, 0);

    // Σ(T: *, x: T)
    let packed = w.sigma(&[star, t]);
    assert_eq!(packed.tag(&w), Tag::Sigma);
    let p = w.axiom(packed, "p");

    let ty = w.extract(p, 0);
    assert_eq!(ty.ty(&w), Some(star));
    let value = w.extract(p, 1);
    assert_eq!(value.ty(&w), Some(ty));
}

#[test]
fn test_tuple() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let nat = w.type_nat();
    let bool = w.type_bool();
    let seven = w.lit_nat(7);
    let yes = w.lit_bool(true);

    let pair = w.tuple(&[seven, yes]);
    assert_eq!(pair.tag(&w), Tag::Tuple);
    assert_eq!(pair.ty(&w), Some(w.sigma(&[nat, bool])));
    assert_eq!(w.tuple(&[seven]), seven);

    assert_eq!(w.extract(pair, 0), seven);
    assert_eq!(w.extract(pair, 1), yes);
    assert_eq!(
        w.try_extract(pair, 2),
        Err(KernelError::ArityMismatch {
            expected: 2,
            found: 2,
        })
    );
}

#[test]
fn test_tuple_typed_checks_components() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let nat = w.type_nat();
    let bool = w.type_bool();
    let pair = w.sigma(&[nat, bool]);
    let seven = w.lit_nat(7);
    let eight = w.lit_nat(8);

    assert_eq!(
        w.try_tuple_typed(pair, &[seven, eight]),
        Err(KernelError::TypeMismatch {
            expected: bool,
            found: nat,
        })
    );
    assert_eq!(
        w.try_tuple_typed(pair, &[seven]),
        Err(KernelError::ArityMismatch {
            expected: 2,
            found: 1,
        })
    );
}

#[test]
fn test_tuple_eta() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let nat = w.type_nat();
    let bool = w.type_bool();
    let pair = w.sigma(&[nat, bool]);
    let x = w.axiom(pair, "x");

    let x0 = w.extract(x, 0);
    let x1 = w.extract(x, 1);
    assert_eq!(w.tuple(&[x0, x1]), x);

    // A prefix of the projections is a new tuple.
    let triple = w.sigma(&[nat, nat, nat]);
    let y = w.axiom(triple, "y");
    let y0 = w.extract(y, 0);
    let y1 = w.extract(y, 1);
    let prefix = w.tuple(&[y0, y1]);
    assert_eq!(prefix.tag(&w), Tag::Tuple);
    assert_eq!(prefix.ops(&w), &[y0, y1]);
}

#[test]
fn test_uniform_tuple_is_pack() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let seven = w.lit_nat(7);

    let sevens = w.tuple(&[seven, seven, seven]);
    assert_eq!(sevens.tag(&w), Tag::Pack);
    assert_eq!(sevens, w.pack_n(3, seven));
    assert_eq!(w.extract(sevens, 2), seven);
}

#[test]
fn test_extract_past_array_end() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let nat = w.type_nat();
    let array = w.variadic_n(3, nat);
    let xs = w.axiom(array, "xs");

    let oob = w.extract(xs, 5);
    assert!(oob.is_error(&w));
    assert_eq!(oob.ty(&w), Some(nat));

    let in_bounds = w.extract(xs, 2);
    assert_eq!(in_bounds.tag(&w), Tag::Extract);
    assert_eq!(in_bounds.ty(&w), Some(nat));
}

#[test]
fn test_extract_from_scalar() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let seven = w.lit_nat(7);

    assert_eq!(w.extract(seven, 0), seven);
    assert!(w.try_extract(seven, 1).is_err());
}

#[test]
fn test_extract_from_unit() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let unit_value = w.unit_value();

    assert_eq!(
        w.try_extract(unit_value, 0),
        Err(KernelError::ArityMismatch {
            expected: 0,
            found: 0,
        })
    );
    let unit = w.unit();
    let u = w.axiom(unit, "u");
    assert!(w.try_extract(u, 3).is_err());
}

#[test]
fn test_extract_with_index_term() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let nat = w.type_nat();
    let bool = w.type_bool();
    let pair = w.sigma(&[nat, bool]);
    let x = w.axiom(pair, "x");
    let two = w.arity(2);
    let i = w.var(two, 0);

    assert_eq!(
        w.try_extract_at(x, i),
        Err(KernelError::Malformed(
            "a heterogeneous tuple can only be indexed by a literal"
        ))
    );

    let array = w.variadic_n(4, nat);
    let xs = w.axiom(array, "xs");
    let four = w.arity(4);
    let j = w.var(four, 0);
    let elem = w.extract_at(xs, j);
    assert_eq!(elem.ty(&w), Some(nat));
    assert_eq!(elem.ops(&w), &[xs, j]);
    assert!(w.try_extract_at(xs, i).is_err());
}

#[test]
fn test_extract_from_error() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let nat = w.type_nat();
    let bool = w.type_bool();
    let pair = w.sigma(&[nat, bool]);
    let broken = w.error(pair);

    assert_eq!(w.extract(broken, 1), w.error(bool));
}

#[test]
fn test_nominal_sigma_values() {
    let bump = Bump::new();
    let mut w = World::new(&bump);
    let nat = w.type_nat();
    let bool = w.type_bool();
    let star = w.star(Qualifier::Unrestricted);

    let entry = w.sigma_nominal(star, 2, "entry");
    w.set_op(entry, 0, nat);
    w.set_op(entry, 1, bool);
    assert_ne!(entry, w.sigma(&[nat, bool]));

    let v = w.axiom(entry, "v");
    assert_eq!(w.extract(v, 1).ty(&w), Some(bool));

    let seven = w.lit_nat(7);
    let yes = w.lit_bool(true);
    let literal = w.tuple_typed(entry, &[seven, yes]);
    assert_eq!(literal.ty(&w), Some(entry));
    assert_eq!(w.extract(literal, 0), seven);
}

#[test]
fn test_unit() {
    let bump = Bump::new();
    let mut w = World::new(&bump);

    let unit = w.unit();
    assert_eq!(w.tuple(&[]).ty(&w), Some(unit));
    assert_eq!(w.sigma(&[]), unit);
    assert_eq!(w.variadic_n(0, w.type_nat()), unit);
}
