use super::*;
use crate::test_utils::setup;
use crate::unify::unify;

#[test]
fn subst_bind_and_unwind() {
    let mut trail = setup();
    let a = trail.atom("a");
    let b = trail.atom("b");
    let mut subst = Subst::new();
    subst.bind(VarId(0), a);
    let mark = subst.len();
    subst.bind(VarId(1), b);
    assert_eq!(subst.get(VarId(1)), Some(b));
    subst.unwind(mark);
    assert_eq!(subst.get(VarId(0)), Some(a));
    assert_eq!(subst.get(VarId(1)), None);
    subst.clear();
    assert!(subst.is_empty());
}

#[test]
fn variant_renames_consistently() {
    let mut trail = setup();
    let x = trail.new_var();
    let y = trail.new_var();
    let t = trail.compound("f", &[x, y, x]);
    let copy = variant(t, &mut trail);
    assert_ne!(copy, t);
    assert_eq!(trail.stringify(copy), "f(_2, _3, _2)");
}

#[test]
fn variant_shares_ground_subterms() {
    let mut trail = setup();
    let one = trail.int(1);
    let a = trail.atom("a");
    let t = trail.compound("g", &[a, one]);
    let before = trail.var_count();
    assert_eq!(variant(t, &mut trail), t);
    assert_eq!(trail.var_count(), before);
}

#[test]
fn variant_copies_through_bindings() {
    let mut trail = setup();
    let x = trail.new_var();
    let y = trail.new_var();
    let a = trail.atom("a");
    let t = trail.compound("f", &[x, y]);
    assert!(unify(x, a, &mut trail));
    let copy = variant(t, &mut trail);
    assert_eq!(trail.stringify(copy), "f(a, _2)");
}

#[test]
fn instantiate_uses_existing_bindings() {
    let mut trail = setup();
    let x = trail.new_var();
    let y = trail.new_var();
    let seven = trail.int(7);
    let t = trail.compound("h", &[x, y]);
    let mut subst = Subst::new();
    subst.bind(trail.unbound_var(x).unwrap(), seven);
    let out = instantiate(t, &mut subst, &mut trail);
    assert_eq!(trail.stringify(out), "h(7, _2)");
    // the fresh variable is remembered for later copies
    let again = instantiate(y, &mut subst, &mut trail);
    assert_eq!(trail.stringify(again), "_2");
}
