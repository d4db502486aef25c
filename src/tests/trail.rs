use super::*;
use crate::chr::RuleId;
use crate::test_utils::setup;
use crate::unify::unify;

fn snapshot(trail: &Trail, vars: &[TermId]) -> Vec<String> {
    let mut out: Vec<String> = vars
        .iter()
        .map(|&v| {
            let atts: Vec<String> = trail
                .unbound_var(v)
                .map(|id| trail.atts(id).iter().map(|&a| trail.stringify(a)).collect())
                .unwrap_or_default();
            format!("{} {:?}", trail.stringify(v), atts)
        })
        .collect();
    out.extend(
        trail
            .chr_live()
            .iter()
            .map(|(cid, t)| format!("chr{}: {}", cid.0, trail.stringify(*t))),
    );
    out.push(format!("history {}", trail.chr.history_len()));
    out
}

#[test]
fn new_vars_are_monotonic() {
    let mut trail = setup();
    let a = trail.new_var();
    let b = trail.new_var();
    assert_ne!(a, b);
    assert_eq!(trail.var_count(), 2);
    assert_eq!(trail.stringify(a), "_0");
    assert_eq!(trail.stringify(b), "_1");
}

#[test]
fn list_round_trips_through_items() {
    let mut trail = setup();
    let one = trail.int(1);
    let two = trail.int(2);
    let list = trail.list(&[one, two]);
    assert_eq!(trail.stringify(list), ".(1, .(2, nil))");
    assert_eq!(trail.list_items(list), Some(vec![one, two]));

    let x = trail.new_var();
    let partial = trail.compound(".", &[one, x]);
    assert_eq!(trail.list_items(partial), None);
}

#[test]
fn conjoin_builds_right_nested_conjunction() {
    let mut trail = setup();
    let a = trail.atom("a");
    let b = trail.atom("b");
    let c = trail.atom("c");
    let empty = trail.conjoin(&[]);
    assert_eq!(trail.stringify(empty), "true");
    let conj = trail.conjoin(&[a, b, c]);
    assert_eq!(trail.stringify(conj), ",(a, ,(b, c))");
}

#[test]
fn undo_restores_bindings() {
    let mut trail = setup();
    let x = trail.new_var();
    let a = trail.atom("a");
    let mark = trail.note();
    assert!(unify(x, a, &mut trail));
    assert_eq!(trail.deref(x), a);
    trail.undo(mark);
    assert_eq!(trail.deref(x), x);
    assert_eq!(trail.len(), mark);
}

#[test]
fn frozen_goal_wakes_on_bind_and_chains() {
    let mut trail = setup();
    let x = trail.new_var();
    let v = trail.unbound_var(x).unwrap();
    let g1 = trail.atom("g1");
    let g2 = trail.atom("g2");
    trail.freeze(v, g1);
    trail.freeze(v, g2);
    let chained = trail.frozen_goal(v).unwrap();
    assert_eq!(trail.stringify(chained), ",(g1, g2)");

    let a = trail.atom("a");
    trail.bind(v, a);
    assert_eq!(trail.take_wakeups(), vec![chained]);
}

#[test]
fn binding_attributed_var_schedules_reconciliation() {
    let mut trail = setup();
    let x = trail.new_var();
    let v = trail.unbound_var(x).unwrap();
    let one = trail.int(1);
    let dom = trail.compound("dom", &[one]);
    assert!(trail.put_att(v, dom));

    let a = trail.atom("a");
    trail.set_attr_hook(true);
    trail.bind(v, a);
    assert_eq!(trail.deref(x), x, "attributed var must stay unbound");
    let woken: Vec<String> = trail
        .take_wakeups()
        .iter()
        .map(|&g| trail.stringify(g))
        .collect();
    assert_eq!(woken, vec!["attr_unify_hook(_0, a)", "hard_bind(_0, a)"]);

    trail.set_attr_hook(false);
    trail.bind(v, a);
    assert_eq!(trail.take_wakeups().len(), 1);
}

#[test]
fn put_att_replaces_by_key() {
    let mut trail = setup();
    let x = trail.new_var();
    let v = trail.unbound_var(x).unwrap();
    let one = trail.int(1);
    let two = trail.int(2);
    let d1 = trail.compound("dom", &[one]);
    let d2 = trail.compound("dom", &[two]);
    let color = trail.atom("red");
    assert!(trail.put_att(v, d1));
    assert!(trail.put_att(v, color));
    assert!(trail.put_att(v, d2));
    assert_eq!(trail.atts(v), vec![d2, color]);
    let key = trail.terms.functor(d1).unwrap();
    assert_eq!(trail.get_att(v, key), Some(d2));

    let y = trail.new_var();
    assert!(!trail.put_att(v, y), "attribute must have a functor");
}

#[test]
fn constraint_store_kill_drops_history() {
    let mut trail = setup();
    let a = trail.atom("a");
    let b = trail.atom("b");
    let ca = trail.chr_add_constraint(a);
    let cb = trail.chr_add_constraint(b);
    let entry = History::new(RuleId(0), &[ca, cb]);
    trail.chr_step_history(entry.clone());
    assert!(trail.chr_fired(&entry));

    assert!(trail.chr_kill(ca));
    assert!(!trail.chr_alive(ca));
    assert!(!trail.chr_fired(&entry));
    assert!(!trail.chr_kill(ca), "killing twice is a no-op");
    assert_eq!(trail.chr_live(), vec![(cb, b)]);
}

#[test]
fn undo_is_bit_for_bit_idempotent() {
    let mut trail = setup();
    let x = trail.new_var();
    let y = trail.new_var();
    let a = trail.atom("a");
    let pre = trail.chr_add_constraint(a);
    let vx = trail.unbound_var(x).unwrap();
    let one = trail.int(1);
    let d1 = trail.compound("dom", &[one]);
    assert!(trail.put_att(vx, d1));

    let before = snapshot(&trail, &[x, y]);
    let frozen_before = trail.frozen_goal(vx);
    let mark = trail.note();

    let two = trail.int(2);
    let d2 = trail.compound("dom", &[two]);
    assert!(trail.put_att(vx, d2));
    let tag = trail.atom("tag");
    assert!(trail.put_att(vx, tag));
    let g = trail.atom("g");
    trail.freeze(vx, g);
    let b = trail.atom("b");
    let cb = trail.chr_add_constraint(b);
    trail.chr_step_history(History::new(RuleId(3), &[pre, cb]));
    assert!(trail.chr_kill(pre));
    assert!(unify(y, b, &mut trail));

    trail.undo(mark);
    assert_eq!(snapshot(&trail, &[x, y]), before);
    assert_eq!(trail.frozen_goal(vx), frozen_before);
    assert!(trail.chr_alive(pre));
    assert!(!trail.chr_alive(cb));
    assert_eq!(trail.len(), mark);
}

#[test]
fn undo_reinstates_killed_history() {
    let mut trail = setup();
    let a = trail.atom("a");
    let b = trail.atom("b");
    let ca = trail.chr_add_constraint(a);
    let cb = trail.chr_add_constraint(b);
    let entry = History::new(RuleId(1), &[ca, cb]);
    trail.chr_step_history(entry.clone());

    let mark = trail.note();
    trail.chr_kill(cb);
    assert!(!trail.chr_fired(&entry));
    trail.undo(mark);
    assert!(trail.chr_fired(&entry));
    assert_eq!(trail.chr_candidates(trail.terms.functor(b).unwrap()), vec![cb]);
}

#[test]
fn deep_freeze_reaches_every_free_var() {
    let mut trail = setup();
    let x = trail.new_var();
    let y = trail.new_var();
    let a = trail.atom("a");
    let t = trail.compound("f", &[x, a, y, x]);
    let goal = trail.atom("revise");
    trail.deep_freeze(t, goal);
    let vx = trail.unbound_var(x).unwrap();
    let vy = trail.unbound_var(y).unwrap();
    assert_eq!(trail.frozen_goal(vx), Some(goal));
    assert_eq!(trail.frozen_goal(vy), Some(goal));
}

#[test]
fn deep_freeze_skips_variables_already_holding_goal() {
    let mut trail = setup();
    let x = trail.new_var();
    let y = trail.new_var();
    let t = trail.compound("f", &[x, y]);
    let goal = trail.atom("revise");
    let other = trail.atom("other");
    let vx = trail.unbound_var(x).unwrap();
    trail.freeze(vx, other);
    trail.deep_freeze(t, goal);
    let mark = trail.note();
    trail.deep_freeze(t, goal);
    assert_eq!(trail.len(), mark);
    let chain = trail.frozen_goal(vx).unwrap();
    assert_eq!(trail.stringify(chain), ",(other, revise)");
}

#[test]
fn deferred_goals_are_undone_with_the_trail() {
    let mut trail = setup();
    let kept = trail.atom("kept");
    let dropped = trail.atom("dropped");
    trail.chr_defer(kept);
    let mark = trail.note();
    trail.chr_defer(dropped);
    trail.undo(mark);
    assert_eq!(trail.chr_take_deferred(), vec![kept]);

    // Rewinding past a deferral that was already taken is harmless.
    trail.undo(0);
    assert!(trail.chr_take_deferred().is_empty());
}
