use super::*;
use crate::test_utils::setup;
use crate::unify::unify;

fn rule(trail: &mut Trail, pattern: &[TermId], keep: usize) -> ChrRule {
    let truth = trail.atom("true");
    ChrRule {
        name: "r".to_string(),
        pattern: SmallVec::from_slice(pattern),
        keep,
        guard: truth,
        body: truth,
    }
}

#[test]
fn candidates_are_newest_first() {
    let mut trail = setup();
    let one = trail.int(1);
    let two = trail.int(2);
    let c1 = trail.compound("c", &[one]);
    let c2 = trail.compound("c", &[two]);
    let id1 = trail.chr_add_constraint(c1);
    let id2 = trail.chr_add_constraint(c2);
    let f = trail.terms.functor(c1).unwrap();
    assert_eq!(trail.chr.candidates(f), vec![id2, id1]);
    assert_eq!(trail.chr.len(), 2);
}

#[test]
fn ids_are_never_reused() {
    let mut trail = setup();
    let a = trail.atom("a");
    let first = trail.chr_add_constraint(a);
    trail.chr_kill(first);
    let second = trail.chr_add_constraint(a);
    assert_ne!(first, second);
}

#[test]
fn rule_kill_slots() {
    let mut trail = setup();
    let a = trail.atom("a");
    let b = trail.atom("b");
    let simpagation = rule(&mut trail, &[a, b], 1);
    assert!(!simpagation.kills(0));
    assert!(simpagation.kills(1));
    assert!(!simpagation.is_propagation());
    let propagation = rule(&mut trail, &[a, b], 2);
    assert!(propagation.is_propagation());
    assert!(!propagation.kills(1));
}

#[test]
fn single_head_search_yields_once() {
    let mut trail = setup();
    let x = trail.new_var();
    let five = trail.int(5);
    let pat = trail.compound("c", &[x]);
    let c5 = trail.compound("c", &[five]);
    let id = trail.chr_add_constraint(c5);
    let r = rule(&mut trail, &[pat], 0);

    let mut search = PartnerSearch::new(&r, 0, id);
    assert_eq!(search.next(&trail), Some(vec![id]));
    let vx = trail.unbound_var(x).unwrap();
    assert_eq!(search.memo().get(vx), Some(five));
    assert_eq!(search.next(&trail), None);
    assert_eq!(search.next(&trail), None);
}

#[test]
fn pivot_mismatch_yields_nothing() {
    let mut trail = setup();
    let a = trail.atom("a");
    let b = trail.atom("b");
    let pat = trail.compound("c", &[a]);
    let cb = trail.compound("c", &[b]);
    let id = trail.chr_add_constraint(cb);
    let r = rule(&mut trail, &[pat], 0);
    assert_eq!(PartnerSearch::new(&r, 0, id).next(&trail), None);
}

#[test]
fn partner_search_is_exhaustive_and_distinct() {
    let mut trail = setup();
    let x = trail.new_var();
    let y = trail.new_var();
    let px = trail.compound("p", &[x]);
    let py = trail.compound("p", &[y]);
    let mut ids = Vec::new();
    for n in 1..=3 {
        let v = trail.int(n);
        let t = trail.compound("p", &[v]);
        ids.push(trail.chr_add_constraint(t));
    }
    let r = rule(&mut trail, &[px, py], 2);

    // the newest constraint is active in slot 0
    let mut search = PartnerSearch::new(&r, 0, ids[2]);
    let mut found = Vec::new();
    while let Some(assignment) = search.next(&trail) {
        found.push(assignment);
    }
    assert_eq!(found, vec![vec![ids[2], ids[1]], vec![ids[2], ids[0]]]);
    assert_eq!(search.active(), ids[2]);
}

#[test]
fn shared_variables_constrain_partners() {
    let mut trail = setup();
    let x = trail.new_var();
    let leq_x = trail.compound("leq", &[x]);
    let other = trail.compound("same_as", &[x]);
    let one = trail.int(1);
    let two = trail.int(2);
    let l1 = trail.compound("leq", &[one]);
    let s2 = trail.compound("same_as", &[two]);
    let s1 = trail.compound("same_as", &[one]);
    let id_l1 = trail.chr_add_constraint(l1);
    let id_s1 = trail.chr_add_constraint(s1);
    let _id_s2 = trail.chr_add_constraint(s2);
    let r = rule(&mut trail, &[leq_x, other], 0);

    let mut search = PartnerSearch::new(&r, 0, id_l1);
    assert_eq!(search.next(&trail), Some(vec![id_l1, id_s1]));
    assert_eq!(search.next(&trail), None);
}

#[test]
fn pivot_in_later_slot() {
    let mut trail = setup();
    let a = trail.atom("a");
    let b = trail.atom("b");
    let ia = trail.chr_add_constraint(a);
    let ib = trail.chr_add_constraint(b);
    let r = rule(&mut trail, &[a, b], 1);
    let mut search = PartnerSearch::new(&r, 1, ib);
    assert_eq!(search.next(&trail), Some(vec![ia, ib]));
    assert_eq!(search.next(&trail), None);
}

#[test]
fn killed_active_constraint_has_no_instances() {
    let mut trail = setup();
    let a = trail.atom("a");
    let id = trail.chr_add_constraint(a);
    trail.chr_kill(id);
    let r = rule(&mut trail, &[a], 0);
    assert_eq!(PartnerSearch::new(&r, 0, id).next(&trail), None);
}

#[test]
fn search_sees_bindings_made_after_insertion() {
    let mut trail = setup();
    let z = trail.new_var();
    let seven = trail.int(7);
    let stored = trail.compound("c", &[z]);
    let pattern = trail.compound("c", &[seven]);
    let id = trail.chr_add_constraint(stored);
    let r = rule(&mut trail, &[pattern], 0);
    assert_eq!(PartnerSearch::new(&r, 0, id).next(&trail), None);
    assert!(unify(z, seven, &mut trail));
    assert_eq!(PartnerSearch::new(&r, 0, id).next(&trail), Some(vec![id]));
}

#[test]
fn history_entries_are_per_rule() {
    let mut store = ChrStore::new();
    let entry = History::new(RuleId(0), &[Cid(1), Cid(2)]);
    assert!(store.record_history(entry.clone()));
    assert!(!store.record_history(entry.clone()));
    assert!(store.has_fired(&entry));
    assert!(!store.has_fired(&History::new(RuleId(1), &[Cid(1), Cid(2)])));
    assert!(!store.has_fired(&History::new(RuleId(0), &[Cid(2), Cid(1)])));
    assert_eq!(store.forget_history_of(Cid(2)), vec![entry]);
    assert_eq!(store.history_len(), 0);
}
