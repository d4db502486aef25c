use crate::term::{Term, TermId, VarId};
use crate::trail::Trail;
use hashbrown::HashSet;
use smallvec::SmallVec;

#[cfg(feature = "tracing")]
use crate::trace::trace;

/// Unify two terms, recording bindings on the trail.
///
/// Uses an explicit worklist to avoid recursion and performs the occurs
/// check. On failure every binding and woken goal from this attempt is
/// rolled back, so the caller observes either the full unifier or nothing.
pub fn unify(a: TermId, b: TermId, trail: &mut Trail) -> bool {
    let mark = trail.note();
    let woken = trail.wakeup_len();
    let mut worklist: SmallVec<[(TermId, TermId); 32]> = SmallVec::new();
    worklist.push((a, b));
    if unify_worklist(&mut worklist, trail) {
        return true;
    }
    trail.undo(mark);
    trail.truncate_wakeups(woken);
    false
}

fn unify_worklist(worklist: &mut SmallVec<[(TermId, TermId); 32]>, trail: &mut Trail) -> bool {
    while let Some((x, y)) = worklist.pop() {
        let x = trail.deref(x);
        let y = trail.deref(y);
        if x == y {
            continue;
        }
        match (trail.terms.get(x), trail.terms.get(y)) {
            (Term::Var(vx), Term::Var(vy)) => {
                let (vx, vy) = (*vx, *vy);
                let (from, to) = pick_direction(trail, vx, x, vy, y);
                trail.bind(from, to);
            }
            (Term::Var(v), _) => {
                let v = *v;
                if occurs(v, y, trail) {
                    #[cfg(feature = "tracing")]
                    trace!(var = v.0, "unify_occurs_check_failed");
                    return false;
                }
                trail.bind(v, y);
            }
            (_, Term::Var(v)) => {
                let v = *v;
                if occurs(v, x, trail) {
                    #[cfg(feature = "tracing")]
                    trace!(var = v.0, "unify_occurs_check_failed");
                    return false;
                }
                trail.bind(v, x);
            }
            (Term::Int(n), Term::Int(m)) => {
                if n != m {
                    return false;
                }
            }
            (Term::App(f1, kids1), Term::App(f2, kids2)) => {
                if f1 != f2 || kids1.len() != kids2.len() {
                    #[cfg(feature = "tracing")]
                    trace!("unify_functor_mismatch");
                    return false;
                }
                for (k1, k2) in kids1.iter().zip(kids2.iter()) {
                    worklist.push((*k1, *k2));
                }
            }
            _ => return false,
        }
    }
    true
}

/// Choose which of two unbound variables gets bound.
///
/// A plain variable is bound to an attributed one so attributes survive;
/// otherwise the younger variable is bound to the older.
fn pick_direction(
    trail: &Trail,
    vx: VarId,
    x: TermId,
    vy: VarId,
    y: TermId,
) -> (VarId, TermId) {
    match (trail.has_attributes(vx), trail.has_attributes(vy)) {
        (false, true) => (vx, y),
        (true, false) => (vy, x),
        _ if vx > vy => (vx, y),
        _ => (vy, x),
    }
}

/// Structural identity: no bindings are made, and two distinct unbound
/// variables are never the same.
pub fn same(a: TermId, b: TermId, trail: &Trail) -> bool {
    let mut stack: SmallVec<[(TermId, TermId); 32]> = SmallVec::new();
    stack.push((a, b));
    while let Some((x, y)) = stack.pop() {
        let x = trail.deref(x);
        let y = trail.deref(y);
        if x == y {
            continue;
        }
        match (trail.terms.get(x), trail.terms.get(y)) {
            (Term::Int(n), Term::Int(m)) if n == m => {}
            (Term::App(f1, kids1), Term::App(f2, kids2)) => {
                if f1 != f2 || kids1.len() != kids2.len() {
                    return false;
                }
                stack.extend(kids1.iter().copied().zip(kids2.iter().copied()));
            }
            _ => return false,
        }
    }
    true
}

/// Occurs check: does variable `var` occur in `term` (through bindings)?
pub fn occurs(var: VarId, term: TermId, trail: &Trail) -> bool {
    let mut stack: SmallVec<[TermId; 16]> = SmallVec::new();
    stack.push(term);
    while let Some(t) = stack.pop() {
        match trail.terms.get(trail.deref(t)) {
            Term::Var(v) if *v == var => return true,
            Term::App(_, kids) => stack.extend(kids.iter().copied()),
            _ => {}
        }
    }
    false
}

/// A term is ground when it contains no unbound variables.
pub fn is_ground(term: TermId, trail: &Trail) -> bool {
    let mut stack: SmallVec<[TermId; 16]> = SmallVec::new();
    stack.push(term);
    while let Some(t) = stack.pop() {
        match trail.terms.get(trail.deref(t)) {
            Term::Var(_) => return false,
            Term::App(_, kids) => stack.extend(kids.iter().copied()),
            Term::Int(_) => {}
        }
    }
    true
}

/// Distinct unbound variables of `term`, in left-to-right order of first
/// occurrence.
pub fn free_vars(trail: &Trail, term: TermId) -> Vec<VarId> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut stack: SmallVec<[TermId; 16]> = SmallVec::new();
    stack.push(term);
    while let Some(t) = stack.pop() {
        match trail.terms.get(trail.deref(t)) {
            Term::Var(v) => {
                if seen.insert(*v) {
                    out.push(*v);
                }
            }
            Term::App(_, kids) => stack.extend(kids.iter().rev().copied()),
            Term::Int(_) => {}
        }
    }
    out
}
