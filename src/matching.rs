use crate::subst::Subst;
use crate::term::{Term, TermId};
use crate::trail::Trail;
use crate::unify::same;
use smallvec::SmallVec;

#[cfg(feature = "tracing")]
use crate::trace::trace;

/// One-way match: extend `memo` so that `pattern` under `memo` is
/// structurally identical to `term`.
///
/// Only the pattern's variables are assigned, and only in the memo; `term`
/// and every variable cell are left untouched. A variable already in the
/// memo must match its value by [`same`]. On failure the memo is unwound to
/// its state on entry.
pub fn match_term(pattern: TermId, term: TermId, memo: &mut Subst, trail: &Trail) -> bool {
    let mark = memo.len();
    if match_worklist(pattern, term, memo, trail) {
        #[cfg(feature = "tracing")]
        trace!(bindings = memo.len(), "match_success");
        true
    } else {
        memo.unwind(mark);
        false
    }
}

fn match_worklist(pattern: TermId, term: TermId, memo: &mut Subst, trail: &Trail) -> bool {
    let mut stack: SmallVec<[(TermId, TermId); 32]> = SmallVec::new();
    stack.push((pattern, term));
    while let Some((p, t)) = stack.pop() {
        let p = trail.deref(p);
        let t = trail.deref(t);
        match trail.terms.get(p) {
            Term::Var(v) => match memo.get(*v) {
                Some(bound) => {
                    if !same(bound, t, trail) {
                        #[cfg(feature = "tracing")]
                        trace!(var = v.0, "match_nonlinear_mismatch");
                        return false;
                    }
                }
                None => memo.bind(*v, t),
            },
            Term::Int(n) => match trail.terms.get(t) {
                Term::Int(m) if n == m => {}
                _ => return false,
            },
            Term::App(f, kids) => match trail.terms.get(t) {
                Term::App(tf, tkids) if tf == f && tkids.len() == kids.len() => {
                    stack.extend(kids.iter().copied().zip(tkids.iter().copied()));
                }
                _ => {
                    #[cfg(feature = "tracing")]
                    trace!("match_functor_mismatch");
                    return false;
                }
            },
        }
    }
    true
}

#[cfg(test)]
#[path = "tests/matching.rs"]
mod tests;
