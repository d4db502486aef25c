use crate::term::{Term, TermId, VarId};
use crate::trail::Trail;
use hashbrown::HashMap;
use smallvec::SmallVec;

/// A substitution memo mapping variables to terms.
///
/// Unlike trail bindings, a `Subst` never touches variable cells, so it can be
/// extended speculatively and rolled back with [`Subst::unwind`] without
/// disturbing the shared state.
#[derive(Debug, Clone, Default)]
pub struct Subst {
    bindings: HashMap<VarId, TermId>,
    trail: SmallVec<[VarId; 16]>,
}

impl Subst {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, var: VarId) -> Option<TermId> {
        self.bindings.get(&var).copied()
    }

    /// Bind a variable that is not yet in the memo.
    pub fn bind(&mut self, var: VarId, term: TermId) {
        if self.bindings.insert(var, term).is_none() {
            self.trail.push(var);
        }
    }

    /// Number of bindings, usable as an unwind mark.
    pub fn len(&self) -> usize {
        self.trail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trail.is_empty()
    }

    /// Drop every binding made after `mark`.
    pub fn unwind(&mut self, mark: usize) {
        while self.trail.len() > mark {
            if let Some(var) = self.trail.pop() {
                self.bindings.remove(&var);
            }
        }
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
        self.trail.clear();
    }
}

/// Copy `term`, replacing each variable found in `subst` by its value and
/// every other unbound variable by a fresh one (recorded in `subst` so
/// repeated occurrences stay shared).
pub fn instantiate(term: TermId, subst: &mut Subst, trail: &mut Trail) -> TermId {
    let term = trail.deref(term);
    match trail.terms.get(term) {
        Term::Var(v) => {
            let v = *v;
            if let Some(t) = subst.get(v) {
                return t;
            }
            let fresh = trail.new_var();
            subst.bind(v, fresh);
            fresh
        }
        Term::Int(_) => term,
        Term::App(f, kids) => {
            if kids.is_empty() {
                return term;
            }
            let f = *f;
            let kids = kids.clone();
            let copied: SmallVec<[TermId; 4]> = kids
                .iter()
                .map(|&k| instantiate(k, subst, trail))
                .collect();
            trail.terms.app(f, copied)
        }
    }
}

/// Fresh copy of `term` with every unbound variable renamed consistently.
pub fn variant(term: TermId, trail: &mut Trail) -> TermId {
    instantiate(term, &mut Subst::new(), trail)
}

#[cfg(test)]
#[path = "tests/subst.rs"]
mod tests;
