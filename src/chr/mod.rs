//! Constraint Handling Rules: the constraint store, the propagation history
//! and the partner search that finds rule instances to fire.
//!
//! Store mutations that must be undoable go through the [`Trail`]
//! (`chr_add_constraint`, `chr_kill`, `chr_step_history`); the raw operations
//! here are only called from there and from trail rewinds.

use crate::matching::match_term;
use crate::subst::Subst;
use crate::symbol::FunctorId;
use crate::term::TermId;
use crate::trail::Trail;
use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet};

#[cfg(feature = "tracing")]
use crate::trace::trace;

/// Constraint id. Ids are never reused within a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cid(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub u32);

/// A fired propagation: the rule and its participant ids in slot order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct History {
    pub rule: RuleId,
    pub ids: SmallVec<[Cid; 4]>,
}

impl History {
    pub fn new(rule: RuleId, ids: &[Cid]) -> Self {
        Self {
            rule,
            ids: SmallVec::from_slice(ids),
        }
    }

    fn mentions(&self, cid: Cid) -> bool {
        self.ids.contains(&cid)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ChrStore {
    live: BTreeMap<Cid, TermId>,
    by_functor: HashMap<FunctorId, BTreeSet<Cid>>,
    history: HashSet<History>,
    next_cid: u32,
    /// Set while a partner search (and its guard) is in progress.
    pub(crate) locked: bool,
    /// `chr_resume`/`chr_revise` goals postponed while locked.
    pub(crate) deferred: Vec<TermId>,
}

impl ChrStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, term: TermId, functor: Option<FunctorId>) -> Cid {
        let cid = Cid(self.next_cid);
        self.next_cid += 1;
        self.reinstate(cid, term, functor);
        cid
    }

    pub(crate) fn reinstate(&mut self, cid: Cid, term: TermId, functor: Option<FunctorId>) {
        self.live.insert(cid, term);
        if let Some(f) = functor {
            self.by_functor.entry(f).or_default().insert(cid);
        }
    }

    pub(crate) fn remove(&mut self, cid: Cid, functor: Option<FunctorId>) {
        self.live.remove(&cid);
        if let Some(ids) = functor.and_then(|f| self.by_functor.get_mut(&f)) {
            ids.remove(&cid);
        }
    }

    pub fn constraint(&self, cid: Cid) -> Option<TermId> {
        self.live.get(&cid).copied()
    }

    pub fn live(&self) -> Vec<(Cid, TermId)> {
        self.live.iter().map(|(c, t)| (*c, *t)).collect()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Live ids carrying `functor`, most recently added first.
    pub fn candidates(&self, functor: FunctorId) -> Vec<Cid> {
        self.by_functor
            .get(&functor)
            .map(|ids| ids.iter().rev().copied().collect())
            .unwrap_or_default()
    }

    pub(crate) fn record_history(&mut self, entry: History) -> bool {
        self.history.insert(entry)
    }

    pub(crate) fn forget_history(&mut self, entry: &History) {
        self.history.remove(entry);
    }

    /// Remove and return every history entry `cid` participates in.
    pub(crate) fn forget_history_of(&mut self, cid: Cid) -> Vec<History> {
        let stale: Vec<History> = self
            .history
            .iter()
            .filter(|h| h.mentions(cid))
            .cloned()
            .collect();
        for entry in &stale {
            self.history.remove(entry);
        }
        stale
    }

    pub fn has_fired(&self, entry: &History) -> bool {
        self.history.contains(entry)
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

/// A CHR rule: `keep` pattern slots survive a firing, the rest are killed.
#[derive(Clone, Debug)]
pub struct ChrRule {
    pub name: String,
    pub pattern: SmallVec<[TermId; 4]>,
    pub keep: usize,
    pub guard: TermId,
    pub body: TermId,
}

impl ChrRule {
    /// Pure propagation: every slot is kept, so only the history prevents
    /// the rule from firing forever.
    pub fn is_propagation(&self) -> bool {
        self.keep == self.pattern.len()
    }

    pub fn kills(&self, slot: usize) -> bool {
        slot >= self.keep
    }
}

/// One place a constraint functor appears in a rule head.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Occurrence {
    pub rule: RuleId,
    pub slot: usize,
}

#[derive(Debug)]
struct Level {
    slot: usize,
    candidates: Vec<Cid>,
    next: usize,
    mark: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchState {
    Fresh,
    Running,
    Done,
}

/// Resumable exhaustive search for partners of an active constraint.
///
/// The active constraint fills the pivot slot; every other slot is assigned
/// a distinct live constraint whose term the slot template matches under a
/// shared memo. Each call to [`PartnerSearch::next`] yields the next complete
/// assignment, so a guard that fails on one assignment lets the caller resume
/// the search where it stopped.
#[derive(Debug)]
pub struct PartnerSearch {
    pattern: SmallVec<[TermId; 4]>,
    pivot: usize,
    active: Cid,
    assigned: SmallVec<[Option<Cid>; 4]>,
    levels: Vec<Level>,
    memo: Subst,
    state: SearchState,
}

impl PartnerSearch {
    pub fn new(rule: &ChrRule, pivot: usize, active: Cid) -> Self {
        Self {
            pattern: rule.pattern.clone(),
            pivot,
            active,
            assigned: SmallVec::from_elem(None, rule.pattern.len()),
            levels: Vec::new(),
            memo: Subst::new(),
            state: SearchState::Fresh,
        }
    }

    pub fn active(&self) -> Cid {
        self.active
    }

    /// Bindings of the rule's template variables for the last assignment.
    pub fn memo(&self) -> &Subst {
        &self.memo
    }

    fn next_slot(&self, after: Option<usize>) -> Option<usize> {
        let start = after.map_or(0, |s| s + 1);
        (start..self.pattern.len()).find(|&s| s != self.pivot)
    }

    fn push_level(&mut self, slot: usize, trail: &Trail) {
        let candidates = trail
            .terms
            .functor(self.pattern[slot])
            .map(|f| trail.chr_candidates(f))
            .unwrap_or_default();
        self.levels.push(Level {
            slot,
            candidates,
            next: 0,
            mark: self.memo.len(),
        });
    }

    fn assignment(&self) -> Vec<Cid> {
        self.assigned.iter().flatten().copied().collect()
    }

    /// Next complete assignment in slot order, or `None` when exhausted.
    pub fn next(&mut self, trail: &Trail) -> Option<Vec<Cid>> {
        match self.state {
            SearchState::Done => return None,
            SearchState::Fresh => {
                self.state = SearchState::Running;
                let term = match trail.chr_constraint(self.active) {
                    Some(t) => t,
                    None => {
                        self.state = SearchState::Done;
                        return None;
                    }
                };
                if !match_term(self.pattern[self.pivot], term, &mut self.memo, trail) {
                    self.state = SearchState::Done;
                    return None;
                }
                self.assigned[self.pivot] = Some(self.active);
                match self.next_slot(None) {
                    Some(slot) => self.push_level(slot, trail),
                    None => return Some(self.assignment()),
                }
            }
            SearchState::Running => {}
        }

        loop {
            let Some(level) = self.levels.last_mut() else {
                self.state = SearchState::Done;
                return None;
            };
            let slot = level.slot;
            self.assigned[slot] = None;
            self.memo.unwind(level.mark);

            let mut found = None;
            while level.next < level.candidates.len() {
                let cid = level.candidates[level.next];
                level.next += 1;
                if self.assigned.contains(&Some(cid)) {
                    continue;
                }
                let Some(term) = trail.chr_constraint(cid) else {
                    continue;
                };
                if match_term(self.pattern[slot], term, &mut self.memo, trail) {
                    found = Some(cid);
                    break;
                }
            }

            match found {
                Some(cid) => {
                    self.assigned[slot] = Some(cid);
                    match self.next_slot(Some(slot)) {
                        Some(next) => self.push_level(next, trail),
                        None => {
                            #[cfg(feature = "tracing")]
                            trace!(active = self.active.0, "partners_found");
                            return Some(self.assignment());
                        }
                    }
                }
                None => {
                    self.levels.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
