//! The trail: variable binding cells plus the undo log every mutation goes
//! through.
//!
//! Bindings, attribute writes, frozen-goal chains and constraint-store changes
//! are all recorded as [`Action`]s. [`Trail::note`] captures the current log
//! length and [`Trail::undo`] pops and inverts actions back to it, restoring
//! the exact prior state of every structure the log touches.

use crate::chr::{ChrStore, Cid, History};
use crate::symbol::{Atoms, FunctorId, SymbolStore};
use crate::term::{format_term, Term, TermId, TermStore, VarId};
use smallvec::SmallVec;

#[cfg(feature = "tracing")]
use crate::trace::trace;

/// A saved trail length.
pub type Mark = usize;

/// Mutable state of one logic variable.
#[derive(Debug, Clone, Default)]
pub struct VarCell {
    /// `None` while unbound; otherwise the term this variable was bound to.
    instance: Option<TermId>,
    /// Attribute terms keyed by their functor, in insertion order.
    atts: SmallVec<[(FunctorId, TermId); 2]>,
    /// Goal to run when this variable becomes bound.
    frozen: Option<TermId>,
}

/// One reversible mutation.
#[derive(Debug, Clone)]
pub enum Action {
    Bind(VarId),
    Attribute {
        var: VarId,
        key: FunctorId,
        prev: Option<TermId>,
    },
    Freeze {
        var: VarId,
        prev: Option<TermId>,
    },
    AddConstraint(Cid),
    Kill {
        cid: Cid,
        term: TermId,
        history: Vec<History>,
    },
    Fired(History),
    Defer,
}

/// Execution context shared by every search frame: terms, variables, the
/// undo log and the constraint store.
pub struct Trail {
    pub symbols: SymbolStore,
    pub terms: TermStore,
    pub atoms: Atoms,
    cells: Vec<VarCell>,
    actions: Vec<Action>,
    pub(crate) chr: ChrStore,
    /// Goals scheduled by bindings, waiting to be prepended to the
    /// continuation of the active frame.
    wakeups: Vec<TermId>,
    attr_hook: bool,
}

impl Trail {
    pub fn new() -> Self {
        let mut symbols = SymbolStore::new();
        let atoms = Atoms::new(&mut symbols);
        Self {
            symbols,
            terms: TermStore::new(),
            atoms,
            cells: Vec::new(),
            actions: Vec::new(),
            chr: ChrStore::new(),
            wakeups: Vec::new(),
            attr_hook: false,
        }
    }

    // ---------- terms ----------

    /// Allocate a fresh unbound variable and return its term.
    pub fn new_var(&mut self) -> TermId {
        let id = VarId(self.cells.len() as u32);
        self.cells.push(VarCell::default());
        self.terms.var(id)
    }

    /// Number of variables allocated so far (the next serial number).
    pub fn var_count(&self) -> usize {
        self.cells.len()
    }

    pub fn atom(&mut self, name: &str) -> TermId {
        let f = self.symbols.intern(name, 0);
        self.terms.app0(f)
    }

    /// Build `name(args...)`, interning the functor with the right arity.
    pub fn compound(&mut self, name: &str, args: &[TermId]) -> TermId {
        let f = self.symbols.intern(name, args.len());
        self.terms.app(f, SmallVec::from_slice(args))
    }

    pub fn int(&mut self, value: i64) -> TermId {
        self.terms.int(value)
    }

    /// Build a proper list from `items` using `.`/2 and `nil`.
    pub fn list(&mut self, items: &[TermId]) -> TermId {
        let mut out = self.terms.app0(self.atoms.nil);
        for &item in items.iter().rev() {
            out = self.terms.app2(self.atoms.cons, item, out);
        }
        out
    }

    /// Elements of a proper list, or `None` if `term` is not one.
    pub fn list_items(&self, term: TermId) -> Option<Vec<TermId>> {
        let mut items = Vec::new();
        let mut current = self.deref(term);
        loop {
            match self.terms.get(current) {
                Term::App(f, kids) if *f == self.atoms.cons => {
                    items.push(kids[0]);
                    current = self.deref(kids[1]);
                }
                Term::App(f, _) if *f == self.atoms.nil => return Some(items),
                _ => return None,
            }
        }
    }

    /// Conjunction of `goals`, `true` when empty.
    pub fn conjoin(&mut self, goals: &[TermId]) -> TermId {
        match goals.split_last() {
            None => self.terms.app0(self.atoms.true_),
            Some((&last, init)) => init
                .iter()
                .rev()
                .fold(last, |acc, &g| self.terms.app2(self.atoms.and, g, acc)),
        }
    }

    /// Follow variable bindings until reaching a non-variable or an unbound
    /// variable.
    pub fn deref(&self, term: TermId) -> TermId {
        let mut current = term;
        while let Term::Var(v) = self.terms.get(current) {
            match self.cells[v.0 as usize].instance {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    /// The unbound variable `term` dereferences to, if any.
    pub fn unbound_var(&self, term: TermId) -> Option<VarId> {
        self.terms.is_var(self.deref(term))
    }

    pub fn stringify(&self, term: TermId) -> String {
        format_term(term, &self.terms, &self.symbols, &|t| self.deref(t))
    }

    // ---------- bindings ----------

    /// Bind an unbound variable.
    ///
    /// An attributed variable is not bound here: reconciliation goals are
    /// scheduled instead, ending in a `hard_bind/2` that performs the raw
    /// binding once the attribute hook has run.
    pub fn bind(&mut self, var: VarId, term: TermId) {
        if self.cells[var.0 as usize].atts.is_empty() {
            self.hard_bind(var, term);
            return;
        }
        let v = self.terms.var(var);
        if self.attr_hook {
            let hook = self.terms.app2(self.atoms.attr_unify_hook, v, term);
            self.wakeups.push(hook);
        }
        let hard = self.terms.app2(self.atoms.hard_bind, v, term);
        self.wakeups.push(hard);
        #[cfg(feature = "tracing")]
        trace!(var = var.0, "attributed_bind_deferred");
    }

    /// Raw bind, bypassing attribute reconciliation. Wakes the variable's
    /// frozen goal, if any.
    pub fn hard_bind(&mut self, var: VarId, term: TermId) {
        let cell = &mut self.cells[var.0 as usize];
        debug_assert!(cell.instance.is_none(), "binding a bound variable");
        cell.instance = Some(term);
        if let Some(goal) = cell.frozen {
            self.wakeups.push(goal);
        }
        self.actions.push(Action::Bind(var));
    }

    pub fn has_attributes(&self, var: VarId) -> bool {
        !self.cells[var.0 as usize].atts.is_empty()
    }

    /// Whether binding attributed variables should call `attr_unify_hook/2`.
    pub fn set_attr_hook(&mut self, enabled: bool) {
        self.attr_hook = enabled;
    }

    /// Conjoin `goal` onto the variable's suspended-goal chain.
    pub fn freeze(&mut self, var: VarId, goal: TermId) {
        let prev = self.cells[var.0 as usize].frozen;
        let chained = match prev {
            Some(p) => self.terms.app2(self.atoms.and, p, goal),
            None => goal,
        };
        self.cells[var.0 as usize].frozen = Some(chained);
        self.actions.push(Action::Freeze { var, prev });
    }

    pub fn frozen_goal(&self, var: VarId) -> Option<TermId> {
        self.cells[var.0 as usize].frozen
    }

    /// Freeze `goal` on every free variable of `term` whose chain does not
    /// already hold it.
    pub fn deep_freeze(&mut self, term: TermId, goal: TermId) {
        for var in crate::unify::free_vars(self, term) {
            if !self.frozen_on(var, goal) {
                self.freeze(var, goal);
            }
        }
    }

    fn frozen_on(&self, var: VarId, goal: TermId) -> bool {
        let mut pending: SmallVec<[TermId; 8]> = self.frozen_goal(var).into_iter().collect();
        while let Some(t) = pending.pop() {
            if t == goal {
                return true;
            }
            if let Term::App(f, args) = self.terms.get(t) {
                if *f == self.atoms.and {
                    pending.extend(args.iter().copied());
                }
            }
        }
        false
    }

    /// Drain goals woken by bindings since the last call.
    pub fn take_wakeups(&mut self) -> Vec<TermId> {
        std::mem::take(&mut self.wakeups)
    }

    pub fn clear_wakeups(&mut self) {
        self.wakeups.clear();
    }

    pub fn wakeup_len(&self) -> usize {
        self.wakeups.len()
    }

    /// Forget goals woken after the first `len`.
    pub fn truncate_wakeups(&mut self, len: usize) {
        self.wakeups.truncate(len);
    }

    // ---------- attributes ----------

    /// Set the attribute keyed by `att`'s functor to `att`.
    pub fn put_att(&mut self, var: VarId, att: TermId) -> bool {
        let key = match self.terms.functor(self.deref(att)) {
            Some(f) => f,
            None => return false,
        };
        let att = self.deref(att);
        let cell = &mut self.cells[var.0 as usize];
        let prev = match cell.atts.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => Some(std::mem::replace(&mut slot.1, att)),
            None => {
                cell.atts.push((key, att));
                None
            }
        };
        self.actions.push(Action::Attribute { var, key, prev });
        true
    }

    pub fn get_att(&self, var: VarId, key: FunctorId) -> Option<TermId> {
        self.cells[var.0 as usize]
            .atts
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, t)| *t)
    }

    /// All attribute terms of a variable, in insertion order.
    pub fn atts(&self, var: VarId) -> Vec<TermId> {
        self.cells[var.0 as usize]
            .atts
            .iter()
            .map(|(_, t)| *t)
            .collect()
    }

    // ---------- constraint store ----------

    /// Insert a constraint into the live store under a fresh id.
    pub fn chr_add_constraint(&mut self, term: TermId) -> Cid {
        let term = self.deref(term);
        let functor = self.terms.functor(term);
        let cid = self.chr.insert(term, functor);
        self.actions.push(Action::AddConstraint(cid));
        #[cfg(feature = "tracing")]
        trace!(cid = cid.0, "constraint_added");
        cid
    }

    /// Remove a live constraint and every history entry that mentions it.
    pub fn chr_kill(&mut self, cid: Cid) -> bool {
        let term = match self.chr.constraint(cid) {
            Some(t) => t,
            None => return false,
        };
        let functor = self.terms.functor(term);
        self.chr.remove(cid, functor);
        let history = self.chr.forget_history_of(cid);
        self.actions.push(Action::Kill { cid, term, history });
        #[cfg(feature = "tracing")]
        trace!(cid = cid.0, "constraint_killed");
        true
    }

    /// Record that a propagation rule fired for this participant vector.
    pub fn chr_step_history(&mut self, entry: History) {
        if self.chr.record_history(entry.clone()) {
            self.actions.push(Action::Fired(entry));
        }
    }

    pub fn chr_alive(&self, cid: Cid) -> bool {
        self.chr.constraint(cid).is_some()
    }

    pub fn chr_constraint(&self, cid: Cid) -> Option<TermId> {
        self.chr.constraint(cid)
    }

    pub fn chr_fired(&self, entry: &History) -> bool {
        self.chr.has_fired(entry)
    }

    /// Live constraints in id order.
    pub fn chr_live(&self) -> Vec<(Cid, TermId)> {
        self.chr.live()
    }

    /// Live ids with the given functor, most recently added first.
    pub fn chr_candidates(&self, functor: FunctorId) -> Vec<Cid> {
        self.chr.candidates(functor)
    }

    pub fn chr_locked(&self) -> bool {
        self.chr.locked
    }

    /// Postpone `goal` until the store is unlocked. Undone like a binding.
    pub fn chr_defer(&mut self, goal: TermId) {
        self.chr.deferred.push(goal);
        self.actions.push(Action::Defer);
    }

    /// Take every postponed goal, oldest first.
    pub fn chr_take_deferred(&mut self) -> Vec<TermId> {
        std::mem::take(&mut self.chr.deferred)
    }

    // ---------- undo log ----------

    pub fn note(&self) -> Mark {
        self.actions.len()
    }

    /// Pop and invert actions until the log is back at `mark`.
    pub fn undo(&mut self, mark: Mark) {
        while self.actions.len() > mark {
            let Some(action) = self.actions.pop() else {
                break;
            };
            match action {
                Action::Bind(var) => {
                    self.cells[var.0 as usize].instance = None;
                }
                Action::Attribute { var, key, prev } => {
                    let atts = &mut self.cells[var.0 as usize].atts;
                    match prev {
                        Some(old) => {
                            if let Some(slot) = atts.iter_mut().find(|(k, _)| *k == key) {
                                slot.1 = old;
                            }
                        }
                        None => atts.retain(|(k, _)| *k != key),
                    }
                }
                Action::Freeze { var, prev } => {
                    self.cells[var.0 as usize].frozen = prev;
                }
                Action::AddConstraint(cid) => {
                    if let Some(term) = self.chr.constraint(cid) {
                        let functor = self.terms.functor(term);
                        self.chr.remove(cid, functor);
                    }
                }
                Action::Kill { cid, term, history } => {
                    let functor = self.terms.functor(term);
                    self.chr.reinstate(cid, term, functor);
                    for entry in history {
                        self.chr.record_history(entry);
                    }
                }
                Action::Fired(entry) => {
                    self.chr.forget_history(&entry);
                }
                Action::Defer => {
                    self.chr.deferred.pop();
                }
            }
        }
    }

    /// Length of the undo log.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Default for Trail {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/trail.rs"]
mod tests;
