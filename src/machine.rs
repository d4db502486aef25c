//! The resolution engine.
//!
//! Pending work lives in an explicit stack of search frames. Each frame has a
//! continuation (a persistent list of goals ending in `True` or `False`) and
//! its own choice-point stack. The bottom frame is the top-level query;
//! `cond/2` and CHR guard evaluation push nested frames that share only the
//! trail with their parent. Nothing in here recurses on the host stack per
//! goal, so nesting depth is bounded by [`MachineConfig::max_depth`].

use crate::arith;
use crate::chr::{Cid, History, PartnerSearch};
use crate::program::{LoadError, Program};
use crate::subst::{instantiate, variant, Subst};
use crate::symbol::FunctorId;
use crate::term::{Term, TermId};
use crate::trail::{Mark, Trail};
use crate::unify::{is_ground, occurs, same, unify};
use num_bigint::BigInt;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::io::Write;
use std::rc::Rc;

#[cfg(feature = "tracing")]
use crate::trace::{debug, trace};

/// Errors that abort interpretation. Logical failure is not an error.
#[derive(Debug)]
pub enum EngineError {
    UnknownPredicate(String),
    NotCallable(String),
    Load(LoadError),
    DepthExceeded(usize),
    Io(std::io::Error),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::UnknownPredicate(g) => write!(f, "unknown predicate: {}", g),
            EngineError::NotCallable(g) => write!(f, "goal is not callable: {}", g),
            EngineError::Load(e) => write!(f, "load error: {}", e),
            EngineError::DepthExceeded(d) => write!(f, "sub-search nesting exceeded {}", d),
            EngineError::Io(e) => write!(f, "output error: {}", e),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Load(e) => Some(e),
            EngineError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io(e)
    }
}

impl From<LoadError> for EngineError {
    fn from(e: LoadError) -> Self {
        EngineError::Load(e)
    }
}

/// What the solution callback wants next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Commit to this solution; discard remaining alternatives.
    Stop,
    /// Backtrack into remaining alternatives for more solutions.
    Continue,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every alternative was explored.
    Exhausted,
    /// The callback returned [`Control::Stop`].
    Stopped,
    /// A ground `exit/1` ran with this status.
    Exit(BigInt),
}

#[derive(Debug, Clone)]
pub struct MachineConfig {
    /// Maximum number of nested `cond`/guard frames.
    pub max_depth: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self { max_depth: 10_000 }
    }
}

#[derive(Debug, Clone, Copy)]
enum Goal {
    /// Dispatch a goal term.
    Call(TermId),
    /// Resolve `goal` against clause `index` of predicate `pred`.
    Clauses {
        goal: TermId,
        pred: FunctorId,
        index: usize,
    },
}

#[derive(Debug)]
enum Cont {
    True,
    False,
    Then(Goal, Rc<Cont>),
}

#[derive(Debug)]
struct Choice {
    mark: Mark,
    conj: Rc<Cont>,
}

/// State of one rule-firing attempt for an active constraint.
#[derive(Debug)]
struct Firing {
    cid: Cid,
    functor: FunctorId,
    offset: usize,
    search: PartnerSearch,
    env: Subst,
    assignment: Vec<Cid>,
    /// Trail length before the current guard attempt.
    mark: Mark,
}

#[derive(Debug)]
enum FrameKind {
    Top,
    Cond { mark: Mark, then: TermId },
    Guard(Box<Firing>),
}

#[derive(Debug)]
struct Frame {
    conj: Rc<Cont>,
    choices: Vec<Choice>,
    kind: FrameKind,
}

impl Frame {
    fn new(goal: TermId, kind: FrameKind) -> Self {
        Self {
            conj: Rc::new(Cont::Then(Goal::Call(goal), Rc::new(Cont::True))),
            choices: Vec::new(),
            kind,
        }
    }

    fn push(&mut self, goal: Goal) {
        self.conj = Rc::new(Cont::Then(goal, Rc::clone(&self.conj)));
    }
}

enum Step {
    Goal(Goal),
    Solved,
    Exhausted,
}

/// Non-local exits out of goal dispatch.
enum Interrupt {
    Exit(BigInt),
    Error(EngineError),
}

impl From<EngineError> for Interrupt {
    fn from(e: EngineError) -> Self {
        Interrupt::Error(e)
    }
}

impl From<std::io::Error> for Interrupt {
    fn from(e: std::io::Error) -> Self {
        Interrupt::Error(EngineError::Io(e))
    }
}

type Dispatch = Result<(), Interrupt>;

/// Drives goal reduction for one program over one trail.
pub struct Machine<'a> {
    program: &'a Program,
    trail: &'a mut Trail,
    out: &'a mut dyn Write,
    config: MachineConfig,
    frames: Vec<Frame>,
}

impl<'a> Machine<'a> {
    pub fn new(program: &'a Program, trail: &'a mut Trail, out: &'a mut dyn Write) -> Self {
        Self::with_config(program, trail, out, MachineConfig::default())
    }

    pub fn with_config(
        program: &'a Program,
        trail: &'a mut Trail,
        out: &'a mut dyn Write,
        config: MachineConfig,
    ) -> Self {
        Self {
            program,
            trail,
            out,
            config,
            frames: Vec::new(),
        }
    }

    pub fn trail(&self) -> &Trail {
        &*self.trail
    }

    /// Current sub-search nesting (0 at top level).
    pub fn depth(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    /// Solve `goal`, calling `on_solution` once per solution.
    pub fn solve<F>(&mut self, goal: TermId, mut on_solution: F) -> Result<Outcome, EngineError>
    where
        F: FnMut(&Trail) -> Control,
    {
        let hook = self.trail.atoms.attr_unify_hook;
        self.trail.set_attr_hook(self.program.defines(hook));
        self.trail.clear_wakeups();
        self.frames.clear();
        self.frames.push(Frame::new(goal, FrameKind::Top));

        let result = self.run(&mut on_solution);

        self.frames.clear();
        self.trail.chr.locked = false;
        self.trail.chr.deferred.clear();
        self.out.flush()?;
        match result {
            Ok(outcome) => Ok(outcome),
            Err(Interrupt::Exit(code)) => {
                #[cfg(feature = "tracing")]
                debug!(%code, "exit");
                Ok(Outcome::Exit(code))
            }
            Err(Interrupt::Error(e)) => Err(e),
        }
    }

    fn run(&mut self, on_solution: &mut dyn FnMut(&Trail) -> Control) -> Result<Outcome, Interrupt> {
        loop {
            match self.extract() {
                Step::Goal(goal) => self.dispatch(goal)?,
                Step::Solved => {
                    if let Some(outcome) = self.frame_solved(on_solution)? {
                        return Ok(outcome);
                    }
                }
                Step::Exhausted => {
                    if self.frame_exhausted()? {
                        return Ok(Outcome::Exhausted);
                    }
                }
            }
        }
    }

    /// Next goal of the active frame, backtracking into its choice points
    /// when the continuation has failed.
    fn extract(&mut self) -> Step {
        let Some(frame) = self.frames.last_mut() else {
            return Step::Exhausted;
        };
        loop {
            let next = match &*frame.conj {
                Cont::Then(goal, rest) => Some((*goal, Rc::clone(rest))),
                Cont::True => return Step::Solved,
                Cont::False => None,
            };
            match next {
                Some((goal, rest)) => {
                    frame.conj = rest;
                    return Step::Goal(goal);
                }
                None => match frame.choices.pop() {
                    Some(choice) => {
                        #[cfg(feature = "tracing")]
                        trace!(mark = choice.mark, "choicepoint_resumed");
                        self.trail.undo(choice.mark);
                        frame.conj = choice.conj;
                    }
                    None => return Step::Exhausted,
                },
            }
        }
    }

    fn frame_solved(
        &mut self,
        on_solution: &mut dyn FnMut(&Trail) -> Control,
    ) -> Result<Option<Outcome>, Interrupt> {
        let Some(frame) = self.frames.last_mut() else {
            return Ok(Some(Outcome::Exhausted));
        };
        match frame.kind {
            FrameKind::Top => match on_solution(&*self.trail) {
                Control::Stop => {
                    frame.choices.clear();
                    Ok(Some(Outcome::Stopped))
                }
                Control::Continue => {
                    self.fail();
                    Ok(None)
                }
            },
            FrameKind::Cond { then, .. } => {
                self.frames.pop();
                #[cfg(feature = "tracing")]
                trace!(depth = self.depth(), "cond_committed");
                self.push(Goal::Call(then));
                Ok(None)
            }
            FrameKind::Guard(_) => {
                self.guard_succeeded()?;
                Ok(None)
            }
        }
    }

    /// Returns true when the top-level query has no more solutions.
    fn frame_exhausted(&mut self) -> Result<bool, Interrupt> {
        let Some(frame) = self.frames.last_mut() else {
            return Ok(true);
        };
        match &frame.kind {
            FrameKind::Top => Ok(true),
            FrameKind::Cond { mark, .. } => {
                let mark = *mark;
                self.frames.pop();
                self.trail.undo(mark);
                #[cfg(feature = "tracing")]
                trace!(depth = self.depth(), "cond_failed");
                self.fail();
                Ok(false)
            }
            FrameKind::Guard(firing) => {
                let mark = firing.mark;
                self.trail.undo(mark);
                self.trail.clear_wakeups();
                self.advance_firing()?;
                Ok(false)
            }
        }
    }

    // ---------- continuation primitives ----------

    fn push(&mut self, goal: Goal) {
        if let Some(frame) = self.frames.last_mut() {
            frame.push(goal);
        }
    }

    /// Push a choice point whose alternative runs `goal` before the current
    /// continuation.
    fn choicepoint(&mut self, goal: Goal) {
        let mark = self.trail.note();
        if let Some(frame) = self.frames.last_mut() {
            let conj = Rc::new(Cont::Then(goal, Rc::clone(&frame.conj)));
            frame.choices.push(Choice { mark, conj });
        }
    }

    /// Force the active continuation to failure.
    fn fail(&mut self) {
        self.trail.clear_wakeups();
        if let Some(frame) = self.frames.last_mut() {
            frame.conj = Rc::new(Cont::False);
        }
    }

    /// Schedule goals woken by bindings to run next, in wake order.
    fn flush_wakeups(&mut self) {
        let woken = self.trail.take_wakeups();
        for goal in woken.into_iter().rev() {
            self.push(Goal::Call(goal));
        }
    }

    fn unify_or_fail(&mut self, a: TermId, b: TermId) {
        if unify(a, b, self.trail) {
            self.flush_wakeups();
        } else {
            self.fail();
        }
    }

    fn push_frame(&mut self, frame: Frame) -> Dispatch {
        if self.frames.len() > self.config.max_depth {
            return Err(EngineError::DepthExceeded(self.config.max_depth).into());
        }
        self.frames.push(frame);
        Ok(())
    }

    // ---------- dispatch ----------

    fn dispatch(&mut self, goal: Goal) -> Dispatch {
        match goal {
            Goal::Call(term) => self.call(term),
            Goal::Clauses { goal, pred, index } => {
                self.try_clause(goal, pred, index);
                Ok(())
            }
        }
    }

    fn call(&mut self, term: TermId) -> Dispatch {
        let term = self.trail.deref(term);
        let (f, args) = match self.trail.terms.get(term) {
            Term::App(f, args) => (*f, args.clone()),
            _ => return Err(EngineError::NotCallable(self.trail.stringify(term)).into()),
        };
        let atoms = self.trail.atoms;

        if f == atoms.true_ {
        } else if f == atoms.false_ {
            self.fail();
        } else if f == atoms.and {
            self.push(Goal::Call(args[1]));
            self.push(Goal::Call(args[0]));
        } else if f == atoms.or {
            self.choicepoint(Goal::Call(args[1]));
            self.push(Goal::Call(args[0]));
        } else if f == atoms.same {
            if !same(args[0], args[1], self.trail) {
                self.fail();
            }
        } else if f == atoms.unify {
            self.unify_or_fail(args[0], args[1]);
        } else if f == atoms.cond {
            let mark = self.trail.note();
            let frame = Frame::new(
                args[0],
                FrameKind::Cond {
                    mark,
                    then: args[1],
                },
            );
            self.push_frame(frame)?;
        } else if f == atoms.write || f == atoms.exit {
            self.side_effect(term, f, args[0])?;
        } else if f == atoms.freeze {
            match self.trail.unbound_var(args[0]) {
                Some(v) => self.trail.freeze(v, args[1]),
                None => self.push(Goal::Call(args[1])),
            }
        } else if f == atoms.get_atts {
            self.get_atts(args[0], args[1]);
        } else if f == atoms.put_atts {
            let ok = match self.trail.unbound_var(args[0]) {
                Some(v) => self.trail.put_att(v, args[1]),
                None => false,
            };
            if !ok {
                self.fail();
            }
        } else if f == atoms.list_atts {
            match self.trail.unbound_var(args[0]) {
                Some(v) => {
                    let atts = self.trail.atts(v);
                    let list = self.trail.list(&atts);
                    self.unify_or_fail(args[1], list);
                }
                None => self.fail(),
            }
        } else if f == atoms.hard_bind {
            self.hard_bind(args[0], args[1]);
        } else if f == atoms.chr_resume {
            match (self.small_int(args[0]), self.small_int(args[1])) {
                (Some(cid), Some(offset)) => self.resume(Cid(cid), offset as usize)?,
                _ => self.fail(),
            }
        } else if f == atoms.chr_revise {
            match self.small_int(args[0]) {
                Some(cid) => self.revise(Cid(cid))?,
                None => self.fail(),
            }
        } else if f == atoms.chr_printout {
            for (cid, c) in self.trail.chr_live() {
                writeln!(self.out, "chr{}: {}", cid.0, self.trail.stringify(c))?;
            }
        } else if f == atoms.is {
            match arith::eval(args[1], self.trail) {
                Some(n) => {
                    let value = self.trail.terms.int(n);
                    self.unify_or_fail(args[0], value);
                }
                None => self.fail(),
            }
        } else if f == atoms.lt || f == atoms.gt || f == atoms.le || f == atoms.ge {
            let holds = match arith::compare(args[0], args[1], self.trail) {
                Some(Ordering::Less) => f == atoms.lt || f == atoms.le,
                Some(Ordering::Equal) => f == atoms.le || f == atoms.ge,
                Some(Ordering::Greater) => f == atoms.gt || f == atoms.ge,
                None => false,
            };
            if !holds {
                self.fail();
            }
        } else if self.program.is_constraint(f) {
            self.add_constraint(term)?;
        } else if self.program.defines(f) {
            self.push(Goal::Clauses {
                goal: term,
                pred: f,
                index: 0,
            });
        } else {
            return Err(EngineError::UnknownPredicate(self.trail.stringify(term)).into());
        }
        Ok(())
    }

    /// Try clause `index`; later clauses become a choice point first.
    fn try_clause(&mut self, goal: TermId, pred: FunctorId, index: usize) {
        let program = self.program;
        let Some(clauses) = program.clauses(pred) else {
            self.fail();
            return;
        };
        let Some(&clause) = clauses.get(index) else {
            self.fail();
            return;
        };
        if index + 1 < clauses.len() {
            self.choicepoint(Goal::Clauses {
                goal,
                pred,
                index: index + 1,
            });
        }
        #[cfg(feature = "tracing")]
        trace!(pred = pred.raw(), index, "clause_tried");
        let renamed = variant(clause, self.trail);
        let (head, body) = match self.trail.terms.get(renamed) {
            Term::App(_, parts) => (parts[0], parts[1]),
            _ => {
                self.fail();
                return;
            }
        };
        if unify(goal, head, self.trail) {
            self.push(Goal::Call(body));
            self.flush_wakeups();
        } else {
            self.fail();
        }
    }

    fn small_int(&self, term: TermId) -> Option<u32> {
        match self.trail.terms.get(self.trail.deref(term)) {
            Term::Int(n) => u32::try_from(n).ok(),
            _ => None,
        }
    }

    fn get_atts(&mut self, var: TermId, att: TermId) {
        let Some(v) = self.trail.unbound_var(var) else {
            self.fail();
            return;
        };
        let stored = self
            .trail
            .terms
            .functor(self.trail.deref(att))
            .and_then(|key| self.trail.get_att(v, key));
        match stored {
            Some(stored) => self.unify_or_fail(att, stored),
            None => self.fail(),
        }
    }

    fn hard_bind(&mut self, var: TermId, value: TermId) {
        match self.trail.unbound_var(var) {
            Some(v) => {
                let value = self.trail.deref(value);
                if self.trail.terms.is_var(value) == Some(v) {
                    return;
                }
                if occurs(v, value, self.trail) {
                    self.fail();
                    return;
                }
                self.trail.hard_bind(v, value);
                self.flush_wakeups();
            }
            None => self.unify_or_fail(var, value),
        }
    }

    /// `write/1` and `exit/1`: run now when ground, otherwise suspend as a
    /// constraint until the argument is bound.
    fn side_effect(&mut self, goal: TermId, f: FunctorId, arg: TermId) -> Dispatch {
        if is_ground(arg, self.trail) {
            return self.perform(f, arg);
        }
        if self.trail.chr_locked() {
            self.fail();
            return Ok(());
        }
        let cid = self.trail.chr_add_constraint(goal);
        self.freeze_revision(cid, goal);
        #[cfg(feature = "tracing")]
        debug!(cid = cid.0, "side_effect_suspended");
        Ok(())
    }

    fn perform(&mut self, f: FunctorId, arg: TermId) -> Dispatch {
        if f == self.trail.atoms.write {
            writeln!(self.out, "{}", self.trail.stringify(arg))?;
            return Ok(());
        }
        match self.trail.terms.get(self.trail.deref(arg)) {
            Term::Int(code) => Err(Interrupt::Exit(code.clone())),
            _ => {
                self.fail();
                Ok(())
            }
        }
    }

    // ---------- CHR ----------

    fn freeze_revision(&mut self, cid: Cid, term: TermId) {
        let id = self.trail.int(i64::from(cid.0));
        let revise = self.trail.terms.app1(self.trail.atoms.chr_revise, id);
        self.trail.deep_freeze(term, revise);
    }

    fn add_constraint(&mut self, term: TermId) -> Dispatch {
        let cid = self.trail.chr_add_constraint(term);
        self.freeze_revision(cid, term);
        #[cfg(feature = "tracing")]
        debug!(cid = cid.0, constraint = %self.trail.stringify(term), "constraint_told");
        self.resume(cid, 0)
    }

    /// Re-check a constraint after one of its variables was bound.
    fn revise(&mut self, cid: Cid) -> Dispatch {
        let Some(term) = self.trail.chr_constraint(cid) else {
            return Ok(());
        };
        let term = self.trail.deref(term);
        let atoms = self.trail.atoms;
        let (f, args) = match self.trail.terms.get(term) {
            Term::App(f, args) => (*f, args.clone()),
            _ => return Ok(()),
        };
        #[cfg(feature = "tracing")]
        trace!(cid = cid.0, "constraint_revised");
        if f == atoms.write || f == atoms.exit {
            if is_ground(args[0], self.trail) {
                if self.trail.chr_locked() {
                    let id = self.trail.int(i64::from(cid.0));
                    let revise = self.trail.terms.app1(atoms.chr_revise, id);
                    self.trail.chr_defer(revise);
                    return Ok(());
                }
                self.trail.chr_kill(cid);
                return self.perform(f, args[0]);
            }
            self.freeze_revision(cid, term);
            return Ok(());
        }
        self.freeze_revision(cid, term);
        self.resume(cid, 0)
    }

    /// Start resolution of `cid` at occurrence `offset`, or defer it while
    /// the store is locked.
    fn resume(&mut self, cid: Cid, offset: usize) -> Dispatch {
        if !self.trail.chr_alive(cid) {
            return Ok(());
        }
        if self.trail.chr_locked() {
            let id = self.trail.int(i64::from(cid.0));
            let at = self.trail.int(offset as i64);
            let resume = self.trail.terms.app2(self.trail.atoms.chr_resume, id, at);
            self.trail.chr_defer(resume);
            return Ok(());
        }
        let Some(functor) = self
            .trail
            .chr_constraint(cid)
            .and_then(|t| self.trail.terms.functor(self.trail.deref(t)))
        else {
            return Ok(());
        };
        let occurrences = self.program.occurrences(functor);
        let Some(occ) = occurrences.get(offset) else {
            return Ok(());
        };
        let rule = self.program.rule(occ.rule);
        let firing = Firing {
            cid,
            functor,
            offset,
            search: PartnerSearch::new(rule, occ.slot, cid),
            env: Subst::new(),
            assignment: Vec::new(),
            mark: self.trail.note(),
        };
        let frame = Frame {
            conj: Rc::new(Cont::False),
            choices: Vec::new(),
            kind: FrameKind::Guard(Box::new(firing)),
        };
        self.push_frame(frame)?;
        self.trail.chr.locked = true;
        self.advance_firing()
    }

    /// Find the next partner assignment for the active firing and start its
    /// guard, moving on to later occurrences when one is exhausted.
    fn advance_firing(&mut self) -> Dispatch {
        let program = self.program;
        loop {
            let Some(Frame {
                conj,
                choices,
                kind: FrameKind::Guard(firing),
            }) = self.frames.last_mut()
            else {
                return Ok(());
            };
            let occurrences = program.occurrences(firing.functor);
            let occ = occurrences[firing.offset];
            if let Some(assignment) = firing.search.next(&*self.trail) {
                let rule = program.rule(occ.rule);
                let mut env = firing.search.memo().clone();
                let guard = instantiate(rule.guard, &mut env, self.trail);
                firing.env = env;
                firing.assignment = assignment;
                firing.mark = self.trail.note();
                *conj = Rc::new(Cont::Then(Goal::Call(guard), Rc::new(Cont::True)));
                choices.clear();
                return Ok(());
            }
            firing.offset += 1;
            match occurrences.get(firing.offset) {
                Some(next) => {
                    firing.search = PartnerSearch::new(program.rule(next.rule), next.slot, firing.cid);
                }
                None => {
                    self.finish_firing(&[]);
                    return Ok(());
                }
            }
        }
    }

    /// The guard of the current firing attempt succeeded: commit the rule
    /// unless this propagation already fired for the same participants.
    fn guard_succeeded(&mut self) -> Dispatch {
        let program = self.program;
        let Some(Frame {
            kind: FrameKind::Guard(firing),
            ..
        }) = self.frames.last_mut()
        else {
            return Ok(());
        };
        let occurrences = program.occurrences(firing.functor);
        let occ = occurrences[firing.offset];
        let rule = program.rule(occ.rule);
        let entry = History::new(occ.rule, &firing.assignment);

        if rule.is_propagation() && self.trail.chr_fired(&entry) {
            #[cfg(feature = "tracing")]
            trace!(rule = %rule.name, "firing_redundant");
            self.trail.undo(firing.mark);
            self.trail.clear_wakeups();
            return self.advance_firing();
        }

        #[cfg(feature = "tracing")]
        debug!(rule = %rule.name, ids = ?firing.assignment, "rule_fired");
        for (slot, &cid) in firing.assignment.iter().enumerate() {
            if rule.kills(slot) {
                self.trail.chr_kill(cid);
            }
        }
        if rule.is_propagation() {
            self.trail.chr_step_history(entry);
        }
        let body = instantiate(rule.body, &mut firing.env, self.trail);
        let mut goals: SmallVec<[TermId; 2]> = SmallVec::new();
        goals.push(body);
        if !rule.kills(occ.slot) && firing.offset + 1 < occurrences.len() {
            let id = self.trail.int(i64::from(firing.cid.0));
            let next = self.trail.int(firing.offset as i64 + 1);
            let resume = self.trail.terms.app2(self.trail.atoms.chr_resume, id, next);
            goals.push(resume);
        }
        self.finish_firing(&goals);
        Ok(())
    }

    /// Pop the guard frame, unlock the store and schedule `goals` followed by
    /// the goals postponed while it was locked.
    fn finish_firing(&mut self, goals: &[TermId]) {
        self.frames.pop();
        self.trail.chr.locked = false;
        let mut scheduled: Vec<TermId> = goals.to_vec();
        scheduled.extend(self.trail.chr_take_deferred());
        for goal in scheduled.into_iter().rev() {
            self.push(Goal::Call(goal));
        }
    }
}

/// Run `goal` to its first solution.
pub fn run_first(
    program: &Program,
    trail: &mut Trail,
    goal: TermId,
    out: &mut dyn Write,
) -> Result<Outcome, EngineError> {
    Machine::new(program, trail, out).solve(goal, |_| Control::Stop)
}

#[cfg(test)]
#[path = "tests/machine.rs"]
mod tests;
