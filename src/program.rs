//! Program loading.
//!
//! A program arrives as a proper list of clause terms:
//! - `<-(Head, Body)`: an ordinary clause
//! - `constraint_rule(Name, KeepList, DropList, Guard, Body)`: a CHR rule
//!
//! Loading groups clauses by head functor (declaration order preserved) and
//! builds, for every constraint functor, the ordered list of rule occurrences
//! its arrival must check. Later-declared rules come first; within one rule
//! occurrences follow slot order.

use crate::chr::{ChrRule, Occurrence, RuleId};
use crate::symbol::FunctorId;
use crate::term::{Term, TermId};
use crate::trail::Trail;
use hashbrown::HashMap;
use smallvec::SmallVec;

#[cfg(feature = "tracing")]
use crate::trace::debug;

/// Reasons a term list is not a loadable program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadError {
    NotAList,
    BadClause(String),
    BadHead(String),
    BadRule(String),
    ConstraintClash(String),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::NotAList => write!(f, "program is not a proper list of clauses"),
            LoadError::BadClause(t) => write!(f, "not a clause or constraint rule: {}", t),
            LoadError::BadHead(t) => write!(f, "invalid clause head: {}", t),
            LoadError::BadRule(t) => write!(f, "malformed constraint rule: {}", t),
            LoadError::ConstraintClash(t) => {
                write!(f, "{} is both a constraint and a predicate", t)
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// An immutable loaded program.
#[derive(Debug, Default)]
pub struct Program {
    clauses: HashMap<FunctorId, Vec<TermId>>,
    rules: Vec<ChrRule>,
    occurrences: HashMap<FunctorId, Vec<Occurrence>>,
}

impl Program {
    /// Build a program from a term-encoded clause list.
    ///
    /// Clause and rule terms are kept as templates; they are never bound, only
    /// copied per invocation.
    pub fn load(code: TermId, trail: &Trail) -> Result<Program, LoadError> {
        let items = trail.list_items(code).ok_or(LoadError::NotAList)?;
        let atoms = trail.atoms;
        let mut program = Program::default();

        for item in items {
            let item = trail.deref(item);
            let (f, args) = match trail.terms.get(item) {
                Term::App(f, args) => (*f, args.clone()),
                _ => return Err(LoadError::BadClause(trail.stringify(item))),
            };
            if f == atoms.clause {
                let head = trail.deref(args[0]);
                let hf = trail
                    .terms
                    .functor(head)
                    .ok_or_else(|| LoadError::BadHead(trail.stringify(head)))?;
                if atoms.is_builtin(hf) {
                    return Err(LoadError::BadHead(trail.stringify(head)));
                }
                program.clauses.entry(hf).or_default().push(item);
            } else if f == atoms.constraint_rule {
                let rule = load_rule(&args, trail)?;
                program.rules.push(rule);
            } else {
                return Err(LoadError::BadClause(trail.stringify(item)));
            }
        }

        for (index, rule) in program.rules.iter().enumerate().rev() {
            for (slot, &pat) in rule.pattern.iter().enumerate() {
                let f = trail.terms.functor(trail.deref(pat)).ok_or_else(|| {
                    LoadError::BadRule(format!("{}: {}", rule.name, trail.stringify(pat)))
                })?;
                if atoms.is_builtin(f) {
                    return Err(LoadError::BadRule(format!(
                        "{}: built-in {} used as a constraint",
                        rule.name,
                        trail.stringify(pat)
                    )));
                }
                if program.clauses.contains_key(&f) {
                    return Err(LoadError::ConstraintClash(format!(
                        "{}/{}",
                        trail.symbols.name(f),
                        trail.symbols.arity(f)
                    )));
                }
                program
                    .occurrences
                    .entry(f)
                    .or_default()
                    .push(Occurrence {
                        rule: RuleId(index as u32),
                        slot,
                    });
            }
        }

        #[cfg(feature = "tracing")]
        debug!(
            predicates = program.clauses.len(),
            rules = program.rules.len(),
            constraints = program.occurrences.len(),
            "program_loaded"
        );
        Ok(program)
    }

    /// Clause templates (`<-(Head, Body)` terms) for a predicate.
    pub fn clauses(&self, f: FunctorId) -> Option<&[TermId]> {
        self.clauses.get(&f).map(|c| c.as_slice())
    }

    pub fn defines(&self, f: FunctorId) -> bool {
        self.clauses.contains_key(&f)
    }

    pub fn is_constraint(&self, f: FunctorId) -> bool {
        self.occurrences.contains_key(&f)
    }

    /// Occurrences to check, in order, when a constraint with this functor
    /// is activated.
    pub fn occurrences(&self, f: FunctorId) -> &[Occurrence] {
        self.occurrences
            .get(&f)
            .map(|o| o.as_slice())
            .unwrap_or(&[])
    }

    pub fn rule(&self, id: RuleId) -> &ChrRule {
        &self.rules[id.0 as usize]
    }

    pub fn rules(&self) -> &[ChrRule] {
        &self.rules
    }
}

fn load_rule(args: &[TermId], trail: &Trail) -> Result<ChrRule, LoadError> {
    let name_term = trail.deref(args[0]);
    let name = match trail.terms.get(name_term) {
        Term::App(f, kids) if kids.is_empty() => trail.symbols.name(*f).to_string(),
        _ => return Err(LoadError::BadRule(trail.stringify(name_term))),
    };
    let keep = trail
        .list_items(args[1])
        .ok_or_else(|| LoadError::BadRule(format!("{}: keep list is not a list", name)))?;
    let drop = trail
        .list_items(args[2])
        .ok_or_else(|| LoadError::BadRule(format!("{}: drop list is not a list", name)))?;
    if keep.is_empty() && drop.is_empty() {
        return Err(LoadError::BadRule(format!("{}: rule has no heads", name)));
    }
    let mut pattern: SmallVec<[TermId; 4]> = SmallVec::new();
    pattern.extend(keep.iter().map(|&t| trail.deref(t)));
    pattern.extend(drop.iter().map(|&t| trail.deref(t)));
    Ok(ChrRule {
        name,
        pattern,
        keep: keep.len(),
        guard: args[3],
        body: args[4],
    })
}

#[cfg(test)]
#[path = "tests/program.rs"]
mod tests;
