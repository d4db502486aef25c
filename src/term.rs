use crate::symbol::{FunctorId, SymbolStore};
use hashbrown::HashMap;
use num_bigint::BigInt;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;

/// Unique identifier for a term in the term store.
/// TermIds are stable and can be compared for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(u32);

impl TermId {
    /// Get the raw u32 value (for debugging/display).
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Serial number of a variable binding cell.
///
/// Serials are handed out by the trail from a single monotonic counter and
/// double as the index of the variable's cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub u32);

/// A term is a variable, an arbitrary-precision integer, or a functor applied
/// to exactly `arity` arguments (atoms are 0-arity applications).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Var(VarId),
    Int(BigInt),
    App(FunctorId, SmallVec<[TermId; 4]>),
}

/// Hash-consed term arena.
///
/// Guarantees:
/// - Structurally equal terms get the same TermId
/// - TermId can be resolved back to the term
/// - Terms are never mutated; binding lives in the trail's variable cells
pub struct TermStore {
    nodes: Vec<Term>,
    hashcons: HashMap<Term, TermId, FxBuildHasher>,
}

impl TermStore {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            hashcons: HashMap::default(),
        }
    }

    fn intern(&mut self, term: Term) -> TermId {
        if let Some(&id) = self.hashcons.get(&term) {
            return id;
        }
        let id = TermId(self.nodes.len() as u32);
        self.nodes.push(term.clone());
        self.hashcons.insert(term, id);
        id
    }

    /// Create a variable term for an allocated cell.
    pub fn var(&mut self, var: VarId) -> TermId {
        self.intern(Term::Var(var))
    }

    pub fn int(&mut self, value: impl Into<BigInt>) -> TermId {
        self.intern(Term::Int(value.into()))
    }

    /// Create an application term.
    ///
    /// The caller is responsible for `children.len()` matching the functor's
    /// arity; see [`TermStore::app_checked`] for the validating variant.
    pub fn app(&mut self, func: FunctorId, children: SmallVec<[TermId; 4]>) -> TermId {
        self.intern(Term::App(func, children))
    }

    /// Create an application term, rejecting an argument count that does
    /// not match the functor's arity.
    pub fn app_checked(
        &mut self,
        func: FunctorId,
        children: SmallVec<[TermId; 4]>,
        symbols: &SymbolStore,
    ) -> Option<TermId> {
        if symbols.arity(func) != children.len() {
            return None;
        }
        Some(self.app(func, children))
    }

    /// Create a nullary (0-arity) application.
    pub fn app0(&mut self, func: FunctorId) -> TermId {
        self.app(func, SmallVec::new())
    }

    pub fn app1(&mut self, func: FunctorId, child: TermId) -> TermId {
        self.app(func, smallvec::smallvec![child])
    }

    pub fn app2(&mut self, func: FunctorId, left: TermId, right: TermId) -> TermId {
        self.app(func, smallvec::smallvec![left, right])
    }

    /// Resolve a TermId to its term.
    pub fn get(&self, id: TermId) -> &Term {
        &self.nodes[id.0 as usize]
    }

    /// Check if a term is a variable node (without following bindings).
    pub fn is_var(&self, id: TermId) -> Option<VarId> {
        match self.get(id) {
            Term::Var(v) => Some(*v),
            _ => None,
        }
    }

    /// Functor of an application node.
    pub fn functor(&self, id: TermId) -> Option<FunctorId> {
        match self.get(id) {
            Term::App(f, _) => Some(*f),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for TermStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a term in canonical `name(arg1, ..., argn)` form.
///
/// `deref` follows variable bindings; unbound variables print as `_<serial>`.
pub fn format_term(
    term: TermId,
    terms: &TermStore,
    symbols: &SymbolStore,
    deref: &dyn Fn(TermId) -> TermId,
) -> String {
    fn render(
        term: TermId,
        terms: &TermStore,
        symbols: &SymbolStore,
        deref: &dyn Fn(TermId) -> TermId,
        out: &mut String,
    ) {
        match terms.get(deref(term)) {
            Term::Var(v) => {
                out.push('_');
                out.push_str(&v.0.to_string());
            }
            Term::Int(n) => out.push_str(&n.to_string()),
            Term::App(f, children) => {
                out.push_str(symbols.name(*f));
                if !children.is_empty() {
                    out.push('(');
                    for (i, child) in children.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        render(*child, terms, symbols, deref, out);
                    }
                    out.push(')');
                }
            }
        }
    }

    let mut out = String::new();
    render(term, terms, symbols, deref, &mut out);
    out
}
