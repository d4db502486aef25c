use hashbrown::HashMap;
use lasso::{Rodeo, Spur};

/// Interned name of a functor, without its arity.
pub type NameId = Spur;

/// A unique identifier for a `(name, arity)` functor symbol.
///
/// Interning guarantees that two functors are equal iff their ids are equal,
/// so `FunctorId` is used directly as a map key throughout the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctorId(u32);

impl FunctorId {
    /// Get the raw u32 value (for debugging/display).
    pub fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
struct FunctorEntry {
    name: NameId,
    arity: usize,
}

/// Symbol store for interning functor names and `(name, arity)` pairs.
///
/// Guarantees:
/// - Same `(name, arity)` always produces the same FunctorId
/// - `foo/1` and `foo/2` are different functors sharing one interned name
/// - FunctorId can be resolved back to its name and arity
pub struct SymbolStore {
    rodeo: Rodeo,
    functors: Vec<FunctorEntry>,
    lookup: HashMap<(NameId, usize), FunctorId>,
}

impl SymbolStore {
    /// Create a new empty symbol store.
    pub fn new() -> Self {
        Self {
            rodeo: Rodeo::new(),
            functors: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    /// Intern a functor, returning its unique FunctorId.
    pub fn intern(&mut self, name: &str, arity: usize) -> FunctorId {
        let name = self.rodeo.get_or_intern(name);
        if let Some(&id) = self.lookup.get(&(name, arity)) {
            return id;
        }
        let id = FunctorId(self.functors.len() as u32);
        self.functors.push(FunctorEntry { name, arity });
        self.lookup.insert((name, arity), id);
        id
    }

    /// Get the FunctorId for a functor if it exists, without interning.
    pub fn get(&self, name: &str, arity: usize) -> Option<FunctorId> {
        let name = self.rodeo.get(name)?;
        self.lookup.get(&(name, arity)).copied()
    }

    /// Resolve a FunctorId back to its name.
    pub fn name(&self, id: FunctorId) -> &str {
        let entry = &self.functors[id.0 as usize];
        self.rodeo.resolve(&entry.name)
    }

    pub fn arity(&self, id: FunctorId) -> usize {
        self.functors[id.0 as usize].arity
    }

    /// Number of distinct functors interned so far.
    pub fn len(&self) -> usize {
        self.functors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functors.is_empty()
    }
}

impl Default for SymbolStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Functors the engine dispatches on, interned once per symbol store.
#[derive(Debug, Clone, Copy)]
pub struct Atoms {
    pub true_: FunctorId,
    pub false_: FunctorId,
    pub and: FunctorId,
    pub or: FunctorId,
    pub nil: FunctorId,
    pub cons: FunctorId,
    pub clause: FunctorId,
    pub constraint_rule: FunctorId,
    pub same: FunctorId,
    pub unify: FunctorId,
    pub cond: FunctorId,
    pub write: FunctorId,
    pub exit: FunctorId,
    pub freeze: FunctorId,
    pub get_atts: FunctorId,
    pub put_atts: FunctorId,
    pub list_atts: FunctorId,
    pub hard_bind: FunctorId,
    pub attr_unify_hook: FunctorId,
    pub chr_resume: FunctorId,
    pub chr_revise: FunctorId,
    pub chr_printout: FunctorId,
    pub is: FunctorId,
    pub lt: FunctorId,
    pub gt: FunctorId,
    pub le: FunctorId,
    pub ge: FunctorId,
    pub add: FunctorId,
    pub sub: FunctorId,
    pub mul: FunctorId,
    pub neg: FunctorId,
}

impl Atoms {
    pub fn new(symbols: &mut SymbolStore) -> Self {
        Self {
            true_: symbols.intern("true", 0),
            false_: symbols.intern("false", 0),
            and: symbols.intern(",", 2),
            or: symbols.intern(";", 2),
            nil: symbols.intern("nil", 0),
            cons: symbols.intern(".", 2),
            clause: symbols.intern("<-", 2),
            constraint_rule: symbols.intern("constraint_rule", 5),
            same: symbols.intern("same", 2),
            unify: symbols.intern("=", 2),
            cond: symbols.intern("cond", 2),
            write: symbols.intern("write", 1),
            exit: symbols.intern("exit", 1),
            freeze: symbols.intern("freeze", 2),
            get_atts: symbols.intern("get_atts", 2),
            put_atts: symbols.intern("put_atts", 2),
            list_atts: symbols.intern("list_atts", 2),
            hard_bind: symbols.intern("hard_bind", 2),
            attr_unify_hook: symbols.intern("attr_unify_hook", 2),
            chr_resume: symbols.intern("chr_resume", 2),
            chr_revise: symbols.intern("chr_revise", 1),
            chr_printout: symbols.intern("chr_printout", 0),
            is: symbols.intern("is", 2),
            lt: symbols.intern("<", 2),
            gt: symbols.intern(">", 2),
            le: symbols.intern("=<", 2),
            ge: symbols.intern(">=", 2),
            add: symbols.intern("+", 2),
            sub: symbols.intern("-", 2),
            mul: symbols.intern("*", 2),
            neg: symbols.intern("-", 1),
        }
    }

    /// True if goals with this functor are handled by the machine itself
    /// rather than by program clauses.
    pub fn is_builtin(&self, f: FunctorId) -> bool {
        [
            self.true_,
            self.false_,
            self.and,
            self.or,
            self.same,
            self.unify,
            self.cond,
            self.write,
            self.exit,
            self.freeze,
            self.get_atts,
            self.put_atts,
            self.list_atts,
            self.hard_bind,
            self.chr_resume,
            self.chr_revise,
            self.chr_printout,
            self.is,
            self.lt,
            self.gt,
            self.le,
            self.ge,
        ]
        .contains(&f)
    }
}

#[cfg(test)]
#[path = "tests/symbol.rs"]
mod tests;
