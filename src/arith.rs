use crate::term::{Term, TermId};
use crate::trail::Trail;
use num_bigint::BigInt;
use std::cmp::Ordering;

/// Evaluate an integer expression built from `+`/2, `-`/2, `*`/2, `-`/1
/// and integers. Returns `None` for unbound variables or any other functor.
pub fn eval(term: TermId, trail: &Trail) -> Option<BigInt> {
    let term = trail.deref(term);
    match trail.terms.get(term) {
        Term::Int(n) => Some(n.clone()),
        Term::Var(_) => None,
        Term::App(f, kids) => {
            let atoms = &trail.atoms;
            if *f == atoms.neg {
                return Some(-eval(kids[0], trail)?);
            }
            if kids.len() != 2 {
                return None;
            }
            let a = eval(kids[0], trail)?;
            let b = eval(kids[1], trail)?;
            if *f == atoms.add {
                Some(a + b)
            } else if *f == atoms.sub {
                Some(a - b)
            } else if *f == atoms.mul {
                Some(a * b)
            } else {
                None
            }
        }
    }
}

/// Compare two evaluated expressions.
pub fn compare(a: TermId, b: TermId, trail: &Trail) -> Option<Ordering> {
    Some(eval(a, trail)?.cmp(&eval(b, trail)?))
}

#[cfg(test)]
#[path = "tests/arith.rs"]
mod tests;
