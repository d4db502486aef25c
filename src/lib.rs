pub mod arith;
pub mod chr;
pub mod cli;
pub mod machine;
pub mod matching;
pub mod parser;
pub mod program;
pub mod subst;
pub mod symbol;
pub mod term;
pub mod trace;
pub mod trail;
pub mod unify;

#[cfg(test)]
pub(crate) mod test_utils;
