//! First-order logic representation: symbols, hash-consed terms and
//! literals, clauses, the simplification ordering, and unification.

pub mod clause;
pub mod env;
pub mod literal;
pub mod ordering;
pub mod substitution;
pub mod symbols;
pub mod term;
pub mod unification;

#[cfg(test)]
mod proptest_tests;

pub use clause::{Clause, ClauseArena, ClauseDisplay, ClauseId, Inference, InferenceRule, StoreTag};
pub use env::Env;
pub use literal::{Literal, LiteralId, LiteralStore};
pub use ordering::{Kbo, KboConfig, TermOrder};
pub use substitution::Substitution;
pub use symbols::{Color, FunctionId, PredicateId, SortId, SymbolTable};
pub use term::{Term, TermId, TermStore};
pub use unification::{match_literals, match_term, unify, unify_literals};
