//! The shared environment threaded through the prover.
//!
//! `Env` bundles the symbol table with the term and literal stores. There
//! are no process-wide singletons: tests construct a fresh `Env` per case,
//! and everything that interns or resolves takes `&Env` or `&mut Env`.

use super::literal::{Literal, LiteralId, LiteralStore};
use super::substitution::Substitution;
use super::symbols::SymbolTable;
use super::term::{Term, TermId, TermStore};
use std::collections::HashMap;
use std::fmt;

/// Symbol table plus hash-consing stores. Lives for the whole run.
#[derive(Debug, Clone, Default)]
pub struct Env {
    pub symbols: SymbolTable,
    pub terms: TermStore,
    pub literals: LiteralStore,
}

impl Env {
    pub fn new() -> Self {
        Env {
            symbols: SymbolTable::new(),
            terms: TermStore::new(),
            literals: LiteralStore::new(),
        }
    }

    pub fn intern_literal(&mut self, literal: Literal) -> LiteralId {
        self.literals.intern(literal, &self.terms)
    }

    pub fn literal(&self, id: LiteralId) -> &Literal {
        self.literals.literal(id)
    }

    pub fn literal_weight(&self, id: LiteralId) -> u32 {
        self.literals.weight(id)
    }

    /// Apply a substitution to all arguments of a literal.
    pub fn apply_literal(&mut self, id: LiteralId, subst: &Substitution) -> LiteralId {
        let lit = self.literals.literal(id).clone();
        let args = lit
            .args
            .iter()
            .map(|&t| self.terms.apply(t, subst))
            .collect();
        self.intern_literal(Literal {
            predicate: lit.predicate,
            polarity: lit.polarity,
            args,
        })
    }

    /// Rename all variables of a literal by an offset.
    pub fn rename_literal(&mut self, id: LiteralId, offset: u32) -> LiteralId {
        if offset == 0 {
            return id;
        }
        let lit = self.literals.literal(id).clone();
        let args = lit
            .args
            .iter()
            .map(|&t| self.terms.rename(t, offset))
            .collect();
        self.intern_literal(Literal {
            predicate: lit.predicate,
            polarity: lit.polarity,
            args,
        })
    }

    /// Rename variables of a literal through an explicit map.
    pub fn rename_literal_with(&mut self, id: LiteralId, map: &HashMap<u32, u32>) -> LiteralId {
        let lit = self.literals.literal(id).clone();
        let args = lit
            .args
            .iter()
            .map(|&t| self.terms.rename_with(t, map))
            .collect();
        self.intern_literal(Literal {
            predicate: lit.predicate,
            polarity: lit.polarity,
            args,
        })
    }

    /// Largest variable index occurring in any of the given literals.
    pub fn max_variable_in(&self, literals: &[LiteralId]) -> Option<u32> {
        let mut max = None;
        for &lit in literals {
            for &arg in &self.literals.literal(lit).args {
                if let Some(v) = self.terms.max_variable(arg) {
                    max = Some(max.map_or(v, |m: u32| m.max(v)));
                }
            }
        }
        max
    }

    // === Display helpers ===

    pub fn display_term(&self, id: TermId) -> TermDisplay<'_> {
        TermDisplay { env: self, id }
    }

    pub fn display_literal(&self, id: LiteralId) -> LiteralDisplay<'_> {
        LiteralDisplay { env: self, id }
    }
}

/// Display wrapper resolving symbol names through the environment.
pub struct TermDisplay<'a> {
    env: &'a Env,
    id: TermId,
}

impl fmt::Display for TermDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.env.terms.term(self.id) {
            Term::Var(v) => write!(f, "X{}", v),
            Term::App(func, args) => {
                write!(f, "{}", self.env.symbols.function_name(*func))?;
                if !args.is_empty() {
                    write!(f, "(")?;
                    for (i, &arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ",")?;
                        }
                        write!(f, "{}", self.env.display_term(arg))?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
        }
    }
}

/// Display wrapper for literals.
pub struct LiteralDisplay<'a> {
    env: &'a Env,
    id: LiteralId,
}

impl fmt::Display for LiteralDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lit = self.env.literals.literal(self.id);
        if lit.is_equality() {
            let op = if lit.polarity { "=" } else { "!=" };
            write!(
                f,
                "{} {} {}",
                self.env.display_term(lit.args[0]),
                op,
                self.env.display_term(lit.args[1])
            )
        } else {
            if !lit.polarity {
                write!(f, "~")?;
            }
            write!(f, "{}", self.env.symbols.predicate_name(lit.predicate))?;
            if !lit.args.is_empty() {
                write!(f, "(")?;
                for (i, &arg) in lit.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", self.env.display_term(arg))?;
                }
                write!(f, ")")?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let mut env = Env::new();
        let p = env.symbols.intern_predicate("p", 2);
        let f = env.symbols.intern_function("f", 1);
        let a = env.symbols.intern_function("a", 0);

        let ta = env.terms.app(a, vec![]);
        let tx = env.terms.var(0);
        let fx = env.terms.app(f, vec![tx]);

        assert_eq!(env.display_term(fx).to_string(), "f(X0)");

        let lit = env.intern_literal(Literal::negative(p, vec![fx, ta]));
        assert_eq!(env.display_literal(lit).to_string(), "~p(f(X0),a)");

        let eq = env.intern_literal(Literal::equality(false, fx, ta));
        assert_eq!(env.display_literal(eq).to_string(), "f(X0) != a");
    }

    #[test]
    fn test_rename_literal() {
        let mut env = Env::new();
        let p = env.symbols.intern_predicate("p", 1);
        let tx = env.terms.var(0);
        let lit = env.intern_literal(Literal::positive(p, vec![tx]));

        let renamed = env.rename_literal(lit, 3);
        let tx3 = env.terms.var(3);
        let expected = env.intern_literal(Literal::positive(p, vec![tx3]));
        assert_eq!(renamed, expected);
    }
}
