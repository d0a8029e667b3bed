//! Knuth-Bendix simplification ordering over interned terms and literals.
//!
//! Well-founded and substitution-monotonic; total on ground terms, partial
//! otherwise. Computed from per-symbol weights and a total symbol
//! precedence. All generating inferences and rewrite orientation consult
//! this ordering.

use super::env::Env;
use super::literal::LiteralId;
use super::symbols::FunctionId;
use super::term::{Term, TermId};
use std::collections::HashMap;

/// Result of comparing two terms or literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermOrder {
    Greater,
    Less,
    Equal,
    Incomparable,
}

impl TermOrder {
    pub fn reverse(self) -> TermOrder {
        match self {
            TermOrder::Greater => TermOrder::Less,
            TermOrder::Less => TermOrder::Greater,
            other => other,
        }
    }
}

/// Configuration for the Knuth-Bendix ordering.
///
/// Symbols without an entry get weight 1 and a precedence derived from
/// `(arity, id)`, which keeps the precedence total without explicit setup.
#[derive(Debug, Clone)]
pub struct KboConfig {
    pub symbol_weights: HashMap<FunctionId, u32>,
    pub precedence: HashMap<FunctionId, u32>,
    /// Weight of variables; must be positive.
    pub variable_weight: u32,
}

impl Default for KboConfig {
    fn default() -> Self {
        KboConfig {
            symbol_weights: HashMap::new(),
            precedence: HashMap::new(),
            variable_weight: 1,
        }
    }
}

/// Knuth-Bendix ordering.
pub struct Kbo {
    config: KboConfig,
}

impl Kbo {
    pub fn new(config: KboConfig) -> Self {
        Kbo { config }
    }

    fn symbol_weight(&self, id: FunctionId) -> u32 {
        self.config.symbol_weights.get(&id).copied().unwrap_or(1)
    }

    /// Weight of a term. With the default unit weights this is the cached
    /// store weight; custom weights recompute recursively.
    pub fn term_weight(&self, env: &Env, term: TermId) -> u32 {
        if self.config.symbol_weights.is_empty() && self.config.variable_weight == 1 {
            return env.terms.weight(term);
        }
        match env.terms.term(term) {
            Term::Var(_) => self.config.variable_weight,
            Term::App(f, args) => {
                let args = args.clone();
                self.symbol_weight(*f)
                    + args.iter().map(|&a| self.term_weight(env, a)).sum::<u32>()
            }
        }
    }

    /// Total precedence on function symbols: explicit entry, then arity,
    /// then interning order as a stable tiebreaker.
    fn precedence_key(&self, env: &Env, id: FunctionId) -> (u32, u8, u32) {
        let explicit = self.config.precedence.get(&id).copied().unwrap_or(0);
        (explicit, env.symbols.function_arity(id), id.as_u32())
    }

    fn count_variables(&self, env: &Env, term: TermId, counts: &mut HashMap<u32, i64>, delta: i64) {
        for sub in env.terms.subterms(term) {
            if let Term::Var(v) = env.terms.term(sub) {
                *counts.entry(*v).or_insert(0) += delta;
            }
        }
    }

    /// Compare two terms.
    pub fn compare(&self, env: &Env, s: TermId, t: TermId) -> TermOrder {
        // Hash-consing: id equality is structural equality.
        if s == t {
            return TermOrder::Equal;
        }

        // Variable occurrence balance: s can only dominate t if every
        // variable occurs at least as often in s as in t, and vice versa.
        let mut counts = HashMap::new();
        self.count_variables(env, s, &mut counts, 1);
        self.count_variables(env, t, &mut counts, -1);
        let s_covers_t = counts.values().all(|&c| c >= 0);
        let t_covers_s = counts.values().all(|&c| c <= 0);

        let ws = self.term_weight(env, s);
        let wt = self.term_weight(env, t);

        if ws > wt {
            return if s_covers_t {
                TermOrder::Greater
            } else {
                TermOrder::Incomparable
            };
        }
        if wt > ws {
            return if t_covers_s {
                TermOrder::Less
            } else {
                TermOrder::Incomparable
            };
        }

        // Equal weight: break ties lexicographically, respecting the
        // variable conditions.
        match self.compare_lex(env, s, t) {
            TermOrder::Greater if s_covers_t => TermOrder::Greater,
            TermOrder::Less if t_covers_s => TermOrder::Less,
            TermOrder::Equal => TermOrder::Equal,
            _ => TermOrder::Incomparable,
        }
    }

    /// Lexicographic comparison for terms of equal weight.
    fn compare_lex(&self, env: &Env, s: TermId, t: TermId) -> TermOrder {
        match (env.terms.term(s), env.terms.term(t)) {
            (Term::Var(_), Term::Var(_)) => TermOrder::Incomparable,
            // f(...f(x)...) > x when weights are equal only for unary chains;
            // a variable is never lex-greater than a compound.
            (Term::Var(_), Term::App(_, _)) => TermOrder::Less,
            (Term::App(_, _), Term::Var(_)) => TermOrder::Greater,
            (Term::App(f, args_s), Term::App(g, args_t)) => {
                if f != g {
                    let pf = self.precedence_key(env, *f);
                    let pg = self.precedence_key(env, *g);
                    return if pf > pg {
                        TermOrder::Greater
                    } else {
                        TermOrder::Less
                    };
                }
                let args_s = args_s.clone();
                let args_t = args_t.clone();
                for (&a, &b) in args_s.iter().zip(args_t.iter()) {
                    match self.compare(env, a, b) {
                        TermOrder::Equal => continue,
                        other => return other,
                    }
                }
                TermOrder::Equal
            }
        }
    }

    /// Is `s` strictly greater than `t`?
    pub fn greater(&self, env: &Env, s: TermId, t: TermId) -> bool {
        self.compare(env, s, t) == TermOrder::Greater
    }

    /// Compare two literals.
    ///
    /// Equality literals are compared as multisets of their sides;
    /// non-equality literals by weight, predicate precedence, argument
    /// comparison, and finally polarity (negative above positive on the
    /// same atom).
    pub fn compare_literals(&self, env: &Env, l1: LiteralId, l2: LiteralId) -> TermOrder {
        if l1 == l2 {
            return TermOrder::Equal;
        }
        let a = env.literal(l1).clone();
        let b = env.literal(l2).clone();

        // Equality literals rank below all others of comparable weight in
        // the standard superposition literal ordering; here we order
        // equality against non-equality by weight and predicate precedence
        // like any other pair.
        if a.is_equality() && b.is_equality() {
            let ms = self.compare_multisets(env, &a.args, &b.args);
            if ms != TermOrder::Equal {
                return ms;
            }
            return self.compare_polarity(a.polarity, b.polarity);
        }

        // The variable condition lifts from terms to atoms: one literal
        // can only dominate another if it covers its variable occurrences.
        let mut counts = HashMap::new();
        for &t in &a.args {
            self.count_variables(env, t, &mut counts, 1);
        }
        for &t in &b.args {
            self.count_variables(env, t, &mut counts, -1);
        }
        let a_covers_b = counts.values().all(|&c| c >= 0);
        let b_covers_a = counts.values().all(|&c| c <= 0);

        let wa = env.literal_weight(l1);
        let wb = env.literal_weight(l2);
        if wa > wb {
            return if a_covers_b {
                TermOrder::Greater
            } else {
                TermOrder::Incomparable
            };
        }
        if wb > wa {
            return if b_covers_a {
                TermOrder::Less
            } else {
                TermOrder::Incomparable
            };
        }

        let lex = if a.predicate != b.predicate {
            let pa = (env.symbols.predicate_arity(a.predicate), a.predicate.as_u32());
            let pb = (env.symbols.predicate_arity(b.predicate), b.predicate.as_u32());
            if pa > pb {
                TermOrder::Greater
            } else {
                TermOrder::Less
            }
        } else {
            let mut result = self.compare_polarity(a.polarity, b.polarity);
            for (&s, &t) in a.args.iter().zip(b.args.iter()) {
                match self.compare(env, s, t) {
                    TermOrder::Equal => continue,
                    other => {
                        result = other;
                        break;
                    }
                }
            }
            result
        };

        match lex {
            TermOrder::Greater if a_covers_b => TermOrder::Greater,
            TermOrder::Less if b_covers_a => TermOrder::Less,
            TermOrder::Equal => TermOrder::Equal,
            _ => TermOrder::Incomparable,
        }
    }

    fn compare_polarity(&self, p1: bool, p2: bool) -> TermOrder {
        match (p1, p2) {
            (true, false) => TermOrder::Less,
            (false, true) => TermOrder::Greater,
            _ => TermOrder::Equal,
        }
    }

    /// Multiset extension of the term ordering for two-element multisets
    /// (the sides of equality literals).
    fn compare_multisets(&self, env: &Env, a: &[TermId], b: &[TermId]) -> TermOrder {
        debug_assert_eq!(a.len(), 2);
        debug_assert_eq!(b.len(), 2);

        // Remove common elements.
        let mut rest_a: Vec<TermId> = a.to_vec();
        let mut rest_b: Vec<TermId> = b.to_vec();
        let mut i = 0;
        while i < rest_a.len() {
            if let Some(j) = rest_b.iter().position(|&t| t == rest_a[i]) {
                rest_a.remove(i);
                rest_b.remove(j);
            } else {
                i += 1;
            }
        }

        if rest_a.is_empty() && rest_b.is_empty() {
            return TermOrder::Equal;
        }

        let a_dominates = rest_b.iter().all(|&t| {
            rest_a
                .iter()
                .any(|&s| self.compare(env, s, t) == TermOrder::Greater)
        });
        let b_dominates = rest_a.iter().all(|&s| {
            rest_b
                .iter()
                .any(|&t| self.compare(env, t, s) == TermOrder::Greater)
        });

        match (a_dominates, b_dominates) {
            (true, false) => TermOrder::Greater,
            (false, true) => TermOrder::Less,
            _ => TermOrder::Incomparable,
        }
    }
}
