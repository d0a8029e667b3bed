//! Policy indexes over the active (and, for the Otter loop, passive)
//! clauses.
//!
//! Each rule owns one index whose membership follows a fixed policy; all
//! maintenance is driven by clause lifecycle events routed through
//! `Indexes`. An index stores back-references only; it never owns a
//! clause.

use super::trie::{flatten_literal, flatten_term, DiscriminationTree, QueryIter};
use crate::logic::{Clause, ClauseArena, ClauseId, Env, Kbo, LiteralId, TermId, TermOrder};
use std::collections::HashMap;

/// A `(term, literal, clause)` index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermEntry {
    pub term: TermId,
    pub literal: LiteralId,
    pub clause: ClauseId,
}

/// A `(literal, clause)` index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralEntry {
    pub literal: LiteralId,
    pub clause: ClauseId,
}

/// Trie of term entries.
#[derive(Debug, Default)]
pub struct TermIndex {
    tree: DiscriminationTree<TermEntry>,
}

impl TermIndex {
    fn handle(&mut self, env: &Env, entry: TermEntry, adding: bool) {
        let mut keys = Vec::new();
        flatten_term(env, entry.term, &mut keys);
        if adding {
            self.tree.insert(&keys, entry);
        } else {
            self.tree.remove(&keys, &entry);
        }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn unifiable(&self, env: &Env, query: TermId) -> QueryIter<'_, TermEntry> {
        let mut keys = Vec::new();
        flatten_term(env, query, &mut keys);
        self.tree.unifiable(keys)
    }

    pub fn generalizations(&self, env: &Env, query: TermId) -> QueryIter<'_, TermEntry> {
        let mut keys = Vec::new();
        flatten_term(env, query, &mut keys);
        self.tree.generalizations(keys)
    }

    pub fn instances(&self, env: &Env, query: TermId) -> QueryIter<'_, TermEntry> {
        let mut keys = Vec::new();
        flatten_term(env, query, &mut keys);
        self.tree.instances(keys)
    }
}

/// Trie of literal entries, plus the set of contributing clauses.
#[derive(Debug, Default)]
pub struct LiteralIndex {
    tree: DiscriminationTree<LiteralEntry>,
    /// Clause id -> number of its literals currently in the trie.
    clause_counts: HashMap<ClauseId, u32>,
}

impl LiteralIndex {
    fn handle(&mut self, env: &Env, entry: LiteralEntry, adding: bool) {
        let polarity = env.literal(entry.literal).polarity;
        let mut keys = Vec::new();
        flatten_literal(env, entry.literal, polarity, &mut keys);
        if adding {
            self.tree.insert(&keys, entry);
            *self.clause_counts.entry(entry.clause).or_insert(0) += 1;
        } else {
            self.tree.remove(&keys, &entry);
            if let Some(count) = self.clause_counts.get_mut(&entry.clause) {
                *count -= 1;
                if *count == 0 {
                    self.clause_counts.remove(&entry.clause);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Clauses that currently contribute at least one literal.
    pub fn clauses(&self) -> impl Iterator<Item = ClauseId> + '_ {
        self.clause_counts.keys().copied()
    }

    pub fn contains_clause(&self, id: ClauseId) -> bool {
        self.clause_counts.contains_key(&id)
    }

    /// Stored literals that could unify with the complement of `query`.
    pub fn unifiable_complements(
        &self,
        env: &Env,
        query: LiteralId,
    ) -> QueryIter<'_, LiteralEntry> {
        let polarity = env.literal(query).polarity;
        let mut keys = Vec::new();
        flatten_literal(env, query, !polarity, &mut keys);
        self.tree.unifiable(keys)
    }

    /// Stored literals that generalize `query` (same polarity).
    pub fn generalizations(&self, env: &Env, query: LiteralId) -> QueryIter<'_, LiteralEntry> {
        let polarity = env.literal(query).polarity;
        let mut keys = Vec::new();
        flatten_literal(env, query, polarity, &mut keys);
        self.tree.generalizations(keys)
    }

    /// Stored literals that are instances of `query` (same polarity).
    pub fn instances(&self, env: &Env, query: LiteralId) -> QueryIter<'_, LiteralEntry> {
        let polarity = env.literal(query).polarity;
        let mut keys = Vec::new();
        flatten_literal(env, query, polarity, &mut keys);
        self.tree.instances(keys)
    }
}

/// Sides of a positive equality that may rewrite left-to-right: the larger
/// side when oriented, both sides when the ordering cannot decide.
pub fn rewriting_sides(env: &Env, kbo: &Kbo, literal: LiteralId) -> Vec<TermId> {
    let lit = env.literal(literal);
    debug_assert!(lit.polarity && lit.is_equality());
    let (s, t) = (lit.args[0], lit.args[1]);
    match kbo.compare(env, s, t) {
        TermOrder::Greater => vec![s],
        TermOrder::Less => vec![t],
        TermOrder::Incomparable => vec![s, t],
        TermOrder::Equal => Vec::new(),
    }
}

/// Non-variable subterms available for rewriting in a literal: for an
/// equality, the subterms of its maximal side(s); for anything else, the
/// subterms of all arguments.
pub fn rewritable_subterms(env: &Env, kbo: &Kbo, literal: LiteralId) -> Vec<TermId> {
    let lit = env.literal(literal);
    let tops: Vec<TermId> = if lit.is_equality() {
        let (s, t) = (lit.args[0], lit.args[1]);
        match kbo.compare(env, s, t) {
            TermOrder::Greater => vec![s],
            TermOrder::Less => vec![t],
            _ => vec![s, t],
        }
    } else {
        lit.args.clone()
    };

    let mut seen = Vec::new();
    for top in tops {
        for sub in env.terms.subterms(top) {
            if !env.terms.is_var(sub) && !seen.contains(&sub) {
                seen.push(sub);
            }
        }
    }
    seen
}

// =============================================================================
// Policy indexes
// =============================================================================

/// Backward superposition targets: non-variable subterms of selected
/// literals.
#[derive(Debug, Default)]
pub struct SuperpositionSubtermIndex {
    pub index: TermIndex,
}

impl SuperpositionSubtermIndex {
    fn handle(&mut self, env: &Env, kbo: &Kbo, id: ClauseId, clause: &Clause, adding: bool) {
        for &lit in clause.selected_literals() {
            for term in rewritable_subterms(env, kbo, lit) {
                let entry = TermEntry {
                    term,
                    literal: lit,
                    clause: id,
                };
                self.index.handle(env, entry, adding);
            }
        }
    }
}

/// Forward superposition sources: maximal sides of selected positive
/// equalities.
#[derive(Debug, Default)]
pub struct SuperpositionLhsIndex {
    pub index: TermIndex,
}

impl SuperpositionLhsIndex {
    fn handle(&mut self, env: &Env, kbo: &Kbo, id: ClauseId, clause: &Clause, adding: bool) {
        for &lit in clause.selected_literals() {
            let l = env.literal(lit);
            if !l.polarity || !l.is_equality() {
                continue;
            }
            for term in rewriting_sides(env, kbo, lit) {
                let entry = TermEntry {
                    term,
                    literal: lit,
                    clause: id,
                };
                self.index.handle(env, entry, adding);
            }
        }
    }
}

/// Backward demodulation targets: all non-variable subterms of all
/// literals.
#[derive(Debug, Default)]
pub struct DemodulationSubtermIndex {
    pub index: TermIndex,
}

impl DemodulationSubtermIndex {
    fn handle(&mut self, env: &Env, id: ClauseId, clause: &Clause, adding: bool) {
        for &lit in &clause.literals {
            let args = env.literal(lit).args.clone();
            let mut seen = Vec::new();
            for arg in args {
                for sub in env.terms.subterms(arg) {
                    if !env.terms.is_var(sub) && !seen.contains(&sub) {
                        seen.push(sub);
                    }
                }
            }
            for term in seen {
                let entry = TermEntry {
                    term,
                    literal: lit,
                    clause: id,
                };
                self.index.handle(env, entry, adding);
            }
        }
    }
}

/// Forward demodulation sources: unit positive equalities only, keyed on
/// their maximal side(s).
#[derive(Debug, Default)]
pub struct DemodulationLhsIndex {
    pub index: TermIndex,
}

impl DemodulationLhsIndex {
    fn handle(&mut self, env: &Env, kbo: &Kbo, id: ClauseId, clause: &Clause, adding: bool) {
        if !clause.is_unit_equality(env) {
            return;
        }
        let lit = clause.literals[0];
        for term in rewriting_sides(env, kbo, lit) {
            let entry = TermEntry {
                term,
                literal: lit,
                clause: id,
            };
            self.index.handle(env, entry, adding);
        }
    }
}

/// Resolution partners: selected non-equality literals.
#[derive(Debug, Default)]
pub struct GeneratingLiteralIndex {
    pub index: LiteralIndex,
}

impl GeneratingLiteralIndex {
    fn handle(&mut self, env: &Env, id: ClauseId, clause: &Clause, adding: bool) {
        for &lit in clause.selected_literals() {
            if env.literal(lit).is_equality() {
                continue;
            }
            let entry = LiteralEntry {
                literal: lit,
                clause: id,
            };
            self.index.handle(env, entry, adding);
        }
    }
}

/// Cheap per-clause numbers used to prefilter subsumption candidates: a
/// subsumer can never have more literals, weight, or positives/negatives
/// than the clause it subsumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClauseFeatures {
    pub len: u32,
    pub weight: u32,
    pub positive: u32,
    pub negative: u32,
}

impl ClauseFeatures {
    pub fn of(env: &Env, clause: &Clause) -> Self {
        let positive = clause
            .literals
            .iter()
            .filter(|&&l| env.literal(l).polarity)
            .count() as u32;
        ClauseFeatures {
            len: clause.len() as u32,
            weight: clause.weight,
            positive,
            negative: clause.len() as u32 - positive,
        }
    }

    /// Componentwise `<=`: necessary for `self` to subsume `other`.
    pub fn can_subsume(&self, other: &ClauseFeatures) -> bool {
        self.len <= other.len
            && self.weight <= other.weight
            && self.positive <= other.positive
            && self.negative <= other.negative
    }
}

/// Subsumption candidates: all literals of all clauses, plus the feature
/// prefilter.
#[derive(Debug, Default)]
pub struct SubsumptionIndex {
    pub index: LiteralIndex,
    features: HashMap<ClauseId, ClauseFeatures>,
}

impl SubsumptionIndex {
    fn handle(&mut self, env: &Env, id: ClauseId, clause: &Clause, adding: bool) {
        for &lit in &clause.literals {
            let entry = LiteralEntry {
                literal: lit,
                clause: id,
            };
            self.index.handle(env, entry, adding);
        }
        if adding {
            self.features.insert(id, ClauseFeatures::of(env, clause));
        } else {
            self.features.remove(&id);
        }
    }

    pub fn features(&self, id: ClauseId) -> Option<&ClauseFeatures> {
        self.features.get(&id)
    }
}

// =============================================================================
// Aggregate
// =============================================================================

/// All policy indexes of a saturation run, maintained from the clause
/// lifecycle events fired by the containers.
///
/// The generating indexes follow Active membership; the simplifying
/// indexes follow the simplifying clause set, which is Active ∪ Passive
/// for the Otter and LRS loop variants and Active alone for Discount.
#[derive(Debug, Default)]
pub struct Indexes {
    pub superposition_subterm: SuperpositionSubtermIndex,
    pub superposition_lhs: SuperpositionLhsIndex,
    pub demodulation_subterm: DemodulationSubtermIndex,
    pub demodulation_lhs: DemodulationLhsIndex,
    pub generating_literals: GeneratingLiteralIndex,
    pub subsumption: SubsumptionIndex,
}

impl Indexes {
    pub fn new() -> Self {
        Indexes::default()
    }

    /// A clause entered Active: its selection is final, index its selected
    /// positions for generating inferences.
    pub fn on_activated(&mut self, env: &Env, kbo: &Kbo, arena: &ClauseArena, id: ClauseId) {
        let clause = arena.get(id);
        self.superposition_subterm.handle(env, kbo, id, clause, true);
        self.superposition_lhs.handle(env, kbo, id, clause, true);
        self.generating_literals.handle(env, id, clause, true);
    }

    /// A clause left Active.
    pub fn on_deactivated(&mut self, env: &Env, kbo: &Kbo, arena: &ClauseArena, id: ClauseId) {
        let clause = arena.get(id);
        self.superposition_subterm.handle(env, kbo, id, clause, false);
        self.superposition_lhs.handle(env, kbo, id, clause, false);
        self.generating_literals.handle(env, id, clause, false);
    }

    /// A clause entered the simplifying clause set.
    pub fn on_simplifying_added(&mut self, env: &Env, kbo: &Kbo, arena: &ClauseArena, id: ClauseId) {
        let clause = arena.get(id);
        self.demodulation_subterm.handle(env, id, clause, true);
        self.demodulation_lhs.handle(env, kbo, id, clause, true);
        self.subsumption.handle(env, id, clause, true);
    }

    /// A clause left the simplifying clause set.
    pub fn on_simplifying_removed(
        &mut self,
        env: &Env,
        kbo: &Kbo,
        arena: &ClauseArena,
        id: ClauseId,
    ) {
        let clause = arena.get(id);
        self.demodulation_subterm.handle(env, id, clause, false);
        self.demodulation_lhs.handle(env, kbo, id, clause, false);
        self.subsumption.handle(env, id, clause, false);
    }
}
