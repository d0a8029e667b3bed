//! Subsumption, subsumption resolution, and their index-driven forward
//! and backward queries.
//!
//! A clause C subsumes D when some substitution σ maps the literals of C
//! injectively onto literals of D. The core check is a backtracking
//! matcher over the literal lists using the substitution trail; the
//! index layer narrows candidates with generalization/instance queries
//! and the clause feature prefilter first.

use crate::index::SubsumptionIndex;
use crate::logic::{match_literals, ClauseArena, ClauseId, Env, LiteralId, Substitution};

/// Backward subsumption discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackwardSubsumptionMode {
    Off,
    /// Only unit clauses subsume backward.
    Unit,
    #[default]
    On,
}

/// Does `c` subsume `d`? Multiset matching: each literal of `c` maps to a
/// distinct literal of `d` under one shared substitution.
pub fn subsumes(env: &Env, c: &[LiteralId], d: &[LiteralId]) -> bool {
    if c.len() > d.len() {
        return false;
    }
    let mut subst = Substitution::new();
    let mut used = vec![false; d.len()];
    subsumes_rec(env, c, d, 0, &mut used, &mut subst)
}

fn subsumes_rec(
    env: &Env,
    c: &[LiteralId],
    d: &[LiteralId],
    i: usize,
    used: &mut [bool],
    subst: &mut Substitution,
) -> bool {
    if i == c.len() {
        return true;
    }
    for j in 0..d.len() {
        if used[j] {
            continue;
        }
        let mark = subst.mark();
        if match_literals(env, c[i], d[j], subst) {
            used[j] = true;
            if subsumes_rec(env, c, d, i + 1, used, subst) {
                return true;
            }
            used[j] = false;
        }
        subst.backtrack(mark);
    }
    false
}

/// Find an indexed clause that subsumes `literals`. Candidates come from
/// generalization queries on each literal, filtered by the feature
/// prefilter before the full check runs.
pub fn forward_subsumption(
    env: &Env,
    arena: &ClauseArena,
    index: &SubsumptionIndex,
    literals: &[LiteralId],
    features: &crate::index::ClauseFeatures,
    exclude: ClauseId,
) -> Option<ClauseId> {
    let mut checked: Vec<ClauseId> = Vec::new();
    for &lit in literals {
        for entry in index.index.generalizations(env, lit) {
            if entry.clause == exclude || checked.contains(&entry.clause) {
                continue;
            }
            checked.push(entry.clause);

            let Some(cand_features) = index.features(entry.clause) else {
                continue;
            };
            if !cand_features.can_subsume(features) {
                continue;
            }
            let candidate = arena.get(entry.clause);
            if subsumes(env, &candidate.literals, literals) {
                return Some(entry.clause);
            }
        }
    }
    None
}

/// Forward subsumption resolution: find an indexed clause C = c0 ∨ C' and
/// a literal d of `literals` such that c0σ is the complement of d and C'σ
/// fits into the remaining literals. The resolved-away literal is removed.
/// Returns the shortened literal list and the side premise.
pub fn forward_subsumption_resolution(
    env: &mut Env,
    arena: &ClauseArena,
    index: &SubsumptionIndex,
    literals: &[LiteralId],
    exclude: ClauseId,
) -> Option<(Vec<LiteralId>, ClauseId)> {
    for (di, &d_lit) in literals.iter().enumerate() {
        let complement = env.literals.complement(d_lit, &env.terms);
        let candidates: Vec<_> = index.index.generalizations(env, complement).collect();

        for entry in candidates {
            if entry.clause == exclude {
                continue;
            }
            let candidate = arena.get(entry.clause);
            if candidate.len() > literals.len() {
                continue;
            }

            // Seed the substitution with c0 matched onto ~d, then place
            // the remaining literals of the candidate into D \ {d}.
            let mut subst = Substitution::new();
            if !match_literals(env, entry.literal, complement, &mut subst) {
                continue;
            }
            let rest: Vec<LiteralId> = candidate
                .literals
                .iter()
                .filter(|&&l| l != entry.literal)
                .copied()
                .collect();
            let remaining: Vec<LiteralId> = literals
                .iter()
                .enumerate()
                .filter(|&(k, _)| k != di)
                .map(|(_, &l)| l)
                .collect();

            let mut used = vec![false; remaining.len()];
            if subsumes_rec(env, &rest, &remaining, 0, &mut used, &mut subst) {
                return Some((remaining, entry.clause));
            }
        }
    }
    None
}

/// Clauses in the index subsumed by `literals` (backward subsumption).
/// Candidates are instances of the first literal.
pub fn backward_subsumed(
    env: &Env,
    arena: &ClauseArena,
    index: &SubsumptionIndex,
    literals: &[LiteralId],
    mode: BackwardSubsumptionMode,
    exclude: ClauseId,
) -> Vec<ClauseId> {
    let mut out = Vec::new();
    if mode == BackwardSubsumptionMode::Off || literals.is_empty() {
        return out;
    }
    if mode == BackwardSubsumptionMode::Unit && literals.len() != 1 {
        return out;
    }

    for entry in index.index.instances(env, literals[0]) {
        if entry.clause == exclude || out.contains(&entry.clause) {
            continue;
        }
        let candidate = arena.get(entry.clause);
        if candidate.len() < literals.len() {
            continue;
        }
        if subsumes(env, literals, &candidate.literals) {
            out.push(entry.clause);
        }
    }
    out
}
