//! Demodulation: simplifying rewriting with oriented unit equalities.
//!
//! Forward demodulation rewrites a new clause with indexed unit
//! equalities; backward demodulation uses a newly activated unit equality
//! to rewrite older clauses. Both replace one subterm occurrence `lσ` by
//! `rσ` where `lσ > rσ`, which strictly decreases the clause in the
//! ordering.

use super::rename_offset;
use crate::index::{DemodulationLhsIndex, DemodulationSubtermIndex, TermEntry};
use crate::logic::{
    match_term, ClauseArena, ClauseId, Env, Kbo, Literal, LiteralId, Substitution, TermOrder,
};

/// Rewriting discipline for demodulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DemodulationMode {
    Off,
    /// Only equalities the ordering orients once and for all.
    Preordered,
    /// Also unoriented equalities whose instance is oriented.
    #[default]
    On,
}

/// Try to rewrite some literal of `literals` with a unit equality from the
/// index. Returns the rewritten literal list and the rewriting clause, or
/// `None` if nothing applies.
pub fn forward_demodulate(
    env: &mut Env,
    kbo: &Kbo,
    index: &DemodulationLhsIndex,
    literals: &[LiteralId],
    mode: DemodulationMode,
    exclude: ClauseId,
) -> Option<(Vec<LiteralId>, ClauseId)> {
    if mode == DemodulationMode::Off || index.index.is_empty() {
        return None;
    }
    let offset = rename_offset(env, literals);

    for (li, &lit) in literals.iter().enumerate() {
        let args = env.literal(lit).args.clone();
        for (ai, &arg) in args.iter().enumerate() {
            let subterms: Vec<_> = env
                .terms
                .subterms(arg)
                .filter(|&t| !env.terms.is_var(t))
                .collect();
            for sub in subterms {
                let candidates: Vec<TermEntry> =
                    index.index.generalizations(env, sub).collect();
                for cand in candidates {
                    if cand.clause == exclude {
                        continue;
                    }
                    if let Some(rewritten) =
                        try_rewrite(env, kbo, &cand, offset, sub, mode)
                    {
                        // Splice the rewritten subterm into the literal.
                        let path = env
                            .terms
                            .positions_of(arg, sub)
                            .into_iter()
                            .next()
                            .expect("subterm has a position");
                        let new_arg = env.terms.replace_at(arg, &path, rewritten);
                        let mut new_args = args.clone();
                        new_args[ai] = new_arg;
                        let old = env.literal(lit).clone();
                        let new_lit = env.intern_literal(Literal {
                            predicate: old.predicate,
                            polarity: old.polarity,
                            args: new_args,
                        });
                        let mut new_literals = literals.to_vec();
                        new_literals[li] = new_lit;
                        return Some((new_literals, cand.clause));
                    }
                }
            }
        }
    }
    None
}

/// Check that the candidate equality rewrites `sub`, and compute the
/// replacement term. The rule is renamed apart before matching so that
/// applying the matcher's bindings terminates.
fn try_rewrite(
    env: &mut Env,
    kbo: &Kbo,
    cand: &TermEntry,
    offset: u32,
    sub: crate::logic::TermId,
    mode: DemodulationMode,
) -> Option<crate::logic::TermId> {
    let l = env.terms.rename(cand.term, offset);
    let eq_lit = env.rename_literal(cand.literal, offset);
    let r = super::other_side(env, eq_lit, l);

    let mut subst = Substitution::new();
    if !match_term(&env.terms, l, sub, &mut subst) {
        return None;
    }
    let r_sigma = env.terms.apply(r, &subst);

    let oriented = kbo.compare(env, l, r) == TermOrder::Greater;
    let applies = match mode {
        DemodulationMode::Off => false,
        DemodulationMode::Preordered => oriented,
        // An oriented rule instance stays oriented; otherwise order the
        // instance itself.
        DemodulationMode::On => {
            oriented || kbo.compare(env, sub, r_sigma) == TermOrder::Greater
        }
    };
    applies.then_some(r_sigma)
}

/// Rewrite active/passive clauses with the given unit equality. Returns
/// `(clause, rewritten literals)` pairs; the caller removes the originals
/// and re-enqueues the replacements.
pub fn backward_demodulate(
    env: &mut Env,
    kbo: &Kbo,
    arena: &ClauseArena,
    index: &DemodulationSubtermIndex,
    given: ClauseId,
    mode: DemodulationMode,
) -> Vec<(ClauseId, Vec<LiteralId>)> {
    let mut out = Vec::new();
    if mode == DemodulationMode::Off {
        return out;
    }
    let clause = arena.get(given);
    if !clause.is_unit_equality(env) {
        return out;
    }
    let eq_lit = clause.literals[0];

    let sides = crate::index::rewriting_sides(env, kbo, eq_lit);
    let mut rewritten_clauses: Vec<ClauseId> = Vec::new();

    for l in sides {
        // Materialize: found clauses get deleted by the caller, and the
        // iterator must not outlive index consistency.
        let candidates: Vec<TermEntry> = index.index.instances(env, l).collect();
        for cand in candidates {
            if cand.clause == given || rewritten_clauses.contains(&cand.clause) {
                continue;
            }
            let target_literals = arena.get(cand.clause).literals.clone();
            let offset = rename_offset(env, &target_literals);

            // Reuse the forward machinery with the rule renamed against
            // this particular target.
            let rule_entry = TermEntry {
                term: l,
                literal: eq_lit,
                clause: given,
            };
            if let Some(r_sigma) = try_rewrite(env, kbo, &rule_entry, offset, cand.term, mode) {
                let li = target_literals
                    .iter()
                    .position(|&x| x == cand.literal)
                    .expect("indexed literal belongs to its clause");
                let args = env.literal(cand.literal).args.clone();
                let Some((ai, path)) = args.iter().enumerate().find_map(|(ai, &arg)| {
                    env.terms
                        .positions_of(arg, cand.term)
                        .into_iter()
                        .next()
                        .map(|p| (ai, p))
                }) else {
                    continue;
                };

                let new_arg = env.terms.replace_at(args[ai], &path, r_sigma);
                let mut new_args = args.clone();
                new_args[ai] = new_arg;
                let old = env.literal(cand.literal).clone();
                let new_lit = env.intern_literal(Literal {
                    predicate: old.predicate,
                    polarity: old.polarity,
                    args: new_args,
                });
                let mut new_literals = target_literals.clone();
                new_literals[li] = new_lit;

                rewritten_clauses.push(cand.clause);
                out.push((cand.clause, new_literals));
            }
        }
    }
    out
}
