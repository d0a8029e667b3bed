//! Binary resolution.
//!
//! For each selected literal of the given clause, the generating literal
//! index supplies active clauses with a unifiable complementary selected
//! literal. Equality literals are the superposition calculus's business
//! and never resolve.

use super::{rename_offset, Generated};
use crate::index::Indexes;
use crate::logic::{
    unify_literals, ClauseArena, ClauseId, Env, InferenceRule, Kbo, Substitution,
};

pub fn resolution(
    env: &mut Env,
    _kbo: &Kbo,
    arena: &ClauseArena,
    indexes: &Indexes,
    given: ClauseId,
) -> Vec<Generated> {
    let mut out = Vec::new();
    let g = arena.get(given);
    let g_literals = g.literals.clone();
    let g_selected = g.selected_literals().to_vec();
    let offset = rename_offset(env, &g_literals);

    for &lit in &g_selected {
        if env.literal(lit).is_equality() {
            continue;
        }
        // Materialize before interning anything: queries borrow the index,
        // and building conclusions mutates the term store.
        let candidates: Vec<_> = indexes
            .generating_literals
            .index
            .unifiable_complements(env, lit)
            .collect();

        for cand in candidates {
            let partner = arena.get(cand.clause);
            let partner_lit = env.rename_literal(cand.literal, offset);

            let mut subst = Substitution::new();
            if !unify_literals(env, lit, partner_lit, &mut subst) {
                continue;
            }

            let mut literals = Vec::with_capacity(g_literals.len() + partner.len() - 2);
            for &l in &g_literals {
                if l != lit {
                    literals.push(env.apply_literal(l, &subst));
                }
            }
            for &l in &partner.literals.clone() {
                if l != cand.literal {
                    let renamed = env.rename_literal(l, offset);
                    literals.push(env.apply_literal(renamed, &subst));
                }
            }

            out.push(Generated {
                literals,
                rule: InferenceRule::Resolution,
                parents: vec![given, cand.clause],
            });
        }
    }
    out
}
