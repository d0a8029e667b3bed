//! Factoring: collapse two unifiable selected literals of the same
//! polarity into one.

use super::Generated;
use crate::logic::{
    unify_literals, ClauseArena, ClauseId, Env, InferenceRule, Kbo, Substitution,
};

pub fn factoring(
    env: &mut Env,
    _kbo: &Kbo,
    arena: &ClauseArena,
    given: ClauseId,
) -> Vec<Generated> {
    let mut out = Vec::new();
    let g = arena.get(given);
    if g.len() < 2 {
        return out;
    }
    let literals = g.literals.clone();
    let selected = g.selected as usize;

    // The kept literal must be selected; the collapsed one may be any
    // other literal of the same predicate and polarity.
    for i in 0..selected {
        for j in 0..literals.len() {
            if i == j {
                continue;
            }
            let a = env.literal(literals[i]);
            let b = env.literal(literals[j]);
            if a.predicate != b.predicate || a.polarity != b.polarity {
                continue;
            }

            let mut subst = Substitution::new();
            if !unify_literals(env, literals[i], literals[j], &mut subst) {
                continue;
            }

            let conclusion: Vec<_> = literals
                .iter()
                .enumerate()
                .filter(|&(k, _)| k != j)
                .map(|(_, &l)| env.apply_literal(l, &subst))
                .collect();

            out.push(Generated {
                literals: conclusion,
                rule: InferenceRule::Factoring,
                parents: vec![given],
            });
        }
    }
    out
}
