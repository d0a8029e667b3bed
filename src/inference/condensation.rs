//! Condensation: replace a clause by a proper factor that subsumes it.
//!
//! If unifying two literals yields a shorter clause that still subsumes
//! the original, the original can be discarded for the factor. `fast`
//! takes the first condensation found; `on` iterates to a fixpoint.

use super::subsumption::subsumes;
use crate::logic::{unify_literals, Env, LiteralId, Substitution};

/// Condensation discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CondensationMode {
    #[default]
    Off,
    /// One condensation step per clause.
    Fast,
    /// Condense to a fixpoint.
    On,
}

/// One condensation step: the condensed literal list, if any pair of
/// literals admits one.
pub fn condense_step(env: &mut Env, literals: &[LiteralId]) -> Option<Vec<LiteralId>> {
    if literals.len() < 2 {
        return None;
    }
    for i in 0..literals.len() {
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

            let mut factor: Vec<LiteralId> = Vec::with_capacity(literals.len() - 1);
            for (k, &l) in literals.iter().enumerate() {
                if k == j {
                    continue;
                }
                let applied = env.apply_literal(l, &subst);
                if !factor.contains(&applied) {
                    factor.push(applied);
                }
            }

            if factor.len() < literals.len() && subsumes(env, &factor, literals) {
                return Some(factor);
            }
        }
    }
    None
}

/// Condense per the configured mode. Returns the final literal list if
/// the clause changed.
pub fn condense(
    env: &mut Env,
    literals: &[LiteralId],
    mode: CondensationMode,
) -> Option<Vec<LiteralId>> {
    match mode {
        CondensationMode::Off => None,
        CondensationMode::Fast => condense_step(env, literals),
        CondensationMode::On => {
            let mut current = condense_step(env, literals)?;
            while let Some(next) = condense_step(env, &current) {
                current = next;
            }
            Some(current)
        }
    }
}
