//! Inference rules.
//!
//! Generating rules combine the given clause with the active set through
//! the policy indexes; simplifying rules delete or rewrite clauses that
//! other clauses make redundant. The rule sets are fixed, so both are
//! tagged variants rather than trait objects and the saturation loop
//! dispatches with a `match`.

pub mod condensation;
pub mod demodulation;
pub mod equality;
pub mod factoring;
pub mod resolution;
pub mod subsumption;
pub mod superposition;

use crate::index::Indexes;
use crate::logic::{ClauseArena, ClauseId, Env, InferenceRule, Kbo, LiteralId};

pub use condensation::condense;
pub use demodulation::{backward_demodulate, forward_demodulate, DemodulationMode};
pub use subsumption::{
    backward_subsumed, forward_subsumption, forward_subsumption_resolution, subsumes,
    BackwardSubsumptionMode,
};

/// A clause produced by a generating rule, before it enters the arena.
#[derive(Debug)]
pub struct Generated {
    pub literals: Vec<LiteralId>,
    pub rule: InferenceRule,
    pub parents: Vec<ClauseId>,
}

/// The generating rules of the calculus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratingRule {
    Resolution,
    Factoring,
    Superposition,
    EqualityResolution,
    EqualityFactoring,
}

impl GeneratingRule {
    pub const ALL: [GeneratingRule; 5] = [
        GeneratingRule::EqualityResolution,
        GeneratingRule::EqualityFactoring,
        GeneratingRule::Factoring,
        GeneratingRule::Resolution,
        GeneratingRule::Superposition,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GeneratingRule::Resolution => "resolution",
            GeneratingRule::Factoring => "factoring",
            GeneratingRule::Superposition => "superposition",
            GeneratingRule::EqualityResolution => "equality_resolution",
            GeneratingRule::EqualityFactoring => "equality_factoring",
        }
    }

    /// Run this rule with `given` against the active set.
    pub fn generate(
        self,
        env: &mut Env,
        kbo: &Kbo,
        arena: &ClauseArena,
        indexes: &Indexes,
        given: ClauseId,
    ) -> Vec<Generated> {
        match self {
            GeneratingRule::Resolution => resolution::resolution(env, kbo, arena, indexes, given),
            GeneratingRule::Factoring => factoring::factoring(env, kbo, arena, given),
            GeneratingRule::Superposition => {
                superposition::superposition(env, kbo, arena, indexes, given)
            }
            GeneratingRule::EqualityResolution => {
                equality::equality_resolution(env, kbo, arena, given)
            }
            GeneratingRule::EqualityFactoring => {
                equality::equality_factoring(env, kbo, arena, given)
            }
        }
    }
}

/// Offset that renames a partner clause's variables apart from `literals`.
pub(crate) fn rename_offset(env: &Env, literals: &[LiteralId]) -> u32 {
    env.max_variable_in(literals).map_or(0, |v| v + 1)
}

/// The side of an equality literal other than `side`.
pub(crate) fn other_side(env: &Env, literal: LiteralId, side: crate::logic::TermId) -> crate::logic::TermId {
    let lit = env.literal(literal);
    debug_assert!(lit.is_equality());
    if lit.args[0] == side {
        lit.args[1]
    } else {
        debug_assert_eq!(lit.args[1], side);
        lit.args[0]
    }
}
