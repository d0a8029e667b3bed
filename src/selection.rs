//! Literal selection.
//!
//! Selection returns a non-empty subset of a clause's literals; only
//! selected literals participate in generating inferences. The numbered
//! policies follow the convention of Hoder et al., "Selecting the
//! selection" (2016):
//!
//! - 0:  select all literals
//! - 20: select all maximal literals
//! - 21: unique maximal, else max-weight negative, else all maximal
//! - 22: max-weight negative literal, else all maximal
//! - 30: lightest literal only (incomplete)
//!
//! The policy is fixed at strategy-configuration time.

use crate::logic::{ClauseArena, ClauseId, Env, Kbo, LiteralId, TermOrder};

/// The fixed table of selection policies.
pub const SELECTION_POLICIES: &[u32] = &[0, 20, 21, 22, 30];

/// Policies that preserve refutation completeness.
pub fn policy_is_complete(policy: u32) -> bool {
    policy != 30
}

/// A literal selection policy chosen from the fixed table.
#[derive(Debug, Clone, Copy)]
pub struct LiteralSelector {
    policy: u32,
}

impl LiteralSelector {
    /// Construct a selector. The policy must come from
    /// `SELECTION_POLICIES`; options validation guarantees this.
    pub fn new(policy: u32) -> Self {
        debug_assert!(SELECTION_POLICIES.contains(&policy));
        LiteralSelector { policy }
    }

    pub fn policy(&self) -> u32 {
        self.policy
    }

    /// Indices of the literals this policy selects. Non-empty for
    /// non-empty input.
    pub fn select(&self, env: &Env, kbo: &Kbo, literals: &[LiteralId]) -> Vec<usize> {
        if literals.is_empty() {
            return Vec::new();
        }
        match self.policy {
            0 => (0..literals.len()).collect(),
            20 => maximal_literals(env, kbo, literals),
            21 => {
                let maximal = maximal_literals(env, kbo, literals);
                if maximal.len() == 1 {
                    return maximal;
                }
                if let Some(neg) = max_weight_negative(env, literals) {
                    return vec![neg];
                }
                maximal
            }
            22 => {
                if let Some(neg) = max_weight_negative(env, literals) {
                    return vec![neg];
                }
                maximal_literals(env, kbo, literals)
            }
            30 => {
                let lightest = literals
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, &l)| env.literal_weight(l))
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                vec![lightest]
            }
            other => unreachable!("unknown selection policy {}", other),
        }
    }

    /// Select on a clause in the arena: move the selected literals to the
    /// front and record the prefix length.
    pub fn select_clause(&self, env: &Env, kbo: &Kbo, arena: &mut ClauseArena, id: ClauseId) {
        let literals = arena.get(id).literals.clone();
        let mut indices = self.select(env, kbo, &literals);
        indices.sort_unstable();

        let clause = arena.get_mut(id);
        let mut reordered = Vec::with_capacity(literals.len());
        for &i in &indices {
            reordered.push(literals[i]);
        }
        for (i, &lit) in literals.iter().enumerate() {
            if !indices.contains(&i) {
                reordered.push(lit);
            }
        }
        clause.literals = reordered;
        clause.selected = indices.len() as u32;
    }
}

/// All maximal literals: those not strictly below any other literal.
fn maximal_literals(env: &Env, kbo: &Kbo, literals: &[LiteralId]) -> Vec<usize> {
    let mut maximal = Vec::new();
    for i in 0..literals.len() {
        let dominated = (0..literals.len()).any(|j| {
            i != j && kbo.compare_literals(env, literals[j], literals[i]) == TermOrder::Greater
        });
        if !dominated {
            maximal.push(i);
        }
    }
    maximal
}

/// Index of a negative literal of maximal weight, if any.
fn max_weight_negative(env: &Env, literals: &[LiteralId]) -> Option<usize> {
    literals
        .iter()
        .enumerate()
        .filter(|(_, &l)| !env.literal(l).polarity)
        .max_by_key(|(_, &l)| env.literal_weight(l))
        .map(|(i, _)| i)
}
