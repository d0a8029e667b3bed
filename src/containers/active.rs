//! The active clause set.
//!
//! Active clauses participate in generating inferences. On limits
//! tightening the set self-prunes: clauses that could no longer be
//! selected under the current limits are discarded through the generating
//! literal index.

use crate::events::Event;
use crate::index::GeneratingLiteralIndex;
use crate::limits::{effective_weight, Limits};
use crate::logic::{ClauseArena, ClauseId, Env};
use indexmap::IndexSet;

pub struct ActiveSet {
    clauses: IndexSet<ClauseId>,
    pub added: Event<ClauseId>,
    pub removed: Event<ClauseId>,
}

impl Default for ActiveSet {
    fn default() -> Self {
        ActiveSet::new()
    }
}

impl ActiveSet {
    pub fn new() -> Self {
        ActiveSet {
            clauses: IndexSet::new(),
            added: Event::new(),
            removed: Event::new(),
        }
    }

    pub fn add(&mut self, id: ClauseId) {
        self.clauses.insert(id);
        self.added.fire(&id);
    }

    pub fn remove(&mut self, id: ClauseId) -> bool {
        let present = self.clauses.shift_remove(&id);
        if present {
            self.removed.fire(&id);
        }
        present
    }

    pub fn contains(&self, id: ClauseId) -> bool {
        self.clauses.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ClauseId> + '_ {
        self.clauses.iter().copied()
    }

    /// Active clauses that can no longer contribute under the tightened
    /// limits, found by walking the generating literal index.
    ///
    /// A clause strictly over the age limit goes if its effective weight is
    /// over the weight limit; a clause exactly at the age limit goes if
    /// even its cheapest child (weight minus the heaviest selected literal)
    /// would miss the weight limit.
    pub fn prunable(
        &self,
        env: &Env,
        arena: &ClauseArena,
        limits: &Limits,
        gen_index: &GeneratingLiteralIndex,
        nongoal_coefficient: f32,
    ) -> Vec<ClauseId> {
        let (Some(age_limit), Some(weight_limit)) = (limits.age_limit(), limits.weight_limit())
        else {
            return Vec::new();
        };

        let mut to_remove = Vec::new();
        for id in gen_index.index.clauses() {
            if !self.clauses.contains(&id) {
                continue;
            }
            let clause = arena.get(id);
            if clause.age < age_limit {
                continue;
            }
            let should_remove = if clause.age > age_limit {
                effective_weight(clause, nongoal_coefficient) > weight_limit
            } else {
                clause.weight.saturating_sub(clause.max_selected_literal_weight(env))
                    >= weight_limit
            };
            if should_remove {
                to_remove.push(id);
            }
        }
        to_remove
    }
}
