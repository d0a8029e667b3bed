//! Passive clause containers.
//!
//! Passive holds simplified clauses waiting for selection. The base shape
//! is the age-weight queue: one queue ordered by age, one by effective
//! weight, with a deterministic ratio balance deciding which side the next
//! pop comes from. The container also carries the limited-resource hooks:
//! a virtual walk ("simulation") over its current content that predicts
//! which clauses a given number of future pops would select, and the limit
//! predicates used to refuse or discard clauses that could never be
//! selected.

use crate::events::Event;
use crate::limits::{effective_weight, Limits};
use crate::logic::{Clause, ClauseArena, ClauseId, Env};
use std::collections::{BTreeSet, HashMap, HashSet};

use super::split_queue::SplitQueuePassive;

/// Key of the age-ordered queue: (age, effective weight, id).
type AgeKey = (u32, u32, ClauseId);
/// Key of the weight-ordered queue: (effective weight, age, id).
type WeightKey = (u32, u32, ClauseId);

/// The age-weight passive container.
pub struct AgeWeightPassive {
    age_ratio: u32,
    weight_ratio: u32,
    balance: i64,
    nongoal_coefficient: f32,
    age_queue: BTreeSet<AgeKey>,
    weight_queue: BTreeSet<WeightKey>,
    /// Clause id -> (age, effective weight), for removal.
    members: HashMap<ClauseId, (u32, u32)>,
    /// SplitMix-style state for the balance tiebreak, from the strategy
    /// random seed.
    rng_state: u64,
    simulation: Option<Simulation>,
    sim_age_limit: Option<u32>,
    sim_weight_limit: Option<u32>,
}

/// A virtual cursor over the queues: nothing is removed, popped clauses
/// are remembered and skipped.
struct Simulation {
    balance: i64,
    rng_state: u64,
    age_entries: Vec<AgeKey>,
    weight_entries: Vec<WeightKey>,
    age_pos: usize,
    weight_pos: usize,
    popped: HashSet<ClauseId>,
}

impl AgeWeightPassive {
    pub fn new(age_ratio: u32, weight_ratio: u32, nongoal_coefficient: f32, seed: u64) -> Self {
        debug_assert!(age_ratio > 0 || weight_ratio > 0);
        AgeWeightPassive {
            age_ratio,
            weight_ratio,
            balance: 0,
            nongoal_coefficient,
            age_queue: BTreeSet::new(),
            weight_queue: BTreeSet::new(),
            members: HashMap::new(),
            rng_state: seed.wrapping_add(0x9e3779b97f4a7c15),
            simulation: None,
            sim_age_limit: None,
            sim_weight_limit: None,
        }
    }

    fn next_random_bit(state: &mut u64) -> bool {
        *state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (*state >> 63) != 0
    }

    fn keys(&self, id: ClauseId, clause: &Clause) -> (AgeKey, WeightKey) {
        let w = effective_weight(clause, self.nongoal_coefficient);
        ((clause.age, w, id), (w, clause.age, id))
    }

    /// Insert a clause unless the current limits already exclude it.
    /// Returns `false` if the clause was refused.
    pub fn add(&mut self, id: ClauseId, clause: &Clause, limits: &Limits) -> bool {
        if !self.fulfils_age_limit(clause, limits) || !self.fulfils_weight_limit(clause, limits) {
            return false;
        }
        let (age_key, weight_key) = self.keys(id, clause);
        self.age_queue.insert(age_key);
        self.weight_queue.insert(weight_key);
        self.members.insert(id, (clause.age, age_key.1));
        true
    }

    pub fn remove(&mut self, id: ClauseId) -> bool {
        let Some((age, w)) = self.members.remove(&id) else {
            return false;
        };
        self.age_queue.remove(&(age, w, id));
        self.weight_queue.remove(&(w, age, id));
        true
    }

    pub fn contains(&self, id: ClauseId) -> bool {
        self.members.contains_key(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn size_estimate(&self) -> usize {
        self.members.len()
    }

    /// Which side does the next pop come from?
    fn pop_by_weight(
        age_ratio: u32,
        weight_ratio: u32,
        balance: i64,
        rng_state: &mut u64,
    ) -> bool {
        if age_ratio == 0 {
            true
        } else if weight_ratio == 0 {
            false
        } else if balance > 0 {
            true
        } else if balance < 0 {
            false
        } else {
            Self::next_random_bit(rng_state)
        }
    }

    /// Pop the next selected clause per the age-weight ratio.
    pub fn pop_selected(&mut self) -> Option<ClauseId> {
        if self.members.is_empty() {
            return None;
        }
        let by_weight = Self::pop_by_weight(
            self.age_ratio,
            self.weight_ratio,
            self.balance,
            &mut self.rng_state,
        );
        let id = if by_weight {
            self.balance -= self.age_ratio as i64;
            let &(_, _, id) = self.weight_queue.iter().next().expect("non-empty");
            id
        } else {
            self.balance += self.weight_ratio as i64;
            let &(_, _, id) = self.age_queue.iter().next().expect("non-empty");
            id
        };
        self.remove(id);
        Some(id)
    }

    // === Limit predicates ===

    pub fn fulfils_age_limit(&self, clause: &Clause, limits: &Limits) -> bool {
        limits.fulfils_age_limit(clause.age)
    }

    pub fn fulfils_weight_limit(&self, clause: &Clause, limits: &Limits) -> bool {
        limits.fulfils_weight_limit(effective_weight(clause, self.nongoal_coefficient))
    }

    /// Could any child of this clause survive the current limits? Children
    /// have age + 1, and a generating inference can shrink the clause by at
    /// most its heaviest selected literal.
    pub fn children_potentially_fulfil_limits(
        &self,
        env: &Env,
        clause: &Clause,
        limits: &Limits,
    ) -> bool {
        if limits.fulfils_age_limit(clause.age + 1) {
            return true;
        }
        let Some(weight_limit) = limits.weight_limit() else {
            return true;
        };
        let lower_bound = clause
            .weight
            .saturating_sub(clause.max_selected_literal_weight(env));
        lower_bound < weight_limit
    }

    /// Remove all clauses the current limits exclude; returns the removed
    /// ids so the caller can retag and count them.
    pub fn drop_excluded(&mut self, arena: &ClauseArena, limits: &Limits) -> Vec<ClauseId> {
        let excluded: Vec<ClauseId> = self
            .members
            .keys()
            .copied()
            .filter(|&id| {
                let clause = arena.get(id);
                !self.fulfils_age_limit(clause, limits)
                    || !self.fulfils_weight_limit(clause, limits)
            })
            .collect();
        for &id in &excluded {
            self.remove(id);
        }
        excluded
    }

    // === LRS simulation ===

    /// Start a virtual walk over the current content.
    pub fn simulation_init(&mut self) {
        self.simulation = Some(Simulation {
            balance: self.balance,
            rng_state: self.rng_state,
            age_entries: self.age_queue.iter().copied().collect(),
            weight_entries: self.weight_queue.iter().copied().collect(),
            age_pos: 0,
            weight_pos: 0,
            popped: HashSet::new(),
        });
        self.sim_age_limit = None;
        self.sim_weight_limit = None;
    }

    pub fn simulation_has_next(&mut self) -> bool {
        let Some(sim) = self.simulation.as_mut() else {
            return false;
        };
        while sim.age_pos < sim.age_entries.len()
            && sim.popped.contains(&sim.age_entries[sim.age_pos].2)
        {
            sim.age_pos += 1;
        }
        while sim.weight_pos < sim.weight_entries.len()
            && sim.popped.contains(&sim.weight_entries[sim.weight_pos].2)
        {
            sim.weight_pos += 1;
        }
        sim.age_pos < sim.age_entries.len() || sim.weight_pos < sim.weight_entries.len()
    }

    /// Virtually pop the next clause, recording the worst age and weight
    /// that a real pop sequence would still select.
    pub fn simulation_pop_selected(&mut self) {
        if !self.simulation_has_next() {
            return;
        }
        let Some(sim) = self.simulation.as_mut() else {
            return;
        };

        let age_exhausted = sim.age_pos >= sim.age_entries.len();
        let weight_exhausted = sim.weight_pos >= sim.weight_entries.len();
        let mut by_weight = Self::pop_by_weight(
            self.age_ratio,
            self.weight_ratio,
            sim.balance,
            &mut sim.rng_state,
        );
        if by_weight && weight_exhausted {
            by_weight = false;
        } else if !by_weight && age_exhausted {
            by_weight = true;
        }

        if by_weight {
            sim.balance -= self.age_ratio as i64;
            let (w, _, id) = sim.weight_entries[sim.weight_pos];
            sim.popped.insert(id);
            let limit = self.sim_weight_limit.get_or_insert(0);
            *limit = (*limit).max(w);
        } else {
            sim.balance += self.weight_ratio as i64;
            let (age, _, id) = sim.age_entries[sim.age_pos];
            sim.popped.insert(id);
            let limit = self.sim_age_limit.get_or_insert(0);
            *limit = (*limit).max(age);
        }
    }

    /// Forget any simulation-proposed limits. Limits stay monotone over a
    /// run, so this never loosens the shared limits.
    pub fn set_limits_to_max(&mut self) -> bool {
        self.sim_age_limit = None;
        self.sim_weight_limit = None;
        false
    }

    /// Install the limits observed during the last simulation. Returns
    /// whether the shared limits were tightened.
    pub fn set_limits_from_simulation(&mut self, limits: &mut Limits) -> bool {
        self.simulation = None;
        limits.tighten(self.sim_age_limit, self.sim_weight_limit)
    }

    /// The `(age, weight)` limits the last simulation proposed.
    pub(crate) fn sim_proposals(&self) -> (Option<u32>, Option<u32>) {
        (self.sim_age_limit, self.sim_weight_limit)
    }

    /// Drop the simulation cursor without touching any limits.
    pub(crate) fn finish_simulation(&mut self) {
        self.simulation = None;
    }
}

/// The passive container variants a strategy can pick.
pub enum Passive {
    AgeWeight(AgeWeightPassive),
    Split(SplitQueuePassive),
}

/// The passive container with its events. Delegates to the configured
/// variant.
pub struct PassiveSet {
    inner: Passive,
    pub added: Event<ClauseId>,
    pub removed: Event<ClauseId>,
    pub selected: Event<ClauseId>,
}

impl PassiveSet {
    pub fn new(inner: Passive) -> Self {
        PassiveSet {
            inner,
            added: Event::new(),
            removed: Event::new(),
            selected: Event::new(),
        }
    }

    pub fn add(&mut self, id: ClauseId, clause: &Clause, limits: &Limits) -> bool {
        let accepted = match &mut self.inner {
            Passive::AgeWeight(q) => q.add(id, clause, limits),
            Passive::Split(q) => q.add(id, clause, limits),
        };
        if accepted {
            self.added.fire(&id);
        }
        accepted
    }

    pub fn remove(&mut self, id: ClauseId) -> bool {
        let present = match &mut self.inner {
            Passive::AgeWeight(q) => q.remove(id),
            Passive::Split(q) => q.remove(id),
        };
        if present {
            self.removed.fire(&id);
        }
        present
    }

    pub fn pop_selected(&mut self) -> Option<ClauseId> {
        let id = match &mut self.inner {
            Passive::AgeWeight(q) => q.pop_selected(),
            Passive::Split(q) => q.pop_selected(),
        }?;
        self.selected.fire(&id);
        Some(id)
    }

    pub fn is_empty(&self) -> bool {
        match &self.inner {
            Passive::AgeWeight(q) => q.is_empty(),
            Passive::Split(q) => q.is_empty(),
        }
    }

    pub fn contains(&self, id: ClauseId) -> bool {
        match &self.inner {
            Passive::AgeWeight(q) => q.contains(id),
            Passive::Split(q) => q.contains(id),
        }
    }

    pub fn size_estimate(&self) -> usize {
        match &self.inner {
            Passive::AgeWeight(q) => q.size_estimate(),
            Passive::Split(q) => q.size_estimate(),
        }
    }

    pub fn fulfils_age_limit(&self, clause: &Clause, limits: &Limits) -> bool {
        match &self.inner {
            Passive::AgeWeight(q) => q.fulfils_age_limit(clause, limits),
            Passive::Split(q) => q.fulfils_age_limit(clause, limits),
        }
    }

    pub fn fulfils_weight_limit(&self, clause: &Clause, limits: &Limits) -> bool {
        match &self.inner {
            Passive::AgeWeight(q) => q.fulfils_weight_limit(clause, limits),
            Passive::Split(q) => q.fulfils_weight_limit(clause, limits),
        }
    }

    pub fn children_potentially_fulfil_limits(
        &self,
        env: &Env,
        clause: &Clause,
        limits: &Limits,
    ) -> bool {
        match &self.inner {
            Passive::AgeWeight(q) => q.children_potentially_fulfil_limits(env, clause, limits),
            Passive::Split(q) => q.children_potentially_fulfil_limits(env, clause, limits),
        }
    }

    pub fn drop_excluded(&mut self, arena: &ClauseArena, limits: &Limits) -> Vec<ClauseId> {
        let removed = match &mut self.inner {
            Passive::AgeWeight(q) => q.drop_excluded(arena, limits),
            Passive::Split(q) => q.drop_excluded(arena, limits),
        };
        for id in &removed {
            self.removed.fire(id);
        }
        removed
    }

    pub fn simulation_init(&mut self) {
        match &mut self.inner {
            Passive::AgeWeight(q) => q.simulation_init(),
            Passive::Split(q) => q.simulation_init(),
        }
    }

    pub fn simulation_has_next(&mut self) -> bool {
        match &mut self.inner {
            Passive::AgeWeight(q) => q.simulation_has_next(),
            Passive::Split(q) => q.simulation_has_next(),
        }
    }

    pub fn simulation_pop_selected(&mut self) {
        match &mut self.inner {
            Passive::AgeWeight(q) => q.simulation_pop_selected(),
            Passive::Split(q) => q.simulation_pop_selected(),
        }
    }

    pub fn set_limits_to_max(&mut self) -> bool {
        match &mut self.inner {
            Passive::AgeWeight(q) => q.set_limits_to_max(),
            Passive::Split(q) => q.set_limits_to_max(),
        }
    }

    pub fn set_limits_from_simulation(&mut self, limits: &mut Limits) -> bool {
        match &mut self.inner {
            Passive::AgeWeight(q) => q.set_limits_from_simulation(limits),
            Passive::Split(q) => q.set_limits_from_simulation(limits),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::{Inference, Kbo, KboConfig, Literal};

    fn clause_with(env: &mut Env, arena: &mut ClauseArena, depth: usize, age: u32) -> ClauseId {
        let kbo = Kbo::new(KboConfig::default());
        let p = env.symbols.intern_predicate("p", 1);
        let f = env.symbols.intern_function("f", 1);
        let a = env.symbols.intern_function("a", 0);
        let mut t = env.terms.app(a, vec![]);
        for _ in 0..depth {
            t = env.terms.app(f, vec![t]);
        }
        let lit = env.intern_literal(Literal::positive(p, vec![t]));
        let id = arena.create(env, &kbo, vec![lit], Inference::input());
        arena.get_mut(id).age = age;
        id
    }

    #[test]
    fn test_pure_age_order() {
        let mut env = Env::new();
        let mut arena = ClauseArena::new();
        let limits = Limits::new();
        let mut queue = AgeWeightPassive::new(1, 0, 1.0, 0);

        let old = clause_with(&mut env, &mut arena, 5, 0);
        let young = clause_with(&mut env, &mut arena, 0, 3);

        assert!(queue.add(young, arena.get(young), &limits));
        assert!(queue.add(old, arena.get(old), &limits));

        // age_ratio only: oldest first regardless of weight
        assert_eq!(queue.pop_selected(), Some(old));
        assert_eq!(queue.pop_selected(), Some(young));
        assert_eq!(queue.pop_selected(), None);
    }

    #[test]
    fn test_pure_weight_order() {
        let mut env = Env::new();
        let mut arena = ClauseArena::new();
        let limits = Limits::new();
        let mut queue = AgeWeightPassive::new(0, 1, 1.0, 0);

        let heavy = clause_with(&mut env, &mut arena, 5, 0);
        let light = clause_with(&mut env, &mut arena, 0, 3);

        assert!(queue.add(heavy, arena.get(heavy), &limits));
        assert!(queue.add(light, arena.get(light), &limits));

        assert_eq!(queue.pop_selected(), Some(light));
        assert_eq!(queue.pop_selected(), Some(heavy));
    }

    #[test]
    fn test_ratio_alternates() {
        let mut env = Env::new();
        let mut arena = ClauseArena::new();
        let limits = Limits::new();
        let mut queue = AgeWeightPassive::new(1, 1, 1.0, 7);

        let mut ids = Vec::new();
        for i in 0..10 {
            // Older clauses are heavier, so the two queues disagree.
            let id = clause_with(&mut env, &mut arena, 10 - i, i as u32);
            ids.push(id);
            assert!(queue.add(id, arena.get(id), &limits));
        }

        // With ratio 1:1, after 2k pops each side has been used k times
        // (up to the single random tiebreak at balance 0).
        let mut age_pops = 0;
        let mut weight_pops = 0;
        for _ in 0..10 {
            let id = queue.pop_selected().unwrap();
            let clause = arena.get(id);
            if clause.age == age_pops {
                age_pops += 1;
            } else {
                weight_pops += 1;
            }
        }
        assert!((age_pops as i32 - weight_pops as i32).abs() <= 1);
    }

    #[test]
    fn test_limits_refuse_admission() {
        let mut env = Env::new();
        let mut arena = ClauseArena::new();
        let mut limits = Limits::new();
        limits.tighten(Some(2), Some(3));

        let mut queue = AgeWeightPassive::new(1, 1, 1.0, 0);

        // Weight over the limit at the age limit: refused
        let heavy = clause_with(&mut env, &mut arena, 5, 2);
        assert!(!queue.add(heavy, arena.get(heavy), &limits));
        assert!(queue.is_empty());

        // Within limits: accepted
        let light = clause_with(&mut env, &mut arena, 0, 2);
        assert!(queue.add(light, arena.get(light), &limits));
        assert_eq!(queue.size_estimate(), 1);
    }

    #[test]
    fn test_drop_excluded_on_tightening() {
        let mut env = Env::new();
        let mut arena = ClauseArena::new();
        let mut limits = Limits::new();
        let mut queue = AgeWeightPassive::new(1, 1, 1.0, 0);

        let heavy = clause_with(&mut env, &mut arena, 5, 0);
        let light = clause_with(&mut env, &mut arena, 0, 0);
        queue.add(heavy, arena.get(heavy), &limits);
        queue.add(light, arena.get(light), &limits);

        limits.tighten(None, Some(3));
        let dropped = queue.drop_excluded(&arena, &limits);
        assert_eq!(dropped, vec![heavy]);
        assert!(queue.contains(light));
        assert!(!queue.contains(heavy));
    }

    #[test]
    fn test_simulation_matches_real_pops() {
        let mut env = Env::new();
        let mut arena = ClauseArena::new();
        let limits = Limits::new();
        let mut queue = AgeWeightPassive::new(1, 1, 1.0, 42);

        let mut ids = Vec::new();
        for i in 0..8 {
            let id = clause_with(&mut env, &mut arena, (i % 4) as usize, i as u32);
            ids.push(id);
            queue.add(id, arena.get(id), &limits);
        }

        // Simulate 4 pops and record the proposed limits.
        queue.simulation_init();
        for _ in 0..4 {
            assert!(queue.simulation_has_next());
            queue.simulation_pop_selected();
        }
        let sim_age = queue.sim_age_limit;
        let sim_weight = queue.sim_weight_limit;

        // Each real pop within the budget satisfies the proposed limits
        // on the side it was popped from.
        for _ in 0..4 {
            let id = queue.pop_selected().unwrap();
            let clause = arena.get(id);
            let within_age = sim_age.map_or(false, |l| clause.age <= l);
            let within_weight = sim_weight.map_or(false, |l| clause.weight <= l);
            assert!(
                within_age || within_weight,
                "popped clause outside simulated limits"
            );
        }
    }

    #[test]
    fn test_simulation_exhausts() {
        let mut env = Env::new();
        let mut arena = ClauseArena::new();
        let limits = Limits::new();
        let mut queue = AgeWeightPassive::new(1, 1, 1.0, 0);

        let id = clause_with(&mut env, &mut arena, 0, 0);
        queue.add(id, arena.get(id), &limits);

        queue.simulation_init();
        assert!(queue.simulation_has_next());
        queue.simulation_pop_selected();
        assert!(!queue.simulation_has_next());

        // The real queue is untouched by simulation
        assert_eq!(queue.size_estimate(), 1);
    }

    #[test]
    fn test_set_limits_from_simulation_tightens() {
        let mut env = Env::new();
        let mut arena = ClauseArena::new();
        let mut limits = Limits::new();
        let mut queue = AgeWeightPassive::new(1, 0, 1.0, 0);

        for i in 0..6 {
            let id = clause_with(&mut env, &mut arena, 0, i);
            queue.add(id, arena.get(id), &limits);
        }

        // Simulate only 3 of 6 pops: age limit becomes the worst age seen.
        queue.simulation_init();
        for _ in 0..3 {
            queue.simulation_pop_selected();
        }
        assert!(queue.set_limits_from_simulation(&mut limits));
        assert_eq!(limits.age_limit(), Some(2));
        assert!(limits.weight_limit().is_none());
    }
}
