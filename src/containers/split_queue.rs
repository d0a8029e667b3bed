//! Split-queue passive container.
//!
//! Clauses are bucketed into N age-weight sub-queues by a *niceness*
//! heuristic (the fraction of theory ancestors in the derivation): a
//! clause goes to every sub-queue whose cutoff is at least its niceness.
//! Popping is weighted round-robin over the sub-queues: per-queue balance
//! counters start at zero, each queue's step is lcm(ratios) divided by its
//! configured ratio, and every pop picks the queue with the smallest
//! balance, bumps it by its step, and pops from the first non-empty queue
//! at or after the chosen index, falling back leftward when everything to
//! the right is empty. A popped clause leaves all sub-queues that still
//! hold it.

use crate::limits::Limits;
use crate::logic::{Clause, ClauseArena, ClauseId, Env};

use super::passive::AgeWeightPassive;

fn gcd(a: u64, b: u64) -> u64 {
    if a == 0 {
        b
    } else {
        gcd(b % a, a)
    }
}

fn lcm(a: u64, b: u64) -> u64 {
    (a * b) / gcd(a, b)
}

pub struct SplitQueuePassive {
    queues: Vec<AgeWeightPassive>,
    cutoffs: Vec<f32>,
    /// Reverse ratios: lcm(input ratios) / input ratio per queue.
    ratios: Vec<u64>,
    balances: Vec<i64>,
    sim_balances: Vec<i64>,
    fade_in: bool,
}

impl SplitQueuePassive {
    /// Build from validated strategy options. `input_ratios` and `cutoffs`
    /// have equal length >= 2, cutoffs strictly increasing with last 1.0,
    /// ratios positive (options validation enforces this).
    pub fn new(
        input_ratios: &[u32],
        cutoffs: &[f32],
        fade_in: bool,
        age_ratio: u32,
        weight_ratio: u32,
        nongoal_coefficient: f32,
        seed: u64,
    ) -> Self {
        debug_assert_eq!(input_ratios.len(), cutoffs.len());
        debug_assert!(input_ratios.len() >= 2);

        let l = input_ratios
            .iter()
            .fold(1u64, |acc, &r| lcm(acc, r as u64));

        let queues = (0..input_ratios.len())
            .map(|i| {
                AgeWeightPassive::new(
                    age_ratio,
                    weight_ratio,
                    nongoal_coefficient,
                    seed.wrapping_add(i as u64),
                )
            })
            .collect();

        SplitQueuePassive {
            queues,
            cutoffs: cutoffs.to_vec(),
            ratios: input_ratios.iter().map(|&r| l / r as u64).collect(),
            balances: vec![0; input_ratios.len()],
            sim_balances: vec![0; input_ratios.len()],
            fade_in,
        }
    }

    /// Likeliness in [0, 1] that a clause with this derivation is useful.
    /// With fade-in, derivations with few theory ancestors are damped.
    pub fn niceness(&self, clause: &Clause) -> f32 {
        let th = clause.theory_ancestors;
        let all = clause.ancestors;
        let ratio = clause.theory_ratio();

        if self.fade_in {
            if th <= 2.0 {
                return 0.0;
            } else if th == 3.0 && all <= 6.0 {
                return 0.5;
            } else if th == 4.0 && all <= 5.0 {
                return 0.8;
            }
        }
        ratio
    }

    /// First queue a clause belongs to: the lowest cutoff at or above its
    /// niceness. The last cutoff is 1.0, so this always exists.
    fn best_queue(&self, clause: &Clause) -> usize {
        let niceness = self.niceness(clause);
        self.cutoffs
            .iter()
            .position(|&cutoff| niceness <= cutoff)
            .unwrap_or(self.cutoffs.len() - 1)
    }

    /// Add a clause to every sub-queue from its best queue rightward.
    pub fn add(&mut self, id: ClauseId, clause: &Clause, limits: &Limits) -> bool {
        let best = self.best_queue(clause);
        let mut accepted = false;
        for queue in &mut self.queues[best..] {
            accepted |= queue.add(id, clause, limits);
        }
        accepted
    }

    pub fn remove(&mut self, id: ClauseId) -> bool {
        let mut present = false;
        for queue in &mut self.queues {
            present |= queue.remove(id);
        }
        present
    }

    pub fn contains(&self, id: ClauseId) -> bool {
        self.queues.iter().any(|q| q.contains(id))
    }

    pub fn is_empty(&self) -> bool {
        self.queues.iter().all(|q| q.is_empty())
    }

    /// The last queue holds every clause outside LRS; under tightened
    /// limits its size is only an estimate.
    pub fn size_estimate(&self) -> usize {
        self.queues.last().map_or(0, |q| q.size_estimate())
    }

    /// Queue index the weighted round-robin picks next: smallest balance,
    /// then bump by that queue's ratio.
    fn next_queue_index(balances: &mut [i64], ratios: &[u64]) -> usize {
        let index = balances
            .iter()
            .enumerate()
            .min_by_key(|&(_, &b)| b)
            .map(|(i, _)| i)
            .expect("at least two queues");
        balances[index] += ratios[index] as i64;
        index
    }

    pub fn pop_selected(&mut self) -> Option<ClauseId> {
        if self.is_empty() {
            return None;
        }
        let chosen = Self::next_queue_index(&mut self.balances, &self.ratios);

        // Prefer the chosen queue or the next non-empty one to its right;
        // under LRS queues to the right can run dry, so fall back leftward.
        let mut index = chosen;
        while index < self.queues.len() && self.queues[index].is_empty() {
            index += 1;
        }
        if index == self.queues.len() {
            index = chosen;
            loop {
                index = index.checked_sub(1)?;
                if !self.queues[index].is_empty() {
                    break;
                }
            }
        }

        let id = self.queues[index].pop_selected()?;
        // Drop the clause from every sub-queue that still holds it.
        for queue in &mut self.queues {
            queue.remove(id);
        }
        Some(id)
    }

    // === Limit predicates (shared limits across sub-queues) ===

    pub fn fulfils_age_limit(&self, clause: &Clause, limits: &Limits) -> bool {
        limits.fulfils_age_limit(clause.age)
    }

    pub fn fulfils_weight_limit(&self, clause: &Clause, limits: &Limits) -> bool {
        self.queues[0].fulfils_weight_limit(clause, limits)
    }

    pub fn children_potentially_fulfil_limits(
        &self,
        env: &Env,
        clause: &Clause,
        limits: &Limits,
    ) -> bool {
        // No lower bound on a child's niceness is known, so the check must
        // hold if any queue could select a child.
        self.queues
            .iter()
            .any(|q| q.children_potentially_fulfil_limits(env, clause, limits))
    }

    pub fn drop_excluded(&mut self, arena: &ClauseArena, limits: &Limits) -> Vec<ClauseId> {
        let mut dropped = Vec::new();
        for queue in &mut self.queues {
            for id in queue.drop_excluded(arena, limits) {
                if !dropped.contains(&id) {
                    dropped.push(id);
                }
            }
        }
        dropped.retain(|&id| !self.contains(id));
        dropped
    }

    // === LRS simulation ===

    pub fn simulation_init(&mut self) {
        self.sim_balances.copy_from_slice(&self.balances);
        for queue in &mut self.queues {
            queue.simulation_init();
        }
    }

    pub fn simulation_has_next(&mut self) -> bool {
        let mut has_next = false;
        for queue in &mut self.queues {
            has_next |= queue.simulation_has_next();
        }
        has_next
    }

    pub fn simulation_pop_selected(&mut self) {
        let chosen = Self::next_queue_index(&mut self.sim_balances, &self.ratios);

        let mut index = chosen;
        while index < self.queues.len() && !self.queues[index].simulation_has_next() {
            index += 1;
        }
        if index == self.queues.len() {
            let mut fallback = chosen;
            loop {
                let Some(next) = fallback.checked_sub(1) else {
                    return;
                };
                fallback = next;
                if self.queues[fallback].simulation_has_next() {
                    break;
                }
            }
            index = fallback;
        }
        self.queues[index].simulation_pop_selected();
    }

    pub fn set_limits_to_max(&mut self) -> bool {
        let mut tightened = false;
        for queue in &mut self.queues {
            tightened |= queue.set_limits_to_max();
        }
        tightened
    }

    /// Tighten the shared limits to the least restrictive proposal across
    /// sub-queues, so no clause a future pop could select is lost.
    pub fn set_limits_from_simulation(&mut self, limits: &mut Limits) -> bool {
        let mut age: Option<u32> = None;
        let mut weight: Option<u32> = None;
        let mut all_age = true;
        let mut all_weight = true;

        for queue in &mut self.queues {
            let (a, w) = queue.sim_proposals();
            match a {
                Some(a) => age = Some(age.map_or(a, |cur: u32| cur.max(a))),
                None => all_age = false,
            }
            match w {
                Some(w) => weight = Some(weight.map_or(w, |cur: u32| cur.max(w))),
                None => all_weight = false,
            }
            queue.finish_simulation();
        }

        let age = if all_age { age } else { None };
        let weight = if all_weight { weight } else { None };
        limits.tighten(age, weight)
    }
}
