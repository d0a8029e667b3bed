//! The given-clause saturation loop.
//!
//! Clauses flow Unprocessed → Passive → Active. Each step drains the
//! unprocessed queue through the forward simplifications, picks a given
//! clause from passive, activates it, simplifies the older clauses
//! backward with it, and generates all inferences between it and the
//! active set. The loop is single threaded; events fired by a container
//! complete before the next container operation of the step.
//!
//! Loop variants: Otter simplifies against Active ∪ Passive, Discount
//! against Active only, and LRS is Otter plus the limited-resource
//! strategy that tightens age/weight limits from a simulation of future
//! passive consumption.

pub mod statistics;

pub use statistics::Statistics;

use crate::containers::{ActiveSet, AgeWeightPassive, Passive, PassiveSet, SplitQueuePassive, UnprocessedQueue};
use crate::events::Subscription;
use crate::index::{ClauseFeatures, Indexes};
use crate::inference::{
    backward_demodulate, backward_subsumed, condense, forward_demodulate, forward_subsumption,
    forward_subsumption_resolution, GeneratingRule,
};
use crate::limits::Limits;
use crate::logic::{
    ClauseArena, ClauseId, Env, Inference, InferenceRule, Kbo, KboConfig, LiteralId, StoreTag,
};
use crate::options::{ConfigError, Options, SaturationAlgorithm};
use crate::selection::LiteralSelector;
use log::{debug, info};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The empty clause was derived.
    Refutation,
    /// The clause set is saturated under a complete strategy.
    Satisfiable,
    /// The clause set is exhausted but the strategy was incomplete or
    /// discarded non-redundant clauses.
    RefutationNotFound,
    TimeLimit,
    MemoryLimit,
    Unknown,
}

/// Outcome of a saturation run.
#[derive(Debug)]
pub struct SaturationResult {
    pub termination: TerminationReason,
    /// The empty clause rooting the proof DAG, when refuted.
    pub refutation: Option<ClauseId>,
    pub statistics: Statistics,
}

/// Monotone clock used for the time limit and the LRS budget estimate.
/// Mockable in tests.
pub trait Clock {
    fn elapsed(&self) -> Duration;
}

/// Process wall clock, started at construction.
pub struct WallClock {
    start: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        WallClock {
            start: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        WallClock::new()
    }
}

impl Clock for WallClock {
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Role of an input clause, as reported by clausification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClauseRole {
    #[default]
    Axiom,
    TheoryAxiom,
    NegatedConjecture,
}

impl ClauseRole {
    fn rule(self) -> InferenceRule {
        match self {
            ClauseRole::Axiom => InferenceRule::Input,
            ClauseRole::TheoryAxiom => InferenceRule::TheoryAxiom,
            ClauseRole::NegatedConjecture => InferenceRule::NegatedConjecture,
        }
    }
}

/// One input clause: signed atoms over interned symbols, already in CNF.
#[derive(Debug, Clone)]
pub struct ClauseInput {
    pub literals: Vec<LiteralId>,
    pub role: ClauseRole,
}

/// Current process RSS in megabytes, if the platform exposes it.
pub fn process_memory_mb() -> Option<usize> {
    #[cfg(target_os = "linux")]
    {
        let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
        let rss_pages: usize = statm.split_whitespace().nth(1)?.parse().ok()?;
        Some(rss_pages * 4096 / (1024 * 1024))
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// How often (in given-clause selections) LRS re-estimates its budget.
const LRS_CHECK_INTERVAL: u64 = 50;

/// The saturation engine.
pub struct Saturation {
    pub env: Env,
    kbo: Kbo,
    options: Options,
    selector: LiteralSelector,
    pub arena: ClauseArena,
    unprocessed: UnprocessedQueue,
    passive: PassiveSet,
    active: ActiveSet,
    indexes: Indexes,
    limits: Limits,
    stats: Statistics,
    clock: Box<dyn Clock>,
    /// Cooperative cancellation (signals): set between steps to stop.
    pub cancel: Arc<AtomicBool>,
    inputs: Vec<ClauseInput>,
    refutation: Option<ClauseId>,
    /// (elapsed, selections) samples feeding the pop-rate estimate.
    samples: Vec<(Duration, u64)>,
    active_prune_pending: Rc<Cell<bool>>,
    passive_discard_pending: Rc<Cell<bool>>,
    _limit_subscriptions: Vec<Subscription>,
    baseline_rss_mb: usize,
}

impl Saturation {
    pub fn new(
        env: Env,
        kbo_config: KboConfig,
        inputs: Vec<ClauseInput>,
        options: Options,
    ) -> Result<Self, ConfigError> {
        Self::with_clock(env, kbo_config, inputs, options, Box::new(WallClock::new()))
    }

    /// Construct with an explicit clock (tests inject a manual one).
    pub fn with_clock(
        env: Env,
        kbo_config: KboConfig,
        inputs: Vec<ClauseInput>,
        options: Options,
        clock: Box<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        options.validate()?;

        let seed = options.random_seed;
        let coeff = options.nongoal_weight_coefficient;
        let (age_ratio, weight_ratio) = options.age_weight_ratio;

        let inner = match (&options.split_queue_ratios, &options.split_queue_cutoffs) {
            (Some(ratios), Some(cutoffs)) => Passive::Split(SplitQueuePassive::new(
                ratios,
                cutoffs,
                options.split_queue_fade_in,
                age_ratio,
                weight_ratio,
                coeff,
                seed,
            )),
            _ => Passive::AgeWeight(AgeWeightPassive::new(age_ratio, weight_ratio, coeff, seed)),
        };
        let passive = PassiveSet::new(inner);

        let limits = Limits::new();
        // Only the passive container and the active set react to limit
        // changes; the loop polls these flags after a tightening.
        let active_prune_pending = Rc::new(Cell::new(false));
        let passive_discard_pending = Rc::new(Cell::new(false));
        let ap = Rc::clone(&active_prune_pending);
        let pd = Rc::clone(&passive_discard_pending);
        let subscriptions = vec![
            limits.changed.subscribe(move |_| ap.set(true)),
            limits.changed.subscribe(move |_| pd.set(true)),
        ];

        let selector = LiteralSelector::new(options.selection);

        Ok(Saturation {
            env,
            kbo: Kbo::new(kbo_config),
            selector,
            unprocessed: UnprocessedQueue::new(options.unprocessed_lifo),
            passive,
            active: ActiveSet::new(),
            indexes: Indexes::new(),
            limits,
            stats: Statistics::default(),
            clock,
            cancel: Arc::new(AtomicBool::new(false)),
            inputs,
            refutation: None,
            samples: Vec::new(),
            active_prune_pending,
            passive_discard_pending,
            _limit_subscriptions: subscriptions,
            options,
            arena: ClauseArena::new(),
            baseline_rss_mb: process_memory_mb().unwrap_or(0),
        })
    }

    /// Does the simplifying clause set include Passive?
    fn simplify_with_passive(&self) -> bool {
        matches!(
            self.options.saturation_algorithm,
            SaturationAlgorithm::Otter | SaturationAlgorithm::Lrs
        )
    }

    /// Run the loop to termination.
    pub fn run(&mut self) -> SaturationResult {
        let inputs = std::mem::take(&mut self.inputs);
        let mut early = None;
        for input in inputs {
            self.stats.input_clauses += 1;
            if let Some(reason) = self.enqueue(input.literals, Inference {
                rule: input.role.rule(),
                parents: Vec::new(),
            }) {
                early = Some(reason);
                break;
            }
        }

        let termination = match early {
            Some(reason) => reason,
            None => loop {
                if let Some(reason) = self.step() {
                    break reason;
                }
            },
        };

        info!(
            "saturation finished: {:?} after {} selections",
            termination, self.stats.selected_clauses
        );
        self.stats.record_container_sizes(
            self.unprocessed.len(),
            self.passive.size_estimate(),
            self.active.len(),
        );

        SaturationResult {
            termination,
            refutation: self.refutation,
            statistics: self.stats.clone(),
        }
    }

    /// One iteration of the given-clause loop. `Some(reason)` ends the run.
    pub fn step(&mut self) -> Option<TerminationReason> {
        if let Some(reason) = self.check_resources() {
            return Some(reason);
        }

        // Drain Unprocessed through the forward simplifications.
        while let Some(id) = self.unprocessed.pop() {
            if self.arena.get(id).store != StoreTag::Unprocessed {
                continue;
            }
            self.arena.get_mut(id).store = StoreTag::None;
            if let Some(reason) = self.process_new(id) {
                return Some(reason);
            }
        }

        self.stats.record_container_sizes(
            self.unprocessed.len(),
            self.passive.size_estimate(),
            self.active.len(),
        );

        // Saturated?
        if self.passive.is_empty() {
            return Some(
                if self.options.complete && self.stats.discarded_non_redundant == 0 {
                    TerminationReason::Satisfiable
                } else {
                    TerminationReason::RefutationNotFound
                },
            );
        }

        // Select the given clause.
        let Some(given) = self.passive.pop_selected() else {
            // Non-empty passive must yield a clause; anything else is a
            // container bug.
            debug_assert!(false, "passive not empty but nothing selected");
            return Some(TerminationReason::Unknown);
        };
        self.stats.selected_clauses += 1;
        self.arena.get_mut(given).store = StoreTag::None;
        self.selector
            .select_clause(&self.env, &self.kbo, &mut self.arena, given);
        debug!(
            "given #{}: {}",
            given.as_u32(),
            self.arena.get(given).display(&self.env)
        );

        let generate = self.passive.children_potentially_fulfil_limits(
            &self.env,
            self.arena.get(given),
            &self.limits,
        );
        if !generate {
            self.stats.generation_skips += 1;
        }

        // Activate.
        self.arena.get_mut(given).store = StoreTag::Active;
        self.active.add(given);
        self.indexes
            .on_activated(&self.env, &self.kbo, &self.arena, given);
        if !self.simplify_with_passive() {
            self.indexes
                .on_simplifying_added(&self.env, &self.kbo, &self.arena, given);
        }

        // Backward simplification with the given clause.
        if let Some(reason) = self.backward_simplify(given) {
            return Some(reason);
        }

        // Generate.
        if generate {
            if let Some(reason) = self.generate(given) {
                return Some(reason);
            }
        }

        // LRS bookkeeping.
        if self.options.saturation_algorithm == SaturationAlgorithm::Lrs
            && self.stats.selected_clauses % LRS_CHECK_INTERVAL == 0
        {
            self.update_limits();
        }

        None
    }

    fn check_resources(&self) -> Option<TerminationReason> {
        if self.cancel.load(Ordering::Relaxed) {
            return Some(TerminationReason::TimeLimit);
        }
        if self.options.time_limit_ms > 0
            && self.clock.elapsed() > Duration::from_millis(self.options.time_limit_ms)
        {
            return Some(TerminationReason::TimeLimit);
        }
        if self.options.memory_limit_mb > 0 {
            if let Some(rss) = process_memory_mb() {
                if rss.saturating_sub(self.baseline_rss_mb) >= self.options.memory_limit_mb as usize
                {
                    return Some(TerminationReason::MemoryLimit);
                }
            }
        }
        None
    }

    /// Intern a conclusion and put it on the unprocessed queue. Returns
    /// `Refutation` when the conclusion is the empty clause.
    fn enqueue(
        &mut self,
        literals: Vec<LiteralId>,
        inference: Inference,
    ) -> Option<TerminationReason> {
        if literals.len() > self.options.max_clause_size {
            return None;
        }
        let id = self
            .arena
            .create(&mut self.env, &self.kbo, literals, inference);
        if !self.arena.get(id).inference.rule.is_input() {
            self.stats.generated_clauses += 1;
        }
        if self.arena.get(id).is_empty() {
            self.refutation = Some(id);
            return Some(TerminationReason::Refutation);
        }
        self.arena.get_mut(id).store = StoreTag::Unprocessed;
        self.unprocessed.add(id);
        None
    }

    /// Forward-simplify a clause fresh off the unprocessed queue and admit
    /// the survivor to Passive.
    fn process_new(&mut self, id: ClauseId) -> Option<TerminationReason> {
        let clause = self.arena.get(id);
        if clause.is_tautology(&self.env) {
            self.stats.tautologies_deleted += 1;
            return None;
        }
        let literals = clause.literals.clone();

        // Forward demodulation. The rewritten clause replaces the original
        // on the unprocessed queue.
        if let Some((rewritten, rule_clause)) = forward_demodulate(
            &mut self.env,
            &self.kbo,
            &self.indexes.demodulation_lhs,
            &literals,
            self.options.forward_demodulation,
            id,
        ) {
            self.stats.forward_demodulations += 1;
            return self.enqueue(
                rewritten,
                Inference::new(InferenceRule::ForwardDemodulation, vec![id, rule_clause]),
            );
        }

        // Condensation.
        if let Some(condensed) = condense(&mut self.env, &literals, self.options.condensation) {
            self.stats.condensations += 1;
            return self.enqueue(
                condensed,
                Inference::new(InferenceRule::Condensation, vec![id]),
            );
        }

        // Forward subsumption.
        let features = ClauseFeatures::of(&self.env, self.arena.get(id));
        if let Some(subsumer) = forward_subsumption(
            &self.env,
            &self.arena,
            &self.indexes.subsumption,
            &literals,
            &features,
            id,
        ) {
            debug!(
                "#{} forward subsumed by #{}",
                id.as_u32(),
                subsumer.as_u32()
            );
            self.stats.forward_subsumed += 1;
            return None;
        }

        // Subsumption resolution.
        if let Some((shortened, premise)) = forward_subsumption_resolution(
            &mut self.env,
            &self.arena,
            &self.indexes.subsumption,
            &literals,
            id,
        ) {
            self.stats.subsumption_resolutions += 1;
            return self.enqueue(
                shortened,
                Inference::new(InferenceRule::SubsumptionResolution, vec![id, premise]),
            );
        }

        // Admission to Passive; the limits may refuse the clause outright.
        if !self.passive.add(id, self.arena.get(id), &self.limits) {
            self.stats.discarded_non_redundant += 1;
            return None;
        }
        self.arena.get_mut(id).store = StoreTag::Passive;
        if self.simplify_with_passive() {
            self.indexes
                .on_simplifying_added(&self.env, &self.kbo, &self.arena, id);
        }
        None
    }

    /// Delete or rewrite older clauses that the given clause makes
    /// redundant.
    fn backward_simplify(&mut self, given: ClauseId) -> Option<TerminationReason> {
        // Backward demodulation: materialize first, then delete/replace.
        let rewrites = backward_demodulate(
            &mut self.env,
            &self.kbo,
            &self.arena,
            &self.indexes.demodulation_subterm,
            given,
            self.options.backward_demodulation,
        );
        for (target, new_literals) in rewrites {
            if self.arena.get(target).store == StoreTag::None {
                continue;
            }
            self.remove_clause(target);
            self.stats.backward_demodulations += 1;
            if let Some(reason) = self.enqueue(
                new_literals,
                Inference::new(InferenceRule::BackwardDemodulation, vec![given, target]),
            ) {
                return Some(reason);
            }
        }

        // Backward subsumption.
        let given_literals = self.arena.get(given).literals.clone();
        let subsumed = backward_subsumed(
            &self.env,
            &self.arena,
            &self.indexes.subsumption,
            &given_literals,
            self.options.backward_subsumption,
            given,
        );
        for target in subsumed {
            if self.arena.get(target).store == StoreTag::None {
                continue;
            }
            self.remove_clause(target);
            self.stats.backward_subsumed += 1;
        }
        None
    }

    /// Run every generating rule between the given clause and Active.
    fn generate(&mut self, given: ClauseId) -> Option<TerminationReason> {
        for rule in GeneratingRule::ALL {
            let conclusions =
                rule.generate(&mut self.env, &self.kbo, &self.arena, &self.indexes, given);
            for generated in conclusions {
                match rule {
                    GeneratingRule::Resolution => self.stats.resolutions += 1,
                    GeneratingRule::Factoring => self.stats.factorings += 1,
                    GeneratingRule::Superposition => self.stats.superpositions += 1,
                    GeneratingRule::EqualityResolution => self.stats.equality_resolutions += 1,
                    GeneratingRule::EqualityFactoring => self.stats.equality_factorings += 1,
                }
                if let Some(reason) = self.enqueue(
                    generated.literals,
                    Inference::new(generated.rule, generated.parents),
                ) {
                    return Some(reason);
                }
            }
        }
        None
    }

    /// Remove a clause from whichever container holds it and from the
    /// indexes that track that container.
    fn remove_clause(&mut self, id: ClauseId) {
        match self.arena.get(id).store {
            StoreTag::Active => {
                self.active.remove(id);
                self.indexes
                    .on_deactivated(&self.env, &self.kbo, &self.arena, id);
                self.indexes
                    .on_simplifying_removed(&self.env, &self.kbo, &self.arena, id);
            }
            StoreTag::Passive => {
                self.passive.remove(id);
                if self.simplify_with_passive() {
                    self.indexes
                        .on_simplifying_removed(&self.env, &self.kbo, &self.arena, id);
                }
            }
            StoreTag::Unprocessed | StoreTag::None => {}
        }
        self.arena.get_mut(id).store = StoreTag::None;
    }

    /// LRS: estimate how many clauses future pops can still select within
    /// the time budget and tighten the limits to match.
    fn update_limits(&mut self) {
        if self.options.time_limit_ms == 0 {
            return;
        }
        let elapsed = self.clock.elapsed();
        let limit = Duration::from_millis(self.options.time_limit_ms);
        let Some(remaining) = limit.checked_sub(elapsed) else {
            return;
        };
        self.samples.push((elapsed, self.stats.selected_clauses));

        // Pop rate over the configured trailing window of elapsed time.
        let window_start = elapsed.mul_f64(1.0 - self.options.lrs_sample_fraction);
        let base = self
            .samples
            .iter()
            .rev()
            .find(|(t, _)| *t <= window_start)
            .or_else(|| self.samples.first())
            .copied()
            .unwrap_or((Duration::ZERO, 0));
        let dt = elapsed.saturating_sub(base.0).as_secs_f64();
        if dt <= 0.0 {
            return;
        }
        let rate = (self.stats.selected_clauses - base.1) as f64 / dt;
        let predicted = (rate * remaining.as_secs_f64()).ceil() as usize;

        if predicted >= self.passive.size_estimate() {
            // Everything still fits in the budget.
            self.passive.set_limits_to_max();
            return;
        }

        self.passive.simulation_init();
        let mut simulated = 0usize;
        while simulated < predicted && self.passive.simulation_has_next() {
            self.passive.simulation_pop_selected();
            simulated += 1;
        }

        if self.passive.set_limits_from_simulation(&mut self.limits) {
            self.stats.limit_tightenings += 1;
            info!(
                "limits tightened: age {:?}, weight {:?} ({} predicted pops)",
                self.limits.age_limit(),
                self.limits.weight_limit(),
                predicted
            );

            if self.passive_discard_pending.replace(false) {
                let dropped = self.passive.drop_excluded(&self.arena, &self.limits);
                for id in dropped {
                    self.stats.discarded_non_redundant += 1;
                    if self.simplify_with_passive() {
                        self.indexes
                            .on_simplifying_removed(&self.env, &self.kbo, &self.arena, id);
                    }
                    self.arena.get_mut(id).store = StoreTag::None;
                }
            }

            if self.active_prune_pending.replace(false) {
                let prunable = self.active.prunable(
                    &self.env,
                    &self.arena,
                    &self.limits,
                    &self.indexes.generating_literals,
                    self.options.nongoal_weight_coefficient,
                );
                for id in prunable {
                    self.stats.discarded_non_redundant += 1;
                    self.remove_clause(id);
                }
            }
        }
    }

    // === Accessors (available after run()) ===

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn active_size(&self) -> usize {
        self.active.len()
    }

    pub fn passive_size(&self) -> usize {
        self.passive.size_estimate()
    }
}

/// Convenience wrapper: validate, run, and return the result with the
/// engine (env and arena intact for proof extraction).
pub fn saturate(
    env: Env,
    kbo_config: KboConfig,
    inputs: Vec<ClauseInput>,
    options: Options,
) -> Result<(SaturationResult, Saturation), ConfigError> {
    let mut engine = Saturation::new(env, kbo_config, inputs, options)?;
    let result = engine.run();
    Ok((result, engine))
}
