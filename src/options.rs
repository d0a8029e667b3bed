//! Strategy options and their validation.
//!
//! All option parsing and consistency checking happens before the
//! saturation loop starts; the loop itself never fails, it only
//! terminates with a reason.

use crate::inference::{BackwardSubsumptionMode, DemodulationMode};
use crate::inference::condensation::CondensationMode;
use crate::selection::{policy_is_complete, SELECTION_POLICIES};
use thiserror::Error;

/// The saturation loop variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaturationAlgorithm {
    /// Forward/backward simplification against Active ∪ Passive.
    #[default]
    Otter,
    /// Simplification against Active only.
    Discount,
    /// Otter plus the limited-resource strategy.
    Lrs,
}

/// Malformed or inconsistent options. Reported before saturation starts.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("unknown selection policy {0} (expected one of 0, 20, 21, 22, 30)")]
    UnknownSelection(u32),

    #[error("age-weight ratio must have a positive component")]
    ZeroAgeWeightRatio,

    #[error("split queue needs at least two ratios (e.g. '10,1')")]
    SplitQueueTooFew,

    #[error("split queue ratios ({ratios}) and cutoffs ({cutoffs}) differ in length")]
    SplitQueueLengthMismatch { ratios: usize, cutoffs: usize },

    #[error("split queue ratios must be positive integers")]
    SplitQueueRatioNotPositive,

    #[error("split queue cutoffs must lie in [0.0, 1.0]")]
    SplitQueueCutoffOutOfRange,

    #[error("split queue cutoffs must be strictly increasing")]
    SplitQueueCutoffsNotIncreasing,

    #[error("the last split queue cutoff must be 1.0")]
    SplitQueueLastCutoffNotOne,

    #[error("non-goal weight coefficient must be at least 1.0")]
    NonGoalCoefficientTooSmall,

    #[error("lrs sample fraction must lie in (0.0, 1.0]")]
    LrsSampleFractionOutOfRange,

    #[error("option '{option}' breaks completeness but 'complete' is set")]
    IncompleteOption { option: &'static str },
}

/// The options bundle consumed by the saturation core.
#[derive(Debug, Clone)]
pub struct Options {
    pub saturation_algorithm: SaturationAlgorithm,
    /// Age : weight selection ratio of the passive queue.
    pub age_weight_ratio: (u32, u32),
    /// Literal selection policy from the fixed table.
    pub selection: u32,
    /// Enable the split-queue passive container.
    pub split_queue_ratios: Option<Vec<u32>>,
    pub split_queue_cutoffs: Option<Vec<f32>>,
    pub split_queue_fade_in: bool,
    pub backward_subsumption: BackwardSubsumptionMode,
    pub forward_demodulation: DemodulationMode,
    pub backward_demodulation: DemodulationMode,
    pub condensation: CondensationMode,
    /// If set, options that lose refutation completeness are rejected and
    /// exhausting the search space reports satisfiability.
    pub complete: bool,
    /// 0 disables the memory check.
    pub memory_limit_mb: u32,
    /// 0 disables the time check.
    pub time_limit_ms: u64,
    pub random_seed: u64,
    /// Pop the unprocessed queue LIFO instead of FIFO.
    pub unprocessed_lifo: bool,
    /// Weight multiplier for clauses not derived from the goal.
    pub nongoal_weight_coefficient: f32,
    /// Portion of the elapsed time the LRS pop-rate estimate looks back
    /// over.
    pub lrs_sample_fraction: f64,
    /// Generated clauses longer than this are dropped outright.
    pub max_clause_size: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            saturation_algorithm: SaturationAlgorithm::Otter,
            age_weight_ratio: (1, 4),
            selection: 21,
            split_queue_ratios: None,
            split_queue_cutoffs: None,
            split_queue_fade_in: false,
            backward_subsumption: BackwardSubsumptionMode::On,
            forward_demodulation: DemodulationMode::On,
            backward_demodulation: DemodulationMode::On,
            condensation: CondensationMode::Off,
            complete: true,
            memory_limit_mb: 0,
            time_limit_ms: 60_000,
            random_seed: 1,
            unprocessed_lifo: false,
            nongoal_weight_coefficient: 1.0,
            lrs_sample_fraction: 0.05,
            max_clause_size: 100,
        }
    }
}

impl Options {
    /// Check the bundle for consistency. Runs once, before the loop.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SELECTION_POLICIES.contains(&self.selection) {
            return Err(ConfigError::UnknownSelection(self.selection));
        }
        if self.age_weight_ratio == (0, 0) {
            return Err(ConfigError::ZeroAgeWeightRatio);
        }

        match (&self.split_queue_ratios, &self.split_queue_cutoffs) {
            (None, None) => {}
            (ratios, cutoffs) => {
                let ratios = ratios.as_deref().unwrap_or(&[]);
                let cutoffs = cutoffs.as_deref().unwrap_or(&[]);
                if ratios.len() != cutoffs.len() {
                    return Err(ConfigError::SplitQueueLengthMismatch {
                        ratios: ratios.len(),
                        cutoffs: cutoffs.len(),
                    });
                }
                if ratios.len() < 2 {
                    return Err(ConfigError::SplitQueueTooFew);
                }
                if ratios.iter().any(|&r| r == 0) {
                    return Err(ConfigError::SplitQueueRatioNotPositive);
                }
                if cutoffs.iter().any(|&c| !(0.0..=1.0).contains(&c)) {
                    return Err(ConfigError::SplitQueueCutoffOutOfRange);
                }
                if cutoffs.windows(2).any(|w| w[1] <= w[0]) {
                    return Err(ConfigError::SplitQueueCutoffsNotIncreasing);
                }
                if *cutoffs.last().expect("len >= 2") != 1.0 {
                    return Err(ConfigError::SplitQueueLastCutoffNotOne);
                }
            }
        }

        if self.nongoal_weight_coefficient < 1.0 {
            return Err(ConfigError::NonGoalCoefficientTooSmall);
        }
        if !(self.lrs_sample_fraction > 0.0 && self.lrs_sample_fraction <= 1.0) {
            return Err(ConfigError::LrsSampleFractionOutOfRange);
        }

        if self.complete {
            if !policy_is_complete(self.selection) {
                return Err(ConfigError::IncompleteOption {
                    option: "selection",
                });
            }
            if self.saturation_algorithm == SaturationAlgorithm::Lrs {
                return Err(ConfigError::IncompleteOption {
                    option: "saturation_algorithm=lrs",
                });
            }
        }

        Ok(())
    }

    pub fn uses_split_queue(&self) -> bool {
        self.split_queue_ratios.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert_eq!(Options::default().validate(), Ok(()));
    }

    #[test]
    fn test_split_queue_validation() {
        let mut options = Options::default();
        options.split_queue_ratios = Some(vec![1, 2]);
        options.split_queue_cutoffs = Some(vec![0.5, 1.0]);
        assert_eq!(options.validate(), Ok(()));

        // Length mismatch
        options.split_queue_cutoffs = Some(vec![1.0]);
        assert_eq!(
            options.validate(),
            Err(ConfigError::SplitQueueLengthMismatch {
                ratios: 2,
                cutoffs: 1
            })
        );

        // Too few entries
        options.split_queue_ratios = Some(vec![1]);
        options.split_queue_cutoffs = Some(vec![1.0]);
        assert_eq!(options.validate(), Err(ConfigError::SplitQueueTooFew));

        // Non-monotone cutoffs
        options.split_queue_ratios = Some(vec![1, 2, 3]);
        options.split_queue_cutoffs = Some(vec![0.5, 0.3, 1.0]);
        assert_eq!(
            options.validate(),
            Err(ConfigError::SplitQueueCutoffsNotIncreasing)
        );

        // Last cutoff must be 1.0
        options.split_queue_cutoffs = Some(vec![0.2, 0.5, 0.9]);
        assert_eq!(
            options.validate(),
            Err(ConfigError::SplitQueueLastCutoffNotOne)
        );

        // Zero ratio
        options.split_queue_ratios = Some(vec![0, 2, 3]);
        options.split_queue_cutoffs = Some(vec![0.2, 0.5, 1.0]);
        assert_eq!(
            options.validate(),
            Err(ConfigError::SplitQueueRatioNotPositive)
        );
    }

    #[test]
    fn test_complete_rejects_incomplete_options() {
        let mut options = Options::default();
        options.selection = 30;
        assert!(matches!(
            options.validate(),
            Err(ConfigError::IncompleteOption { .. })
        ));

        options.selection = 21;
        options.saturation_algorithm = SaturationAlgorithm::Lrs;
        assert!(matches!(
            options.validate(),
            Err(ConfigError::IncompleteOption { .. })
        ));

        // Dropping completeness admits both
        options.complete = false;
        options.selection = 30;
        assert_eq!(options.validate(), Ok(()));
    }

    #[test]
    fn test_zero_ratio_rejected() {
        let mut options = Options::default();
        options.age_weight_ratio = (0, 0);
        assert_eq!(options.validate(), Err(ConfigError::ZeroAgeWeightRatio));
    }

    #[test]
    fn test_unknown_selection_rejected() {
        let mut options = Options::default();
        options.selection = 7;
        assert_eq!(options.validate(), Err(ConfigError::UnknownSelection(7)));
    }
}
