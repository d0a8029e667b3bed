//! Age and weight limits shared between the passive container, the active
//! set, and the limited-resource strategy.

use crate::events::Event;
use crate::logic::Clause;

/// Direction of a limits update, delivered through `Limits::changed`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LimitsChange {
    Tightened,
    Loosened,
}

/// Shared selection limits. `None` means unlimited.
///
/// Only the LRS passive container and the active set react to `changed`.
/// Limits are monotonically non-increasing over a run: `update` clamps new
/// values to the current ones.
pub struct Limits {
    age_limit: Option<u32>,
    weight_limit: Option<u32>,
    pub changed: Event<LimitsChange>,
}

impl Default for Limits {
    fn default() -> Self {
        Limits::new()
    }
}

impl Limits {
    pub fn new() -> Self {
        Limits {
            age_limit: None,
            weight_limit: None,
            changed: Event::new(),
        }
    }

    pub fn age_limit(&self) -> Option<u32> {
        self.age_limit
    }

    pub fn weight_limit(&self) -> Option<u32> {
        self.weight_limit
    }

    pub fn age_limited(&self) -> bool {
        self.age_limit.is_some()
    }

    pub fn weight_limited(&self) -> bool {
        self.weight_limit.is_some()
    }

    /// Does a clause of this age pass the age limit?
    pub fn fulfils_age_limit(&self, age: u32) -> bool {
        self.age_limit.map_or(true, |limit| age <= limit)
    }

    /// Does a clause of this effective weight pass the weight limit?
    pub fn fulfils_weight_limit(&self, effective_weight: u32) -> bool {
        self.weight_limit
            .map_or(true, |limit| effective_weight <= limit)
    }

    /// Tighten the limits to at most the given values and notify
    /// subscribers. Returns `true` if either limit actually changed.
    pub fn tighten(&mut self, age: Option<u32>, weight: Option<u32>) -> bool {
        let new_age = min_limit(self.age_limit, age);
        let new_weight = min_limit(self.weight_limit, weight);
        if new_age == self.age_limit && new_weight == self.weight_limit {
            return false;
        }
        self.age_limit = new_age;
        self.weight_limit = new_weight;
        self.changed.fire(&LimitsChange::Tightened);
        true
    }
}

fn min_limit(current: Option<u32>, incoming: Option<u32>) -> Option<u32> {
    match (current, incoming) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, b) => b,
    }
}

/// Weight of a clause as seen by passive selection.
///
/// The formula is strategy-configured data: clauses not derived from the
/// goal are inflated by the non-goal weight coefficient, making them less
/// attractive to the weight queue and to the weight limit.
pub fn effective_weight(clause: &Clause, nongoal_coefficient: f32) -> u32 {
    if clause.derived_from_goal || nongoal_coefficient == 1.0 {
        clause.weight
    } else {
        (clause.weight as f32 * nongoal_coefficient).ceil() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_unlimited_by_default() {
        let limits = Limits::new();
        assert!(!limits.age_limited());
        assert!(!limits.weight_limited());
        assert!(limits.fulfils_age_limit(u32::MAX));
        assert!(limits.fulfils_weight_limit(u32::MAX));
    }

    #[test]
    fn test_tighten_fires_changed() {
        let mut limits = Limits::new();
        let fired = Rc::new(Cell::new(0u32));

        let f = Rc::clone(&fired);
        let _sub = limits.changed.subscribe(move |change| {
            assert_eq!(*change, LimitsChange::Tightened);
            f.set(f.get() + 1);
        });

        assert!(limits.tighten(Some(10), Some(50)));
        assert_eq!(fired.get(), 1);
        assert!(limits.fulfils_age_limit(10));
        assert!(!limits.fulfils_age_limit(11));
        assert!(!limits.fulfils_weight_limit(51));
    }

    #[test]
    fn test_limits_monotone() {
        let mut limits = Limits::new();
        assert!(limits.tighten(Some(10), Some(50)));
        // Looser values are clamped to the current limits
        assert!(!limits.tighten(Some(20), Some(80)));
        assert_eq!(limits.age_limit(), Some(10));
        assert_eq!(limits.weight_limit(), Some(50));

        assert!(limits.tighten(Some(5), None));
        assert_eq!(limits.age_limit(), Some(5));
        assert_eq!(limits.weight_limit(), Some(50));
    }

    #[test]
    fn test_no_event_without_change() {
        let mut limits = Limits::new();
        limits.tighten(Some(10), Some(50));

        let fired = Rc::new(Cell::new(false));
        let f = Rc::clone(&fired);
        let _sub = limits.changed.subscribe(move |_| f.set(true));

        assert!(!limits.tighten(Some(10), Some(50)));
        assert!(!fired.get());
    }
}
