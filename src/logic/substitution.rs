//! Variable substitutions with trail-based backtracking.

use super::term::TermId;
use std::collections::HashMap;

/// A substitution mapping variable indices to terms.
///
/// Bindings go through `bind`, which records the variable on a trail so
/// that unification and subsumption search can undo partial bindings with
/// `mark`/`backtrack`.
#[derive(Debug, Clone, Default)]
pub struct Substitution {
    map: HashMap<u32, TermId>,
    trail: Vec<u32>,
}

impl Substitution {
    pub fn new() -> Self {
        Substitution::default()
    }

    /// Bind a variable, recording it on the trail.
    #[inline]
    pub fn bind(&mut self, var: u32, term: TermId) {
        debug_assert!(!self.map.contains_key(&var));
        self.trail.push(var);
        self.map.insert(var, term);
    }

    /// Get the binding of a variable, if any.
    #[inline]
    pub fn get(&self, var: u32) -> Option<TermId> {
        self.map.get(&var).copied()
    }

    /// Save the current trail position for later backtrack.
    #[inline]
    pub fn mark(&self) -> usize {
        self.trail.len()
    }

    /// Undo bindings back to a saved trail position.
    pub fn backtrack(&mut self, mark: usize) {
        while self.trail.len() > mark {
            let var = self.trail.pop().expect("trail is non-empty");
            self.map.remove(&var);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.trail.clear();
    }
}
