//! Proof extraction from the derivation DAG.
//!
//! Every clause records its rule and parent ids, so the refutation is the
//! backward closure of the empty clause. Parents always precede children
//! in the arena, which makes creation order a topological order.

use crate::logic::{ClauseArena, ClauseId, Env};
use std::collections::HashSet;
use std::fmt;

/// Clause ids contributing to the derivation of `root`, in creation
/// (hence topological) order, `root` included.
pub fn derivation(arena: &ClauseArena, root: ClauseId) -> Vec<ClauseId> {
    let mut visited: HashSet<ClauseId> = HashSet::new();
    let mut to_visit = vec![root];
    while let Some(id) = to_visit.pop() {
        if !visited.insert(id) {
            continue;
        }
        to_visit.extend(arena.get(id).inference.parents.iter().copied());
    }
    let mut ids: Vec<ClauseId> = visited.into_iter().collect();
    ids.sort_unstable();
    ids
}

/// Printable refutation listing.
pub struct ProofDisplay<'a> {
    env: &'a Env,
    arena: &'a ClauseArena,
    steps: Vec<ClauseId>,
}

impl<'a> ProofDisplay<'a> {
    pub fn new(env: &'a Env, arena: &'a ClauseArena, root: ClauseId) -> Self {
        ProofDisplay {
            env,
            arena,
            steps: derivation(arena, root),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for ProofDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &id in &self.steps {
            let clause = self.arena.get(id);
            write!(f, "{}. {} [{}", id.as_u32(), clause.display(self.env), clause.inference.rule)?;
            for (i, parent) in clause.inference.parents.iter().enumerate() {
                if i == 0 {
                    write!(f, " ")?;
                } else {
                    write!(f, ",")?;
                }
                write!(f, "{}", parent.as_u32())?;
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}

/// Check that the derivation of `root` is well-formed: parents precede
/// children, input clauses have no parents, and derived clauses have at
/// least one. Used by tests when replaying proofs.
pub fn check_derivation(arena: &ClauseArena, root: ClauseId) -> bool {
    for id in derivation(arena, root) {
        let clause = arena.get(id);
        if clause.inference.rule.is_input() {
            if !clause.inference.parents.is_empty() {
                return false;
            }
        } else {
            if clause.inference.parents.is_empty() {
                return false;
            }
            if clause.inference.parents.iter().any(|&p| p >= id) {
                return false;
            }
        }
    }
    true
}
