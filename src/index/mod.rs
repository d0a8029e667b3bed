//! Term and literal indexing.
//!
//! A discrimination trie answers unification, generalization, and instance
//! queries; the policy layer decides which positions of which clauses each
//! rule's index holds.

pub mod policies;
pub mod trie;

pub use policies::{
    rewritable_subterms, rewriting_sides, ClauseFeatures, DemodulationLhsIndex,
    DemodulationSubtermIndex, GeneratingLiteralIndex, Indexes, LiteralEntry, LiteralIndex,
    SubsumptionIndex, SuperpositionLhsIndex, SuperpositionSubtermIndex, TermEntry, TermIndex,
};
pub use trie::{DiscriminationTree, QueryIter};
