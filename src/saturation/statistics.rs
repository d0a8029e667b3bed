//! Run statistics: counters for every rule, container peaks, discards.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Statistics {
    pub input_clauses: u64,
    pub generated_clauses: u64,
    pub selected_clauses: u64,

    pub resolutions: u64,
    pub factorings: u64,
    pub superpositions: u64,
    pub equality_resolutions: u64,
    pub equality_factorings: u64,

    pub tautologies_deleted: u64,
    pub forward_subsumed: u64,
    pub backward_subsumed: u64,
    pub subsumption_resolutions: u64,
    pub forward_demodulations: u64,
    pub backward_demodulations: u64,
    pub condensations: u64,

    /// Clauses refused or dropped by the limited-resource strategy even
    /// though no redundancy argument covers them.
    pub discarded_non_redundant: u64,
    /// Given clauses whose generation was skipped because no child could
    /// pass the current limits.
    pub generation_skips: u64,
    pub limit_tightenings: u64,

    pub max_active_size: u64,
    pub max_passive_size: u64,
    pub max_unprocessed_size: u64,
    pub final_active_size: u64,
    pub final_passive_size: u64,
}

impl Statistics {
    pub fn record_container_sizes(&mut self, unprocessed: usize, passive: usize, active: usize) {
        self.max_unprocessed_size = self.max_unprocessed_size.max(unprocessed as u64);
        self.max_passive_size = self.max_passive_size.max(passive as u64);
        self.max_active_size = self.max_active_size.max(active as u64);
        self.final_passive_size = passive as u64;
        self.final_active_size = active as u64;
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "% input clauses:            {}", self.input_clauses)?;
        writeln!(f, "% generated clauses:        {}", self.generated_clauses)?;
        writeln!(f, "% selected (given) clauses: {}", self.selected_clauses)?;
        writeln!(f, "% resolutions:              {}", self.resolutions)?;
        writeln!(f, "% factorings:               {}", self.factorings)?;
        writeln!(f, "% superpositions:           {}", self.superpositions)?;
        writeln!(f, "% equality resolutions:     {}", self.equality_resolutions)?;
        writeln!(f, "% equality factorings:      {}", self.equality_factorings)?;
        writeln!(f, "% tautologies deleted:      {}", self.tautologies_deleted)?;
        writeln!(f, "% forward subsumed:         {}", self.forward_subsumed)?;
        writeln!(f, "% backward subsumed:        {}", self.backward_subsumed)?;
        writeln!(f, "% subsumption resolutions:  {}", self.subsumption_resolutions)?;
        writeln!(f, "% forward demodulations:    {}", self.forward_demodulations)?;
        writeln!(f, "% backward demodulations:   {}", self.backward_demodulations)?;
        writeln!(f, "% condensations:            {}", self.condensations)?;
        writeln!(f, "% non-redundant discards:   {}", self.discarded_non_redundant)?;
        writeln!(f, "% limit tightenings:        {}", self.limit_tightenings)?;
        writeln!(
            f,
            "% max active/passive size:  {}/{}",
            self.max_active_size, self.max_passive_size
        )?;
        write!(
            f,
            "% final active/passive:     {}/{}",
            self.final_active_size, self.final_passive_size
        )
    }
}
