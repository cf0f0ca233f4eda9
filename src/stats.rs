//! Counters of a seed extension run.

use log::info;

/// What happened to the seeds of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionStats {
    pub seeds: u64,
    pub overlapping: u64,      // rejected before any extension
    pub too_erroneous: u64,    // error rate above the tolerance
    pub too_short: u64,        // aligned length below twice the reportable length
    pub accepted: u64,
    pub reported: u64,         // accepted and handed to the reporter
    pub left_extensions: u64,
    pub right_extensions: u64,
    pub skipped: u64,          // abandoned after the engine could not make progress
}

impl ExtensionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extensions(&self) -> u64 {
        self.left_extensions + self.right_extensions
    }

    /// Add the counters of another run
    pub fn merge(&mut self, other: &ExtensionStats) {
        self.seeds += other.seeds;
        self.overlapping += other.overlapping;
        self.too_erroneous += other.too_erroneous;
        self.too_short += other.too_short;
        self.accepted += other.accepted;
        self.reported += other.reported;
        self.left_extensions += other.left_extensions;
        self.right_extensions += other.right_extensions;
        self.skipped += other.skipped;
    }

    pub fn log_summary(&self) {
        info!(
            "[seed-extend] {} seeds: {} overlapping, {} too erroneous, {} too short, {} skipped",
            self.seeds, self.overlapping, self.too_erroneous, self.too_short, self.skipped
        );
        info!(
            "[seed-extend] {} accepted, {} reported, {} left and {} right extensions",
            self.accepted, self.reported, self.left_extensions, self.right_extensions
        );
    }
}
