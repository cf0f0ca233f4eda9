//! Statistics of band trimming in the greedy engine.

use log::info;

/// Counters collected while the greedy engine trims its fronts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrimStats {
    pub extensions: u64,           // extensions run
    pub fronts: u64,               // fronts computed
    pub diagonals: u64,            // front entries computed
    pub trimmed_by_history: u64,   // too few matches in the history window
    pub trimmed_by_length: u64,    // aligned length lagging the leading diagonal
    pub trimmed_dead: u64,         // band ends without a reachable entry
    pub max_band_width: u64,
    pub distance_sum: u64,
    pub max_distance: u64,
}

impl TrimStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_front(&mut self, width: u64) {
        self.fronts += 1;
        self.diagonals += width;
        self.max_band_width = self.max_band_width.max(width);
    }

    pub(crate) fn add_extension(&mut self, distance: u64) {
        self.extensions += 1;
        self.distance_sum += distance;
        self.max_distance = self.max_distance.max(distance);
    }

    pub fn total_trimmed(&self) -> u64 {
        self.trimmed_by_history + self.trimmed_by_length + self.trimmed_dead
    }

    pub fn mean_distance(&self) -> f64 {
        if self.extensions == 0 {
            0.0
        } else {
            self.distance_sum as f64 / self.extensions as f64
        }
    }

    /// Add the counters of another run
    pub fn merge(&mut self, other: &TrimStats) {
        self.extensions += other.extensions;
        self.fronts += other.fronts;
        self.diagonals += other.diagonals;
        self.trimmed_by_history += other.trimmed_by_history;
        self.trimmed_by_length += other.trimmed_by_length;
        self.trimmed_dead += other.trimmed_dead;
        self.max_band_width = self.max_band_width.max(other.max_band_width);
        self.distance_sum += other.distance_sum;
        self.max_distance = self.max_distance.max(other.max_distance);
    }

    pub fn log_summary(&self) {
        info!(
            "[greedy] trimming: {} extensions, {} fronts, {} diagonals, max band width {}",
            self.extensions, self.fronts, self.diagonals, self.max_band_width
        );
        info!(
            "[greedy] trimmed {} diagonals ({} by history, {} by length difference, {} dead)",
            self.total_trimmed(),
            self.trimmed_by_history,
            self.trimmed_by_length,
            self.trimmed_dead
        );
        info!(
            "[greedy] distance per extension: mean {:.2}, max {}",
            self.mean_distance(),
            self.max_distance
        );
    }
}
