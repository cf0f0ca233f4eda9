//! Scoring schemes and the score/distance conversions shared by both engines
use crate::error::ConfigError;

/// Integer scores for one alignment column type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringScheme {
    pub mat: i64, // match score (positive, even)
    pub mis: i64, // mismatch score (negative)
    pub ins: i64, // insertion score (negative)
    pub del: i64, // deletion score (negative)
}

impl ScoringScheme {
    /// Preset for comparing a collection against itself.
    /// Every difference costs 3 score units, which is what `score2distance` assumes.
    pub const SELF_COMPARE: ScoringScheme = ScoringScheme {
        mat: 2,
        mis: -1,
        ins: -2,
        del: -2,
    };

    /// Preset for comparing a collection against an external query
    pub const QUERY_COMPARE: ScoringScheme = ScoringScheme {
        mat: 2,
        mis: -2,
        ins: -3,
        del: -3,
    };

    /// Select the preset for the addressing mode
    pub fn preset(self_compare: bool) -> Self {
        if self_compare {
            Self::SELF_COMPARE
        } else {
            Self::QUERY_COMPARE
        }
    }

    /// Check that the scheme can drive the greedy X-drop recurrence:
    /// even match score and strictly positive difference costs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mat <= 0 || self.mat % 2 != 0 {
            return Err(ConfigError::InvalidScoring(format!(
                "match score {} must be positive and even",
                self.mat
            )));
        }
        let costs = self.difference_costs();
        if costs.mismatch <= 0 || costs.insertion <= 0 || costs.deletion <= 0 {
            return Err(ConfigError::InvalidScoring(format!(
                "scores {}:{}:{}:{} give non-positive difference costs",
                self.mat, self.mis, self.ins, self.del
            )));
        }
        Ok(())
    }

    /// Costs of each difference type relative to half a match per aligned character
    pub fn difference_costs(&self) -> DifferenceCosts {
        let half = self.mat / 2;
        DifferenceCosts {
            mismatch: self.mat - self.mis,
            insertion: half - self.ins,
            deletion: half - self.del,
        }
    }
}

/// Costs used by the X-drop fronts, derived from a `ScoringScheme`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifferenceCosts {
    pub mismatch: i64,
    pub insertion: i64,
    pub deletion: i64,
}

impl DifferenceCosts {
    pub fn max_cost(&self) -> i64 {
        self.mismatch.max(self.insertion).max(self.deletion)
    }
}

/// Convert an edit distance over `alignedlen` characters into a score
/// under the self-comparison ratios.
pub fn distance2score(distance: u64, alignedlen: u64) -> i64 {
    alignedlen as i64 - 3 * distance as i64
}

/// Approximate the edit distance of an alignment with the given score.
///
/// Only valid for scores produced under `ScoringScheme::SELF_COMPARE`.
/// Negative scores use `-(alignedlen + score) / 3`, floored at zero.
pub fn score2distance(score: i64, alignedlen: u64) -> u64 {
    let alignedlen = alignedlen as i64;
    if score >= 0 {
        assert!(
            alignedlen >= score,
            "score {score} exceeds aligned length {alignedlen}"
        );
        ((alignedlen - score) / 3) as u64
    } else {
        (-((alignedlen + score) / 3)).max(0) as u64
    }
}

/// Error rate in percent, counted against the combined length of both sequences.
/// An empty alignment has error rate 0.
pub fn error_rate(distance: u64, alignedlen: u64) -> f64 {
    if alignedlen == 0 {
        return 0.0;
    }
    200.0 * distance as f64 / alignedlen as f64
}
