//! Error types for the seed extension engine.

use thiserror::Error;

/// Result type alias for seed extension operations.
pub type Result<T> = std::result::Result<T, SeedExtendError>;

/// Problems detected while building an extension context.
///
/// These are always raised at construction time, never in the middle of a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Sensitivity outside the tabulated range
    #[error("sensitivity {0} out of range: must be in [90, 100]")]
    SensitivityOutOfRange(u64),

    /// Error percentage outside the tabulated range
    #[error("error percentage {value} out of range: must be in [0, {max}]")]
    ErrorPercentageOutOfRange { value: u64, max: u64 },

    /// History window does not fit the match history bit-vector
    #[error("history {0} out of range: must be in [1, 64]")]
    HistoryOutOfRange(u64),

    /// Percentage of matches in the history window outside [1, 100]
    #[error("percentage of matches in history {0} out of range: must be in [1, 100]")]
    PercMatHistoryOutOfRange(u64),

    /// Only one of the two greedy parameters was given explicitly
    #[error(
        "unsupported combination: max aligned length difference ({max_aligned_len_diff}) and \
         percentage of matches in history ({perc_mat_history}) must both be set or both be derived"
    )]
    PartialGreedyParams {
        max_aligned_len_diff: u64,
        perc_mat_history: u64,
    },

    /// Minimum number of matches in the history window would be zero
    #[error("history {history} with {perc_mat_history}% matches gives no required matches")]
    NoRequiredMatches { history: u64, perc_mat_history: u64 },

    /// Unknown character access mode string
    #[error("illegal parameter for character access mode '{0}': possible values: encseq, encseq_reader")]
    InvalidCharAccessMode(String),

    /// Unknown extension engine name
    #[error("unknown extension engine '{0}': possible values: xdrop, greedy")]
    InvalidEngine(String),

    /// Scoring scheme cannot drive the greedy X-drop recurrence
    #[error("invalid scoring scheme: {0}")]
    InvalidScoring(String),

    /// Parameter table has the wrong shape or contains unusable entries
    #[error("invalid parameter table: {0}")]
    InvalidTable(String),
}

/// Errors that can occur while evaluating seeds.
#[derive(Error, Debug)]
pub enum SeedExtendError {
    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    /// The greedy engine could not make any progress on the region
    #[error("cannot align sequences: no progress possible on region of lengths {ulen} and {vlen}")]
    AlgorithmicNonTermination { ulen: usize, vlen: usize },

    /// The match reporter failed; aborts the run
    #[error("match reporter failed: {0}")]
    Reporter(anyhow::Error),
}
