//! Configuration options for seed extension.
//!
//! This module provides a builder pattern for the extension parameters:
//! tolerances, the extension engine, character access and reporting flags.

use std::fmt;
use std::str::FromStr;

use crate::access::CharAccessMode;
use crate::error::ConfigError;
use crate::params::{check_tolerances, MAX_HISTORY};

/// Which extension engine evaluates the seeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtensionEngineKind {
    /// Score-bounded greedy X-drop extension
    #[default]
    Xdrop,
    /// Banded edit-distance extension with front pruning
    Greedy,
}

impl FromStr for ExtensionEngineKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xdrop" => Ok(ExtensionEngineKind::Xdrop),
            "greedy" => Ok(ExtensionEngineKind::Greedy),
            other => Err(ConfigError::InvalidEngine(other.to_string())),
        }
    }
}

impl fmt::Display for ExtensionEngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtensionEngineKind::Xdrop => write!(f, "xdrop"),
            ExtensionEngineKind::Greedy => write!(f, "greedy"),
        }
    }
}

/// Configuration for seed extension.
///
/// # Default Values
/// - `engine`: X-drop
/// - `error_percentage`: 10
/// - `sensitivity`: 97
/// - `min_reportable_length`: 30
/// - `history`: 60
/// - `xdrop_below`, `max_aligned_len_diff`, `perc_mat_history`: 0 (derived from the tolerances)
/// - `char_access`: automatic
/// - `self_compare`: true
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedExtendConfig {
    /// Extension engine
    pub engine: ExtensionEngineKind,

    /// Maximal error rate of reported matches, in percent
    pub error_percentage: u64,

    /// Sensitivity of the extension heuristics, in [90, 100]
    pub sensitivity: u64,

    /// Minimal length of reported matches on each side
    pub min_reportable_length: u64,

    /// X-drop threshold; 0 derives it from the tolerances
    pub xdrop_below: i64,

    /// Greedy engine: tolerated aligned length lag behind the leading diagonal; 0 derives it
    pub max_aligned_len_diff: u64,

    /// Greedy engine: required percentage of matches in the history; 0 derives it
    pub perc_mat_history: u64,

    /// Greedy engine: columns in the match history, at most 64
    pub history: u64,

    /// How characters of the collection are read
    pub char_access: CharAccessMode,

    /// Compare the collection against itself rather than an external query
    pub self_compare: bool,

    /// Evaluate seeds without reporting matches
    pub silent: bool,

    /// Emit every seed before evaluating it
    pub verbose: bool,

    /// Assert that left and right extension outcomes are identical
    pub check_extend_symmetry: bool,

    /// Collect and log trimming statistics of the greedy engine
    pub trim_statistics: bool,

    /// Reconstruct the alignment of every accepted match (greedy engine)
    pub front_trace: bool,
}

impl Default for SeedExtendConfig {
    fn default() -> Self {
        SeedExtendConfig {
            engine: ExtensionEngineKind::Xdrop,
            error_percentage: 10,
            sensitivity: 97,
            min_reportable_length: 30,
            xdrop_below: 0,
            max_aligned_len_diff: 0,
            perc_mat_history: 0,
            history: 60,
            char_access: CharAccessMode::Automatic,
            self_compare: true,
            silent: false,
            verbose: false,
            check_extend_symmetry: false,
            trim_statistics: false,
            front_trace: false,
        }
    }
}

impl SeedExtendConfig {
    /// Creates a new configuration builder.
    ///
    /// # Example
    /// ```
    /// use seedext::{ExtensionEngineKind, SeedExtendConfig};
    ///
    /// let config = SeedExtendConfig::builder()
    ///     .engine(ExtensionEngineKind::Greedy)
    ///     .error_percentage(15)
    ///     .min_reportable_length(50)
    ///     .build();
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn builder() -> SeedExtendConfigBuilder {
        SeedExtendConfigBuilder::default()
    }

    /// Range checks that do not need the parameter table
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_tolerances(self.error_percentage, self.sensitivity)?;
        if self.engine == ExtensionEngineKind::Greedy && (self.history == 0 || self.history > MAX_HISTORY) {
            return Err(ConfigError::HistoryOutOfRange(self.history));
        }
        Ok(())
    }
}

/// Builder for constructing SeedExtendConfig instances.
#[derive(Debug, Default)]
pub struct SeedExtendConfigBuilder {
    config: SeedExtendConfig,
}

impl SeedExtendConfigBuilder {
    /// Sets the extension engine.
    /// Default: X-drop
    pub fn engine(mut self, engine: ExtensionEngineKind) -> Self {
        self.config.engine = engine;
        self
    }

    /// Sets the maximal error percentage of reported matches.
    /// Default: 10
    pub fn error_percentage(mut self, percentage: u64) -> Self {
        self.config.error_percentage = percentage;
        self
    }

    /// Sets the sensitivity.
    /// Default: 97
    pub fn sensitivity(mut self, sensitivity: u64) -> Self {
        self.config.sensitivity = sensitivity;
        self
    }

    /// Sets the minimal reportable length.
    /// Default: 30
    pub fn min_reportable_length(mut self, length: u64) -> Self {
        self.config.min_reportable_length = length;
        self
    }

    /// Sets an explicit X-drop threshold instead of deriving it.
    pub fn xdrop_below(mut self, score: i64) -> Self {
        self.config.xdrop_below = score;
        self
    }

    /// Sets both greedy thresholds explicitly instead of deriving them.
    pub fn greedy_thresholds(mut self, max_aligned_len_diff: u64, perc_mat_history: u64) -> Self {
        self.config.max_aligned_len_diff = max_aligned_len_diff;
        self.config.perc_mat_history = perc_mat_history;
        self
    }

    /// Sets the match history length of the greedy engine.
    /// Default: 60
    pub fn history(mut self, history: u64) -> Self {
        self.config.history = history;
        self
    }

    /// Sets the character access mode.
    /// Default: automatic
    pub fn char_access(mut self, mode: CharAccessMode) -> Self {
        self.config.char_access = mode;
        self
    }

    /// Selects self-comparison or comparison against a query.
    /// Default: self-comparison
    pub fn self_compare(mut self, enable: bool) -> Self {
        self.config.self_compare = enable;
        self
    }

    pub fn silent(mut self, enable: bool) -> Self {
        self.config.silent = enable;
        self
    }

    pub fn verbose(mut self, enable: bool) -> Self {
        self.config.verbose = enable;
        self
    }

    pub fn check_extend_symmetry(mut self, enable: bool) -> Self {
        self.config.check_extend_symmetry = enable;
        self
    }

    pub fn trim_statistics(mut self, enable: bool) -> Self {
        self.config.trim_statistics = enable;
        self
    }

    pub fn front_trace(mut self, enable: bool) -> Self {
        self.config.front_trace = enable;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> SeedExtendConfig {
        self.config
    }
}
