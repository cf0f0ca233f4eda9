//! Derivation of internal extension thresholds from user-facing tolerances.
//!
//! The error percentage and sensitivity select one entry of a parameter table.
//! The table is an explicit value handed to the extension context at
//! construction; every lookup is bounds-checked.

use crate::error::ConfigError;

/// Minimum identity a reportable match can have, in percent
pub const MIN_IDENTITY_PERCENTAGE: u64 = 70;

/// Largest supported error percentage
pub const MAX_ERROR_PERCENTAGE: u64 = 100 - MIN_IDENTITY_PERCENTAGE;

pub const MIN_SENSITIVITY: u64 = 90;
pub const MAX_SENSITIVITY: u64 = 100;

/// Largest history window; the match history is kept in a `u64`
pub const MAX_HISTORY: u64 = 64;

/// One calibrated parameter set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterEntry {
    pub xdrop_below: i64,
    pub perc_mat_history: u64,
    pub max_aligned_len_diff: u64,
}

/// Parameter table indexed by `(sensitivity - 90, error_percentage)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterTable {
    rows: Vec<Vec<ParameterEntry>>,
}

impl ParameterTable {
    /// The built-in calibration.
    ///
    /// Thresholds grow with the tolerated error rate and with sensitivity:
    /// higher sensitivity tolerates longer low-scoring stretches before
    /// giving up and accepts a lower match density in the history window.
    pub fn calibrated() -> Self {
        let rows = (MIN_SENSITIVITY..=MAX_SENSITIVITY)
            .map(|sensitivity| {
                let s = sensitivity - MIN_SENSITIVITY;
                (0..=MAX_ERROR_PERCENTAGE)
                    .map(|e| ParameterEntry {
                        xdrop_below: (5 + 2 * e + s * (e + 5) / 10) as i64,
                        perc_mat_history: 100u64
                            .saturating_sub(e + s * e / 20 + s / 2)
                            .max(1),
                        max_aligned_len_diff: 1 + e / 3 + s / 2,
                    })
                    .collect()
            })
            .collect();
        ParameterTable { rows }
    }

    /// Build a table from explicit rows, one row per sensitivity in [90, 100],
    /// one entry per error percentage in [0, 30].
    pub fn from_rows(rows: Vec<Vec<ParameterEntry>>) -> Result<Self, ConfigError> {
        let expected_rows = (MAX_SENSITIVITY - MIN_SENSITIVITY + 1) as usize;
        if rows.len() != expected_rows {
            return Err(ConfigError::InvalidTable(format!(
                "expected {expected_rows} sensitivity rows, got {}",
                rows.len()
            )));
        }
        let expected_cols = (MAX_ERROR_PERCENTAGE + 1) as usize;
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != expected_cols {
                return Err(ConfigError::InvalidTable(format!(
                    "row for sensitivity {} has {} entries, expected {expected_cols}",
                    MIN_SENSITIVITY + idx as u64,
                    row.len()
                )));
            }
            if let Some(entry) = row
                .iter()
                .find(|entry| entry.xdrop_below <= 0 || !(1..=100).contains(&entry.perc_mat_history))
            {
                return Err(ConfigError::InvalidTable(format!(
                    "unusable entry {entry:?} for sensitivity {}",
                    MIN_SENSITIVITY + idx as u64
                )));
            }
        }
        Ok(ParameterTable { rows })
    }

    /// Look up the entry for the given tolerances
    pub fn entry(&self, error_percentage: u64, sensitivity: u64) -> Result<&ParameterEntry, ConfigError> {
        check_tolerances(error_percentage, sensitivity)?;
        let row = &self.rows[(sensitivity - MIN_SENSITIVITY) as usize];
        Ok(&row[error_percentage as usize])
    }
}

impl Default for ParameterTable {
    fn default() -> Self {
        Self::calibrated()
    }
}

/// Validate error percentage and sensitivity against the tabulated ranges
pub fn check_tolerances(error_percentage: u64, sensitivity: u64) -> Result<(), ConfigError> {
    if !(MIN_SENSITIVITY..=MAX_SENSITIVITY).contains(&sensitivity) {
        return Err(ConfigError::SensitivityOutOfRange(sensitivity));
    }
    if error_percentage > MAX_ERROR_PERCENTAGE {
        return Err(ConfigError::ErrorPercentageOutOfRange {
            value: error_percentage,
            max: MAX_ERROR_PERCENTAGE,
        });
    }
    Ok(())
}

/// X-drop score threshold; a non-zero `explicit` value is used verbatim
pub fn derive_xdrop_threshold(
    table: &ParameterTable,
    explicit: i64,
    error_percentage: u64,
    sensitivity: u64,
) -> Result<i64, ConfigError> {
    if explicit != 0 {
        return Ok(explicit);
    }
    Ok(table.entry(error_percentage, sensitivity)?.xdrop_below)
}

/// Resolve `(max_aligned_len_diff, perc_mat_history)` for the greedy engine.
///
/// Both zero: both come from the table. Both non-zero: both are used as given.
/// Anything else is rejected.
pub fn derive_greedy_params(
    table: &ParameterTable,
    explicit_max_aligned_len_diff: u64,
    explicit_perc_mat_history: u64,
    error_percentage: u64,
    sensitivity: u64,
) -> Result<(u64, u64), ConfigError> {
    match (explicit_max_aligned_len_diff, explicit_perc_mat_history) {
        (0, 0) => {
            let entry = table.entry(error_percentage, sensitivity)?;
            Ok((entry.max_aligned_len_diff, entry.perc_mat_history))
        }
        (diff, perc) if diff > 0 && perc > 0 => {
            if perc > 100 {
                return Err(ConfigError::PercMatHistoryOutOfRange(perc));
            }
            Ok((diff, perc))
        }
        (diff, perc) => Err(ConfigError::PartialGreedyParams {
            max_aligned_len_diff: diff,
            perc_mat_history: perc,
        }),
    }
}

/// Resolved thresholds of the greedy engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GreedyParams {
    pub history: u64,
    pub perc_mat_history: u64,
    pub max_aligned_len_diff: u64,
    pub min_match_num: u64,
}

impl GreedyParams {
    pub fn new(
        history: u64,
        perc_mat_history: u64,
        max_aligned_len_diff: u64,
    ) -> Result<Self, ConfigError> {
        if history == 0 || history > MAX_HISTORY {
            return Err(ConfigError::HistoryOutOfRange(history));
        }
        if !(1..=100).contains(&perc_mat_history) {
            return Err(ConfigError::PercMatHistoryOutOfRange(perc_mat_history));
        }
        let min_match_num = history * perc_mat_history / 100;
        if min_match_num == 0 {
            return Err(ConfigError::NoRequiredMatches {
                history,
                perc_mat_history,
            });
        }
        Ok(GreedyParams {
            history,
            perc_mat_history,
            max_aligned_len_diff,
            min_match_num,
        })
    }

    /// Loosen the thresholds by `steps`.
    ///
    /// Panics if the required number of matches drops to zero.
    pub fn relax(&mut self, steps: u64) {
        self.max_aligned_len_diff += steps;
        if steps < self.perc_mat_history {
            self.perc_mat_history -= steps;
        } else {
            self.perc_mat_history = 1;
        }
        self.min_match_num = self.history * self.perc_mat_history / 100;
        assert!(
            self.min_match_num > 0,
            "relaxing by {steps} leaves no required matches in history {}",
            self.history
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibrated_table_shape_and_monotonicity() {
        let table = ParameterTable::calibrated();
        assert!(ParameterTable::from_rows(table.rows.clone()).is_ok());

        for s in MIN_SENSITIVITY..=MAX_SENSITIVITY {
            for e in 1..=MAX_ERROR_PERCENTAGE {
                let prev = table.entry(e - 1, s).unwrap();
                let cur = table.entry(e, s).unwrap();
                assert!(cur.xdrop_below >= prev.xdrop_below);
                assert!(cur.perc_mat_history <= prev.perc_mat_history);
                assert!(cur.max_aligned_len_diff >= prev.max_aligned_len_diff);
            }
        }
        let strict = table.entry(0, 90).unwrap();
        assert_eq!(strict.perc_mat_history, 100);
        assert_eq!(strict.max_aligned_len_diff, 1);
    }

    #[test]
    fn test_lookup_out_of_range() {
        let table = ParameterTable::calibrated();
        assert_eq!(
            table.entry(10, 89),
            Err(ConfigError::SensitivityOutOfRange(89))
        );
        assert_eq!(
            table.entry(10, 101),
            Err(ConfigError::SensitivityOutOfRange(101))
        );
        assert_eq!(
            table.entry(31, 95),
            Err(ConfigError::ErrorPercentageOutOfRange { value: 31, max: 30 })
        );
    }

    #[test]
    fn test_explicit_xdrop_threshold_wins() {
        let table = ParameterTable::calibrated();
        // verbatim even with out of range tolerances
        assert_eq!(derive_xdrop_threshold(&table, 42, 99, 0), Ok(42));
        let derived = derive_xdrop_threshold(&table, 0, 10, 97).unwrap();
        assert_eq!(derived, table.entry(10, 97).unwrap().xdrop_below);
    }

    #[test]
    fn test_greedy_params_combinations() {
        let table = ParameterTable::calibrated();
        let entry = *table.entry(12, 95).unwrap();
        assert_eq!(
            derive_greedy_params(&table, 0, 0, 12, 95),
            Ok((entry.max_aligned_len_diff, entry.perc_mat_history))
        );
        assert_eq!(derive_greedy_params(&table, 7, 55, 12, 95), Ok((7, 55)));
        assert_eq!(
            derive_greedy_params(&table, 7, 0, 12, 95),
            Err(ConfigError::PartialGreedyParams {
                max_aligned_len_diff: 7,
                perc_mat_history: 0
            })
        );
        assert!(matches!(
            derive_greedy_params(&table, 0, 55, 12, 95),
            Err(ConfigError::PartialGreedyParams { .. })
        ));
    }

    #[test]
    fn test_greedy_params_validation() {
        assert_eq!(
            GreedyParams::new(65, 80, 5),
            Err(ConfigError::HistoryOutOfRange(65))
        );
        assert!(matches!(
            GreedyParams::new(10, 5, 5),
            Err(ConfigError::NoRequiredMatches { .. })
        ));
        let params = GreedyParams::new(60, 55, 30).unwrap();
        assert_eq!(params.min_match_num, 33);
    }

    #[test]
    fn test_relax() {
        let mut params = GreedyParams::new(64, 80, 10).unwrap();
        params.relax(5);
        assert_eq!(params.max_aligned_len_diff, 15);
        assert_eq!(params.perc_mat_history, 75);
        assert_eq!(params.min_match_num, 48);
    }

    #[test]
    #[should_panic(expected = "leaves no required matches")]
    fn test_relax_to_zero_matches_panics() {
        let mut params = GreedyParams::new(60, 80, 10).unwrap();
        params.relax(100);
    }
}
