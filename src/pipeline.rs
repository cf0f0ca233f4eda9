//! Seed evaluation: extend a seed to both sides, combine the two outcomes
//! with the seed, filter by error rate and length, and report.
//!
//! A [`SeedExtender`] is created once per comparison run and reused for all
//! of its seeds. It owns the engine scratch space and the character caches,
//! so one extender must not be shared between threads; the parallel driver
//! gives every worker its own.

use std::fmt;

use log::{debug, info, trace};

use crate::access::{Region, SequenceAccess};
use crate::comparison::{ComparisonMode, QueryComparison, QuerySeed, Seed, SeedBounds, SelfComparison};
use crate::config::{ExtensionEngineKind, SeedExtendConfig};
use crate::error::{ConfigError, Result, SeedExtendError};
use crate::greedy::GreedyExtender;
use crate::params::{derive_greedy_params, derive_xdrop_threshold, GreedyParams, ParameterTable};
use crate::scoring::{distance2score, error_rate, score2distance, ScoringScheme};
use crate::sequence::EncodedCollection;
use crate::stats::ExtensionStats;
use crate::trace::{Alignment, EditOp};
use crate::unit_edist::{greedy_unit_edit_distance, EditDistanceResources};
use crate::xdrop::XdropExtender;

/// What one extension direction measured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionMeasure {
    /// X-drop score of the best point
    Score(i64),
    /// Edit distance up to the best polished point
    Distance(u64),
}

/// Result of extending one side of a seed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionOutcome {
    pub u_len: u64, // collection characters consumed
    pub v_len: u64, // query characters consumed
    pub measure: ExtensionMeasure,
}

impl ExtensionOutcome {
    fn score(&self) -> i64 {
        match self.measure {
            ExtensionMeasure::Score(score) => score,
            ExtensionMeasure::Distance(_) => 0,
        }
    }

    fn distance(&self) -> u64 {
        match self.measure {
            ExtensionMeasure::Score(_) => 0,
            ExtensionMeasure::Distance(distance) => distance,
        }
    }
}

/// Strand of a reported match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    #[default]
    Forward,
}

impl fmt::Display for ReadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadMode::Forward => write!(f, "F"),
        }
    }
}

/// An accepted alignment around a seed
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub seed: Seed,
    pub db_len: u64,
    pub db_start: u64, // absolute position in the collection
    pub db_seqnum: u64,
    pub db_seqstart: u64,
    pub query_seqnum: u64,
    pub query_len: u64,
    pub query_start: u64, // relative to the start of the query sequence
    pub query_seqlength: u64,
    pub score: i64,
    pub distance: u64,
    pub readmode: ReadMode,
    pub self_match: bool,
    pub distance_is_exact: bool,
    pub alignment: Option<Alignment>,
}

impl MatchCandidate {
    pub fn aligned_len(&self) -> u64 {
        self.db_len + self.query_len
    }

    pub fn error_rate(&self) -> f64 {
        error_rate(self.distance, self.aligned_len())
    }

    pub fn identity(&self) -> f64 {
        100.0 - self.error_rate()
    }
}

impl fmt::Display for MatchCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.2}",
            self.db_len,
            self.db_seqnum,
            self.db_start - self.db_seqstart,
            self.readmode,
            self.query_len,
            self.query_seqnum,
            self.query_start,
            self.score,
            self.distance,
            self.identity()
        )?;
        if let Some(alignment) = &self.alignment {
            write!(f, "\t{alignment}")?;
        }
        Ok(())
    }
}

/// Receives accepted matches. An error aborts the run.
pub trait MatchReporter {
    fn report(&mut self, candidate: &MatchCandidate) -> anyhow::Result<()>;

    /// Called for every seed before evaluation in verbose mode
    fn report_seed(&mut self, seed: &Seed) -> anyhow::Result<()> {
        info!("# seed:\t{seed}");
        Ok(())
    }
}

impl MatchReporter for Vec<MatchCandidate> {
    fn report(&mut self, candidate: &MatchCandidate) -> anyhow::Result<()> {
        self.push(candidate.clone());
        Ok(())
    }
}

#[derive(Debug)]
enum Engine {
    Xdrop(XdropExtender),
    Greedy(GreedyExtender),
}

impl Engine {
    fn kind(&self) -> ExtensionEngineKind {
        match self {
            Engine::Xdrop(_) => ExtensionEngineKind::Xdrop,
            Engine::Greedy(_) => ExtensionEngineKind::Greedy,
        }
    }

    fn zero_outcome(&self) -> ExtensionOutcome {
        let measure = match self {
            Engine::Xdrop(_) => ExtensionMeasure::Score(0),
            Engine::Greedy(_) => ExtensionMeasure::Distance(0),
        };
        ExtensionOutcome {
            u_len: 0,
            v_len: 0,
            measure,
        }
    }

    fn reset(&mut self) {
        match self {
            Engine::Xdrop(xdrop) => xdrop.reset(),
            Engine::Greedy(greedy) => greedy.reset(),
        }
    }
}

/// Long-lived seed evaluation context
#[derive(Debug)]
pub struct SeedExtender {
    config: SeedExtendConfig,
    scheme: ScoringScheme,
    engine: Engine,
    access: SequenceAccess,
    edist: EditDistanceResources,
    stats: ExtensionStats,
    left: Option<ExtensionOutcome>,
    right: Option<ExtensionOutcome>,
    left_alignment: Option<Alignment>,
    right_alignment: Option<Alignment>,
}

impl SeedExtender {
    /// Extender with the built-in parameter table
    pub fn new(config: &SeedExtendConfig) -> std::result::Result<Self, ConfigError> {
        Self::with_table(config, &ParameterTable::calibrated())
    }

    /// Extender deriving its thresholds from `table`
    pub fn with_table(
        config: &SeedExtendConfig,
        table: &ParameterTable,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let scheme = ScoringScheme::preset(config.self_compare);
        let engine = match config.engine {
            ExtensionEngineKind::Xdrop => {
                let xdrop_below = derive_xdrop_threshold(
                    table,
                    config.xdrop_below,
                    config.error_percentage,
                    config.sensitivity,
                )?;
                info!(
                    "[xdrop] scores {}:{}:{}:{}, drop threshold {}",
                    scheme.mat, scheme.mis, scheme.ins, scheme.del, xdrop_below
                );
                Engine::Xdrop(XdropExtender::new(scheme, xdrop_below)?)
            }
            ExtensionEngineKind::Greedy => {
                let (max_aligned_len_diff, perc_mat_history) = derive_greedy_params(
                    table,
                    config.max_aligned_len_diff,
                    config.perc_mat_history,
                    config.error_percentage,
                    config.sensitivity,
                )?;
                let params = GreedyParams::new(config.history, perc_mat_history, max_aligned_len_diff)?;
                info!(
                    "[greedy] history {}, {}% matches in history ({} required), max aligned length difference {}",
                    params.history, params.perc_mat_history, params.min_match_num, params.max_aligned_len_diff
                );
                Engine::Greedy(
                    GreedyExtender::new(params, config.error_percentage)
                        .with_front_trace(config.front_trace)
                        .with_trim_statistics(config.trim_statistics),
                )
            }
        };
        debug!(
            "[seed-extend] error percentage {}, sensitivity {}, minimal length {}, character access '{}'",
            config.error_percentage, config.sensitivity, config.min_reportable_length, config.char_access
        );
        Ok(SeedExtender {
            config: config.clone(),
            scheme,
            engine,
            access: SequenceAccess::new(config.char_access),
            edist: EditDistanceResources::new(),
            stats: ExtensionStats::new(),
            left: None,
            right: None,
            left_alignment: None,
            right_alignment: None,
        })
    }

    pub fn config(&self) -> &SeedExtendConfig {
        &self.config
    }

    pub fn scheme(&self) -> &ScoringScheme {
        &self.scheme
    }

    pub fn engine_kind(&self) -> ExtensionEngineKind {
        self.engine.kind()
    }

    pub fn stats(&self) -> &ExtensionStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut ExtensionStats {
        &mut self.stats
    }

    /// Greedy engine, if this extender uses it
    pub fn greedy(&self) -> Option<&GreedyExtender> {
        match &self.engine {
            Engine::Greedy(greedy) => Some(greedy),
            Engine::Xdrop(_) => None,
        }
    }

    /// Outcomes of the left and right extension of the last evaluated seed
    pub fn last_outcomes(&self) -> Option<(ExtensionOutcome, ExtensionOutcome)> {
        Some((self.left?, self.right?))
    }

    /// Loosen the greedy thresholds by `steps`; no effect on the X-drop engine.
    /// Panics if no required matches remain.
    pub fn relax(&mut self, steps: u64) {
        if let Engine::Greedy(greedy) = &mut self.engine {
            greedy.relax(steps);
        }
    }

    /// Clear the scratch state without releasing memory
    pub fn reset(&mut self) {
        self.engine.reset();
        self.edist.reset();
        self.left = None;
        self.right = None;
        self.left_alignment = None;
        self.right_alignment = None;
    }

    pub fn log_statistics(&self) {
        self.stats.log_summary();
        if let Some(trimstats) = self.greedy().and_then(GreedyExtender::trim_stats) {
            trimstats.log_summary();
        }
    }

    /// Evaluate a seed with both instances in `collection`
    pub fn process_self_seed<C, R>(
        &mut self,
        collection: &C,
        len: usize,
        pos1: usize,
        pos2: usize,
        reporter: &mut R,
    ) -> Result<()>
    where
        C: EncodedCollection,
        R: MatchReporter + ?Sized,
    {
        let mode = SelfComparison::new(collection);
        self.evaluate(&mode, Seed::new(pos1, pos2, len), reporter)
    }

    /// Evaluate a seed between `collection` and the query buffer `query`
    pub fn process_query_seed<C, R>(
        &mut self,
        collection: &C,
        query: &[u8],
        seed: &QuerySeed,
        reporter: &mut R,
    ) -> Result<()>
    where
        C: EncodedCollection,
        R: MatchReporter + ?Sized,
    {
        let mode = QueryComparison::new(collection, query, seed.query);
        self.evaluate(&mode, seed.seed, reporter)
    }

    fn evaluate<M, R>(&mut self, mode: &M, seed: Seed, reporter: &mut R) -> Result<()>
    where
        M: ComparisonMode,
        R: MatchReporter + ?Sized,
    {
        self.stats.seeds += 1;
        self.left = None;
        self.right = None;
        self.left_alignment = None;
        self.right_alignment = None;
        if self.config.verbose {
            reporter.report_seed(&seed).map_err(SeedExtendError::Reporter)?;
        }
        let Seed { pos1, pos2, len } = seed;
        if mode.self_match() {
            assert!(pos1 <= pos2, "seed positions out of order: {pos1} > {pos2}");
            if seed.is_overlapping() {
                self.stats.overlapping += 1;
                debug!("[seed-extend] overlapping seed {pos1} {pos2} {len}");
                return Ok(());
            }
        }
        let bounds = mode.bounds(&seed);

        let left = if pos1 > bounds.db_seqstart && pos2 > bounds.query_seqstart {
            let vstart = mode.query_left_limit(&seed, &bounds);
            self.stats.left_extensions += 1;
            let outcome = self.extend(
                mode,
                Region::backward_from(pos1, pos1 - bounds.db_seqstart),
                Region::backward_from(pos2, pos2 - vstart),
            )?;
            self.left_alignment = self.traced_alignment();
            outcome
        } else {
            self.engine.zero_outcome()
        };
        trace!("[seed-extend] left of {seed}: {left:?}");

        assert!(pos2 as u64 >= left.v_len);
        let urightbound = if mode.self_match() {
            // stop at the right instance of the extended seed
            bounds.db_end().min(pos2 - left.v_len as usize)
        } else {
            bounds.db_end()
        };
        let vrightbound = bounds.query_end();
        let right = if pos1 + len < urightbound && pos2 + len < vrightbound {
            self.stats.right_extensions += 1;
            let outcome = self.extend(
                mode,
                Region::forward(pos1 + len, urightbound - (pos1 + len)),
                Region::forward(pos2 + len, vrightbound - (pos2 + len)),
            )?;
            self.right_alignment = self.traced_alignment();
            outcome
        } else {
            self.engine.zero_outcome()
        };
        trace!("[seed-extend] right of {seed}: {right:?}");
        self.left = Some(left);
        self.right = Some(right);

        if self.config.check_extend_symmetry {
            assert_eq!(left, right, "left and right extension of {seed} differ");
        }

        let len = len as u64;
        let db_len = len + left.u_len + right.u_len;
        let query_len = len + left.v_len + right.v_len;
        let aligned_len = db_len + query_len;
        let db_start = pos1 as u64 - left.u_len;
        let query_start = pos2 as u64 - left.v_len;

        let (score, distance, distance_is_exact) = match self.engine.kind() {
            ExtensionEngineKind::Xdrop => {
                let score = len as i64 * self.scheme.mat + left.score() + right.score();
                if mode.self_match() && self.scheme == ScoringScheme::SELF_COMPARE {
                    (score, score2distance(score, aligned_len), false)
                } else {
                    let distance = self.exact_distance(mode, db_start, db_len, query_start, query_len);
                    (score, distance, true)
                }
            }
            ExtensionEngineKind::Greedy => {
                let distance = left.distance() + right.distance();
                (distance2score(distance, aligned_len), distance, true)
            }
        };

        let rate = error_rate(distance, aligned_len);
        if rate > self.config.error_percentage as f64 {
            self.stats.too_erroneous += 1;
            debug!("[seed-extend] reject {seed}: error rate {rate:.2} > {}", self.config.error_percentage);
            return Ok(());
        }
        if aligned_len < 2 * self.config.min_reportable_length {
            self.stats.too_short += 1;
            debug!(
                "[seed-extend] reject {seed}: aligned length {aligned_len} < 2 * {}",
                self.config.min_reportable_length
            );
            return Ok(());
        }
        self.stats.accepted += 1;
        assert!(query_start >= bounds.query_seqstart as u64);
        if self.config.silent {
            return Ok(());
        }

        let alignment = self.combined_alignment(seed.len);
        let candidate = self.candidate(
            seed,
            &bounds,
            mode.self_match(),
            (db_len, db_start),
            (query_len, query_start - bounds.query_seqstart as u64),
            (score, distance, distance_is_exact),
            alignment,
        );
        reporter.report(&candidate).map_err(SeedExtendError::Reporter)?;
        self.stats.reported += 1;
        Ok(())
    }

    fn extend<M: ComparisonMode>(
        &mut self,
        mode: &M,
        uregion: Region,
        vregion: Region,
    ) -> Result<ExtensionOutcome> {
        let (u, v) = self
            .access
            .views(mode.db_source(), uregion, mode.query_source(), vregion);
        match &mut self.engine {
            Engine::Xdrop(xdrop) => {
                let best = xdrop.extend(&u, &v);
                Ok(ExtensionOutcome {
                    u_len: best.ivalue as u64,
                    v_len: best.jvalue as u64,
                    measure: ExtensionMeasure::Score(best.score),
                })
            }
            Engine::Greedy(greedy) => {
                let point = greedy.extend(&u, &v)?;
                Ok(ExtensionOutcome {
                    u_len: point.row,
                    v_len: point.column(),
                    measure: ExtensionMeasure::Distance(point.distance),
                })
            }
        }
    }

    /// Unit edit distance of the complete match region
    fn exact_distance<M: ComparisonMode>(
        &mut self,
        mode: &M,
        db_start: u64,
        db_len: u64,
        query_start: u64,
        query_len: u64,
    ) -> u64 {
        let (u, v) = self.access.views(
            mode.db_source(),
            Region::forward(db_start as usize, db_len as usize),
            mode.query_source(),
            Region::forward(query_start as usize, query_len as usize),
        );
        greedy_unit_edit_distance(&mut self.edist, &u, &v)
    }

    fn traced_alignment(&self) -> Option<Alignment> {
        self.greedy()
            .filter(|greedy| greedy.has_front_trace())
            .and_then(GreedyExtender::last_alignment)
    }

    /// Left alignment read towards the seed, the seed itself, then the right alignment
    fn combined_alignment(&self, seed_len: usize) -> Option<Alignment> {
        if !self.greedy().is_some_and(GreedyExtender::has_front_trace) {
            return None;
        }
        let mut combined = self
            .left_alignment
            .as_ref()
            .map(Alignment::reversed)
            .unwrap_or_default();
        combined.push(EditOp::Match(seed_len as u64));
        if let Some(right) = &self.right_alignment {
            combined.append(right);
        }
        Some(combined)
    }

    #[allow(clippy::too_many_arguments)]
    fn candidate(
        &self,
        seed: Seed,
        bounds: &SeedBounds,
        self_match: bool,
        (db_len, db_start): (u64, u64),
        (query_len, query_start): (u64, u64),
        (score, distance, distance_is_exact): (i64, u64, bool),
        alignment: Option<Alignment>,
    ) -> MatchCandidate {
        MatchCandidate {
            seed,
            db_len,
            db_start,
            db_seqnum: bounds.db_seqnum as u64,
            db_seqstart: bounds.db_seqstart as u64,
            query_seqnum: bounds.query_seqnum,
            query_len,
            query_start,
            query_seqlength: bounds.query_seqlength as u64,
            score,
            distance,
            readmode: ReadMode::Forward,
            self_match,
            distance_is_exact,
            alignment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::MemoryCollection;

    const FLANK: &str = "ACGTTGCAAGGCTTACCGATGCATTGACCAGTGATCGGTA";

    fn greedy_config() -> SeedExtendConfig {
        SeedExtendConfig::builder()
            .engine(ExtensionEngineKind::Greedy)
            .min_reportable_length(10)
            .build()
    }

    #[test]
    fn test_repeat_found_by_both_engines() {
        // two copies of FLANK separated by unrelated sequence
        let text = format!("{FLANK}TTTTTTTTTTTTTTTTTTTT{FLANK}");
        let coll = MemoryCollection::from_dna(&[text.as_str()]);
        for engine in [ExtensionEngineKind::Xdrop, ExtensionEngineKind::Greedy] {
            let config = SeedExtendConfig::builder()
                .engine(engine)
                .min_reportable_length(10)
                .build();
            let mut extender = SeedExtender::new(&config).unwrap();
            let mut matches = Vec::new();
            extender
                .process_self_seed(&coll, 10, 15, 75, &mut matches)
                .unwrap();
            assert_eq!(matches.len(), 1, "{engine}");
            let m = &matches[0];
            assert_eq!(m.db_start, 0);
            assert_eq!(m.db_len, 40);
            assert_eq!(m.query_start, 60);
            assert_eq!(m.query_len, 40);
            assert_eq!(m.distance, 0);
            assert_eq!(m.score, 80);
            assert!(m.self_match);
        }
    }

    #[test]
    fn test_overlapping_seed_does_no_work() {
        let coll = MemoryCollection::from_dna(&[FLANK]);
        let mut extender = SeedExtender::new(&greedy_config()).unwrap();
        let mut matches = Vec::new();
        extender.process_self_seed(&coll, 5, 10, 10, &mut matches).unwrap();
        extender.process_self_seed(&coll, 5, 10, 15, &mut matches).unwrap();
        assert!(matches.is_empty());
        assert_eq!(extender.stats().overlapping, 2);
        assert_eq!(extender.stats().extensions(), 0);
        assert!(extender.last_outcomes().is_none());
    }

    #[test]
    #[should_panic(expected = "out of order")]
    fn test_reversed_seed_panics() {
        let coll = MemoryCollection::from_dna(&[FLANK]);
        let mut extender = SeedExtender::new(&greedy_config()).unwrap();
        let mut matches = Vec::new();
        let _ = extender.process_self_seed(&coll, 5, 20, 10, &mut matches);
    }

    #[test]
    fn test_silent_counts_but_does_not_report() {
        let text = format!("{FLANK}GGGGGGGGGG{FLANK}");
        let coll = MemoryCollection::from_dna(&[text.as_str()]);
        let config = SeedExtendConfig::builder()
            .min_reportable_length(10)
            .silent(true)
            .build();
        let mut extender = SeedExtender::new(&config).unwrap();
        let mut matches = Vec::new();
        extender.process_self_seed(&coll, 10, 5, 55, &mut matches).unwrap();
        assert!(matches.is_empty());
        assert_eq!(extender.stats().accepted, 1);
        assert_eq!(extender.stats().reported, 0);
    }

    #[test]
    fn test_front_trace_alignment_of_match() {
        let mut copy = FLANK.as_bytes().to_vec();
        copy[30] = b'A';
        let copy = String::from_utf8(copy).unwrap();
        let text = format!("{FLANK}CCCCCCCCCCCCCCCCCCCC{copy}");
        let coll = MemoryCollection::from_dna(&[text.as_str()]);
        let config = SeedExtendConfig::builder()
            .engine(ExtensionEngineKind::Greedy)
            .min_reportable_length(10)
            .front_trace(true)
            .build();
        let mut extender = SeedExtender::new(&config).unwrap();
        let mut matches = Vec::new();
        extender.process_self_seed(&coll, 10, 10, 70, &mut matches).unwrap();
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.distance, 1);
        let alignment = m.alignment.as_ref().unwrap();
        assert_eq!(alignment.cigar(), "30=1X9=");
        assert_eq!(alignment.ulen(), m.db_len);
        assert_eq!(alignment.vlen(), m.query_len);
    }

    #[test]
    fn test_relax_and_reset() {
        let text = format!("{FLANK}AAAAAAAAAA{FLANK}");
        let coll = MemoryCollection::from_dna(&[text.as_str()]);
        let mut extender = SeedExtender::new(&greedy_config()).unwrap();
        let before = extender.greedy().unwrap().params().min_match_num;
        extender.relax(5);
        assert!(extender.greedy().unwrap().params().min_match_num < before);

        let mut matches = Vec::new();
        extender.process_self_seed(&coll, 10, 5, 55, &mut matches).unwrap();
        assert!(extender.last_outcomes().is_some());
        extender.reset();
        assert!(extender.last_outcomes().is_none());
        assert_eq!(extender.stats().seeds, 1);
    }

    #[test]
    fn test_reporter_error_aborts() {
        struct Failing;
        impl MatchReporter for Failing {
            fn report(&mut self, _candidate: &MatchCandidate) -> anyhow::Result<()> {
                anyhow::bail!("disk full")
            }
        }
        let text = format!("{FLANK}AAAAAAAAAA{FLANK}");
        let coll = MemoryCollection::from_dna(&[text.as_str()]);
        let mut extender = SeedExtender::new(&greedy_config()).unwrap();
        let err = extender
            .process_self_seed(&coll, 10, 5, 55, &mut Failing)
            .unwrap_err();
        assert!(matches!(err, SeedExtendError::Reporter(_)));
        assert!(err.to_string().contains("disk full"));
    }
}
