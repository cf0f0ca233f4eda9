//! Seed loops: feed seeds from an upstream matcher through a [`SeedExtender`].
//!
//! The sequential drivers reuse one extender for all seeds. The parallel
//! driver gives every rayon worker its own extender and returns the matches
//! in seed order.

use log::{debug, warn};
use rayon::prelude::*;

use crate::comparison::{QuerySeed, Seed};
use crate::config::SeedExtendConfig;
use crate::error::{Result, SeedExtendError};
use crate::pipeline::{MatchCandidate, MatchReporter, SeedExtender};
use crate::sequence::EncodedCollection;
use crate::stats::ExtensionStats;

/// What a seed loop does when the engine cannot make progress on a seed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NonTerminationPolicy {
    /// Log the seed, count it as skipped and continue
    Skip,
    /// Return the error to the caller
    #[default]
    Abort,
}

impl NonTerminationPolicy {
    /// Apply the policy to the result of one seed
    fn handle(self, result: Result<()>, seed: &Seed, stats: &mut ExtensionStats) -> Result<()> {
        match result {
            Err(err @ SeedExtendError::AlgorithmicNonTermination { .. }) => match self {
                NonTerminationPolicy::Skip => {
                    warn!("[seed-extend] skipping seed {seed}: {err}");
                    stats.skipped += 1;
                    Ok(())
                }
                NonTerminationPolicy::Abort => Err(err),
            },
            other => other,
        }
    }
}

/// Evaluate self-comparison seeds in order with one extender
pub fn run_self_seeds<C, R, I>(
    extender: &mut SeedExtender,
    collection: &C,
    seeds: I,
    policy: NonTerminationPolicy,
    reporter: &mut R,
) -> Result<()>
where
    C: EncodedCollection,
    R: MatchReporter + ?Sized,
    I: IntoIterator<Item = Seed>,
{
    for seed in seeds {
        let result = extender.process_self_seed(collection, seed.len, seed.pos1, seed.pos2, reporter);
        policy.handle(result, &seed, extender.stats_mut())?;
    }
    debug!("[seed-extend] processed {} seeds", extender.stats().seeds);
    Ok(())
}

/// Evaluate seeds against the query buffer `query` in order with one extender
pub fn run_query_seeds<C, R, I>(
    extender: &mut SeedExtender,
    collection: &C,
    query: &[u8],
    seeds: I,
    policy: NonTerminationPolicy,
    reporter: &mut R,
) -> Result<()>
where
    C: EncodedCollection,
    R: MatchReporter + ?Sized,
    I: IntoIterator<Item = QuerySeed>,
{
    for seed in seeds {
        let result = extender.process_query_seed(collection, query, &seed, reporter);
        policy.handle(result, &seed.seed, extender.stats_mut())?;
    }
    debug!("[seed-extend] processed {} query seeds", extender.stats().seeds);
    Ok(())
}

/// Evaluate self-comparison seeds in parallel.
///
/// Every worker builds its own extender from `config`. Matches come back in
/// the order of `seeds`, together with the merged statistics of all workers.
pub fn par_extend_self_seeds<C>(
    config: &SeedExtendConfig,
    collection: &C,
    seeds: &[Seed],
    policy: NonTerminationPolicy,
) -> Result<(Vec<MatchCandidate>, ExtensionStats)>
where
    C: EncodedCollection,
{
    // surface configuration errors before spawning any work
    SeedExtender::new(config)?;

    let per_seed: Vec<(Vec<MatchCandidate>, ExtensionStats)> = seeds
        .par_iter()
        .map_init(
            || SeedExtender::new(config),
            |extender, seed| -> Result<(Vec<MatchCandidate>, ExtensionStats)> {
                let extender = extender
                    .as_mut()
                    .map_err(|err| SeedExtendError::Configuration(err.clone()))?;
                let mut matches = Vec::new();
                let result =
                    extender.process_self_seed(collection, seed.len, seed.pos1, seed.pos2, &mut matches);
                policy.handle(result, seed, extender.stats_mut())?;
                Ok((matches, std::mem::take(extender.stats_mut())))
            },
        )
        .collect::<Result<_>>()?;

    let mut stats = ExtensionStats::new();
    let mut matches = Vec::new();
    for (seed_matches, seed_stats) in per_seed {
        stats.merge(&seed_stats);
        matches.extend(seed_matches);
    }
    debug!(
        "[seed-extend] {} seeds on {} threads gave {} matches",
        seeds.len(),
        rayon::current_num_threads(),
        matches.len()
    );
    stats.log_summary();
    Ok((matches, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtensionEngineKind;
    use crate::sequence::{encode_dna, MemoryCollection};

    #[test]
    fn test_handle_policy() {
        let seed = Seed::new(1, 20, 5);
        let mut stats = ExtensionStats::new();
        let err = || Err(SeedExtendError::AlgorithmicNonTermination { ulen: 0, vlen: 0 });

        assert!(NonTerminationPolicy::Skip.handle(err(), &seed, &mut stats).is_ok());
        assert_eq!(stats.skipped, 1);
        assert!(NonTerminationPolicy::Abort.handle(err(), &seed, &mut stats).is_err());
        assert_eq!(stats.skipped, 1);

        let reporter_err = Err(SeedExtendError::Reporter(anyhow::anyhow!("closed")));
        assert!(NonTerminationPolicy::Skip.handle(reporter_err, &seed, &mut stats).is_err());
    }

    #[test]
    fn test_run_self_seeds_counts_all_seeds() {
        let flank = "ACGTTGCAAGGCTTACCGATGCATTGACCAGTGATCGGTA";
        let text = format!("{flank}TTTTTTTTTT{flank}");
        let coll = MemoryCollection::from_dna(&[text.as_str()]);
        let config = SeedExtendConfig::builder()
            .engine(ExtensionEngineKind::Greedy)
            .min_reportable_length(10)
            .build();
        let mut extender = SeedExtender::new(&config).unwrap();
        let mut matches = Vec::new();
        let seeds = vec![Seed::new(5, 55, 10), Seed::new(3, 6, 5), Seed::new(20, 70, 12)];
        run_self_seeds(
            &mut extender,
            &coll,
            seeds,
            NonTerminationPolicy::Abort,
            &mut matches,
        )
        .unwrap();
        assert_eq!(extender.stats().seeds, 3);
        assert_eq!(extender.stats().overlapping, 1);
        // both repeat seeds extend to the same full-length match
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].db_len, 40);
        assert_eq!(matches[1].db_len, 40);
        extender.log_statistics();
    }

    #[test]
    fn test_run_query_seeds() {
        let db = "ACGTTGCAAGGCTTACCGATGCATTGACCAGTGATCGGTA";
        let coll = MemoryCollection::from_dna(&[db]);
        let query = encode_dna(format!("GGGG{db}").as_bytes());
        let config = SeedExtendConfig::builder()
            .self_compare(false)
            .min_reportable_length(10)
            .build();
        let mut extender = SeedExtender::new(&config).unwrap();
        let mut matches = Vec::new();
        let seeds = vec![
            QuerySeed::whole_buffer(Seed::new(10, 14, 8), query.len()),
            QuerySeed::whole_buffer(Seed::new(25, 29, 8), query.len()),
        ];
        run_query_seeds(
            &mut extender,
            &coll,
            &query,
            seeds,
            NonTerminationPolicy::Skip,
            &mut matches,
        )
        .unwrap();
        assert_eq!(extender.stats().seeds, 2);
        assert_eq!(matches.len(), 2);
        for m in &matches {
            assert_eq!((m.db_start, m.db_len), (0, 40));
            assert_eq!((m.query_start, m.query_len), (4, 40));
            assert_eq!(m.distance, 0);
        }
    }
}
