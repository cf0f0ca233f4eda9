/// Property-based tests for seed extension
///
/// Uses proptest to verify invariants that must hold for every seed:
/// score/distance conversion, threshold relaxation and the acceptance filters.
use proptest::prelude::*;
use seedext::{
    distance2score, error_rate, score2distance, ExtensionEngineKind, GreedyParams,
    MemoryCollection, SeedExtendConfig, SeedExtender,
};


use synthetic_genomes::{generate_base_sequence, mutate_sequence};

/// Property: a score reachable under the self-comparison ratios survives
/// conversion to a distance and back.
///
/// The query preset (2:-2:-3) has no such linear relation, so query-mode
/// distances are recomputed exactly instead of converted.
#[test]
fn prop_score_distance_roundtrip() {
    proptest!(|(
        (alignedlen, distance) in (1u64..100_000).prop_flat_map(|l| (Just(l), 0..=l / 3))
    )| {
        let score = alignedlen as i64 - 3 * distance as i64;
        prop_assert_eq!(score2distance(score, alignedlen), distance);
        prop_assert_eq!(distance2score(score2distance(score, alignedlen), alignedlen), score);
    });
}

/// Property: error rate stays within [0, 200] for any distance up to the aligned length
#[test]
fn prop_error_rate_bounds() {
    proptest!(|(
        (alignedlen, distance) in (0u64..100_000).prop_flat_map(|l| (Just(l), 0..=l))
    )| {
        let rate = error_rate(distance, alignedlen);
        prop_assert!((0.0..=200.0).contains(&rate), "rate {} for {}/{}", rate, distance, alignedlen);
    });
}

/// Property: relaxing the greedy thresholds never tightens them and keeps
/// at least one required match
#[test]
fn prop_relax_is_monotone() {
    proptest!(|(
        history in 1u64..=64,
        perc_mat_history in 1u64..=100,
        max_aligned_len_diff in 1u64..50,
        steps in 0u64..40
    )| {
        let params = GreedyParams::new(history, perc_mat_history, max_aligned_len_diff);
        prop_assume!(params.is_ok());
        let params = params.unwrap();
        let remaining = perc_mat_history.saturating_sub(steps).max(1);
        prop_assume!(history * remaining / 100 > 0);

        let mut relaxed = params;
        relaxed.relax(steps);
        prop_assert!(relaxed.perc_mat_history <= params.perc_mat_history);
        prop_assert!(relaxed.max_aligned_len_diff >= params.max_aligned_len_diff);
        prop_assert!(relaxed.min_match_num <= params.min_match_num);
        prop_assert!(relaxed.min_match_num > 0);
    });
}

/// Property: every reported match passes the length and error filters, covers
/// its seed, and evaluating the seed again reports the same match
#[test]
fn prop_accepted_matches_pass_filters() {
    proptest!(ProptestConfig::with_cases(32), |(
        genome_seed in 0u64..1_000,
        mutations in 0usize..12,
        error_percentage in 5u64..=20,
        min_reportable_length in 10u64..60,
        greedy in any::<bool>()
    )| {
        // repeat = exact 60bp core followed by a mutated tail in the second copy
        let core = generate_base_sequence(60, genome_seed);
        let tail = generate_base_sequence(90, genome_seed + 1);
        let mutated_tail = mutate_sequence(&tail, mutations, genome_seed + 2);
        let left = generate_base_sequence(80, genome_seed + 3);
        let spacer = generate_base_sequence(70, genome_seed + 4);
        let right = generate_base_sequence(80, genome_seed + 5);
        let genome = format!("{left}{core}{tail}{spacer}{core}{mutated_tail}{right}");
        let first = left.len();
        let second = first + core.len() + tail.len() + spacer.len();
        let coll = MemoryCollection::from_dna(&[genome.as_str()]);

        let engine = if greedy { ExtensionEngineKind::Greedy } else { ExtensionEngineKind::Xdrop };
        let config = SeedExtendConfig::builder()
            .engine(engine)
            .error_percentage(error_percentage)
            .min_reportable_length(min_reportable_length)
            .build();
        let mut extender = SeedExtender::new(&config).unwrap();
        let (len, pos1, pos2) = (15, first + 20, second + 20);

        let mut matches = Vec::new();
        extender.process_self_seed(&coll, len, pos1, pos2, &mut matches).unwrap();
        let mut again = Vec::new();
        extender.process_self_seed(&coll, len, pos1, pos2, &mut again).unwrap();
        prop_assert_eq!(&matches, &again);

        let stats = extender.stats();
        prop_assert_eq!(stats.seeds, 2);
        prop_assert_eq!(
            stats.too_erroneous + stats.too_short + stats.accepted,
            2
        );
        for m in &matches {
            prop_assert!(m.aligned_len() >= 2 * len as u64);
            prop_assert!(m.aligned_len() >= 2 * min_reportable_length);
            prop_assert!(m.error_rate() <= error_percentage as f64);
            prop_assert!((0.0..=200.0).contains(&m.error_rate()));
            prop_assert!(m.db_start <= pos1 as u64);
            prop_assert!(m.db_start + m.db_len >= (pos1 + len) as u64);
            prop_assert!(m.query_start <= pos2 as u64);
        }
    });
}
