//! Seed-and-extend local alignment for encoded sequence collections.
//!
//! A seed is an exact match of length `len` at two positions of a collection
//! (self-comparison) or between a collection and a query buffer. A
//! [`SeedExtender`] extends the seed to both sides with one of two engines,
//! the score-bounded X-drop extension or the greedy edit-distance extension
//! with front pruning, and reports the alignment when it is long and similar
//! enough.
//!
//! ```
//! use seedext::{ExtensionEngineKind, MemoryCollection, SeedExtendConfig, SeedExtender};
//!
//! let repeat = "ACGTTGCAAGGCTTACCGATGCATTGACCAGTGATCGGTA";
//! let text = format!("{repeat}TTTTTTTTTTTTTTTTTTTT{repeat}");
//! let collection = MemoryCollection::from_dna(&[text.as_str()]);
//!
//! let config = SeedExtendConfig::builder()
//!     .engine(ExtensionEngineKind::Greedy)
//!     .min_reportable_length(20)
//!     .build();
//! let mut extender = SeedExtender::new(&config).unwrap();
//! let mut matches = Vec::new();
//! extender.process_self_seed(&collection, 10, 15, 75, &mut matches).unwrap();
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].db_len, 40);
//! ```

// Library exports for seedext
pub mod access;
pub mod comparison;
pub mod config;
pub mod driver;
pub mod error;
pub mod greedy;
pub mod params;
pub mod pipeline;
pub mod polish;
pub mod scoring;
pub mod sequence;
pub mod stats;
pub mod trace;
pub mod trimstat;
pub mod unit_edist;
pub mod xdrop;

pub use access::CharAccessMode;
pub use comparison::{QuerySeed, QuerySequence, Seed};
pub use config::{ExtensionEngineKind, SeedExtendConfig, SeedExtendConfigBuilder};
pub use driver::{par_extend_self_seeds, run_query_seeds, run_self_seeds, NonTerminationPolicy};
pub use error::{ConfigError, Result, SeedExtendError};
pub use greedy::{GreedyExtender, PolishedPoint};
pub use params::{GreedyParams, ParameterTable};
pub use pipeline::{ExtensionMeasure, ExtensionOutcome, MatchCandidate, MatchReporter, ReadMode, SeedExtender};
pub use scoring::{distance2score, error_rate, score2distance, ScoringScheme};
pub use sequence::{EncodedCollection, MemoryCollection};
pub use stats::ExtensionStats;
pub use trace::{Alignment, EditOp};
pub use trimstat::TrimStats;
pub use xdrop::{XdropBest, XdropExtender};
