//! Seeds and the two addressing modes.
//!
//! Self-comparison places both seed positions in one collection; query
//! comparison places the second position in an external query buffer. Both
//! resolve to the same [`SeedBounds`], which is all the evaluation pipeline
//! needs to know about where a seed lives.

use std::fmt;

use crate::access::Source;
use crate::sequence::EncodedCollection;

/// An exact match of length `len` starting at `pos1` and `pos2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Seed {
    pub pos1: usize,
    pub pos2: usize,
    pub len: usize,
}

impl Seed {
    pub fn new(pos1: usize, pos2: usize, len: usize) -> Self {
        Seed { pos1, pos2, len }
    }

    /// The two instances touch or overlap
    pub fn is_overlapping(&self) -> bool {
        self.pos1 + self.len >= self.pos2
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.pos1, self.pos2, self.len)
    }
}

/// Location of one query sequence inside the query buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuerySequence {
    pub seqnum: u64,
    pub start: usize,
    pub length: usize,
}

/// Seed against an external query, as delivered by the upstream matcher.
/// `seed.pos2` is a position in the query buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuerySeed {
    pub seed: Seed,
    pub query: QuerySequence,
}

impl QuerySeed {
    /// Seed in a query buffer holding a single sequence of `total_length` characters
    pub fn whole_buffer(seed: Seed, total_length: usize) -> Self {
        QuerySeed {
            seed,
            query: QuerySequence {
                seqnum: 0,
                start: 0,
                length: total_length,
            },
        }
    }
}

/// Sequence boundaries of both sides of a seed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedBounds {
    pub db_seqnum: usize,
    pub db_seqstart: usize,
    pub db_seqlength: usize,
    pub query_seqnum: u64,
    pub query_seqstart: usize,
    pub query_seqlength: usize,
}

impl SeedBounds {
    pub fn db_end(&self) -> usize {
        self.db_seqstart + self.db_seqlength
    }

    pub fn query_end(&self) -> usize {
        self.query_seqstart + self.query_seqlength
    }
}

/// Boundary lookup and character sources for one addressing mode
pub trait ComparisonMode {
    /// Both positions lie in the same collection
    fn self_match(&self) -> bool;

    fn db_source(&self) -> Source<'_>;

    fn query_source(&self) -> Source<'_>;

    fn bounds(&self, seed: &Seed) -> SeedBounds;

    /// Lowest query position the left extension may reach
    fn query_left_limit(&self, seed: &Seed, bounds: &SeedBounds) -> usize;
}

/// Both seed instances in one collection
pub struct SelfComparison<'a, C: EncodedCollection> {
    collection: &'a C,
}

impl<'a, C: EncodedCollection> SelfComparison<'a, C> {
    pub fn new(collection: &'a C) -> Self {
        SelfComparison { collection }
    }
}

impl<C: EncodedCollection> ComparisonMode for SelfComparison<'_, C> {
    fn self_match(&self) -> bool {
        true
    }

    fn db_source(&self) -> Source<'_> {
        Source::Collection(self.collection)
    }

    fn query_source(&self) -> Source<'_> {
        Source::Collection(self.collection)
    }

    fn bounds(&self, seed: &Seed) -> SeedBounds {
        let coll = self.collection;
        let db_seqnum = coll.seqnum(seed.pos1);
        let db_seqstart = coll.seqstartpos(db_seqnum);
        let db_seqlength = coll.seqlength(db_seqnum);
        if seed.pos2 < db_seqstart + db_seqlength {
            // second instance in the same sequence
            SeedBounds {
                db_seqnum,
                db_seqstart,
                db_seqlength,
                query_seqnum: db_seqnum as u64,
                query_seqstart: db_seqstart,
                query_seqlength: db_seqlength,
            }
        } else {
            let query_seqnum = coll.seqnum(seed.pos2);
            assert!(
                db_seqnum < query_seqnum,
                "second seed instance at {} lies before sequence {db_seqnum}",
                seed.pos2
            );
            SeedBounds {
                db_seqnum,
                db_seqstart,
                db_seqlength,
                query_seqnum: query_seqnum as u64,
                query_seqstart: coll.seqstartpos(query_seqnum),
                query_seqlength: coll.seqlength(query_seqnum),
            }
        }
    }

    fn query_left_limit(&self, seed: &Seed, bounds: &SeedBounds) -> usize {
        // stop at the left instance of the seed or the query start, whichever is larger
        (seed.pos1 + seed.len).max(bounds.query_seqstart)
    }
}

/// First instance in the collection, second in an external query buffer
pub struct QueryComparison<'a, C: EncodedCollection> {
    collection: &'a C,
    query: &'a [u8],
    sequence: QuerySequence,
}

impl<'a, C: EncodedCollection> QueryComparison<'a, C> {
    /// `sequence` is the query sequence the seed was found in
    pub fn new(collection: &'a C, query: &'a [u8], sequence: QuerySequence) -> Self {
        assert!(
            sequence.start + sequence.length <= query.len(),
            "query sequence {} exceeds the query buffer of length {}",
            sequence.seqnum,
            query.len()
        );
        QueryComparison {
            collection,
            query,
            sequence,
        }
    }
}

impl<C: EncodedCollection> ComparisonMode for QueryComparison<'_, C> {
    fn self_match(&self) -> bool {
        false
    }

    fn db_source(&self) -> Source<'_> {
        Source::Collection(self.collection)
    }

    fn query_source(&self) -> Source<'_> {
        Source::Query(self.query)
    }

    fn bounds(&self, seed: &Seed) -> SeedBounds {
        let coll = self.collection;
        let db_seqnum = coll.seqnum(seed.pos1);
        assert!(
            seed.pos2 >= self.sequence.start
                && seed.pos2 + seed.len <= self.sequence.start + self.sequence.length,
            "seed at query position {} outside query sequence {}",
            seed.pos2,
            self.sequence.seqnum
        );
        SeedBounds {
            db_seqnum,
            db_seqstart: coll.seqstartpos(db_seqnum),
            db_seqlength: coll.seqlength(db_seqnum),
            query_seqnum: self.sequence.seqnum,
            query_seqstart: self.sequence.start,
            query_seqlength: self.sequence.length,
        }
    }

    fn query_left_limit(&self, _seed: &Seed, bounds: &SeedBounds) -> usize {
        bounds.query_seqstart
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::MemoryCollection;

    #[test]
    fn test_overlap() {
        assert!(Seed::new(100, 100, 5).is_overlapping());
        assert!(Seed::new(10, 15, 5).is_overlapping());
        assert!(!Seed::new(10, 16, 5).is_overlapping());
    }

    #[test]
    fn test_self_bounds_same_and_different_sequence() {
        let coll = MemoryCollection::from_dna(&["ACGTACGTAC", "ACGTAC"]);
        let mode = SelfComparison::new(&coll);

        let same = mode.bounds(&Seed::new(1, 6, 2));
        assert_eq!(same.db_seqnum, 0);
        assert_eq!(same.query_seqnum, 0);
        assert_eq!(same.query_seqstart, 0);

        let other = mode.bounds(&Seed::new(1, 12, 2));
        assert_eq!(other.db_seqnum, 0);
        assert_eq!(other.query_seqnum, 1);
        assert_eq!(other.query_seqstart, 11);
        assert_eq!(other.query_end(), 17);
        assert_eq!(mode.query_left_limit(&Seed::new(1, 12, 2), &other), 11);
        assert_eq!(mode.query_left_limit(&Seed::new(1, 6, 2), &same), 3);
    }

    #[test]
    fn test_query_bounds() {
        let coll = MemoryCollection::from_dna(&["ACGTACGTAC", "ACGTAC"]);
        let query = crate::sequence::encode_dna(b"GGGGACGTAA");
        let sequence = QuerySequence {
            seqnum: 3,
            start: 4,
            length: 6,
        };
        let mode = QueryComparison::new(&coll, &query, sequence);
        let bounds = mode.bounds(&Seed::new(12, 5, 3));
        assert_eq!(bounds.db_seqnum, 1);
        assert_eq!(bounds.query_seqnum, 3);
        assert_eq!(bounds.query_end(), 10);
        assert!(!mode.self_match());
    }
}
