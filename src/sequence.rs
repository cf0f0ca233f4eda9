//! Encoded sequence collections.
//!
//! The extension engine does not own sequence storage. It reads characters
//! and per-sequence boundaries through [`EncodedCollection`]; the
//! [`MemoryCollection`] implementation keeps everything in one buffer.

/// Code of a character that matches nothing, including itself
pub const WILDCARD: u8 = 254;

/// Code of the separator between two sequences of a collection
pub const SEPARATOR: u8 = 255;

/// Wildcards and separators never count as matches
#[inline]
pub fn is_special(c: u8) -> bool {
    c >= WILDCARD
}

/// Two encoded characters match when equal and not special
#[inline]
pub fn chars_match(a: u8, b: u8) -> bool {
    a == b && !is_special(a)
}

/// Encode a DNA string: `ACGT` (either case) to `0..=3`, anything else to `WILDCARD`
pub fn encode_dna(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .map(|&c| match c {
            b'A' | b'a' => 0,
            b'C' | b'c' => 1,
            b'G' | b'g' => 2,
            b'T' | b't' => 3,
            _ => WILDCARD,
        })
        .collect()
}

/// Read access to an encoded sequence collection.
///
/// Positions are global: sequences are laid out one after another, separated
/// by one separator position that belongs to no sequence.
pub trait EncodedCollection: Sync {
    /// Number of positions including separators
    fn total_length(&self) -> usize;

    fn num_of_sequences(&self) -> usize;

    /// Number of the sequence containing `pos`
    fn seqnum(&self, pos: usize) -> usize;

    /// Global start position of sequence `seqnum`
    fn seqstartpos(&self, seqnum: usize) -> usize;

    fn seqlength(&self, seqnum: usize) -> usize;

    fn encoded_char(&self, pos: usize) -> u8;

    /// Whether single character access is cheap. When false, the automatic
    /// access mode copies ranges into a cache through `extract_range`.
    fn has_fast_random_access(&self) -> bool {
        true
    }

    /// Append `len` characters starting at `start` to `out`, last one first if `reverse`
    fn extract_range(&self, start: usize, len: usize, reverse: bool, out: &mut Vec<u8>) {
        if reverse {
            out.extend((start..start + len).rev().map(|pos| self.encoded_char(pos)));
        } else {
            out.extend((start..start + len).map(|pos| self.encoded_char(pos)));
        }
    }
}

/// Collection held in one contiguous buffer
#[derive(Debug, Clone, Default)]
pub struct MemoryCollection {
    data: Vec<u8>,
    starts: Vec<usize>,
    lengths: Vec<usize>,
    random_access: bool,
}

impl MemoryCollection {
    /// Build from already encoded sequences
    pub fn from_encoded<S: AsRef<[u8]>>(sequences: &[S]) -> Self {
        let mut data = Vec::new();
        let mut starts = Vec::with_capacity(sequences.len());
        let mut lengths = Vec::with_capacity(sequences.len());
        for (idx, seq) in sequences.iter().enumerate() {
            if idx > 0 {
                data.push(SEPARATOR);
            }
            starts.push(data.len());
            lengths.push(seq.as_ref().len());
            data.extend_from_slice(seq.as_ref());
        }
        MemoryCollection {
            data,
            starts,
            lengths,
            random_access: true,
        }
    }

    /// Build from DNA strings
    pub fn from_dna<S: AsRef<[u8]>>(sequences: &[S]) -> Self {
        let encoded: Vec<Vec<u8>> = sequences.iter().map(|s| encode_dna(s.as_ref())).collect();
        Self::from_encoded(&encoded)
    }

    /// Declare whether character access should be treated as cheap
    pub fn with_random_access(mut self, random_access: bool) -> Self {
        self.random_access = random_access;
        self
    }
}

impl EncodedCollection for MemoryCollection {
    fn total_length(&self) -> usize {
        self.data.len()
    }

    fn num_of_sequences(&self) -> usize {
        self.starts.len()
    }

    fn seqnum(&self, pos: usize) -> usize {
        assert!(pos < self.data.len(), "position {pos} out of range");
        // separator positions map to the preceding sequence
        match self.starts.binary_search(&pos) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        }
    }

    fn seqstartpos(&self, seqnum: usize) -> usize {
        self.starts[seqnum]
    }

    fn seqlength(&self, seqnum: usize) -> usize {
        self.lengths[seqnum]
    }

    fn encoded_char(&self, pos: usize) -> u8 {
        self.data[pos]
    }

    fn has_fast_random_access(&self) -> bool {
        self.random_access
    }

    fn extract_range(&self, start: usize, len: usize, reverse: bool, out: &mut Vec<u8>) {
        let range = &self.data[start..start + len];
        if reverse {
            out.extend(range.iter().rev());
        } else {
            out.extend_from_slice(range);
        }
    }
}
