//! Polishing test for the ends of greedy alignments.
//!
//! A front entry is polished when its alignment ends in a clean stretch:
//! walking back from the most recent column over the polishing window, the
//! running weight of the columns never becomes negative. Matches weigh
//! `error_percentage`, differences `-(100 - error_percentage)`.

/// Weights and window size of the polishing test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolishingInfo {
    pub cut_depth: u64,
    pub pol_size: u64,
    pub match_score: i64,
    pub difference_score: i64,
    byte_table: [ByteWeight; 256],
}

/// Weight of eight history columns, oldest last
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct ByteWeight {
    sum: i64,
    min_prefix: i64, // lowest running sum over the eight columns
}

impl PolishingInfo {
    /// `cut_depth` is half the polishing window, usually `min_match_num / 2`
    pub fn new(cut_depth: u64, error_percentage: u64) -> Self {
        let match_score = error_percentage as i64;
        let difference_score = -(100 - error_percentage as i64);
        let mut byte_table = [ByteWeight::default(); 256];
        for (bits, entry) in byte_table.iter_mut().enumerate() {
            let mut sum = 0;
            let mut min_prefix = 0;
            for idx in 0..8 {
                sum += if bits & (1 << idx) != 0 {
                    difference_score
                } else {
                    match_score
                };
                min_prefix = min_prefix.min(sum);
            }
            *entry = ByteWeight { sum, min_prefix };
        }
        PolishingInfo {
            cut_depth,
            pol_size: 2 * cut_depth,
            match_score,
            difference_score,
            byte_table,
        }
    }

    /// Whether the last `min(pol_size, history_size)` columns of `history` are polished.
    /// Bit 0 is the most recent column, a set bit is a difference.
    pub fn is_polished(&self, history: u64, history_size: u64) -> bool {
        let window = self.pol_size.min(history_size).min(64);
        let mut remaining = window;
        let mut bits = history;
        let mut sum = 0i64;
        while remaining >= 8 {
            let chunk = &self.byte_table[(bits & 0xff) as usize];
            if sum + chunk.min_prefix < 0 {
                return false;
            }
            sum += chunk.sum;
            bits >>= 8;
            remaining -= 8;
        }
        for _ in 0..remaining {
            sum += if bits & 1 != 0 {
                self.difference_score
            } else {
                self.match_score
            };
            if sum < 0 {
                return false;
            }
            bits >>= 1;
        }
        true
    }
}
