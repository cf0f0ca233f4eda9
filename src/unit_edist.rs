//! Exact unit-cost edit distance of two complete sequences.
//!
//! Greedy O(ND) front expansion (Myers, Ukkonen): front `d` holds the
//! furthest row per diagonal reachable with `d` differences, and the
//! distance is the first `d` whose front reaches the end of both sequences.

use crate::access::{slide, SeqView};

const UNREACHED: isize = -1;

/// Reusable fronts for [`greedy_unit_edit_distance`]
#[derive(Debug, Default)]
pub struct EditDistanceResources {
    previous: Vec<isize>,
    current: Vec<isize>,
}

impl EditDistanceResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.previous.clear();
        self.current.clear();
    }
}

/// Unit edit distance between the complete views `u` and `v`
pub fn greedy_unit_edit_distance(
    resources: &mut EditDistanceResources,
    u: &SeqView<'_>,
    v: &SeqView<'_>,
) -> u64 {
    let ulen = u.len() as isize;
    let vlen = v.len() as isize;
    let target = vlen - ulen;
    resources.reset();

    // fronts are indexed by k + d
    let row = slide(u, v, 0, 0);
    if target == 0 && row == ulen {
        return 0;
    }
    resources.current.push(row);

    let mut d: isize = 0;
    loop {
        d += 1;
        std::mem::swap(&mut resources.previous, &mut resources.current);
        resources.current.clear();
        let prev = &resources.previous;
        let prev_d = d - 1;
        let at = |k: isize| -> isize {
            let idx = k + prev_d;
            if idx < 0 || idx as usize >= prev.len() {
                UNREACHED
            } else {
                prev[idx as usize]
            }
        };

        for k in -d..=d {
            let mut row = UNREACHED;
            if k >= -ulen && k <= vlen {
                let r = at(k);
                if r != UNREACHED && r < ulen && r + k < vlen {
                    row = row.max(r + 1);
                }
                let r = at(k + 1);
                if r != UNREACHED && r < ulen {
                    row = row.max(r + 1);
                }
                let r = at(k - 1);
                if r != UNREACHED && r + k <= vlen {
                    row = row.max(r);
                }
                if row != UNREACHED {
                    row = slide(u, v, row, k);
                    if k == target && row == ulen {
                        return d as u64;
                    }
                }
            }
            resources.current.push(row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{Region, Source};
    use crate::sequence::encode_dna;

    fn edist(u: &[u8], v: &[u8]) -> u64 {
        let u = encode_dna(u);
        let v = encode_dna(v);
        let mut res = EditDistanceResources::new();
        greedy_unit_edit_distance(
            &mut res,
            &SeqView::new(Source::Query(&u), Region::forward(0, u.len())),
            &SeqView::new(Source::Query(&v), Region::forward(0, v.len())),
        )
    }

    /// Textbook dynamic programming for comparison
    fn dp_edist(u: &[u8], v: &[u8]) -> u64 {
        let u = encode_dna(u);
        let v = encode_dna(v);
        let mut prev: Vec<u64> = (0..=v.len() as u64).collect();
        for i in 1..=u.len() {
            let mut cur = vec![i as u64; v.len() + 1];
            for j in 1..=v.len() {
                let sub = prev[j - 1] + u64::from(!crate::sequence::chars_match(u[i - 1], v[j - 1]));
                cur[j] = sub.min(prev[j] + 1).min(cur[j - 1] + 1);
            }
            prev = cur;
        }
        prev[v.len()]
    }

    #[test]
    fn test_simple_distances() {
        assert_eq!(edist(b"", b""), 0);
        assert_eq!(edist(b"", b"ACG"), 3);
        assert_eq!(edist(b"ACGT", b""), 4);
        assert_eq!(edist(b"ACGTACGT", b"ACGTACGT"), 0);
        assert_eq!(edist(b"ACGTACGT", b"ACGAACGT"), 1);
        assert_eq!(edist(b"ACGTACGT", b"ACGACGT"), 1);
        assert_eq!(edist(b"ACGTNCGT", b"ACGTNCGT"), 1);
    }

    #[test]
    fn test_agrees_with_dynamic_programming() {
        let pairs: [(&[u8], &[u8]); 5] = [
            (b"GATTACA", b"GCATGCT"),
            (b"ACGTTGCAAGGCTTACCGAT", b"ACGTGCAAGGCTTTACCGT"),
            (b"AAAAAAAA", b"TTTT"),
            (b"CTGACTGA", b"GACTGACT"),
            (b"ACGT", b"TGCA"),
        ];
        for (u, v) in pairs {
            assert_eq!(edist(u, v), dp_edist(u, v), "{:?} {:?}", u, v);
        }
    }
}
