//! Greedy banded edit-distance extension with front pruning.
//!
//! Front `d` holds, for every diagonal `k = j - i` of the band, the furthest
//! row reachable with exactly `d` unit-cost differences, together with a bit
//! history of its last columns (bit 0 is the most recent, a set bit is a
//! difference). After each front the band ends are trimmed and every
//! surviving entry is tested for polishing; the polished entry with the
//! largest aligned length `i + j` is the result of the extension.

use log::trace;

use crate::access::{slide, Region, SeqView, SequenceAccess, Source};
use crate::error::{Result, SeedExtendError};
use crate::params::GreedyParams;
use crate::polish::PolishingInfo;
use crate::trace::{Alignment, FrontTrace, TraceOp};
use crate::trimstat::TrimStats;

const DEAD: isize = -1;

/// Best polished end point of one extension
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PolishedPoint {
    pub alignedlen: u64, // characters of u and v together
    pub row: u64,        // characters of u
    pub distance: u64,
}

impl PolishedPoint {
    /// Characters of v
    pub fn column(&self) -> u64 {
        self.alignedlen - self.row
    }
}

#[derive(Debug, Clone, Copy)]
struct FrontValue {
    row: isize,
    history: u64,
    history_size: u64,
}

impl FrontValue {
    const DEAD: FrontValue = FrontValue {
        row: DEAD,
        history: 0,
        history_size: 0,
    };

    fn is_dead(&self) -> bool {
        self.row == DEAD
    }

    fn alignedlen(&self, k: isize) -> isize {
        2 * self.row + k
    }

    fn matches_in_history(&self) -> u64 {
        self.history_size - self.history.count_ones() as u64
    }

    fn add_difference(&mut self, history: u64, mask: u64) {
        self.history = ((self.history << 1) | 1) & mask;
        self.history_size = (self.history_size + 1).min(history);
    }

    fn add_matches(&mut self, count: u64, history: u64, mask: u64) {
        if count == 0 {
            return;
        }
        self.history = if count >= 64 {
            0
        } else {
            (self.history << count) & mask
        };
        self.history_size = (self.history_size + count).min(history);
    }
}

/// Two fronts of the greedy engine: the one being built and its predecessor.
///
/// The buffers grow to the widest band seen and are never shrunk.
#[derive(Debug, Default)]
pub struct FrontReservoir {
    previous: Vec<FrontValue>,
    current: Vec<FrontValue>,
    previous_lo: isize,
    current_lo: isize,
}

impl FrontReservoir {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.previous.clear();
        self.current.clear();
        self.previous_lo = 0;
        self.current_lo = 0;
    }

    /// Allocated front entries
    pub fn capacity(&self) -> usize {
        self.previous.capacity() + self.current.capacity()
    }

    fn previous_at(&self, k: isize) -> Option<&FrontValue> {
        let idx = k - self.previous_lo;
        if idx < 0 {
            return None;
        }
        self.previous.get(idx as usize).filter(|fv| !fv.is_dead())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrimReason {
    Dead,
    History,
    Length,
}

/// Front-pruning extension engine with its reusable resources
#[derive(Debug)]
pub struct GreedyExtender {
    params: GreedyParams,
    error_percentage: u64,
    polishing: PolishingInfo,
    reservoir: FrontReservoir,
    trace: Option<FrontTrace>,
    trimstats: Option<TrimStats>,
    last_end: Option<(u64, isize)>, // front and diagonal of the last polished point
}

impl GreedyExtender {
    pub fn new(params: GreedyParams, error_percentage: u64) -> Self {
        GreedyExtender {
            params,
            error_percentage,
            polishing: PolishingInfo::new(params.min_match_num / 2, error_percentage),
            reservoir: FrontReservoir::new(),
            trace: None,
            trimstats: None,
            last_end: None,
        }
    }

    /// Record predecessors so that alignments can be reconstructed
    pub fn with_front_trace(mut self, enabled: bool) -> Self {
        self.trace = enabled.then(FrontTrace::new);
        self
    }

    /// Collect trimming statistics
    pub fn with_trim_statistics(mut self, enabled: bool) -> Self {
        self.trimstats = enabled.then(TrimStats::new);
        self
    }

    pub fn params(&self) -> &GreedyParams {
        &self.params
    }

    pub fn polishing(&self) -> &PolishingInfo {
        &self.polishing
    }

    pub fn reservoir(&self) -> &FrontReservoir {
        &self.reservoir
    }

    pub fn trim_stats(&self) -> Option<&TrimStats> {
        self.trimstats.as_ref()
    }

    pub fn has_front_trace(&self) -> bool {
        self.trace.is_some()
    }

    /// Loosen the thresholds by `steps`; panics if no required matches remain
    pub fn relax(&mut self, steps: u64) {
        self.params.relax(steps);
        self.polishing = PolishingInfo::new(self.params.min_match_num / 2, self.error_percentage);
    }

    pub fn reset(&mut self) {
        self.reservoir.reset();
        if let Some(trace) = self.trace.as_mut() {
            trace.reset();
        }
        self.last_end = None;
    }

    /// Extend from the start of both views and return the best polished point
    pub fn extend(&mut self, u: &SeqView<'_>, v: &SeqView<'_>) -> Result<PolishedPoint> {
        self.align(u, v).map(|(_, point)| point)
    }

    /// Align an explicit region pair, each read in its own direction.
    /// Returns the distance at which the extension stopped and the best polished point.
    pub fn align_region(
        &mut self,
        access: &mut SequenceAccess,
        usource: Source<'_>,
        uregion: Region,
        vsource: Source<'_>,
        vregion: Region,
    ) -> Result<(u64, PolishedPoint)> {
        let (u, v) = access.views(usource, uregion, vsource, vregion);
        self.align(&u, &v)
    }

    /// Run the extension; returns the distance of the last front and the best polished point
    pub fn align(&mut self, u: &SeqView<'_>, v: &SeqView<'_>) -> Result<(u64, PolishedPoint)> {
        let ulen = u.len() as isize;
        let vlen = v.len() as isize;
        if ulen + vlen == 0 {
            return Err(SeedExtendError::AlgorithmicNonTermination { ulen: 0, vlen: 0 });
        }
        self.reset();

        let history = self.params.history;
        let mask = history_mask(history);
        let mut best = PolishedPoint::default();
        let mut best_k = 0;

        let row = slide(u, v, 0, 0);
        let mut start = FrontValue {
            row,
            history: 0,
            history_size: 0,
        };
        start.add_matches(row as u64, history, mask);
        self.reservoir.current.push(start);
        if let Some(trace) = self.trace.as_mut() {
            trace.start_front(0);
            trace.push(TraceOp::Start, row as u64);
        }

        let sentinel = (ulen + vlen) as u64 + 1;
        let mut distance = 0;
        while self.finish_front(distance, ulen, vlen, &mut best, &mut best_k) {
            distance += 1;
            if distance >= sentinel {
                return Err(SeedExtendError::AlgorithmicNonTermination {
                    ulen: ulen as usize,
                    vlen: vlen as usize,
                });
            }
            self.next_front(u, v, history, mask);
        }

        if let Some(stats) = self.trimstats.as_mut() {
            stats.add_extension(best.distance);
        }
        self.last_end = Some((best.distance, best_k));
        trace!(
            "[greedy] extension over {ulen}/{vlen} stopped at distance {distance}, polished point {best:?}"
        );
        Ok((distance, best))
    }

    /// Alignment of the last extension up to its polished point; needs the front trace
    pub fn last_alignment(&self) -> Option<Alignment> {
        let trace = self.trace.as_ref()?;
        let (distance, k) = self.last_end?;
        Some(trace.backtrack(distance, k))
    }

    /// Compute front `d` from front `d - 1`
    fn next_front(&mut self, u: &SeqView<'_>, v: &SeqView<'_>, history: u64, mask: u64) {
        let ulen = u.len() as isize;
        let vlen = v.len() as isize;
        let res = &mut self.reservoir;
        std::mem::swap(&mut res.previous, &mut res.current);
        res.previous_lo = res.current_lo;

        let lo = (res.previous_lo - 1).max(-ulen);
        let hi = (res.previous_lo + res.previous.len() as isize).min(vlen);
        res.current.clear();
        res.current_lo = lo;
        if let Some(trace) = self.trace.as_mut() {
            trace.start_front(lo);
        }

        for k in lo..=hi {
            let mut chosen: Option<(FrontValue, TraceOp)> = None;
            // ties keep the earlier candidate
            let mut consider = |candidate: FrontValue, op: TraceOp| {
                if chosen.map_or(true, |(best, _)| candidate.row > best.row) {
                    chosen = Some((candidate, op));
                }
            };
            if let Some(&p) = res.previous_at(k) {
                if p.row < ulen && p.row + k < vlen {
                    consider(FrontValue { row: p.row + 1, ..p }, TraceOp::Mismatch);
                }
            }
            if let Some(&p) = res.previous_at(k + 1) {
                if p.row < ulen {
                    consider(FrontValue { row: p.row + 1, ..p }, TraceOp::Deletion);
                }
            }
            if let Some(&p) = res.previous_at(k - 1) {
                if p.row + k <= vlen {
                    consider(p, TraceOp::Insertion);
                }
            }

            match chosen {
                Some((mut value, op)) => {
                    value.add_difference(history, mask);
                    let row = slide(u, v, value.row, k);
                    let matches = (row - value.row) as u64;
                    value.row = row;
                    value.add_matches(matches, history, mask);
                    res.current.push(value);
                    if let Some(trace) = self.trace.as_mut() {
                        trace.push(op, matches);
                    }
                }
                None => {
                    res.current.push(FrontValue::DEAD);
                    if let Some(trace) = self.trace.as_mut() {
                        trace.push(TraceOp::Unreachable, 0);
                    }
                }
            }
        }
    }

    /// Trim the band ends of the current front, update the polished point and
    /// decide whether to continue
    fn finish_front(
        &mut self,
        distance: u64,
        ulen: isize,
        vlen: isize,
        best: &mut PolishedPoint,
        best_k: &mut isize,
    ) -> bool {
        let res = &mut self.reservoir;
        let lo = res.current_lo;
        if let Some(stats) = self.trimstats.as_mut() {
            stats.add_front(res.current.len() as u64);
        }

        let Some(max_alignedlen) = res
            .current
            .iter()
            .enumerate()
            .filter(|(_, fv)| !fv.is_dead())
            .map(|(idx, fv)| fv.alignedlen(lo + idx as isize))
            .max()
        else {
            return false;
        };

        let reason = |fv: &FrontValue, k: isize| -> Option<TrimReason> {
            if fv.is_dead() {
                Some(TrimReason::Dead)
            } else if fv.history_size >= self.params.history
                && fv.matches_in_history() < self.params.min_match_num
            {
                Some(TrimReason::History)
            } else if fv.alignedlen(k) + (self.params.max_aligned_len_diff as isize) < max_alignedlen {
                Some(TrimReason::Length)
            } else {
                None
            }
        };

        let mut trimmed = Vec::new();
        let mut first = 0;
        let mut last = res.current.len();
        while first < last {
            match reason(&res.current[first], lo + first as isize) {
                Some(r) => {
                    trimmed.push(r);
                    first += 1;
                }
                None => break,
            }
        }
        while last > first {
            match reason(&res.current[last - 1], lo + last as isize - 1) {
                Some(r) => {
                    trimmed.push(r);
                    last -= 1;
                }
                None => break,
            }
        }
        res.current.truncate(last);
        res.current.drain(..first);
        res.current_lo = lo + first as isize;

        if let Some(stats) = self.trimstats.as_mut() {
            for r in trimmed {
                match r {
                    TrimReason::Dead => stats.trimmed_dead += 1,
                    TrimReason::History => stats.trimmed_by_history += 1,
                    TrimReason::Length => stats.trimmed_by_length += 1,
                }
            }
        }
        if res.current.is_empty() {
            return false;
        }

        let lo = res.current_lo;
        let mut reached_end = false;
        for (idx, fv) in res.current.iter().enumerate() {
            if fv.is_dead() {
                continue;
            }
            let k = lo + idx as isize;
            let alignedlen = fv.alignedlen(k) as u64;
            if alignedlen > best.alignedlen && self.polishing.is_polished(fv.history, fv.history_size) {
                *best = PolishedPoint {
                    alignedlen,
                    row: fv.row as u64,
                    distance,
                };
                *best_k = k;
            }
            if fv.row == ulen || fv.row + k == vlen {
                reached_end = true;
            }
        }
        !reached_end
    }
}

fn history_mask(history: u64) -> u64 {
    if history >= 64 {
        u64::MAX
    } else {
        (1u64 << history) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::CharAccessMode;
    use crate::sequence::encode_dna;

    const BASE: &[u8] = b"ACGTTGCAAGGCTTACCGATGCATTGACCAGTGATCGGTA";
    const GT: &[u8] = b"GTTGTGGTTTGTGTGGTGTTGGTGTGTTGG";

    fn extender() -> GreedyExtender {
        GreedyExtender::new(GreedyParams::new(60, 80, 5).unwrap(), 10)
    }

    fn run(ext: &mut GreedyExtender, u: &[u8], v: &[u8]) -> Result<(u64, PolishedPoint)> {
        let u = encode_dna(u);
        let v = encode_dna(v);
        ext.align(
            &SeqView::new(Source::Query(&u), Region::forward(0, u.len())),
            &SeqView::new(Source::Query(&v), Region::forward(0, v.len())),
        )
    }

    #[test]
    fn test_identical_sequences_stop_at_front_zero() {
        let mut ext = extender();
        let (distance, point) = run(&mut ext, BASE, BASE).unwrap();
        assert_eq!(distance, 0);
        assert_eq!(
            point,
            PolishedPoint {
                alignedlen: 80,
                row: 40,
                distance: 0
            }
        );
    }

    #[test]
    fn test_single_mismatch() {
        let mut v = BASE.to_vec();
        v[20] = b'A';
        let mut ext = extender().with_front_trace(true);
        let (_, point) = run(&mut ext, BASE, &v).unwrap();
        assert_eq!(
            point,
            PolishedPoint {
                alignedlen: 80,
                row: 40,
                distance: 1
            }
        );
        assert_eq!(ext.last_alignment().unwrap().cigar(), "20=1X19=");
    }

    #[test]
    fn test_insertion_traced() {
        let mut v = GT[..15].to_vec();
        v.push(b'A');
        v.extend_from_slice(&GT[15..]);
        let mut ext = extender().with_front_trace(true);
        let (_, point) = run(&mut ext, GT, &v).unwrap();
        assert_eq!(point.alignedlen, 61);
        assert_eq!(point.row, 30);
        assert_eq!(point.column(), 31);
        assert_eq!(point.distance, 1);
        let aln = ext.last_alignment().unwrap();
        assert_eq!(aln.distance(), 1);
        assert_eq!(aln.ulen(), 30);
        assert_eq!(aln.vlen(), 31);
    }

    #[test]
    fn test_unrelated_tail_is_not_polished() {
        let mut u = GT.to_vec();
        u.extend_from_slice(&[b'A'; 30]);
        let mut v = GT.to_vec();
        v.extend_from_slice(&[b'C'; 30]);
        let mut ext = extender().with_trim_statistics(true);
        let (distance, point) = run(&mut ext, &u, &v).unwrap();
        assert_eq!(
            point,
            PolishedPoint {
                alignedlen: 60,
                row: 30,
                distance: 0
            }
        );
        assert!(distance > 0);
        let stats = ext.trim_stats().unwrap();
        assert_eq!(stats.extensions, 1);
        assert!(stats.fronts > 1);
        assert!(stats.total_trimmed() > 0);
    }

    #[test]
    fn test_empty_regions() {
        let mut ext = extender();
        assert!(matches!(
            run(&mut ext, b"", b""),
            Err(SeedExtendError::AlgorithmicNonTermination { .. })
        ));
        let (distance, point) = run(&mut ext, b"", b"ACGT").unwrap();
        assert_eq!(distance, 0);
        assert_eq!(point, PolishedPoint::default());
    }

    #[test]
    fn test_backward_region_mirrors_forward() {
        let u = encode_dna(BASE);
        let mut v = u.clone();
        v[7] = 3;
        v.insert(25, 1);
        let urev: Vec<u8> = u.iter().rev().copied().collect();
        let vrev: Vec<u8> = v.iter().rev().copied().collect();

        let mut ext = extender();
        let mut access = SequenceAccess::new(CharAccessMode::Direct);
        let fwd = ext
            .align_region(
                &mut access,
                Source::Query(&u),
                Region::forward(0, u.len()),
                Source::Query(&v),
                Region::forward(0, v.len()),
            )
            .unwrap();
        let bwd = ext
            .align_region(
                &mut access,
                Source::Query(&urev),
                Region::backward_from(urev.len(), urev.len()),
                Source::Query(&vrev),
                Region::backward_from(vrev.len(), vrev.len()),
            )
            .unwrap();
        assert_eq!(fwd, bwd);
    }

    #[test]
    fn test_relax_recomputes_polishing() {
        let mut ext = extender();
        assert_eq!(ext.params().min_match_num, 48);
        assert_eq!(ext.polishing().cut_depth, 24);
        ext.relax(10);
        assert_eq!(ext.params().perc_mat_history, 70);
        assert_eq!(ext.params().min_match_num, 42);
        assert_eq!(ext.polishing().cut_depth, 21);
    }
}
