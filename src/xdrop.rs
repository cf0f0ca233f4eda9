//! Greedy X-drop extension (Zhang, Schwartz, Wagner, Miller 2000).
//!
//! Fronts are indexed by accumulated difference cost `c`. Front `c` stores,
//! for every diagonal `k = j - i`, the furthest row `i` reachable at exactly
//! that cost. A point scores `(i + j) * mat / 2 - c`, so the search can drop a
//! diagonal as soon as its score falls more than the threshold below the best
//! score seen so far.
//!
//! The extension always starts at the seed boundary, index 0 of both views.
//! Left extensions pass backward views, so the same routine serves both
//! directions.

use crate::access::{slide, SeqView};
use crate::error::ConfigError;
use crate::scoring::{DifferenceCosts, ScoringScheme};

const DEAD: isize = -1;

/// Best point of one extension: characters consumed in u and v, and its score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XdropBest {
    pub ivalue: usize,
    pub jvalue: usize,
    pub score: i64,
}

#[derive(Debug, Clone, Copy)]
struct FrontLevel {
    lo: isize,
    hi: isize,
    offset: usize, // index of diagonal `lo` in the row buffer
}

impl FrontLevel {
    fn is_empty(&self) -> bool {
        self.lo > self.hi
    }
}

/// Scratch space of the X-drop engine, reused across extensions.
///
/// All fronts of one extension live in one flat row buffer. Nothing is
/// released between extensions; `reset` only clears the contents.
#[derive(Debug, Default)]
pub struct XdropResources {
    levels: Vec<FrontLevel>,
    rows: Vec<isize>,
    scratch: Vec<isize>,
}

impl XdropResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.levels.clear();
        self.rows.clear();
        self.scratch.clear();
    }

    /// Number of row slots currently allocated
    pub fn capacity(&self) -> usize {
        self.rows.capacity()
    }

    fn row(&self, cost: i64, k: isize) -> Option<isize> {
        if cost < 0 {
            return None;
        }
        let level = self.levels.get(cost as usize)?;
        if k < level.lo || k > level.hi {
            return None;
        }
        let row = self.rows[level.offset + (k - level.lo) as usize];
        (row != DEAD).then_some(row)
    }

    fn diagonal_range(&self, cost: i64, shift: isize) -> Option<(isize, isize)> {
        if cost < 0 {
            return None;
        }
        let level = self.levels.get(cost as usize)?;
        (!level.is_empty()).then_some((level.lo + shift, level.hi + shift))
    }

    /// Append a front for diagonals starting at `lo`, dropping dead diagonals at both ends
    fn push_level(&mut self, lo: isize, rows: &[isize]) {
        let first = rows.iter().position(|&r| r != DEAD);
        let last = rows.iter().rposition(|&r| r != DEAD);
        let offset = self.rows.len();
        match (first, last) {
            (Some(first), Some(last)) => {
                self.rows.extend_from_slice(&rows[first..=last]);
                self.levels.push(FrontLevel {
                    lo: lo + first as isize,
                    hi: lo + last as isize,
                    offset,
                });
            }
            _ => self.levels.push(FrontLevel {
                lo: 0,
                hi: -1,
                offset,
            }),
        }
    }
}

/// Score-bounded greedy extension with a fixed drop threshold
#[derive(Debug)]
pub struct XdropExtender {
    scheme: ScoringScheme,
    costs: DifferenceCosts,
    xdrop_below: i64,
    resources: XdropResources,
}

impl XdropExtender {
    pub fn new(scheme: ScoringScheme, xdrop_below: i64) -> Result<Self, ConfigError> {
        scheme.validate()?;
        if xdrop_below <= 0 {
            return Err(ConfigError::InvalidScoring(format!(
                "x-drop threshold {xdrop_below} must be positive"
            )));
        }
        Ok(XdropExtender {
            scheme,
            costs: scheme.difference_costs(),
            xdrop_below,
            resources: XdropResources::new(),
        })
    }

    pub fn scheme(&self) -> &ScoringScheme {
        &self.scheme
    }

    pub fn xdrop_below(&self) -> i64 {
        self.xdrop_below
    }

    pub fn resources(&self) -> &XdropResources {
        &self.resources
    }

    pub fn reset(&mut self) {
        self.resources.reset();
    }

    /// Extend from the start of both views and return the best scoring point.
    /// An empty view gives the zero outcome.
    pub fn extend(&mut self, u: &SeqView<'_>, v: &SeqView<'_>) -> XdropBest {
        let ulen = u.len() as isize;
        let vlen = v.len() as isize;
        if ulen == 0 || vlen == 0 {
            return XdropBest::default();
        }
        self.resources.reset();

        let half = self.scheme.mat / 2;
        let costs = self.costs;
        let start = slide(u, v, 0, 0);
        let mut best = XdropBest {
            ivalue: start as usize,
            jvalue: start as usize,
            score: 2 * start as i64 * half,
        };
        self.resources.push_level(0, &[start]);

        // transitions reach back at most max_cost levels
        let max_cost = costs.max_cost();
        let mut empty_run = 0;
        let mut cost: i64 = 0;
        let mut rows = std::mem::take(&mut self.resources.scratch);
        while empty_run < max_cost {
            cost += 1;
            let threshold = best.score - self.xdrop_below;
            let res = &self.resources;

            let mut lo = isize::MAX;
            let mut hi = isize::MIN;
            for (source, shift) in [
                (cost - costs.mismatch, 0),
                (cost - costs.deletion, -1),
                (cost - costs.insertion, 1),
            ] {
                if let Some((l, h)) = res.diagonal_range(source, shift) {
                    lo = lo.min(l);
                    hi = hi.max(h);
                }
            }
            lo = lo.max(-ulen);
            hi = hi.min(vlen);

            rows.clear();
            if lo <= hi {
                for k in lo..=hi {
                    let mut row = DEAD;
                    if let Some(r) = res.row(cost - costs.mismatch, k) {
                        if r < ulen && r + k < vlen {
                            row = row.max(r + 1);
                        }
                    }
                    // deletion consumes one character of u
                    if let Some(r) = res.row(cost - costs.deletion, k + 1) {
                        if r < ulen {
                            row = row.max(r + 1);
                        }
                    }
                    // insertion consumes one character of v
                    if let Some(r) = res.row(cost - costs.insertion, k - 1) {
                        if r + k <= vlen {
                            row = row.max(r);
                        }
                    }
                    if row != DEAD {
                        row = slide(u, v, row, k);
                        let score = (2 * row + k) as i64 * half - cost;
                        if score < threshold {
                            row = DEAD;
                        } else if score > best.score {
                            best = XdropBest {
                                ivalue: row as usize,
                                jvalue: (row + k) as usize,
                                score,
                            };
                        }
                    }
                    rows.push(row);
                }
            }
            let before = self.resources.levels.len();
            self.resources.push_level(lo, &rows);
            if self.resources.levels[before].is_empty() {
                empty_run += 1;
            } else {
                empty_run = 0;
            }
        }
        self.resources.scratch = rows;
        best
    }
}
