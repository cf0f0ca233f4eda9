//! Front trace of the greedy engine and the alignments it reconstructs.
//!
//! Every front entry remembers how it was reached from the previous front
//! and how many matches it slid over afterwards. Walking these records back
//! from an entry yields the alignment ending at that entry.

use std::fmt;

/// Run-length encoded alignment operation.
/// `Insertion` consumes only v, `Deletion` consumes only u.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    Match(u64),
    Mismatch(u64),
    Insertion(u64),
    Deletion(u64),
}

impl EditOp {
    pub fn count(&self) -> u64 {
        match *self {
            EditOp::Match(n) | EditOp::Mismatch(n) | EditOp::Insertion(n) | EditOp::Deletion(n) => n,
        }
    }

    fn symbol(&self) -> char {
        match self {
            EditOp::Match(_) => '=',
            EditOp::Mismatch(_) => 'X',
            EditOp::Insertion(_) => 'I',
            EditOp::Deletion(_) => 'D',
        }
    }

    fn merge(&mut self, other: EditOp) -> bool {
        match (self, other) {
            (EditOp::Match(n), EditOp::Match(m))
            | (EditOp::Mismatch(n), EditOp::Mismatch(m))
            | (EditOp::Insertion(n), EditOp::Insertion(m))
            | (EditOp::Deletion(n), EditOp::Deletion(m)) => {
                *n += m;
                true
            }
            _ => false,
        }
    }
}

/// An alignment as a list of run-length encoded operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alignment {
    ops: Vec<EditOp>,
}

impl Alignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Append an operation, merging it with the last run of the same kind
    pub fn push(&mut self, op: EditOp) {
        if op.count() == 0 {
            return;
        }
        if let Some(last) = self.ops.last_mut() {
            if last.merge(op) {
                return;
            }
        }
        self.ops.push(op);
    }

    pub fn append(&mut self, other: &Alignment) {
        for &op in &other.ops {
            self.push(op);
        }
    }

    /// The same alignment read from its end
    pub fn reversed(&self) -> Alignment {
        Alignment {
            ops: self.ops.iter().rev().copied().collect(),
        }
    }

    /// Characters of u covered
    pub fn ulen(&self) -> u64 {
        self.ops
            .iter()
            .map(|op| match op {
                EditOp::Match(n) | EditOp::Mismatch(n) | EditOp::Deletion(n) => *n,
                EditOp::Insertion(_) => 0,
            })
            .sum()
    }

    /// Characters of v covered
    pub fn vlen(&self) -> u64 {
        self.ops
            .iter()
            .map(|op| match op {
                EditOp::Match(n) | EditOp::Mismatch(n) | EditOp::Insertion(n) => *n,
                EditOp::Deletion(_) => 0,
            })
            .sum()
    }

    /// Number of unit-cost differences
    pub fn distance(&self) -> u64 {
        self.ops
            .iter()
            .filter(|op| !matches!(op, EditOp::Match(_)))
            .map(|op| op.count())
            .sum()
    }

    /// Extended CIGAR string, e.g. `12=1X3=1I5=`
    pub fn cigar(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in &self.ops {
            write!(f, "{}{}", op.count(), op.symbol())?;
        }
        Ok(())
    }
}

/// How a front entry was reached from the previous front
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TraceOp {
    Start,
    Mismatch,
    Deletion,
    Insertion,
    Unreachable,
}

#[derive(Debug, Clone, Copy)]
struct TraceEntry {
    op: TraceOp,
    matches: u64,
}

#[derive(Debug, Clone, Copy)]
struct TraceFront {
    lo: isize,
    offset: usize,
    len: usize,
}

/// Per-front predecessor records, reused across extensions
#[derive(Debug, Default)]
pub struct FrontTrace {
    fronts: Vec<TraceFront>,
    entries: Vec<TraceEntry>,
}

impl FrontTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.fronts.clear();
        self.entries.clear();
    }

    /// Begin the records of the next front; its first diagonal is `lo`
    pub(crate) fn start_front(&mut self, lo: isize) {
        self.fronts.push(TraceFront {
            lo,
            offset: self.entries.len(),
            len: 0,
        });
    }

    /// Record the next diagonal of the current front
    pub(crate) fn push(&mut self, op: TraceOp, matches: u64) {
        self.entries.push(TraceEntry {
            op,
            matches,
        });
        if let Some(front) = self.fronts.last_mut() {
            front.len += 1;
        }
    }

    fn entry(&self, distance: usize, k: isize) -> TraceEntry {
        let front = &self.fronts[distance];
        let idx = k - front.lo;
        assert!(
            idx >= 0 && (idx as usize) < front.len,
            "diagonal {k} not recorded in front {distance}"
        );
        self.entries[front.offset + idx as usize]
    }

    /// Alignment from the start of both sequences to the entry on diagonal `k` of front `distance`
    pub fn backtrack(&self, distance: u64, k: isize) -> Alignment {
        let mut reversed = Alignment::new();
        let mut d = distance as usize;
        let mut k = k;
        loop {
            let entry = self.entry(d, k);
            reversed.push(EditOp::Match(entry.matches));
            match entry.op {
                TraceOp::Start => break,
                TraceOp::Mismatch => reversed.push(EditOp::Mismatch(1)),
                TraceOp::Deletion => {
                    reversed.push(EditOp::Deletion(1));
                    k += 1;
                }
                TraceOp::Insertion => {
                    reversed.push(EditOp::Insertion(1));
                    k -= 1;
                }
                TraceOp::Unreachable => {
                    panic!("backtrack through unreachable diagonal {k} of front {d}")
                }
            }
            d -= 1;
        }
        reversed.reversed()
    }
}
