//! Character access for the extension engines.
//!
//! Engines see both sequences as [`SeqView`]s indexed from the seed boundary
//! outwards, so one forward routine serves both directions. How characters are
//! fetched is decided by the [`CharAccessMode`].

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::sequence::{chars_match, EncodedCollection};

/// How the access shim reads characters of the collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharAccessMode {
    /// Random access to the collection for every character
    Direct,
    /// Copy each extension range once into a per-direction cache
    BufferedReader,
    /// Direct when the collection has cheap random access, buffered otherwise
    #[default]
    Automatic,
}

impl CharAccessMode {
    fn buffered_for(&self, collection: &dyn EncodedCollection) -> bool {
        match self {
            CharAccessMode::Direct => false,
            CharAccessMode::BufferedReader => true,
            CharAccessMode::Automatic => !collection.has_fast_random_access(),
        }
    }
}

impl FromStr for CharAccessMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "encseq" => Ok(CharAccessMode::Direct),
            "encseq_reader" => Ok(CharAccessMode::BufferedReader),
            "" => Ok(CharAccessMode::Automatic),
            other => Err(ConfigError::InvalidCharAccessMode(other.to_string())),
        }
    }
}

impl fmt::Display for CharAccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharAccessMode::Direct => write!(f, "encseq"),
            CharAccessMode::BufferedReader => write!(f, "encseq_reader"),
            CharAccessMode::Automatic => write!(f, ""),
        }
    }
}

/// Where the characters of one side of a seed come from
#[derive(Clone, Copy)]
pub enum Source<'a> {
    Collection(&'a dyn EncodedCollection),
    Query(&'a [u8]),
}

/// A range of `len` positions starting at `start`.
/// Backward regions are read from their last position towards `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub start: usize,
    pub len: usize,
    pub forward: bool,
}

impl Region {
    /// Region read from `start` towards higher positions
    pub fn forward(start: usize, len: usize) -> Self {
        Region {
            start,
            len,
            forward: true,
        }
    }

    /// Region ending just before `end`, read towards lower positions
    pub fn backward_from(end: usize, len: usize) -> Self {
        Region {
            start: end - len,
            len,
            forward: false,
        }
    }
}

/// One side of an extension, indexed from the seed boundary outwards
#[derive(Clone, Copy)]
pub enum SeqView<'a> {
    Collection {
        collection: &'a dyn EncodedCollection,
        region: Region,
    },
    Buffer {
        data: &'a [u8],
        region: Region,
    },
}

impl<'a> SeqView<'a> {
    pub fn new(source: Source<'a>, region: Region) -> Self {
        match source {
            Source::Collection(collection) => SeqView::Collection { collection, region },
            Source::Query(data) => SeqView::Buffer { data, region },
        }
    }

    fn region(&self) -> &Region {
        match self {
            SeqView::Collection { region, .. } | SeqView::Buffer { region, .. } => region,
        }
    }

    pub fn len(&self) -> usize {
        self.region().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Character `i` positions away from the seed boundary
    #[inline]
    pub fn char_at(&self, i: usize) -> u8 {
        let region = self.region();
        debug_assert!(i < region.len);
        let pos = if region.forward {
            region.start + i
        } else {
            region.start + region.len - 1 - i
        };
        match self {
            SeqView::Collection { collection, .. } => collection.encoded_char(pos),
            SeqView::Buffer { data, .. } => data[pos],
        }
    }
}

/// Advance along diagonal `k = j - i` from `row` while the characters of `u` and `v` match
#[inline]
pub(crate) fn slide(u: &SeqView<'_>, v: &SeqView<'_>, mut row: isize, k: isize) -> isize {
    let ulen = u.len() as isize;
    let vlen = v.len() as isize;
    while row < ulen
        && row + k < vlen
        && chars_match(u.char_at(row as usize), v.char_at((row + k) as usize))
    {
        row += 1;
    }
    row
}

/// Builds views for the two sides of an extension, owning the per-direction caches.
///
/// The caches grow to the longest range seen and are reused, never shrunk.
#[derive(Debug, Default)]
pub struct SequenceAccess {
    mode: CharAccessMode,
    ucache: Vec<u8>,
    vcache: Vec<u8>,
}

impl SequenceAccess {
    pub fn new(mode: CharAccessMode) -> Self {
        SequenceAccess {
            mode,
            ucache: Vec::new(),
            vcache: Vec::new(),
        }
    }

    pub fn mode(&self) -> CharAccessMode {
        self.mode
    }

    /// Views over `uregion` of `usource` and `vregion` of `vsource`
    pub fn views<'a>(
        &'a mut self,
        usource: Source<'a>,
        uregion: Region,
        vsource: Source<'a>,
        vregion: Region,
    ) -> (SeqView<'a>, SeqView<'a>) {
        let mode = self.mode;
        let u = Self::view(mode, &mut self.ucache, usource, uregion);
        let v = Self::view(mode, &mut self.vcache, vsource, vregion);
        (u, v)
    }

    fn view<'a>(
        mode: CharAccessMode,
        cache: &'a mut Vec<u8>,
        source: Source<'a>,
        region: Region,
    ) -> SeqView<'a> {
        match source {
            Source::Collection(collection) if mode.buffered_for(collection) => {
                cache.clear();
                collection.extract_range(region.start, region.len, !region.forward, cache);
                SeqView::Buffer {
                    data: cache.as_slice(),
                    region: Region::forward(0, region.len),
                }
            }
            _ => SeqView::new(source, region),
        }
    }
}
