use std::fmt::{Display, Formatter};
use rand::Rng;
use serde::Serialize;
use crate::bitfield::BitField;
use crate::config::{CacheGeometry, MappingKind};

/// Share of lines holding a block after [`LineStore::randomise`]
const RANDOM_FILL_RATIO: f64 = 0.7;

/// One line of the cache
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct CacheLine {
    pub valid: bool,
    pub tag: BitField,
    pub data: Vec<u32>,
}

impl CacheLine {
    fn empty(geometry: &CacheGeometry) -> Self {
        Self {
            valid: false,
            tag: BitField::zero(geometry.tag_bits()),
            data: vec![0; geometry.block_size()],
        }
    }

    /// A line only matches when it holds a block; the tag of an invalid line is never compared
    pub fn matches(&self, tag: &BitField) -> bool {
        self.valid && self.tag == *tag
    }
}

/// Reference to a line, in the form the organisation of the cache uses
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize)]
pub enum LineRef {
    /// Direct mapped and fully associative caches
    Line(usize),
    /// Set associative caches
    Way { set: usize, way: usize },
}

impl Display for LineRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LineRef::Line(line) => write!(f, "L{line}"),
            LineRef::Way { set, way } => write!(f, "set {set}, way {way}"),
        }
    }
}

/// Owns the lines of the active cache
///
/// Lines are kept in a single vector, with each set occupying a contiguous run of
/// `ways_per_set` lines. A direct mapped cache is then a cache of single-line sets, and a fully
/// associative cache is a single set holding every line
#[derive(Debug, Clone, Serialize)]
pub struct LineStore {
    geometry: CacheGeometry,
    lines: Vec<CacheLine>,
}

impl LineStore {
    /// Allocates every line for the geometry, all invalid
    pub fn initialize(geometry: &CacheGeometry) -> Self {
        Self {
            geometry: *geometry,
            lines: vec![CacheLine::empty(geometry); geometry.lines()],
        }
    }

    pub fn geometry(&self) -> &CacheGeometry {
        &self.geometry
    }

    pub fn read(&self, line: LineRef) -> &CacheLine {
        &self.lines[self.flat_index(line)]
    }

    /// Installs a block. This is the only way a line changes after initialisation
    ///
    /// Panics if the reference is out of range or the tag or block don't fit the geometry
    pub fn replace(&mut self, line: LineRef, tag: BitField, data: Vec<u32>) {
        assert_eq!(tag.width(), self.geometry.tag_bits(), "tag width doesn't match the cache");
        assert_eq!(data.len(), self.geometry.block_size(), "block size doesn't match the cache");
        let index = self.flat_index(line);
        self.lines[index] = CacheLine { valid: true, tag, data };
    }

    /// Every line, sets laid out one after another
    pub fn lines(&self) -> &[CacheLine] {
        &self.lines
    }

    pub fn sets(&self) -> impl Iterator<Item = &[CacheLine]> {
        self.lines.chunks(self.geometry.ways_per_set())
    }

    pub fn ways_per_set(&self) -> usize {
        self.geometry.ways_per_set()
    }

    /// Converts a position in [`LineStore::lines`] to a reference
    pub fn line_ref(&self, index: usize) -> LineRef {
        assert!(index < self.lines.len(), "line {index} is outside the cache");
        match self.geometry.kind() {
            MappingKind::SetAssociative => {
                let ways = self.ways_per_set();
                LineRef::Way { set: index / ways, way: index % ways }
            }
            _ => LineRef::Line(index),
        }
    }

    /// Converts a reference to a position in [`LineStore::lines`]
    ///
    /// Panics if the reference is out of range, or is the wrong form for this cache
    pub fn flat_index(&self, line: LineRef) -> usize {
        let index = match (self.geometry.kind(), line) {
            (MappingKind::SetAssociative, LineRef::Way { set, way }) => {
                assert!(way < self.ways_per_set(), "way {way} is outside the set");
                set * self.ways_per_set() + way
            }
            (MappingKind::Direct | MappingKind::Full, LineRef::Line(index)) => index,
            (kind, line) => panic!("{line:?} can't address a {kind:?} cache"),
        };
        assert!(index < self.lines.len(), "{line} is outside the cache");
        index
    }

    /// Gets the number of lines which don't hold a block. Useful for analysing cache behaviour
    /// or debugging
    pub fn get_invalid_line_count(&self) -> usize {
        self.lines.iter().filter(|line| !line.valid).count()
    }

    /// Fills roughly 70% of the lines with random tags and data, for demonstrations
    ///
    /// The rest keep whatever they held. Seed the generator to make the result reproducible
    pub fn randomise<R: Rng>(&mut self, rng: &mut R) {
        let tag_limit = 1u32 << self.geometry.tag_bits();
        let word_limit = 1u32 << self.geometry.address_bits();
        for index in 0..self.lines.len() {
            if !rng.gen_bool(RANDOM_FILL_RATIO) {
                continue;
            }
            let tag = BitField::new(rng.gen_range(0..tag_limit), self.geometry.tag_bits());
            let data = (0..self.geometry.block_size())
                .map(|_| rng.gen_range(0..word_limit))
                .collect();
            self.replace(self.line_ref(index), tag, data);
        }
    }
}
