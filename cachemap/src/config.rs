use std::ops::RangeInclusive;
use serde::{Deserialize, Serialize};
use crate::bitfield::BitField;
use crate::error::SimError;
use crate::replacement_policies::fetch_block;
use crate::store::LineRef;

/// Widest address the simulator accepts, tag space plus word offset
pub const MAX_ADDRESS_BITS: u8 = 20;

const WORD_BITS_RANGE: RangeInclusive<u8> = 1..=4;
const INDEX_BITS_RANGE: RangeInclusive<u8> = 1..=8;
const WAY_BITS_RANGE: RangeInclusive<u8> = 1..=4;
const TAG_SPACE_BITS_RANGE: RangeInclusive<u8> = 1..=16;
const FULLY_ASSOCIATIVE_LINES: RangeInclusive<u32> = 2..=16;

/// A configuration for a single cache, as edited by the user
///
/// Sizes are given as counts, not bit widths. Which of `lines`, `sets` and `ways` are required
/// depends on the kind of mapping
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub name: String,
    pub kind: MappingKind,
    /// Words per block, 2^w
    pub block_size: u32,
    /// Lines in the cache, 2^r for direct mapped caches or any count for fully associative ones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<u32>,
    /// Sets in a set associative cache, 2^r
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sets: Option<u32>,
    /// Ways per set in a set associative cache, 2^v
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ways: Option<u32>,
    /// Blocks in backing memory, 2^s
    pub memory_blocks: u32,
    /// Lines filled before the first access, for deterministic demonstrations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preload: Vec<PreloadLine>,
}

/// The kind of mapping - direct, full, or set
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum MappingKind {
    #[serde(alias = "direct")]
    Direct,
    #[serde(alias = "full")]
    Full,
    #[serde(alias = "set")]
    SetAssociative,
}

/// A line to fill when the cache is initialised
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PreloadLine {
    pub line: usize,
    /// Required for set associative caches, where `line` is the set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub way: Option<usize>,
    pub tag: String,
    /// Defaults to the contents of the block the tag names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u32>>,
}

/// The validated shape of a cache, expressed in address bits
///
/// Only obtainable through [`CacheConfig::validate`], so every instance satisfies the
/// configuration rules
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
pub struct CacheGeometry {
    kind: MappingKind,
    word_bits: u8,
    index_bits: u8,
    way_bits: u8,
    tag_space_bits: u8,
    lines: usize,
}

impl CacheConfig {
    pub fn direct(name: &str, block_size: u32, lines: u32, memory_blocks: u32) -> Self {
        Self::with_kind(name, MappingKind::Direct, block_size, memory_blocks).with_lines(lines)
    }

    pub fn fully_associative(name: &str, block_size: u32, lines: u32, memory_blocks: u32) -> Self {
        Self::with_kind(name, MappingKind::Full, block_size, memory_blocks).with_lines(lines)
    }

    pub fn set_associative(name: &str, block_size: u32, sets: u32, ways: u32, memory_blocks: u32) -> Self {
        Self {
            sets: Some(sets),
            ways: Some(ways),
            ..Self::with_kind(name, MappingKind::SetAssociative, block_size, memory_blocks)
        }
    }

    fn with_kind(name: &str, kind: MappingKind, block_size: u32, memory_blocks: u32) -> Self {
        Self {
            name: name.to_string(),
            kind,
            block_size,
            lines: None,
            sets: None,
            ways: None,
            memory_blocks,
            preload: Vec::new(),
        }
    }

    fn with_lines(self, lines: u32) -> Self {
        Self { lines: Some(lines), ..self }
    }

    /// Checks every rule and derives the bit widths. The first broken rule is reported, naming
    /// the parameter at fault
    ///
    /// Powers of two are checked first, then ranges, then the relationships between fields
    pub fn validate(&self) -> Result<CacheGeometry, SimError> {
        let word_bits = exact_log2("block_size", self.block_size)?;
        let (index_bits, way_bits, fully_associative_lines) = match self.kind {
            MappingKind::Direct => {
                unused("sets", self.sets)?;
                unused("ways", self.ways)?;
                (exact_log2("lines", required("lines", self.lines)?)?, 0, None)
            }
            MappingKind::Full => {
                unused("sets", self.sets)?;
                unused("ways", self.ways)?;
                (0, 0, Some(required("lines", self.lines)?))
            }
            MappingKind::SetAssociative => {
                unused("lines", self.lines)?;
                let sets = exact_log2("sets", required("sets", self.sets)?)?;
                let ways = exact_log2("ways", required("ways", self.ways)?)?;
                (sets, ways, None)
            }
        };
        let tag_space_bits = exact_log2("memory_blocks", self.memory_blocks)?;

        within("block_size", word_bits, WORD_BITS_RANGE)?;
        match self.kind {
            MappingKind::Direct => within("lines", index_bits, INDEX_BITS_RANGE)?,
            MappingKind::SetAssociative => {
                within("sets", index_bits, INDEX_BITS_RANGE)?;
                within("ways", way_bits, WAY_BITS_RANGE)?;
            }
            MappingKind::Full => {}
        }
        if let Some(lines) = fully_associative_lines {
            if !FULLY_ASSOCIATIVE_LINES.contains(&lines) {
                return Err(SimError::config("lines", format!(
                    "must be between {} and {}, got {lines}",
                    FULLY_ASSOCIATIVE_LINES.start(),
                    FULLY_ASSOCIATIVE_LINES.end()
                )));
            }
        }

        match self.kind {
            // The whole block number is the tag, so the range alone leaves a tag bit
            MappingKind::Full => within("memory_blocks", tag_space_bits, TAG_SPACE_BITS_RANGE)?,
            MappingKind::Direct | MappingKind::SetAssociative => {
                // At least one tag bit has to remain once the index is taken out of the block number
                if tag_space_bits <= index_bits {
                    return Err(SimError::config("memory_blocks", format!(
                        "must be greater than the number of {} (2^{index_bits}), got 2^{tag_space_bits}",
                        if self.kind == MappingKind::SetAssociative { "sets" } else { "lines" }
                    )));
                }
                within("memory_blocks", tag_space_bits, TAG_SPACE_BITS_RANGE)?;
            }
        }
        if tag_space_bits + word_bits > MAX_ADDRESS_BITS {
            return Err(SimError::config("memory_blocks", format!(
                "the address (s + w = {tag_space_bits} + {word_bits}) must not exceed {MAX_ADDRESS_BITS} bits"
            )));
        }

        let lines = match fully_associative_lines {
            Some(lines) => lines as usize,
            None => 1 << (index_bits + way_bits),
        };
        Ok(CacheGeometry { kind: self.kind, word_bits, index_bits, way_bits, tag_space_bits, lines })
    }

    /// Resolves the preload list against a geometry, returning the line, tag, and block contents
    /// of each entry
    pub fn preloaded_lines(&self, geometry: &CacheGeometry) -> Result<Vec<(LineRef, BitField, Vec<u32>)>, SimError> {
        self.preload.iter().map(|entry| entry.resolve(geometry)).collect()
    }
}

impl PreloadLine {
    fn resolve(&self, geometry: &CacheGeometry) -> Result<(LineRef, BitField, Vec<u32>), SimError> {
        let (line, set) = match (geometry.kind(), self.way) {
            (MappingKind::SetAssociative, Some(way)) => {
                if self.line >= geometry.set_count() || way >= geometry.ways_per_set() {
                    return Err(SimError::config("preload", format!(
                        "set {} way {way} is outside the cache ({} sets of {} ways)",
                        self.line,
                        geometry.set_count(),
                        geometry.ways_per_set()
                    )));
                }
                (LineRef::Way { set: self.line, way }, self.line)
            }
            (MappingKind::SetAssociative, None) => {
                return Err(SimError::config("preload", "set associative entries need a way"));
            }
            (_, Some(_)) => {
                return Err(SimError::config("preload", "only set associative entries have a way"));
            }
            (kind, None) => {
                if self.line >= geometry.lines() {
                    return Err(SimError::config("preload", format!(
                        "line {} is outside the cache ({} lines)",
                        self.line,
                        geometry.lines()
                    )));
                }
                // Fully associative blocks carry no index bits
                let set = if kind == MappingKind::Full { 0 } else { self.line };
                (LineRef::Line(self.line), set)
            }
        };
        // Checked before parsing, whose length errors are worded for addresses
        if self.tag.chars().count() != geometry.tag_bits() as usize {
            return Err(SimError::config("preload", format!(
                "tag {:?} must have exactly {} bits",
                self.tag,
                geometry.tag_bits()
            )));
        }
        let tag = BitField::parse(&self.tag)
            .map_err(|_| SimError::config("preload", format!("tag {:?} may only contain 0 and 1", self.tag)))?;
        let data = match &self.data {
            Some(data) if data.len() != geometry.block_size() => {
                return Err(SimError::config("preload", format!(
                    "data for line {} must hold exactly {} words, got {}",
                    self.line,
                    geometry.block_size(),
                    data.len()
                )));
            }
            Some(data) => data.clone(),
            None => fetch_block(geometry, geometry.block_number(tag.value(), set)),
        };
        Ok((line, tag, data))
    }
}

impl CacheGeometry {
    pub fn kind(&self) -> MappingKind {
        self.kind
    }

    /// w, bits selecting a word within a block
    pub fn word_bits(&self) -> u8 {
        self.word_bits
    }

    /// r, bits selecting a line or a set. Zero for fully associative caches
    pub fn index_bits(&self) -> u8 {
        self.index_bits
    }

    /// v, bits counting the ways of a set. Zero unless set associative
    pub fn way_bits(&self) -> u8 {
        self.way_bits
    }

    /// s, bits naming a block of backing memory
    pub fn tag_space_bits(&self) -> u8 {
        self.tag_space_bits
    }

    pub fn tag_bits(&self) -> u8 {
        self.tag_space_bits - self.index_bits
    }

    pub fn address_bits(&self) -> u8 {
        self.tag_space_bits + self.word_bits
    }

    pub fn block_size(&self) -> usize {
        1 << self.word_bits
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn set_count(&self) -> usize {
        match self.kind {
            MappingKind::Full => 1,
            _ => 1 << self.index_bits,
        }
    }

    pub fn ways_per_set(&self) -> usize {
        self.lines / self.set_count()
    }

    /// Number of the memory block with the given tag which maps to `set`
    pub fn block_number(&self, tag: u32, set: usize) -> u32 {
        match self.kind {
            MappingKind::Full => tag,
            _ => tag << self.index_bits | set as u32,
        }
    }
}

fn required(parameter: &'static str, value: Option<u32>) -> Result<u32, SimError> {
    value.ok_or_else(|| SimError::config(parameter, "is required for this kind of cache"))
}

fn unused(parameter: &'static str, value: Option<u32>) -> Result<(), SimError> {
    match value {
        Some(_) => Err(SimError::config(parameter, "is not used by this kind of cache")),
        None => Ok(()),
    }
}

fn exact_log2(parameter: &'static str, value: u32) -> Result<u8, SimError> {
    if value.is_power_of_two() {
        Ok(value.trailing_zeros() as u8)
    } else {
        Err(SimError::config(parameter, format!("must be a power of two, got {value}")))
    }
}

fn within(parameter: &'static str, bits: u8, range: RangeInclusive<u8>) -> Result<(), SimError> {
    if range.contains(&bits) {
        Ok(())
    } else {
        Err(SimError::config(parameter, format!(
            "must be between 2^{} and 2^{}, got 2^{bits}",
            range.start(),
            range.end()
        )))
    }
}
