use std::ops::Range;
use log::trace;
use serde::Serialize;
use crate::bitfield::{BitField, ParsedAddress};
use crate::config::MappingKind;
use crate::store::{LineRef, LineStore};

/// Where a block may be placed. The three mappings only differ in which lines are candidates
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
pub enum Placement {
    /// Exactly one line, chosen by the index bits
    DirectMapped { index: usize },
    /// Any line
    FullyAssociative,
    /// Any way of the set chosen by the index bits
    SetAssociative { set: usize },
}

impl Placement {
    /// Picks the placement for an address decoded against a cache of the given kind
    ///
    /// Panics if the address was decoded for another kind of cache
    pub fn for_address(address: &ParsedAddress, kind: MappingKind) -> Self {
        match (kind, address.index_value()) {
            (MappingKind::Direct, Some(index)) => Placement::DirectMapped { index },
            (MappingKind::Full, None) => Placement::FullyAssociative,
            (MappingKind::SetAssociative, Some(set)) => Placement::SetAssociative { set },
            (kind, index) => panic!("index {index:?} doesn't belong to a {kind:?} cache"),
        }
    }

    /// The candidate lines as a range of positions in [`LineStore::lines`], in search order
    pub fn domain(&self, store: &LineStore) -> Range<usize> {
        let domain = match *self {
            Placement::DirectMapped { index } => index..index + 1,
            Placement::FullyAssociative => 0..store.lines().len(),
            Placement::SetAssociative { set } => {
                let ways = store.ways_per_set();
                set * ways..(set + 1) * ways
            }
        };
        assert!(domain.end <= store.lines().len(), "{self:?} is outside the cache");
        domain
    }
}

/// The tag check against a single candidate line
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Comparison {
    pub line: LineRef,
    pub valid: bool,
    /// The tag held by the line at the time of the lookup
    pub stored_tag: BitField,
    pub matched: bool,
}

/// The outcome of a lookup, before any replacement
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct AccessResult {
    pub hit: bool,
    /// The matching line. Empty on a miss
    pub located_at: Option<LineRef>,
    /// Every candidate, in search order, whether it matched or not
    pub comparisons: Vec<Comparison>,
    /// The requested word, read from the matching line. Empty on a miss
    pub delivered_word: Option<u32>,
}

/// Searches the candidate lines for the tag of an address. Never modifies the store
///
/// If several candidates match, the first in search order wins
///
/// # Arguments
///
/// * `address`: The decoded address
/// * `store`: The lines of the cache
/// * `placement`: The candidate lines, normally from [`Placement::for_address`]
///
/// returns: AccessResult
pub fn lookup(address: &ParsedAddress, store: &LineStore, placement: Placement) -> AccessResult {
    let domain = placement.domain(store);
    let mut comparisons = Vec::with_capacity(domain.len());
    let mut located_at = None;
    let mut delivered_word = None;
    for index in domain {
        let line = &store.lines()[index];
        let matched = line.matches(&address.tag);
        let line_ref = store.line_ref(index);
        if matched && located_at.is_none() {
            located_at = Some(line_ref);
            delivered_word = Some(line.data[address.word_index()]);
        }
        comparisons.push(Comparison {
            line: line_ref,
            valid: line.valid,
            stored_tag: line.tag,
            matched,
        });
    }
    trace!("{address}: {} candidates, located at {located_at:?}", comparisons.len());
    AccessResult {
        hit: located_at.is_some(),
        located_at,
        comparisons,
        delivered_word,
    }
}
