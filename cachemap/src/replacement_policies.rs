use serde::Serialize;
use crate::bitfield::{BitField, ParsedAddress};
use crate::config::CacheGeometry;
use crate::lookup::Placement;
use crate::store::{CacheLine, LineRef, LineStore};

/// A generic trait for implementing new replacement policies. Can be used to parameterise a Cache.
pub trait ReplacementPolicy {
    /// Updates the policy when a cache line is read
    ///
    /// Not applicable for some policies, a default which does nothing is provided
    ///
    /// # Arguments
    ///
    /// * `cache_index`: The position of the line which was read
    ///
    /// returns: ()
    ///
    fn update_on_read(&mut self, _cache_index: usize) {}

    /// Used by the cache to get a line number when a new block needs added to the cache.
    ///
    /// Implementations should assume that when this method is called, the line returned will be
    /// replaced
    ///
    /// # Arguments
    ///
    /// * `set_lower_bound_index`: The position of the first line of the candidate set
    /// * `set`: The candidate lines, in search order
    ///
    /// returns: usize, the position of the victim, between the lower bound and the end of the set
    fn get_new_line(&mut self, set_lower_bound_index: usize, set: &[CacheLine]) -> usize;
}

#[derive(Debug, Default)]
/// NoPolicy is used for direct mapped caches. It does nothing when updating on read, and simply
/// returns the set lower bound index when a new line is requested
pub struct NoPolicy;

impl ReplacementPolicy for NoPolicy {
    fn get_new_line(&mut self, set_lower_bound_index: usize, _set: &[CacheLine]) -> usize {
        set_lower_bound_index
    }
}

/// Takes the first empty line of the set, or the first line if they're all in use
///
/// Keeps no history, so it isn't LRU or FIFO. A block can be evicted just after it was loaded
#[derive(Debug, Default)]
pub struct FirstInvalid;

impl ReplacementPolicy for FirstInvalid {
    fn get_new_line(&mut self, set_lower_bound_index: usize, set: &[CacheLine]) -> usize {
        set_lower_bound_index + set.iter().position(|line| !line.valid).unwrap_or(0)
    }
}

/// What a replacement did
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Replacement {
    pub victim: LineRef,
    /// Tag of the block thrown out, if the victim held one
    pub evicted: Option<BitField>,
    pub block_number: u32,
    /// The requested word, read from the freshly installed block
    pub delivered_word: u32,
}

/// Installs the block holding `address` after a miss, and reports where it went
///
/// Afterwards the victim is valid with the requested tag, so repeating the access hits there
pub fn replace<R: ReplacementPolicy>(
    address: &ParsedAddress,
    store: &mut LineStore,
    placement: Placement,
    policy: &mut R,
) -> Replacement {
    let domain = placement.domain(store);
    let index = policy.get_new_line(domain.start, &store.lines()[domain.clone()]);
    assert!(domain.contains(&index), "the policy picked line {index}, outside {domain:?}");
    let victim = store.line_ref(index);
    let previous = store.read(victim);
    let evicted = previous.valid.then_some(previous.tag);
    let block_number = address.block_number();
    let data = fetch_block(store.geometry(), block_number);
    let delivered_word = data[address.word_index()];
    store.replace(victim, address.tag, data);
    Replacement { victim, evicted, block_number, delivered_word }
}

/// Contents of a block as read from backing memory. Each word holds its own address
pub fn fetch_block(geometry: &CacheGeometry, block_number: u32) -> Vec<u32> {
    let first = block_number << geometry.word_bits();
    (0..geometry.block_size() as u32).map(|offset| first | offset).collect()
}
