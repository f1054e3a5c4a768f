use log::debug;
use serde::Serialize;
use crate::bitfield::{decode, ParsedAddress};
use crate::config::{CacheGeometry, MappingKind};
use crate::error::SimError;
use crate::lookup::{lookup, AccessResult, Placement};
use crate::replacement_policies::{replace, FirstInvalid, NoPolicy, Replacement, ReplacementPolicy};
use crate::store::{LineRef, LineStore};

/// A generic trait for caches
///
/// An access runs to completion in one call: decode, lookup, and on a miss the replacement.
/// Nothing is shared between accesses except the line store
pub trait CacheTrait {
    /// Splits an address into its fields for this cache
    ///
    /// # Arguments
    ///
    /// * `address`: The address as a string of `0` and `1`
    ///
    /// returns: Result<ParsedAddress, SimError>
    fn decode(&self, address: &str) -> Result<ParsedAddress, SimError>;

    /// Looks up a decoded address, installing its block on a miss
    ///
    /// # Arguments
    ///
    /// * `address`: An address decoded by this cache
    ///
    /// returns: Access
    fn access(&mut self, address: &ParsedAddress) -> Access;

    fn store(&self) -> &LineStore;

    /// Mutable access to the lines, for seeding them before the first access
    fn store_mut(&mut self) -> &mut LineStore;

    fn geometry(&self) -> &CacheGeometry {
        self.store().geometry()
    }
}

/// Everything that happened during one access
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Access {
    pub address: ParsedAddress,
    pub placement: Placement,
    pub result: AccessResult,
    /// Only present on a miss
    pub replacement: Option<Replacement>,
}

impl Access {
    pub fn hit(&self) -> bool {
        self.result.hit
    }

    /// The line which served the access: the matching line on a hit, the victim on a miss
    pub fn line(&self) -> LineRef {
        match (self.result.located_at, &self.replacement) {
            (Some(line), _) => line,
            (None, Some(replacement)) => replacement.victim,
            (None, None) => unreachable!("a miss always installs the block"),
        }
    }

    /// The word sent back to the CPU
    pub fn delivered_word(&self) -> u32 {
        match (self.result.delivered_word, &self.replacement) {
            (Some(word), _) => word,
            (None, Some(replacement)) => replacement.delivered_word,
            (None, None) => unreachable!("a miss always installs the block"),
        }
    }
}

/// A generic cache implementation, parameterised by a replacement policy
///
/// The mapping is taken from the geometry of the store; the policy only decides which candidate
/// to evict on a miss
pub struct Cache<R: ReplacementPolicy> {
    store: LineStore,
    replacement_policy: R,
}

impl<R: ReplacementPolicy> Cache<R> {
    pub fn new(geometry: &CacheGeometry, policy: R) -> Self {
        Self {
            store: LineStore::initialize(geometry),
            replacement_policy: policy,
        }
    }
}

impl<R: ReplacementPolicy> CacheTrait for Cache<R> {
    fn decode(&self, address: &str) -> Result<ParsedAddress, SimError> {
        decode(address, self.store.geometry())
    }

    fn access(&mut self, address: &ParsedAddress) -> Access {
        let placement = Placement::for_address(address, self.store.geometry().kind());
        let result = lookup(address, &self.store, placement);
        let replacement = match result.located_at {
            Some(line) => {
                // Hits leave the lines alone
                self.replacement_policy.update_on_read(self.store.flat_index(line));
                None
            }
            None => Some(replace(address, &mut self.store, placement, &mut self.replacement_policy)),
        };
        match &replacement {
            None => debug!("{address}: hit at {:?}", result.located_at),
            Some(r) => debug!("{address}: miss, block {} placed at {} (evicted {:?})", r.block_number, r.victim, r.evicted),
        }
        Access {
            address: *address,
            placement,
            result,
            replacement,
        }
    }

    fn store(&self) -> &LineStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut LineStore {
        &mut self.store
    }
}

/// Enum for the caches provided by the library
///
/// Explicitly branching on each implementation lets the compiler reason about the concrete types
/// instead of going through a trait object
pub enum GenericCache {
    NoPolicy(Cache<NoPolicy>),
    FirstInvalid(Cache<FirstInvalid>),
}

impl GenericCache {
    /// Direct mapped caches have a single candidate, so only the associative ones need a policy
    pub fn new(geometry: &CacheGeometry) -> Self {
        match geometry.kind() {
            MappingKind::Direct => Cache::new(geometry, NoPolicy).into(),
            MappingKind::Full | MappingKind::SetAssociative => Cache::new(geometry, FirstInvalid).into(),
        }
    }
}

impl From<Cache<NoPolicy>> for GenericCache {
    fn from(value: Cache<NoPolicy>) -> Self {
        Self::NoPolicy(value)
    }
}

impl From<Cache<FirstInvalid>> for GenericCache {
    fn from(value: Cache<FirstInvalid>) -> Self {
        Self::FirstInvalid(value)
    }
}

impl CacheTrait for GenericCache {
    fn decode(&self, address: &str) -> Result<ParsedAddress, SimError> {
        match self {
            GenericCache::NoPolicy(c) => c.decode(address),
            GenericCache::FirstInvalid(c) => c.decode(address),
        }
    }

    fn access(&mut self, address: &ParsedAddress) -> Access {
        match self {
            GenericCache::NoPolicy(c) => c.access(address),
            GenericCache::FirstInvalid(c) => c.access(address),
        }
    }

    fn store(&self) -> &LineStore {
        match self {
            GenericCache::NoPolicy(c) => c.store(),
            GenericCache::FirstInvalid(c) => c.store(),
        }
    }

    fn store_mut(&mut self) -> &mut LineStore {
        match self {
            GenericCache::NoPolicy(c) => c.store_mut(),
            GenericCache::FirstInvalid(c) => c.store_mut(),
        }
    }
}
