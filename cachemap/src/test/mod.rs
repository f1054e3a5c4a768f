mod codec;
mod engine;
mod trace;

use crate::bitfield::ParsedAddress;
use crate::cache::{Access, CacheTrait, GenericCache};
use crate::config::CacheConfig;

pub(crate) fn direct4() -> CacheConfig {
    CacheConfig::direct("direct4", 4, 4, 64)
}

pub(crate) fn full4() -> CacheConfig {
    CacheConfig::fully_associative("full4", 4, 4, 64)
}

pub(crate) fn set2() -> CacheConfig {
    CacheConfig::set_associative("set2", 4, 2, 2, 64)
}

/// One configuration of each kind, all with 8-bit addresses
pub(crate) fn every_kind() -> Vec<CacheConfig> {
    vec![direct4(), full4(), set2()]
}

pub(crate) fn cache_for(config: &CacheConfig) -> GenericCache {
    GenericCache::new(&config.validate().unwrap())
}

/// Every address a geometry accepts, as binary strings
pub(crate) fn all_addresses(config: &CacheConfig) -> Vec<String> {
    let bits = config.validate().unwrap().address_bits() as usize;
    (0..1u32 << bits).map(|value| format!("{value:0bits$b}")).collect()
}

pub(crate) fn run(cache: &mut GenericCache, address: &str) -> Access {
    let parsed: ParsedAddress = cache.decode(address).unwrap();
    cache.access(&parsed)
}
