//! # CacheMap
//!
//! CacheMap models how direct mapped, fully associative, and set associative caches resolve an
//! address, for teaching
//!
//! It splits binary addresses into tag, index, and word fields, searches the candidate lines,
//! reports hits and misses, replaces blocks on a miss, and narrates each access as an ordered
//! sequence of steps a presentation layer can walk through
//!
//! Everything is deterministic: the same configuration, lines, and address always give the same
//! result and the same narration

/// Contains the address codec, which splits binary addresses into their fields
pub mod bitfield;

/// Contains the generic cache which runs a whole access, and a utility enum for the existing
/// replacement policies
pub mod cache;

/// Contains definitions for the JSON configuration format, and its validation
pub mod config;

/// Contains the error type shared by every fallible operation
pub mod error;

/// Contains the reader for address trace files
pub mod io;

/// Contains the lookup engine and the placement of each kind of mapping
pub mod lookup;

/// Contains the provided replacement policies, with a trait for implementing custom replacement
/// policies
pub mod replacement_policies;

/// Contains the simulator, which owns a configured cache for a session
pub mod simulator;

/// Contains the line store shared by every kind of mapping
pub mod store;

/// Contains the recorder which narrates an access step by step
pub mod trace;

#[cfg(test)]
mod test;

/// Contains utilities for running tests and benchmarks.
pub mod util;
