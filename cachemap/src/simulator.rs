use std::time::{Duration, Instant};
use log::{info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use crate::cache::{Access, CacheTrait, GenericCache};
use crate::config::{CacheConfig, CacheGeometry};
use crate::error::SimError;
use crate::store::LineStore;
use crate::trace::{record, Trace};

/// The simulator owns one configured cache for the length of a session, and collects results.
///
/// Editing the configuration discards every line and the results. Accesses are simulated one at
/// a time, each running to completion before the next is accepted
pub struct Simulator {
    config: CacheConfig,
    cache: GenericCache,
    result: SessionResult,
    simulation_time: Duration,
}

/// The totals for a session. Can be serialised to the output format
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct SessionResult {
    pub name: String,
    pub accesses: u64,
    pub hits: u64,
    pub misses: u64,
    /// Misses which threw out a valid block
    pub evictions: u64,
}

/// A simulated access together with its narration
#[derive(Debug, Clone, Serialize)]
pub struct Simulation {
    pub access: Access,
    pub trace: Trace,
}

impl SessionResult {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            accesses: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    fn add(&mut self, access: &Access) {
        self.accesses += 1;
        match &access.replacement {
            None => self.hits += 1,
            Some(replacement) => {
                self.misses += 1;
                if replacement.evicted.is_some() {
                    self.evictions += 1;
                }
            }
        }
    }
}

impl Simulator {
    /// Creates a new simulator for a given configuration
    ///
    /// # Arguments
    ///
    /// * `config`: A cache configuration, usually resulting from parsing JSON
    ///
    /// returns: Result<Simulator, SimError>, an error if the configuration is invalid
    pub fn new(config: &CacheConfig) -> Result<Self, SimError> {
        let cache = Self::config_to_cache(config)?;
        info!("configured {} as {:?}", config.name, cache.geometry());
        Ok(Self {
            config: config.clone(),
            cache,
            result: SessionResult::new(&config.name),
            simulation_time: Duration::new(0, 0),
        })
    }

    /// Replaces the configuration, starting a new session
    ///
    /// If the new configuration is invalid it is rejected and the current configuration, lines,
    /// and results are kept as they are
    pub fn reconfigure(&mut self, config: &CacheConfig) -> Result<(), SimError> {
        match Self::config_to_cache(config) {
            Ok(cache) => {
                info!("reconfigured {} as {:?}", config.name, cache.geometry());
                self.config = config.clone();
                self.cache = cache;
                self.result = SessionResult::new(&config.name);
                self.simulation_time = Duration::new(0, 0);
                Ok(())
            }
            Err(e) => {
                warn!("rejected configuration {}: {e}", config.name);
                Err(e)
            }
        }
    }

    /// Fills lines with random blocks, reproducibly for a given seed
    pub fn randomise(&mut self, seed: u64) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.cache.store_mut().randomise(&mut rng);
    }

    /// Simulates a single access, given as a binary string
    ///
    /// A malformed address is rejected before the lookup, leaving the lines untouched
    ///
    /// # Arguments
    ///
    /// * `address`: The address, exactly `address_bits` characters of `0` and `1`
    ///
    /// returns: Result<Simulation, SimError>
    pub fn simulate(&mut self, address: &str) -> Result<Simulation, SimError> {
        let start = Instant::now();
        let parsed = self.cache.decode(address)?;
        let access = self.cache.access(&parsed);
        let trace = record(&access, self.cache.geometry());
        self.result.add(&access);
        self.simulation_time += start.elapsed();
        Ok(Simulation { access, trace })
    }

    /// Simulates a sequence of accesses in order
    ///
    /// Stops at the first malformed address; the accesses before it stay applied
    pub fn simulate_all<I>(&mut self, addresses: I) -> Result<&SessionResult, SimError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for address in addresses {
            self.simulate(address.as_ref())?;
        }
        Ok(&self.result)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn geometry(&self) -> &CacheGeometry {
        self.cache.geometry()
    }

    /// The current lines, for rendering
    pub fn store(&self) -> &LineStore {
        self.cache.store()
    }

    pub fn result(&self) -> &SessionResult {
        &self.result
    }

    /// Gets the wall-clock execution time for processing
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }

    /// Gets the number of lines which don't hold a block
    pub fn get_invalid_line_count(&self) -> usize {
        self.cache.store().get_invalid_line_count()
    }

    /// Creates a new cache from a cache configuration, with its preloaded lines installed
    fn config_to_cache(config: &CacheConfig) -> Result<GenericCache, SimError> {
        let geometry = config.validate()?;
        let preloaded = config.preloaded_lines(&geometry)?;
        let mut cache = GenericCache::new(&geometry);
        for (line, tag, data) in preloaded {
            cache.store_mut().replace(line, tag, data);
        }
        Ok(cache)
    }
}
