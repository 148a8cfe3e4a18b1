//! Table configuration
//!
//! [`MapConfig`] carries the three tunables of the table. The defaults match the
//! classic layout: 16 initial slots, keys shorter than 256 bytes, growth at 75% load.

use crate::{Error, Result};

/// Default initial number of slots
pub const INITIAL_CAPACITY: usize = 16;
/// Default maximum key length in bytes (exclusive)
pub const MAX_KEY_LENGTH: usize = 256;
/// Default load factor that triggers growth
pub const MAX_LOAD_FACTOR: f64 = 0.75;

/// Smallest slot array the table will ever allocate
const MIN_CAPACITY: usize = 2;

/// Configuration for a [`ConcurrentOpenAddressingMap`](crate::ConcurrentOpenAddressingMap)
///
/// # Examples
///
/// ```rust
/// use probemap::{ConcurrentOpenAddressingMap, MapConfig};
///
/// let config = MapConfig::default()
///     .with_initial_capacity(64)
///     .with_max_key_length(32);
/// let map: ConcurrentOpenAddressingMap<u32> = ConcurrentOpenAddressingMap::with_config(config)?;
/// assert_eq!(map.capacity(), 64);
/// # Ok::<(), probemap::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapConfig {
    /// Initial number of slots, rounded up to a power of two
    pub initial_capacity: usize,
    /// Keys must be strictly shorter than this many bytes
    pub max_key_length: usize,
    /// Fraction of occupied slots at which a put grows the table first
    pub load_factor: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_capacity: INITIAL_CAPACITY,
            max_key_length: MAX_KEY_LENGTH,
            load_factor: MAX_LOAD_FACTOR,
        }
    }
}

impl MapConfig {
    /// Set the initial number of slots
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set the exclusive maximum key length in bytes
    pub fn with_max_key_length(mut self, max_key_length: usize) -> Self {
        self.max_key_length = max_key_length;
        self
    }

    /// Set the growth threshold
    pub fn with_load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Check that every field is usable
    pub fn validate(&self) -> Result<()> {
        if self.max_key_length == 0 {
            return Err(Error::InvalidConfig {
                message: "max key length must be at least 1".to_string(),
            });
        }
        if !(self.load_factor > 0.0 && self.load_factor < 1.0) {
            return Err(Error::InvalidConfig {
                message: format!("load factor must be in (0, 1), got {}", self.load_factor),
            });
        }
        if self.initial_capacity.checked_next_power_of_two().is_none() {
            return Err(Error::InvalidConfig {
                message: format!("initial capacity {} is too large", self.initial_capacity),
            });
        }
        Ok(())
    }

    /// The slot count actually allocated for `initial_capacity`
    pub(crate) fn slot_count(&self) -> usize {
        self.initial_capacity.max(MIN_CAPACITY).next_power_of_two()
    }
}
