//! Concurrent open-addressing map
//!
//! This module wraps the raw slot table in a single mutex. Every public operation,
//! including reads, holds the lock for its whole body, so operations on one map
//! are totally ordered and a reader can never observe a half-written slot.
//!
//! ## Design
//!
//! The map uses:
//! - A power-of-2 sized slot array with linear probing
//! - The djb2 string hash, `index = hash & (capacity - 1)`
//! - Backward-shift deletion, so removals never break another key's probe chain
//! - Doubling growth, checked before each put, never shrinking
//! - One `parking_lot::Mutex`, released by guard drop on every exit path
//!
//! ## Performance Characteristics
//!
//! - **Get**: O(1) average case, takes the lock
//! - **Put**: O(1) amortised, O(n) when it triggers a resize
//! - **Remove**: O(1) average case, takes the lock
//!
//! There is no reader/writer split and no sharding: two concurrent gets also
//! serialise.
//!
//! ## Example
//!
//! ```rust
//! use probemap::ConcurrentOpenAddressingMap;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let map = Arc::new(ConcurrentOpenAddressingMap::new());
//!
//! let writer = thread::spawn({
//!     let map = Arc::clone(&map);
//!     move || {
//!         for i in 0..100u32 {
//!             map.put(&format!("key{}", i), i).unwrap();
//!         }
//!     }
//! });
//! writer.join().unwrap();
//!
//! assert_eq!(map.len(), 100);
//! assert_eq!(map.get("key42"), Some(42));
//! ```

use super::raw::RawTable;
use crate::config::MapConfig;
use crate::metrics::{AtomicMetrics, MapMetrics, MetricsCollector};
use crate::util::CachePadded;
use crate::{Error, Result};
use core::fmt;
use log::{trace, warn};
use parking_lot::Mutex;

/// A concurrent hash map from short text keys to values, behind one lock
///
/// Values are treated as opaque handles: the map moves and clones them but
/// never looks inside. Store an `Arc<T>`, an index or a `&'static T` when the
/// caller should keep ownership of the underlying data.
///
/// # Type Parameters
///
/// * `V` - The value type. The map is `Sync` when `V: Send`.
///
/// # Examples
///
/// ```rust
/// use probemap::ConcurrentOpenAddressingMap;
///
/// let map = ConcurrentOpenAddressingMap::new();
/// assert_eq!(map.put("key1", "value1")?, None);
/// assert_eq!(map.put("key1", "value2")?, Some("value1"));
/// assert_eq!(map.get("key1"), Some("value2"));
///
/// map.remove("key1");
/// assert_eq!(map.get("key1"), None);
/// # Ok::<(), probemap::Error>(())
/// ```
pub struct ConcurrentOpenAddressingMap<V> {
    table: CachePadded<Mutex<RawTable<V>>>,
    metrics: AtomicMetrics,
}

impl<V> ConcurrentOpenAddressingMap<V> {
    /// Create an empty map with 16 slots
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probemap::ConcurrentOpenAddressingMap;
    ///
    /// let map: ConcurrentOpenAddressingMap<u64> = ConcurrentOpenAddressingMap::new();
    /// assert_eq!(map.capacity(), 16);
    /// assert!(map.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::from_table(RawTable::new(&MapConfig::default()))
    }

    /// Create an empty map with at least `capacity` slots
    ///
    /// The capacity will be rounded up to the next power of 2.
    ///
    /// # Errors
    ///
    /// [`Error::AllocationFailure`] if the slot array cannot be allocated, or
    /// [`Error::InvalidConfig`] if `capacity` has no power of two above it.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::with_config(MapConfig::default().with_initial_capacity(capacity))
    }

    /// Create an empty map from a [`MapConfig`]
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] if the config fails [`MapConfig::validate`], or
    /// [`Error::AllocationFailure`] if the slot array cannot be allocated.
    pub fn with_config(config: MapConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_table(RawTable::with_config(&config)?))
    }

    fn from_table(table: RawTable<V>) -> Self {
        Self {
            table: CachePadded::new(Mutex::new(table)),
            metrics: AtomicMetrics::default(),
        }
    }

    /// Insert a key-value pair, or overwrite the value of an existing key
    ///
    /// If the table is at its load factor it is doubled first, before the key
    /// is probed for, even when the put turns out to be an overwrite.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(old_value))` if the key existed and its value was replaced
    /// * `Ok(None)` if the key was newly inserted
    ///
    /// # Errors
    ///
    /// * [`Error::KeyTooLong`] if the key's byte length is not below the
    ///   configured maximum. Nothing is modified.
    /// * [`Error::AllocationFailure`] or [`Error::CapacityOverflow`] if the table
    ///   needed to grow and could not. Nothing is modified.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probemap::{ConcurrentOpenAddressingMap, Error};
    ///
    /// let map = ConcurrentOpenAddressingMap::new();
    /// assert_eq!(map.put("a", 1)?, None);
    /// assert_eq!(map.put("a", 2)?, Some(1));
    /// assert_eq!(map.len(), 1);
    ///
    /// let long = "x".repeat(256);
    /// assert_eq!(map.put(&long, 3), Err(Error::KeyTooLong { len: 256, max: 256 }));
    /// # Ok::<(), probemap::Error>(())
    /// ```
    pub fn put(&self, key: &str, value: V) -> Result<Option<V>> {
        let result = self.table.get().lock().put(key, value);

        match result {
            Ok(outcome) => {
                self.metrics
                    .record_put(outcome.previous.is_some(), outcome.probes, outcome.resizes);
                Ok(outcome.previous)
            }
            Err(err) => {
                match &err {
                    Error::KeyTooLong { len, max } => {
                        trace!("rejected key of {} bytes (max {})", len, max);
                        self.metrics.record_rejected_key();
                    }
                    _ => {
                        warn!("put failed while growing table: {}", err);
                        self.metrics.record_failed_resize();
                    }
                }
                Err(err)
            }
        }
    }

    /// Run `f` on the value stored under `key` without cloning it
    ///
    /// `f` runs while the lock is held and must not call back into this map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probemap::ConcurrentOpenAddressingMap;
    ///
    /// let map = ConcurrentOpenAddressingMap::new();
    /// map.put("greeting", String::from("hello"))?;
    /// assert_eq!(map.get_with("greeting", |v| v.len()), Some(5));
    /// assert_eq!(map.get_with("missing", |v| v.len()), None);
    /// # Ok::<(), probemap::Error>(())
    /// ```
    pub fn get_with<R, F>(&self, key: &str, f: F) -> Option<R>
    where
        F: FnOnce(&V) -> R,
    {
        let table = self.table.get().lock();
        let (value, probes) = table.get(key);
        self.metrics.record_lookup(value.is_some(), probes);
        value.map(f)
    }

    /// Check whether `key` is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.get_with(key, |_| ()).is_some()
    }

    /// Remove a key, returning its value if it was present
    ///
    /// Removing an absent key is a no-op.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probemap::ConcurrentOpenAddressingMap;
    ///
    /// let map = ConcurrentOpenAddressingMap::new();
    /// map.put("k", 1)?;
    /// assert_eq!(map.remove("k"), Some(1));
    /// assert_eq!(map.remove("k"), None);
    /// # Ok::<(), probemap::Error>(())
    /// ```
    pub fn remove(&self, key: &str) -> Option<V> {
        let (value, probes) = self.table.get().lock().remove(key);
        self.metrics.record_remove(probes);
        value
    }

    /// Get the number of key-value pairs in the map
    pub fn len(&self) -> usize {
        self.table.get().lock().len()
    }

    /// Check if the map is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the current number of slots
    ///
    /// Always a power of two. It only ever grows.
    pub fn capacity(&self) -> usize {
        self.table.get().lock().capacity()
    }

    /// Keys must be strictly shorter than this many bytes
    pub fn max_key_length(&self) -> usize {
        self.table.get().lock().max_key_length()
    }

    /// Remove all entries, keeping the current capacity
    pub fn clear(&self) {
        let mut table = self.table.get().lock();
        trace!("clearing {} entries", table.len());
        table.clear();
    }

    /// Tear the map down, dropping the slot array
    ///
    /// Equivalent to dropping the map. Values are dropped as handles; whatever
    /// they refer to is left to its owner.
    pub fn destroy(self) {
        let table = self.table.into_inner().into_inner();
        trace!(
            "destroying map: {} entries in {} slots",
            table.len(),
            table.capacity()
        );
    }
}

impl<V> ConcurrentOpenAddressingMap<V> {
    #[cfg(test)]
    pub(crate) fn assert_probe_chains(&self) {
        self.table.get().lock().assert_probe_chains();
    }
}

impl<V: Clone> ConcurrentOpenAddressingMap<V> {
    /// Get a clone of the value stored under `key`
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probemap::ConcurrentOpenAddressingMap;
    /// use std::sync::Arc;
    ///
    /// let map = ConcurrentOpenAddressingMap::new();
    /// let shared = Arc::new(vec![1, 2, 3]);
    /// map.put("v", Arc::clone(&shared))?;
    /// assert!(Arc::ptr_eq(&map.get("v").unwrap(), &shared));
    /// assert_eq!(map.get("w"), None);
    /// # Ok::<(), probemap::Error>(())
    /// ```
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_with(key, V::clone)
    }

    /// Copy out every entry, in slot order
    pub fn snapshot(&self) -> Vec<(String, V)> {
        let table = self.table.get().lock();
        table
            .entries()
            .map(|entry| (entry.key.to_string(), entry.value.clone()))
            .collect()
    }
}

impl<V> Default for ConcurrentOpenAddressingMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Clone for ConcurrentOpenAddressingMap<V> {
    /// Deep-copies the slot array; the clone starts with fresh metrics
    fn clone(&self) -> Self {
        let table = self.table.get().lock().clone();
        Self::from_table(table)
    }
}

impl<V> fmt::Debug for ConcurrentOpenAddressingMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table.get().lock();
        f.debug_struct("ConcurrentOpenAddressingMap")
            .field("len", &table.len())
            .field("capacity", &table.capacity())
            .field("max_key_length", &table.max_key_length())
            .finish()
    }
}

impl<V> MetricsCollector for ConcurrentOpenAddressingMap<V> {
    fn metrics(&self) -> MapMetrics {
        self.metrics.snapshot()
    }

    fn reset_metrics(&self) {
        self.metrics.reset();
    }

    fn set_metrics_enabled(&self, enabled: bool) {
        self.metrics.set_enabled(enabled);
    }

    fn is_metrics_enabled(&self) -> bool {
        self.metrics.is_enabled()
    }
}
