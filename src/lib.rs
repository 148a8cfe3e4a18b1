//! # probemap
//!
//! An in-memory concurrent map from short text keys to opaque values, built on
//! open addressing with linear probing and guarded by a single lock.
//!
//! ## Features
//!
//! - **Open addressing**: all entries live directly in one power-of-two slot array
//! - **Linear probing** from the djb2 hash of the key
//! - **Backward-shift deletion**: removing a key never hides another one
//! - **Doubling growth** at a 0.75 load factor, checked before each write
//! - **Bounded keys**: oversize keys are rejected with [`Error::KeyTooLong`], never truncated
//!
//! ## Quick Start
//!
//! ```rust
//! use probemap::ConcurrentOpenAddressingMap;
//!
//! let map = ConcurrentOpenAddressingMap::new();
//! map.put("key1", 42)?;
//! assert_eq!(map.get("key1"), Some(42));
//! # Ok::<(), probemap::Error>(())
//! ```
//!
//! ## Thread Safety
//!
//! Every operation takes the map's one mutex for its entire body, reads included.
//! Each call is atomic on its own; there are no multi-key transactions.
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade: table creation and every resize at
//! `debug`, key rejections and teardown at `trace`. Install any logger to see them.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod hash;
pub mod map;
pub mod metrics;

pub use crate::config::{MapConfig, INITIAL_CAPACITY, MAX_KEY_LENGTH, MAX_LOAD_FACTOR};
pub use crate::error::{Error, Result};
pub use crate::map::ConcurrentOpenAddressingMap;
pub use crate::metrics::{MapMetrics, MetricsCollector};

/// Common utilities and helper types
pub mod util {
    /// Cache line size for alignment purposes
    pub const CACHE_LINE_SIZE: usize = 64;

    /// Pad a value to cache line size
    ///
    /// The map keeps its lock on its own cache line, apart from the metrics counters
    /// that are bumped after every operation.
    #[repr(align(64))]
    pub struct CachePadded<T> {
        value: T,
    }

    impl<T> CachePadded<T> {
        /// Create a new cache-padded value
        #[inline]
        pub const fn new(value: T) -> Self {
            Self { value }
        }

        /// Get a reference to the inner value
        #[inline]
        pub const fn get(&self) -> &T {
            &self.value
        }

        /// Get the inner value
        #[inline]
        pub fn into_inner(self) -> T {
            self.value
        }
    }

    impl<T: core::fmt::Debug> core::fmt::Debug for CachePadded<T> {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            core::fmt::Debug::fmt(&self.value, f)
        }
    }
}
