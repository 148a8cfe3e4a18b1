//! Error types for probemap operations

use thiserror::Error;

/// Errors surfaced by [`ConcurrentOpenAddressingMap`](crate::ConcurrentOpenAddressingMap)
///
/// A missing key is never an error: lookups and removals report absence with `None`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The key does not fit in a slot
    #[error("key too long: {len} bytes, keys must be shorter than {max} bytes")]
    KeyTooLong {
        /// Byte length of the rejected key
        len: usize,
        /// Configured maximum key length (exclusive)
        max: usize,
    },

    /// The grown slot array could not be allocated
    #[error("allocation failed: could not reserve {requested} slots")]
    AllocationFailure {
        /// Number of slots the resize asked for
        requested: usize,
    },

    /// Doubling the capacity would overflow `usize`
    #[error("capacity overflow while growing the table")]
    CapacityOverflow,

    /// A [`MapConfig`](crate::MapConfig) value was rejected
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// What was wrong with the configuration
        message: String,
    },
}

/// Result type for probemap operations
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::KeyTooLong { len: 300, max: 256 }.to_string(),
            "key too long: 300 bytes, keys must be shorter than 256 bytes"
        );
        assert_eq!(
            Error::AllocationFailure { requested: 64 }.to_string(),
            "allocation failed: could not reserve 64 slots"
        );
        assert_eq!(
            Error::CapacityOverflow.to_string(),
            "capacity overflow while growing the table"
        );
        assert_eq!(
            Error::InvalidConfig {
                message: "load factor must be in (0, 1)".to_string()
            }
            .to_string(),
            "invalid configuration: load factor must be in (0, 1)"
        );
    }
}
