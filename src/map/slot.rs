//! Slot storage
//!
//! A slot is either empty or holds a key, its cached hash and a value. Deletion
//! shifts later entries back (see [`RawTable`](super::raw::RawTable)), so no
//! tombstone state is needed.

use crate::{Error, Result};
use core::borrow::Borrow;
use core::fmt;

/// A key that has passed length validation
///
/// Construction is the only place lengths are checked, so every `Key` stored in
/// a slot is known to fit.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Key(Box<str>);

impl Key {
    /// Validate `key` against an exclusive byte-length limit
    pub fn new(key: &str, max_len: usize) -> Result<Self> {
        check_len(key, max_len)?;
        Ok(Self(key.into()))
    }

    /// The key text
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key is the empty string
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reject keys whose byte length is not strictly below `max_len`
#[inline]
pub(crate) fn check_len(key: &str, max_len: usize) -> Result<()> {
    if key.len() >= max_len {
        return Err(Error::KeyTooLong {
            len: key.len(),
            max: max_len,
        });
    }
    Ok(())
}

/// One position in the slot array
#[derive(Debug, Clone)]
pub(crate) enum Slot<V> {
    Empty,
    Occupied(Entry<V>),
}

/// A live key/value pair
#[derive(Debug, Clone)]
pub(crate) struct Entry<V> {
    pub(crate) key: Key,
    // Cached so resizes and backward shifts never rehash the key
    pub(crate) hash: u32,
    pub(crate) value: V,
}

impl<V> Slot<V> {
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    #[inline]
    pub(crate) fn entry(&self) -> Option<&Entry<V>> {
        match self {
            Slot::Empty => None,
            Slot::Occupied(entry) => Some(entry),
        }
    }
}

impl<V> Default for Slot<V> {
    fn default() -> Self {
        Slot::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_length_boundary() {
        assert!(Key::new(&"k".repeat(255), 256).is_ok());
        assert_eq!(
            Key::new(&"k".repeat(256), 256),
            Err(Error::KeyTooLong { len: 256, max: 256 })
        );
        assert!(Key::new("", 1).is_ok());
    }

    #[test]
    fn test_length_counts_bytes() {
        // Two chars, four bytes
        let key = "éé";
        assert_eq!(key.len(), 4);
        assert!(Key::new(key, 4).is_err());
        assert!(Key::new(key, 5).is_ok());
    }

    #[test]
    fn test_slot_states() {
        let empty: Slot<u8> = Slot::default();
        assert!(empty.is_empty());
        assert!(empty.entry().is_none());

        let slot = Slot::Occupied(Entry {
            key: Key::new("a", 8).unwrap(),
            hash: 1,
            value: 7u8,
        });
        assert!(!slot.is_empty());
        assert_eq!(slot.entry().map(|e| e.value), Some(7));
    }
}
