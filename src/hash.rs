//! String hashing for slot placement
//!
//! The table uses the djb2 multiplicative hash: seed 5381, then `h = h * 33 + byte`
//! for every byte of the key. It is deterministic within a process and cheap, but
//! makes no attempt to resist crafted collisions.

/// Initial accumulator value
pub const DJB2_SEED: u32 = 5381;

/// Hash a key's bytes with djb2
///
/// Arithmetic wraps at 32 bits.
///
/// # Examples
///
/// ```rust
/// use probemap::hash::djb2;
///
/// assert_eq!(djb2(b""), 5381);
/// assert_eq!(djb2(b"a"), 5381 * 33 + 97);
/// ```
#[inline]
pub fn djb2(bytes: &[u8]) -> u32 {
    bytes.iter().fold(DJB2_SEED, |hash, &byte| {
        (hash << 5).wrapping_add(hash).wrapping_add(u32::from(byte))
    })
}
