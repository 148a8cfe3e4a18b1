//! Unsynchronised open-addressing table
//!
//! `RawTable` owns the slot array and implements every algorithm of the map:
//! linear probing from `hash & (capacity - 1)`, insert-or-overwrite, lookup,
//! backward-shift deletion and doubling resize. It has no locking of its own;
//! [`ConcurrentOpenAddressingMap`](super::ConcurrentOpenAddressingMap) wraps it in
//! a mutex.
//!
//! ## Probe-chain invariant
//!
//! For every occupied slot, walking forward from its key's home index reaches it
//! without crossing an empty slot. Lookups stop at the first empty slot, so every
//! mutation below is written to preserve this. Removal therefore never just clears
//! a slot: later entries whose probe path crosses the hole are shifted back into it.

use super::slot::{check_len, Entry, Key, Slot};
use crate::config::MapConfig;
use crate::hash::djb2;
use crate::{Error, Result};
use core::mem;
use log::debug;

/// Where a probe for a key ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Probe {
    /// The key lives at this index
    Found(usize),
    /// The key is absent; this is the first empty slot on its path
    Vacant(usize),
    /// Every slot was visited without a match or an empty slot
    Exhausted,
}

/// What a put did to the table
#[derive(Debug)]
pub(crate) struct PutOutcome<V> {
    /// Value replaced by an overwrite
    pub(crate) previous: Option<V>,
    /// Slots stepped over before landing
    pub(crate) probes: usize,
    /// Number of doublings performed before the write
    pub(crate) resizes: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct RawTable<V> {
    slots: Vec<Slot<V>>,
    len: usize,
    load_factor: f64,
    max_key_length: usize,
}

impl<V> RawTable<V> {
    /// Build a table with the default-sized slot array
    ///
    /// Allocation failure aborts, as for any `Vec`; use [`with_config`](Self::with_config)
    /// for caller-chosen sizes.
    pub(crate) fn new(config: &MapConfig) -> Self {
        let mut slots = Vec::with_capacity(config.slot_count());
        slots.resize_with(config.slot_count(), Slot::default);
        Self::from_slots(slots, config)
    }

    /// Build a table from a validated config, reporting allocation failure
    pub(crate) fn with_config(config: &MapConfig) -> Result<Self> {
        let slots = Self::allocate(config.slot_count())?;
        Ok(Self::from_slots(slots, config))
    }

    fn from_slots(slots: Vec<Slot<V>>, config: &MapConfig) -> Self {
        debug!(
            "created table: capacity={}, max_key_length={}, load_factor={}",
            slots.len(),
            config.max_key_length,
            config.load_factor
        );
        Self {
            slots,
            len: 0,
            load_factor: config.load_factor,
            max_key_length: config.max_key_length,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn max_key_length(&self) -> usize {
        self.max_key_length
    }

    /// Insert `key`, or overwrite its value if it is already present
    ///
    /// The key is validated before anything is touched. Growth happens before
    /// the probe, so a failed resize leaves the table exactly as it was.
    pub(crate) fn put(&mut self, key: &str, value: V) -> Result<PutOutcome<V>> {
        check_len(key, self.max_key_length)?;

        let mut resizes = 0;
        if self.needs_grow() {
            self.grow()?;
            resizes += 1;
        }

        let hash = djb2(key.as_bytes());
        loop {
            let (probe, probes) = self.find(key, hash);
            match probe {
                Probe::Found(index) => {
                    let previous = match &mut self.slots[index] {
                        Slot::Occupied(entry) => Some(mem::replace(&mut entry.value, value)),
                        Slot::Empty => None,
                    };
                    return Ok(PutOutcome {
                        previous,
                        probes,
                        resizes,
                    });
                }
                Probe::Vacant(index) => {
                    self.slots[index] = Slot::Occupied(Entry {
                        key: Key::new(key, self.max_key_length)?,
                        hash,
                        value,
                    });
                    self.len += 1;
                    return Ok(PutOutcome {
                        previous: None,
                        probes,
                        resizes,
                    });
                }
                // Growth keeps at least one empty slot, so this only guards the loop
                Probe::Exhausted => {
                    self.grow()?;
                    resizes += 1;
                }
            }
        }
    }

    /// Look up `key`, returning its value and the probe length
    pub(crate) fn get(&self, key: &str) -> (Option<&V>, usize) {
        if key.len() >= self.max_key_length {
            return (None, 0);
        }
        let (probe, probes) = self.find(key, djb2(key.as_bytes()));
        match probe {
            Probe::Found(index) => (self.slots[index].entry().map(|e| &e.value), probes),
            Probe::Vacant(_) | Probe::Exhausted => (None, probes),
        }
    }

    /// Remove `key`, closing the gap it leaves in its probe chain
    pub(crate) fn remove(&mut self, key: &str) -> (Option<V>, usize) {
        if key.len() >= self.max_key_length {
            return (None, 0);
        }
        let (probe, probes) = self.find(key, djb2(key.as_bytes()));
        let index = match probe {
            Probe::Found(index) => index,
            Probe::Vacant(_) | Probe::Exhausted => return (None, probes),
        };

        let removed = mem::take(&mut self.slots[index]);
        self.len -= 1;
        self.backshift(index);

        match removed {
            Slot::Occupied(entry) => (Some(entry.value), probes),
            Slot::Empty => (None, probes),
        }
    }

    /// Empty every slot without giving back capacity
    pub(crate) fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = Slot::Empty);
        self.len = 0;
    }

    /// Occupied entries in slot order
    pub(crate) fn entries(&self) -> impl Iterator<Item = &Entry<V>> + '_ {
        self.slots.iter().filter_map(Slot::entry)
    }

    fn allocate(capacity: usize) -> Result<Vec<Slot<V>>> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| Error::AllocationFailure {
                requested: capacity,
            })?;
        slots.resize_with(capacity, Slot::default);
        Ok(slots)
    }

    #[inline]
    fn mask(&self) -> usize {
        self.slots.len() - 1
    }

    /// Growth check run before every put
    ///
    /// Besides the load factor, the table always grows before a write could
    /// take its last empty slot, so probes are guaranteed to terminate.
    fn needs_grow(&self) -> bool {
        let capacity = self.capacity();
        self.len as f64 >= capacity as f64 * self.load_factor || self.len + 1 >= capacity
    }

    fn find(&self, key: &str, hash: u32) -> (Probe, usize) {
        let mask = self.mask();
        let mut index = hash as usize & mask;

        for steps in 0..self.slots.len() {
            match &self.slots[index] {
                Slot::Empty => return (Probe::Vacant(index), steps),
                Slot::Occupied(entry) if entry.hash == hash && entry.key.as_str() == key => {
                    return (Probe::Found(index), steps);
                }
                Slot::Occupied(_) => index = (index + 1) & mask,
            }
        }

        (Probe::Exhausted, self.slots.len())
    }

    /// Double the slot array and re-place every entry
    ///
    /// On failure the current array is untouched.
    fn grow(&mut self) -> Result<()> {
        let old_capacity = self.capacity();
        let new_capacity = old_capacity
            .checked_mul(2)
            .ok_or(Error::CapacityOverflow)?;
        let new_slots = Self::allocate(new_capacity)?;

        let old_slots = mem::replace(&mut self.slots, new_slots);
        let mask = self.mask();
        for slot in old_slots {
            if let Slot::Occupied(entry) = slot {
                let mut index = entry.hash as usize & mask;
                while !self.slots[index].is_empty() {
                    index = (index + 1) & mask;
                }
                self.slots[index] = Slot::Occupied(entry);
            }
        }

        debug!(
            "resized table: {} -> {} slots, {} entries",
            old_capacity, new_capacity, self.len
        );
        Ok(())
    }

    /// Backward-shift deletion starting from the emptied slot `hole`
    ///
    /// Walks forward until an empty slot. Any entry whose home index does not lie
    /// strictly between the hole and its own position has a probe path through the
    /// hole, so it moves back into it and its old position becomes the new hole.
    fn backshift(&mut self, mut hole: usize) {
        let mask = self.mask();
        let mut index = (hole + 1) & mask;

        loop {
            let home = match &self.slots[index] {
                Slot::Empty => return,
                Slot::Occupied(entry) => entry.hash as usize & mask,
            };

            let home_to_index = index.wrapping_sub(home) & mask;
            let hole_to_index = index.wrapping_sub(hole) & mask;
            if home_to_index >= hole_to_index {
                self.slots.swap(hole, index);
                hole = index;
            }

            index = (index + 1) & mask;
        }
    }

    /// Panic if any occupied slot is unreachable from its home index
    #[cfg(test)]
    pub(crate) fn assert_probe_chains(&self) {
        let mask = self.mask();
        let mut occupied = 0;
        for (position, slot) in self.slots.iter().enumerate() {
            if let Slot::Occupied(entry) = slot {
                occupied += 1;
                assert_eq!(entry.hash, djb2(entry.key.as_str().as_bytes()));
                let mut index = entry.hash as usize & mask;
                while index != position {
                    assert!(
                        !self.slots[index].is_empty(),
                        "key {:?} at {} is cut off by empty slot {}",
                        entry.key,
                        position,
                        index
                    );
                    index = (index + 1) & mask;
                }
            }
        }
        assert_eq!(occupied, self.len, "len does not match occupied slots");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(capacity: usize) -> RawTable<u32> {
        RawTable::new(&MapConfig::default().with_initial_capacity(capacity))
    }

    /// Generate `count` distinct keys whose home index is `home` in a table of `capacity`
    fn colliding_keys(home: usize, capacity: usize, count: usize) -> Vec<String> {
        (0..)
            .map(|i| format!("key{}", i))
            .filter(|k| djb2(k.as_bytes()) as usize & (capacity - 1) == home)
            .take(count)
            .collect()
    }

    fn position_of(table: &RawTable<u32>, key: &str) -> usize {
        table
            .slots
            .iter()
            .position(|s| s.entry().map_or(false, |e| e.key.as_str() == key))
            .unwrap()
    }

    #[test]
    fn test_insert_overwrite_and_len() {
        let mut t = table(16);
        assert!(t.put("a", 1).unwrap().previous.is_none());
        assert_eq!(t.put("a", 2).unwrap().previous, Some(1));
        assert_eq!(t.len(), 1);
        assert_eq!(t.get("a").0, Some(&2));
        t.assert_probe_chains();
    }

    #[test]
    fn test_colliding_keys_probe_linearly() {
        let mut t = table(16);
        let keys = colliding_keys(3, 16, 3);
        for (i, key) in keys.iter().enumerate() {
            let outcome = t.put(key, i as u32).unwrap();
            assert_eq!(outcome.probes, i);
            assert_eq!(position_of(&t, key), 3 + i);
        }
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(t.get(key), (Some(&(i as u32)), i));
        }
    }

    #[test]
    fn test_remove_shifts_chain_back() {
        let mut t = table(16);
        let keys = colliding_keys(5, 16, 3);
        for (i, key) in keys.iter().enumerate() {
            t.put(key, i as u32).unwrap();
        }

        assert_eq!(t.remove(&keys[0]).0, Some(0));
        assert_eq!(position_of(&t, &keys[1]), 5);
        assert_eq!(position_of(&t, &keys[2]), 6);
        assert_eq!(t.get(&keys[1]).0, Some(&1));
        assert_eq!(t.get(&keys[2]).0, Some(&2));
        t.assert_probe_chains();
    }

    #[test]
    fn test_remove_keeps_entries_already_at_home() {
        let mut t = table(16);
        let chain = colliding_keys(6, 16, 2);
        let at_home = colliding_keys(8, 16, 1);
        // chain occupies 6 and 7, at_home sits at its own home 8
        t.put(&chain[0], 0).unwrap();
        t.put(&chain[1], 1).unwrap();
        t.put(&at_home[0], 2).unwrap();

        t.remove(&chain[0]);
        assert_eq!(position_of(&t, &chain[1]), 6);
        assert_eq!(position_of(&t, &at_home[0]), 8);
        t.assert_probe_chains();
    }

    #[test]
    fn test_backshift_across_wraparound() {
        let mut t = table(16);
        let keys = colliding_keys(15, 16, 3);
        for (i, key) in keys.iter().enumerate() {
            t.put(key, i as u32).unwrap();
        }
        assert_eq!(position_of(&t, &keys[1]), 0);
        assert_eq!(position_of(&t, &keys[2]), 1);

        t.remove(&keys[0]);
        assert_eq!(position_of(&t, &keys[1]), 15);
        assert_eq!(position_of(&t, &keys[2]), 0);
        assert_eq!(t.get(&keys[2]).0, Some(&2));
        t.assert_probe_chains();
    }

    #[test]
    fn test_growth_is_checked_before_write() {
        let mut t = table(16);
        for i in 0..12 {
            assert_eq!(t.put(&format!("k{}", i), i).unwrap().resizes, 0);
        }
        assert_eq!(t.capacity(), 16);

        let outcome = t.put("k12", 12).unwrap();
        assert_eq!(outcome.resizes, 1);
        assert_eq!(t.capacity(), 32);
        for i in 0..13 {
            assert_eq!(t.get(&format!("k{}", i)).0, Some(&i));
        }
        t.assert_probe_chains();
    }

    #[test]
    fn test_overwrite_at_threshold_still_grows() {
        let mut t = table(16);
        for i in 0..12 {
            t.put(&format!("k{}", i), i).unwrap();
        }
        let outcome = t.put("k0", 100).unwrap();
        assert_eq!(outcome.previous, Some(0));
        assert_eq!(t.capacity(), 32);
        assert_eq!(t.len(), 12);
    }

    #[test]
    fn test_small_table_never_fills() {
        let config = MapConfig::default()
            .with_initial_capacity(2)
            .with_load_factor(0.99);
        let mut t: RawTable<u32> = RawTable::with_config(&config).unwrap();
        for i in 0..100 {
            t.put(&i.to_string(), i).unwrap();
            assert!(t.len() < t.capacity());
        }
        assert_eq!(t.get("missing").0, None);
        t.assert_probe_chains();
    }

    #[test]
    fn test_oversize_key_rejected_without_mutation() {
        let config = MapConfig::default().with_max_key_length(4);
        let mut t: RawTable<u32> = RawTable::with_config(&config).unwrap();
        for i in 0..12 {
            t.put(&format!("{:03}", i), i).unwrap();
        }
        let err = t.put("abcd", 1).unwrap_err();
        assert_eq!(err, Error::KeyTooLong { len: 4, max: 4 });
        // Rejected before the growth check
        assert_eq!(t.capacity(), 16);
        assert_eq!(t.len(), 12);
        assert_eq!(t.get("abcd").0, None);
        assert_eq!(t.remove("abcd").0, None);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut t = table(16);
        for i in 0..40 {
            t.put(&i.to_string(), i).unwrap();
        }
        let capacity = t.capacity();
        t.clear();
        assert_eq!(t.len(), 0);
        assert_eq!(t.capacity(), capacity);
        assert_eq!(t.entries().count(), 0);
        assert_eq!(t.get("1").0, None);
    }

    #[test]
    fn test_empty_string_is_a_key() {
        let mut t = table(16);
        t.put("", 9).unwrap();
        assert_eq!(t.get("").0, Some(&9));
        assert_eq!(t.remove("").0, Some(9));
        assert_eq!(t.len(), 0);
    }
}
