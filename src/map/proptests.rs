//! Property-based tests for the map using proptest
//!
//! These tests check the map against `std::collections::HashMap` as a model over
//! random operation sequences, and re-verify the probe-chain invariant after each run.

use crate::map::ConcurrentOpenAddressingMap;
use crate::{Error, MapConfig};
use proptest::prelude::*;
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum Op {
    Put(String, u32),
    Get(String),
    Remove(String),
}

/// Short keys from a small alphabet, so sequences revisit keys and collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-d]{0,3}"
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (key_strategy(), any::<u32>()).prop_map(|(k, v)| Op::Put(k, v)),
        2 => key_strategy().prop_map(Op::Get),
        2 => key_strategy().prop_map(Op::Remove),
    ]
}

proptest! {
    #[test]
    fn test_matches_hashmap_model(ops in prop::collection::vec(op_strategy(), 1..300)) {
        let map = ConcurrentOpenAddressingMap::new();
        let mut model = HashMap::new();

        for op in ops {
            match op {
                Op::Put(k, v) => {
                    let expected = model.insert(k.clone(), v);
                    prop_assert_eq!(map.put(&k, v), Ok(expected));
                }
                Op::Get(k) => {
                    prop_assert_eq!(map.get(&k), model.get(&k).copied());
                }
                Op::Remove(k) => {
                    prop_assert_eq!(map.remove(&k), model.remove(&k));
                }
            }
            prop_assert_eq!(map.len(), model.len());
        }

        map.assert_probe_chains();
        for (k, v) in &model {
            prop_assert_eq!(map.get(k), Some(*v));
        }
    }

    #[test]
    fn test_round_trip(key in "\\PC{0,40}", value in any::<i64>()) {
        let map = ConcurrentOpenAddressingMap::new();
        prop_assume!(key.len() < 256);
        prop_assert_eq!(map.put(&key, value), Ok(None));
        prop_assert_eq!(map.get(&key), Some(value));
    }

    #[test]
    fn test_capacity_grows_monotonically(keys in prop::collection::hash_set("[a-z0-9]{1,12}", 1..400)) {
        let map = ConcurrentOpenAddressingMap::new();
        let mut last_capacity = map.capacity();

        for (i, key) in keys.iter().enumerate() {
            map.put(key, i).unwrap();
            let capacity = map.capacity();
            prop_assert!(capacity >= last_capacity);
            prop_assert!(capacity.is_power_of_two());
            prop_assert!(map.len() < capacity);
            last_capacity = capacity;
        }

        prop_assert_eq!(map.len(), keys.len());
        for (i, key) in keys.iter().enumerate() {
            prop_assert_eq!(map.get(key), Some(i));
        }

        // Removing everything never shrinks
        for key in &keys {
            map.remove(key);
        }
        prop_assert!(map.is_empty());
        prop_assert_eq!(map.capacity(), last_capacity);
    }

    #[test]
    fn test_oversize_keys_rejected(max in 1usize..64, extra in 0usize..32) {
        let config = MapConfig::default().with_max_key_length(max);
        let map = ConcurrentOpenAddressingMap::with_config(config).unwrap();
        map.put("", 0u8).unwrap();

        let key = "k".repeat(max + extra);
        prop_assert_eq!(
            map.put(&key, 1),
            Err(Error::KeyTooLong { len: max + extra, max })
        );
        prop_assert_eq!(map.len(), 1);
        prop_assert_eq!(map.get(&key), None);
    }
}
