//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check key derivation and read behavior over generated input.

use proptest::prelude::*;
use serde_json::json;

use crate::cache::{tags, ProcessCache, MARKER_TAG, TAG_SEPARATOR};
use crate::error::CoreError;

// == Strategies ==
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_:]{1,32}"
}

fn tags_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,8}", 0..6)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Remember always grows the caller's list by exactly the marker tag.
    #[test]
    fn prop_remember_appends_marker(key in key_strategy(), mut list in tags_strategy()) {
        let mut cache = ProcessCache::new();
        cache.create();
        let before = list.clone();

        cache.remember(&key, json!(1), &mut list).unwrap();

        prop_assert_eq!(list.len(), before.len() + 1);
        prop_assert_eq!(&list[..before.len()], &before[..]);
        prop_assert_eq!(list.last().map(String::as_str), Some(MARKER_TAG));
    }

    // The stored key is the base key followed by the joined, marked list.
    #[test]
    fn prop_stored_under_derived_key(key in key_strategy(), list in tags_strategy(), n in any::<i64>()) {
        let mut cache = ProcessCache::new();
        cache.create();
        let mut working = list.clone();

        cache.remember(&key, json!(n), &mut working).unwrap();

        let mut expected = list.clone();
        expected.push(MARKER_TAG.to_string());
        let derived = format!("{}{}", key, expected.join(TAG_SEPARATOR));

        let entry = cache.read(&derived).unwrap();
        prop_assert_eq!(entry.map(|e| e.value), Some(json!(n)));
    }

    // Pure and mutating derivation agree on the key.
    #[test]
    fn prop_pure_matches_mutating(key in key_strategy(), list in tags_strategy()) {
        let mut working = list.clone();
        let mutated = tags::compose(&key, &mut working);
        let (pure, used) = tags::compose_pure(&key, &list);

        prop_assert_eq!(mutated, pure);
        prop_assert_eq!(working, used);
    }

    // Nothing is readable before the cache exists.
    #[test]
    fn prop_read_uninitialized(key in key_strategy()) {
        let mut cache = ProcessCache::new();
        prop_assert!(matches!(cache.read(&key), Err(CoreError::NotInitialized)));
    }

    // Hits plus misses equals the number of reads performed.
    #[test]
    fn prop_read_stats(writes in prop::collection::vec(key_strategy(), 0..20),
                       reads in prop::collection::vec(key_strategy(), 1..20)) {
        let mut cache = ProcessCache::new();
        cache.create();
        for key in &writes {
            cache.insert(key.clone(), json!(null)).unwrap();
        }

        let mut expected_hits = 0;
        for key in &reads {
            if cache.read(key).unwrap().is_some() {
                expected_hits += 1;
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, expected_hits);
        prop_assert_eq!(stats.hits + stats.misses, reads.len() as u64);
        prop_assert_eq!(stats.total_entries, cache.len());
    }
}
