//! Integration tests: the full factory -> map -> values pipeline.
//!
//! These exercise the public surface only, the way an embedding application
//! would: maps created from one factory, mutations batched into shared
//! checkpoints, lazy value iteration, coordinated teardown.

use std::cmp::Ordering;

use burrow_map::{
    KeyComparator, MapError, MapFactory, OrdComparator, PersistentMap, StrCodec, U64Codec,
};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn test_factory() -> (MapFactory, TempDir) {
    let dir = TempDir::new().unwrap();
    let factory = MapFactory::open(dir.path(), "maps").unwrap();
    (factory, dir)
}

fn str_map(factory: &MapFactory, commit_threshold: u64) -> PersistentMap<String, u64> {
    factory
        .create_map(OrdComparator, StrCodec, U64Codec, commit_threshold)
        .unwrap()
}

// ---------------------------------------------------------------------------
// Basic map operations
// ---------------------------------------------------------------------------

#[test]
fn test_put_get_contains() {
    let (factory, _dir) = test_factory();
    let map = str_map(&factory, 100);

    assert_eq!(map.put("alpha".into(), 1).unwrap(), None);
    assert_eq!(map.get(&"alpha".into()).unwrap(), Some(1));
    assert!(map.contains_key(&"alpha".into()).unwrap());
    assert!(!map.contains_key(&"beta".into()).unwrap());
    assert_eq!(map.len().unwrap(), 1);

    factory.dispose().unwrap();
}

#[test]
fn test_put_overwrite_returns_previous() {
    let (factory, _dir) = test_factory();
    let map = str_map(&factory, 100);

    map.put("k".into(), 1).unwrap();
    assert_eq!(map.put("k".into(), 2).unwrap(), Some(1));
    assert_eq!(map.get(&"k".into()).unwrap(), Some(2));
    assert_eq!(map.len().unwrap(), 1);

    factory.dispose().unwrap();
}

#[test]
fn test_remove_then_get_absent() {
    let (factory, _dir) = test_factory();
    let map = str_map(&factory, 100);

    map.put("k".into(), 42).unwrap();
    assert_eq!(map.len().unwrap(), 1);

    assert_eq!(map.remove(&"k".into()).unwrap(), Some(42));
    assert_eq!(map.get(&"k".into()).unwrap(), None);
    assert!(!map.contains_key(&"k".into()).unwrap());
    assert_eq!(map.len().unwrap(), 0);

    factory.dispose().unwrap();
}

#[test]
fn test_remove_absent_is_noop() {
    let (factory, _dir) = test_factory();
    let map = str_map(&factory, 100);

    map.put("keep".into(), 1).unwrap();
    assert_eq!(map.remove(&"never-there".into()).unwrap(), None);
    assert_eq!(map.len().unwrap(), 1);

    factory.dispose().unwrap();
}

#[test]
fn test_contains_value_scans_data_tree() {
    let (factory, _dir) = test_factory();
    let map = str_map(&factory, 100);

    map.put("a".into(), 1).unwrap();
    map.put("b".into(), 2).unwrap();

    assert!(map.contains_value(&2).unwrap());
    assert!(!map.contains_value(&99).unwrap());

    factory.dispose().unwrap();
}

#[test]
fn test_put_all_inserts_every_entry() {
    let (factory, _dir) = test_factory();
    let map = str_map(&factory, 100);

    map.put_all(vec![
        ("a".to_string(), 1),
        ("b".to_string(), 2),
        ("c".to_string(), 3),
    ])
    .unwrap();

    assert_eq!(map.len().unwrap(), 3);
    assert_eq!(map.get(&"b".into()).unwrap(), Some(2));
    assert!(map.contains_key(&"c".into()).unwrap());

    factory.dispose().unwrap();
}

#[test]
fn test_is_empty_transitions() {
    let (factory, _dir) = test_factory();
    let map = str_map(&factory, 100);

    assert!(map.is_empty().unwrap());
    map.put("k".into(), 1).unwrap();
    assert!(!map.is_empty().unwrap());
    map.remove(&"k".into()).unwrap();
    assert!(map.is_empty().unwrap());

    factory.dispose().unwrap();
}

// ---------------------------------------------------------------------------
// Checkpoint coordination
// ---------------------------------------------------------------------------

#[test]
fn test_checkpoint_scenario_with_sibling_reset() {
    let (factory, _dir) = test_factory();
    let map_a = str_map(&factory, 3);
    let map_b = str_map(&factory, 3);

    // b accumulates two writes, not enough to checkpoint
    map_b.put("x".into(), 10).unwrap();
    map_b.put("y".into(), 20).unwrap();

    // a: two writes, still no checkpoint anywhere
    map_a.put("a".into(), 1).unwrap();
    map_a.put("b".into(), 2).unwrap();
    assert_eq!(factory.engine().commit_count(), 0);

    // a's third write fires checkpoint #1 and resets b's counter too
    map_a.put("c".into(), 3).unwrap();
    assert_eq!(factory.engine().commit_count(), 1);

    // if b's counter had survived, this would be its third write
    map_b.put("z".into(), 30).unwrap();
    assert_eq!(factory.engine().commit_count(), 1);

    // b needs a full threshold of fresh writes to checkpoint again
    map_b.put("w".into(), 40).unwrap();
    map_b.put("v".into(), 50).unwrap();
    assert_eq!(factory.engine().commit_count(), 2);

    assert_eq!(map_a.get(&"a".into()).unwrap(), Some(1));
    assert_eq!(map_a.len().unwrap(), 3);

    factory.dispose().unwrap();
}

#[test]
fn test_floor_of_n_over_threshold_checkpoints() {
    let (factory, _dir) = test_factory();
    let map = str_map(&factory, 4);

    for i in 0..10u64 {
        map.put(format!("k{}", i), i).unwrap();
    }
    assert_eq!(factory.engine().commit_count(), 2); // floor(10 / 4)

    factory.dispose().unwrap();
}

#[test]
fn test_removes_count_toward_threshold() {
    let (factory, _dir) = test_factory();
    let map = str_map(&factory, 3);

    map.put("a".into(), 1).unwrap();
    map.put("b".into(), 2).unwrap();
    map.remove(&"a".into()).unwrap();
    assert_eq!(factory.engine().commit_count(), 1);

    factory.dispose().unwrap();
}

#[test]
fn test_put_all_is_one_write_event() {
    let (factory, _dir) = test_factory();
    let map = str_map(&factory, 2);

    let batch: Vec<(String, u64)> = (0..5).map(|i| (format!("k{}", i), i)).collect();
    map.put_all(batch).unwrap();
    assert_eq!(factory.engine().commit_count(), 0); // one event, threshold is 2

    map.put("one-more".into(), 99).unwrap();
    assert_eq!(factory.engine().commit_count(), 1);

    factory.dispose().unwrap();
}

// ---------------------------------------------------------------------------
// Lazy value iteration
// ---------------------------------------------------------------------------

#[test]
fn test_values_in_key_order() {
    let (factory, _dir) = test_factory();
    let map = str_map(&factory, 100);

    map.put("cherry".into(), 3).unwrap();
    map.put("apple".into(), 1).unwrap();
    map.put("banana".into(), 2).unwrap();

    let values = map.values().unwrap();
    assert_eq!(values.len(), 3);
    assert_eq!(values.to_vec().unwrap(), vec![1, 2, 3]);

    factory.dispose().unwrap();
}

#[test]
fn test_values_repeat_call_yields_equal_sequence() {
    let (factory, _dir) = test_factory();
    let map = str_map(&factory, 100);

    for i in 0..20u64 {
        map.put(format!("key{:02}", i), i * 7).unwrap();
    }

    let first = map.values().unwrap().to_vec().unwrap();
    let second = map.values().unwrap().to_vec().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 20);

    factory.dispose().unwrap();
}

#[test]
fn test_values_lookahead_protocol() {
    let (factory, _dir) = test_factory();
    let map = str_map(&factory, 100);

    map.put("a".into(), 1).unwrap();
    map.put("b".into(), 2).unwrap();

    let mut iter = map.values().unwrap().into_iter();
    assert!(iter.has_next());
    assert!(iter.has_next()); // side-effect-free
    assert_eq!(iter.next_value().unwrap(), 1);
    assert!(iter.has_next());
    assert_eq!(iter.next_value().unwrap(), 2);
    assert!(!iter.has_next());
    assert!(matches!(iter.next_value(), Err(MapError::Exhausted)));

    factory.dispose().unwrap();
}

#[test]
fn test_values_as_std_iterator() {
    let (factory, _dir) = test_factory();
    let map = str_map(&factory, 100);

    map.put("a".into(), 10).unwrap();
    map.put("b".into(), 20).unwrap();

    let collected: Vec<u64> = map
        .values()
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap())
        .collect();
    assert_eq!(collected, vec![10, 20]);

    factory.dispose().unwrap();
}

#[test]
fn test_values_on_empty_map() {
    let (factory, _dir) = test_factory();
    let map = str_map(&factory, 100);

    let values = map.values().unwrap();
    assert!(values.is_empty());
    assert_eq!(values.len(), 0);

    let mut iter = map.values().unwrap().into_iter();
    assert!(!iter.has_next());
    assert!(matches!(iter.next_value(), Err(MapError::Exhausted)));

    factory.dispose().unwrap();
}

#[test]
fn test_values_with_custom_comparator() {
    #[derive(Clone)]
    struct Reverse;
    impl KeyComparator<String> for Reverse {
        fn compare(&self, a: &String, b: &String) -> Ordering {
            b.cmp(a)
        }
    }

    let (factory, _dir) = test_factory();
    let map: PersistentMap<String, u64> =
        factory.create_map(Reverse, StrCodec, U64Codec, 100).unwrap();

    map.put("a".into(), 1).unwrap();
    map.put("b".into(), 2).unwrap();
    map.put("c".into(), 3).unwrap();

    assert_eq!(map.values().unwrap().to_vec().unwrap(), vec![3, 2, 1]);

    factory.dispose().unwrap();
}

// ---------------------------------------------------------------------------
// Unsupported capability surface
// ---------------------------------------------------------------------------

#[test]
fn test_key_set_and_entry_set_unsupported() {
    let (factory, _dir) = test_factory();
    let map = str_map(&factory, 100);

    // Empty map
    assert!(matches!(map.key_set(), Err(MapError::Unsupported { .. })));
    assert!(matches!(map.entry_set(), Err(MapError::Unsupported { .. })));

    // Non-empty map: still unsupported, content-independent
    map.put("k".into(), 1).unwrap();
    assert!(matches!(map.key_set(), Err(MapError::Unsupported { .. })));
    assert!(matches!(map.entry_set(), Err(MapError::Unsupported { .. })));

    factory.dispose().unwrap();
}

// ---------------------------------------------------------------------------
// Clear
// ---------------------------------------------------------------------------

#[test]
fn test_clear_empties_both_trees() {
    let (factory, _dir) = test_factory();
    let map = str_map(&factory, 100);

    for i in 0..25u64 {
        map.put(format!("k{}", i), i).unwrap();
    }
    map.clear().unwrap();

    assert_eq!(map.len().unwrap(), 0);
    assert!(map.is_empty().unwrap());
    assert!(!map.contains_key(&"k0".into()).unwrap());

    let mut iter = map.values().unwrap().into_iter();
    assert!(!iter.has_next());

    factory.dispose().unwrap();
}

#[test]
fn test_map_usable_after_clear() {
    let (factory, _dir) = test_factory();
    let map = str_map(&factory, 100);

    map.put("old".into(), 1).unwrap();
    map.clear().unwrap();
    map.put("new".into(), 2).unwrap();

    assert_eq!(map.len().unwrap(), 1);
    assert_eq!(map.get(&"new".into()).unwrap(), Some(2));
    assert_eq!(map.get(&"old".into()).unwrap(), None);

    factory.dispose().unwrap();
}

// ---------------------------------------------------------------------------
// Factory lifecycle
// ---------------------------------------------------------------------------

#[test]
fn test_dispose_twice_is_silent() {
    let (factory, _dir) = test_factory();
    let map = str_map(&factory, 10);
    map.put("k".into(), 1).unwrap();

    factory.dispose().unwrap();
    let commits_after_first = factory.engine().commit_count();
    factory.dispose().unwrap();
    assert_eq!(factory.engine().commit_count(), commits_after_first);
}

#[test]
fn test_sibling_maps_are_isolated() {
    let (factory, _dir) = test_factory();
    let map_a = str_map(&factory, 100);
    let map_b = str_map(&factory, 100);

    map_a.put("shared-key".into(), 1).unwrap();
    map_b.put("shared-key".into(), 2).unwrap();

    assert_eq!(map_a.get(&"shared-key".into()).unwrap(), Some(1));
    assert_eq!(map_b.get(&"shared-key".into()).unwrap(), Some(2));

    map_a.remove(&"shared-key".into()).unwrap();
    assert_eq!(map_b.get(&"shared-key".into()).unwrap(), Some(2));

    factory.dispose().unwrap();
}

#[test]
fn test_large_map_roundtrip() {
    let (factory, _dir) = test_factory();
    let map = str_map(&factory, 50);

    for i in 0..1000u64 {
        map.put(format!("key{:04}", i), i).unwrap();
    }
    assert_eq!(map.len().unwrap(), 1000);

    for i in (0..1000u64).step_by(97) {
        assert_eq!(map.get(&format!("key{:04}", i)).unwrap(), Some(i));
    }

    let values = map.values().unwrap().to_vec().unwrap();
    assert_eq!(values.len(), 1000);
    // Key order is lexicographic, and the zero-padded keys make that the
    // numeric order too
    assert_eq!(values[0], 0);
    assert_eq!(values[999], 999);

    factory.dispose().unwrap();
}
