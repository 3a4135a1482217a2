//! Typed ordered trees over the engine's flat keyspace
//!
//! A `Tree<K, V>` owns one id prefix of the keyspace plus the comparator and
//! codecs that give its bytes meaning. The engine stores bytes in hash
//! order; ordered iteration is produced at `browse()` time by decoding and
//! sorting the tree's key set.
//!
//! The trade-off mirrors the engine's design: cursor creation is O(n log n)
//! in the number of keys, while each `advance` step is one live value fetch.
//! Values are never materialized up front.

use std::sync::Arc;

use crate::codec::{Codec, KeyComparator};
use crate::engine::{prefixed_key, BurrowEngine, TreeId};
use crate::error::BurrowResult;

/// One key-value pair produced by a cursor step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple<K, V> {
    pub key: K,
    pub value: V,
}

/// Typed handle over one tree of an engine.
pub struct Tree<K: 'static, V: 'static> {
    engine: Arc<BurrowEngine>,
    id: TreeId,
    comparator: Arc<dyn KeyComparator<K>>,
    key_codec: Arc<dyn Codec<K>>,
    value_codec: Arc<dyn Codec<V>>,
}

impl<K: 'static, V: 'static> Tree<K, V> {
    /// Allocate a fresh tree on an engine, with the comparator and codecs
    /// that will govern it for its whole life.
    pub fn create(
        engine: Arc<BurrowEngine>,
        comparator: impl KeyComparator<K> + 'static,
        key_codec: impl Codec<K> + 'static,
        value_codec: impl Codec<V> + 'static,
    ) -> BurrowResult<Self> {
        let id = engine.allocate_tree_id()?;
        Ok(Self {
            engine,
            id,
            comparator: Arc::new(comparator),
            key_codec: Arc::new(key_codec),
            value_codec: Arc::new(value_codec),
        })
    }

    /// This tree's id within its engine.
    pub fn id(&self) -> TreeId {
        self.id
    }

    /// Insert a pair. With `overwrite` the previous value (if any) is
    /// replaced and returned; without it an existing entry is left untouched
    /// and returned, and nothing is written.
    pub fn insert(&self, key: &K, value: &V, overwrite: bool) -> BurrowResult<Option<V>> {
        let key_bytes = self.key_codec.encode(key)?;
        let value_bytes = self.value_codec.encode(value)?;
        let stored = prefixed_key(&self.id.prefix(), &key_bytes);
        match self.engine.insert_raw(&stored, &value_bytes, overwrite)? {
            Some(prev) => Ok(Some(self.value_codec.decode(&prev)?)),
            None => Ok(None),
        }
    }

    /// Look up the value for a key.
    pub fn find(&self, key: &K) -> BurrowResult<Option<V>> {
        let key_bytes = self.key_codec.encode(key)?;
        let stored = prefixed_key(&self.id.prefix(), &key_bytes);
        match self.engine.find_raw(&stored)? {
            Some(bytes) => Ok(Some(self.value_codec.decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// True if the key is present, without decoding any value.
    pub fn contains(&self, key: &K) -> BurrowResult<bool> {
        let key_bytes = self.key_codec.encode(key)?;
        let stored = prefixed_key(&self.id.prefix(), &key_bytes);
        Ok(self.engine.find_raw(&stored)?.is_some())
    }

    /// Remove a key, returning the previous value. Removing an absent key
    /// is a no-op returning `None`.
    pub fn remove(&self, key: &K) -> BurrowResult<Option<V>> {
        let key_bytes = self.key_codec.encode(key)?;
        let stored = prefixed_key(&self.id.prefix(), &key_bytes);
        match self.engine.remove_raw(&stored)? {
            Some(prev) => Ok(Some(self.value_codec.decode(&prev)?)),
            None => Ok(None),
        }
    }

    /// Number of entries in this tree.
    pub fn len(&self) -> usize {
        self.engine.prefix_count(&self.id.prefix())
    }

    /// Returns true if the tree holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry, one key at a time, via a raw forward scan.
    /// Not atomic: an interruption leaves the keys visited so far removed.
    pub fn clear(&self) -> BurrowResult<()> {
        let prefix = self.id.prefix();
        for raw_key in self.engine.prefix_keys(&prefix) {
            self.engine.remove_raw(&prefixed_key(&prefix, &raw_key))?;
        }
        Ok(())
    }

    /// Open a forward cursor positioned before the first entry, in
    /// comparator order.
    ///
    /// The cursor captures the key set as of this call; each `advance`
    /// fetches that key's current value live. A key removed after `browse`
    /// is skipped, a key inserted after `browse` is not observed, and an
    /// overwritten value is seen in its newer form. There is no snapshot
    /// isolation.
    pub fn browse(&self) -> BurrowResult<TreeCursor<K, V>> {
        let prefix = self.id.prefix();
        let mut entries = Vec::new();
        for raw_key in self.engine.prefix_keys(&prefix) {
            let key = self.key_codec.decode(&raw_key)?;
            entries.push((key, raw_key));
        }
        entries.sort_by(|a, b| self.comparator.compare(&a.0, &b.0));

        Ok(TreeCursor {
            engine: Arc::clone(&self.engine),
            prefix,
            entries: entries.into_iter(),
            value_codec: Arc::clone(&self.value_codec),
        })
    }
}

/// Forward-only cursor over one tree, in comparator order.
///
/// Stateful and single-pass; a fresh cursor is required to traverse again.
pub struct TreeCursor<K: 'static, V: 'static> {
    engine: Arc<BurrowEngine>,
    prefix: [u8; 4],
    entries: std::vec::IntoIter<(K, Vec<u8>)>,
    value_codec: Arc<dyn Codec<V>>,
}

impl<K: 'static, V: 'static> TreeCursor<K, V> {
    /// Produce the next tuple, or `None` once the cursor is exhausted.
    ///
    /// Keys whose entry has been removed since the cursor was opened are
    /// skipped silently.
    pub fn advance(&mut self) -> BurrowResult<Option<Tuple<K, V>>> {
        for (key, raw_key) in self.entries.by_ref() {
            let stored = prefixed_key(&self.prefix, &raw_key);
            if let Some(value_bytes) = self.engine.find_raw(&stored)? {
                let value = self.value_codec.decode(&value_bytes)?;
                return Ok(Some(Tuple { key, value }));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{KeyComparator, OrdComparator, StrCodec, U64Codec};
    use crate::config::EngineConfig;
    use std::cmp::Ordering;
    use tempfile::TempDir;

    fn test_tree() -> (Tree<String, u64>, Arc<BurrowEngine>, TempDir) {
        let dir = TempDir::new().unwrap();
        let engine = Arc::new(
            BurrowEngine::open(dir.path().join("store"), EngineConfig::default()).unwrap(),
        );
        let tree = Tree::create(Arc::clone(&engine), OrdComparator, StrCodec, U64Codec).unwrap();
        (tree, engine, dir)
    }

    #[test]
    fn test_insert_find_roundtrip() {
        let (tree, _engine, _dir) = test_tree();

        assert_eq!(tree.insert(&"a".into(), &1, true).unwrap(), None);
        assert_eq!(tree.find(&"a".into()).unwrap(), Some(1));
        assert_eq!(tree.find(&"missing".into()).unwrap(), None);
        assert!(tree.contains(&"a".into()).unwrap());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_overwrite_returns_previous() {
        let (tree, _engine, _dir) = test_tree();

        tree.insert(&"k".into(), &1, true).unwrap();
        assert_eq!(tree.insert(&"k".into(), &2, true).unwrap(), Some(1));
        assert_eq!(tree.find(&"k".into()).unwrap(), Some(2));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_no_overwrite_preserves_existing() {
        let (tree, _engine, _dir) = test_tree();

        tree.insert(&"k".into(), &1, true).unwrap();
        assert_eq!(tree.insert(&"k".into(), &9, false).unwrap(), Some(1));
        assert_eq!(tree.find(&"k".into()).unwrap(), Some(1));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let (tree, _engine, _dir) = test_tree();

        tree.insert(&"k".into(), &1, true).unwrap();
        assert_eq!(tree.remove(&"k".into()).unwrap(), Some(1));
        assert_eq!(tree.remove(&"k".into()).unwrap(), None);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_browse_in_comparator_order() {
        let (tree, _engine, _dir) = test_tree();

        tree.insert(&"cherry".into(), &3, true).unwrap();
        tree.insert(&"apple".into(), &1, true).unwrap();
        tree.insert(&"banana".into(), &2, true).unwrap();

        let mut cursor = tree.browse().unwrap();
        let mut seen = Vec::new();
        while let Some(tuple) = cursor.advance().unwrap() {
            seen.push((tuple.key, tuple.value));
        }
        assert_eq!(
            seen,
            vec![
                ("apple".to_string(), 1),
                ("banana".to_string(), 2),
                ("cherry".to_string(), 3),
            ]
        );
    }

    #[test]
    fn test_browse_with_custom_comparator() {
        struct Reverse;
        impl KeyComparator<String> for Reverse {
            fn compare(&self, a: &String, b: &String) -> Ordering {
                b.cmp(a)
            }
        }

        let dir = TempDir::new().unwrap();
        let engine = Arc::new(
            BurrowEngine::open(dir.path().join("store"), EngineConfig::default()).unwrap(),
        );
        let tree: Tree<String, u64> =
            Tree::create(Arc::clone(&engine), Reverse, StrCodec, U64Codec).unwrap();

        tree.insert(&"a".into(), &1, true).unwrap();
        tree.insert(&"b".into(), &2, true).unwrap();
        tree.insert(&"c".into(), &3, true).unwrap();

        let mut cursor = tree.browse().unwrap();
        let mut keys = Vec::new();
        while let Some(tuple) = cursor.advance().unwrap() {
            keys.push(tuple.key);
        }
        assert_eq!(keys, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_cursor_skips_keys_removed_after_browse() {
        let (tree, _engine, _dir) = test_tree();

        tree.insert(&"a".into(), &1, true).unwrap();
        tree.insert(&"b".into(), &2, true).unwrap();
        tree.insert(&"c".into(), &3, true).unwrap();

        let mut cursor = tree.browse().unwrap();
        tree.remove(&"b".into()).unwrap();

        let mut keys = Vec::new();
        while let Some(tuple) = cursor.advance().unwrap() {
            keys.push(tuple.key);
        }
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_clear_empties_tree() {
        let (tree, _engine, _dir) = test_tree();

        for i in 0..10u64 {
            tree.insert(&format!("k{}", i), &i, true).unwrap();
        }
        assert_eq!(tree.len(), 10);

        tree.clear().unwrap();
        assert!(tree.is_empty());
        let mut cursor = tree.browse().unwrap();
        assert!(cursor.advance().unwrap().is_none());
    }

    #[test]
    fn test_empty_tree_browse() {
        let (tree, _engine, _dir) = test_tree();
        let mut cursor = tree.browse().unwrap();
        assert!(cursor.advance().unwrap().is_none());
    }
}
