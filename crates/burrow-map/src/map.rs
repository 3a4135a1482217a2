//! The map adapter
//!
//! One logical map is two coordinated trees on the shared engine: a *data
//! tree* holding the real key-value entries and an *index tree* mirroring
//! the key set with a constant sentinel value. Every mutation updates both;
//! the key sets stay equal as observed by any completed operation. The
//! mirroring is maintained by construction, not by a cross-tree transaction,
//! so an interrupted `clear()` can transiently break it (see
//! [`clear`](PersistentMap::clear)).
//!
//! Presence and cardinality queries read the index tree only. A value codec
//! is never executed to answer `contains_key` or `len`, which keeps value
//! types free to reference maps of this kind without re-entering the
//! adapter during a lookup.

use std::sync::Arc;

use burrow_core::Tree;

use crate::coordinator::CommitCoordinator;
use crate::error::{MapError, MapResult};
use crate::sentinel::Sentinel;
use crate::values::LazyValues;

/// A map whose entries live in the factory's storage engine.
///
/// The capability set is deliberately narrower than a full associative
/// container: key-set and entry-set views are unsupported regardless of
/// contents, and value iteration is single-pass and lazy.
///
/// Thread safety follows the engine's: individual operations are safe to
/// race, but this layer adds no locking of its own outside the checkpoint
/// path.
pub struct PersistentMap<K: 'static, V: 'static> {
    data: Tree<K, V>,
    index: Tree<K, Sentinel>,
    coordinator: Arc<CommitCoordinator>,
    slot: usize,
}

impl<K: 'static, V: 'static> PersistentMap<K, V> {
    pub(crate) fn new(
        data: Tree<K, V>,
        index: Tree<K, Sentinel>,
        coordinator: Arc<CommitCoordinator>,
        slot: usize,
    ) -> Self {
        Self { data, index, coordinator, slot }
    }

    /// True if the key is present. Answered from the index tree only - no
    /// value is ever deserialized.
    pub fn contains_key(&self, key: &K) -> MapResult<bool> {
        Ok(self.index.contains(key)?)
    }

    /// Look up the value for a key.
    pub fn get(&self, key: &K) -> MapResult<Option<V>> {
        Ok(self.data.find(key)?)
    }

    /// True if any entry holds this value. Full forward scan, O(len).
    pub fn contains_value(&self, value: &V) -> MapResult<bool>
    where
        V: PartialEq,
    {
        let mut cursor = self.data.browse()?;
        while let Some(tuple) = cursor.advance()? {
            if tuple.value == *value {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Insert a pair, returning the previous value for the key if any.
    pub fn put(&self, key: K, value: V) -> MapResult<Option<V>> {
        let previous = self.data.insert(&key, &value, true)?;
        self.index.insert(&key, &Sentinel, false)?;
        self.coordinator.record_write(self.slot)?;
        Ok(previous)
    }

    /// Insert every pair, then report a single write event for the whole
    /// batch.
    pub fn put_all(&self, entries: impl IntoIterator<Item = (K, V)>) -> MapResult<()> {
        for (key, value) in entries {
            self.data.insert(&key, &value, true)?;
            self.index.insert(&key, &Sentinel, false)?;
        }
        self.coordinator.record_write(self.slot)?;
        Ok(())
    }

    /// Remove a key, returning its previous value. Removing an absent key
    /// is a no-op returning `None`, not an error.
    pub fn remove(&self, key: &K) -> MapResult<Option<V>> {
        let previous = self.data.remove(key)?;
        self.index.remove(key)?;
        self.coordinator.record_write(self.slot)?;
        Ok(previous)
    }

    /// Number of entries. The index tree is the authoritative source.
    pub fn len(&self) -> MapResult<usize> {
        Ok(self.index.len())
    }

    /// True if the map holds no entries.
    pub fn is_empty(&self) -> MapResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove every entry: drain the index tree, then the data tree, each
    /// via a complete forward scan.
    ///
    /// Not atomic as a unit. An interruption mid-clear can leave one tree
    /// non-empty while the other is empty, breaking the key-set mirror
    /// until a later `put`/`remove`/`clear` restores it.
    pub fn clear(&self) -> MapResult<()> {
        self.index.clear()?;
        self.data.clear()?;
        Ok(())
    }

    /// Open a lazy, read-once view over the values, in key order.
    ///
    /// The view captures the map's size at this instant and a single
    /// forward cursor over the data tree. Concurrent mutation during the
    /// iteration has no isolation guarantee - entries may be skipped or
    /// omitted.
    pub fn values(&self) -> MapResult<LazyValues<K, V>> {
        let size = self.len()?;
        let cursor = self.data.browse()?;
        Ok(LazyValues::new(cursor, size))
    }

    /// A key-set view over live data. Unsupported by design, regardless of
    /// contents.
    pub fn key_set(&self) -> MapResult<Vec<K>> {
        Err(MapError::Unsupported { operation: "key_set" })
    }

    /// An entry-set view over live data. Unsupported by design, regardless
    /// of contents.
    pub fn entry_set(&self) -> MapResult<Vec<(K, V)>> {
        Err(MapError::Unsupported { operation: "entry_set" })
    }
}
