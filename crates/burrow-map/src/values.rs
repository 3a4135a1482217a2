//! Lazy value view and its iterator
//!
//! `values()` on a map hands back a `LazyValues`: a read-once view over the
//! data tree's values, backed by a single forward cursor opened when the
//! view was created. Nothing is materialized until the caller asks for it,
//! and the view is consumed by iteration - a fresh `values()` call is the
//! only way to traverse again.
//!
//! There is no isolation from concurrent mutation: entries removed after the
//! view was opened are skipped, entries inserted after are not observed.

use burrow_core::TreeCursor;

use crate::error::{MapError, MapResult};

/// Read-once view over a map's values, in key order.
///
/// Supports only size queries, iteration, and explicit eager
/// materialization via [`to_vec`](LazyValues::to_vec). The mutating
/// collection surface deliberately does not exist on this type.
pub struct LazyValues<K: 'static, V: 'static> {
    cursor: TreeCursor<K, V>,
    size: usize,
}

impl<K: 'static, V: 'static> LazyValues<K, V> {
    pub(crate) fn new(cursor: TreeCursor<K, V>, size: usize) -> Self {
        Self { cursor, size }
    }

    /// The map's size captured when this view was created.
    pub fn len(&self) -> usize {
        self.size
    }

    /// True if the view was created over an empty map.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Drain the view into a Vec. This is the one eager path: it holds
    /// every value in memory at once, O(len) space.
    pub fn to_vec(self) -> MapResult<Vec<V>> {
        let mut out = Vec::with_capacity(self.size);
        for value in self {
            out.push(value?);
        }
        Ok(out)
    }
}

impl<K: 'static, V: 'static> IntoIterator for LazyValues<K, V> {
    type Item = MapResult<V>;
    type IntoIter = ValuesIter<K, V>;

    fn into_iter(self) -> ValuesIter<K, V> {
        ValuesIter::new(self.cursor)
    }
}

/// Single-pass iterator over a map's values.
///
/// Keeps a one-element look-ahead buffer, pre-fetched at construction and
/// after every successful step, so [`has_next`](ValuesIter::has_next) is
/// O(1) and side-effect-free.
pub struct ValuesIter<K: 'static, V: 'static> {
    cursor: TreeCursor<K, V>,
    lookahead: Option<MapResult<V>>,
}

impl<K: 'static, V: 'static> ValuesIter<K, V> {
    fn new(cursor: TreeCursor<K, V>) -> Self {
        let mut iter = Self { cursor, lookahead: None };
        iter.lookahead = iter.fetch();
        iter
    }

    fn fetch(&mut self) -> Option<MapResult<V>> {
        match self.cursor.advance() {
            Ok(Some(tuple)) => Some(Ok(tuple.value)),
            Ok(None) => None,
            Err(e) => Some(Err(e.into())),
        }
    }

    /// True if a buffered element remains.
    pub fn has_next(&self) -> bool {
        self.lookahead.is_some()
    }

    /// Return the buffered value and advance the buffer.
    ///
    /// Fails with [`MapError::Exhausted`] once nothing remains. A cursor
    /// failure is returned once and ends the iteration.
    pub fn next_value(&mut self) -> MapResult<V> {
        match self.lookahead.take() {
            None => Err(MapError::Exhausted),
            Some(Ok(value)) => {
                self.lookahead = self.fetch();
                Ok(value)
            }
            // Do not refetch past a failed cursor
            Some(Err(e)) => Err(e),
        }
    }
}

impl<K: 'static, V: 'static> Iterator for ValuesIter<K, V> {
    type Item = MapResult<V>;

    fn next(&mut self) -> Option<MapResult<V>> {
        if self.lookahead.is_none() {
            None
        } else {
            Some(self.next_value())
        }
    }
}
