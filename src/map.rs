use std::fmt;

use crate::algo;
use crate::config::TrieConfig;
use crate::error::{validate_key, Result};
use crate::iter::{
    Cursor, CursorMut, IntoIter, Iter, IterMut, Keys, Position, Values, ValuesMut,
};
use crate::node::{NodeId, NodeTable};

/// An ordered map from byte strings to `V`, stored as a 256-ary trie.
///
/// Keys are raw byte sequences and iterate in lexicographic byte order. The
/// empty key is supported; a non-empty key must not start with `0x00`,
/// which is reserved for it.
///
/// Besides the usual map operations the trie tracks, per key, how many
/// inserting calls have hit it (see [`count`](Self::count)), and exposes
/// stable [`Position`]s for positional lookup and erase.
pub struct TrieMap<V> {
    pub(crate) nodes: NodeTable,
    /// Values by node slot; `Some` exactly for terminal nodes.
    pub(crate) values: Vec<Option<V>>,
    pub(crate) len: usize,
    /// Cached smallest stored key, the root when empty.
    pub(crate) begin: NodeId,
    config: TrieConfig,
}

impl<V> TrieMap<V> {
    pub fn new() -> Self {
        Self::with_config(TrieConfig::default())
    }

    pub fn with_config(config: TrieConfig) -> Self {
        let nodes = NodeTable::with_capacity(config.node_capacity);
        let mut values = Vec::with_capacity(config.node_capacity.max(1));
        values.push(None);
        Self {
            nodes,
            values,
            len: 0,
            begin: NodeId::ROOT,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> TrieConfig {
        self.config
    }

    /// Number of distinct keys stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of trie nodes currently allocated, the root included.
    pub fn node_count(&self) -> usize {
        self.nodes.live_count()
    }

    // -------------------------------------------------------------------------
    // Insertion
    // -------------------------------------------------------------------------

    /// Inserts `key` unless it is already stored.
    ///
    /// Returns the key's position and whether it was newly inserted. An
    /// existing value is left untouched; the call is still recorded in the
    /// key's [`count`](Self::count).
    ///
    /// ```
    /// use trie_map::TrieMap;
    ///
    /// let mut map = TrieMap::new();
    /// let (pos, inserted) = map.insert("car", 1).unwrap();
    /// assert!(inserted);
    /// let (again, inserted) = map.insert("car", 2).unwrap();
    /// assert!(!inserted);
    /// assert_eq!(pos, again);
    /// assert_eq!(map.get("car"), Some(&1));
    /// assert_eq!(map.count("car"), 2);
    /// ```
    pub fn insert(&mut self, key: impl AsRef<[u8]>, value: V) -> Result<(Position, bool)> {
        let key = key.as_ref();
        validate_key(key)?;
        if let Some(id) = self.nodes.find(key) {
            self.nodes.bump_occurrences(id);
            return Ok((self.position_of(id), false));
        }
        let id = self.add_key(key, value);
        Ok((self.position_of(id), true))
    }

    /// Returns the value for `key`, inserting `V::default()` when absent.
    pub fn get_or_insert_default(&mut self, key: impl AsRef<[u8]>) -> Result<&mut V>
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Returns the value for `key`, inserting `f()` when absent. Either way
    /// the call counts as an insertion of `key`.
    pub fn get_or_insert_with(
        &mut self,
        key: impl AsRef<[u8]>,
        f: impl FnOnce() -> V,
    ) -> Result<&mut V> {
        let key = key.as_ref();
        validate_key(key)?;
        let id = match self.nodes.find(key) {
            Some(id) => {
                self.nodes.bump_occurrences(id);
                id
            }
            None => self.add_key(key, f()),
        };
        Ok(self.slot_mut(id))
    }

    fn add_key(&mut self, key: &[u8], value: V) -> NodeId {
        let id = self.nodes.add(key);
        if self.values.len() < self.nodes.slot_count() {
            self.values.resize_with(self.nodes.slot_count(), || None);
        }
        self.values[id.index()] = Some(value);
        self.len += 1;
        self.begin = self.nodes.leftmost();
        id
    }

    fn slot_mut(&mut self, id: NodeId) -> &mut V {
        match self.values[id.index()].as_mut() {
            Some(value) => value,
            None => panic!("terminal node {id:?} has no value"),
        }
    }

    /// Inserts every pair, stopping at the first rejected key. Pairs before
    /// it stay inserted.
    pub fn try_extend<K, I>(&mut self, iter: I) -> Result<()>
    where
        K: AsRef<[u8]>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in iter {
            self.insert(key, value)?;
        }
        Ok(())
    }

    /// Builds a map from pairs, failing on the first rejected key.
    pub fn try_from_iter<K, I>(iter: I) -> Result<Self>
    where
        K: AsRef<[u8]>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = Self::new();
        map.try_extend(iter)?;
        Ok(map)
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    /// Position of `key`, or [`Position::END`] when absent.
    pub fn find(&self, key: impl AsRef<[u8]>) -> Position {
        self.position_of(self.nodes.find(key.as_ref()).unwrap_or(NodeId::ROOT))
    }

    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<&V> {
        let id = self.nodes.find(key.as_ref())?;
        self.values[id.index()].as_ref()
    }

    pub fn get_mut(&mut self, key: impl AsRef<[u8]>) -> Option<&mut V> {
        let id = self.nodes.find(key.as_ref())?;
        self.values[id.index()].as_mut()
    }

    pub fn get_key_value(&self, key: impl AsRef<[u8]>) -> Option<(&[u8], &V)> {
        self.entry_at(self.find(key))
    }

    pub fn contains_key(&self, key: impl AsRef<[u8]>) -> bool {
        self.nodes.find(key.as_ref()).is_some()
    }

    /// Number of inserting calls made for `key` since it was last stored, 0
    /// when absent.
    pub fn count(&self, key: impl AsRef<[u8]>) -> usize {
        self.nodes.count(key.as_ref())
    }

    pub fn first(&self) -> Option<(&[u8], &V)> {
        self.entry_at(self.begin())
    }

    pub fn last(&self) -> Option<(&[u8], &V)> {
        self.entry_at(self.rbegin())
    }

    // -------------------------------------------------------------------------
    // Positions
    // -------------------------------------------------------------------------

    /// Position of the smallest key, [`Position::END`] when empty.
    #[inline]
    pub fn begin(&self) -> Position {
        self.position_of(self.begin)
    }

    #[inline]
    pub fn end(&self) -> Position {
        Position::END
    }

    /// Position of the largest key, [`Position::END`] when empty.
    pub fn rbegin(&self) -> Position {
        self.position_of(self.nodes.rightmost())
    }

    /// Reverse past-the-end position. Stepping backwards from
    /// [`begin`](Self::begin) lands here, so it coincides with
    /// [`Position::END`].
    #[inline]
    pub fn rend(&self) -> Position {
        Position::END
    }

    /// Position following `pos` in key order. `END` maps to itself.
    pub fn next_position(&self, pos: Position) -> Position {
        if !self.is_live(pos) {
            return Position::END;
        }
        self.position_of(self.nodes.successor(pos.id))
    }

    /// Position preceding `pos`. From `END` this is the last key; from the
    /// first key it is `END`.
    pub fn prev_position(&self, pos: Position) -> Position {
        if !pos.is_end() && !self.is_live(pos) {
            return Position::END;
        }
        self.position_of(self.nodes.predecessor(pos.id))
    }

    fn position_of(&self, id: NodeId) -> Position {
        if id.is_root() {
            return Position::END;
        }
        Position {
            id,
            generation: self.nodes.generation(id),
        }
    }

    /// Whether `pos` refers to a stored key.
    pub fn is_live(&self, pos: Position) -> bool {
        !pos.is_end()
            && self.nodes.generation(pos.id) == pos.generation
            && self.nodes.get(pos.id).is_some_and(|node| node.is_terminal())
    }

    pub fn key_at(&self, pos: Position) -> Option<&[u8]> {
        if !self.is_live(pos) {
            return None;
        }
        Some(self.nodes.node(pos.id).key())
    }

    pub fn value_at(&self, pos: Position) -> Option<&V> {
        if !self.is_live(pos) {
            return None;
        }
        self.values[pos.id.index()].as_ref()
    }

    pub fn value_at_mut(&mut self, pos: Position) -> Option<&mut V> {
        if !self.is_live(pos) {
            return None;
        }
        self.values[pos.id.index()].as_mut()
    }

    pub fn entry_at(&self, pos: Position) -> Option<(&[u8], &V)> {
        Some((self.key_at(pos)?, self.value_at(pos)?))
    }

    // -------------------------------------------------------------------------
    // Removal
    // -------------------------------------------------------------------------

    /// Removes the key at `pos` and returns its value. Trie nodes no other
    /// key runs through are released.
    ///
    /// `END` and stale positions remove nothing.
    pub fn erase(&mut self, pos: Position) -> Option<V> {
        if !self.is_live(pos) {
            return None;
        }
        let id = pos.id;
        let value = self.values[id.index()].take();
        let values = &mut self.values;
        self.nodes.unlink(id, |released| values[released.index()] = None);
        self.len -= 1;
        self.begin = self.nodes.leftmost();
        value
    }

    /// Removes every key from `first` up to, not including, `last`, and
    /// returns `last`.
    pub fn erase_range(&mut self, first: Position, last: Position) -> Position {
        let mut current = first;
        let mut removed = 0usize;
        while current != last && self.is_live(current) {
            let next = self.next_position(current);
            self.erase(current);
            removed += 1;
            current = next;
        }
        tracing::debug!(removed, "erased position range");
        last
    }

    /// Removes `key`, returning how many entries were removed (0 or 1).
    pub fn remove(&mut self, key: impl AsRef<[u8]>) -> usize {
        usize::from(self.remove_entry(key).is_some())
    }

    /// Removes `key` and returns its value.
    pub fn remove_entry(&mut self, key: impl AsRef<[u8]>) -> Option<V> {
        let pos = self.find(key);
        self.erase(pos)
    }

    /// Keeps only the entries for which `f` returns `true`.
    pub fn retain(&mut self, mut f: impl FnMut(&[u8], &mut V) -> bool) {
        let mut current = self.begin();
        while !current.is_end() {
            let next = self.next_position(current);
            let id = current.id;
            let keep = match self.values[id.index()].as_mut() {
                Some(value) => f(self.nodes.node(id).key(), value),
                None => true,
            };
            if !keep {
                self.erase(current);
            }
            current = next;
        }
    }

    /// Removes every key, leaving only the root.
    pub fn clear(&mut self) {
        tracing::debug!(len = self.len, nodes = self.nodes.live_count(), "clearing trie");
        self.nodes.reset();
        self.values.truncate(1);
        self.values[0] = None;
        self.len = 0;
        self.begin = NodeId::ROOT;
    }

    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    // -------------------------------------------------------------------------
    // Iteration
    // -------------------------------------------------------------------------

    pub fn iter(&self) -> Iter<'_, V> {
        Iter::new(self)
    }

    /// Entries in descending key order.
    pub fn iter_rev(&self) -> std::iter::Rev<Iter<'_, V>> {
        self.iter().rev()
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, V> {
        IterMut::new(self)
    }

    /// Mutable entries in descending key order.
    pub fn iter_mut_rev(&mut self) -> std::iter::Rev<IterMut<'_, V>> {
        self.iter_mut().rev()
    }

    pub fn keys(&self) -> Keys<'_, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, V> {
        Values { inner: self.iter() }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Cursor on the smallest key, or on `END` when empty.
    pub fn cursor_front(&self) -> Cursor<'_, V> {
        Cursor::new(self, self.begin())
    }

    /// Cursor on the largest key, or on `END` when empty.
    pub fn cursor_back(&self) -> Cursor<'_, V> {
        Cursor::new(self, self.rbegin())
    }

    /// Cursor on `pos`; stale positions start at `END`.
    pub fn cursor_at(&self, pos: Position) -> Cursor<'_, V> {
        let pos = if self.is_live(pos) { pos } else { Position::END };
        Cursor::new(self, pos)
    }

    pub fn cursor_front_mut(&mut self) -> CursorMut<'_, V> {
        let pos = self.begin();
        CursorMut::new(self, pos)
    }

    pub fn cursor_back_mut(&mut self) -> CursorMut<'_, V> {
        let pos = self.rbegin();
        CursorMut::new(self, pos)
    }

    pub fn cursor_at_mut(&mut self, pos: Position) -> CursorMut<'_, V> {
        let pos = if self.is_live(pos) { pos } else { Position::END };
        CursorMut::new(self, pos)
    }
}

impl<V: Clone> TrieMap<V> {
    /// Builds a map from the entries between two cursors of another map,
    /// `first` included and `last` excluded.
    pub fn from_range(first: Cursor<'_, V>, last: Cursor<'_, V>) -> Self {
        let mut map = Self::new();
        let mut cursor = first;
        let end = last.position();
        while cursor.position() != end {
            let Some((key, value)) = cursor.entry() else {
                break;
            };
            // Keys read back from a trie are always valid.
            if map.insert(key, value.clone()).is_err() {
                break;
            }
            cursor.move_next();
        }
        tracing::debug!(len = map.len(), "built trie from position range");
        map
    }
}

impl<V> Default for TrieMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Clone for TrieMap<V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            values: self.values.clone(),
            len: self.len,
            begin: self.begin,
            config: self.config,
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for TrieMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<V: PartialEq> PartialEq for TrieMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && algo::equal(self.iter(), other.iter())
    }
}

impl<V: Eq> Eq for TrieMap<V> {}

impl<K: AsRef<[u8]>, V> Extend<(K, V)> for TrieMap<V> {
    /// Inserts every pair; keys starting with the reserved byte are skipped
    /// with a warning. Use [`TrieMap::try_extend`] to fail instead.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            let key = key.as_ref();
            if let Err(err) = self.insert(key, value) {
                tracing::warn!(%err, "skipping key");
            }
        }
    }
}

impl<K: AsRef<[u8]>, V> FromIterator<(K, V)> for TrieMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        tracing::debug!(len = map.len(), "built trie from iterator");
        map
    }
}

impl<K: AsRef<[u8]>, V, const N: usize> From<[(K, V); N]> for TrieMap<V> {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<'a, V> IntoIterator for &'a TrieMap<V> {
    type Item = (&'a [u8], &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Iter<'a, V> {
        self.iter()
    }
}

impl<'a, V> IntoIterator for &'a mut TrieMap<V> {
    type Item = (&'a [u8], &'a mut V);
    type IntoIter = IterMut<'a, V>;

    fn into_iter(self) -> IterMut<'a, V> {
        self.iter_mut()
    }
}

impl<V> IntoIterator for TrieMap<V> {
    type Item = (Vec<u8>, V);
    type IntoIter = IntoIter<V>;

    fn into_iter(self) -> IntoIter<V> {
        IntoIter::new(self)
    }
}
