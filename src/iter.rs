//! Positions, cursors and iterators over a [`TrieMap`].
//!
//! All of them step through the trie with the successor/predecessor walks in
//! [`crate::node`]; nothing here keeps per-node traversal state, so shared
//! iteration never writes to the trie.

use std::iter::FusedIterator;
use std::marker::PhantomData;

use crate::map::TrieMap;
use crate::node::{NodeId, NodeTable};

/// A location in a [`TrieMap`]: a stored key or the end sentinel.
///
/// Positions compare by node identity and slot generation. A position stays
/// valid until its key is erased or the map is cleared; after that it is
/// treated as absent by every accessor, even once the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Position {
    pub(crate) id: NodeId,
    pub(crate) generation: u32,
}

impl Position {
    /// The past-the-end position, shared by every map.
    pub const END: Position = Position {
        id: NodeId::ROOT,
        generation: 0,
    };

    #[inline]
    pub fn is_end(self) -> bool {
        self.id.is_root()
    }
}

// =============================================================================
// Cursors
// =============================================================================

/// A read-only cursor over a [`TrieMap`].
///
/// The cursor rests either on a key or on the end sentinel, which sits
/// between the last and the first key: moving forward from the end wraps to
/// the first key and moving backward from it goes to the last one.
#[derive(Debug)]
pub struct Cursor<'a, V> {
    map: &'a TrieMap<V>,
    pos: Position,
}

impl<V> Clone for Cursor<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Cursor<'_, V> {}

impl<V> PartialEq for Cursor<'_, V> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.map, other.map) && self.pos == other.pos
    }
}

impl<V> Eq for Cursor<'_, V> {}

impl<'a, V> Cursor<'a, V> {
    pub(crate) fn new(map: &'a TrieMap<V>, pos: Position) -> Self {
        Self { map, pos }
    }

    #[inline]
    pub fn position(&self) -> Position {
        self.pos
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.pos.is_end()
    }

    pub fn key(&self) -> Option<&'a [u8]> {
        self.map.key_at(self.pos)
    }

    pub fn value(&self) -> Option<&'a V> {
        self.map.value_at(self.pos)
    }

    pub fn entry(&self) -> Option<(&'a [u8], &'a V)> {
        self.map.entry_at(self.pos)
    }

    pub fn move_next(&mut self) {
        self.pos = if self.pos.is_end() {
            self.map.begin()
        } else {
            self.map.next_position(self.pos)
        };
    }

    pub fn move_prev(&mut self) {
        self.pos = self.map.prev_position(self.pos);
    }
}

/// A cursor over a [`TrieMap`] that can update values and remove entries.
#[derive(Debug)]
pub struct CursorMut<'a, V> {
    map: &'a mut TrieMap<V>,
    pos: Position,
}

impl<'a, V> CursorMut<'a, V> {
    pub(crate) fn new(map: &'a mut TrieMap<V>, pos: Position) -> Self {
        Self { map, pos }
    }

    #[inline]
    pub fn position(&self) -> Position {
        self.pos
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.pos.is_end()
    }

    pub fn key(&self) -> Option<&[u8]> {
        self.map.key_at(self.pos)
    }

    pub fn value(&self) -> Option<&V> {
        self.map.value_at(self.pos)
    }

    pub fn value_mut(&mut self) -> Option<&mut V> {
        self.map.value_at_mut(self.pos)
    }

    pub fn move_next(&mut self) {
        self.pos = if self.pos.is_end() {
            self.map.begin()
        } else {
            self.map.next_position(self.pos)
        };
    }

    pub fn move_prev(&mut self) {
        self.pos = self.map.prev_position(self.pos);
    }

    /// Removes the current entry and moves to the next key. Does nothing on
    /// the end sentinel.
    pub fn remove_current(&mut self) -> Option<(Vec<u8>, V)> {
        let key = self.map.key_at(self.pos)?.to_vec();
        let next = self.map.next_position(self.pos);
        let value = self.map.erase(self.pos)?;
        // Erase only releases non-terminal nodes, so `next` is still live.
        self.pos = next;
        Some((key, value))
    }

    /// Read-only view of the same position.
    pub fn as_cursor(&self) -> Cursor<'_, V> {
        Cursor::new(self.map, self.pos)
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// Entries of a [`TrieMap`] in key order, created by [`TrieMap::iter`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, V> {
    nodes: &'a NodeTable,
    values: &'a [Option<V>],
    front: NodeId,
    back: NodeId,
    remaining: usize,
}

impl<'a, V> Iter<'a, V> {
    pub(crate) fn new(map: &'a TrieMap<V>) -> Self {
        Self {
            nodes: &map.nodes,
            values: &map.values,
            front: map.begin,
            back: map.nodes.rightmost(),
            remaining: map.len,
        }
    }

    fn entry(&self, id: NodeId) -> Option<(&'a [u8], &'a V)> {
        let nodes: &'a NodeTable = self.nodes;
        let values: &'a [Option<V>] = self.values;
        Some((nodes.node(id).key(), values[id.index()].as_ref()?))
    }
}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            values: self.values,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a [u8], &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front;
        self.front = self.nodes.successor(id);
        self.remaining -= 1;
        self.entry(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> DoubleEndedIterator for Iter<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back;
        self.back = self.nodes.predecessor(id);
        self.remaining -= 1;
        self.entry(id)
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<V> FusedIterator for Iter<'_, V> {}

/// Mutable entries of a [`TrieMap`] in key order, created by
/// [`TrieMap::iter_mut`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct IterMut<'a, V> {
    nodes: &'a NodeTable,
    values: *mut Option<V>,
    front: NodeId,
    back: NodeId,
    remaining: usize,
    _marker: PhantomData<&'a mut V>,
}

// SAFETY: IterMut behaves as a shared borrow of the node table plus a unique
// borrow of the value slots.
unsafe impl<V: Send> Send for IterMut<'_, V> {}
unsafe impl<V: Sync> Sync for IterMut<'_, V> {}

impl<'a, V> IterMut<'a, V> {
    pub(crate) fn new(map: &'a mut TrieMap<V>) -> Self {
        let back = map.nodes.rightmost();
        Self {
            nodes: &map.nodes,
            values: map.values.as_mut_ptr(),
            front: map.begin,
            back,
            remaining: map.len,
            _marker: PhantomData,
        }
    }

    fn entry(&mut self, id: NodeId) -> Option<(&'a [u8], &'a mut V)> {
        let nodes: &'a NodeTable = self.nodes;
        // SAFETY: `id` is a live slot below `values.len()`, and the front and
        // back walks never yield the same node twice because `remaining`
        // stops them where they meet. Navigation reads only the node table,
        // so no other reference into the value slots exists.
        let value = unsafe { (*self.values.add(id.index())).as_mut()? };
        Some((nodes.node(id).key(), value))
    }
}

impl<'a, V> Iterator for IterMut<'a, V> {
    type Item = (&'a [u8], &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front;
        self.front = self.nodes.successor(id);
        self.remaining -= 1;
        self.entry(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> DoubleEndedIterator for IterMut<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back;
        self.back = self.nodes.predecessor(id);
        self.remaining -= 1;
        self.entry(id)
    }
}

impl<V> ExactSizeIterator for IterMut<'_, V> {}

impl<V> FusedIterator for IterMut<'_, V> {}

/// Owned entries of a [`TrieMap`] in key order.
pub struct IntoIter<V> {
    map: TrieMap<V>,
    front: NodeId,
    back: NodeId,
    remaining: usize,
}

impl<V> IntoIter<V> {
    pub(crate) fn new(map: TrieMap<V>) -> Self {
        Self {
            front: map.begin,
            back: map.nodes.rightmost(),
            remaining: map.len,
            map,
        }
    }

    fn take(&mut self, id: NodeId) -> Option<(Vec<u8>, V)> {
        let value = self.map.values[id.index()].take()?;
        Some((self.map.nodes.node(id).key().to_vec(), value))
    }
}

impl<V> Iterator for IntoIter<V> {
    type Item = (Vec<u8>, V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front;
        self.front = self.map.nodes.successor(id);
        self.remaining -= 1;
        self.take(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> DoubleEndedIterator for IntoIter<V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back;
        self.back = self.map.nodes.predecessor(id);
        self.remaining -= 1;
        self.take(id)
    }
}

impl<V> ExactSizeIterator for IntoIter<V> {}

impl<V> FusedIterator for IntoIter<V> {}

/// Keys of a [`TrieMap`] in order.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Keys<'a, V> {
    pub(crate) inner: Iter<'a, V>,
}

impl<'a, V> Iterator for Keys<'a, V> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> DoubleEndedIterator for Keys<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<V> ExactSizeIterator for Keys<'_, V> {}

/// Values of a [`TrieMap`] in key order.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Values<'a, V> {
    pub(crate) inner: Iter<'a, V>,
}

impl<'a, V> Iterator for Values<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> DoubleEndedIterator for Values<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<V> ExactSizeIterator for Values<'_, V> {}

/// Mutable values of a [`TrieMap`] in key order.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct ValuesMut<'a, V> {
    pub(crate) inner: IterMut<'a, V>,
}

impl<'a, V> Iterator for ValuesMut<'a, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<&'a mut V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> DoubleEndedIterator for ValuesMut<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<V> ExactSizeIterator for ValuesMut<'_, V> {}
