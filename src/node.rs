//! Trie nodes, the node arena and the navigation primitives.
//!
//! Every node stands for one byte position on the path from the root to a
//! stored key. Nodes live in a slot arena and are addressed by [`NodeId`];
//! the child table is the only owning relation, `parent` is a plain index
//! used for upward navigation.
//!
//! Slot 0 is the root. It is never a stored key and doubles as the end
//! sentinel. The empty key is stored in the root's child at byte `0x00`,
//! which is why non-empty keys may not start with that byte.
//!
//! Successor and predecessor are derived from the tree shape alone: no
//! sorted side index is kept, and every walk is iterative so stack use does
//! not depend on key length.

use smallvec::SmallVec;

/// Child slot of the root reserved for the empty key.
pub(crate) const EMPTY_KEY_BYTE: u8 = 0;

/// Index of a node slot in the arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct NodeId(u32);

impl NodeId {
    pub(crate) const ROOT: NodeId = NodeId(0);

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn is_root(self) -> bool {
        self == Self::ROOT
    }

    /// Id of arena slot `index`. Panics past `u32::MAX`.
    pub(crate) fn from_slot(index: usize) -> NodeId {
        match u32::try_from(index) {
            Ok(index) => NodeId(index),
            Err(_) => panic!("trie node arena exceeds {} slots", u32::MAX),
        }
    }
}

type Children = SmallVec<[(u8, NodeId); 4]>;

#[derive(Clone, Debug)]
pub(crate) struct Node {
    /// Owning edges, sorted by byte.
    children: Children,
    parent: NodeId,
    /// Byte consumed on the incoming edge.
    byte: u8,
    /// Stored keys whose path runs through or ends at this node.
    refs: usize,
    /// Inserting calls that terminated here since the key was stored.
    occurrences: usize,
    terminal: bool,
    /// Full key from the root to this node.
    key: Box<[u8]>,
}

impl Node {
    fn root() -> Self {
        Self {
            children: Children::new(),
            parent: NodeId::ROOT,
            byte: 0,
            refs: 0,
            occurrences: 0,
            terminal: false,
            key: Box::default(),
        }
    }

    fn child_of(parent: NodeId, byte: u8, key: Box<[u8]>) -> Self {
        Self {
            children: Children::new(),
            parent,
            byte,
            refs: 1,
            occurrences: 0,
            terminal: false,
            key,
        }
    }

    #[inline]
    pub(crate) fn key(&self) -> &[u8] {
        &self.key
    }

    #[cfg(test)]
    pub(crate) fn parent(&self) -> NodeId {
        self.parent
    }

    #[cfg(test)]
    pub(crate) fn byte(&self) -> u8 {
        self.byte
    }

    #[cfg(test)]
    pub(crate) fn refs(&self) -> usize {
        self.refs
    }

    #[cfg(test)]
    pub(crate) fn occurrences(&self) -> usize {
        self.occurrences
    }

    #[inline]
    pub(crate) fn is_terminal(&self) -> bool {
        self.terminal
    }

    #[cfg(test)]
    pub(crate) fn branch_count(&self) -> usize {
        self.children.len()
    }

    #[cfg(test)]
    pub(crate) fn children(&self) -> impl DoubleEndedIterator<Item = (u8, NodeId)> + '_ {
        self.children.iter().copied()
    }

    #[inline]
    fn child(&self, byte: u8) -> Option<NodeId> {
        self.children
            .binary_search_by_key(&byte, |&(b, _)| b)
            .ok()
            .map(|i| self.children[i].1)
    }

    #[inline]
    fn first_child(&self) -> Option<NodeId> {
        self.children.first().map(|&(_, id)| id)
    }

    #[inline]
    fn last_child(&self) -> Option<NodeId> {
        self.children.last().map(|&(_, id)| id)
    }

    /// Lowest-indexed child with a byte strictly greater than `byte`.
    #[inline]
    fn child_after(&self, byte: u8) -> Option<NodeId> {
        let i = self.children.partition_point(|&(b, _)| b <= byte);
        self.children.get(i).map(|&(_, id)| id)
    }

    /// Highest-indexed child with a byte strictly less than `byte`.
    #[inline]
    fn child_before(&self, byte: u8) -> Option<NodeId> {
        let i = self.children.partition_point(|&(b, _)| b < byte);
        i.checked_sub(1).map(|i| self.children[i].1)
    }

    fn attach(&mut self, byte: u8, id: NodeId) {
        match self.children.binary_search_by_key(&byte, |&(b, _)| b) {
            Ok(i) => self.children[i].1 = id,
            Err(i) => self.children.insert(i, (byte, id)),
        }
    }

    fn detach(&mut self, byte: u8) -> Option<NodeId> {
        let i = self
            .children
            .binary_search_by_key(&byte, |&(b, _)| b)
            .ok()?;
        Some(self.children.remove(i).1)
    }
}

// =============================================================================
// Node arena
// =============================================================================

/// Slot arena holding every node of one trie, with a free list for reuse.
#[derive(Clone, Debug)]
pub(crate) struct NodeTable {
    slots: Vec<Option<Node>>,
    /// Per-slot generation, bumped whenever a stored key leaves the slot.
    /// Outlives the slot contents so reuse never revives an old position.
    generations: Vec<u32>,
    free: Vec<NodeId>,
}

impl NodeTable {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity.max(1));
        slots.push(Some(Node::root()));
        Self {
            slots,
            generations: vec![0],
            free: Vec::new(),
        }
    }

    /// Drops every node but the root. Generations survive so positions taken
    /// before the reset stay stale.
    pub(crate) fn reset(&mut self) {
        self.slots.truncate(1);
        self.slots[0] = Some(Node::root());
        self.free.clear();
        for generation in &mut self.generations[1..] {
            *generation = generation.wrapping_add(1);
        }
    }

    #[inline]
    pub(crate) fn generation(&self, id: NodeId) -> u32 {
        self.generations.get(id.index()).copied().unwrap_or(0)
    }

    /// Number of slots ever allocated, live or free.
    #[inline]
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of live nodes, the root included.
    #[inline]
    pub(crate) fn live_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// The node in slot `id`, or `None` if the slot is free or out of range.
    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Panics if `id` does not refer to a live slot; ids handed around inside
    /// the crate always do.
    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        match self.get(id) {
            Some(node) => node,
            None => panic!("dangling node id {id:?}"),
        }
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match self.slots.get_mut(id.index()).and_then(Option::as_mut) {
            Some(node) => node,
            None => panic!("dangling node id {id:?}"),
        }
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.slots[id.index()] = Some(node);
            return id;
        }
        let id = NodeId::from_slot(self.slots.len());
        self.slots.push(Some(node));
        if self.generations.len() < self.slots.len() {
            self.generations.push(0);
        }
        id
    }

    /// Releases `id` and everything below it, calling `on_release` for each
    /// freed slot. The caller detaches `id` from its parent first.
    fn release_subtree(&mut self, id: NodeId, on_release: &mut impl FnMut(NodeId)) -> usize {
        let mut released = 0;
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.slots[id.index()].take() {
                stack.extend(node.children.iter().map(|&(_, child)| child));
                self.free.push(id);
                on_release(id);
                released += 1;
            }
        }
        released
    }

    // -------------------------------------------------------------------------
    // Path operations
    // -------------------------------------------------------------------------

    /// Follows the exact byte path for `key` from the root.
    ///
    /// The empty key resolves to the reserved child; keys starting with the
    /// reserved byte never resolve.
    pub(crate) fn walk(&self, key: &[u8]) -> Option<NodeId> {
        let root = self.node(NodeId::ROOT);
        let Some((&first, rest)) = key.split_first() else {
            return root.child(EMPTY_KEY_BYTE);
        };
        if first == EMPTY_KEY_BYTE {
            return None;
        }
        let mut current = root.child(first)?;
        for &byte in rest {
            current = self.node(current).child(byte)?;
        }
        Some(current)
    }

    /// Terminal node stored for `key`.
    pub(crate) fn find(&self, key: &[u8]) -> Option<NodeId> {
        self.walk(key).filter(|&id| self.node(id).terminal)
    }

    /// Occurrence count at the node for `key`, 0 when the path is absent.
    pub(crate) fn count(&self, key: &[u8]) -> usize {
        self.walk(key)
            .map_or(0, |id| self.node(id).occurrences)
    }

    pub(crate) fn bump_occurrences(&mut self, id: NodeId) {
        self.node_mut(id).occurrences += 1;
    }

    /// Lays down the path for `key`, creating missing nodes, and marks the
    /// last node terminal. Every node on the path gains one reference.
    ///
    /// `key` must be valid and not currently stored.
    pub(crate) fn add(&mut self, key: &[u8]) -> NodeId {
        if key.is_empty() {
            return self.add_empty_key();
        }
        debug_assert_ne!(key[0], EMPTY_KEY_BYTE);

        let mut current = NodeId::ROOT;
        let mut created = 0usize;
        for (depth, &byte) in key.iter().enumerate() {
            current = match self.node(current).child(byte) {
                Some(child) => {
                    self.node_mut(child).refs += 1;
                    child
                }
                None => {
                    let node = Node::child_of(current, byte, Box::from(&key[..=depth]));
                    let child = self.alloc(node);
                    self.node_mut(current).attach(byte, child);
                    created += 1;
                    child
                }
            };
        }
        tracing::trace!(key_len = key.len(), created, "added trie path");
        self.mark_terminal(current);
        current
    }

    fn add_empty_key(&mut self) -> NodeId {
        let id = match self.node(NodeId::ROOT).child(EMPTY_KEY_BYTE) {
            Some(id) => {
                self.node_mut(id).refs += 1;
                id
            }
            None => {
                let id = self.alloc(Node::child_of(NodeId::ROOT, EMPTY_KEY_BYTE, Box::default()));
                self.node_mut(NodeId::ROOT).attach(EMPTY_KEY_BYTE, id);
                id
            }
        };
        self.mark_terminal(id);
        id
    }

    fn mark_terminal(&mut self, id: NodeId) {
        let node = self.node_mut(id);
        debug_assert!(!node.terminal);
        node.terminal = true;
        node.occurrences = 1;
    }

    /// Unmarks the terminal node `id` and drops its references on the way up
    /// to the root, releasing every node no stored key runs through anymore.
    /// Returns the number of released nodes.
    pub(crate) fn unlink(&mut self, id: NodeId, mut on_release: impl FnMut(NodeId)) -> usize {
        {
            let node = self.node_mut(id);
            debug_assert!(node.terminal);
            node.terminal = false;
            node.occurrences = 0;
        }
        self.generations[id.index()] = self.generations[id.index()].wrapping_add(1);

        let mut released = 0;
        let mut current = id;
        while !current.is_root() {
            let (parent, byte, refs) = {
                let node = self.node_mut(current);
                node.refs -= 1;
                (node.parent, node.byte, node.refs)
            };
            if refs == 0 {
                self.node_mut(parent).detach(byte);
                released += self.release_subtree(current, &mut on_release);
            }
            current = parent;
        }
        tracing::trace!(released, "compacted trie path");
        released
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// Smallest stored key at or below `id`: `id` itself if terminal,
    /// otherwise the lowest child's smallest key. Yields the root when the
    /// trie is empty.
    pub(crate) fn next_tail(&self, mut id: NodeId) -> NodeId {
        loop {
            let node = self.node(id);
            if node.terminal {
                return id;
            }
            match node.first_child() {
                Some(child) => id = child,
                None => return id,
            }
        }
    }

    /// Successor of the subtree at `id` once it is exhausted: the nearest
    /// greater sibling of `id` or of one of its ancestors. Yields the root
    /// past the last key.
    pub(crate) fn next_branch(&self, mut id: NodeId) -> NodeId {
        while !id.is_root() {
            let node = self.node(id);
            let parent = node.parent;
            if let Some(sibling) = self.node(parent).child_after(node.byte) {
                return self.next_tail(sibling);
            }
            id = parent;
        }
        NodeId::ROOT
    }

    /// Largest stored key at or below `id`. Leaves are always terminal.
    pub(crate) fn prev_tail(&self, mut id: NodeId) -> NodeId {
        while let Some(child) = self.node(id).last_child() {
            id = child;
        }
        id
    }

    /// Predecessor of `id`: the largest key in the nearest smaller sibling
    /// subtree, or the nearest terminal ancestor. Yields the root before the
    /// first key.
    pub(crate) fn prev_branch(&self, mut id: NodeId) -> NodeId {
        while !id.is_root() {
            let node = self.node(id);
            let parent = node.parent;
            if let Some(sibling) = self.node(parent).child_before(node.byte) {
                return self.prev_tail(sibling);
            }
            if self.node(parent).terminal {
                return parent;
            }
            id = parent;
        }
        NodeId::ROOT
    }

    /// Next stored key after `id` in key order. The root has no successor
    /// and maps to itself.
    pub(crate) fn successor(&self, id: NodeId) -> NodeId {
        if id.is_root() {
            return id;
        }
        match self.node(id).first_child() {
            Some(child) => self.next_tail(child),
            None => self.next_branch(id),
        }
    }

    /// Previous stored key before `id`; from the root this is the last key.
    pub(crate) fn predecessor(&self, id: NodeId) -> NodeId {
        if id.is_root() {
            return self.rightmost();
        }
        self.prev_branch(id)
    }

    /// Smallest stored key, or the root when empty.
    pub(crate) fn leftmost(&self) -> NodeId {
        self.next_tail(NodeId::ROOT)
    }

    /// Largest stored key, or the root when empty.
    pub(crate) fn rightmost(&self) -> NodeId {
        self.prev_tail(NodeId::ROOT)
    }
}
