//! Construction-time settings for a trie map.

/// Configuration for a [`TrieMap`](crate::TrieMap).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieConfig {
    /// Number of node slots reserved up front in the node arena (the root
    /// and empty-key slots included)
    pub node_capacity: usize,
}

impl Default for TrieConfig {
    fn default() -> Self {
        Self { node_capacity: 64 }
    }
}

impl TrieConfig {
    /// Configuration with room for `node_capacity` nodes before reallocating.
    pub fn with_node_capacity(node_capacity: usize) -> Self {
        Self { node_capacity }
    }
}
