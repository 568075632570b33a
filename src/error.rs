//! Error types for trie-map

use thiserror::Error;

/// Result type alias using [`TrieError`]
pub type Result<T> = std::result::Result<T, TrieError>;

/// Errors reported by inserting operations.
///
/// Lookups never fail: an absent key is reported as the end position, `None`
/// or a zero count.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrieError {
    /// Byte `0x00` at the root is reserved for the empty key, so a non-empty
    /// key must not start with it.
    #[error("key of length {key_len} starts with reserved byte 0x00")]
    ReservedLeadingByte {
        /// Length of the rejected key
        key_len: usize,
    },
}

impl TrieError {
    /// Create a reserved-leading-byte error for `key`
    pub fn reserved_leading_byte(key: &[u8]) -> Self {
        TrieError::ReservedLeadingByte { key_len: key.len() }
    }
}

/// Checks that `key` is representable.
pub(crate) fn validate_key(key: &[u8]) -> Result<()> {
    match key.first() {
        Some(0) => Err(TrieError::reserved_leading_byte(key)),
        _ => Ok(()),
    }
}
