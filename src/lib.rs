//! # trie-map
//!
//! An ordered map keyed by byte strings, stored as a 256-ary trie.
//!
//! Each trie node consumes one key byte, so lookup, insertion and erase cost
//! is proportional to the key length. Iteration walks the tree shape directly
//! and yields keys in lexicographic byte order, forwards or backwards.
//! Erasing a key releases every node no other stored key still runs through.
//!
//! ## Example
//!
//! ```rust
//! use trie_map::TrieMap;
//!
//! let mut map: TrieMap<u64> = TrieMap::new();
//! map.insert("cat", 1)?;
//! map.insert("car", 2)?;
//! map.insert("card", 3)?;
//!
//! let keys: Vec<&[u8]> = map.keys().collect();
//! assert_eq!(keys, vec![&b"car"[..], &b"card"[..], &b"cat"[..]]);
//!
//! map.remove("car");
//! assert!(map.find("car").is_end());
//! assert_eq!(map.get("card"), Some(&3));
//! # Ok::<(), trie_map::TrieError>(())
//! ```
//!
//! ## Key domain
//!
//! Keys are arbitrary byte sequences, including the empty key. The root's
//! `0x00` branch is reserved for the empty key, so inserting a non-empty key
//! that starts with `0x00` fails with [`TrieError::ReservedLeadingByte`].
//!
//! ## Positions and cursors
//!
//! [`TrieMap::find`] returns a [`Position`], with [`Position::END`] standing
//! for "not found". Positions can be stepped with
//! [`TrieMap::next_position`]/[`TrieMap::prev_position`], erased with
//! [`TrieMap::erase`], or wrapped in a [`Cursor`]/[`CursorMut`]. A position
//! whose key was erased reads as absent, even after a later insert reuses
//! its node.

#![deny(unsafe_op_in_unsafe_fn)]

pub mod algo;
mod config;
mod error;
mod iter;
mod map;
mod node;

pub use config::TrieConfig;
pub use error::{Result, TrieError};
pub use iter::{Cursor, CursorMut, IntoIter, Iter, IterMut, Keys, Position, Values, ValuesMut};
pub use map::TrieMap;

#[cfg(test)]
mod proptests;
