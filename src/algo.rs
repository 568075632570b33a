//! Generic helpers over entry sequences and cursor ranges.

use crate::iter::{Cursor, Position};

/// Whether two entry sequences hold the same keys and values in the same
/// order. Sequences of different length are never equal.
///
/// Works across containers, e.g. a [`TrieMap`](crate::TrieMap) against a
/// `BTreeMap<Vec<u8>, V>`:
///
/// ```
/// use std::collections::BTreeMap;
/// use trie_map::{algo, TrieMap};
///
/// let trie = TrieMap::from([("b", 2), ("a", 1)]);
/// let tree = BTreeMap::from([(b"a".to_vec(), 1), (b"b".to_vec(), 2)]);
/// assert!(algo::equal(trie.iter(), tree.iter()));
/// ```
pub fn equal<A, B, KA, KB, VA, VB>(a: A, b: B) -> bool
where
    A: IntoIterator<Item = (KA, VA)>,
    B: IntoIterator<Item = (KB, VB)>,
    KA: AsRef<[u8]>,
    KB: AsRef<[u8]>,
    VA: PartialEq<VB>,
{
    let mut a = a.into_iter();
    let mut b = b.into_iter();
    loop {
        match (a.next(), b.next()) {
            (None, None) => return true,
            (Some((ka, va)), Some((kb, vb))) => {
                if ka.as_ref() != kb.as_ref() || va != vb {
                    return false;
                }
            }
            _ => return false,
        }
    }
}

/// Scans from `first` up to, not including, `last` for an entry with exactly
/// this key and value. Returns its position, or `last` when there is none.
pub fn find_pair<V: PartialEq>(
    first: Cursor<'_, V>,
    last: Position,
    key: impl AsRef<[u8]>,
    value: &V,
) -> Position {
    let key = key.as_ref();
    let mut cursor = first;
    while cursor.position() != last {
        let Some((k, v)) = cursor.entry() else {
            // Reached the end sentinel without meeting `last`.
            break;
        };
        if k == key && v == value {
            return cursor.position();
        }
        cursor.move_next();
    }
    last
}
