use crate::{algo, TrieMap};
use crate::node::{NodeId, EMPTY_KEY_BYTE};

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::{BTreeMap, BTreeSet};

fn validate_trie<V>(t: &TrieMap<V>) {
    let nodes = &t.nodes;
    let root = nodes.node(NodeId::ROOT);
    assert!(!root.is_terminal(), "root must never be a stored key");
    assert!(t.values[0].is_none(), "root must not carry a value");

    let mut stack = vec![NodeId::ROOT];
    let mut reachable = 0usize;
    let mut terminals = 0usize;
    while let Some(id) = stack.pop() {
        reachable += 1;
        let node = nodes.node(id);

        assert_eq!(
            node.is_terminal(),
            t.values[id.index()].is_some(),
            "terminal nodes and only they carry values"
        );
        if node.is_terminal() {
            terminals += 1;
            assert!(node.occurrences() >= 1, "stored key with zero count");
        } else {
            assert_eq!(node.occurrences(), 0, "non-terminal node with a count");
        }

        let mut child_refs = 0usize;
        let mut prev: Option<u8> = None;
        for (byte, child_id) in node.children() {
            assert!(prev.map_or(true, |p| p < byte), "children must be sorted");
            prev = Some(byte);

            let child = nodes.node(child_id);
            assert_eq!(child.parent(), id, "parent link mismatch");
            assert_eq!(child.byte(), byte, "edge byte mismatch");
            if id.is_root() && byte == EMPTY_KEY_BYTE {
                assert!(child.key().is_empty(), "reserved slot must hold the empty key");
                assert_eq!(child.branch_count(), 0, "empty key node must be a leaf");
            } else {
                let mut expected = node.key().to_vec();
                expected.push(byte);
                assert_eq!(child.key(), &expected[..], "key cache mismatch");
            }
            child_refs += child.refs();
            stack.push(child_id);
        }

        if !id.is_root() {
            assert_eq!(
                node.refs(),
                child_refs + usize::from(node.is_terminal()),
                "refs must count the keys running through the node"
            );
            assert!(node.refs() > 0, "unreferenced node was not compacted");
        }
    }

    assert_eq!(terminals, t.len(), "terminal count must match TrieMap::len");
    assert_eq!(reachable, nodes.live_count(), "unreachable live nodes");
    assert_eq!(
        t.values.iter().filter(|v| v.is_some()).count(),
        t.len(),
        "values left behind in released slots"
    );
    assert_eq!(t.begin, nodes.leftmost(), "stale begin cache");
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> + Clone {
    // Small alphabet so keys share prefixes; 0x00 shows up both inside keys
    // and in the reserved leading position.
    prop::collection::vec(
        prop::sample::select(vec![0x00u8, b'a', b'b', b'c', 0xff]),
        0..=6,
    )
}

fn is_reserved(key: &[u8]) -> bool {
    key.first() == Some(&0)
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 40)]
    Insert(#[proptest(strategy = "key_strategy()")] Vec<u8>, u64),
    #[proptest(weight = 10)]
    Index(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 25)]
    Remove(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 20)]
    Get(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 5)]
    EraseFirst,
}

/// Model entry: value and number of inserting calls.
type Model = BTreeMap<Vec<u8>, (u64, usize)>;

fn apply(t: &mut TrieMap<u64>, m: &mut Model, op: Op) -> std::result::Result<(), TestCaseError> {
    match op {
        Op::Insert(key, value) => {
            let got = t.insert(&key, value);
            if is_reserved(&key) {
                prop_assert!(got.is_err());
                return Ok(());
            }
            let (pos, inserted) = got.map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(inserted, !m.contains_key(&key));
            let entry = m.entry(key.clone()).or_insert((value, 0));
            entry.1 += 1;
            prop_assert_eq!(t.key_at(pos), Some(&key[..]));
            prop_assert_eq!(t.count(&key), entry.1);
        }
        Op::Index(key) => {
            let got = t.get_or_insert_default(&key).map(|v| {
                *v = v.wrapping_add(1);
                *v
            });
            if is_reserved(&key) {
                prop_assert!(got.is_err());
                return Ok(());
            }
            let entry = m.entry(key).or_insert((0, 0));
            entry.0 = entry.0.wrapping_add(1);
            entry.1 += 1;
            prop_assert_eq!(got.ok(), Some(entry.0));
        }
        Op::Remove(key) => {
            prop_assert_eq!(t.remove_entry(&key), m.remove(&key).map(|(v, _)| v));
            prop_assert!(t.find(&key).is_end());
            prop_assert_eq!(t.count(&key), 0);
        }
        Op::Get(key) => {
            prop_assert_eq!(t.get(&key).copied(), m.get(&key).map(|&(v, _)| v));
            prop_assert_eq!(t.count(&key), m.get(&key).map_or(0, |&(_, c)| c));
        }
        Op::EraseFirst => {
            let begin = t.begin();
            let expected = m.pop_first().map(|(_, (v, _))| v);
            prop_assert_eq!(t.erase(begin), expected);
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in prop::collection::vec(any::<Op>(), 0..=600)) {
        let mut t: TrieMap<u64> = TrieMap::new();
        let mut m = Model::new();

        for op in ops {
            apply(&mut t, &mut m, op)?;
            prop_assert_eq!(t.len(), m.len());
        }

        validate_trie(&t);
        let got: Vec<(Vec<u8>, u64)> = t.iter().map(|(k, v)| (k.to_vec(), *v)).collect();
        let expected: Vec<(Vec<u8>, u64)> = m.iter().map(|(k, &(v, _))| (k.clone(), v)).collect();
        prop_assert_eq!(&got, &expected);

        let got_rev: Vec<(Vec<u8>, u64)> = t.iter_rev().map(|(k, v)| (k.to_vec(), *v)).collect();
        let mut expected_rev = expected;
        expected_rev.reverse();
        prop_assert_eq!(got_rev, expected_rev);

        for (key, &(_, count)) in &m {
            prop_assert_eq!(t.count(key), count);
        }
    }

    #[test]
    fn prop_round_trip(keys in prop::collection::btree_set(key_strategy(), 0..=40)) {
        let keys: BTreeSet<Vec<u8>> = keys.into_iter().filter(|k| !is_reserved(k)).collect();
        let mut t: TrieMap<usize> = TrieMap::new();
        // Insert in descending order so ordering comes from the trie alone.
        for (i, key) in keys.iter().enumerate().rev() {
            let (_, inserted) = t.insert(key, i).map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert!(inserted);
        }
        validate_trie(&t);

        let got: Vec<(Vec<u8>, usize)> = t.iter().map(|(k, v)| (k.to_vec(), *v)).collect();
        let expected: Vec<(Vec<u8>, usize)> = keys.iter().cloned().enumerate().map(|(i, k)| (k, i)).collect();
        prop_assert_eq!(got, expected);

        for key in &keys {
            prop_assert_eq!(t.remove(key), 1);
            validate_trie(&t);
        }
        prop_assert!(t.is_empty());
        prop_assert_eq!(t.node_count(), 1);
        prop_assert_eq!(t, TrieMap::new());
    }

    #[test]
    fn prop_positions_walk_both_ways(keys in prop::collection::btree_set(key_strategy(), 0..=40)) {
        let t: TrieMap<()> = keys.iter().map(|k| (k, ())).collect();

        let mut forward = Vec::new();
        let mut pos = t.begin();
        while pos != t.end() {
            forward.push(t.key_at(pos).map(<[u8]>::to_vec));
            pos = t.next_position(pos);
        }

        let mut backward = Vec::new();
        let mut pos = t.rbegin();
        while pos != t.rend() {
            backward.push(t.key_at(pos).map(<[u8]>::to_vec));
            pos = t.prev_position(pos);
        }
        backward.reverse();

        prop_assert_eq!(forward.len(), t.len());
        prop_assert_eq!(forward, backward);
    }
}

/// Visits every ordering of `keys` with Heap's algorithm, swapping in place.
fn visit_orderings(keys: &[Vec<u8>], mut visit: impl FnMut(&[Vec<u8>])) {
    let mut order = keys.to_vec();
    let mut counters = vec![0usize; order.len()];
    visit(&order);
    let mut level = 1;
    while level < order.len() {
        if counters[level] < level {
            let other = if level % 2 == 0 { 0 } else { counters[level] };
            order.swap(other, level);
            visit(&order);
            counters[level] += 1;
            level = 1;
        } else {
            counters[level] = 0;
            level += 1;
        }
    }
}

fn small_keys() -> Vec<Vec<u8>> {
    vec![
        b"".to_vec(),
        b"a".to_vec(),
        b"b".to_vec(),
        b"aa".to_vec(),
        b"ab".to_vec(),
        b"aab".to_vec(),
    ]
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys = small_keys();

    let mut seen = BTreeSet::new();
    visit_orderings(&keys, |order| {
        assert!(seen.insert(order.to_vec()), "ordering visited twice");
        let mut t: TrieMap<u64> = TrieMap::new();
        let mut m: BTreeMap<Vec<u8>, u64> = BTreeMap::new();

        for (i, k) in order.iter().enumerate() {
            let v = i as u64;
            t.insert(k, v).unwrap();
            m.insert(k.clone(), v);
        }

        validate_trie(&t);
        let got: Vec<(Vec<u8>, u64)> = t.iter().map(|(k, v)| (k.to_vec(), *v)).collect();
        let expected: Vec<(Vec<u8>, u64)> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
        assert_eq!(got, expected);
    });
    assert_eq!(seen.len(), 720);
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys = small_keys();

    // Insert in a fixed order, then remove in all permutations.
    let mut base_trie: TrieMap<u64> = TrieMap::new();
    let mut base_map: BTreeMap<Vec<u8>, u64> = BTreeMap::new();
    for (i, k) in keys.iter().enumerate() {
        let v = i as u64;
        base_trie.insert(k, v).unwrap();
        base_map.insert(k.clone(), v);
    }

    visit_orderings(&keys, |order| {
        let mut t = base_trie.clone();
        let mut m = base_map.clone();

        for k in order {
            assert_eq!(t.remove_entry(k), m.remove(k.as_slice()));
            assert_eq!(t.len(), m.len());
            validate_trie(&t);
            assert!(algo::equal(t.iter(), m.iter()));
        }
        assert_eq!(t.len(), 0);
        assert_eq!(t.node_count(), 1);
        assert!(t.begin().is_end());
    });
}
