//! Integration test: small fixed-layout rings.
//!
//! Positions and key hashes are fully determined, so these pin down exactly
//! which node owns which key before and after membership changes.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use ringstore_integration_tests::TestCluster;
use ringstore_placement::ErrorKind;
use ringstore_store::StorageNode;

/// Keys and the position each hashes to on a ring of four positions.
const KEYS: [(&str, u32); 8] = [
    ("keyOne", 1),
    ("keyTwo", 0),
    ("keyThree", 0),
    ("keyFour", 2),
    ("keyFive", 1),
    ("keySix", 1),
    ("keySeven", 0),
    ("keyEight", 3),
];

fn write_all(c: &TestCluster) {
    for (i, (k, _)) in KEYS.iter().enumerate() {
        c.ring().put(k.to_string(), i as u64).unwrap();
    }
}

fn held_by(c: &TestCluster, i: usize) -> Vec<&'static str> {
    let mut held: Vec<&str> = KEYS
        .iter()
        .map(|(k, _)| *k)
        .filter(|k| c.node(i).get(&k.to_string()).is_some())
        .collect();
    held.sort_unstable();
    held
}

#[test]
fn test_key_positions_on_small_ring() {
    let c = TestCluster::with_positions(4, &[]);
    for (k, pos) in KEYS {
        assert_eq!(c.ring().key_position(&k.to_string()).unwrap(), pos, "{k}");
    }
}

/// A at 0 holds everything. B joins at 2 and takes the keys strictly closer
/// to it. Removing B hands its keys back to A.
#[test]
fn test_join_then_leave() {
    let mut c = TestCluster::with_positions(4, &[0, 2]);
    c.add_node().unwrap();
    write_all(&c);
    assert_eq!(c.node(0).len(), 8);

    c.add_node().unwrap();
    assert_eq!(c.ring().size(), 2);
    assert_eq!(
        held_by(&c, 0),
        vec!["keyEight", "keySeven", "keyThree", "keyTwo"]
    );
    assert_eq!(held_by(&c, 1), vec!["keyFive", "keyFour", "keyOne", "keySix"]);

    c.remove_node(1).unwrap();
    assert_eq!(c.ring().size(), 1);
    assert_eq!(c.node(0).len(), 8);
    // The departed node keeps its copy.
    assert_eq!(c.node(1).len(), 4);

    for (i, (k, _)) in KEYS.iter().enumerate() {
        assert_eq!(c.ring().get(&k.to_string()).unwrap(), Some(i as u64));
    }
}

/// Source yields 0, 0, 2: the second joiner probes from 0 to 1 and the
/// third value is never drawn.
#[test]
fn test_collision_probes_without_redrawing() {
    let source = Arc::new(Mutex::new(VecDeque::from([0u32, 0, 2])));
    let s = source.clone();
    let mut c = TestCluster::with_source(4, move || s.lock().unwrap().pop_front().unwrap());

    c.add_node().unwrap();
    c.add_node().unwrap();

    assert_eq!(
        c.ring().placements(),
        vec![("node-0".to_string(), 0), ("node-1".to_string(), 1)]
    );
    assert_eq!(source.lock().unwrap().len(), 1);
}

/// Four positions hold at most three members.
#[test]
fn test_full_ring_rejects_joiner() {
    let mut c = TestCluster::with_positions(4, &[0, 1, 2, 3]);
    for _ in 0..3 {
        c.add_node().unwrap();
    }
    write_all(&c);

    let err = c.add_node().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
    assert_eq!(c.ring().size(), 3);
    assert_eq!(c.members(), vec![0, 1, 2]);
    assert_eq!(c.stored(), 8);
}

/// Joining at position 3 on a ring with a member at 0 takes every key
/// hashing to 1, 2 or 3; only keys at 0 stay put.
#[test]
fn test_joiner_before_wrap() {
    let mut c = TestCluster::with_positions(4, &[0, 3]);
    c.add_node().unwrap();
    write_all(&c);
    c.add_node().unwrap();

    assert_eq!(
        held_by(&c, 1),
        vec!["keyEight", "keyFive", "keyFour", "keyOne", "keySix"]
    );
    assert_eq!(held_by(&c, 0), vec!["keySeven", "keyThree", "keyTwo"]);
    assert_eq!(
        c.ring().owner_of(&"keyEight".to_string()).unwrap().as_deref(),
        Some("node-1")
    );
}
