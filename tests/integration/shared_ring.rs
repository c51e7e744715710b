//! Integration test: the ring shared across threads.

use std::sync::Arc;
use std::thread;

use ringstore_placement::{HashRing, RandomPositions, SharedHashRing};
use ringstore_store::MemoryNode;

type Node = Arc<MemoryNode<String, u64>>;

fn node(id: &str) -> Node {
    Arc::new(MemoryNode::with_id(id))
}

/// Writers on several threads while members join and leave. Every write
/// is readable afterwards through any handle.
#[test]
#[ntest::timeout(30000)]
fn test_writers_during_churn() {
    let ring = SharedHashRing::new(
        HashRing::<String, u64>::with_position_source(1 << 16, RandomPositions::seeded(9))
            .unwrap(),
    );
    let base: Vec<Node> = (0..4).map(|i| node(&format!("base-{i}"))).collect();
    for n in &base {
        ring.add_node(n.clone()).unwrap();
    }

    thread::scope(|s| {
        for t in 0..4u64 {
            let ring = ring.clone();
            s.spawn(move || {
                for i in 0..500u64 {
                    ring.put(format!("t{t}-{i}"), t * 1_000 + i).unwrap();
                }
            });
        }

        let ring = ring.clone();
        s.spawn(move || {
            for i in 0..6 {
                ring.add_node(node(&format!("late-{i}"))).unwrap();
            }
            for i in 0..3 {
                ring.remove_node_by_id(&format!("late-{i}")).unwrap();
            }
        });
    });

    assert_eq!(ring.size(), 7);
    for t in 0..4u64 {
        for i in 0..500u64 {
            assert_eq!(ring.get(&format!("t{t}-{i}")).unwrap(), Some(t * 1_000 + i));
        }
    }

    let held: usize = ring.with_ring(|r| {
        r.node_ids()
            .iter()
            .filter_map(|id| r.node(id))
            .map(|n| n.len())
            .sum()
    });
    assert_eq!(held, 2_000);
}

/// Readers never observe a key missing while its owner changes.
#[test]
#[ntest::timeout(30000)]
fn test_reads_stay_consistent_during_joins() {
    let ring = SharedHashRing::new(
        HashRing::<String, u64>::with_position_source(1 << 16, RandomPositions::seeded(12))
            .unwrap(),
    );
    ring.add_node(node("seed")).unwrap();
    for i in 0..1_000u64 {
        ring.put(format!("k{i}"), i).unwrap();
    }

    thread::scope(|s| {
        let writer = ring.clone();
        s.spawn(move || {
            for i in 0..20 {
                writer.add_node(node(&format!("n{i}"))).unwrap();
            }
        });

        for _ in 0..3 {
            let reader = ring.clone();
            s.spawn(move || {
                for _ in 0..5 {
                    for i in 0..1_000u64 {
                        assert_eq!(reader.get(&format!("k{i}")).unwrap(), Some(i));
                    }
                }
            });
        }
    });

    assert_eq!(ring.size(), 21);
}
