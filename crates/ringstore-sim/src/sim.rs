//! Membership churn simulation over in-memory nodes.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, bail};
use ringstore_placement::HashRing;
use ringstore_store::{MemoryNode, StorageNode};
use tracing::{debug, info};

use crate::config::SimConfig;

type Node = Arc<MemoryNode<String, u32>>;

/// A membership change and how many keys changed owner because of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// A node joined after keys were written.
    Joined {
        /// Joining node.
        node_id: String,
        /// Keys whose owner changed.
        moved: usize,
    },
    /// A node left the ring.
    Left {
        /// Departing node.
        node_id: String,
        /// Keys whose owner changed.
        moved: usize,
    },
}

/// Outcome of a simulation run.
#[derive(Debug)]
pub struct SimReport {
    /// Keys written.
    pub keys: u32,
    /// `(node, position)` of the final members in clockwise order.
    pub placements: Vec<(String, u32)>,
    /// `(node, keys held)` of the final members in clockwise order.
    pub load: Vec<(String, usize)>,
    /// Membership changes made after the keys were written.
    pub changes: Vec<Change>,
}

impl SimReport {
    /// `count` relative to an even split of every key across the final
    /// members. `None` when no keys were written.
    pub fn fair_share(&self, count: usize) -> Option<f64> {
        if self.keys == 0 || self.load.is_empty() {
            return None;
        }
        let fair = f64::from(self.keys) / self.load.len() as f64;
        Some(count as f64 / fair)
    }
}

struct Simulation {
    ring: HashRing<String, u32>,
    nodes: HashMap<String, Node>,
    joined: Vec<String>,
    keys: Vec<String>,
    next_id: usize,
}

impl Simulation {
    fn join(&mut self) -> Result<String> {
        let id = format!("node-{}", self.next_id);
        self.next_id += 1;
        let node: Node = Arc::new(MemoryNode::with_id(id.clone()));
        self.ring.add_node(node.clone())?;
        self.nodes.insert(id.clone(), node);
        self.joined.push(id.clone());
        Ok(id)
    }

    fn owners(&self) -> Result<Vec<Option<String>>> {
        let owners = self
            .keys
            .iter()
            .map(|k| self.ring.owner_of(k))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(owners)
    }

    fn moved_since(&self, before: &[Option<String>]) -> Result<usize> {
        let after = self.owners()?;
        Ok(before.iter().zip(&after).filter(|(b, a)| b != a).count())
    }
}

/// Build a ring from `config`, write keys, churn membership, and verify
/// every key is still readable.
pub fn run(config: &SimConfig) -> Result<SimReport> {
    let workload = &config.workload;
    if workload.nodes == 0 {
        bail!("workload needs at least one initial node");
    }
    if workload.removals >= workload.nodes + workload.late_joiners {
        bail!(
            "cannot remove {} of {} nodes: at least one must remain",
            workload.removals,
            workload.nodes + workload.late_joiners
        );
    }

    let mut sim = Simulation {
        ring: HashRing::from_config(&config.ring)?,
        nodes: HashMap::new(),
        joined: Vec::new(),
        keys: (0..workload.keys).map(|i| format!("key-{i}")).collect(),
        next_id: 0,
    };

    for _ in 0..workload.nodes {
        sim.join()?;
    }
    info!(nodes = sim.ring.size(), "initial members joined");

    for (i, key) in sim.keys.iter().enumerate() {
        sim.ring.put(key.clone(), i as u32)?;
    }
    info!(keys = workload.keys, "keys written");

    let mut changes = Vec::new();
    for _ in 0..workload.late_joiners {
        let before = sim.owners()?;
        let node_id = sim.join()?;
        let moved = sim.moved_since(&before)?;
        debug!(%node_id, moved, "late joiner");
        changes.push(Change::Joined { node_id, moved });
    }

    for _ in 0..workload.removals {
        let before = sim.owners()?;
        let node_id = sim.joined.remove(0);
        sim.ring.remove_node_by_id(&node_id)?;
        let moved = sim.moved_since(&before)?;
        debug!(%node_id, moved, "removed");
        changes.push(Change::Left { node_id, moved });
    }

    for (i, key) in sim.keys.iter().enumerate() {
        match sim.ring.get(key)? {
            Some(v) if v == i as u32 => {}
            Some(v) => bail!("{key} reads back {v}, expected {i}"),
            None => bail!("{key} is unreachable"),
        }
    }

    let placements = sim.ring.placements();
    let load = placements
        .iter()
        .map(|(id, _)| (id.clone(), sim.nodes[id].len()))
        .collect();

    Ok(SimReport {
        keys: workload.keys,
        placements,
        load,
        changes,
    })
}
