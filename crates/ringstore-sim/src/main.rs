//! `ringstore-sim`: drive a consistent hashing ring through membership churn.
//!
//! # Usage
//!
//! ```text
//! ringstore-sim run                          # defaults: 8 nodes, 10k keys
//! ringstore-sim run -c sim.toml             # workload from a config file
//! ringstore-sim run -n 16 -k 100000 -r 4     # override the workload
//! ringstore-sim placements -n 8              # show where nodes land
//! ```

mod config;
mod sim;
mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ringstore_placement::HashRing;
use ringstore_store::MemoryNode;
use tracing::info;

use config::SimConfig;
use sim::Change;

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "ringstore-sim",
    version,
    about = "Consistent hashing ring simulator"
)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write keys, churn membership, verify every key is still readable.
    Run {
        /// Initial node count.
        #[arg(short, long)]
        nodes: Option<usize>,

        /// Number of keys to write.
        #[arg(short, long)]
        keys: Option<u32>,

        /// Nodes to add after the keys are written.
        #[arg(short, long)]
        joiners: Option<usize>,

        /// Nodes to remove at the end.
        #[arg(short, long)]
        removals: Option<usize>,

        /// Seed for node placement.
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Add nodes to an empty ring and print their positions.
    Placements {
        /// Node count.
        #[arg(short, long, default_value = "8")]
        nodes: usize,
    },
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = SimConfig::load(cli.config.as_deref()).context("failed to load config")?;

    telemetry::init(&config.log.level);

    match cli.command {
        Commands::Run {
            nodes,
            keys,
            joiners,
            removals,
            seed,
        } => {
            // CLI args override config file values.
            if let Some(n) = nodes {
                config.workload.nodes = n;
            }
            if let Some(k) = keys {
                config.workload.keys = k;
            }
            if let Some(j) = joiners {
                config.workload.late_joiners = j;
            }
            if let Some(r) = removals {
                config.workload.removals = r;
            }
            if seed.is_some() {
                config.ring.placement_seed = seed;
            }
            cmd_run(&config)
        }
        Commands::Placements { nodes } => cmd_placements(&config, nodes),
    }
}

// -----------------------------------------------------------------------
// ringstore-sim run
// -----------------------------------------------------------------------

fn cmd_run(config: &SimConfig) -> Result<()> {
    info!(
        max_positions = config.ring.max_positions,
        nodes = config.workload.nodes,
        keys = config.workload.keys,
        "starting simulation"
    );
    let report = sim::run(config).context("simulation failed")?;

    println!("Ring");
    println!("  positions: {}", config.ring.max_positions);
    println!("  keys:      {}", report.keys);
    println!();

    println!("Membership changes:");
    for change in &report.changes {
        match change {
            Change::Joined { node_id, moved } => println!("  + {node_id:<12} moved {moved} keys"),
            Change::Left { node_id, moved } => println!("  - {node_id:<12} moved {moved} keys"),
        }
    }
    println!();

    println!("Final load:");
    for ((id, count), (_, position)) in report.load.iter().zip(&report.placements) {
        match report.fair_share(*count) {
            Some(share) => println!(
                "  {id:<12} @ {position:>10}  {count:>8} keys ({share:.2}x fair share)"
            ),
            None => println!("  {id:<12} @ {position:>10}  {count:>8} keys"),
        }
    }
    println!();
    println!("All {} keys readable.", report.keys);

    Ok(())
}

// -----------------------------------------------------------------------
// ringstore-sim placements
// -----------------------------------------------------------------------

fn cmd_placements(config: &SimConfig, nodes: usize) -> Result<()> {
    let mut ring = HashRing::<String, u32>::from_config(&config.ring)?;
    for i in 0..nodes {
        let node = Arc::new(MemoryNode::<String, u32>::with_id(format!("node-{i}")));
        ring.add_node(node)
            .with_context(|| format!("failed to add node-{i}"))?;
    }

    println!("Placements ({} of {} positions):", ring.size(), ring.max_positions());
    for (id, position) in ring.placements() {
        println!("  {id:<12} @ {position}");
    }

    Ok(())
}
