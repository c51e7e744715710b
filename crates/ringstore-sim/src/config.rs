//! TOML configuration for the simulation driver.

use std::path::Path;

use anyhow::Context;
use ringstore_placement::RingConfig;
use serde::Deserialize;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Ring space and hashing.
    pub ring: RingConfig,
    /// Membership and key workload.
    pub workload: WorkloadSection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[workload]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WorkloadSection {
    /// In-memory nodes added before any key is written.
    pub nodes: usize,
    /// Keys written once all nodes have joined.
    pub keys: u32,
    /// Nodes added after the keys are written.
    pub late_joiners: usize,
    /// Nodes removed at the end, oldest first.
    pub removals: usize,
}

impl Default for WorkloadSection {
    fn default() -> Self {
        Self {
            nodes: 8,
            keys: 10_000,
            late_joiners: 2,
            removals: 2,
        }
    }
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl SimConfig {
    /// Load config from a TOML file, or use defaults if no path given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("failed to read {}", p.display()))?;
                Self::from_toml(&content)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse and validate config from a TOML string.
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        let config: SimConfig = toml::from_str(s)?;
        config.ring.validate()?;
        Ok(config)
    }
}
