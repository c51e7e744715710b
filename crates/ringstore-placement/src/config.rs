//! Ring configuration, deserializable from TOML.

use serde::Deserialize;

use crate::error::RingError;

/// Default size of the ring space.
pub const DEFAULT_MAX_POSITIONS: u32 = 1024;

/// Configuration for a [`HashRing`](crate::HashRing).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Number of positions on the ring. Bounds the member count to
    /// `max_positions - 1`.
    pub max_positions: u32,
    /// Murmur3 seed used when hashing keys.
    pub key_seed: u32,
    /// Seed for the random node placement. Random from the OS if unset.
    pub placement_seed: Option<u64>,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            max_positions: DEFAULT_MAX_POSITIONS,
            key_seed: 0,
            placement_seed: None,
        }
    }
}

impl RingConfig {
    /// Parse and validate a config from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self, RingError> {
        let config: RingConfig = toml::from_str(s).map_err(|e| RingError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the ring cannot be built from.
    pub fn validate(&self) -> Result<(), RingError> {
        if self.max_positions < 1 {
            return Err(RingError::InvalidMaxPositions(self.max_positions));
        }
        Ok(())
    }
}
