//! Sources of candidate positions for new ring members.
//!
//! A [`PositionSource`] is consulted once per `add_node`. The ring probes
//! forward from the returned candidate on collision, so a source never needs
//! to know which positions are taken.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Supplies candidate positions for nodes joining the ring.
///
/// Implementations should return a value in `[0, max_positions)`; the ring
/// reduces anything larger modulo `max_positions`. Returning `None` makes the
/// pending `add_node` fail without touching the ring.
pub trait PositionSource: Send {
    /// Next candidate position.
    fn next_position(&mut self, max_positions: u32) -> Option<u32>;
}

impl<F> PositionSource for F
where
    F: FnMut() -> u32 + Send,
{
    fn next_position(&mut self, _max_positions: u32) -> Option<u32> {
        Some(self())
    }
}

/// Uniform random placement.
#[derive(Debug, Clone)]
pub struct RandomPositions {
    rng: StdRng,
}

impl RandomPositions {
    /// Random placement seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic placement for reproducible layouts.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPositions {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionSource for RandomPositions {
    fn next_position(&mut self, max_positions: u32) -> Option<u32> {
        Some(self.rng.random_range(0..max_positions))
    }
}

/// Hands out a fixed list of positions in order, then runs dry.
#[derive(Debug, Clone, Default)]
pub struct SequencePositions {
    positions: VecDeque<u32>,
}

impl SequencePositions {
    /// Create a source that yields `positions` in order.
    pub fn new(positions: impl IntoIterator<Item = u32>) -> Self {
        Self {
            positions: positions.into_iter().collect(),
        }
    }

    /// Positions not yet handed out.
    pub fn remaining(&self) -> usize {
        self.positions.len()
    }
}

impl PositionSource for SequencePositions {
    fn next_position(&mut self, _max_positions: u32) -> Option<u32> {
        self.positions.pop_front()
    }
}
