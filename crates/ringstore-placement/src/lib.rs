//! Consistent hashing ring with key migration on membership change.
//!
//! [`HashRing`] places each member [`StorageNode`](ringstore_store::StorageNode)
//! at one position of a fixed ring space and routes every key to the first
//! node at or clockwise after the key's hash. Membership changes move only
//! the keys whose owner changes:
//!
//! - adding a node pulls from its clockwise neighbor the keys now closer to it;
//! - removing a node copies all of its keys into its clockwise neighbor.
//!
//! Keys are serialized with postcard and hashed with MurmurHash3 (x86,
//! 32-bit). Node positions come from a pluggable [`PositionSource`], random
//! by default, with linear probing on collision.

mod config;
mod error;
mod hash;
mod position;
mod ring;
mod shared;
mod slot;


pub use config::{DEFAULT_MAX_POSITIONS, RingConfig};
pub use error::{ErrorKind, RingError};
pub use hash::{KeyHasher, fold_to_ring, murmur3_32};
pub use position::{PositionSource, RandomPositions, SequencePositions};
pub use ring::{HashRing, ring_distance};
pub use shared::SharedHashRing;
