//! Key hashing: postcard bytes, MurmurHash3 (x86, 32-bit), folded into the
//! ring space.

use std::io::Cursor;

use serde::Serialize;

use crate::error::RingError;

/// Hash `bytes` with MurmurHash3 (x86, 32-bit) using `seed`.
pub fn murmur3_32(bytes: &[u8], seed: u32) -> Result<u32, RingError> {
    murmur3::murmur3_32(&mut Cursor::new(bytes), seed)
        .map_err(|e| RingError::Serialization(e.to_string()))
}

/// Fold a raw 32-bit hash into `[0, max_positions)`.
///
/// The hash is read as a signed integer and the absolute value of its
/// truncated remainder is taken, so the mapping matches signed-modulo
/// placement schemes bit for bit.
pub fn fold_to_ring(hash: u32, max_positions: u32) -> u32 {
    let signed = i64::from(hash as i32);
    (signed % i64::from(max_positions)).unsigned_abs() as u32
}

/// Maps keys onto ring positions.
///
/// Keys are serialized with postcard, hashed with [`murmur3_32`] and folded
/// into the ring space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyHasher {
    seed: u32,
    max_positions: u32,
}

impl KeyHasher {
    /// Create a hasher for a ring of `max_positions` positions.
    pub fn new(seed: u32, max_positions: u32) -> Self {
        Self {
            seed,
            max_positions,
        }
    }

    /// Murmur3 seed applied to every key.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Ring position of `key`.
    pub fn position<K: Serialize + ?Sized>(&self, key: &K) -> Result<u32, RingError> {
        let bytes =
            postcard::to_allocvec(key).map_err(|e| RingError::Serialization(e.to_string()))?;
        let hash = murmur3_32(&bytes, self.seed)?;
        Ok(fold_to_ring(hash, self.max_positions))
    }
}
