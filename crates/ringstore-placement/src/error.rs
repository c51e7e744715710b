//! Error types for hash ring operations.

/// Broad classification of a [`RingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller passed something the ring cannot accept.
    InvalidArgument,
    /// The ring has no free position left for another node.
    CapacityExceeded,
    /// The ring is not in a state where the operation can run.
    IllegalState,
}

/// Errors that can occur during hash ring operations.
///
/// Every failing operation fails before mutating the ring.
#[derive(Debug, thiserror::Error)]
pub enum RingError {
    /// The ring must have at least one position.
    #[error("max positions must be positive: max_positions={0}")]
    InvalidMaxPositions(u32),

    /// The storage node reported an empty identity.
    #[error("storage node id cannot be empty")]
    EmptyNodeId,

    /// A node with this identity is already a member.
    #[error("hash ring already contains storage node: id={0}")]
    DuplicateNode(String),

    /// No member has this identity.
    #[error("hash ring does not contain storage node: id={0}")]
    UnknownNode(String),

    /// The ring already holds `max_positions - 1` members.
    #[error("hash ring max number of nodes reached: size={size}, max_positions={max_positions}")]
    CapacityExceeded {
        /// Members currently on the ring.
        size: usize,
        /// Size of the ring space.
        max_positions: u32,
    },

    /// A key could not be serialized or hashed.
    #[error("key hashing failed: {0}")]
    Serialization(String),

    /// A `put` was issued while the ring has no members.
    #[error("cannot put: hash ring is empty")]
    EmptyRing,

    /// The position source had no position to hand out.
    #[error("position source exhausted")]
    PositionsExhausted,

    /// Ring configuration could not be parsed.
    #[error("config error: {0}")]
    Config(String),
}

impl RingError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidMaxPositions(_)
            | Self::EmptyNodeId
            | Self::DuplicateNode(_)
            | Self::UnknownNode(_)
            | Self::Serialization(_)
            | Self::Config(_) => ErrorKind::InvalidArgument,
            Self::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Self::EmptyRing | Self::PositionsExhausted => ErrorKind::IllegalState,
        }
    }
}
