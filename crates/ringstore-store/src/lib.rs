//! Storage node contract and backend implementations.
//!
//! This crate defines the [`StorageNode`] trait that every member of a
//! `ringstore` hash ring implements, along with one concrete backend:
//!
//! - [`MemoryNode`]: unbounded in-memory storage backed by a `RwLock<HashMap>`.

mod memory_node;
mod traits;

pub use memory_node::MemoryNode;
pub use traits::StorageNode;
