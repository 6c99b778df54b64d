//! Node addressing.
//!
//! This module contains the node types shared across the crate, the
//! round-robin placement of nodes on ranks and threads, and the sparse
//! per-rank registry that resolves global identifiers to local nodes.

pub mod types;
pub mod distribution;
pub mod registry;

// Re-export commonly used types
pub use types::{Gid, Node, NodeCollection, NodeInfo, NodeKind};
pub use distribution::VpLayout;
pub use registry::{NodeEntry, NodeRegistry};
