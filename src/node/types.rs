//! Core node types.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Global, network-wide unique node identifier
pub type Gid = u64;

/// Placement class of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Ordinary simulated node, placed round-robin on exactly one virtual process
    Neuron,
    /// Stimulation or recording device, replicated on every rank and thread
    Device,
}

impl NodeKind {
    /// Whether the node has a single owning process elsewhere in the network
    pub fn has_proxies(&self) -> bool {
        matches!(self, NodeKind::Neuron)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Neuron => write!(f, "neuron"),
            NodeKind::Device => write!(f, "device"),
        }
    }
}

/// Lightweight, globally valid description of a node.
///
/// Every rank knows the `NodeInfo` of every node, whereas only local nodes
/// are backed by a [`Node`] in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeInfo {
    pub gid: Gid,
    pub kind: NodeKind,
}

impl NodeInfo {
    pub fn neuron(gid: Gid) -> Self {
        Self { gid, kind: NodeKind::Neuron }
    }

    pub fn device(gid: Gid) -> Self {
        Self { gid, kind: NodeKind::Device }
    }

    pub fn is_device(&self) -> bool {
        self.kind == NodeKind::Device
    }
}

/// A node instantiated on this rank
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    gid: Gid,
    model: String,
    kind: NodeKind,
    /// Local thread for neurons, `None` for devices which exist on every thread
    thread: Option<usize>,
}

impl Node {
    pub fn new(gid: Gid, model: impl Into<String>, kind: NodeKind, thread: Option<usize>) -> Self {
        Self {
            gid,
            model: model.into(),
            kind,
            thread,
        }
    }

    pub fn gid(&self) -> Gid {
        self.gid
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn thread(&self) -> Option<usize> {
        self.thread
    }

    pub fn info(&self) -> NodeInfo {
        NodeInfo { gid: self.gid, kind: self.kind }
    }
}

/// An ordered population of nodes used as source, target or third-factor
/// population of a connect call.
///
/// Cloning is cheap; the underlying list is shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCollection {
    nodes: Arc<[NodeInfo]>,
}

impl NodeCollection {
    pub fn new(nodes: Vec<NodeInfo>) -> Self {
        Self { nodes: nodes.into() }
    }

    /// Contiguous range `first..=last` of nodes of one kind
    pub fn range(first: Gid, last: Gid, kind: NodeKind) -> Self {
        Self::new((first..=last).map(|gid| NodeInfo { gid, kind }).collect())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<NodeInfo> {
        self.nodes.get(idx).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeInfo> + '_ {
        self.nodes.iter().copied()
    }

    pub fn contains(&self, gid: Gid) -> bool {
        self.nodes.iter().any(|n| n.gid == gid)
    }

    pub fn has_devices(&self) -> bool {
        self.nodes.iter().any(NodeInfo::is_device)
    }

    /// Concatenate two collections, keeping order
    pub fn join(&self, other: &NodeCollection) -> NodeCollection {
        let mut nodes = self.nodes.to_vec();
        nodes.extend(other.iter());
        NodeCollection::new(nodes)
    }

    pub fn gids(&self) -> Vec<Gid> {
        self.nodes.iter().map(|n| n.gid).collect()
    }
}

impl std::ops::Index<usize> for NodeCollection {
    type Output = NodeInfo;

    fn index(&self, idx: usize) -> &NodeInfo {
        &self.nodes[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_collection() {
        let pop = NodeCollection::range(3, 7, NodeKind::Neuron);
        assert_eq!(pop.len(), 5);
        assert_eq!(pop[0].gid, 3);
        assert_eq!(pop.get(4), Some(NodeInfo::neuron(7)));
        assert!(pop.get(5).is_none());
        assert!(!pop.has_devices());
    }

    #[test]
    fn test_join_keeps_order() {
        let a = NodeCollection::range(1, 2, NodeKind::Neuron);
        let b = NodeCollection::range(10, 10, NodeKind::Device);
        let joined = a.join(&b);
        assert_eq!(joined.gids(), vec![1, 2, 10]);
        assert!(joined.has_devices());
        assert!(joined.contains(10));
        assert!(!joined.contains(3));
    }
}
