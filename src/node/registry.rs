//! Sparse per-rank node registry.
//!
//! Maps global node identifiers onto the nodes held by this rank. Nodes are
//! appended in ascending GID order while the network is built and the
//! registry is read-only afterwards, so lookups can run from every thread
//! without locking.
//!
//! ## Lookup
//!
//! Local GIDs are spaced roughly `ranks` apart, so the slot of a GID is
//! estimated by linear interpolation between the smallest and largest local
//! GID and then corrected by scanning to the right only.
//!
//! The interpolation slope is the smallest of `k / (gid_k - local_min_gid)`
//! over all entries `k > 0`. The last entry contributes the overall slope
//! `(count - 1) / (local_max_gid - local_min_gid)`, which is the value used
//! for evenly spaced layouts and for layouts perforated after the first
//! entries. Any steeper prefix lowers the slope, so for every entry `k`
//! the estimate `floor((gid_k - local_min_gid) * scale)` is at most `k`.
//! That invariant is what makes the rightward-only correction complete.

use std::sync::Arc;

use super::types::{Gid, Node};

/// Registry entry: the node handle and a copy of its GID for fast scanning
#[derive(Debug, Clone)]
pub struct NodeEntry {
    node: Arc<Node>,
    gid: Gid,
}

impl NodeEntry {
    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    pub fn gid(&self) -> Gid {
        self.gid
    }
}

/// Per-rank lookup from GID to local node
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    nodes: Vec<NodeEntry>,
    /// Largest GID in the whole network, not necessarily local
    max_gid: Gid,
    local_min_gid: Gid,
    local_max_gid: Gid,
    gid_idx_scale: f64,
}

impl NodeRegistry {
    pub fn new() -> Self {
        NodeRegistry {
            nodes: Vec::new(),
            max_gid: 0,
            local_min_gid: 0,
            local_max_gid: 0,
            gid_idx_scale: 1.0,
        }
    }

    /// Number of local nodes
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Largest GID in the network
    pub fn get_max_gid(&self) -> Gid {
        self.max_gid
    }

    pub fn local_min_gid(&self) -> Gid {
        self.local_min_gid
    }

    pub fn local_max_gid(&self) -> Gid {
        self.local_max_gid
    }

    /// Current interpolation factor
    pub fn scale(&self) -> f64 {
        self.gid_idx_scale
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.max_gid = 0;
        self.local_min_gid = 0;
        self.local_max_gid = 0;
        self.gid_idx_scale = 1.0;
    }

    /// Append a local node.
    ///
    /// Nodes must be added in strictly increasing GID order.
    pub fn add_local_node(&mut self, node: Arc<Node>) {
        let gid = node.gid();
        debug_assert!(
            self.nodes.last().map_or(true, |last| last.gid < gid),
            "local nodes must be added in increasing GID order (got {} after {:?})",
            gid,
            self.nodes.last().map(|e| e.gid)
        );

        if self.nodes.is_empty() {
            self.local_min_gid = gid;
        }
        self.local_max_gid = gid;
        self.max_gid = self.max_gid.max(gid);
        self.nodes.push(NodeEntry { node, gid });

        let k = self.nodes.len() - 1;
        if k > 0 {
            let slope = k as f64 / (gid - self.local_min_gid) as f64;
            self.gid_idx_scale = self.gid_idx_scale.min(slope);
        }
    }

    /// Record that the network contains nodes up to `gid`, local or not
    pub fn update_max_gid(&mut self, gid: Gid) {
        self.max_gid = self.max_gid.max(gid);
    }

    /// Interpolated starting slot for a lookup, `None` if `gid` cannot be local
    pub fn estimated_index(&self, gid: Gid) -> Option<usize> {
        if self.nodes.is_empty() || gid < self.local_min_gid || gid > self.max_gid {
            return None;
        }
        let idx = ((gid - self.local_min_gid) as f64 * self.gid_idx_scale).floor() as usize;
        Some(idx.min(self.nodes.len() - 1))
    }

    /// Look up a local node by GID.
    ///
    /// Returns `None` if the node is not held by this rank; the caller is
    /// responsible for substituting proxy semantics for remote nodes.
    pub fn get_node_by_gid(&self, gid: Gid) -> Option<&Arc<Node>> {
        let mut idx = self.estimated_index(gid)?;
        while idx < self.nodes.len() && self.nodes[idx].gid < gid {
            idx += 1;
        }
        match self.nodes.get(idx) {
            Some(entry) if entry.gid == gid => Some(&entry.node),
            _ => None,
        }
    }

    /// Local node at position `idx`, for iterating over local nodes.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.size()`.
    pub fn get_node_by_index(&self, idx: usize) -> &Arc<Node> {
        assert!(
            idx < self.nodes.len(),
            "local node index {} out of range ({} local nodes)",
            idx,
            self.nodes.len()
        );
        &self.nodes[idx].node
    }

    /// Local entries in ascending GID order
    pub fn iter(&self) -> std::slice::Iter<'_, NodeEntry> {
        self.nodes.iter()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a NodeRegistry {
    type Item = &'a NodeEntry;
    type IntoIter = std::slice::Iter<'a, NodeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::distribution::VpLayout;
    use crate::node::types::{NodeInfo, NodeKind};

    fn neuron(gid: Gid) -> Arc<Node> {
        Arc::new(Node::new(gid, "iaf_psc_alpha", NodeKind::Neuron, Some(0)))
    }

    fn registry_with(gids: &[Gid]) -> (NodeRegistry, Vec<Arc<Node>>) {
        let mut registry = NodeRegistry::new();
        let nodes: Vec<_> = gids.iter().map(|&g| neuron(g)).collect();
        for node in &nodes {
            registry.add_local_node(Arc::clone(node));
        }
        (registry, nodes)
    }

    #[test]
    fn test_evenly_spaced_lookup() {
        let (mut registry, nodes) = registry_with(&[0, 4, 8, 12, 16]);

        assert!(Arc::ptr_eq(registry.get_node_by_gid(8).unwrap(), &nodes[2]));
        assert!(registry.get_node_by_gid(10).is_none());
        assert!(Arc::ptr_eq(registry.get_node_by_gid(16).unwrap(), &nodes[4]));
        assert!(registry.get_node_by_gid(20).is_none());
        assert_eq!(registry.estimated_index(20), None);

        registry.update_max_gid(20);
        assert_eq!(registry.get_max_gid(), 20);
        // In range now, but still not local
        assert!(registry.estimated_index(20).is_some());
        assert!(registry.get_node_by_gid(20).is_none());
    }

    #[test]
    fn test_even_spacing_uses_overall_slope() {
        let (registry, _) = registry_with(&[3, 7, 11, 15, 19, 23]);
        let overall = (registry.size() - 1) as f64
            / (registry.local_max_gid() - registry.local_min_gid()) as f64;
        assert_eq!(registry.scale(), overall);
        assert_eq!(registry.scale(), 0.25);
    }

    #[test]
    fn test_every_added_node_is_found() {
        let gids: Vec<Gid> = vec![1, 2, 5, 9, 10, 11, 30, 31, 32, 33, 34, 70, 99];
        let (registry, nodes) = registry_with(&gids);
        for (gid, node) in gids.iter().zip(&nodes) {
            assert!(Arc::ptr_eq(registry.get_node_by_gid(*gid).unwrap(), node));
        }
        for gid in 0..=registry.get_max_gid() {
            if !gids.contains(&gid) {
                assert!(registry.get_node_by_gid(gid).is_none(), "gid {} should miss", gid);
            }
        }
    }

    #[test]
    fn test_estimate_never_passes_true_slot() {
        // Perforation right after the first entry: the overall slope would
        // estimate gid 10 at slot 4 although it lives at slot 1.
        let gids: Vec<Gid> = vec![0, 10, 11, 12, 13, 14, 15];
        let (registry, nodes) = registry_with(&gids);

        let overall: f64 = 6.0 / 15.0;
        assert_eq!((10.0 * overall).floor() as usize, 4);
        assert!(registry.scale() < overall);

        for (slot, gid) in gids.iter().enumerate() {
            let estimate = registry.estimated_index(*gid).unwrap();
            assert!(estimate <= slot, "estimate {} passes slot {} for gid {}", estimate, slot, gid);
            assert!(Arc::ptr_eq(registry.get_node_by_gid(*gid).unwrap(), &nodes[slot]));
        }
        for gid in 1..10 {
            assert!(registry.get_node_by_gid(gid).is_none());
        }
    }

    #[test]
    fn test_replicated_devices_perforate_round_robin() {
        // Four ranks; every fifth node is a device present on all of them.
        let layout = VpLayout::new(4, 2, 1);
        let mut registry = NodeRegistry::new();
        let mut expected = Vec::new();
        for gid in 1..=200u64 {
            let kind = if gid % 5 == 0 { NodeKind::Device } else { NodeKind::Neuron };
            let info = NodeInfo { gid, kind };
            if layout.is_local(info) {
                let node = Arc::new(Node::new(gid, "m", kind, layout.local_thread(info)));
                registry.add_local_node(Arc::clone(&node));
                expected.push(node);
            }
        }
        registry.update_max_gid(200);

        for (slot, node) in expected.iter().enumerate() {
            assert!(registry.estimated_index(node.gid()).unwrap() <= slot);
            assert!(Arc::ptr_eq(registry.get_node_by_gid(node.gid()).unwrap(), node));
        }
        // Remote neurons are misses
        assert!(registry.get_node_by_gid(2).is_none());
        assert!(registry.get_node_by_gid(4).is_none());
    }

    #[test]
    fn test_clear_resets_state() {
        let (mut registry, _) = registry_with(&[2, 4, 6]);
        registry.update_max_gid(50);
        registry.clear();

        assert_eq!(registry.size(), 0);
        assert_eq!(registry.get_max_gid(), 0);
        assert_eq!(registry.scale(), 1.0);
        assert!(registry.get_node_by_gid(2).is_none());
        assert!(registry.get_node_by_gid(0).is_none());
    }

    #[test]
    fn test_index_access_and_iteration() {
        let (registry, nodes) = registry_with(&[5, 6, 9]);
        assert!(Arc::ptr_eq(registry.get_node_by_index(1), &nodes[1]));

        let gids: Vec<Gid> = registry.iter().map(NodeEntry::gid).collect();
        assert_eq!(gids, vec![5, 6, 9]);
        // Restartable
        assert_eq!((&registry).into_iter().count(), 3);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_index_out_of_range_panics() {
        let (registry, _) = registry_with(&[1, 2]);
        registry.get_node_by_index(2);
    }

    #[test]
    fn test_single_entry() {
        let (registry, nodes) = registry_with(&[42]);
        assert_eq!(registry.scale(), 1.0);
        assert!(Arc::ptr_eq(registry.get_node_by_gid(42).unwrap(), &nodes[0]));
        assert!(registry.get_node_by_gid(41).is_none());
        assert!(registry.get_node_by_gid(43).is_none());
    }
}
