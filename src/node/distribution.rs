//! Round-robin placement of nodes on ranks and threads.
//!
//! Nodes with proxies are distributed over virtual processes by GID:
//! `vp = gid mod (ranks * threads)`, the owning rank is `vp mod ranks` and
//! the thread on that rank is `vp div ranks`. In particular `gid mod ranks`
//! selects the owning rank, so the local GIDs of a rank are spaced `ranks`
//! apart. Devices have no proxies and are instantiated on every rank and
//! every thread, perforating that even spacing.

use serde::{Deserialize, Serialize};

use super::types::{Gid, NodeInfo, NodeKind};

/// Virtual-process layout of the simulation as seen from one rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpLayout {
    num_ranks: usize,
    threads_per_rank: usize,
    rank: usize,
}

impl VpLayout {
    /// # Panics
    ///
    /// Panics if `num_ranks` or `threads_per_rank` is zero or `rank` is out of range.
    pub fn new(num_ranks: usize, threads_per_rank: usize, rank: usize) -> Self {
        assert!(num_ranks > 0, "at least one rank is required");
        assert!(threads_per_rank > 0, "at least one thread per rank is required");
        assert!(rank < num_ranks, "rank {} out of range for {} ranks", rank, num_ranks);
        Self {
            num_ranks,
            threads_per_rank,
            rank,
        }
    }

    /// Single rank running `threads` threads
    pub fn single_rank(threads: usize) -> Self {
        Self::new(1, threads, 0)
    }

    pub fn num_ranks(&self) -> usize {
        self.num_ranks
    }

    pub fn threads_per_rank(&self) -> usize {
        self.threads_per_rank
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn num_vps(&self) -> usize {
        self.num_ranks * self.threads_per_rank
    }

    pub fn vp_of(&self, gid: Gid) -> usize {
        (gid % self.num_vps() as u64) as usize
    }

    pub fn rank_of_vp(&self, vp: usize) -> usize {
        vp % self.num_ranks
    }

    pub fn thread_of_vp(&self, vp: usize) -> usize {
        vp / self.num_ranks
    }

    pub fn owner_rank(&self, gid: Gid) -> usize {
        self.rank_of_vp(self.vp_of(gid))
    }

    /// Whether a node is instantiated on this rank
    pub fn is_local(&self, node: NodeInfo) -> bool {
        match node.kind {
            NodeKind::Device => true,
            NodeKind::Neuron => self.owner_rank(node.gid) == self.rank,
        }
    }

    /// Local thread that owns a neuron, `None` if the neuron lives on another
    /// rank or the node is a device (present on every thread)
    pub fn local_thread(&self, node: NodeInfo) -> Option<usize> {
        match node.kind {
            NodeKind::Device => None,
            NodeKind::Neuron => {
                let vp = self.vp_of(node.gid);
                (self.rank_of_vp(vp) == self.rank).then(|| self.thread_of_vp(vp))
            }
        }
    }

    /// Thread that stores the connection `source -> target` on this rank.
    ///
    /// Connections live with their target. A device target has an instance
    /// on every thread, so the connection lives on the thread of the source
    /// instead; device-to-device connections live on thread 0.
    pub fn storing_thread(&self, source: NodeInfo, target: NodeInfo) -> Option<usize> {
        match (source.kind, target.kind) {
            (_, NodeKind::Neuron) => self.local_thread(target),
            (NodeKind::Neuron, NodeKind::Device) => self.local_thread(source),
            (NodeKind::Device, NodeKind::Device) => Some(0),
        }
    }
}

impl Default for VpLayout {
    fn default() -> Self {
        Self::single_rank(1)
    }
}
