//! Per-thread connection storage.
//!
//! Every thread owns one [`ThreadConnections`]; builders write into it
//! through a [`ThreadSink`], which keeps only the connections this thread
//! is responsible for and forwards them to an attached third-factor
//! builder during tripartite connects.

use rand::rngs::StdRng;
use serde::Serialize;

use super::builder::ThirdFactorBuilder;
use super::types::{Connection, SynapseParams};
use crate::node::{NodeInfo, VpLayout};

/// Connections stored by one thread, in the order they were emitted
#[derive(Debug, Clone, Default, Serialize)]
pub struct ThreadConnections {
    connections: Vec<Connection>,
}

impl ThreadConnections {
    pub fn push(&mut self, connection: Connection) {
        self.connections.push(connection);
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Connection> {
        self.connections.iter()
    }

    pub fn as_slice(&self) -> &[Connection] {
        &self.connections
    }

    pub fn clear(&mut self) {
        self.connections.clear();
    }
}

/// All connections of this rank, one storage per thread
#[derive(Debug, Clone, Default)]
pub struct ConnectionStore {
    threads: Vec<ThreadConnections>,
}

impl ConnectionStore {
    pub fn new(threads: usize) -> Self {
        Self {
            threads: vec![ThreadConnections::default(); threads.max(1)],
        }
    }

    pub fn num_threads(&self) -> usize {
        self.threads.len()
    }

    pub fn thread(&self, tid: usize) -> &ThreadConnections {
        &self.threads[tid]
    }

    pub fn threads(&self) -> &[ThreadConnections] {
        &self.threads
    }

    pub fn threads_mut(&mut self) -> &mut [ThreadConnections] {
        &mut self.threads
    }

    /// Total number of connections across threads
    pub fn len(&self) -> usize {
        self.threads.iter().map(ThreadConnections::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.iter().all(ThreadConnections::is_empty)
    }

    /// Connections of all threads, thread by thread
    pub fn iter(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.threads.iter().flat_map(ThreadConnections::iter)
    }

    pub fn clear(&mut self) {
        for thread in &mut self.threads {
            thread.clear();
        }
    }
}

/// Third-factor state carried by a sink during a tripartite connect
pub struct ThirdHook<'a> {
    builder: &'a dyn ThirdFactorBuilder,
    rng: StdRng,
    third_out: SynapseParams,
    pending: Vec<(NodeInfo, NodeInfo)>,
}

impl<'a> ThirdHook<'a> {
    pub fn new(builder: &'a dyn ThirdFactorBuilder, rng: StdRng, third_out: SynapseParams) -> Self {
        Self {
            builder,
            rng,
            third_out,
            pending: Vec::new(),
        }
    }
}

/// Write handle of one thread for the duration of one connect call
pub struct ThreadSink<'a> {
    tid: usize,
    layout: &'a VpLayout,
    out: &'a mut ThreadConnections,
    third: Option<ThirdHook<'a>>,
    emitted: usize,
}

impl<'a> ThreadSink<'a> {
    pub fn new(tid: usize, layout: &'a VpLayout, out: &'a mut ThreadConnections) -> Self {
        Self {
            tid,
            layout,
            out,
            third: None,
            emitted: 0,
        }
    }

    pub fn with_third(
        tid: usize,
        layout: &'a VpLayout,
        out: &'a mut ThreadConnections,
        hook: ThirdHook<'a>,
    ) -> Self {
        Self {
            third: Some(hook),
            ..Self::new(tid, layout, out)
        }
    }

    pub fn tid(&self) -> usize {
        self.tid
    }

    pub fn layout(&self) -> &VpLayout {
        self.layout
    }

    /// Whether connections onto `target` can end up on this thread
    pub fn handles_target(&self, target: NodeInfo) -> bool {
        target.is_device() || self.layout.local_thread(target) == Some(self.tid)
    }

    /// Store `source -> target` if this thread is responsible for it.
    ///
    /// Returns whether the connection was stored here.
    pub fn connect(&mut self, source: NodeInfo, target: NodeInfo, synapse: &SynapseParams) -> bool {
        if self.layout.storing_thread(source, target) != Some(self.tid) {
            return false;
        }
        self.out.push(Connection::new(source.gid, target.gid, synapse));
        self.emitted += 1;

        if let Some(hook) = &mut self.third {
            if let Some(third) = hook.builder.third_connect(source, target, &mut hook.rng) {
                self.out.push(Connection::new(third.gid, target.gid, &hook.third_out));
                self.emitted += 1;
                hook.pending.push((source, third));
            }
        }
        true
    }

    /// Number of connections stored through this sink
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// `(source, third)` pairs whose connection belongs to the thread of `third`
    pub fn into_pending(self) -> Vec<(NodeInfo, NodeInfo)> {
        self.third.map(|hook| hook.pending).unwrap_or_default()
    }
}
