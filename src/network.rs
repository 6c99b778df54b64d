//! Network construction and event routing on one rank.
//!
//! A [`Network`] goes through two phases. While it is being built, nodes
//! are created and connected; [`Network::prepare`] then freezes the
//! topology and builds the device routing tables, after which events can be
//! routed from any number of threads. [`Network::reset`] returns to an
//! empty network.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, info};
use serde::Serialize;

use crate::config::Config;
use crate::connection::{ConnSpec, ConnectError, ConnectionManager, SynSpec, TripartiteSynSpec};
use crate::model::SynapseModelCatalogue;
use crate::node::{Gid, Node, NodeCollection, NodeInfo, NodeKind, NodeRegistry, VpLayout};
use crate::routing::{DeviceEventRouter, EventSink, RoutingError};
use crate::timing::{DetailedStopwatch, Stopwatch, TimeUnit, WallStopwatch};

/// First GID handed out; GID 0 is reserved
pub const FIRST_GID: Gid = 1;

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("Network is not prepared for event delivery")]
    NotPrepared,

    #[error("Network is prepared; reset it before changing the topology")]
    AlreadyPrepared,

    #[error("Population '{0}' already exists")]
    DuplicatePopulation(String),

    #[error("Unknown population '{0}'")]
    UnknownPopulation(String),
}

/// Elapsed time per construction phase, in seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TimingSummary {
    pub create: f64,
    pub connect: f64,
    pub prepare: f64,
    /// Only measured with the `detailed-timers` feature
    pub connect_detailed: f64,
}

/// State of the network on this rank
#[derive(Debug, Clone, Serialize)]
pub struct NetworkSummary {
    pub rank: usize,
    pub ranks: usize,
    pub threads: usize,
    pub max_gid: Gid,
    pub local_nodes: usize,
    pub local_devices: usize,
    pub connections: usize,
    pub connections_per_thread: Vec<usize>,
    pub populations: BTreeMap<String, usize>,
    pub timing: TimingSummary,
}

#[derive(Debug, Default)]
struct PhaseTimers<S> {
    create: S,
    connect: S,
    prepare: S,
    connect_detailed: DetailedStopwatch,
}

pub struct Network<S: Stopwatch = WallStopwatch> {
    layout: VpLayout,
    seed: u64,
    registry: NodeRegistry,
    models: SynapseModelCatalogue,
    connections: ConnectionManager,
    router: Option<DeviceEventRouter>,
    populations: BTreeMap<String, NodeCollection>,
    next_gid: Gid,
    timers: PhaseTimers<S>,
}

impl<S: Stopwatch> Network<S> {
    pub fn new(layout: VpLayout, seed: u64) -> Self {
        Self {
            layout,
            seed,
            registry: NodeRegistry::new(),
            models: SynapseModelCatalogue::new(layout.threads_per_rank()),
            connections: ConnectionManager::new(layout, seed),
            router: None,
            populations: BTreeMap::new(),
            next_gid: FIRST_GID,
            timers: PhaseTimers::default(),
        }
    }

    /// Build the network described by a validated configuration
    pub fn from_config(config: &Config) -> Result<Self, NetworkError> {
        let mut network = Self::new(config.layout(), config.general.seed);
        for model in &config.synapse_models {
            network.models.register(model.clone());
        }
        for population in &config.populations {
            network.create_population(&population.name, &population.model, population.size, population.kind)?;
        }
        for projection in &config.projections {
            let sources = network.population(&projection.source)?;
            let targets = network.population(&projection.target)?;
            let created = network.connect(&sources, &targets, &projection.conn, &projection.syn)?;
            info!(
                "Connected {} -> {} with {}: {} local connections",
                projection.source, projection.target, projection.conn.rule, created
            );
        }
        for tripartite in &config.tripartite {
            let sources = network.population(&tripartite.source)?;
            let targets = network.population(&tripartite.target)?;
            let third = network.population(&tripartite.third)?;
            let created = network.tripartite_connect(
                &sources,
                &targets,
                &third,
                &tripartite.conn,
                &tripartite.third_conn,
                &tripartite.syn,
            )?;
            info!(
                "Connected {} -> {} via {} with {} + {}: {} local connections",
                tripartite.source,
                tripartite.target,
                tripartite.third,
                tripartite.conn.rule,
                tripartite.third_conn.rule,
                created
            );
        }
        Ok(network)
    }

    pub fn layout(&self) -> &VpLayout {
        &self.layout
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn models(&self) -> &SynapseModelCatalogue {
        &self.models
    }

    pub fn models_mut(&mut self) -> &mut SynapseModelCatalogue {
        &mut self.models
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    pub fn connections_mut(&mut self) -> &mut ConnectionManager {
        &mut self.connections
    }

    pub fn router(&self) -> Option<&DeviceEventRouter> {
        self.router.as_ref()
    }

    pub fn is_prepared(&self) -> bool {
        self.router.is_some()
    }

    fn ensure_building(&self) -> Result<(), NetworkError> {
        if self.is_prepared() {
            Err(NetworkError::AlreadyPrepared)
        } else {
            Ok(())
        }
    }

    /// Create `n` nodes of `model`.
    ///
    /// GIDs are assigned consecutively across all ranks; only the nodes this
    /// rank owns are added to its registry.
    pub fn create(&mut self, model: &str, n: usize, kind: NodeKind) -> Result<NodeCollection, NetworkError> {
        self.ensure_building()?;
        self.timers.create.start();

        let first = self.next_gid;
        let mut nodes = Vec::with_capacity(n);
        for gid in first..first + n as Gid {
            let info = NodeInfo { gid, kind };
            if self.layout.is_local(info) {
                let node = Node::new(gid, model, kind, self.layout.local_thread(info));
                self.registry.add_local_node(Arc::new(node));
            }
            nodes.push(info);
        }
        if n > 0 {
            self.next_gid = first + n as Gid;
            self.registry.update_max_gid(self.next_gid - 1);
        }

        self.timers.create.stop();
        debug!("Created {} {} nodes of model '{}' starting at GID {}", n, kind, model, first);
        Ok(NodeCollection::new(nodes))
    }

    /// [`Network::create`] and remember the result under `name`
    pub fn create_population(
        &mut self,
        name: &str,
        model: &str,
        n: usize,
        kind: NodeKind,
    ) -> Result<NodeCollection, NetworkError> {
        if self.populations.contains_key(name) {
            return Err(NetworkError::DuplicatePopulation(name.to_string()));
        }
        let nodes = self.create(model, n, kind)?;
        self.populations.insert(name.to_string(), nodes.clone());
        Ok(nodes)
    }

    pub fn population(&self, name: &str) -> Result<NodeCollection, NetworkError> {
        self.populations
            .get(name)
            .cloned()
            .ok_or_else(|| NetworkError::UnknownPopulation(name.to_string()))
    }

    pub fn connect(
        &mut self,
        sources: &NodeCollection,
        targets: &NodeCollection,
        conn: &ConnSpec,
        syn: &SynSpec,
    ) -> Result<usize, NetworkError> {
        self.ensure_building()?;
        self.timers.connect.start();
        self.timers.connect_detailed.start();
        let result = self.connections.connect(sources, targets, conn, syn, &self.models);
        self.timers.connect_detailed.stop();
        self.timers.connect.stop();
        Ok(result?)
    }

    pub fn tripartite_connect(
        &mut self,
        sources: &NodeCollection,
        targets: &NodeCollection,
        third: &NodeCollection,
        conn: &ConnSpec,
        third_conn: &ConnSpec,
        syn: &TripartiteSynSpec,
    ) -> Result<usize, NetworkError> {
        self.ensure_building()?;
        self.timers.connect.start();
        let result = self
            .connections
            .tripartite_connect(sources, targets, third, conn, third_conn, syn, &self.models);
        self.timers.connect.stop();
        Ok(result?)
    }

    /// Freeze the topology and build the device routing tables
    pub fn prepare(&mut self) -> Result<(), NetworkError> {
        self.ensure_building()?;
        self.timers.prepare.start();
        let router = DeviceEventRouter::build(&self.layout, &self.registry, self.connections.store());
        self.timers.prepare.stop();
        info!(
            "Prepared rank {}: {} local nodes, {} connections, {} devices",
            self.layout.rank(),
            self.registry.size(),
            self.connections.num_connections(),
            router.num_devices()
        );
        self.router = Some(router);
        Ok(())
    }

    /// Deliver an event emitted by neuron `source` to its devices on thread `tid`
    pub fn send_to_devices<E: Clone>(
        &self,
        tid: usize,
        source: Gid,
        event: &E,
        sink: &mut impl EventSink<E>,
    ) -> Result<usize, NetworkError> {
        let router = self.router.as_ref().ok_or(NetworkError::NotPrepared)?;
        Ok(router.route_outgoing(tid, source, event, &self.models, sink)?)
    }

    /// Deliver an event emitted by local device `ldid` to its targets on thread `tid`
    pub fn send_from_device<E: Clone>(
        &self,
        tid: usize,
        ldid: usize,
        event: &E,
        sink: &mut impl EventSink<E>,
    ) -> Result<usize, NetworkError> {
        let router = self.router.as_ref().ok_or(NetworkError::NotPrepared)?;
        Ok(router.route_incoming(tid, ldid, event, &self.models, sink)?)
    }

    /// Drop all nodes, connections and models
    pub fn reset(&mut self) {
        *self = Self::new(self.layout, self.seed);
        debug!("Network reset on rank {}", self.layout.rank());
    }

    pub fn timing(&self) -> TimingSummary {
        TimingSummary {
            create: self.timers.create.elapsed(TimeUnit::Seconds),
            connect: self.timers.connect.elapsed(TimeUnit::Seconds),
            prepare: self.timers.prepare.elapsed(TimeUnit::Seconds),
            connect_detailed: self.timers.connect_detailed.elapsed(TimeUnit::Seconds),
        }
    }

    pub fn summary(&self) -> NetworkSummary {
        let local_devices = self
            .registry
            .iter()
            .filter(|entry| entry.node().kind() == NodeKind::Device)
            .count();
        NetworkSummary {
            rank: self.layout.rank(),
            ranks: self.layout.num_ranks(),
            threads: self.layout.threads_per_rank(),
            max_gid: self.registry.get_max_gid(),
            local_nodes: self.registry.size(),
            local_devices,
            connections: self.connections.num_connections(),
            connections_per_thread: self.connections.store().threads().iter().map(|t| t.len()).collect(),
            populations: self.populations.iter().map(|(name, nodes)| (name.clone(), nodes.len())).collect(),
            timing: self.timing(),
        }
    }
}
