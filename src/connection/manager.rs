//! Connect calls of one rank.
//!
//! The manager resolves the synapse specification, asks the rule registry
//! for a builder and runs it on every local thread. Each call derives its
//! own seed from the network seed and a call counter, so ranks that issue
//! the same sequence of calls make the same random decisions.

use std::collections::HashSet;
use std::sync::Arc;

use rayon::prelude::*;

use super::builder::ThirdFactorBuilder;
use super::error::{BuildError, ConnectError};
use super::registry::{builtin_rules, ConnectionRuleRegistry};
use super::rng::{keyed_rng, mix};
use super::sink::{ConnectionStore, ThirdHook, ThreadSink};
use super::types::{ConnSpec, Connection, SynSpec, SynapseParams, TripartiteSynSpec};
use crate::model::{SynapseModelCatalogue, SynapseModelId};
use crate::node::{Gid, NodeCollection, NodeInfo, VpLayout};

/// Resolve a synapse specification against the model catalogue
pub fn resolve_synapse(syn: &SynSpec, models: &SynapseModelCatalogue) -> Result<SynapseParams, BuildError> {
    let model = models
        .id_of(&syn.synapse_model)
        .ok_or_else(|| BuildError::UnknownSynapseModel {
            name: syn.synapse_model.clone(),
        })?;
    if let Some(delay) = syn.delay {
        if delay <= 0.0 || delay.is_nan() {
            return Err(BuildError::InvalidDelay { delay });
        }
    }
    Ok(SynapseParams {
        model,
        weight: syn.weight,
        delay: syn.delay,
    })
}

pub struct ConnectionManager {
    layout: VpLayout,
    rules: Arc<ConnectionRuleRegistry>,
    store: ConnectionStore,
    seed: u64,
    calls: u64,
    /// `pre -> third` connections whose third-factor node lives on another rank
    remote: Vec<Connection>,
}

impl ConnectionManager {
    /// Manager using the built-in rules
    pub fn new(layout: VpLayout, seed: u64) -> Self {
        Self::with_rules(layout, builtin_rules(), seed)
    }

    pub fn with_rules(layout: VpLayout, rules: Arc<ConnectionRuleRegistry>, seed: u64) -> Self {
        Self {
            layout,
            rules,
            store: ConnectionStore::new(layout.threads_per_rank()),
            seed,
            calls: 0,
            remote: Vec::new(),
        }
    }

    pub fn layout(&self) -> &VpLayout {
        &self.layout
    }

    pub fn rules(&self) -> &ConnectionRuleRegistry {
        &self.rules
    }

    pub fn store(&self) -> &ConnectionStore {
        &self.store
    }

    fn next_seed(&mut self) -> u64 {
        self.calls += 1;
        mix(self.seed, self.calls)
    }

    /// Connect `sources` to `targets` with the rule named in `conn`.
    ///
    /// Returns the number of connections stored on this rank. On error the
    /// store may hold part of the call's connections and must be cleared.
    pub fn connect(
        &mut self,
        sources: &NodeCollection,
        targets: &NodeCollection,
        conn: &ConnSpec,
        syn: &SynSpec,
        models: &SynapseModelCatalogue,
    ) -> Result<usize, ConnectError> {
        let synapse = resolve_synapse(syn, models)?;
        let seed = self.next_seed();
        let builder = self.rules.create(conn, sources, targets, synapse, seed)?;
        let created = builder.connect(&self.layout, &mut self.store)?;
        log::debug!(
            "{}: {} -> {} nodes, {} connections on rank {}",
            builder.rule(),
            sources.len(),
            targets.len(),
            created,
            self.layout.rank()
        );
        Ok(created)
    }

    /// Connect `sources` to `targets` with the primary rule and wire in
    /// third-factor nodes chosen by the third-factor rule.
    ///
    /// Creates `pre -> post` through `conn`, and for every primary
    /// connection selected by `third_conn` also `third -> post` and
    /// `pre -> third`. `pre -> third` connections onto third-factor nodes of
    /// other ranks are kept aside, see [`take_remote_connections`].
    ///
    /// [`take_remote_connections`]: ConnectionManager::take_remote_connections
    #[allow(clippy::too_many_arguments)]
    pub fn tripartite_connect(
        &mut self,
        sources: &NodeCollection,
        targets: &NodeCollection,
        third: &NodeCollection,
        conn: &ConnSpec,
        third_conn: &ConnSpec,
        syn: &TripartiteSynSpec,
        models: &SynapseModelCatalogue,
    ) -> Result<usize, ConnectError> {
        if conn.flag("make_symmetric") {
            return Err(BuildError::SymmetricUnsupported { rule: conn.rule.clone() }.into());
        }
        if sources.has_devices() || targets.has_devices() || third.has_devices() {
            return Err(BuildError::IncompatiblePopulation {
                rule: third_conn.rule.clone(),
                reason: "tripartite connections are only defined between neurons".to_string(),
            }
            .into());
        }

        let primary = resolve_synapse(&syn.primary, models)?;
        let third_in = resolve_synapse(&syn.third_in, models)?;
        let third_out = resolve_synapse(&syn.third_out, models)?;

        let seed = self.next_seed();
        let builder = self.rules.create(conn, sources, targets, primary, seed)?;
        let third_builder = self.rules.create_third_factor(third_conn, targets, third, mix(seed, u64::MAX))?;
        let third_ref: &dyn ThirdFactorBuilder = third_builder.as_ref();
        let third_seed = mix(seed, u64::MAX - 1);

        // Primary and third -> post connections, stored with their target
        let layout = &self.layout;
        let per_thread = self
            .store
            .threads_mut()
            .par_iter_mut()
            .enumerate()
            .map(|(tid, out)| {
                let vp = (layout.rank() * layout.threads_per_rank() + tid) as u64;
                let hook = ThirdHook::new(third_ref, keyed_rng(third_seed, vp), third_out);
                let mut sink = ThreadSink::with_third(tid, layout, out, hook);
                builder.connect_thread(&mut sink)?;
                let emitted = sink.emitted();
                Ok((emitted, sink.into_pending()))
            })
            .collect::<Result<Vec<_>, BuildError>>()?;

        let mut created = 0;
        let mut local = Vec::new();
        let mut remote = 0;
        for (emitted, pending) in per_thread {
            created += emitted;
            for (pre, third_node) in pending {
                if layout.is_local(third_node) {
                    local.push((pre, third_node));
                } else {
                    self.remote.push(Connection::new(pre.gid, third_node.gid, &third_in));
                    remote += 1;
                }
            }
        }

        // pre -> third connections, stored with the third-factor node
        created += self.store_pairs(&local, &third_in);

        log::debug!(
            "{} + {}: {} -> {} nodes via {} third-factor nodes, {} connections on rank {} ({} pending for other ranks)",
            builder.rule(),
            third_ref.rule(),
            sources.len(),
            targets.len(),
            third.len(),
            created,
            self.layout.rank(),
            remote
        );
        Ok(created)
    }

    fn store_pairs(&mut self, pairs: &[(NodeInfo, NodeInfo)], synapse: &SynapseParams) -> usize {
        let layout = &self.layout;
        self.store
            .threads_mut()
            .par_iter_mut()
            .enumerate()
            .map(|(tid, out)| {
                let mut stored = 0;
                for &(source, target) in pairs {
                    if layout.storing_thread(source, target) == Some(tid) {
                        out.push(Connection::new(source.gid, target.gid, synapse));
                        stored += 1;
                    }
                }
                stored
            })
            .sum()
    }

    /// Hand out the connections that belong to other ranks
    pub fn take_remote_connections(&mut self) -> Vec<Connection> {
        std::mem::take(&mut self.remote)
    }

    /// Store neuron-to-neuron connections created by other ranks.
    ///
    /// Connections whose target is not local to this rank are skipped.
    /// Returns the number stored.
    pub fn accept_remote_connections(&mut self, connections: &[Connection]) -> usize {
        let layout = &self.layout;
        self.store
            .threads_mut()
            .par_iter_mut()
            .enumerate()
            .map(|(tid, out)| {
                let mut stored = 0;
                for connection in connections {
                    if layout.local_thread(NodeInfo::neuron(connection.target)) == Some(tid) {
                        out.push(*connection);
                        stored += 1;
                    }
                }
                stored
            })
            .sum()
    }

    /// Local connections matching all given filters
    pub fn get_connections(
        &self,
        sources: Option<&NodeCollection>,
        targets: Option<&NodeCollection>,
        synapse: Option<SynapseModelId>,
    ) -> Vec<Connection> {
        let sources: Option<HashSet<Gid>> = sources.map(|s| s.iter().map(|n| n.gid).collect());
        let targets: Option<HashSet<Gid>> = targets.map(|t| t.iter().map(|n| n.gid).collect());
        self.store
            .iter()
            .filter(|c| sources.as_ref().map_or(true, |s| s.contains(&c.source)))
            .filter(|c| targets.as_ref().map_or(true, |t| t.contains(&c.target)))
            .filter(|c| synapse.map_or(true, |id| c.synapse == id))
            .copied()
            .collect()
    }

    pub fn num_connections(&self) -> usize {
        self.store.len()
    }

    /// Drop all connections and restart the call counter
    pub fn clear(&mut self) {
        self.store.clear();
        self.remote.clear();
        self.calls = 0;
    }
}
