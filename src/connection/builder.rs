//! Builder traits.
//!
//! A builder is created for a single connect call, bound to its source and
//! target populations and configuration, and discarded afterwards. Builders
//! are shared read-only between worker threads; each thread runs
//! [`ConnBuilder::connect_thread`] against its own [`ThreadSink`].

use std::collections::HashSet;

use rand::rngs::StdRng;
use rayon::prelude::*;

use super::error::BuildError;
use super::params::ParamReader;
use super::sink::{ConnectionStore, ThreadSink};
use super::types::SynapseParams;
use crate::node::{Gid, NodeCollection, NodeInfo, VpLayout};

/// Inputs of a bipartite rule
pub struct BuilderArgs<'a> {
    pub sources: &'a NodeCollection,
    pub targets: &'a NodeCollection,
    pub params: ParamReader<'a>,
    pub synapse: SynapseParams,
    pub seed: u64,
}

/// Inputs of a third-factor rule
pub struct ThirdArgs<'a> {
    /// Target population of the primary rule
    pub targets: &'a NodeCollection,
    pub third: &'a NodeCollection,
    pub params: ParamReader<'a>,
    pub seed: u64,
}

/// One connection-generation algorithm bound to one connect call
pub trait ConnBuilder: Send + Sync {
    fn rule(&self) -> &'static str;

    /// Emit the connections owned by the sink's thread
    fn connect_thread(&self, sink: &mut ThreadSink<'_>) -> Result<(), BuildError>;

    /// Run the builder on every thread in parallel, returning the number of
    /// connections created
    fn connect(&self, layout: &VpLayout, store: &mut ConnectionStore) -> Result<usize, BuildError> {
        let per_thread = store
            .threads_mut()
            .par_iter_mut()
            .enumerate()
            .map(|(tid, out)| {
                let mut sink = ThreadSink::new(tid, layout, out);
                self.connect_thread(&mut sink)?;
                Ok(sink.emitted())
            })
            .collect::<Result<Vec<usize>, BuildError>>()?;
        Ok(per_thread.into_iter().sum())
    }
}

/// A bipartite rule that can be registered by type
pub trait BipartiteRule: ConnBuilder + Sized + 'static {
    fn from_args(args: BuilderArgs<'_>) -> Result<Self, BuildError>;
}

/// Chooses third-factor partners for primary connections
pub trait ThirdFactorBuilder: Send + Sync {
    fn rule(&self) -> &'static str;

    fn third(&self) -> &NodeCollection;

    /// Called for every primary connection `source -> target` on the thread
    /// storing it. Returns the third-factor node to wire in, if any.
    fn third_connect(&self, source: NodeInfo, target: NodeInfo, rng: &mut StdRng) -> Option<NodeInfo>;
}

/// A third-factor rule that can be registered by type
pub trait ThirdFactorRule: ThirdFactorBuilder + Sized + 'static {
    fn from_args(args: ThirdArgs<'_>) -> Result<Self, BuildError>;
}

/// Settings shared by all bipartite rules
#[derive(Debug, Clone)]
pub struct BuilderBase {
    pub sources: NodeCollection,
    pub targets: NodeCollection,
    pub synapse: SynapseParams,
    pub seed: u64,
    pub allow_autapses: bool,
    pub allow_multapses: bool,
    pub make_symmetric: bool,
}

impl BuilderBase {
    /// Read the common keys from `args`
    pub fn read(args: &mut BuilderArgs<'_>, supports_symmetric: bool) -> Result<Self, BuildError> {
        let allow_autapses = args.params.bool_or("allow_autapses", true)?;
        let allow_multapses = args.params.bool_or("allow_multapses", true)?;
        let make_symmetric = args.params.bool_or("make_symmetric", false)?;
        if make_symmetric && !supports_symmetric {
            return Err(BuildError::SymmetricUnsupported {
                rule: args.params.rule().to_string(),
            });
        }
        Ok(Self {
            sources: args.sources.clone(),
            targets: args.targets.clone(),
            synapse: args.synapse,
            seed: args.seed,
            allow_autapses,
            allow_multapses,
            make_symmetric,
        })
    }

    pub fn is_forbidden_autapse(&self, source: NodeInfo, target: NodeInfo) -> bool {
        !self.allow_autapses && source.gid == target.gid
    }

    /// Number of nodes present in both populations
    pub fn overlap(&self) -> usize {
        let sources: HashSet<Gid> = self.sources.iter().map(|n| n.gid).collect();
        self.targets.iter().filter(|n| sources.contains(&n.gid)).count()
    }
}
