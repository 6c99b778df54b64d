//! Built-in connection rules.
//!
//! Bipartite rules:
//!
//! - `one_to_one`: pair sources and targets by position
//! - `all_to_all`: every source to every target
//! - `fixed_indegree`: draw `indegree` sources for every target
//! - `fixed_outdegree`: draw `outdegree` targets for every source
//! - `fixed_total_number`: draw `N` source/target pairs overall
//! - `pairwise_bernoulli`: connect every pair with probability `p`
//!
//! Third-factor rules:
//!
//! - `third_factor_bernoulli_with_pool`: attach a third-factor node from the
//!   target's pool to a primary connection with probability `p`

pub mod all_to_all;
pub mod fixed_indegree;
pub mod fixed_outdegree;
pub mod fixed_total_number;
pub mod one_to_one;
pub mod pairwise_bernoulli;
pub mod third_factor;

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::Rng;

use super::builder::BuilderBase;
use super::error::BuildError;
use crate::node::{Gid, NodeCollection, NodeInfo};

pub use all_to_all::AllToAllBuilder;
pub use fixed_indegree::FixedInDegreeBuilder;
pub use fixed_outdegree::FixedOutDegreeBuilder;
pub use fixed_total_number::FixedTotalNumberBuilder;
pub use one_to_one::OneToOneBuilder;
pub use pairwise_bernoulli::BernoulliBuilder;
pub use third_factor::{PoolType, ThirdBernoulliWithPoolBuilder};

/// Reject a per-node degree that cannot be satisfied from a pool of
/// `pool_len` partners
fn check_degree(
    base: &BuilderBase,
    rule: &str,
    param: &'static str,
    degree: usize,
    pool_len: usize,
) -> Result<(), BuildError> {
    let excluded = usize::from(!base.allow_autapses && base.overlap() > 0);
    let available = pool_len.saturating_sub(excluded);
    let too_large = if base.allow_multapses {
        degree > 0 && available == 0
    } else {
        degree > available
    };
    if too_large {
        return Err(BuildError::DegreeTooLarge {
            rule: rule.to_string(),
            param,
            requested: degree,
            available,
        });
    }
    Ok(())
}

/// Draw `count` partners from `pool`, skipping `exclude`.
///
/// Without multapses every pool position is drawn at most once. The caller
/// guarantees enough partners are available.
fn draw_partners(
    rng: &mut StdRng,
    pool: &NodeCollection,
    count: usize,
    exclude: Option<Gid>,
    allow_multapses: bool,
) -> Vec<NodeInfo> {
    let mut chosen = Vec::with_capacity(count);
    let mut taken = HashSet::new();
    while chosen.len() < count {
        let idx = rng.gen_range(0..pool.len());
        let node = pool[idx];
        if Some(node.gid) == exclude {
            continue;
        }
        if !allow_multapses && !taken.insert(idx) {
            continue;
        }
        chosen.push(node);
    }
    chosen
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::connection::builder::{BipartiteRule, BuilderArgs};
    use crate::connection::error::BuildError;
    use crate::connection::params::ParamReader;
    use crate::connection::sink::ConnectionStore;
    use crate::connection::types::{ConnSpec, SynapseParams};
    use crate::node::{Gid, NodeCollection, NodeKind, VpLayout};

    pub fn neurons(first: Gid, last: Gid) -> NodeCollection {
        NodeCollection::range(first, last, NodeKind::Neuron)
    }

    pub fn build<B: BipartiteRule>(
        spec: &ConnSpec,
        sources: &NodeCollection,
        targets: &NodeCollection,
    ) -> Result<B, BuildError> {
        B::from_args(BuilderArgs {
            sources,
            targets,
            params: ParamReader::new(&spec.rule, &spec.params),
            synapse: SynapseParams::new(0),
            seed: 1234,
        })
    }

    /// Run a builder on `threads` threads and return all `(source, target)`
    /// pairs, sorted
    pub fn run<B: BipartiteRule>(builder: &B, threads: usize) -> Vec<(Gid, Gid)> {
        let layout = VpLayout::single_rank(threads);
        let mut store = ConnectionStore::new(threads);
        let created = builder.connect(&layout, &mut store).unwrap();
        assert_eq!(created, store.len());
        let mut pairs: Vec<(Gid, Gid)> = store.iter().map(|c| (c.source, c.target)).collect();
        pairs.sort_unstable();
        pairs
    }
}
