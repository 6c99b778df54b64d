//! `third_factor_bernoulli_with_pool`: attaches a third-factor node to
//! primary connections.
//!
//! Every target owns a pool of third-factor candidates. For each primary
//! connection `pre -> post` a Bernoulli trial with probability `p` decides
//! whether a third-factor node, drawn uniformly from `post`'s pool, is wired
//! in as `pre -> third -> post`.
//!
//! Pools are either `random` (`pool_size` distinct candidates drawn per
//! target) or `block` (consecutive blocks of the third population assigned
//! to targets in order).

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::index;
use rand::Rng;

use crate::connection::builder::{ThirdArgs, ThirdFactorBuilder, ThirdFactorRule};
use crate::connection::error::BuildError;
use crate::connection::rng::keyed_rng;
use crate::node::{Gid, NodeCollection, NodeInfo};

pub const RULE: &str = "third_factor_bernoulli_with_pool";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolType {
    Random,
    Block,
}

#[derive(Debug)]
pub struct ThirdBernoulliWithPoolBuilder {
    third: NodeCollection,
    p: f64,
    pool_type: PoolType,
    pool_size: usize,
    /// Block pools of size one: number of consecutive targets sharing a third node
    targets_per_third: usize,
    /// Position of every target GID in the target population
    target_index: HashMap<Gid, usize>,
    seed: u64,
}

impl ThirdBernoulliWithPoolBuilder {
    pub fn pool_type(&self) -> PoolType {
        self.pool_type
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    fn incompatible(reason: String) -> BuildError {
        BuildError::IncompatiblePopulation {
            rule: RULE.to_string(),
            reason,
        }
    }

    /// Pool of `target`, as indices into the third population
    fn pool_of(&self, target: NodeInfo) -> Option<Vec<usize>> {
        match self.pool_type {
            PoolType::Random => {
                let mut rng = keyed_rng(self.seed, target.gid);
                Some(index::sample(&mut rng, self.third.len(), self.pool_size).into_vec())
            }
            PoolType::Block => {
                let idx = *self.target_index.get(&target.gid)?;
                if self.pool_size == 1 {
                    Some(vec![idx / self.targets_per_third])
                } else {
                    let first = idx * self.pool_size;
                    Some((first..first + self.pool_size).collect())
                }
            }
        }
    }
}

impl ThirdFactorRule for ThirdBernoulliWithPoolBuilder {
    fn from_args(mut args: ThirdArgs<'_>) -> Result<Self, BuildError> {
        let p = args.params.probability_or("p", 1.0)?;
        let pool_type = match args.params.text_or("pool_type", "random")? {
            "random" => PoolType::Random,
            "block" => PoolType::Block,
            other => {
                return Err(BuildError::BadParameter {
                    rule: RULE.to_string(),
                    key: "pool_type".to_string(),
                    reason: format!("expected 'random' or 'block', got '{}'", other),
                })
            }
        };
        let pool_size = args.params.count_or("pool_size", 1)?;
        args.params.finish()?;

        let n_third = args.third.len();
        let n_targets = args.targets.len();
        if n_third == 0 {
            return Err(Self::incompatible("third-factor population is empty".to_string()));
        }
        if pool_size < 1 || pool_size > n_third {
            return Err(BuildError::BadParameter {
                rule: RULE.to_string(),
                key: "pool_size".to_string(),
                reason: format!("must be between 1 and {} (third-factor population size)", n_third),
            });
        }

        let mut targets_per_third = 1;
        if pool_type == PoolType::Block {
            if pool_size == 1 {
                if n_targets % n_third != 0 {
                    return Err(Self::incompatible(format!(
                        "block pools of size 1 require the number of targets ({}) to be a multiple of the third-factor population size ({})",
                        n_targets, n_third
                    )));
                }
                targets_per_third = (n_targets / n_third).max(1);
            } else if n_targets * pool_size != n_third {
                return Err(Self::incompatible(format!(
                    "block pools of size {} require targets * pool_size ({}) to equal the third-factor population size ({})",
                    pool_size,
                    n_targets * pool_size,
                    n_third
                )));
            }
        }

        let mut target_index = HashMap::with_capacity(n_targets);
        for (idx, target) in args.targets.iter().enumerate() {
            target_index.entry(target.gid).or_insert(idx);
        }

        Ok(Self {
            third: args.third.clone(),
            p,
            pool_type,
            pool_size,
            targets_per_third,
            target_index,
            seed: args.seed,
        })
    }
}

impl ThirdFactorBuilder for ThirdBernoulliWithPoolBuilder {
    fn rule(&self) -> &'static str {
        RULE
    }

    fn third(&self) -> &NodeCollection {
        &self.third
    }

    fn third_connect(&self, _source: NodeInfo, target: NodeInfo, rng: &mut StdRng) -> Option<NodeInfo> {
        if rng.gen::<f64>() >= self.p {
            return None;
        }
        let pool = self.pool_of(target)?;
        let pick = pool[rng.gen_range(0..pool.len())];
        self.third.get(pick)
    }
}
