//! `fixed_total_number`: exactly `N` connections between uniformly drawn
//! source/target pairs.

use std::collections::HashSet;

use rand::Rng;

use crate::connection::builder::{BipartiteRule, BuilderArgs, BuilderBase, ConnBuilder};
use crate::connection::error::BuildError;
use crate::connection::rng::keyed_rng;
use crate::connection::sink::ThreadSink;

pub const RULE: &str = "fixed_total_number";

#[derive(Debug)]
pub struct FixedTotalNumberBuilder {
    base: BuilderBase,
    total: usize,
}

impl BipartiteRule for FixedTotalNumberBuilder {
    fn from_args(mut args: BuilderArgs<'_>) -> Result<Self, BuildError> {
        let base = BuilderBase::read(&mut args, false)?;
        let total = args.params.count("N")?;
        args.params.finish()?;

        let pairs = base.sources.len() * base.targets.len();
        let available = if base.allow_autapses {
            pairs
        } else {
            pairs - base.overlap()
        };
        let too_large = if base.allow_multapses {
            total > 0 && available == 0
        } else {
            total > available
        };
        if too_large {
            return Err(BuildError::DegreeTooLarge {
                rule: RULE.to_string(),
                param: "N",
                requested: total,
                available,
            });
        }
        Ok(Self { base, total })
    }
}

impl ConnBuilder for FixedTotalNumberBuilder {
    fn rule(&self) -> &'static str {
        RULE
    }

    fn connect_thread(&self, sink: &mut ThreadSink<'_>) -> Result<(), BuildError> {
        let base = &self.base;
        if self.total == 0 {
            return Ok(());
        }
        // Every thread replays the same global draw and keeps its own share.
        let mut rng = keyed_rng(base.seed, 0);
        let mut taken = HashSet::new();
        let mut drawn = 0;
        while drawn < self.total {
            let si = rng.gen_range(0..base.sources.len());
            let ti = rng.gen_range(0..base.targets.len());
            let (source, target) = (base.sources[si], base.targets[ti]);
            if base.is_forbidden_autapse(source, target) {
                continue;
            }
            if !base.allow_multapses && !taken.insert((si, ti)) {
                continue;
            }
            drawn += 1;
            sink.connect(source, target, &base.synapse);
        }
        Ok(())
    }
}
