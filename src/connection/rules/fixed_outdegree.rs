//! `fixed_outdegree`: every source makes exactly `outdegree` connections to
//! randomly drawn targets.
//!
//! The draw for a source is made on every thread from the same keyed
//! stream; each thread keeps the connections whose target it owns.

use super::{check_degree, draw_partners};
use crate::connection::builder::{BipartiteRule, BuilderArgs, BuilderBase, ConnBuilder};
use crate::connection::error::BuildError;
use crate::connection::rng::keyed_rng;
use crate::connection::sink::ThreadSink;

pub const RULE: &str = "fixed_outdegree";

#[derive(Debug)]
pub struct FixedOutDegreeBuilder {
    base: BuilderBase,
    outdegree: usize,
}

impl BipartiteRule for FixedOutDegreeBuilder {
    fn from_args(mut args: BuilderArgs<'_>) -> Result<Self, BuildError> {
        let base = BuilderBase::read(&mut args, false)?;
        let outdegree = args.params.count("outdegree")?;
        args.params.finish()?;

        if !base.sources.is_empty() {
            check_degree(&base, RULE, "outdegree", outdegree, base.targets.len())?;
        }
        Ok(Self { base, outdegree })
    }
}

impl ConnBuilder for FixedOutDegreeBuilder {
    fn rule(&self) -> &'static str {
        RULE
    }

    fn connect_thread(&self, sink: &mut ThreadSink<'_>) -> Result<(), BuildError> {
        let base = &self.base;
        for source in base.sources.iter() {
            let mut rng = keyed_rng(base.seed, source.gid);
            let exclude = (!base.allow_autapses).then_some(source.gid);
            for target in draw_partners(&mut rng, &base.targets, self.outdegree, exclude, base.allow_multapses) {
                sink.connect(source, target, &base.synapse);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::rules::test_support::{build, neurons, run};
    use crate::connection::types::ConnSpec;
    use std::collections::HashMap;

    #[test]
    fn test_every_source_gets_outdegree() {
        let spec = ConnSpec::new(RULE)
            .with("outdegree", 10)
            .with("allow_autapses", false)
            .with("allow_multapses", false);
        let builder: FixedOutDegreeBuilder = build(&spec, &neurons(1, 50), &neurons(51, 120)).unwrap();
        let pairs = run(&builder, 3);

        let mut per_source: HashMap<u64, usize> = HashMap::new();
        for (s, t) in &pairs {
            assert!((51..=120).contains(t));
            *per_source.entry(*s).or_default() += 1;
        }
        assert_eq!(per_source.len(), 50);
        assert!(per_source.values().all(|&n| n == 10));
    }

    #[test]
    fn test_threads_agree_on_draws() {
        let spec = ConnSpec::new(RULE).with("outdegree", 4).with("allow_multapses", false);
        let builder: FixedOutDegreeBuilder = build(&spec, &neurons(1, 30), &neurons(31, 60)).unwrap();
        let single = run(&builder, 1);
        assert_eq!(single.len(), 120);
        assert_eq!(single, run(&builder, 4));
    }

    #[test]
    fn test_outdegree_above_population_without_multapses_fails() {
        let spec = ConnSpec::new(RULE)
            .with("outdegree", 71)
            .with("allow_autapses", true)
            .with("allow_multapses", false);
        assert!(matches!(
            build::<FixedOutDegreeBuilder>(&spec, &neurons(1, 50), &neurons(51, 120)),
            Err(BuildError::DegreeTooLarge { param: "outdegree", .. })
        ));
    }
}
