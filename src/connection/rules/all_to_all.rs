//! `all_to_all`: every source connects to every target.

use crate::connection::builder::{BipartiteRule, BuilderArgs, BuilderBase, ConnBuilder};
use crate::connection::error::BuildError;
use crate::connection::sink::ThreadSink;

pub const RULE: &str = "all_to_all";

#[derive(Debug)]
pub struct AllToAllBuilder {
    base: BuilderBase,
}

impl BipartiteRule for AllToAllBuilder {
    fn from_args(mut args: BuilderArgs<'_>) -> Result<Self, BuildError> {
        let base = BuilderBase::read(&mut args, true)?;
        args.params.finish()?;

        // All pairs are already present in both directions when the
        // populations coincide; anything else cannot be made symmetric.
        if base.make_symmetric && base.sources != base.targets {
            return Err(BuildError::IncompatiblePopulation {
                rule: RULE.to_string(),
                reason: "make_symmetric requires identical source and target populations".to_string(),
            });
        }
        Ok(Self { base })
    }
}

impl ConnBuilder for AllToAllBuilder {
    fn rule(&self) -> &'static str {
        RULE
    }

    fn connect_thread(&self, sink: &mut ThreadSink<'_>) -> Result<(), BuildError> {
        let base = &self.base;
        for target in base.targets.iter() {
            if !sink.handles_target(target) {
                continue;
            }
            for source in base.sources.iter() {
                if base.is_forbidden_autapse(source, target) {
                    continue;
                }
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
    use crate::node::{NodeCollection, NodeInfo};

    #[test]
    fn test_every_ordered_pair() {
        let spec = ConnSpec::new(RULE);
        let builder: AllToAllBuilder = build(&spec, &neurons(1, 3), &neurons(4, 7)).unwrap();
        let pairs = run(&builder, 4);
        assert_eq!(pairs.len(), 12);
        for s in 1..=3 {
            for t in 4..=7 {
                assert!(pairs.contains(&(s, t)));
            }
        }
    }

    #[test]
    fn test_without_autapses() {
        let spec = ConnSpec::new(RULE).with("allow_autapses", false);
        let pop = neurons(1, 5);
        let builder: AllToAllBuilder = build(&spec, &pop, &pop).unwrap();
        let pairs = run(&builder, 2);
        assert_eq!(pairs.len(), 20);
        assert!(pairs.iter().all(|(s, t)| s != t));
    }

    #[test]
    fn test_device_target_collected_from_all_threads() {
        let spec = ConnSpec::new(RULE);
        let recorder = NodeCollection::new(vec![NodeInfo::device(20)]);
        let builder: AllToAllBuilder = build(&spec, &neurons(1, 6), &recorder).unwrap();
        let pairs = run(&builder, 3);
        assert_eq!(pairs, (1..=6).map(|s| (s, 20)).collect::<Vec<_>>());
    }

    #[test]
    fn test_symmetric_needs_identical_populations() {
        let spec = ConnSpec::new(RULE).with("make_symmetric", true);
        assert!(build::<AllToAllBuilder>(&spec, &neurons(1, 3), &neurons(1, 3)).is_ok());
        assert!(matches!(
            build::<AllToAllBuilder>(&spec, &neurons(1, 3), &neurons(2, 4)),
            Err(BuildError::IncompatiblePopulation { .. })
        ));
    }
}
