//! `pairwise_bernoulli`: each source/target pair is connected independently
//! with probability `p`. Every pair is considered once, so no multapses
//! are created.

use rand::Rng;

use crate::connection::builder::{BipartiteRule, BuilderArgs, BuilderBase, ConnBuilder};
use crate::connection::error::BuildError;
use crate::connection::rng::keyed_rng;
use crate::connection::sink::ThreadSink;

pub const RULE: &str = "pairwise_bernoulli";

#[derive(Debug)]
pub struct BernoulliBuilder {
    base: BuilderBase,
    p: f64,
}

impl BipartiteRule for BernoulliBuilder {
    fn from_args(mut args: BuilderArgs<'_>) -> Result<Self, BuildError> {
        let base = BuilderBase::read(&mut args, false)?;
        let p = args.params.probability_or("p", 1.0)?;
        args.params.finish()?;
        Ok(Self { base, p })
    }
}

impl ConnBuilder for BernoulliBuilder {
    fn rule(&self) -> &'static str {
        RULE
    }

    fn connect_thread(&self, sink: &mut ThreadSink<'_>) -> Result<(), BuildError> {
        let base = &self.base;
        for target in base.targets.iter() {
            if !sink.handles_target(target) {
                continue;
            }
            let mut rng = keyed_rng(base.seed, target.gid);
            for source in base.sources.iter() {
                let draw: f64 = rng.gen();
                if base.is_forbidden_autapse(source, target) || draw >= self.p {
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

    #[test]
    fn test_certain_and_impossible() {
        let spec = ConnSpec::new(RULE).with("p", 1.0);
        let builder: BernoulliBuilder = build(&spec, &neurons(1, 6), &neurons(7, 12)).unwrap();
        assert_eq!(run(&builder, 4).len(), 36);

        let spec = ConnSpec::new(RULE).with("p", 0.0);
        let builder: BernoulliBuilder = build(&spec, &neurons(1, 6), &neurons(7, 12)).unwrap();
        assert!(run(&builder, 4).is_empty());
    }

    #[test]
    fn test_connection_count_near_expectation() {
        let spec = ConnSpec::new(RULE).with("p", 0.25);
        let builder: BernoulliBuilder = build(&spec, &neurons(1, 100), &neurons(101, 200)).unwrap();
        let n = run(&builder, 2).len();
        // Expect 2500 with standard deviation ~43
        assert!((2200..2800).contains(&n), "got {} connections", n);
    }

    #[test]
    fn test_invalid_probability() {
        let spec = ConnSpec::new(RULE).with("p", 1.2);
        assert!(matches!(
            build::<BernoulliBuilder>(&spec, &neurons(1, 2), &neurons(1, 2)),
            Err(BuildError::BadParameter { .. })
        ));
    }

    #[test]
    fn test_same_result_for_any_thread_count() {
        let spec = ConnSpec::new(RULE).with("p", 0.3).with("allow_autapses", false);
        let pop = neurons(1, 40);
        let builder: BernoulliBuilder = build(&spec, &pop, &pop).unwrap();
        let single = run(&builder, 1);
        assert!(single.iter().all(|(s, t)| s != t));
        assert_eq!(single, run(&builder, 3));
    }
}
