//! `fixed_indegree`: every target receives exactly `indegree` connections
//! from randomly drawn sources.

use super::{check_degree, draw_partners};
use crate::connection::builder::{BipartiteRule, BuilderArgs, BuilderBase, ConnBuilder};
use crate::connection::error::BuildError;
use crate::connection::rng::keyed_rng;
use crate::connection::sink::ThreadSink;

pub const RULE: &str = "fixed_indegree";

#[derive(Debug)]
pub struct FixedInDegreeBuilder {
    base: BuilderBase,
    indegree: usize,
}

impl BipartiteRule for FixedInDegreeBuilder {
    fn from_args(mut args: BuilderArgs<'_>) -> Result<Self, BuildError> {
        let base = BuilderBase::read(&mut args, false)?;
        let indegree = args.params.count("indegree")?;
        args.params.finish()?;

        if !base.targets.is_empty() {
            check_degree(&base, RULE, "indegree", indegree, base.sources.len())?;
        }
        Ok(Self { base, indegree })
    }
}

impl ConnBuilder for FixedInDegreeBuilder {
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
            let exclude = (!base.allow_autapses).then_some(target.gid);
            for source in draw_partners(&mut rng, &base.sources, self.indegree, exclude, base.allow_multapses) {
                sink.connect(source, target, &base.synapse);
            }
        }
        Ok(())
    }
}
