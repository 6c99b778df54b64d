//! `one_to_one`: the i-th source connects to the i-th target.

use crate::connection::builder::{BipartiteRule, BuilderArgs, BuilderBase, ConnBuilder};
use crate::connection::error::BuildError;
use crate::connection::sink::ThreadSink;

pub const RULE: &str = "one_to_one";

#[derive(Debug)]
pub struct OneToOneBuilder {
    base: BuilderBase,
}

impl BipartiteRule for OneToOneBuilder {
    fn from_args(mut args: BuilderArgs<'_>) -> Result<Self, BuildError> {
        let base = BuilderBase::read(&mut args, true)?;
        args.params.finish()?;

        if base.sources.len() != base.targets.len() {
            return Err(BuildError::SizeMismatch {
                rule: RULE.to_string(),
                sources: base.sources.len(),
                targets: base.targets.len(),
            });
        }
        Ok(Self { base })
    }
}

impl ConnBuilder for OneToOneBuilder {
    fn rule(&self) -> &'static str {
        RULE
    }

    fn connect_thread(&self, sink: &mut ThreadSink<'_>) -> Result<(), BuildError> {
        let base = &self.base;
        for (source, target) in base.sources.iter().zip(base.targets.iter()) {
            if base.is_forbidden_autapse(source, target) {
                continue;
            }
            sink.connect(source, target, &base.synapse);
            if base.make_symmetric && source.gid != target.gid {
                sink.connect(target, source, &base.synapse);
            }
        }
        Ok(())
    }
}
