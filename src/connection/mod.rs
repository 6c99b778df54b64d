//! Connection construction.
//!
//! Connect calls are specified by a rule name plus rule-specific
//! parameters ([`ConnSpec`]) and a synapse specification ([`SynSpec`]).
//! The [`ConnectionRuleRegistry`] maps rule names to builder factories;
//! the [`ConnectionManager`] runs the resulting builder on every local
//! thread and owns the per-thread [`ConnectionStore`].

pub mod builder;
pub mod error;
pub mod manager;
pub mod params;
pub mod registry;
pub mod rng;
pub mod rules;
pub mod sink;
pub mod types;

// Re-export commonly used types
pub use builder::{BipartiteRule, BuilderArgs, ConnBuilder, ThirdArgs, ThirdFactorBuilder, ThirdFactorRule};
pub use error::{BuildError, ConnectError, RuleError};
pub use manager::{resolve_synapse, ConnectionManager};
pub use params::ParamReader;
pub use registry::{builtin_rules, ConnectionRuleRegistry, RuleId, RuleTable};
pub use sink::{ConnectionStore, ThreadConnections, ThreadSink};
pub use types::{ConnParams, ConnSpec, Connection, ParamValue, SynSpec, SynapseParams, TripartiteSynSpec};
