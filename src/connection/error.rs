//! Connection construction errors.

/// Misuse of the rule registry
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    #[error("Connection rule '{name}' is already registered")]
    DuplicateRule { name: String },

    #[error("Unknown connection rule '{name}'")]
    UnknownRule { name: String },
}

/// A builder could not generate connections for its configuration.
///
/// Connections emitted before the failure are not removed; the network
/// must be discarded and rebuilt.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    #[error("Rule '{rule}' requires equally sized populations, got {sources} sources and {targets} targets")]
    SizeMismatch {
        rule: String,
        sources: usize,
        targets: usize,
    },

    #[error("Rule '{rule}': requested {param} {requested} exceeds the {available} available partners when multapses are not allowed")]
    DegreeTooLarge {
        rule: String,
        param: &'static str,
        requested: usize,
        available: usize,
    },

    #[error("Rule '{rule}': invalid value for '{key}': {reason}")]
    BadParameter {
        rule: String,
        key: String,
        reason: String,
    },

    #[error("Rule '{rule}' does not accept parameter(s): {}", .keys.join(", "))]
    UnknownParameters { rule: String, keys: Vec<String> },

    #[error("Rule '{rule}' cannot connect these populations: {reason}")]
    IncompatiblePopulation { rule: String, reason: String },

    #[error("Rule '{rule}' does not support make_symmetric")]
    SymmetricUnsupported { rule: String },

    #[error("Unknown synapse model '{name}'")]
    UnknownSynapseModel { name: String },

    #[error("Synapse delay must be positive, got {delay}")]
    InvalidDelay { delay: f64 },
}

/// Any failure of a connect call
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnectError {
    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Build(#[from] BuildError),
}
