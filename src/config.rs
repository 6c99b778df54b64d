use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::connection::{ConnSpec, SynSpec, TripartiteSynSpec};
use crate::model::SynapseModel;
use crate::node::{NodeKind, VpLayout};

/// Network description that mirrors the YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub general: GeneralConfig,
    /// Synapse models added to the built-in `static_synapse`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synapse_models: Vec<SynapseModel>,
    /// Node populations, created in order
    pub populations: Vec<PopulationConfig>,
    /// Bipartite connect calls, issued in order
    #[serde(default)]
    pub projections: Vec<ProjectionConfig>,
    /// Tripartite connect calls, issued after all projections
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tripartite: Vec<TripartiteConfig>,
}

/// Process layout and seeding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Total number of ranks taking part in the simulation
    #[serde(default = "default_one")]
    pub ranks: usize,
    /// Rank of this process
    #[serde(default)]
    pub rank: usize,
    /// Worker threads per rank
    #[serde(default = "default_one")]
    pub threads: usize,
    /// Network seed; identical on every rank
    #[serde(default)]
    pub seed: u64,
}

fn default_one() -> usize {
    1
}

fn default_kind() -> NodeKind {
    NodeKind::Neuron
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    pub name: String,
    /// Node model name, e.g. "iaf_psc_alpha" or "spike_recorder"
    pub model: String,
    pub size: usize,
    #[serde(default = "default_kind")]
    pub kind: NodeKind,
}

/// One bipartite connect call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionConfig {
    pub source: String,
    pub target: String,
    pub conn: ConnSpec,
    #[serde(default)]
    pub syn: SynSpec,
}

/// One tripartite connect call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripartiteConfig {
    pub source: String,
    pub target: String,
    pub third: String,
    /// Primary rule connecting source to target
    pub conn: ConnSpec,
    /// Third-factor rule choosing third-factor nodes
    pub third_conn: ConnSpec,
    #[serde(default)]
    pub syn: TripartiteSynSpec,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let general = &self.general;
        if general.ranks == 0 {
            return Err(ValidationError::InvalidGeneral("ranks must be at least 1".to_string()));
        }
        if general.threads == 0 {
            return Err(ValidationError::InvalidGeneral("threads must be at least 1".to_string()));
        }
        if general.rank >= general.ranks {
            return Err(ValidationError::InvalidGeneral(format!(
                "rank {} out of range for {} ranks",
                general.rank, general.ranks
            )));
        }

        for model in &self.synapse_models {
            if model.name.is_empty() {
                return Err(ValidationError::InvalidSynapseModel("name cannot be empty".to_string()));
            }
            if model.default_delay <= 0.0 || model.default_delay.is_nan() {
                return Err(ValidationError::InvalidSynapseModel(format!(
                    "'{}': default_delay must be positive",
                    model.name
                )));
            }
        }

        let mut names = HashSet::new();
        for population in &self.populations {
            if population.name.is_empty() {
                return Err(ValidationError::InvalidPopulation("name cannot be empty".to_string()));
            }
            if population.model.is_empty() {
                return Err(ValidationError::InvalidPopulation(format!(
                    "'{}': model cannot be empty",
                    population.name
                )));
            }
            if !names.insert(population.name.as_str()) {
                return Err(ValidationError::InvalidPopulation(format!(
                    "duplicate population name '{}'",
                    population.name
                )));
            }
        }

        let check = |name: &str, role: &str, context: &str| {
            if names.contains(name) {
                Ok(())
            } else {
                Err(ValidationError::InvalidProjection(format!(
                    "{}: unknown {} population '{}'",
                    context, role, name
                )))
            }
        };
        for (i, projection) in self.projections.iter().enumerate() {
            let context = format!("projection {}", i);
            check(&projection.source, "source", &context)?;
            check(&projection.target, "target", &context)?;
        }
        for (i, tripartite) in self.tripartite.iter().enumerate() {
            let context = format!("tripartite projection {}", i);
            check(&tripartite.source, "source", &context)?;
            check(&tripartite.target, "target", &context)?;
            check(&tripartite.third, "third", &context)?;
        }

        Ok(())
    }

    /// Apply command-line overrides of the process layout
    pub fn apply_overrides(&mut self, rank: Option<usize>, threads: Option<usize>) {
        if let Some(rank) = rank {
            self.general.rank = rank;
        }
        if let Some(threads) = threads {
            self.general.threads = threads;
        }
    }

    /// Layout of this rank; call after [`Config::validate`]
    pub fn layout(&self) -> VpLayout {
        VpLayout::new(self.general.ranks, self.general.threads, self.general.rank)
    }

    /// Total number of nodes over all populations
    pub fn total_nodes(&self) -> usize {
        self.populations.iter().map(|p| p.size).sum()
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            ranks: 1,
            rank: 0,
            threads: 1,
            seed: 0,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid synapse model: {0}")]
    InvalidSynapseModel(String),
    #[error("Invalid population: {0}")]
    InvalidPopulation(String),
    #[error("Invalid projection: {0}")]
    InvalidProjection(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = r#"
general:
  threads: 2
  seed: 12
populations:
  - name: exc
    model: iaf_psc_alpha
    size: 80
  - name: inh
    model: iaf_psc_alpha
    size: 20
  - name: recorder
    model: spike_recorder
    size: 1
    kind: device
projections:
  - source: exc
    target: inh
    conn:
      rule: fixed_indegree
      indegree: 8
  - source: inh
    target: recorder
    conn:
      rule: all_to_all
    syn:
      weight: 1.0
"#;

    fn parse(yaml: &str) -> Config {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_parse_basic() {
        let config = parse(BASIC);
        assert!(config.validate().is_ok());
        assert_eq!(config.general.ranks, 1);
        assert_eq!(config.general.threads, 2);
        assert_eq!(config.populations[2].kind, NodeKind::Device);
        assert_eq!(config.populations[0].kind, NodeKind::Neuron);
        assert_eq!(config.projections[0].conn.rule, "fixed_indegree");
        assert_eq!(config.projections[1].syn.weight, Some(1.0));
        assert_eq!(config.total_nodes(), 101);
        assert_eq!(config.layout().num_vps(), 2);
    }

    #[test]
    fn test_unknown_population_rejected() {
        let mut config = parse(BASIC);
        config.projections[0].target = "missing".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidProjection(_)));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_duplicate_population_rejected() {
        let mut config = parse(BASIC);
        config.populations[1].name = "exc".to_string();
        assert!(matches!(config.validate(), Err(ValidationError::InvalidPopulation(_))));
    }

    #[test]
    fn test_layout_checks() {
        let mut config = parse(BASIC);
        config.general.threads = 0;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidGeneral(_))));

        let mut config = parse(BASIC);
        config.general.ranks = 2;
        config.apply_overrides(Some(2), None);
        assert!(config.validate().is_err());
        config.apply_overrides(Some(1), Some(4));
        assert!(config.validate().is_ok());
        assert_eq!(config.layout().num_vps(), 8);
    }

    #[test]
    fn test_tripartite_section() {
        let yaml = r#"
general: {}
populations:
  - { name: pre, model: iaf_psc_alpha, size: 4 }
  - { name: post, model: iaf_psc_alpha, size: 4 }
  - { name: astro, model: astrocyte, size: 4 }
tripartite:
  - source: pre
    target: post
    third: astro
    conn: { rule: one_to_one }
    third_conn: { rule: third_factor_bernoulli_with_pool, pool_type: block }
    syn:
      third_out: { synapse_model: sic_connection }
"#;
        let config = parse(yaml);
        assert!(config.validate().is_ok());
        assert_eq!(config.tripartite[0].syn.third_out.synapse_model, "sic_connection");
        assert_eq!(config.tripartite[0].syn.primary.synapse_model, "static_synapse");
    }

    #[test]
    fn test_bad_synapse_model() {
        let mut config = parse(BASIC);
        config.synapse_models.push(SynapseModel::new("broken", 1.0, 0.0));
        assert!(matches!(config.validate(), Err(ValidationError::InvalidSynapseModel(_))));
    }
}
