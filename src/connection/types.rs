//! Connection specifications and connection records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{SynapseModelId, STATIC_SYNAPSE};
use crate::node::Gid;

/// A single rule parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "integer",
            ParamValue::Float(_) => "float",
            ParamValue::Text(_) => "string",
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value as i64)
    }
}

impl From<usize> for ParamValue {
    fn from(value: usize) -> Self {
        ParamValue::Int(value as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

/// Strategy-specific rule configuration
pub type ConnParams = BTreeMap<String, ParamValue>;

/// Connection rule name plus its parameters
///
/// ```yaml
/// rule: fixed_indegree
/// indegree: 80
/// allow_autapses: false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnSpec {
    pub rule: String,
    #[serde(flatten)]
    pub params: ConnParams,
}

impl ConnSpec {
    pub fn new(rule: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            params: ConnParams::new(),
        }
    }

    /// Builder-style parameter setter
    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.params.get(key), Some(ParamValue::Bool(true)))
    }
}

/// Synapse specification of a connect call.
///
/// Unset weight and delay fall back to the synapse model's defaults when
/// events are delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynSpec {
    pub synapse_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
}

impl SynSpec {
    pub fn model(name: impl Into<String>) -> Self {
        Self {
            synapse_model: name.into(),
            ..Self::default()
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl Default for SynSpec {
    fn default() -> Self {
        Self {
            synapse_model: STATIC_SYNAPSE.to_string(),
            weight: None,
            delay: None,
        }
    }
}

/// Synapse specifications of the three connection groups a tripartite
/// connect creates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripartiteSynSpec {
    /// `source -> target`
    pub primary: SynSpec,
    /// `source -> third`
    pub third_in: SynSpec,
    /// `third -> target`
    pub third_out: SynSpec,
}

/// Synapse specification resolved against the model catalogue
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynapseParams {
    pub model: SynapseModelId,
    pub weight: Option<f64>,
    pub delay: Option<f64>,
}

impl SynapseParams {
    pub fn new(model: SynapseModelId) -> Self {
        Self {
            model,
            weight: None,
            delay: None,
        }
    }
}

/// One stored point-to-point connection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub source: Gid,
    pub target: Gid,
    pub synapse: SynapseModelId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
}

impl Connection {
    pub fn new(source: Gid, target: Gid, synapse: &SynapseParams) -> Self {
        Self {
            source,
            target,
            synapse: synapse.model,
            weight: synapse.weight,
            delay: synapse.delay,
        }
    }
}
