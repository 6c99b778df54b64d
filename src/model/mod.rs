//! Synapse model catalogue.
//!
//! Connections refer to their synapse model by a dense id. The catalogue
//! keeps one copy of every model per thread so that event delivery can look
//! up per-model parameters without touching shared state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Dense identifier of a synapse model
pub type SynapseModelId = usize;

/// Name of the model every catalogue starts with
pub const STATIC_SYNAPSE: &str = "static_synapse";

/// Parameters of a synapse model used when materialising events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynapseModel {
    pub name: String,
    pub default_weight: f64,
    /// Default delay in ms
    pub default_delay: f64,
}

impl SynapseModel {
    pub fn new(name: impl Into<String>, default_weight: f64, default_delay: f64) -> Self {
        Self {
            name: name.into(),
            default_weight,
            default_delay,
        }
    }
}

/// Per-thread lookup of synapse model parameters
pub trait ConnectionModels: Sync {
    fn model(&self, tid: usize, id: SynapseModelId) -> Option<&SynapseModel>;
}

/// Registry of synapse models, replicated per thread
#[derive(Debug, Clone)]
pub struct SynapseModelCatalogue {
    ids: HashMap<String, SynapseModelId>,
    /// One full model list per thread
    per_thread: Vec<Vec<SynapseModel>>,
}

impl SynapseModelCatalogue {
    /// Catalogue for `threads` threads holding only `static_synapse`
    pub fn new(threads: usize) -> Self {
        let mut catalogue = SynapseModelCatalogue {
            ids: HashMap::new(),
            per_thread: vec![Vec::new(); threads.max(1)],
        };
        catalogue.register(SynapseModel::new(STATIC_SYNAPSE, 1.0, 1.0));
        catalogue
    }

    /// Register a model, or replace the defaults of an existing one
    pub fn register(&mut self, model: SynapseModel) -> SynapseModelId {
        if let Some(&id) = self.ids.get(&model.name) {
            for models in &mut self.per_thread {
                models[id] = model.clone();
            }
            return id;
        }
        let id = self.per_thread[0].len();
        self.ids.insert(model.name.clone(), id);
        for models in &mut self.per_thread {
            models.push(model.clone());
        }
        log::debug!("Registered synapse model '{}' as id {}", model.name, id);
        id
    }

    /// Derive a new model from an existing one under a different name
    pub fn copy_model(&mut self, existing: &str, new_name: &str) -> Option<SynapseModelId> {
        let id = self.id_of(existing)?;
        let mut model = self.per_thread[0][id].clone();
        model.name = new_name.to_string();
        Some(self.register(model))
    }

    pub fn id_of(&self, name: &str) -> Option<SynapseModelId> {
        self.ids.get(name).copied()
    }

    pub fn name_of(&self, id: SynapseModelId) -> Option<&str> {
        self.per_thread[0].get(id).map(|m| m.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.per_thread[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.per_thread[0].is_empty()
    }

    pub fn num_threads(&self) -> usize {
        self.per_thread.len()
    }
}

impl ConnectionModels for SynapseModelCatalogue {
    fn model(&self, tid: usize, id: SynapseModelId) -> Option<&SynapseModel> {
        self.per_thread.get(tid)?.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_synapse_is_preregistered() {
        let catalogue = SynapseModelCatalogue::new(2);
        assert_eq!(catalogue.id_of(STATIC_SYNAPSE), Some(0));
        assert_eq!(catalogue.len(), 1);
        assert_eq!(catalogue.model(1, 0).unwrap().default_weight, 1.0);
    }

    #[test]
    fn test_register_is_replicated_per_thread() {
        let mut catalogue = SynapseModelCatalogue::new(3);
        let id = catalogue.register(SynapseModel::new("stdp_synapse", 2.0, 1.5));
        assert_eq!(id, 1);
        for tid in 0..3 {
            assert_eq!(catalogue.model(tid, id).unwrap().name, "stdp_synapse");
        }
        assert!(catalogue.model(3, id).is_none());
        assert!(catalogue.model(0, 7).is_none());
    }

    #[test]
    fn test_reregister_keeps_id() {
        let mut catalogue = SynapseModelCatalogue::new(1);
        let id = catalogue.register(SynapseModel::new("x", 1.0, 1.0));
        let again = catalogue.register(SynapseModel::new("x", 3.0, 1.0));
        assert_eq!(id, again);
        assert_eq!(catalogue.model(0, id).unwrap().default_weight, 3.0);
    }

    #[test]
    fn test_copy_model() {
        let mut catalogue = SynapseModelCatalogue::new(1);
        let id = catalogue.copy_model(STATIC_SYNAPSE, "excitatory").unwrap();
        assert_eq!(catalogue.name_of(id), Some("excitatory"));
        assert!(catalogue.copy_model("missing", "y").is_none());
    }
}
