//! Name-addressed catalogue of connection rules.
//!
//! Each rule type is registered once under a name. Registration creates a
//! factory for that type, stores it in a dense table and binds the name to
//! the factory's position. `create` resolves the name with a single map
//! lookup and then dispatches through the factory at that position.
//!
//! Bipartite and third-factor rules live in two independent tables with
//! disjoint namespaces.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, LazyLock};

use super::builder::{BipartiteRule, BuilderArgs, ConnBuilder, ThirdArgs, ThirdFactorBuilder, ThirdFactorRule};
use super::error::{BuildError, ConnectError, RuleError};
use super::params::ParamReader;
use super::rules::{
    all_to_all, fixed_indegree, fixed_outdegree, fixed_total_number, one_to_one, pairwise_bernoulli, third_factor,
    AllToAllBuilder, BernoulliBuilder, FixedInDegreeBuilder, FixedOutDegreeBuilder, FixedTotalNumberBuilder,
    OneToOneBuilder, ThirdBernoulliWithPoolBuilder,
};
use super::types::{ConnSpec, SynapseParams};
use crate::node::NodeCollection;

/// Dense rule identifier, assigned in registration order
pub type RuleId = usize;

/// Creates builders of one bipartite rule type
pub trait BipartiteFactory: Send + Sync {
    fn create(&self, args: BuilderArgs<'_>) -> Result<Box<dyn ConnBuilder>, BuildError>;
}

/// Creates builders of one third-factor rule type
pub trait ThirdFactorFactory: Send + Sync {
    fn create(&self, args: ThirdArgs<'_>) -> Result<Box<dyn ThirdFactorBuilder>, BuildError>;
}

/// Factory for the builder type `B`
pub struct RuleFactory<B>(PhantomData<fn() -> B>);

impl<B> RuleFactory<B> {
    pub fn new() -> Self {
        RuleFactory(PhantomData)
    }
}

impl<B> Default for RuleFactory<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: BipartiteRule> BipartiteFactory for RuleFactory<B> {
    fn create(&self, args: BuilderArgs<'_>) -> Result<Box<dyn ConnBuilder>, BuildError> {
        Ok(Box::new(B::from_args(args)?))
    }
}

impl<B: ThirdFactorRule> ThirdFactorFactory for RuleFactory<B> {
    fn create(&self, args: ThirdArgs<'_>) -> Result<Box<dyn ThirdFactorBuilder>, BuildError> {
        Ok(Box::new(B::from_args(args)?))
    }
}

/// Name table plus dense factory table
pub struct RuleTable<F: ?Sized> {
    ids: HashMap<String, RuleId>,
    factories: Vec<Box<F>>,
}

impl<F: ?Sized> RuleTable<F> {
    pub fn new() -> Self {
        Self {
            ids: HashMap::new(),
            factories: Vec::new(),
        }
    }

    pub fn insert(&mut self, name: &str, factory: Box<F>) -> Result<RuleId, RuleError> {
        if self.ids.contains_key(name) {
            return Err(RuleError::DuplicateRule { name: name.to_string() });
        }
        let id = self.factories.len();
        self.factories.push(factory);
        self.ids.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn id_of(&self, name: &str) -> Option<RuleId> {
        self.ids.get(name).copied()
    }

    pub fn resolve(&self, name: &str) -> Result<&F, RuleError> {
        let id = self
            .id_of(name)
            .ok_or_else(|| RuleError::UnknownRule { name: name.to_string() })?;
        Ok(&*self.factories[id])
    }

    /// Registered names in id order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<(&str, RuleId)> = self.ids.iter().map(|(n, &id)| (n.as_str(), id)).collect();
        names.sort_unstable_by_key(|&(_, id)| id);
        names.into_iter().map(|(n, _)| n).collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl<F: ?Sized> Default for RuleTable<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Bipartite and third-factor rule tables.
///
/// Populated before any connect call and read-only afterwards, so it can be
/// shared between threads without locking.
#[derive(Default)]
pub struct ConnectionRuleRegistry {
    bipartite: RuleTable<dyn BipartiteFactory>,
    third_factor: RuleTable<dyn ThirdFactorFactory>,
}

impl ConnectionRuleRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every rule shipped with the crate
    ///
    /// # Panics
    ///
    /// Panics if two built-in rules share a name.
    pub fn with_builtin_rules() -> Self {
        let mut registry = Self::new();
        if let Err(err) = registry.register_builtin_rules() {
            panic!("Invalid built-in rule table: {}", err);
        }
        registry
    }

    /// Add the crate's rules to this registry
    pub fn register_builtin_rules(&mut self) -> Result<(), RuleError> {
        self.register_rule::<OneToOneBuilder>(one_to_one::RULE)?;
        self.register_rule::<AllToAllBuilder>(all_to_all::RULE)?;
        self.register_rule::<FixedInDegreeBuilder>(fixed_indegree::RULE)?;
        self.register_rule::<FixedOutDegreeBuilder>(fixed_outdegree::RULE)?;
        self.register_rule::<FixedTotalNumberBuilder>(fixed_total_number::RULE)?;
        self.register_rule::<BernoulliBuilder>(pairwise_bernoulli::RULE)?;
        self.register_third_factor_rule::<ThirdBernoulliWithPoolBuilder>(third_factor::RULE)?;
        Ok(())
    }

    pub fn register_rule<B: BipartiteRule>(&mut self, name: &str) -> Result<RuleId, RuleError> {
        let id = self.bipartite.insert(name, Box::new(RuleFactory::<B>::new()))?;
        log::debug!("Registered connection rule '{}' as id {}", name, id);
        Ok(id)
    }

    pub fn register_third_factor_rule<B: ThirdFactorRule>(&mut self, name: &str) -> Result<RuleId, RuleError> {
        let id = self.third_factor.insert(name, Box::new(RuleFactory::<B>::new()))?;
        log::debug!("Registered third-factor rule '{}' as id {}", name, id);
        Ok(id)
    }

    /// Builder for `spec.rule`, bound to the given populations
    pub fn create(
        &self,
        spec: &ConnSpec,
        sources: &NodeCollection,
        targets: &NodeCollection,
        synapse: SynapseParams,
        seed: u64,
    ) -> Result<Box<dyn ConnBuilder>, ConnectError> {
        let factory = self.bipartite.resolve(&spec.rule)?;
        let builder = factory.create(BuilderArgs {
            sources,
            targets,
            params: ParamReader::new(&spec.rule, &spec.params),
            synapse,
            seed,
        })?;
        Ok(builder)
    }

    /// Third-factor builder for `spec.rule`
    pub fn create_third_factor(
        &self,
        spec: &ConnSpec,
        targets: &NodeCollection,
        third: &NodeCollection,
        seed: u64,
    ) -> Result<Box<dyn ThirdFactorBuilder>, ConnectError> {
        let factory = self.third_factor.resolve(&spec.rule)?;
        let builder = factory.create(ThirdArgs {
            targets,
            third,
            params: ParamReader::new(&spec.rule, &spec.params),
            seed,
        })?;
        Ok(builder)
    }

    pub fn rule_id(&self, name: &str) -> Option<RuleId> {
        self.bipartite.id_of(name)
    }

    pub fn third_factor_rule_id(&self, name: &str) -> Option<RuleId> {
        self.third_factor.id_of(name)
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.bipartite.names()
    }

    pub fn third_factor_rule_names(&self) -> Vec<&str> {
        self.third_factor.names()
    }
}

static BUILTIN_RULES: LazyLock<Arc<ConnectionRuleRegistry>> =
    LazyLock::new(|| Arc::new(ConnectionRuleRegistry::with_builtin_rules()));

/// Shared registry of the built-in rules, initialised on first use
pub fn builtin_rules() -> Arc<ConnectionRuleRegistry> {
    Arc::clone(&BUILTIN_RULES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::sink::ConnectionStore;
    use crate::connection::sink::ThreadSink;
    use crate::node::{NodeKind, VpLayout};

    /// Connects nothing; identifies itself by rule name
    struct Marker;

    impl ConnBuilder for Marker {
        fn rule(&self) -> &'static str {
            "marker"
        }

        fn connect_thread(&self, _sink: &mut ThreadSink<'_>) -> Result<(), BuildError> {
            Ok(())
        }
    }

    impl BipartiteRule for Marker {
        fn from_args(args: BuilderArgs<'_>) -> Result<Self, BuildError> {
            args.params.finish()?;
            Ok(Marker)
        }
    }

    fn pop(first: u64, last: u64) -> NodeCollection {
        NodeCollection::range(first, last, NodeKind::Neuron)
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = ConnectionRuleRegistry::new();
        registry.register_rule::<Marker>("marker").unwrap();
        assert_eq!(
            registry.register_rule::<AllToAllBuilder>("marker"),
            Err(RuleError::DuplicateRule { name: "marker".to_string() })
        );
    }

    #[test]
    fn test_ids_follow_registration_order() {
        let mut registry = ConnectionRuleRegistry::new();
        let names = ["a", "b", "c", "d"];
        for (i, name) in names.iter().enumerate() {
            assert_eq!(registry.register_rule::<Marker>(name), Ok(i));
        }
        for (i, name) in names.iter().enumerate() {
            assert_eq!(registry.rule_id(name), Some(i));
        }
        assert_eq!(registry.rule_names(), names.to_vec());
    }

    #[test]
    fn test_tables_are_independent() {
        let mut registry = ConnectionRuleRegistry::new();
        registry.register_rule::<Marker>("shared").unwrap();
        assert_eq!(
            registry.register_third_factor_rule::<ThirdBernoulliWithPoolBuilder>("shared"),
            Ok(0)
        );
        assert_eq!(registry.rule_id("shared"), Some(0));
        assert_eq!(registry.third_factor_rule_id("shared"), Some(0));
    }

    #[test]
    fn test_create_dispatches_to_registered_type() {
        let mut registry = ConnectionRuleRegistry::new();
        registry.register_rule::<Marker>("one_to_one").unwrap();
        registry.register_rule::<AllToAllBuilder>("all_to_all").unwrap();

        let (a, b) = (pop(1, 3), pop(4, 5));
        let syn = SynapseParams::new(0);
        let marker = registry.create(&ConnSpec::new("one_to_one"), &a, &b, syn, 1).unwrap();
        assert_eq!(marker.rule(), "marker");

        let all = registry.create(&ConnSpec::new("all_to_all"), &a, &b, syn, 1).unwrap();
        assert_eq!(all.rule(), all_to_all::RULE);
        let mut store = ConnectionStore::new(2);
        assert_eq!(all.connect(&VpLayout::single_rank(2), &mut store), Ok(6));
    }

    #[test]
    fn test_unknown_rules() {
        let registry = builtin_rules();
        let (a, b) = (pop(1, 2), pop(3, 4));

        let err = registry
            .create(&ConnSpec::new("ring"), &a, &b, SynapseParams::new(0), 0)
            .err();
        assert_eq!(err, Some(ConnectError::Rule(RuleError::UnknownRule { name: "ring".to_string() })));

        // A bipartite name is not a third-factor rule
        let err = registry
            .create_third_factor(&ConnSpec::new(one_to_one::RULE), &b, &a, 0)
            .err();
        assert_eq!(
            err,
            Some(ConnectError::Rule(RuleError::UnknownRule {
                name: one_to_one::RULE.to_string()
            }))
        );
    }

    #[test]
    fn test_builtin_catalogue() {
        let registry = builtin_rules();
        assert_eq!(
            registry.rule_names(),
            vec![
                "one_to_one",
                "all_to_all",
                "fixed_indegree",
                "fixed_outdegree",
                "fixed_total_number",
                "pairwise_bernoulli"
            ]
        );
        assert_eq!(registry.third_factor_rule_names(), vec![third_factor::RULE]);
    }

    #[test]
    fn test_build_failure_surfaces_from_create() {
        let registry = builtin_rules();
        let err = registry
            .create(&ConnSpec::new(one_to_one::RULE), &pop(1, 3), &pop(4, 5), SynapseParams::new(0), 0)
            .err();
        assert!(matches!(err, Some(ConnectError::Build(BuildError::SizeMismatch { .. }))));
    }
}
