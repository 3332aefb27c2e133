//! String-keyed constructors for move generators and search strategies.
//!
//! Configuration refers to generators and strategies by key
//! (`HillClimber.Neighbours = "change@1;swap@0.5"`, `Search.Strategy =
//! "orchestrator"`). The [`SearchRegistry`] maps those keys to factory
//! functions. Applications register their own generators next to the
//! built-in ones.

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use seqforge_config::{keys, ConfigError, HillClimberConfig, Properties, SearchConfig};
use seqforge_core::{Model, Result};

use super::{
    parse_selector_specs, ChangeMoveSelector, LazyChangeMoveSelector, MoveSelector,
    NeighbourSelector, SelectorPool, SwapMoveSelector,
};
use crate::strategy::{
    GreatDeluge, GroupAccept, HillClimbing, NeighbourSelection, Orchestrator, SimulatedAnnealing,
};

/// Builds a move generator from the solver properties.
pub type SelectorFactory<M> = Arc<
    dyn Fn(&Properties, &SearchRegistry<M>) -> Result<Box<dyn MoveSelector<M>>> + Send + Sync,
>;

/// Builds a top-level neighbour selection from the solver properties.
pub type StrategyFactory<M> = Arc<
    dyn Fn(&Properties, &SearchRegistry<M>) -> Result<Box<dyn NeighbourSelection<M>>>
        + Send
        + Sync,
>;

/// Registry of generator and strategy factories.
///
/// [`SearchRegistry::new`] comes with these keys:
///
/// | selectors | strategies |
/// |---|---|
/// | `change`, `swap`, `lazy_change`, `pool` | `orchestrator`, `group`, `hill_climbing`, `great_deluge`, `simulated_annealing` |
pub struct SearchRegistry<M: Model> {
    selectors: HashMap<String, SelectorFactory<M>>,
    strategies: HashMap<String, StrategyFactory<M>>,
}

impl<M: Model> SearchRegistry<M> {
    /// A registry with the built-in generators and strategies.
    pub fn new() -> Self {
        let mut registry = Self::empty();

        registry.register_selector("change", |_, _| Ok(Box::new(ChangeMoveSelector::new())));
        registry.register_selector("swap", |_, _| Ok(Box::new(SwapMoveSelector::new())));
        registry.register_selector("lazy_change", |_, _| {
            Ok(Box::new(LazyChangeMoveSelector::new()))
        });
        registry.register_selector("pool", |props, registry| {
            let spec = props.require(keys::POOL_NEIGHBOURS)?;
            let hc = HillClimberConfig::from_properties(props)?;
            if parse_selector_specs(spec)?.iter().any(|s| s.key == "pool") {
                return Err(ConfigError::Invalid(format!(
                    "{} must not contain another pool",
                    keys::POOL_NEIGHBOURS
                ))
                .into());
            }
            let children = registry.build_selectors(spec, props)?;
            Ok(Box::new(SelectorPool::new(children, hc.random, hc.update)))
        });

        registry.register_strategy("orchestrator", |props, registry| {
            Ok(Box::new(Orchestrator::from_properties(props, registry)?))
        });
        registry.register_strategy("group", |props, registry| {
            Ok(Box::new(GroupAccept::from_properties(props, registry)?))
        });
        registry.register_strategy("hill_climbing", |props, registry| {
            Ok(Box::new(HillClimbing::from_properties(props, registry)?))
        });
        registry.register_strategy("great_deluge", |props, registry| {
            Ok(Box::new(GreatDeluge::from_properties(props, registry)?))
        });
        registry.register_strategy("simulated_annealing", |props, registry| {
            Ok(Box::new(SimulatedAnnealing::from_properties(props, registry)?))
        });

        registry
    }

    /// A registry without any factories.
    pub fn empty() -> Self {
        Self {
            selectors: HashMap::new(),
            strategies: HashMap::new(),
        }
    }

    /// Registers a generator factory, replacing any previous one under `key`.
    pub fn register_selector<F>(&mut self, key: impl Into<String>, factory: F)
    where
        F: Fn(&Properties, &SearchRegistry<M>) -> Result<Box<dyn MoveSelector<M>>>
            + Send
            + Sync
            + 'static,
    {
        let factory: SelectorFactory<M> = Arc::new(factory);
        self.selectors.insert(key.into(), factory);
    }

    /// Registers a strategy factory, replacing any previous one under `key`.
    pub fn register_strategy<F>(&mut self, key: impl Into<String>, factory: F)
    where
        F: Fn(&Properties, &SearchRegistry<M>) -> Result<Box<dyn NeighbourSelection<M>>>
            + Send
            + Sync
            + 'static,
    {
        let factory: StrategyFactory<M> = Arc::new(factory);
        self.strategies.insert(key.into(), factory);
    }

    pub fn has_selector(&self, key: &str) -> bool {
        self.selectors.contains_key(key)
    }

    pub fn has_strategy(&self, key: &str) -> bool {
        self.strategies.contains_key(key)
    }

    /// Builds one generator by key.
    pub fn build_selector(
        &self,
        key: &str,
        props: &Properties,
    ) -> Result<Box<dyn MoveSelector<M>>> {
        let factory = self
            .selectors
            .get(key)
            .ok_or_else(|| ConfigError::UnknownSelector(key.to_string()))?;
        factory(props, self)
    }

    /// Builds every selector of a `key@bonus;...` specification, in order.
    pub fn build_selectors(
        &self,
        spec: &str,
        props: &Properties,
    ) -> Result<Vec<NeighbourSelector<M>>> {
        parse_selector_specs(spec)?
            .into_iter()
            .map(|s| -> Result<NeighbourSelector<M>> {
                let selector = self.build_selector(&s.key, props)?;
                Ok(NeighbourSelector::new(s.key, selector, s.bonus))
            })
            .collect()
    }

    /// Builds the strategy named by `Search.Strategy`.
    pub fn build_strategy(&self, props: &Properties) -> Result<Box<dyn NeighbourSelection<M>>> {
        let search = SearchConfig::from_properties(props)?;
        let factory = self
            .strategies
            .get(&search.strategy)
            .ok_or_else(|| ConfigError::UnknownSelector(search.strategy.clone()))?;
        factory(props, self)
    }
}

impl<M: Model> Default for SearchRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Debug for SearchRegistry<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut selectors: Vec<_> = self.selectors.keys().collect();
        selectors.sort();
        let mut strategies: Vec<_> = self.strategies.keys().collect();
        strategies.sort();
        f.debug_struct("SearchRegistry")
            .field("selectors", &selectors)
            .field("strategies", &strategies)
            .finish()
    }
}
