//! Scenario registry
//!
//! Scenarios are looked up by identifier. Functions annotated with
//! [`#[scenario]`](loads_macros::scenario) are collected at link time into [`SCENARIOS`];
//! others can be registered by hand.
use crate::LoadsError;
use loads_core::{RunConfiguration, Scenario, TestResult};
use loads_runtime::DnsResolver;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
#[allow(unused)]
use tracing::{debug, warn};

#[doc(hidden)]
pub use linkme;
#[doc(hidden)]
pub use linkme::distributed_slice;

/// Everything a scenario is built from.
#[derive(Clone)]
pub struct ScenarioContext {
    pub name: String,
    pub result: Arc<dyn TestResult>,
    pub config: Arc<RunConfiguration>,
    pub resolver: Arc<DnsResolver>,
}

pub type ScenarioFactory = Arc<dyn Fn(ScenarioContext) -> Box<dyn Scenario> + Send + Sync>;

#[doc(hidden)]
#[derive(Clone, Copy)]
pub struct ScenarioEntry {
    pub name: &'static str,
    pub factory: fn(ScenarioContext) -> Box<dyn Scenario>,
}

/// Scenarios registered through `#[scenario]`, gathered at link time.
#[doc(hidden)]
#[distributed_slice]
pub static SCENARIOS: [ScenarioEntry];

#[derive(Clone, Default)]
pub struct ScenarioRegistry {
    factories: HashMap<String, ScenarioFactory>,
}

impl ScenarioRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every `#[scenario]` linked into the binary.
    pub fn linked() -> Self {
        let mut registry = Self::new();
        for entry in SCENARIOS.iter() {
            registry.register(entry.name, entry.factory);
        }
        debug!("{} scenario(s) linked", registry.factories.len());
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(ScenarioContext) -> Box<dyn Scenario> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.insert(name.clone(), Arc::new(factory)).is_some() {
            warn!("Scenario {name} registered twice; keeping the last one.");
        }
    }

    pub fn with<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(ScenarioContext) -> Box<dyn Scenario> + Send + Sync + 'static,
    {
        self.register(name, factory);
        self
    }

    pub fn resolve(&self, name: &str) -> Result<ScenarioFactory, LoadsError> {
        self.factories
            .get(name)
            .cloned()
            .ok_or_else(|| LoadsError::Resolution(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl fmt::Debug for ScenarioRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("ScenarioRegistry")
            .field("scenarios", &names)
            .finish()
    }
}
