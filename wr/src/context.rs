//! Contexts handed to the pipeline and its directives

use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::directive::DirectiveRegistry;
use crate::value::Value;

/// Configure-time context: where directive names are resolved
pub struct PipelineContext {
    /// Pipeline name (diagnostics, metrics)
    pub name: String,

    /// Registry used to resolve directive names
    pub registry: DirectiveRegistry,

    /// Free-form properties copied into every `ExecutorContext`
    pub properties: HashMap<String, String>,
}

impl PipelineContext {
    /// Create a context backed by the standard directive catalog
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry: DirectiveRegistry::standard(),
            properties: HashMap::new(),
        }
    }

    pub fn with_registry(mut self, registry: DirectiveRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Build the execution context that directives will see
    pub fn executor_context(&self) -> ExecutorContext {
        ExecutorContext {
            pipeline: self.name.clone(),
            properties: self.properties.clone(),
            counters: BTreeMap::new(),
            lookups: HashMap::new(),
        }
    }
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self::new("default")
    }
}

/// Execute-time services available to directives
///
/// Directives may read properties and lookup tables and bump counters; the
/// pipeline never inspects lookup contents.
#[derive(Debug, Clone, Default)]
pub struct ExecutorContext {
    pipeline: String,
    properties: HashMap<String, String>,
    counters: BTreeMap<String, u64>,
    lookups: HashMap<String, HashMap<String, Value>>,
}

impl ExecutorContext {
    pub fn new(pipeline: impl Into<String>) -> Self {
        Self {
            pipeline: pipeline.into(),
            ..Default::default()
        }
    }

    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Add `by` to a named counter
    pub fn increment(&mut self, name: &str, by: u64) {
        debug!(%name, by, "ExecutorContext::increment: called");
        *self.counters.entry(name.to_string()).or_insert(0) += by;
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    /// All counters, sorted by name
    pub fn counters(&self) -> &BTreeMap<String, u64> {
        &self.counters
    }

    /// Register a named lookup table
    pub fn add_lookup(&mut self, name: impl Into<String>, table: HashMap<String, Value>) {
        self.lookups.insert(name.into(), table);
    }

    pub fn lookup(&self, name: &str) -> Option<&HashMap<String, Value>> {
        self.lookups.get(name)
    }
}
