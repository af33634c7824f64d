//! Directive contract and the registry that resolves directive names

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::arguments::Arguments;
use crate::context::ExecutorContext;
use crate::directives;
use crate::error::{DirectiveExecutionError, DirectiveParseError};
use crate::row::Row;
use crate::usage::UsageDefinition;

/// One named, independently configurable transformation step
///
/// Lifecycle: `define` (grammar, cached by the registry) → `initialize`
/// (once per configuration) → `execute` (any number of batches) → `destroy`.
pub trait Directive: Send {
    /// Directive name as written in scripts
    fn name(&self) -> &'static str;

    /// Argument grammar
    fn define(&self) -> Result<UsageDefinition, DirectiveParseError>;

    /// Extract configuration from bound arguments
    ///
    /// Must be idempotent for the same arguments.
    fn initialize(&mut self, args: &Arguments) -> Result<(), DirectiveParseError>;

    /// Transform a batch of rows, in row order
    ///
    /// Rows with missing or mismatched input columns are skipped rather
    /// than failing the batch.
    fn execute(&mut self, rows: Vec<Row>, ctx: &mut ExecutorContext) -> Result<Vec<Row>, DirectiveExecutionError>;

    /// Release resources; safe to call even if `initialize` never ran
    fn destroy(&mut self) {}
}

/// Produces a fresh, uninitialized directive
pub type DirectiveFactory = fn() -> Box<dyn Directive>;

/// Discovery metadata attached to a registered directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveInfo {
    pub name: String,
    pub description: String,
    pub categories: Vec<String>,
}

impl DirectiveInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            categories: Vec::new(),
        }
    }

    pub fn with_categories(mut self, categories: &[&str]) -> Self {
        self.categories = categories.iter().map(|c| c.to_string()).collect();
        self
    }
}

struct Registration {
    info: DirectiveInfo,
    factory: DirectiveFactory,
    usage: UsageDefinition,
}

/// Maps directive names to factories and their cached usage definitions
pub struct DirectiveRegistry {
    entries: HashMap<String, Registration>,
}

impl DirectiveRegistry {
    /// Create a registry with the built-in directives
    ///
    /// Built-in definitions are static; one that fails to build is a bug,
    /// caught by debug assertions and logged in release builds.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for (info, factory) in directives::builtin() {
            let name = info.name.clone();
            let result = registry.register(info, factory);
            debug_assert!(result.is_ok(), "built-in directive '{}' is invalid: {:?}", name, result);
            if let Err(e) = result {
                warn!(%name, error = %e, "DirectiveRegistry::standard: skipping directive");
            }
        }
        registry
    }

    /// Create an empty registry (for testing)
    pub fn empty() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Register a directive
    ///
    /// Builds and caches the usage definition once; fails if it is invalid
    /// or names a different directive than `info`.
    pub fn register(&mut self, info: DirectiveInfo, factory: DirectiveFactory) -> Result<(), DirectiveParseError> {
        debug!(name = %info.name, "DirectiveRegistry::register: called");
        let usage = factory().define()?;
        if usage.directive() != info.name {
            return Err(DirectiveParseError::InvalidDefinition {
                directive: info.name.clone(),
                reason: format!("usage definition names '{}'", usage.directive()),
            });
        }
        self.entries.insert(info.name.clone(), Registration { info, factory, usage });
        Ok(())
    }

    /// Check if a directive exists
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered directive names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn info(&self, name: &str) -> Option<&DirectiveInfo> {
        self.entries.get(name).map(|r| &r.info)
    }

    /// Cached usage definition
    pub fn usage(&self, name: &str) -> Option<&UsageDefinition> {
        self.entries.get(name).map(|r| &r.usage)
    }

    /// Instantiate a fresh directive
    pub fn create(&self, name: &str) -> Option<Box<dyn Directive>> {
        self.entries.get(name).map(|r| (r.factory)())
    }
}

impl Default for DirectiveRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
