//! Background removal strategy abstraction and registry

use crate::{
    error::{BenchmarkError, Result},
    types::{ModelSizeInfo, RemovalOutcome},
};
use async_trait::async_trait;
use image::DynamicImage;
use std::collections::BTreeMap;

/// Capability contract every background removal backend under test implements.
///
/// The orchestrator drives a strategy through `initialize`, a number of
/// `remove_background` calls and finally `cleanup`, awaiting each call.
#[async_trait]
pub trait BackgroundRemovalStrategy: Send {
    /// Stable, human-readable name; unique among the strategies of a run
    fn name(&self) -> &str;

    /// Whether `initialize` has completed successfully
    fn is_model_loaded(&self) -> bool;

    /// Load the model or backend. Calling it again once loaded is a no-op.
    ///
    /// # Errors
    /// - `ModelLoadFailed` when the backend cannot be prepared
    async fn initialize(&mut self) -> Result<()>;

    /// Segment `image` and return the cut-out, its mask and the call metrics
    ///
    /// # Errors
    /// - `ModelNotLoaded` before a successful `initialize`
    /// - `InvalidImage` when the input cannot be prepared
    /// - `ProcessingFailed` for any backend-internal failure
    async fn remove_background(&mut self, image: &DynamicImage) -> Result<RemovalOutcome>;

    /// Release backend resources and reset `is_model_loaded`.
    /// Safe to call repeatedly or before `initialize`.
    async fn cleanup(&mut self);

    /// Size of the model backing this strategy, when known
    fn model_size_info(&self) -> Option<ModelSizeInfo> {
        None
    }
}

type StrategyConstructor = Box<dyn Fn(Option<&str>) -> Result<Box<dyn BackgroundRemovalStrategy>> + Send + Sync>;

/// Registry of named strategy constructors.
///
/// Strategies are requested with `kind` or `kind:parameter` specifiers, the
/// parameter being passed verbatim to the constructor.
#[derive(Default)]
pub struct StrategyRegistry {
    constructors: BTreeMap<String, StrategyConstructor>,
}

impl StrategyRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the strategies bundled in this crate
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        crate::strategies::register_builtin(&mut registry);
        registry
    }

    pub fn register<F>(&mut self, kind: &str, constructor: F)
    where
        F: Fn(Option<&str>) -> Result<Box<dyn BackgroundRemovalStrategy>> + Send + Sync + 'static,
    {
        self.constructors.insert(kind.to_string(), Box::new(constructor));
    }

    /// Registered strategy kinds in name order
    #[must_use]
    pub fn kinds(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Build a strategy from a `kind[:parameter]` specifier
    ///
    /// # Errors
    /// - `InvalidConfig` for an unknown kind
    /// - Any error raised by the constructor for a bad parameter
    pub fn create(&self, spec: &str) -> Result<Box<dyn BackgroundRemovalStrategy>> {
        let (kind, parameter) = match spec.split_once(':') {
            Some((kind, parameter)) => (kind, Some(parameter)),
            None => (spec, None),
        };

        let constructor = self.constructors.get(kind).ok_or_else(|| {
            BenchmarkError::invalid_config(format!(
                "Unknown strategy '{}'. Available: {}",
                kind,
                self.kinds().join(", ")
            ))
        })?;
        constructor(parameter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_utils::ScriptedStrategy;

    #[test]
    fn test_registry_starts_empty() {
        let registry = StrategyRegistry::new();
        assert!(registry.kinds().is_empty());
        assert!(registry.create("anything").is_err());
    }

    #[test]
    fn test_registry_passes_parameter() {
        let mut registry = StrategyRegistry::new();
        registry.register("scripted", |parameter| {
            let name = format!("scripted-{}", parameter.unwrap_or("default"));
            Ok(Box::new(ScriptedStrategy::new(&name)) as Box<dyn BackgroundRemovalStrategy>)
        });

        assert_eq!(registry.create("scripted").unwrap().name(), "scripted-default");
        assert_eq!(registry.create("scripted:fast").unwrap().name(), "scripted-fast");
    }

    #[test]
    fn test_unknown_kind_lists_available() {
        let registry = StrategyRegistry::with_builtin();
        let err = registry.create("coreml").err().unwrap();
        assert!(err.to_string().contains("Unknown strategy 'coreml'"));
        assert!(err.to_string().contains("border-color"));
    }
}
