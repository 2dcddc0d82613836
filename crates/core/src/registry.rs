//! Registry for sources

use crate::error::GatherError;
use crate::source::BoxedSource;
use anyhow::Result;
use gathered_types::SourceConfig;
use log::debug;
use std::collections::HashMap;

/// Function that creates a source from its configuration
pub type SourceFactory = fn(&SourceConfig) -> Result<BoxedSource>;

/// Registry of source factories keyed by source type id
///
/// Built-in sources are registered at startup; the application creates
/// sources from the configs it loads.
pub struct Registry {
    sources: HashMap<String, SourceFactory>,
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    /// Register a source type. A later registration replaces an earlier one.
    pub fn register_source(&mut self, id: &str, factory: SourceFactory) {
        debug!("Registered source type {}", id);
        self.sources.insert(id.to_string(), factory);
    }

    /// Create a source for a config
    pub fn create_source(&self, config: &SourceConfig) -> Result<BoxedSource> {
        let id = config.source_type();
        let factory = self
            .sources
            .get(id)
            .ok_or_else(|| GatherError::UnknownSource(id.to_string()))?;
        factory(config)
    }

    /// Create a source by ID with its default configuration
    pub fn create_default(&self, id: &str) -> Result<BoxedSource> {
        let config = SourceConfig::default_for(id)
            .ok_or_else(|| GatherError::UnknownSource(id.to_string()))?;
        self.create_source(&config)
    }

    /// All registered source IDs, sorted
    pub fn list_sources(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sources.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::erased::AnyProperty;
    use crate::property::BasicProperty;
    use crate::source::Source;
    use gathered_types::{MemorySourceConfig, SourceIdentifier};
    use std::sync::Arc;

    struct FixedSource {
        total: Arc<BasicProperty<u64>>,
    }

    impl Source for FixedSource {
        fn identifier(&self) -> SourceIdentifier {
            "memory".into()
        }

        fn name(&self) -> &str {
            "Fixed"
        }

        fn all_properties(&self) -> Vec<AnyProperty> {
            vec![AnyProperty::new(Arc::clone(&self.total))]
        }
    }

    fn fixed_factory(config: &SourceConfig) -> Result<BoxedSource> {
        match config {
            SourceConfig::Memory(_) => Ok(Box::new(FixedSource {
                total: Arc::new(BasicProperty::new("Total", 16u64)),
            })),
            other => Err(GatherError::ConfigMismatch {
                expected: "memory",
                actual: other.source_type(),
            }
            .into()),
        }
    }

    #[test]
    fn test_create_registered_source() {
        let mut registry = Registry::new();
        registry.register_source("memory", fixed_factory);

        let source = registry
            .create_source(&SourceConfig::Memory(MemorySourceConfig::default()))
            .unwrap();

        assert_eq!(source.identifier().as_str(), "memory");
        assert_eq!(source.all_properties().len(), 1);
        assert!(source.as_controllable().is_none());
    }

    #[test]
    fn test_unknown_source_errors() {
        let registry = Registry::new();
        let err = match registry.create_default("memory") {
            Ok(_) => panic!("expected an error"),
            Err(e) => e,
        };
        assert!(matches!(
            err.downcast_ref::<GatherError>(),
            Some(GatherError::UnknownSource(id)) if id == "memory"
        ));

        assert!(registry.create_default("barometer").is_err());
    }

    #[test]
    fn test_list_sources_sorted() {
        let mut registry = Registry::default();
        registry.register_source("thermal", fixed_factory);
        registry.register_source("location", fixed_factory);
        registry.register_source("memory", fixed_factory);

        assert_eq!(registry.list_sources(), ["location", "memory", "thermal"]);
        assert!(registry.contains("memory"));
        assert!(!registry.contains("gps"));
    }

    #[test]
    fn test_factory_rejects_wrong_config() {
        let mut registry = Registry::new();
        registry.register_source("thermal", fixed_factory);
        assert!(registry.create_default("thermal").is_err());
    }
}
