//! Owns the configured sources and the subscriptions watching them

use anyhow::{Context, Result};
use gathered_core::{AnyProperty, AnySnapshot, BoxedSource, Registry, SourceEvent, Subscription};
use gathered_types::{SourceConfig, SourceIdentifier};
use log::{debug, info};
use serde::Serialize;
use std::sync::Arc;

/// Something observed while watching
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    Property {
        source: SourceIdentifier,
        snapshot: AnySnapshot,
    },
    Lifecycle {
        source: SourceIdentifier,
        event: SourceEvent,
    },
}

/// Latest values of one source
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: SourceIdentifier,
    pub name: String,
    pub snapshots: Vec<AnySnapshot>,
}

/// A set of sources managed together
pub struct Monitor {
    sources: Vec<BoxedSource>,
    subscriptions: Vec<Subscription>,
}

impl Monitor {
    pub fn new(sources: Vec<BoxedSource>) -> Self {
        Self {
            sources,
            subscriptions: Vec::new(),
        }
    }

    /// Create a source for every config
    pub fn from_configs(registry: &Registry, configs: &[SourceConfig]) -> Result<Self> {
        let sources = configs
            .iter()
            .map(|config| {
                registry
                    .create_source(config)
                    .with_context(|| format!("Failed to create {} source", config.source_type()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(sources))
    }

    pub fn sources(&self) -> &[BoxedSource] {
        &self.sources
    }

    /// Sample every source once.
    ///
    /// Sources that cannot sample on demand report whatever they last held.
    pub fn snapshot_all(&self) -> Vec<SourceReport> {
        self.sources
            .iter()
            .map(|source| {
                let properties = match source.as_manually_updatable() {
                    Some(updatable) => updatable.update_values(),
                    None => source.all_properties(),
                };
                SourceReport {
                    source: source.identifier(),
                    name: source.name().to_string(),
                    snapshots: properties
                        .iter()
                        .flat_map(AnyProperty::flattened)
                        .map(|p| p.snapshot())
                        .collect(),
                }
            })
            .collect()
    }

    /// Call `printer` with every property update and lifecycle event until
    /// the monitor is dropped. Does not start the sources.
    pub fn watch<F>(&mut self, printer: F)
    where
        F: Fn(&MonitorEvent) + Send + Sync + 'static,
    {
        let printer = Arc::new(printer);
        for source in &self.sources {
            let id = source.identifier();
            for property in source.all_properties().iter().flat_map(AnyProperty::flattened) {
                let printer = Arc::clone(&printer);
                let source = id.clone();
                self.subscriptions
                    .push(property.add_update_listener(move |snapshot| {
                        printer(&MonitorEvent::Property {
                            source: source.clone(),
                            snapshot: snapshot.clone(),
                        })
                    }));
            }
            if let Some(controllable) = source.as_controllable() {
                let printer = Arc::clone(&printer);
                let source = id.clone();
                self.subscriptions
                    .push(controllable.add_event_listener(Box::new(move |event: &SourceEvent| {
                        printer(&MonitorEvent::Lifecycle {
                            source: source.clone(),
                            event: event.clone(),
                        })
                    })));
            }
        }
        debug!("Watching {} subscriptions", self.subscriptions.len());
    }

    /// Start every controllable source
    pub fn start_all(&self) {
        for source in &self.sources {
            if let Some(controllable) = source.as_controllable() {
                info!("Starting {}", source.identifier());
                controllable.start_updating();
            }
        }
    }

    /// Stop every controllable source. Subscriptions stay in place.
    pub fn stop_all(&self) {
        for source in &self.sources {
            if let Some(controllable) = source.as_controllable() {
                controllable.stop_updating();
            }
        }
    }

    /// Number of sources currently monitoring
    pub fn updating_count(&self) -> usize {
        self.sources
            .iter()
            .filter_map(|s| s.as_controllable())
            .filter(|c| c.is_updating())
            .count()
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.subscriptions.clear();
        self.stop_all();
    }
}
