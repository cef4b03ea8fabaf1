//! Registration of pipeline sources and resources as configured callables.

use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use siphon_types::{ConfigSchema, Namespace};
use tracing::info;

use crate::{
    binding::BoundArguments,
    callable::CallableDef,
    context::ResolutionContext,
    error::ConfigError,
    inject::{Configured, WithConfig},
    registry::SchemaRegistry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Source,
    Resource,
}

impl SourceKind {
    /// First namespace segment of the kind.
    pub fn section(self) -> &'static str {
        match self {
            SourceKind::Source => "source",
            SourceKind::Resource => "resource",
        }
    }
}

/// What a registered source or resource advertises to users.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInfo {
    pub kind: SourceKind,
    pub name: String,
    pub identity: String,
    pub namespace: Namespace,
    /// Configurable fields; `None` when the callable takes no configuration.
    pub schema: Option<Arc<ConfigSchema>>,
}

/// Registry of configured sources and resources, keyed by kind and name.
///
/// One callable may be registered under several names; each registration gets its own
/// namespace and schema.
#[derive(Debug)]
pub struct SourceRegistry {
    schemas: Arc<SchemaRegistry>,
    entries: RwLock<IndexMap<(SourceKind, String), SourceInfo>>,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::with_schema_registry(SchemaRegistry::global())
    }
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema_registry(schemas: Arc<SchemaRegistry>) -> Self {
        Self {
            schemas,
            entries: RwLock::new(IndexMap::new()),
        }
    }

    /// Wraps `f` with configuration looked up under `source.<name>`.
    pub fn register_source<F, R>(&self, name: &str, callable: CallableDef, f: F) -> Result<Configured<F>, ConfigError>
    where
        F: Fn(&mut ResolutionContext, &BoundArguments) -> anyhow::Result<R>,
    {
        self.register(SourceKind::Source, name, callable, f)
    }

    /// Wraps `f` with configuration looked up under `resource.<name>`.
    pub fn register_resource<F, R>(&self, name: &str, callable: CallableDef, f: F) -> Result<Configured<F>, ConfigError>
    where
        F: Fn(&mut ResolutionContext, &BoundArguments) -> anyhow::Result<R>,
    {
        self.register(SourceKind::Resource, name, callable, f)
    }

    fn register<F, R>(&self, kind: SourceKind, name: &str, callable: CallableDef, f: F) -> Result<Configured<F>, ConfigError>
    where
        F: Fn(&mut ResolutionContext, &BoundArguments) -> anyhow::Result<R>,
    {
        let namespace = Namespace::new([kind.section(), name]);
        let configured = WithConfig::new()
            .registry(Arc::clone(&self.schemas))
            .namespace(namespace.clone())
            .wrap(callable, f)?;

        let info = SourceInfo {
            kind,
            name: name.to_string(),
            identity: configured.callable().identity().to_string(),
            namespace,
            schema: configured.schema().cloned(),
        };
        info!(
            kind = kind.section(),
            name = %info.name,
            identity = %info.identity,
            fields = info.schema.as_ref().map_or(0, |schema| schema.len()),
            "registered configurable callable"
        );
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((kind, info.name.clone()), info);
        Ok(configured)
    }

    pub fn get(&self, kind: SourceKind, name: &str) -> Option<SourceInfo> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(kind, name.to_string()))
            .cloned()
    }

    /// Every registration of the callable with `identity`.
    pub fn by_identity(&self, identity: &str) -> Vec<SourceInfo> {
        self.list().into_iter().filter(|info| info.identity == identity).collect()
    }

    /// Registered entries in registration order.
    pub fn list(&self) -> Vec<SourceInfo> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).values().cloned().collect()
    }

    pub fn sources(&self) -> Vec<SourceInfo> {
        self.list().into_iter().filter(|info| info.kind == SourceKind::Source).collect()
    }

    pub fn resources(&self) -> Vec<SourceInfo> {
        self.list().into_iter().filter(|info| info.kind == SourceKind::Resource).collect()
    }
}
