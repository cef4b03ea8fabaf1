//! Process-wide memoizing registry of synthesized schemas.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use once_cell::sync::Lazy;
use siphon_types::{ConfigSchema, SchemaKey};
use tracing::{debug, warn};

use crate::{
    callable::CallableDef,
    error::ConfigError,
    synth::{SynthesisOptions, compose_schema, derived_options, synthesize_schema},
};

static GLOBAL_REGISTRY: Lazy<Arc<SchemaRegistry>> = Lazy::new(|| Arc::new(SchemaRegistry::new()));

/// Cached synthesis result; `None` records that the callable has no configurable fields.
type CachedSchema = Option<Arc<ConfigSchema>>;

/// Schemas keyed by (callable identity, include-defaults flag).
///
/// Only the fields derived from the callable are cached. The base schema, schema name and
/// namespace belong to each wrapper and are applied on top of the cached entry, so two
/// wrappers of one callable never see each other's options. Entries are immutable once inserted. Concurrent first-time synthesis of the same key
/// keeps the first result to be inserted and discards the others.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<SchemaKey, CachedSchema>>,
    callables: RwLock<HashMap<String, CallableDef>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by every wrapper that is not given its own.
    pub fn global() -> Arc<SchemaRegistry> {
        Arc::clone(&GLOBAL_REGISTRY)
    }

    /// Records `callable` under its identity.
    ///
    /// Registering the same definition again is a no-op; a different definition under an
    /// identity that is already taken is rejected.
    pub fn register(&self, callable: &CallableDef) -> Result<(), ConfigError> {
        let mut callables = self.callables.write().unwrap_or_else(PoisonError::into_inner);
        match callables.get(callable.identity()) {
            Some(existing) if existing == callable => Ok(()),
            Some(_) => Err(ConfigError::DuplicateSpecRegistration {
                identity: callable.identity().to_string(),
            }),
            None => {
                callables.insert(callable.identity().to_string(), callable.clone());
                Ok(())
            }
        }
    }

    pub fn get(&self, key: &SchemaKey) -> Option<CachedSchema> {
        self.schemas.read().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    /// Registers `callable` and returns its schema for `options`, synthesizing the derived
    /// fields on first use.
    pub fn get_or_synthesize(&self, callable: &CallableDef, options: &SynthesisOptions) -> Result<CachedSchema, ConfigError> {
        self.register(callable)?;
        let derived = self.derived(callable, options.include_defaults)?;
        Ok(compose_schema(callable, derived.as_ref(), options))
    }

    fn derived(&self, callable: &CallableDef, include_defaults: bool) -> Result<CachedSchema, ConfigError> {
        let key = SchemaKey::new(callable.identity(), include_defaults);
        if let Some(cached) = self.get(&key) {
            debug!(schema_key = %key, "schema cache hit");
            return Ok(cached);
        }

        let synthesized = synthesize_schema(callable, &derived_options(include_defaults))?.map(Arc::new);
        let mut schemas = self.schemas.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = schemas.get(&key) {
            warn!(schema_key = %key, "schema synthesized concurrently; keeping the first result");
            return Ok(existing.clone());
        }
        schemas.insert(key, synthesized.clone());
        Ok(synthesized)
    }

    pub fn len(&self) -> usize {
        self.schemas.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use siphon_types::{ConfigField, Namespace, Parameter, Signature, ValueType};

    use super::*;

    fn callable(identity: &str, annotation: ValueType) -> CallableDef {
        CallableDef::new(identity, Signature::from_iter([Parameter::positional("org").annotated(annotation)]))
    }

    #[test]
    fn caches_per_identity_and_flag() {
        let registry = SchemaRegistry::new();
        let f = callable("m::f", ValueType::Str);
        let first = registry.get_or_synthesize(&f, &SynthesisOptions::default()).unwrap().unwrap();
        let second = registry.get_or_synthesize(&f, &SynthesisOptions::default()).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let trimmed = SynthesisOptions {
            include_defaults: false,
            ..SynthesisOptions::default()
        };
        registry.get_or_synthesize(&f, &trimmed).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn different_callable_under_same_identity_is_rejected() {
        let registry = SchemaRegistry::new();
        registry.get_or_synthesize(&callable("m::f", ValueType::Str), &SynthesisOptions::default()).unwrap();
        let error = registry
            .get_or_synthesize(&callable("m::f", ValueType::Int), &SynthesisOptions::default())
            .unwrap_err();
        assert!(matches!(error, ConfigError::DuplicateSpecRegistration { identity } if identity == "m::f"));
    }

    #[test]
    fn concurrent_synthesis_agrees_on_one_schema() {
        let registry = Arc::new(SchemaRegistry::new());
        let f = callable("m::concurrent", ValueType::Str);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let f = f.clone();
                thread::spawn(move || registry.get_or_synthesize(&f, &SynthesisOptions::default()).unwrap().unwrap())
            })
            .collect();
        let schemas: Vec<Arc<ConfigSchema>> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();
        let cached = registry.get(&SchemaKey::new("m::concurrent", true)).unwrap().unwrap();
        assert!(schemas.iter().all(|schema| Arc::ptr_eq(schema, &cached)));
    }

    #[test]
    fn wrapper_options_do_not_leak_between_wrappers() {
        let registry = SchemaRegistry::new();
        let f = callable("m::f", ValueType::Str);
        let plain = registry.get_or_synthesize(&f, &SynthesisOptions::default()).unwrap().unwrap();

        let base = ConfigSchema::new(
            "Base",
            SchemaKey::new("base", true),
            Namespace::root(),
            [ConfigField::optional("log_level", ValueType::Str, "WARNING")],
        );
        let extended = SynthesisOptions {
            base: Some(base),
            schema_name: Some("Other".to_string()),
            namespace: Namespace::new(["source", "other"]),
            ..SynthesisOptions::default()
        };
        let with_base = registry.get_or_synthesize(&f, &extended).unwrap().unwrap();
        assert_eq!(with_base.field_names().collect::<Vec<_>>(), vec!["log_level", "org"]);
        assert_eq!(with_base.name(), "Other");
        assert_eq!(with_base.namespace(), &Namespace::new(["source", "other"]));

        let again = registry.get_or_synthesize(&f, &SynthesisOptions::default()).unwrap().unwrap();
        assert!(Arc::ptr_eq(&plain, &again));
        assert_eq!(again.field_names().collect::<Vec<_>>(), vec!["org"]);
        assert_eq!(again.name(), "m::f");
        assert_eq!(registry.len(), 1);
    }
}
