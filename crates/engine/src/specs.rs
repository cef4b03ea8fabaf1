//! Statically declared configuration schemas.

use indexmap::IndexMap;
use siphon_types::{ConfigField, ConfigSchema, Namespace, SchemaKey, SecretValue, ValueType};

use crate::{
    context::ResolutionContext,
    error::ConfigError,
    resolver::{ResolvedConfiguration, resolve_configuration},
};

/// A configuration type whose fields are declared up front instead of derived from a callable.
///
/// Implementors list their fields with explicit requirement kinds and read themselves back
/// from a [`ResolvedConfiguration`].
pub trait StaticSchema: Sized {
    /// Declared schema type; also the active-configuration key.
    const NAME: &'static str;

    fn fields() -> Vec<ConfigField>;

    fn from_resolved(resolved: &ResolvedConfiguration) -> Result<Self, ConfigError>;

    fn namespace() -> Namespace {
        Namespace::root()
    }

    fn schema() -> ConfigSchema {
        ConfigSchema::new(Self::NAME, SchemaKey::new(Self::NAME, true), Self::namespace(), Self::fields())
    }

    fn resolve(context: &ResolutionContext) -> Result<Self, ConfigError> {
        Self::resolve_in(&Self::namespace(), context)
    }

    /// Resolves under an explicit namespace, e.g. a pipeline-specific section.
    fn resolve_in(namespace: &Namespace, context: &ResolutionContext) -> Result<Self, ConfigError> {
        let resolved = resolve_configuration(&Self::schema(), namespace, &IndexMap::new(), context)?;
        Self::from_resolved(&resolved)
    }
}

/// Runtime settings present for every pipeline run, commonly used as a base schema.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfiguration {
    pub pipeline_name: Option<String>,
    pub sentry_dsn: Option<String>,
    pub slack_incoming_hook: Option<SecretValue>,
    pub log_level: String,
    pub request_timeout: f64,
    pub request_max_attempts: i64,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        Self {
            pipeline_name: None,
            sentry_dsn: None,
            slack_incoming_hook: None,
            log_level: "WARNING".to_string(),
            request_timeout: 60.0,
            request_max_attempts: 5,
        }
    }
}

impl StaticSchema for RunConfiguration {
    const NAME: &'static str = "RunConfiguration";

    fn fields() -> Vec<ConfigField> {
        let defaults = Self::default();
        vec![
            ConfigField::optional("pipeline_name", ValueType::Str.optional(), defaults.pipeline_name),
            ConfigField::optional("sentry_dsn", ValueType::Str.optional(), defaults.sentry_dsn),
            ConfigField::optional("slack_incoming_hook", ValueType::Secret.optional(), defaults.slack_incoming_hook),
            ConfigField::optional("log_level", ValueType::Str, defaults.log_level),
            ConfigField::optional("request_timeout", ValueType::Float, defaults.request_timeout),
            ConfigField::optional("request_max_attempts", ValueType::Int, defaults.request_max_attempts),
        ]
    }

    fn namespace() -> Namespace {
        Namespace::new(["runtime"])
    }

    fn from_resolved(resolved: &ResolvedConfiguration) -> Result<Self, ConfigError> {
        Ok(Self {
            pipeline_name: resolved.get_opt_str("pipeline_name")?.map(str::to_string),
            sentry_dsn: resolved.get_opt_str("sentry_dsn")?.map(str::to_string),
            slack_incoming_hook: resolved.get_opt_secret("slack_incoming_hook")?,
            log_level: resolved.get_str("log_level")?.to_string(),
            request_timeout: resolved.get_f64("request_timeout")?,
            request_max_attempts: resolved.get_i64("request_max_attempts")?,
        })
    }
}
