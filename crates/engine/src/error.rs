//! Errors raised while deriving schemas, resolving fields and invoking wrapped callables.

use siphon_types::{ProviderError, Sentinel, ValueType};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field was not reported by any provider.
    #[error("missing configuration value '{field}' (namespace '{namespace}'); set it in any configuration provider")]
    FieldMissing { field: String, namespace: String },

    /// A secret field was not reported by any secret-capable provider.
    #[error("missing secret '{field}' (namespace '{namespace}'); no secret-capable provider supplied it")]
    SecretFieldMissing { field: String, namespace: String },

    /// `raw` is already redacted when the field holds a secret.
    #[error("value '{raw}' for '{field}' (namespace '{namespace}') is not a valid {expected}: {reason}")]
    TypeCoercion {
        field: String,
        namespace: String,
        expected: ValueType,
        raw: String,
        reason: String,
    },

    #[error("a different configurable callable is already registered as '{identity}'")]
    DuplicateSpecRegistration { identity: String },

    #[error("parameter '{parameter}' is still bound to {sentinel}; it was never resolved")]
    SentinelMisuse { parameter: String, sentinel: Sentinel },

    /// A provider raised while looking up a field. The provider error is kept unchanged.
    #[error("provider '{provider}' failed while looking up '{field}' (namespace '{namespace}')")]
    Provider {
        provider: String,
        field: String,
        namespace: String,
        #[source]
        source: ProviderError,
    },

    #[error("{callable}: {message}")]
    ArgumentBinding { callable: String, message: String },

    #[error("invalid declaration: {message}")]
    Declaration { message: String },
}

impl ConfigError {
    pub(crate) fn binding(callable: &str, message: impl Into<String>) -> Self {
        ConfigError::ArgumentBinding {
            callable: callable.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn declaration(message: impl Into<String>) -> Self {
        ConfigError::Declaration { message: message.into() }
    }

    /// Name of the field the error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::FieldMissing { field, .. }
            | ConfigError::SecretFieldMissing { field, .. }
            | ConfigError::TypeCoercion { field, .. }
            | ConfigError::Provider { field, .. } => Some(field),
            ConfigError::SentinelMisuse { parameter, .. } => Some(parameter),
            _ => None,
        }
    }
}

/// Failure of a configured call.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// Resolution failed; the wrapped callable never ran.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The wrapped callable itself returned an error.
    #[error(transparent)]
    Callable(anyhow::Error),
}

impl InvokeError {
    pub fn as_config(&self) -> Option<&ConfigError> {
        match self {
            InvokeError::Config(error) => Some(error),
            InvokeError::Callable(_) => None,
        }
    }
}
