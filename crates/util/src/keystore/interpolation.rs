//! `${env:NAME}` and `${secret:NAME}` interpolation for configuration values.

use regex::Regex;
use thiserror::Error;
use tracing::debug;

pub(crate) static SERVICE: &str = "siphon";
/// Environment variable used to select the secret resolution backend.
pub const SECRETS_BACKEND_ENV_VAR: &str = "SIPHON_SECRETS_BACKEND";

/// Secret resolution backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretsBackend {
    /// Resolve secrets via the OS keychain (`keyring-rs`).
    Keychain,
    /// Resolve `${secret:NAME}` from process environment variable `NAME`; no keychain provider.
    Environment,
    /// Never touch the keychain; `${secret:NAME}` placeholders fail to resolve.
    Disabled,
}

impl SecretsBackend {
    fn from_env_var(raw: Option<String>) -> Self {
        match raw.unwrap_or_default().trim().to_ascii_lowercase().as_str() {
            "env" => Self::Environment,
            "none" | "off" => Self::Disabled,
            _ => Self::Keychain,
        }
    }
}

/// Determine the currently configured secrets backend.
pub fn secrets_backend() -> SecretsBackend {
    let configured_value = std::env::var(SECRETS_BACKEND_ENV_VAR).ok();
    SecretsBackend::from_env_var(configured_value)
}

/// Interpolate a string value, replacing ${env:NAME} and ${secret:NAME} patterns.
pub fn interpolate_string(value: &str) -> Result<String, InterpolationError> {
    if !value.contains("${") {
        return Ok(value.to_string());
    }
    let env_regex = Regex::new(r"\$\{env:([\w+_-]*)}")?;
    let secret_regex = Regex::new(r"\$\{secret:([\w+_.-]*)}")?;

    let mut resolved_env = Vec::new();
    for cap in env_regex.captures_iter(value) {
        let var_name = cap[1].to_string();
        let env_value = std::env::var(&var_name).map_err(|_| InterpolationError::MissingEnvVar { name: var_name.clone() })?;
        debug!("Interpolated env var: {} -> [REDACTED]", var_name);
        resolved_env.push((cap[0].to_string(), env_value));
    }

    let mut resolved_secrets = Vec::new();
    for cap in secret_regex.captures_iter(value) {
        let secret_name = cap[1].to_string();
        let secret_value = resolve_secret(&secret_name)?;
        debug!("Interpolated secret: {} -> [REDACTED]", secret_name);
        resolved_secrets.push((cap[0].to_string(), secret_value));
    }

    let mut result = value.to_string();
    for (placeholder, env_value) in resolved_env {
        result = result.replace(&placeholder, &env_value);
    }
    for (placeholder, secret_value) in resolved_secrets {
        result = result.replace(&placeholder, &secret_value);
    }

    Ok(result)
}

/// Resolve a secret using the configured secrets backend.
pub fn resolve_secret(name: &str) -> Result<String, InterpolationError> {
    match secrets_backend() {
        SecretsBackend::Environment => std::env::var(name).map_err(|error| InterpolationError::MissingSecret {
            name: name.to_string(),
            error: error.to_string(),
        }),
        SecretsBackend::Disabled => Err(InterpolationError::MissingSecret {
            name: name.to_string(),
            error: "secret backend is disabled".to_string(),
        }),
        SecretsBackend::Keychain => {
            let keyring = keyring::Entry::new(SERVICE, name).map_err(|e| InterpolationError::KeyringError {
                name: name.to_string(),
                error: e.to_string(),
            })?;

            keyring.get_password().map_err(|e| InterpolationError::MissingSecret {
                name: name.to_string(),
                error: e.to_string(),
            })
        }
    }
}

/// Errors that can occur during interpolation.
#[derive(Debug, Error, Clone)]
pub enum InterpolationError {
    #[error("Missing environment variable: {name}")]
    MissingEnvVar { name: String },

    #[error("Missing secret: {name} - {error}")]
    MissingSecret { name: String, error: String },

    #[error("Keyring error for {name}: {error}")]
    KeyringError { name: String, error: String },

    #[error("Regex compilation error: {0}")]
    Regex(#[from] regex::Error),
}
