//! Provider capability contract.

use std::{fmt::Debug, path::PathBuf};

use thiserror::Error;

use crate::{ConfigValue, Namespace};

/// A read-only source of configuration values.
///
/// Providers are consulted in precedence order; the first one that returns
/// `Some` for a field wins. Only providers with [`supports_secrets`](Self::supports_secrets)
/// are asked for secret fields.
pub trait ConfigProvider: Send + Sync + Debug {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    fn supports_secrets(&self) -> bool;

    /// Looks up `field` inside `namespace`.
    ///
    /// `Ok(None)` means "not found". An `Err` is surfaced to the caller unchanged.
    fn lookup(&self, namespace: &Namespace, field: &str) -> Result<Option<ConfigValue>, ProviderError>;
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("keyring error for {name}: {error}")]
    Keyring { name: String, error: String },

    #[error("provider '{provider}' failed: {message}")]
    Backend { provider: String, message: String },
}
