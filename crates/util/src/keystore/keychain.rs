use siphon_types::{ConfigProvider, ConfigValue, Namespace, ProviderError, SecretValue};
use tracing::debug;

use super::interpolation::SERVICE;

/// Secret-capable provider backed by the OS keychain.
///
/// Entries are addressed by the dotted field path (`source.github.api_key`) under
/// the configured service name. Every value is returned as a secret.
#[derive(Debug, Clone)]
pub struct KeychainProvider {
    service: String,
}

impl KeychainProvider {
    pub fn new() -> Self {
        Self::with_service(SERVICE)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self { service: service.into() }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Keychain entry name for a field.
    pub fn entry_name(namespace: &Namespace, field: &str) -> String {
        namespace.path_of(field)
    }
}

impl Default for KeychainProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigProvider for KeychainProvider {
    fn name(&self) -> &str {
        "keychain"
    }

    fn supports_secrets(&self) -> bool {
        true
    }

    fn lookup(&self, namespace: &Namespace, field: &str) -> Result<Option<ConfigValue>, ProviderError> {
        let name = Self::entry_name(namespace, field);
        let entry = keyring::Entry::new(&self.service, &name).map_err(|error| ProviderError::Keyring {
            name: name.clone(),
            error: error.to_string(),
        })?;

        match entry.get_password() {
            Ok(password) => {
                debug!(entry = %name, "keychain hit -> [REDACTED]");
                Ok(Some(ConfigValue::Secret(SecretValue::new(password))))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(ProviderError::Keyring {
                name,
                error: error.to_string(),
            }),
        }
    }
}
