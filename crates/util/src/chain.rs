//! Ordered provider chains and the default chain built from the ambient environment.

use std::{
    env,
    path::{Path, PathBuf},
    sync::Arc,
};

use dirs_next::{config_dir, home_dir};
use siphon_types::{ConfigProvider, ProviderError};
use tracing::{debug, warn};

use crate::{
    keystore::{KeychainProvider, SecretsBackend, secrets_backend},
    providers::{EnvironmentProvider, FileProvider},
};

/// Environment variable overriding the project configuration directory.
pub const CONFIG_DIR_ENV_VAR: &str = "SIPHON_CONFIG_DIR";
pub const DEFAULT_PROJECT_DIR: &str = ".siphon";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const SECRETS_FILE_NAME: &str = "secrets.toml";

/// Expands a leading `~` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let trimmed = path.trim();
    if trimmed == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = trimmed.strip_prefix("~/").or_else(|| trimmed.strip_prefix("~\\")) {
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    PathBuf::from(trimmed)
}

/// Project configuration directory: `$SIPHON_CONFIG_DIR` or `./.siphon`.
pub fn project_config_dir() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_DIR_ENV_VAR)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }
    PathBuf::from(DEFAULT_PROJECT_DIR)
}

/// Per-user configuration directory, e.g. `~/.config/siphon`.
pub fn global_config_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("siphon"))
}

/// Providers in precedence order; the first one reporting a value wins.
#[derive(Debug, Clone, Default)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn ConfigProvider>>,
}

impl ProviderChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a provider with lower precedence than every provider already present.
    pub fn push(&mut self, provider: impl ConfigProvider + 'static) -> &mut Self {
        self.providers.push(Arc::new(provider));
        self
    }

    pub fn with(mut self, provider: impl ConfigProvider + 'static) -> Self {
        self.push(provider);
        self
    }

    /// Inserts a provider ahead of every provider already present.
    pub fn push_front(&mut self, provider: impl ConfigProvider + 'static) -> &mut Self {
        self.providers.insert(0, Arc::new(provider));
        self
    }

    pub fn push_shared(&mut self, provider: Arc<dyn ConfigProvider>) -> &mut Self {
        self.providers.push(provider);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ConfigProvider>> {
        self.providers.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.iter().map(|provider| provider.name().to_string()).collect()
    }

    /// Builds the default chain:
    /// environment, project secrets, project config, global secrets, global config, keychain.
    ///
    /// The keychain is only added for [`SecretsBackend::Keychain`]. Missing files are skipped
    /// silently; unreadable or malformed files are errors.
    pub fn from_environment() -> Result<Self, ProviderError> {
        let mut chain = Self::new();
        chain.push(EnvironmentProvider::new());
        chain.push_directory(&project_config_dir())?;
        if let Some(global) = global_config_dir() {
            chain.push_directory(&global)?;
        }

        match secrets_backend() {
            SecretsBackend::Keychain => {
                chain.push(KeychainProvider::new());
            }
            backend => debug!(?backend, "keychain provider not added"),
        }

        debug!(providers = ?chain.names(), "provider chain assembled");
        Ok(chain)
    }

    /// Adds the secrets then the config file of `dir`, skipping absent files.
    pub fn push_directory(&mut self, dir: &Path) -> Result<&mut Self, ProviderError> {
        for (file_name, secrets) in [(SECRETS_FILE_NAME, true), (CONFIG_FILE_NAME, false)] {
            let path = dir.join(file_name);
            if !path.is_file() {
                continue;
            }
            let provider = if secrets {
                FileProvider::secrets(&path)
            } else {
                FileProvider::config(&path)
            };
            match provider {
                Ok(provider) => {
                    self.push(provider);
                }
                Err(error @ ProviderError::Io { .. }) => {
                    warn!(path = %path.display(), %error, "configuration file could not be read");
                    return Err(error);
                }
                Err(error) => return Err(error),
            }
        }
        Ok(self)
    }
}
