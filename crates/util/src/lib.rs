//! # Siphon Util
//!
//! Concrete configuration providers and the helpers they share.
//!
//! - **`providers`**: dictionary, environment, file and keychain providers
//! - **`chain`**: ordered provider chains and the default chain built from the environment
//! - **`keystore`**: OS keychain access and `${env:..}`/`${secret:..}` interpolation
//! - **`redact`**: scrubbing credential-like text before it reaches logs or errors

pub mod chain;
pub mod keystore;
pub mod providers;
mod redact;

pub use chain::{
    CONFIG_DIR_ENV_VAR, CONFIG_FILE_NAME, DEFAULT_PROJECT_DIR, ProviderChain, SECRETS_FILE_NAME, expand_tilde, global_config_dir,
    project_config_dir,
};
pub use keystore::{InterpolationError, KeychainProvider, SECRETS_BACKEND_ENV_VAR, SecretsBackend, interpolate_string, secrets_backend};
pub use providers::{DictionaryProvider, EnvironmentProvider, FileFormat, FileProvider};
pub use redact::redact_sensitive;
