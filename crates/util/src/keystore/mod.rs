//! OS keychain access and secret interpolation.

mod interpolation;
mod keychain;

pub use interpolation::{InterpolationError, SECRETS_BACKEND_ENV_VAR, SecretsBackend, interpolate_string, resolve_secret, secrets_backend};
pub use keychain::KeychainProvider;
