use std::env::{self, VarError};

use siphon_types::{ConfigProvider, ConfigValue, Namespace, ProviderError};
use tracing::debug;

/// Separator placed between namespace segments in variable names.
pub const ENV_SEPARATOR: &str = "__";

/// Provider reading process environment variables.
///
/// `source.github.api_key` maps to `SOURCE__GITHUB__API_KEY`, optionally prefixed
/// (`MYAPP__SOURCE__GITHUB__API_KEY`). Values come back as strings.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentProvider {
    prefix: Option<String>,
}

impl EnvironmentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    /// Name of the variable consulted for a field.
    pub fn env_key(&self, namespace: &Namespace, field: &str) -> String {
        self.prefix
            .iter()
            .map(String::as_str)
            .chain(namespace.segments().iter().map(String::as_str))
            .chain(std::iter::once(field))
            .collect::<Vec<_>>()
            .join(ENV_SEPARATOR)
            .to_ascii_uppercase()
    }
}

impl ConfigProvider for EnvironmentProvider {
    fn name(&self) -> &str {
        "environment"
    }

    fn supports_secrets(&self) -> bool {
        true
    }

    fn lookup(&self, namespace: &Namespace, field: &str) -> Result<Option<ConfigValue>, ProviderError> {
        let key = self.env_key(namespace, field);
        match env::var(&key) {
            Ok(value) => {
                debug!(key = %key, "environment variable found");
                Ok(Some(ConfigValue::Str(value)))
            }
            Err(VarError::NotPresent) => Ok(None),
            Err(VarError::NotUnicode(_)) => Err(ProviderError::Backend {
                provider: self.name().to_string(),
                message: format!("environment variable {key} is not valid unicode"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_key_upper_cases_and_joins_segments() {
        let namespace = Namespace::new(["source", "github"]);
        assert_eq!(EnvironmentProvider::new().env_key(&namespace, "api_key"), "SOURCE__GITHUB__API_KEY");
        assert_eq!(EnvironmentProvider::with_prefix("siphon").env_key(&Namespace::root(), "log_level"), "SIPHON__LOG_LEVEL");
    }

    #[test]
    fn reads_present_variables_only() {
        temp_env::with_vars(
            [("SOURCE__GITHUB__ORG", Some("dlt-hub")), ("SOURCE__GITHUB__REPO", None::<&str>)],
            || {
                let provider = EnvironmentProvider::new();
                let namespace = Namespace::new(["source", "github"]);
                assert_eq!(provider.lookup(&namespace, "org").unwrap(), Some(ConfigValue::from("dlt-hub")));
                assert_eq!(provider.lookup(&namespace, "repo").unwrap(), None);
            },
        );
    }
}
