use indexmap::IndexMap;
use siphon_types::{ConfigProvider, ConfigValue, Namespace, ProviderError};

/// In-memory provider holding values keyed by dotted path (`source.github.api_key`).
///
/// Used to inject contextual state ahead of files and the environment.
#[derive(Debug, Clone)]
pub struct DictionaryProvider {
    name: String,
    secrets: bool,
    values: IndexMap<String, ConfigValue>,
}

impl DictionaryProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            secrets: false,
            values: IndexMap::new(),
        }
    }

    /// Marks the provider as allowed to answer secret fields.
    pub fn secret_capable(mut self, secrets: bool) -> Self {
        self.secrets = secrets;
        self
    }

    pub fn with_value(mut self, path: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.insert(path, value);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, value: impl Into<ConfigValue>) {
        self.values.insert(path.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ConfigProvider for DictionaryProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_secrets(&self) -> bool {
        self.secrets
    }

    fn lookup(&self, namespace: &Namespace, field: &str) -> Result<Option<ConfigValue>, ProviderError> {
        Ok(self.values.get(&namespace.path_of(field)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_by_dotted_path() {
        let provider = DictionaryProvider::new("context").with_value("source.github.org", "dlt-hub");
        let namespace = Namespace::new(["source", "github"]);
        assert_eq!(provider.lookup(&namespace, "org").unwrap(), Some(ConfigValue::from("dlt-hub")));
        assert_eq!(provider.lookup(&Namespace::root(), "org").unwrap(), None);
        assert!(!provider.supports_secrets());
    }
}
