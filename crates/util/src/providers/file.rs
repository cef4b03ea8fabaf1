use std::{
    fs,
    path::{Path, PathBuf},
};

use siphon_types::{ConfigProvider, ConfigValue, Namespace, ProviderError};
use tracing::debug;

use crate::keystore::interpolate_string;

/// Document format of a configuration file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Toml,
    Yaml,
    Json,
}

impl FileFormat {
    /// Detects the format from the file extension; unknown extensions read as TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|extension| extension.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("yaml" | "yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Toml,
        }
    }

    fn parse(self, content: &str) -> Result<serde_json::Value, String> {
        match self {
            FileFormat::Toml => toml::from_str(content).map_err(|error| error.to_string()),
            FileFormat::Yaml => serde_yaml::from_str(content).map_err(|error| error.to_string()),
            FileFormat::Json => serde_json::from_str(content).map_err(|error| error.to_string()),
        }
    }
}

/// Provider backed by a nested configuration document.
///
/// `source.github.api_key` is found under `[source.github] api_key = ...` in TOML (or the
/// equivalent nesting in YAML/JSON). String values go through `${env:..}`/`${secret:..}`
/// interpolation when looked up, so a missing variable only fails the field that needs it.
#[derive(Debug, Clone)]
pub struct FileProvider {
    name: String,
    path: PathBuf,
    secrets: bool,
    document: ConfigValue,
}

impl FileProvider {
    /// Loads `path`; a missing file yields an empty provider.
    pub fn load(name: impl Into<String>, path: impl Into<PathBuf>, secrets: bool) -> Result<Self, ProviderError> {
        let path = path.into();
        let name = name.into();
        if !path.exists() {
            debug!(provider = %name, path = %path.display(), "configuration file not present");
            return Ok(Self {
                name,
                path,
                secrets,
                document: ConfigValue::Null,
            });
        }

        let content = fs::read_to_string(&path).map_err(|source| ProviderError::Io { path: path.clone(), source })?;
        let parsed = FileFormat::from_path(&path)
            .parse(&content)
            .map_err(|message| ProviderError::Parse { path: path.clone(), message })?;
        debug!(provider = %name, path = %path.display(), "configuration file loaded");
        Ok(Self {
            name,
            path,
            secrets,
            document: ConfigValue::from_json(parsed),
        })
    }

    /// Non-secret configuration file (`config.toml`).
    pub fn config(path: impl Into<PathBuf>) -> Result<Self, ProviderError> {
        let path = path.into();
        Self::load(format!("config file {}", path.display()), path, false)
    }

    /// Secret-capable file (`secrets.toml`).
    pub fn secrets(path: impl Into<PathBuf>) -> Result<Self, ProviderError> {
        let path = path.into();
        Self::load(format!("secrets file {}", path.display()), path, true)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_empty(&self) -> bool {
        self.document.as_map().is_none_or(|map| map.is_empty())
    }

    fn navigate(&self, namespace: &Namespace, field: &str) -> Option<&ConfigValue> {
        let mut current = &self.document;
        for segment in namespace.segments().iter().map(String::as_str).chain(std::iter::once(field)) {
            current = current.as_map()?.get(segment)?;
        }
        Some(current)
    }
}

fn interpolate(provider: &str, value: &ConfigValue) -> Result<ConfigValue, ProviderError> {
    let backend = |error: crate::InterpolationError| ProviderError::Backend {
        provider: provider.to_string(),
        message: error.to_string(),
    };
    Ok(match value {
        ConfigValue::Str(text) => ConfigValue::Str(interpolate_string(text).map_err(backend)?),
        ConfigValue::List(items) => ConfigValue::List(items.iter().map(|item| interpolate(provider, item)).collect::<Result<_, _>>()?),
        ConfigValue::Map(entries) => ConfigValue::Map(
            entries
                .iter()
                .map(|(key, item)| interpolate(provider, item).map(|item| (key.clone(), item)))
                .collect::<Result<_, _>>()?,
        ),
        other => other.clone(),
    })
}

impl ConfigProvider for FileProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_secrets(&self) -> bool {
        self.secrets
    }

    fn lookup(&self, namespace: &Namespace, field: &str) -> Result<Option<ConfigValue>, ProviderError> {
        match self.navigate(namespace, field) {
            Some(value) => interpolate(&self.name, value).map(Some),
            None => Ok(None),
        }
    }
}
