//! Resolution of schema fields against the provider chain.

use indexmap::IndexMap;
use rust_decimal::Decimal;
use siphon_types::{
    CREDENTIAL_ATTRIBUTES, ConfigField, ConfigSchema, ConfigValue, ConnectionStringCredentials, Namespace, RequirementKind, SecretValue,
    ValueType,
};
use tracing::debug;

use crate::{
    binding::secret_of,
    coerce::{coerce_credentials, coerce_value, read_typed, redacted_raw},
    context::ResolutionContext,
    error::ConfigError,
};

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueOrigin {
    /// Supplied at the call site.
    Explicit,
    /// Reused from an active configuration of the same schema type.
    Active,
    /// Reported by the named provider.
    Provider(String),
    /// Assembled from individually resolved credential attributes.
    Attributes,
    Default,
}

/// Final values of one schema for one call, in schema order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedConfiguration {
    schema_name: String,
    namespace: Namespace,
    values: IndexMap<String, (ConfigValue, ValueOrigin)>,
}

impl ResolvedConfiguration {
    pub fn new(schema_name: impl Into<String>, namespace: Namespace) -> Self {
        Self {
            schema_name: schema_name.into(),
            namespace,
            values: IndexMap::new(),
        }
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn insert(&mut self, field: impl Into<String>, value: ConfigValue, origin: ValueOrigin) {
        self.values.insert(field.into(), (value, origin));
    }

    pub fn get(&self, field: &str) -> Option<&ConfigValue> {
        self.values.get(field).map(|(value, _)| value)
    }

    pub fn origin(&self, field: &str) -> Option<&ValueOrigin> {
        self.values.get(field).map(|(_, origin)| origin)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.values.iter().map(|(name, (value, _))| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The value of `field`, or [`ConfigError::FieldMissing`] when it was not resolved.
    pub fn require(&self, field: &str) -> Result<&ConfigValue, ConfigError> {
        self.get(field).ok_or_else(|| ConfigError::FieldMissing {
            field: field.to_string(),
            namespace: self.namespace.to_string(),
        })
    }

    fn typed<'a, T>(&'a self, field: &str, expected: ValueType, read: impl FnOnce(&'a ConfigValue) -> Option<T>) -> Result<T, ConfigError> {
        read_typed(field, &self.namespace.to_string(), self.require(field)?, expected, read)
    }

    pub fn get_str(&self, field: &str) -> Result<&str, ConfigError> {
        self.typed(field, ValueType::Str, ConfigValue::as_str)
    }

    /// `None` when the field resolved to null.
    pub fn get_opt_str(&self, field: &str) -> Result<Option<&str>, ConfigError> {
        self.typed(field, ValueType::Str.optional(), |value| match value {
            ConfigValue::Null => Some(None),
            other => other.as_str().map(Some),
        })
    }

    pub fn get_i64(&self, field: &str) -> Result<i64, ConfigError> {
        self.typed(field, ValueType::Int, ConfigValue::as_i64)
    }

    pub fn get_f64(&self, field: &str) -> Result<f64, ConfigError> {
        self.typed(field, ValueType::Float, ConfigValue::as_f64)
    }

    pub fn get_bool(&self, field: &str) -> Result<bool, ConfigError> {
        self.typed(field, ValueType::Bool, ConfigValue::as_bool)
    }

    pub fn get_decimal(&self, field: &str) -> Result<Decimal, ConfigError> {
        self.typed(field, ValueType::Decimal, ConfigValue::as_decimal)
    }

    pub fn get_secret(&self, field: &str) -> Result<SecretValue, ConfigError> {
        self.typed(field, ValueType::Secret, secret_of)
    }

    pub fn get_opt_secret(&self, field: &str) -> Result<Option<SecretValue>, ConfigError> {
        self.typed(field, ValueType::Secret.optional(), |value| match value {
            ConfigValue::Null => Some(None),
            other => secret_of(other).map(Some),
        })
    }

    pub fn get_credentials(&self, field: &str) -> Result<&ConnectionStringCredentials, ConfigError> {
        self.typed(field, ValueType::Credentials, ConfigValue::as_credentials)
    }
}

/// Resolves every field of `schema` under `namespace`.
///
/// Explicit values are bound as they are and no provider is asked for them. Remaining fields
/// reuse the innermost active configuration of the same schema type, then go to the providers
/// in precedence order. Secret fields are only asked of secret-capable providers. The first
/// provider reporting a value wins; there is no merging across providers.
pub fn resolve_configuration(
    schema: &ConfigSchema,
    namespace: &Namespace,
    explicit: &IndexMap<String, ConfigValue>,
    context: &ResolutionContext,
) -> Result<ResolvedConfiguration, ConfigError> {
    let active = context.active(schema.name()).cloned();
    let mut resolved = ResolvedConfiguration::new(schema.name(), namespace.clone());

    for field in schema.fields() {
        if let Some(value) = explicit.get(&field.name) {
            resolved.insert(&field.name, value.clone(), ValueOrigin::Explicit);
            continue;
        }
        if let Some(value) = active.as_ref().and_then(|configuration| configuration.get(&field.name)) {
            debug!(schema = %schema.name(), field = %field.name, "reusing active configuration value");
            resolved.insert(&field.name, value.clone(), ValueOrigin::Active);
            continue;
        }
        let (value, origin) = resolve_field(field, namespace, context)?;
        resolved.insert(&field.name, value, origin);
    }

    Ok(resolved)
}

fn resolve_field(field: &ConfigField, namespace: &Namespace, context: &ResolutionContext) -> Result<(ConfigValue, ValueOrigin), ConfigError> {
    if let Some((provider, raw)) = lookup(context, namespace, &field.name, field.secret, context.namespace_fallback())? {
        return match coerce_value(raw.clone(), &field.value_type) {
            Ok(value) => Ok((value, ValueOrigin::Provider(provider))),
            Err(reason) => {
                if field.value_type.is_structured()
                    && let Some(value) = resolve_attributes(field, namespace, context)?
                {
                    debug!(field = %field.name, "compact value rejected, credentials assembled from attributes");
                    return Ok((value, ValueOrigin::Attributes));
                }
                Err(ConfigError::TypeCoercion {
                    field: field.name.clone(),
                    namespace: namespace.to_string(),
                    expected: field.value_type.clone(),
                    raw: redacted_raw(&raw, field.secret),
                    reason,
                })
            }
        };
    }

    if field.value_type.is_structured()
        && let Some(value) = resolve_attributes(field, namespace, context)?
    {
        return Ok((value, ValueOrigin::Attributes));
    }

    match field.requirement {
        RequirementKind::OptionalWithDefault => Ok((field.default.clone().unwrap_or_default(), ValueOrigin::Default)),
        RequirementKind::RequiredFromSecret => Err(ConfigError::SecretFieldMissing {
            field: field.name.clone(),
            namespace: namespace.to_string(),
        }),
        RequirementKind::Required | RequirementKind::RequiredFromConfig => Err(ConfigError::FieldMissing {
            field: field.name.clone(),
            namespace: namespace.to_string(),
        }),
    }
}

/// Resolves each credential attribute as its own field under `namespace.<field>`.
///
/// Returns `None` when a required attribute is not found anywhere.
fn resolve_attributes(field: &ConfigField, namespace: &Namespace, context: &ResolutionContext) -> Result<Option<ConfigValue>, ConfigError> {
    let scope = namespace.child(&field.name);
    let mut attributes = IndexMap::new();
    for (attribute, required) in CREDENTIAL_ATTRIBUTES {
        let secret = field.secret || *attribute == "password";
        match lookup(context, &scope, attribute, secret, false)? {
            Some((_, value)) => {
                attributes.insert(attribute.to_string(), value);
            }
            None if *required => {
                debug!(field = %field.name, attribute, "credential attribute not found");
                return Ok(None);
            }
            None => {}
        }
    }

    coerce_credentials(ConfigValue::Map(attributes))
        .map(|credentials| Some(ConfigValue::Credentials(credentials)))
        .map_err(|reason| ConfigError::TypeCoercion {
            field: field.name.clone(),
            namespace: namespace.to_string(),
            expected: field.value_type.clone(),
            raw: "[attributes]".to_string(),
            reason,
        })
}

/// Asks providers in order for `field`; provider order is the outer loop, namespaces the inner.
fn lookup(
    context: &ResolutionContext,
    namespace: &Namespace,
    field: &str,
    secret: bool,
    fallback: bool,
) -> Result<Option<(String, ConfigValue)>, ConfigError> {
    let namespaces: Vec<Namespace> = if fallback {
        namespace.ancestors().collect()
    } else {
        vec![namespace.clone()]
    };

    for provider in context.chain().iter() {
        if secret && !provider.supports_secrets() {
            continue;
        }
        for scope in &namespaces {
            match provider.lookup(scope, field) {
                Ok(Some(value)) => {
                    debug!(provider = %provider.name(), namespace = %scope, field, "configuration value found");
                    return Ok(Some((provider.name().to_string(), value)));
                }
                Ok(None) => {}
                Err(source) => {
                    return Err(ConfigError::Provider {
                        provider: provider.name().to_string(),
                        field: field.to_string(),
                        namespace: scope.to_string(),
                        source,
                    });
                }
            }
        }
    }

    debug!(namespace = %namespace, field, secret, "configuration value not found");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use siphon_types::SchemaKey;
    use siphon_util::{DictionaryProvider, ProviderChain};

    use super::*;

    fn schema(fields: Vec<ConfigField>, namespace: Namespace) -> ConfigSchema {
        ConfigSchema::new("Spec", SchemaKey::new("m::f", true), namespace, fields)
    }

    fn context(providers: Vec<DictionaryProvider>) -> ResolutionContext {
        let mut chain = ProviderChain::new();
        for provider in providers {
            chain.push(provider);
        }
        ResolutionContext::new(chain)
    }

    #[test]
    fn first_provider_wins_and_values_are_coerced() {
        let ns = Namespace::new(["source", "github"]);
        let context = context(vec![
            DictionaryProvider::new("first").with_value("source.github.page_size", "25"),
            DictionaryProvider::new("second").with_value("source.github.page_size", "50"),
        ]);
        let schema = schema(vec![ConfigField::from_config("page_size", ValueType::Int)], ns.clone());
        let resolved = resolve_configuration(&schema, &ns, &IndexMap::new(), &context).unwrap();
        assert_eq!(resolved.get_i64("page_size").unwrap(), 25);
        assert_eq!(resolved.origin("page_size"), Some(&ValueOrigin::Provider("first".into())));
    }

    #[test]
    fn namespace_fallback_walks_to_root_per_provider() {
        let ns = Namespace::new(["source", "github"]);
        let context = context(vec![
            DictionaryProvider::new("general").with_value("org", "from-root"),
            DictionaryProvider::new("specific").with_value("source.github.org", "from-section"),
        ]);
        let schema = schema(vec![ConfigField::required("org", ValueType::Str)], ns.clone());
        let resolved = resolve_configuration(&schema, &ns, &IndexMap::new(), &context).unwrap();
        assert_eq!(resolved.get_str("org").unwrap(), "from-root");

        let strict = context.clone().without_namespace_fallback();
        let resolved = resolve_configuration(&schema, &ns, &IndexMap::new(), &strict).unwrap();
        assert_eq!(resolved.get_str("org").unwrap(), "from-section");
    }

    #[test]
    fn secret_fields_skip_non_secret_providers() {
        let context = context(vec![
            DictionaryProvider::new("config").with_value("token", "leaked"),
            DictionaryProvider::new("vault").secret_capable(true).with_value("token", "vaulted"),
        ]);
        let schema = schema(vec![ConfigField::from_secret("token", ValueType::Secret)], Namespace::root());
        let resolved = resolve_configuration(&schema, &Namespace::root(), &IndexMap::new(), &context).unwrap();
        assert_eq!(resolved.get_secret("token").unwrap().expose(), "vaulted");
    }

    #[test]
    fn missing_fields_report_kind_and_namespace() {
        let ns = Namespace::new(["source", "github"]);
        let context = context(vec![DictionaryProvider::new("config").with_value("source.github.token", "x")]);
        let secret = schema(vec![ConfigField::from_secret("token", ValueType::Secret)], ns.clone());
        assert!(matches!(
            resolve_configuration(&secret, &ns, &IndexMap::new(), &context),
            Err(ConfigError::SecretFieldMissing { field, namespace }) if field == "token" && namespace == "source.github"
        ));
        let required = schema(vec![ConfigField::required("org", ValueType::Str)], ns.clone());
        assert!(matches!(
            resolve_configuration(&required, &ns, &IndexMap::new(), &context),
            Err(ConfigError::FieldMissing { field, .. }) if field == "org"
        ));
    }

    #[test]
    fn optional_fields_fall_back_to_default() {
        let schema = schema(vec![ConfigField::optional("page_size", ValueType::Int, 100)], Namespace::root());
        let resolved = resolve_configuration(&schema, &Namespace::root(), &IndexMap::new(), &context(vec![])).unwrap();
        assert_eq!(resolved.get_i64("page_size").unwrap(), 100);
        assert_eq!(resolved.origin("page_size"), Some(&ValueOrigin::Default));
    }

    #[test]
    fn coercion_error_redacts_secret_values() {
        let context = context(vec![DictionaryProvider::new("vault").secret_capable(true).with_value("port", "s3cr3t")]);
        let schema = schema(vec![ConfigField::from_secret("port", ValueType::Int)], Namespace::root());
        let error = resolve_configuration(&schema, &Namespace::root(), &IndexMap::new(), &context).unwrap_err();
        match error {
            ConfigError::TypeCoercion { raw, field, .. } => {
                assert_eq!(field, "port");
                assert_eq!(raw, "[REDACTED]");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn credentials_assembled_from_attributes() {
        let ns = Namespace::new(["destination", "postgres"]);
        let context = context(vec![
            DictionaryProvider::new("config")
                .with_value("destination.postgres.credentials.drivername", "postgresql")
                .with_value("destination.postgres.credentials.username", "loader")
                .with_value("destination.postgres.credentials.host", "localhost")
                .with_value("destination.postgres.credentials.port", "5432")
                .with_value("destination.postgres.credentials.database", "dwh"),
            DictionaryProvider::new("vault")
                .secret_capable(true)
                .with_value("destination.postgres.credentials.password", "pw"),
        ]);
        let schema = schema(vec![ConfigField::from_config("credentials", ValueType::Credentials)], ns.clone());
        let resolved = resolve_configuration(&schema, &ns, &IndexMap::new(), &context).unwrap();
        let credentials = resolved.get_credentials("credentials").unwrap();
        assert_eq!(credentials.username, "loader");
        assert_eq!(credentials.port, Some(5432));
        assert_eq!(credentials.password.as_ref().map(SecretValue::expose), Some("pw"));
        assert_eq!(resolved.origin("credentials"), Some(&ValueOrigin::Attributes));
    }

    #[test]
    fn unparseable_compact_credentials_fall_back_to_attributes() {
        let ns = Namespace::new(["destination", "postgres"]);
        let context = context(vec![
            DictionaryProvider::new("config")
                .with_value("destination.postgres.credentials", "garbage")
                .with_value("destination.postgres.credentials.drivername", "postgresql")
                .with_value("destination.postgres.credentials.username", "loader")
                .with_value("destination.postgres.credentials.host", "localhost")
                .with_value("destination.postgres.credentials.database", "dwh"),
            DictionaryProvider::new("vault")
                .secret_capable(true)
                .with_value("destination.postgres.credentials.password", "pw"),
        ]);
        let schema = schema(vec![ConfigField::from_config("credentials", ValueType::Credentials)], ns.clone());
        let resolved = resolve_configuration(&schema, &ns, &IndexMap::new(), &context).unwrap();
        assert_eq!(resolved.origin("credentials"), Some(&ValueOrigin::Attributes));
        let credentials = resolved.get_credentials("credentials").unwrap();
        assert_eq!(credentials.host, "localhost");
        assert_eq!(credentials.database, "dwh");
        assert_eq!(credentials.password.as_ref().map(SecretValue::expose), Some("pw"));
    }

    #[test]
    fn unparseable_compact_credentials_without_attributes_fail_coercion() {
        let ns = Namespace::new(["destination", "postgres"]);
        let context = context(vec![DictionaryProvider::new("config").with_value("destination.postgres.credentials", "garbage")]);
        let schema = schema(vec![ConfigField::from_config("credentials", ValueType::Credentials)], ns.clone());
        let error = resolve_configuration(&schema, &ns, &IndexMap::new(), &context).unwrap_err();
        assert!(matches!(error, ConfigError::TypeCoercion { field, raw, .. } if field == "credentials" && raw == "garbage"));
    }
}
