//! Configuration fields and schemas.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{ConfigValue, Namespace, ParameterKind, ValueType};

/// How a field obtains its value. Fixed when the schema is synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    Required,
    OptionalWithDefault,
    RequiredFromConfig,
    RequiredFromSecret,
}

impl RequirementKind {
    pub fn has_default(self) -> bool {
        matches!(self, RequirementKind::OptionalWithDefault)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigField {
    pub name: String,
    pub value_type: ValueType,
    pub requirement: RequirementKind,
    /// Present only for [`RequirementKind::OptionalWithDefault`].
    pub default: Option<ConfigValue>,
    pub parameter_kind: ParameterKind,
    /// Resolved values are kept as secrets.
    pub secret: bool,
}

impl ConfigField {
    fn new(name: impl Into<String>, value_type: ValueType, requirement: RequirementKind, default: Option<ConfigValue>) -> Self {
        let secret = value_type.is_secret() || requirement == RequirementKind::RequiredFromSecret;
        Self {
            name: name.into(),
            value_type,
            requirement,
            default,
            parameter_kind: ParameterKind::PositionalOrKeyword,
            secret,
        }
    }

    pub fn required(name: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(name, value_type, RequirementKind::Required, None)
    }

    pub fn optional(name: impl Into<String>, value_type: ValueType, default: impl Into<ConfigValue>) -> Self {
        Self::new(name, value_type, RequirementKind::OptionalWithDefault, Some(default.into()))
    }

    pub fn from_config(name: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(name, value_type, RequirementKind::RequiredFromConfig, None)
    }

    pub fn from_secret(name: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(name, value_type, RequirementKind::RequiredFromSecret, None)
    }

    pub fn with_parameter_kind(mut self, kind: ParameterKind) -> Self {
        self.parameter_kind = kind;
        self
    }
}

/// Cache identity of a synthesized schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaKey {
    /// Fully qualified identity of the callable, e.g. `github::issues_source`.
    pub identity: String,
    pub include_defaults: bool,
}

impl SchemaKey {
    pub fn new(identity: impl Into<String>, include_defaults: bool) -> Self {
        Self {
            identity: identity.into(),
            include_defaults,
        }
    }
}

impl fmt::Display for SchemaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[include_defaults={}]", self.identity, self.include_defaults)
    }
}

/// Ordered set of fields derived for one callable.
///
/// `name` is the schema's declared type; nested calls requesting a configuration of
/// the same type reuse an active instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSchema {
    name: String,
    key: SchemaKey,
    namespace: Namespace,
    fields: IndexMap<String, ConfigField>,
}

impl ConfigSchema {
    /// Builds a schema; on duplicate names the first field wins.
    pub fn new(name: impl Into<String>, key: SchemaKey, namespace: Namespace, fields: impl IntoIterator<Item = ConfigField>) -> Self {
        let mut ordered = IndexMap::new();
        for field in fields {
            ordered.entry(field.name.clone()).or_insert(field);
        }
        Self {
            name: name.into(),
            key,
            namespace,
            fields: ordered,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &SchemaKey {
        &self.key
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn fields(&self) -> impl Iterator<Item = &ConfigField> {
        self.fields.values()
    }

    pub fn field(&self, name: &str) -> Option<&ConfigField> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Field name to type, in declaration order.
    pub fn resolvable_fields(&self) -> IndexMap<String, ValueType> {
        self.fields
            .values()
            .map(|field| (field.name.clone(), field.value_type.clone()))
            .collect()
    }
}
