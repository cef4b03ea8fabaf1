//! Dynamically typed configuration values.

use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;

use crate::{ConnectionStringCredentials, ValueType};

/// A string that must never be printed or logged.
///
/// Cloning shares the underlying secret; `Debug` and `Display` always redact.
#[derive(Clone)]
pub struct SecretValue(Arc<SecretString>);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Arc::new(SecretString::from(value.into())))
    }

    /// Returns the plain secret. Callers are responsible for keeping it out of logs.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretValue([REDACTED])")
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl PartialEq for SecretValue {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl From<&str> for SecretValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SecretValue {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// A configuration value as supplied by a provider, a caller, or a declared default.
///
/// Providers usually hand back `Str` values; the resolver coerces them into the
/// field's declared [`ValueType`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConfigValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Str(String),
    Secret(SecretValue),
    List(Vec<ConfigValue>),
    Map(IndexMap<String, ConfigValue>),
    Credentials(ConnectionStringCredentials),
}

impl ConfigValue {
    /// Runtime type of the value, used to infer a field type when no annotation exists.
    ///
    /// `Null` infers `Optional[Any]`.
    pub fn value_type(&self) -> ValueType {
        match self {
            ConfigValue::Null => ValueType::Any.optional(),
            ConfigValue::Bool(_) => ValueType::Bool,
            ConfigValue::Int(_) => ValueType::Int,
            ConfigValue::Float(_) => ValueType::Float,
            ConfigValue::Decimal(_) => ValueType::Decimal,
            ConfigValue::Str(_) => ValueType::Str,
            ConfigValue::Secret(_) => ValueType::Secret,
            ConfigValue::List(_) => ValueType::List,
            ConfigValue::Map(_) => ValueType::Map,
            ConfigValue::Credentials(_) => ValueType::Credentials,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(value) => Some(*value),
            ConfigValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            ConfigValue::Decimal(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_secret(&self) -> Option<&SecretValue> {
        match self {
            ConfigValue::Secret(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, ConfigValue>> {
        match self {
            ConfigValue::Map(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_credentials(&self) -> Option<&ConnectionStringCredentials> {
        match self {
            ConfigValue::Credentials(value) => Some(value),
            _ => None,
        }
    }

    /// Converts a JSON document fragment (from a file provider or a compact JSON string).
    ///
    /// Integers that fit `i64` stay integral; every other number becomes a float.
    pub fn from_json(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => ConfigValue::Null,
            JsonValue::Bool(value) => ConfigValue::Bool(value),
            JsonValue::Number(number) => match number.as_i64() {
                Some(integer) => ConfigValue::Int(integer),
                None => ConfigValue::Float(number.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(value) => ConfigValue::Str(value),
            JsonValue::Array(values) => ConfigValue::List(values.into_iter().map(ConfigValue::from_json).collect()),
            JsonValue::Object(map) => ConfigValue::Map(map.into_iter().map(|(key, value)| (key, ConfigValue::from_json(value))).collect()),
        }
    }
}

/// Renders the value for diagnostics. Secrets and credential passwords stay redacted.
impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Null => f.write_str("null"),
            ConfigValue::Bool(value) => write!(f, "{value}"),
            ConfigValue::Int(value) => write!(f, "{value}"),
            ConfigValue::Float(value) => write!(f, "{value}"),
            ConfigValue::Decimal(value) => write!(f, "{value}"),
            ConfigValue::Str(value) => f.write_str(value),
            ConfigValue::Secret(value) => write!(f, "{value}"),
            ConfigValue::List(values) => {
                f.write_str("[")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
            ConfigValue::Map(map) => {
                f.write_str("{")?;
                for (index, (key, value)) in map.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            ConfigValue::Credentials(credentials) => write!(f, "{credentials}"),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Str(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Str(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        ConfigValue::Int(i64::from(value))
    }
}

impl From<u16> for ConfigValue {
    fn from(value: u16) -> Self {
        ConfigValue::Int(i64::from(value))
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<Decimal> for ConfigValue {
    fn from(value: Decimal) -> Self {
        ConfigValue::Decimal(value)
    }
}

impl From<SecretValue> for ConfigValue {
    fn from(value: SecretValue) -> Self {
        ConfigValue::Secret(value)
    }
}

impl From<ConnectionStringCredentials> for ConfigValue {
    fn from(value: ConnectionStringCredentials) -> Self {
        ConfigValue::Credentials(value)
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(values: Vec<ConfigValue>) -> Self {
        ConfigValue::List(values)
    }
}

impl From<IndexMap<String, ConfigValue>> for ConfigValue {
    fn from(map: IndexMap<String, ConfigValue>) -> Self {
        ConfigValue::Map(map)
    }
}

impl<T: Into<ConfigValue>> From<Option<T>> for ConfigValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ConfigValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn secret_value_never_prints_its_content() {
        let secret = SecretValue::new("hunter2");
        assert_eq!(format!("{secret:?}"), "SecretValue([REDACTED])");
        assert_eq!(ConfigValue::Secret(secret.clone()).to_string(), "[REDACTED]");
        assert_eq!(secret.expose(), "hunter2");
    }

    #[test]
    fn json_numbers_keep_integers_integral() {
        let value = ConfigValue::from_json(json!({"page_size": 100, "ratio": 0.5, "tags": ["a"]}));
        let map = value.as_map().expect("map");
        assert_eq!(map["page_size"], ConfigValue::Int(100));
        assert_eq!(map["ratio"], ConfigValue::Float(0.5));
        assert_eq!(map["tags"], ConfigValue::List(vec![ConfigValue::from("a")]));
    }

    #[test]
    fn null_infers_optional_any() {
        assert_eq!(ConfigValue::Null.value_type(), ValueType::Optional(Box::new(ValueType::Any)));
        assert_eq!(ConfigValue::from("x").value_type(), ValueType::Str);
    }
}
