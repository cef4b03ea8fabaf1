//! Conversion of raw provider values into declared field types.

use std::str::FromStr;

use rust_decimal::{Decimal, prelude::ToPrimitive};
use siphon_types::{ConfigValue, ConnectionStringCredentials, SecretValue, ValueType};
use siphon_util::redact_sensitive;

use crate::error::ConfigError;

/// Text of `value` safe to place in an error message.
pub(crate) fn redacted_raw(value: &ConfigValue, secret: bool) -> String {
    match value {
        ConfigValue::Secret(_) => "[REDACTED]".to_string(),
        _ if secret => "[REDACTED]".to_string(),
        other => redact_sensitive(&other.to_string()),
    }
}

/// Reads an already resolved value as `T`, reporting a type error for `field` otherwise.
pub(crate) fn read_typed<'a, T>(
    field: &str,
    namespace: &str,
    value: &'a ConfigValue,
    expected: ValueType,
    read: impl FnOnce(&'a ConfigValue) -> Option<T>,
) -> Result<T, ConfigError> {
    read(value).ok_or_else(|| ConfigError::TypeCoercion {
        field: field.to_string(),
        namespace: namespace.to_string(),
        expected,
        raw: redacted_raw(value, false),
        reason: format!("holds a {}", value.value_type()),
    })
}

/// Coerces `raw` into `target`. The error is a short reason, without the raw value.
///
/// Strings are parsed into scalars; lists and maps accept JSON text; credentials accept the
/// compact connection string or a map of attributes. `Null` is only accepted by optional types.
pub fn coerce_value(raw: ConfigValue, target: &ValueType) -> Result<ConfigValue, String> {
    match target {
        ValueType::Optional(_) if raw.is_null() => Ok(ConfigValue::Null),
        ValueType::Optional(inner) => coerce_value(raw, inner),
        ValueType::Any => Ok(raw),
        _ if raw.is_null() => Err("value is null".to_string()),
        ValueType::Str => coerce_str(raw),
        ValueType::Int => coerce_int(raw),
        ValueType::Float => coerce_float(raw),
        ValueType::Bool => coerce_bool(raw),
        ValueType::Decimal => coerce_decimal(raw),
        ValueType::Secret => match raw {
            ConfigValue::Secret(secret) => Ok(ConfigValue::Secret(secret)),
            ConfigValue::List(_) | ConfigValue::Map(_) | ConfigValue::Credentials(_) => Err("expected a scalar value".to_string()),
            other => Ok(ConfigValue::Secret(SecretValue::new(plain_text(&other)))),
        },
        ValueType::List => match raw {
            ConfigValue::List(values) => Ok(ConfigValue::List(values)),
            ConfigValue::Str(text) => match parse_json(&text)? {
                value @ ConfigValue::List(_) => Ok(value),
                _ => Err("expected a JSON array".to_string()),
            },
            _ => Err("expected a list".to_string()),
        },
        ValueType::Map => match raw {
            ConfigValue::Map(values) => Ok(ConfigValue::Map(values)),
            ConfigValue::Str(text) => match parse_json(&text)? {
                value @ ConfigValue::Map(_) => Ok(value),
                _ => Err("expected a JSON object".to_string()),
            },
            _ => Err("expected a map".to_string()),
        },
        ValueType::Credentials => coerce_credentials(raw).map(ConfigValue::Credentials),
    }
}

/// Text of a scalar, exposing secrets. Only used to feed parsers.
fn plain_text(value: &ConfigValue) -> String {
    match value {
        ConfigValue::Secret(secret) => secret.expose().to_string(),
        other => other.to_string(),
    }
}

fn parse_json(text: &str) -> Result<ConfigValue, String> {
    serde_json::from_str::<serde_json::Value>(text)
        .map(ConfigValue::from_json)
        .map_err(|error| format!("invalid JSON: {error}"))
}

fn coerce_str(raw: ConfigValue) -> Result<ConfigValue, String> {
    match raw {
        ConfigValue::Str(text) => Ok(ConfigValue::Str(text)),
        ConfigValue::List(_) | ConfigValue::Map(_) => Err("expected a scalar value".to_string()),
        other => Ok(ConfigValue::Str(plain_text(&other))),
    }
}

fn coerce_int(raw: ConfigValue) -> Result<ConfigValue, String> {
    match raw {
        ConfigValue::Int(value) => Ok(ConfigValue::Int(value)),
        ConfigValue::Float(value) if value.fract() == 0.0 && value.abs() < i64::MAX as f64 => Ok(ConfigValue::Int(value as i64)),
        ConfigValue::Decimal(value) if value.fract().is_zero() => value.to_i64().map(ConfigValue::Int).ok_or_else(|| "integer out of range".to_string()),
        ConfigValue::Str(_) | ConfigValue::Secret(_) => plain_text(&raw)
            .trim()
            .parse::<i64>()
            .map(ConfigValue::Int)
            .map_err(|error| error.to_string()),
        _ => Err("expected an integer".to_string()),
    }
}

fn coerce_float(raw: ConfigValue) -> Result<ConfigValue, String> {
    match raw {
        ConfigValue::Float(value) => Ok(ConfigValue::Float(value)),
        ConfigValue::Int(value) => Ok(ConfigValue::Float(value as f64)),
        ConfigValue::Decimal(value) => value.to_f64().map(ConfigValue::Float).ok_or_else(|| "decimal out of range".to_string()),
        ConfigValue::Str(_) | ConfigValue::Secret(_) => plain_text(&raw)
            .trim()
            .parse::<f64>()
            .map(ConfigValue::Float)
            .map_err(|error| error.to_string()),
        _ => Err("expected a number".to_string()),
    }
}

fn coerce_bool(raw: ConfigValue) -> Result<ConfigValue, String> {
    match raw {
        ConfigValue::Bool(value) => Ok(ConfigValue::Bool(value)),
        ConfigValue::Int(0) => Ok(ConfigValue::Bool(false)),
        ConfigValue::Int(1) => Ok(ConfigValue::Bool(true)),
        ConfigValue::Str(_) | ConfigValue::Secret(_) => match plain_text(&raw).trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "y" | "on" => Ok(ConfigValue::Bool(true)),
            "false" | "0" | "no" | "n" | "off" => Ok(ConfigValue::Bool(false)),
            _ => Err("expected true/false".to_string()),
        },
        _ => Err("expected a boolean".to_string()),
    }
}

fn coerce_decimal(raw: ConfigValue) -> Result<ConfigValue, String> {
    match raw {
        ConfigValue::Decimal(value) => Ok(ConfigValue::Decimal(value)),
        ConfigValue::Int(value) => Ok(ConfigValue::Decimal(Decimal::from(value))),
        ConfigValue::Float(value) => Decimal::try_from(value).map(ConfigValue::Decimal).map_err(|error| error.to_string()),
        ConfigValue::Str(_) | ConfigValue::Secret(_) => Decimal::from_str(plain_text(&raw).trim())
            .map(ConfigValue::Decimal)
            .map_err(|error| error.to_string()),
        _ => Err("expected a decimal".to_string()),
    }
}

/// Credentials from a connection string or a map of attributes.
pub(crate) fn coerce_credentials(raw: ConfigValue) -> Result<ConnectionStringCredentials, String> {
    match raw {
        ConfigValue::Credentials(credentials) => Ok(credentials),
        ConfigValue::Str(_) | ConfigValue::Secret(_) => ConnectionStringCredentials::parse(&plain_text(&raw)).map_err(|error| error.to_string()),
        ConfigValue::Map(attributes) => ConnectionStringCredentials::from_attributes(&attributes).map_err(|error| error.to_string()),
        _ => Err("expected a connection string".to_string()),
    }
}
