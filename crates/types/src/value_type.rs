//! Declared and inferred configuration field types.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Type attached to a configuration field.
///
/// Annotations written in declaration text are parsed with [`FromStr`]; both
/// `Optional[int]` and `int?` produce [`ValueType::Optional`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Any,
    Str,
    Int,
    Float,
    Bool,
    Decimal,
    /// A string that must be kept out of logs and displays.
    Secret,
    List,
    Map,
    /// Connection descriptor resolvable from a compact connection string.
    Credentials,
    Optional(Box<ValueType>),
}

impl ValueType {
    /// Wraps the type in `Optional`; already optional types are returned unchanged.
    pub fn optional(self) -> Self {
        match self {
            ValueType::Optional(_) => self,
            other => ValueType::Optional(Box::new(other)),
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, ValueType::Optional(_))
    }

    /// The type with any `Optional` wrapper removed.
    pub fn inner(&self) -> &ValueType {
        match self {
            ValueType::Optional(inner) => inner.inner(),
            other => other,
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self.inner(), ValueType::Secret)
    }

    /// Structured values that may be satisfied attribute by attribute.
    pub fn is_structured(&self) -> bool {
        matches!(self.inner(), ValueType::Credentials)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Any => f.write_str("Any"),
            ValueType::Str => f.write_str("str"),
            ValueType::Int => f.write_str("int"),
            ValueType::Float => f.write_str("float"),
            ValueType::Bool => f.write_str("bool"),
            ValueType::Decimal => f.write_str("decimal"),
            ValueType::Secret => f.write_str("secret"),
            ValueType::List => f.write_str("list"),
            ValueType::Map => f.write_str("map"),
            ValueType::Credentials => f.write_str("credentials"),
            ValueType::Optional(inner) => write!(f, "Optional[{inner}]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown type annotation: {0}")]
pub struct UnknownTypeError(pub String);

impl FromStr for ValueType {
    type Err = UnknownTypeError;

    fn from_str(annotation: &str) -> Result<Self, Self::Err> {
        let trimmed = annotation.trim();
        if let Some(inner) = trimmed.strip_suffix('?') {
            return Ok(inner.parse::<ValueType>()?.optional());
        }
        if let Some(inner) = trimmed
            .strip_prefix("Optional[")
            .or_else(|| trimmed.strip_prefix("Option<"))
            .and_then(|rest| rest.strip_suffix(']').or_else(|| rest.strip_suffix('>')))
        {
            return Ok(inner.parse::<ValueType>()?.optional());
        }

        let parsed = match trimmed.to_ascii_lowercase().as_str() {
            "any" => ValueType::Any,
            "str" | "string" => ValueType::Str,
            "int" | "integer" | "i64" => ValueType::Int,
            "float" | "f64" => ValueType::Float,
            "bool" | "boolean" => ValueType::Bool,
            "decimal" => ValueType::Decimal,
            "secret" | "secret_str" | "tsecretvalue" => ValueType::Secret,
            "list" | "vec" => ValueType::List,
            "map" | "dict" => ValueType::Map,
            "credentials" | "connectionstringcredentials" => ValueType::Credentials,
            _ => return Err(UnknownTypeError(trimmed.to_string())),
        };
        Ok(parsed)
    }
}
