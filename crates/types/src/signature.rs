//! Parameter lists of configurable callables.
//!
//! A [`Signature`] is the statically declared counterpart of a function's parameter
//! list. Each parameter states its kind, an optional type annotation, and a
//! [`ParamDefault`] tag, so requirement kinds never have to be guessed from an
//! evaluated default.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ConfigValue, RequirementKind, ValueType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    PositionalOnly,
    PositionalOrKeyword,
    /// Collects surplus positional arguments (`*args`).
    VarPositional,
    KeywordOnly,
    /// Collects surplus keyword arguments (`**kwargs`).
    VarKeyword,
}

impl ParameterKind {
    pub fn is_variadic(self) -> bool {
        matches!(self, ParameterKind::VarPositional | ParameterKind::VarKeyword)
    }

    pub fn accepts_positional(self) -> bool {
        matches!(self, ParameterKind::PositionalOnly | ParameterKind::PositionalOrKeyword)
    }

    pub fn accepts_keyword(self) -> bool {
        matches!(self, ParameterKind::PositionalOrKeyword | ParameterKind::KeywordOnly)
    }
}

/// Distinguished default meaning "must be resolved externally".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentinel {
    /// Resolve from non-secret configuration.
    Config,
    /// Resolve from a secret-capable provider.
    Secret,
}

impl Sentinel {
    pub fn requirement(self) -> RequirementKind {
        match self {
            Sentinel::Config => RequirementKind::RequiredFromConfig,
            Sentinel::Secret => RequirementKind::RequiredFromSecret,
        }
    }
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentinel::Config => f.write_str("config.value"),
            Sentinel::Secret => f.write_str("secrets.value"),
        }
    }
}

/// Default attached to a parameter.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ParamDefault {
    #[default]
    Absent,
    /// A concrete literal default; `ConfigValue::Null` stands for `None`.
    Value(ConfigValue),
    Sentinel(Sentinel),
    /// A default exists but cannot be inspected directly; only its declaration text is known.
    Opaque,
}

impl ParamDefault {
    pub fn is_absent(&self) -> bool {
        matches!(self, ParamDefault::Absent)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
    pub annotation: Option<ValueType>,
    pub default: ParamDefault,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            annotation: None,
            default: ParamDefault::Absent,
        }
    }

    /// A positional-or-keyword parameter, the common case.
    pub fn positional(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::PositionalOrKeyword)
    }

    pub fn positional_only(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::PositionalOnly)
    }

    pub fn keyword_only(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::KeywordOnly)
    }

    pub fn var_positional(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::VarPositional)
    }

    pub fn var_keyword(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::VarKeyword)
    }

    pub fn annotated(mut self, value_type: ValueType) -> Self {
        self.annotation = Some(value_type);
        self
    }

    pub fn with_default(mut self, value: impl Into<ConfigValue>) -> Self {
        self.default = ParamDefault::Value(value.into());
        self
    }

    pub fn from_config(mut self) -> Self {
        self.default = ParamDefault::Sentinel(Sentinel::Config);
        self
    }

    pub fn from_secret(mut self) -> Self {
        self.default = ParamDefault::Sentinel(Sentinel::Secret);
        self
    }

    pub fn with_opaque_default(mut self) -> Self {
        self.default = ParamDefault::Opaque;
        self
    }
}

/// Ordered parameter list of a callable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
    parameters: Vec<Parameter>,
}

impl Signature {
    pub fn new(parameters: Vec<Parameter>) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|parameter| parameter.name == name)
    }

    pub fn var_positional(&self) -> Option<&Parameter> {
        self.parameters.iter().find(|parameter| parameter.kind == ParameterKind::VarPositional)
    }

    pub fn var_keyword(&self) -> Option<&Parameter> {
        self.parameters.iter().find(|parameter| parameter.kind == ParameterKind::VarKeyword)
    }
}

impl FromIterator<Parameter> for Signature {
    fn from_iter<T: IntoIterator<Item = Parameter>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// One argument supplied at a call site.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Value(ConfigValue),
    /// Bound to a sentinel; the field is resolved as if it had been omitted.
    Placeholder(Sentinel),
}

impl Argument {
    pub fn value(value: impl Into<ConfigValue>) -> Self {
        Argument::Value(value.into())
    }

    /// The bound value, or the sentinel when the argument was never resolved.
    pub fn as_value(&self) -> Result<&ConfigValue, Sentinel> {
        match self {
            Argument::Value(value) => Ok(value),
            Argument::Placeholder(sentinel) => Err(*sentinel),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Argument::Placeholder(_))
    }
}
