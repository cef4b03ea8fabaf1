//! Identity and parameter list of a configurable callable.

use siphon_types::{Parameter, ParameterKind, Signature, ValueType};
use tracing::debug;

use crate::{
    error::ConfigError,
    literal::{parameter_list, split_default, split_parameters},
};

/// A callable registered for configuration injection.
///
/// The identity is the fully qualified name used as the schema cache key
/// (`github::issues_source`). When declaration text is attached, parameters whose default
/// is [`ParamDefault::Opaque`](siphon_types::ParamDefault::Opaque) are classified from it.
#[derive(Debug, Clone, PartialEq)]
pub struct CallableDef {
    identity: String,
    signature: Signature,
    declaration: Option<String>,
}

impl CallableDef {
    pub fn new(identity: impl Into<String>, signature: Signature) -> Self {
        Self {
            identity: identity.into(),
            signature,
            declaration: None,
        }
    }

    /// Builds the callable from declaration text such as
    /// `issues(api_key: secret = secrets.value, page_size: int = 100, *args, **kwargs)`.
    ///
    /// Defaults are kept as opaque and never evaluated.
    pub fn from_declaration(identity: impl Into<String>, declaration: impl Into<String>) -> Result<Self, ConfigError> {
        let declaration = declaration.into();
        let signature = parse_signature(&declaration)?;
        Ok(Self {
            identity: identity.into(),
            signature,
            declaration: Some(declaration),
        })
    }

    /// Attaches declaration text used to classify opaque defaults.
    pub fn with_declaration(mut self, declaration: impl Into<String>) -> Self {
        self.declaration = Some(declaration.into());
        self
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Last path segment of the identity, e.g. `issues_source`.
    pub fn short_name(&self) -> &str {
        self.identity.rsplit([':', '.']).next().unwrap_or(&self.identity)
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn declaration(&self) -> Option<&str> {
        self.declaration.as_deref()
    }
}

/// Parses the parameter list of a declaration into a [`Signature`].
///
/// Understands `/` (preceding parameters are positional-only), bare `*` and `*args`
/// (following parameters are keyword-only) and `**kwargs`. Unrecognized annotations read as `Any`.
pub fn parse_signature(declaration: &str) -> Result<Signature, ConfigError> {
    let mut parameters: Vec<Parameter> = Vec::new();
    let mut keyword_only = false;

    for part in split_parameters(parameter_list(declaration)?) {
        let (head, default) = split_default(part);
        let (name, annotation) = match head.split_once(':') {
            Some((name, annotation)) => (name.trim(), Some(annotation.trim())),
            None => (head, None),
        };

        if name == "/" {
            for parameter in parameters.iter_mut() {
                parameter.kind = ParameterKind::PositionalOnly;
            }
            continue;
        }
        if name == "*" {
            keyword_only = true;
            continue;
        }

        let mut parameter = if let Some(collector) = name.strip_prefix("**") {
            Parameter::var_keyword(collector)
        } else if let Some(collector) = name.strip_prefix('*') {
            keyword_only = true;
            Parameter::var_positional(collector)
        } else if keyword_only {
            Parameter::keyword_only(name)
        } else {
            Parameter::positional(name)
        };

        if !is_identifier(&parameter.name) {
            return Err(ConfigError::declaration(format!("'{}' is not a valid parameter name", parameter.name)));
        }
        if parameters.iter().any(|existing| existing.name == parameter.name) {
            return Err(ConfigError::declaration(format!("duplicate parameter '{}'", parameter.name)));
        }
        if default.is_some() && parameter.kind.is_variadic() {
            return Err(ConfigError::declaration(format!("variadic parameter '{}' cannot have a default", parameter.name)));
        }

        if let Some(annotation) = annotation {
            let value_type = annotation.parse::<ValueType>().unwrap_or_else(|error| {
                debug!(parameter = %parameter.name, annotation = %error.0, "unrecognized annotation, using Any");
                ValueType::Any
            });
            parameter = parameter.annotated(value_type);
        }
        if default.is_some() {
            parameter = parameter.with_opaque_default();
        }
        parameters.push(parameter);
    }

    Ok(Signature::new(parameters))
}

fn is_identifier(name: &str) -> bool {
    let mut characters = name.chars();
    characters.next().is_some_and(|first| first.is_alphabetic() || first == '_')
        && characters.all(|character| character.is_alphanumeric() || character == '_')
}
