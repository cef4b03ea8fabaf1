//! Derivation of a [`ConfigSchema`] from a callable's parameter list.

use std::sync::Arc;

use siphon_types::{ConfigField, ConfigSchema, ConfigValue, Namespace, ParamDefault, Parameter, RequirementKind, SchemaKey, ValueType};
use tracing::{debug, info};

use crate::{
    callable::CallableDef,
    error::ConfigError,
    literal::{DefaultLiteral, classify_default_text, extract_literal_defaults},
};

/// Knobs applied when synthesizing a schema.
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    /// Keep fields that have a concrete default.
    pub include_defaults: bool,
    pub namespace: Namespace,
    /// Fields always present in the schema; they win over derived fields of the same name.
    pub base: Option<ConfigSchema>,
    /// Declared schema type. Defaults to the callable identity.
    pub schema_name: Option<String>,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            include_defaults: true,
            namespace: Namespace::root(),
            base: None,
            schema_name: None,
        }
    }
}

/// A parameter default with opaque defaults already classified.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum EffectiveDefault {
    Absent,
    Value(ConfigValue),
    Sentinel(siphon_types::Sentinel),
    /// Opaque default whose text is unavailable or not a recognized literal.
    Unknown,
}

pub(crate) fn effective_default(callable: &CallableDef, parameter: &Parameter) -> Result<EffectiveDefault, ConfigError> {
    Ok(match &parameter.default {
        ParamDefault::Absent => EffectiveDefault::Absent,
        ParamDefault::Value(value) => EffectiveDefault::Value(value.clone()),
        ParamDefault::Sentinel(sentinel) => EffectiveDefault::Sentinel(*sentinel),
        ParamDefault::Opaque => {
            let Some(declaration) = callable.declaration() else {
                debug!(callable = %callable.identity(), parameter = %parameter.name, "no declaration text, default is unknown");
                return Ok(EffectiveDefault::Unknown);
            };
            let defaults = extract_literal_defaults(declaration)?;
            match defaults.get(&parameter.name).map(|text| classify_default_text(text)) {
                Some(DefaultLiteral::Null) => EffectiveDefault::Value(ConfigValue::Null),
                Some(DefaultLiteral::Sentinel(sentinel)) => EffectiveDefault::Sentinel(sentinel),
                Some(DefaultLiteral::Value(value)) => EffectiveDefault::Value(value),
                Some(DefaultLiteral::Unknown) | None => EffectiveDefault::Unknown,
            }
        }
    })
}

fn derive_field(callable: &CallableDef, parameter: &Parameter) -> Result<ConfigField, ConfigError> {
    let annotation = parameter.annotation.clone();
    let field = match effective_default(callable, parameter)? {
        EffectiveDefault::Absent => ConfigField::required(&parameter.name, annotation.unwrap_or(ValueType::Any)),
        EffectiveDefault::Sentinel(sentinel) => {
            let value_type = match (annotation, sentinel.requirement()) {
                (None | Some(ValueType::Any), RequirementKind::RequiredFromSecret) => ValueType::Secret,
                (annotation, _) => annotation.unwrap_or(ValueType::Any),
            };
            match sentinel.requirement() {
                RequirementKind::RequiredFromSecret => ConfigField::from_secret(&parameter.name, value_type),
                _ => ConfigField::from_config(&parameter.name, value_type),
            }
        }
        EffectiveDefault::Value(value) => {
            let mut value_type = annotation.unwrap_or_else(|| value.value_type());
            if value.is_null() {
                value_type = value_type.optional();
            }
            let value = match value {
                ConfigValue::Str(text) if value_type.is_secret() => ConfigValue::Secret(text.into()),
                other => other,
            };
            ConfigField::optional(&parameter.name, value_type, value)
        }
        EffectiveDefault::Unknown => ConfigField::optional(&parameter.name, annotation.unwrap_or(ValueType::Any).optional(), ConfigValue::Null),
    };
    Ok(field.with_parameter_kind(parameter.kind))
}

/// Derives the configuration schema of `callable`.
///
/// Variadic collectors are skipped. With `include_defaults` off, fields with a concrete
/// default are dropped while required and sentinel-backed fields stay. Returns `None`
/// when no field remains, meaning the callable needs no injection.
pub fn synthesize_schema(callable: &CallableDef, options: &SynthesisOptions) -> Result<Option<ConfigSchema>, ConfigError> {
    let derived = derive_fields(callable, options.include_defaults)?;
    let schema = assemble(callable, options, derived);
    if let Some(schema) = &schema {
        info!(callable = %callable.identity(), fields = schema.len(), namespace = %schema.namespace(), "configuration schema synthesized");
    }
    Ok(schema)
}

/// Applies the per-wrapper options (base, name, namespace) to a cached derived schema.
///
/// `derived` must have been synthesized with only `include_defaults` set. When the wrapper
/// adds nothing on top of it the cached schema is shared as is.
pub(crate) fn compose_schema(
    callable: &CallableDef,
    derived: Option<&Arc<ConfigSchema>>,
    options: &SynthesisOptions,
) -> Option<Arc<ConfigSchema>> {
    if options.base.is_none() && options.schema_name.is_none() && options.namespace.is_root() {
        return derived.cloned();
    }
    let derived_fields = derived.into_iter().flat_map(|schema| schema.fields().cloned());
    let schema = assemble(callable, options, derived_fields).map(Arc::new);
    if let Some(schema) = &schema {
        debug!(callable = %callable.identity(), schema = %schema.name(), namespace = %schema.namespace(), "schema composed for wrapper");
    }
    schema
}

/// The plain synthesis options for the cached part of a schema.
pub(crate) fn derived_options(include_defaults: bool) -> SynthesisOptions {
    SynthesisOptions {
        include_defaults,
        ..SynthesisOptions::default()
    }
}

fn derive_fields(callable: &CallableDef, include_defaults: bool) -> Result<Vec<ConfigField>, ConfigError> {
    let mut derived = Vec::new();
    for parameter in callable.signature().parameters() {
        if parameter.kind.is_variadic() {
            continue;
        }
        let field = derive_field(callable, parameter)?;
        if !include_defaults && field.requirement == RequirementKind::OptionalWithDefault {
            continue;
        }
        derived.push(field);
    }
    Ok(derived)
}

fn assemble(callable: &CallableDef, options: &SynthesisOptions, derived: impl IntoIterator<Item = ConfigField>) -> Option<ConfigSchema> {
    let mut fields: Vec<ConfigField> = options.base.iter().flat_map(|base| base.fields().cloned()).collect();
    fields.extend(derived);
    if fields.is_empty() {
        debug!(callable = %callable.identity(), "no configurable fields");
        return None;
    }

    let key = SchemaKey::new(callable.identity(), options.include_defaults);
    let name = options.schema_name.clone().unwrap_or_else(|| callable.identity().to_string());
    Some(ConfigSchema::new(name, key, options.namespace.clone(), fields))
}
