//! Call-site arguments and their binding against a signature.

use indexmap::IndexMap;
use rust_decimal::Decimal;
use siphon_types::{Argument, ConfigValue, ConnectionStringCredentials, ParameterKind, SecretValue, Sentinel, ValueType};

use crate::{
    callable::CallableDef,
    coerce::read_typed,
    error::ConfigError,
    resolver::ResolvedConfiguration,
    synth::{EffectiveDefault, effective_default},
};

/// Arguments a caller actually supplied.
///
/// Values are explicit and never touched by the resolver. Placeholders behave as if the
/// argument had been omitted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallArgs {
    positional: Vec<Argument>,
    keyword: IndexMap<String, Argument>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, value: impl Into<ConfigValue>) -> Self {
        self.positional.push(Argument::value(value));
        self
    }

    pub fn placeholder(mut self, sentinel: Sentinel) -> Self {
        self.positional.push(Argument::Placeholder(sentinel));
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.keyword.insert(name.into(), Argument::value(value));
        self
    }

    pub fn kwarg_placeholder(mut self, name: impl Into<String>, sentinel: Sentinel) -> Self {
        self.keyword.insert(name.into(), Argument::Placeholder(sentinel));
        self
    }

    pub fn positional(&self) -> &[Argument] {
        &self.positional
    }

    pub fn keywords(&self) -> &IndexMap<String, Argument> {
        &self.keyword
    }
}

/// Call arguments matched to parameters, before resolution.
#[derive(Debug, Clone, Default)]
pub(crate) struct Binding {
    bound: IndexMap<String, Argument>,
    varargs: Vec<Argument>,
    kwargs: IndexMap<String, Argument>,
}

impl Binding {
    /// Explicitly supplied values by parameter name.
    pub(crate) fn explicit(&self) -> IndexMap<String, ConfigValue> {
        self.bound
            .iter()
            .filter_map(|(name, argument)| argument.as_value().ok().map(|value| (name.clone(), value.clone())))
            .collect()
    }
}

/// Matches call arguments to parameters the way a keyword-capable call would.
pub(crate) fn bind_arguments(callable: &CallableDef, args: CallArgs) -> Result<Binding, ConfigError> {
    let signature = callable.signature();
    let mut binding = Binding::default();

    let slots: Vec<&str> = signature
        .parameters()
        .iter()
        .filter(|parameter| parameter.kind.accepts_positional())
        .map(|parameter| parameter.name.as_str())
        .collect();
    let supplied = args.positional.len();
    let mut positional = args.positional.into_iter();
    for slot in &slots {
        let Some(argument) = positional.next() else { break };
        binding.bound.insert(slot.to_string(), argument);
    }
    binding.varargs = positional.collect();
    if !binding.varargs.is_empty() && signature.var_positional().is_none() {
        return Err(ConfigError::binding(
            callable.identity(),
            format!("takes {} positional arguments but {supplied} were given", slots.len()),
        ));
    }

    for (name, argument) in args.keyword {
        match signature.parameter(&name).map(|parameter| parameter.kind) {
            Some(kind) if kind.accepts_keyword() => {
                if binding.bound.contains_key(&name) {
                    return Err(ConfigError::binding(callable.identity(), format!("got multiple values for argument '{name}'")));
                }
                binding.bound.insert(name, argument);
            }
            _ if signature.var_keyword().is_some() => {
                binding.kwargs.insert(name, argument);
            }
            Some(ParameterKind::PositionalOnly) => {
                return Err(ConfigError::binding(
                    callable.identity(),
                    format!("positional-only argument '{name}' passed as keyword"),
                ));
            }
            _ => {
                return Err(ConfigError::binding(callable.identity(), format!("got an unexpected keyword argument '{name}'")));
            }
        }
    }

    Ok(binding)
}

/// Builds the complete argument set: explicit values, then resolved values, then declared defaults.
pub(crate) fn complete_arguments(
    callable: &CallableDef,
    binding: Binding,
    resolved: Option<&ResolvedConfiguration>,
) -> Result<BoundArguments, ConfigError> {
    let mut arguments = IndexMap::new();
    for parameter in callable.signature().parameters() {
        if parameter.kind.is_variadic() {
            continue;
        }
        let supplied = binding.bound.get(&parameter.name);
        let argument = match (supplied, resolved.and_then(|configuration| configuration.get(&parameter.name))) {
            (Some(Argument::Value(value)), _) => Argument::Value(value.clone()),
            (_, Some(value)) => Argument::Value(value.clone()),
            (Some(Argument::Placeholder(sentinel)), None) => Argument::Placeholder(*sentinel),
            (None, None) => match effective_default(callable, parameter)? {
                EffectiveDefault::Absent => {
                    return Err(ConfigError::binding(
                        callable.identity(),
                        format!("missing required argument '{}'", parameter.name),
                    ));
                }
                EffectiveDefault::Value(value) => Argument::Value(value),
                EffectiveDefault::Sentinel(sentinel) => Argument::Placeholder(sentinel),
                EffectiveDefault::Unknown => Argument::Value(ConfigValue::Null),
            },
        };
        arguments.insert(parameter.name.clone(), argument);
    }

    Ok(BoundArguments {
        callable: callable.identity().to_string(),
        arguments,
        varargs: binding.varargs,
        kwargs: binding.kwargs,
    })
}

/// The merged argument set handed to a configured callable.
///
/// Reading a parameter that is still bound to a sentinel fails with
/// [`ConfigError::SentinelMisuse`].
#[derive(Debug, Clone, PartialEq)]
pub struct BoundArguments {
    callable: String,
    arguments: IndexMap<String, Argument>,
    varargs: Vec<Argument>,
    kwargs: IndexMap<String, Argument>,
}

impl BoundArguments {
    pub fn callable(&self) -> &str {
        &self.callable
    }

    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.arguments.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&ConfigValue, ConfigError> {
        let argument = self
            .arguments
            .get(name)
            .ok_or_else(|| ConfigError::binding(&self.callable, format!("has no parameter named '{name}'")))?;
        argument.as_value().map_err(|sentinel| ConfigError::SentinelMisuse {
            parameter: name.to_string(),
            sentinel,
        })
    }

    fn typed<'a, T>(&'a self, name: &str, expected: ValueType, read: impl FnOnce(&'a ConfigValue) -> Option<T>) -> Result<T, ConfigError> {
        read_typed(name, "", self.get(name)?, expected, read)
    }

    pub fn get_str(&self, name: &str) -> Result<&str, ConfigError> {
        self.typed(name, ValueType::Str, ConfigValue::as_str)
    }

    pub fn get_opt_str(&self, name: &str) -> Result<Option<&str>, ConfigError> {
        self.typed(name, ValueType::Str.optional(), |value| match value {
            ConfigValue::Null => Some(None),
            other => other.as_str().map(Some),
        })
    }

    pub fn get_i64(&self, name: &str) -> Result<i64, ConfigError> {
        self.typed(name, ValueType::Int, ConfigValue::as_i64)
    }

    pub fn get_f64(&self, name: &str) -> Result<f64, ConfigError> {
        self.typed(name, ValueType::Float, ConfigValue::as_f64)
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, ConfigError> {
        self.typed(name, ValueType::Bool, ConfigValue::as_bool)
    }

    pub fn get_decimal(&self, name: &str) -> Result<Decimal, ConfigError> {
        self.typed(name, ValueType::Decimal, ConfigValue::as_decimal)
    }

    /// Secret value of a parameter; plain strings passed by the caller are wrapped.
    pub fn get_secret(&self, name: &str) -> Result<SecretValue, ConfigError> {
        self.typed(name, ValueType::Secret, secret_of)
    }

    pub fn get_opt_secret(&self, name: &str) -> Result<Option<SecretValue>, ConfigError> {
        self.typed(name, ValueType::Secret.optional(), |value| match value {
            ConfigValue::Null => Some(None),
            other => secret_of(other).map(Some),
        })
    }

    pub fn get_credentials(&self, name: &str) -> Result<&ConnectionStringCredentials, ConfigError> {
        self.typed(name, ValueType::Credentials, ConfigValue::as_credentials)
    }

    pub fn get_list(&self, name: &str) -> Result<&[ConfigValue], ConfigError> {
        self.typed(name, ValueType::List, ConfigValue::as_list)
    }

    pub fn get_map(&self, name: &str) -> Result<&IndexMap<String, ConfigValue>, ConfigError> {
        self.typed(name, ValueType::Map, ConfigValue::as_map)
    }

    /// Surplus positional arguments captured by the variadic collector.
    pub fn varargs(&self) -> &[Argument] {
        &self.varargs
    }

    /// Surplus keyword arguments captured by the keyword collector.
    pub fn kwargs(&self) -> &IndexMap<String, Argument> {
        &self.kwargs
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Argument)> {
        self.arguments.iter().map(|(name, argument)| (name.as_str(), argument))
    }

    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }
}

pub(crate) fn secret_of(value: &ConfigValue) -> Option<SecretValue> {
    match value {
        ConfigValue::Secret(secret) => Some(secret.clone()),
        ConfigValue::Str(text) => Some(SecretValue::new(text.as_str())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use siphon_types::{Namespace, Parameter, Signature};

    use super::*;
    use crate::resolver::ValueOrigin;

    fn callable() -> CallableDef {
        CallableDef::from_declaration("m::f", "f(a, /, b: int = 2, *args, c = secrets.value, **kwargs)").unwrap()
    }

    #[test]
    fn binds_positional_keyword_and_variadics() {
        let args = CallArgs::new().arg("x").arg(5).arg("extra").kwarg("c", "token").kwarg("unknown", true);
        let binding = bind_arguments(&callable(), args).unwrap();
        let explicit = binding.explicit();
        assert_eq!(explicit.get("a"), Some(&ConfigValue::from("x")));
        assert_eq!(explicit.get("b"), Some(&ConfigValue::Int(5)));
        assert_eq!(explicit.get("c"), Some(&ConfigValue::from("token")));
        assert_eq!(binding.varargs, vec![Argument::value("extra")]);
        assert_eq!(binding.kwargs.get("unknown"), Some(&Argument::value(true)));
    }

    #[test]
    fn rejects_duplicate_and_surplus_arguments() {
        let strict = CallableDef::new("m::g", Signature::from_iter([Parameter::positional("a")]));
        assert!(matches!(
            bind_arguments(&strict, CallArgs::new().arg(1).kwarg("a", 2)),
            Err(ConfigError::ArgumentBinding { message, .. }) if message.contains("multiple values")
        ));
        assert!(bind_arguments(&strict, CallArgs::new().arg(1).arg(2)).is_err());
        assert!(bind_arguments(&strict, CallArgs::new().kwarg("b", 2)).is_err());
    }

    #[test]
    fn placeholders_are_not_explicit() {
        let binding = bind_arguments(&callable(), CallArgs::new().arg("x").kwarg_placeholder("c", Sentinel::Secret)).unwrap();
        assert!(!binding.explicit().contains_key("c"));
    }

    #[test]
    fn unresolved_sentinel_read_is_misuse() {
        let callable = callable();
        let binding = bind_arguments(&callable, CallArgs::new().arg("x")).unwrap();
        let arguments = complete_arguments(&callable, binding, None).unwrap();
        assert_eq!(arguments.get_i64("b").unwrap(), 2);
        assert!(matches!(
            arguments.get("c"),
            Err(ConfigError::SentinelMisuse { parameter, sentinel: Sentinel::Secret }) if parameter == "c"
        ));
    }

    #[test]
    fn resolved_values_fill_missing_parameters() {
        let callable = callable();
        let binding = bind_arguments(&callable, CallArgs::new().arg("x")).unwrap();
        let mut resolved = ResolvedConfiguration::new("m::f", Namespace::root());
        resolved.insert("c", ConfigValue::Secret("vaulted".into()), ValueOrigin::Provider("vault".into()));
        let arguments = complete_arguments(&callable, binding, Some(&resolved)).unwrap();
        assert_eq!(arguments.get_secret("c").unwrap().expose(), "vaulted");
        assert_eq!(arguments.get_str("a").unwrap(), "x");
    }

    #[test]
    fn missing_required_argument_is_reported() {
        let callable = callable();
        let binding = bind_arguments(&callable, CallArgs::new()).unwrap();
        assert!(matches!(
            complete_arguments(&callable, binding, None),
            Err(ConfigError::ArgumentBinding { message, .. }) if message.contains("'a'")
        ));
    }
}
