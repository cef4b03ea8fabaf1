//! The injection wrapper: binds call arguments, resolves what is missing and invokes.

use std::{fmt, sync::Arc};

use siphon_types::{ConfigSchema, Namespace};
use tracing::debug;

use crate::{
    binding::{BoundArguments, CallArgs, bind_arguments, complete_arguments},
    callable::CallableDef,
    context::ResolutionContext,
    error::{ConfigError, InvokeError},
    registry::SchemaRegistry,
    resolver::{ResolvedConfiguration, resolve_configuration},
    synth::SynthesisOptions,
};

/// Builder for [`Configured`] callables.
#[derive(Debug, Clone)]
pub struct WithConfig {
    options: SynthesisOptions,
    expose_to_nested: bool,
    registry: Arc<SchemaRegistry>,
}

impl Default for WithConfig {
    fn default() -> Self {
        Self {
            options: SynthesisOptions::default(),
            expose_to_nested: true,
            registry: SchemaRegistry::global(),
        }
    }
}

impl WithConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Namespace under which fields are looked up, e.g. `source.github`.
    pub fn namespace(mut self, namespace: Namespace) -> Self {
        self.options.namespace = namespace;
        self
    }

    /// Always-present fields merged into the derived schema.
    pub fn base(mut self, base: ConfigSchema) -> Self {
        self.options.base = Some(base);
        self
    }

    pub fn include_defaults(mut self, include_defaults: bool) -> Self {
        self.options.include_defaults = include_defaults;
        self
    }

    /// Declared schema type; wrappers sharing a name share active configurations.
    pub fn schema_name(mut self, name: impl Into<String>) -> Self {
        self.options.schema_name = Some(name.into());
        self
    }

    /// Push the resolved configuration for nested calls while the callable runs.
    pub fn expose_to_nested(mut self, expose: bool) -> Self {
        self.expose_to_nested = expose;
        self
    }

    /// Use a private schema registry instead of the process-wide one.
    pub fn registry(mut self, registry: Arc<SchemaRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Registers `callable` and derives (or fetches) its schema.
    ///
    /// Fails with [`ConfigError::DuplicateSpecRegistration`] when a different callable is
    /// already registered under the same identity.
    pub fn wrap<F, R>(self, callable: CallableDef, f: F) -> Result<Configured<F>, ConfigError>
    where
        F: Fn(&mut ResolutionContext, &BoundArguments) -> anyhow::Result<R>,
    {
        let schema = self.registry.get_or_synthesize(&callable, &self.options)?;
        Ok(Configured {
            callable,
            schema,
            namespace: self.options.namespace,
            expose_to_nested: self.expose_to_nested,
            f,
        })
    }
}

/// Shorthand for `WithConfig::new().wrap(callable, f)`.
pub fn with_config<F, R>(callable: CallableDef, f: F) -> Result<Configured<F>, ConfigError>
where
    F: Fn(&mut ResolutionContext, &BoundArguments) -> anyhow::Result<R>,
{
    WithConfig::new().wrap(callable, f)
}

/// A callable whose missing arguments are resolved from configuration on every call.
pub struct Configured<F> {
    callable: CallableDef,
    schema: Option<Arc<ConfigSchema>>,
    namespace: Namespace,
    expose_to_nested: bool,
    f: F,
}

impl<F> fmt::Debug for Configured<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configured")
            .field("callable", &self.callable.identity())
            .field("schema", &self.schema)
            .field("namespace", &self.namespace)
            .field("expose_to_nested", &self.expose_to_nested)
            .finish_non_exhaustive()
    }
}

impl<F> Configured<F> {
    /// The synthesized schema; `None` when the callable has nothing to configure.
    pub fn schema(&self) -> Option<&Arc<ConfigSchema>> {
        self.schema.as_ref()
    }

    pub fn callable(&self) -> &CallableDef {
        &self.callable
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Binds `args` and resolves every missing field without invoking the callable.
    pub fn prepare(&self, context: &ResolutionContext, args: CallArgs) -> Result<(BoundArguments, Option<ResolvedConfiguration>), ConfigError> {
        let binding = bind_arguments(&self.callable, args)?;
        let Some(schema) = &self.schema else {
            return Ok((complete_arguments(&self.callable, binding, None)?, None));
        };

        debug!(callable = %self.callable.identity(), namespace = %self.namespace, "resolving configuration");
        let resolved = resolve_configuration(schema, &self.namespace, &binding.explicit(), context)?;
        let arguments = complete_arguments(&self.callable, binding, Some(&resolved))?;
        Ok((arguments, Some(resolved)))
    }

    /// Resolves and invokes. Resolution errors abort before the callable runs.
    ///
    /// While the callable runs its resolved configuration is active in `context`, so nested
    /// calls of the same schema type reuse it. It is popped afterwards, on error too.
    pub fn call<R>(&self, context: &mut ResolutionContext, args: CallArgs) -> Result<R, InvokeError>
    where
        F: Fn(&mut ResolutionContext, &BoundArguments) -> anyhow::Result<R>,
    {
        let (arguments, resolved) = self.prepare(context, args)?;
        match (resolved, &self.schema) {
            (Some(resolved), Some(schema)) if self.expose_to_nested => {
                let mut scope = context.enter(schema.name(), Arc::new(resolved));
                (self.f)(&mut *scope, &arguments).map_err(InvokeError::Callable)
            }
            _ => (self.f)(context, &arguments).map_err(InvokeError::Callable),
        }
    }
}
