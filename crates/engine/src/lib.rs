//! # Siphon Engine
//!
//! Derives configuration schemas from callables and resolves them at call time.
//!
//! A callable is registered once with [`WithConfig`]. Its [`Signature`](siphon_types::Signature)
//! is turned into a [`ConfigSchema`](siphon_types::ConfigSchema) and cached in the
//! [`SchemaRegistry`]. On each call the arguments the caller supplied are kept as they are; every
//! other field is looked up in the active configuration of the same schema type, then in the
//! providers of the [`ResolutionContext`], coerced to its declared type and passed to the callable.
//!
//! ## Usage
//!
//! ```rust
//! use siphon_engine::{CallArgs, CallableDef, ResolutionContext, WithConfig};
//! use siphon_types::Namespace;
//! use siphon_util::{DictionaryProvider, ProviderChain};
//!
//! let callable = CallableDef::from_declaration(
//!     "github::issues",
//!     "issues(org: str = config.value, page_size: int = 100)",
//! )?;
//! let issues = WithConfig::new()
//!     .namespace(Namespace::new(["source", "github"]))
//!     .wrap(callable, |_, arguments| Ok(format!("{}:{}", arguments.get_str("org")?, arguments.get_i64("page_size")?)))?;
//!
//! let chain = ProviderChain::new().with(DictionaryProvider::new("context").with_value("source.github.org", "dlt-hub"));
//! let mut context = ResolutionContext::new(chain);
//! assert_eq!(issues.call(&mut context, CallArgs::new())?, "dlt-hub:100");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`literal`**: static classification of default expressions from declaration text
//! - **`callable`**: callable identity and declaration parsing
//! - **`synth`**: schema synthesis from a signature
//! - **`registry`**: process-wide schema cache and duplicate detection
//! - **`coerce`**: raw value to declared type conversion
//! - **`resolver`**: provider chain resolution
//! - **`context`**: the provider chain and the active-configuration stack
//! - **`binding`**: call arguments and their binding to parameters
//! - **`inject`**: the wrapper tying it together
//! - **`specs`**: statically declared schemas
//! - **`consumer`**: source and resource registration

mod binding;
mod callable;
mod coerce;
mod consumer;
mod context;
mod error;
mod inject;
mod literal;
mod registry;
mod resolver;
mod specs;
mod synth;

pub use binding::{BoundArguments, CallArgs};
pub use callable::{CallableDef, parse_signature};
pub use coerce::coerce_value;
pub use consumer::{SourceInfo, SourceKind, SourceRegistry};
pub use context::{ActiveScope, ResolutionContext};
pub use error::{ConfigError, InvokeError};
pub use inject::{Configured, WithConfig, with_config};
pub use literal::{DefaultLiteral, classify_default_text, extract_literal_defaults};
pub use registry::SchemaRegistry;
pub use resolver::{ResolvedConfiguration, ValueOrigin, resolve_configuration};
pub use specs::{RunConfiguration, StaticSchema};
pub use synth::{SynthesisOptions, synthesize_schema};
