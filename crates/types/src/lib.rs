//! # Siphon Types
//!
//! Shared data model for configuration derivation and resolution.
//!
//! The engine crate derives a [`ConfigSchema`] from a callable's [`Signature`] and
//! resolves each field against an ordered chain of [`ConfigProvider`]s. Provider
//! implementations live in `siphon-util`; both crates agree on the types defined here.
//!
//! - **`value`**: dynamically typed configuration values and the secret wrapper
//! - **`value_type`**: declared/inferred field types and annotation parsing
//! - **`credentials`**: the compact connection-string descriptor
//! - **`signature`**: parameters, default markers, and call arguments
//! - **`namespace`**: hierarchical lookup paths
//! - **`schema`**: configuration fields and schemas
//! - **`provider`**: the provider capability contract

mod credentials;
mod namespace;
mod provider;
mod schema;
mod signature;
mod value;
mod value_type;

pub use credentials::{CREDENTIAL_ATTRIBUTES, ConnectionStringCredentials, CredentialsError};
pub use namespace::Namespace;
pub use provider::{ConfigProvider, ProviderError};
pub use schema::{ConfigField, ConfigSchema, RequirementKind, SchemaKey};
pub use signature::{Argument, ParamDefault, Parameter, ParameterKind, Sentinel, Signature};
pub use value::{ConfigValue, SecretValue};
pub use value_type::{UnknownTypeError, ValueType};

pub use rust_decimal::Decimal;
