//! Concrete [`ConfigProvider`](siphon_types::ConfigProvider) implementations.
//!
//! - `dictionary`: in-memory values keyed by dotted path (contextual state, tests)
//! - `environment`: process environment variables
//! - `file`: TOML, YAML or JSON documents on disk

mod dictionary;
mod environment;
mod file;

pub use dictionary::DictionaryProvider;
pub use environment::EnvironmentProvider;
pub use file::{FileFormat, FileProvider};
