//! Core abstractions for the model composer
//!
//! This crate provides the fundamental types and traits that all other
//! components depend on: the dynamic value type, the module capability
//! interface, the declarative graph specification, and the error taxonomy.
//! It has no runtime machinery of its own.

mod error;
mod module;
mod spec;
mod value;

pub use error::{ComposeError, ConfigError, GraphError, ModuleError};
pub use module::{Module, ModuleOutput};
pub use spec::{
    ComponentDecl, ConfigSource, GraphSpec, InputSpec, ModuleDecl, ENTRY, EXIT,
};
pub use value::{ConfigMap, Value};

/// Result type for composer operations
pub type Result<T> = std::result::Result<T, ComposeError>;
