//! Error types for factory setup and method construction.

use method_core::RpcError;
use thiserror::Error;

/// Malformed factory configuration. Returned when the factory is created.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("mixin at position {index} has an empty name")]
    UnnamedMixin { index: usize },

    #[error("unknown mixin '{name}' (known: {})", known.join(", "))]
    UnknownMixin { name: String, known: Vec<String> },

    #[error("unknown schema engine '{name}': expected json-schema or shorthand")]
    UnknownSchemaEngine { name: String },

    #[error("invalid factory settings: {source}")]
    InvalidSettings {
        #[source]
        source: serde_json::Error,
    },
}

/// Malformed per-method options. Returned by `MethodFactory::create` before
/// anything is constructed or registered.
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("method name must be a non-empty string")]
    EmptyName,

    #[error("method '{method}': run function is required")]
    MissingRun { method: String },

    #[error("method '{method}': validate function is required when no schema factory is configured")]
    MissingValidate { method: String },

    #[error("method '{method}': schema is required unless a validate function is given (use a null schema to accept any input)")]
    MissingSchema { method: String },

    #[error("method '{method}': schema must be an object or null, got {actual}")]
    SchemaNotObject { method: String, actual: &'static str },

    #[error("method '{method}': schema options must be an object, got {actual}")]
    SchemaOptionsNotObject { method: String, actual: &'static str },

    #[error("method '{method}': field '{field}' is reserved and cannot be passed through")]
    ReservedField { method: String, field: String },

    #[error("method '{method}': mixin at position {index} has an empty name")]
    UnnamedMixin { method: String, index: usize },

    #[error("method '{method}': invalid apply options: {source}")]
    ApplyOptions {
        method: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Alias matching the name used in the factory's error taxonomy.
pub type ValidationOptionsError = OptionsError;

/// Anything that stops `MethodFactory::create` from producing a method.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Options(#[from] OptionsError),

    /// Raised by the schema engine, a mixin, the method type or the registry;
    /// carried unchanged.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("internal consistency error for method '{method}': {reason}")]
    Consistency { method: String, reason: String },
}

impl BuildError {
    /// The pass-through runtime error, if this is one.
    pub fn as_rpc(&self) -> Option<&RpcError> {
        match self {
            BuildError::Rpc(e) => Some(e),
            _ => None,
        }
    }
}
