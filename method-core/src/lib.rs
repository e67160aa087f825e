//! Runtime contract for validated RPC methods.
//!
//! Provides the structured [`RpcError`], the explicit [`CallContext`], the
//! [`ValidatedMethod`]/[`MethodType`] traits with the stock
//! [`StandardMethod`], the [`MethodRegistry`] endpoint table and the schema
//! engines consumed by `currentspace-method-factory`.

pub mod context;
pub mod error;
pub mod method;
pub mod registry;
pub mod schema;

pub use context::CallContext;
pub use error::{ErrorCode, RpcError, VALIDATION_FAILED};
pub use method::{
    accept_all, run_async, run_with, validate_with, ApplyOptions, MethodDefinition, MethodType,
    Mixin, ResultCallback, RunFn, StandardMethod, ValidateFn, ValidatedMethod,
};
pub use registry::MethodRegistry;
pub use schema::{SchemaFactory, SchemaValidator};
#[cfg(feature = "validation")]
pub use schema::{JsonSchemaFactory, JsonSchemaValidator, ShorthandSchemaFactory};

use async_trait::async_trait;
use serde_json::Value;

/// Dispatch surface a transport drives.
#[async_trait]
pub trait RpcTarget: Send + Sync {
    /// Call a method on this target
    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, RpcError>;

    /// Get a property from this target
    async fn get_property(&self, property: &str) -> Result<Value, RpcError>;
}
