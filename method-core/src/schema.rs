//! Schema engines.
//!
//! A [`SchemaFactory`] turns a schema definition into a [`SchemaValidator`].
//! Any closure `Fn(&Value, Option<&Value>) -> Result<Arc<dyn SchemaValidator>, RpcError>`
//! is a factory. With the `validation` feature two engines are provided:
//! [`JsonSchemaFactory`] for JSON Schema documents and [`ShorthandSchemaFactory`]
//! for `{"field": "type"}` maps.

use crate::RpcError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

#[async_trait]
pub trait SchemaValidator: Send + Sync {
    /// Check `document`; `options` are the method's schema options.
    async fn validate(&self, document: &Value, options: Option<&Value>) -> Result<(), RpcError>;
}

pub trait SchemaFactory: Send + Sync {
    fn create(
        &self,
        definition: &Value,
        options: Option<&Value>,
    ) -> Result<Arc<dyn SchemaValidator>, RpcError>;
}

impl<F> SchemaFactory for F
where
    F: Fn(&Value, Option<&Value>) -> Result<Arc<dyn SchemaValidator>, RpcError> + Send + Sync,
{
    fn create(
        &self,
        definition: &Value,
        options: Option<&Value>,
    ) -> Result<Arc<dyn SchemaValidator>, RpcError> {
        self(definition, options)
    }
}

#[cfg(feature = "validation")]
pub use engines::{JsonSchemaFactory, JsonSchemaValidator, ShorthandSchemaFactory};

#[cfg(feature = "validation")]
mod engines {
    use super::*;
    use schemars::{schema_for, JsonSchema};
    use serde_json::{json, Map};
    use tracing::debug;

    /// Compiled JSON Schema.
    pub struct JsonSchemaValidator {
        schema: jsonschema::Validator,
    }

    impl JsonSchemaValidator {
        pub fn new(schema: &Value) -> Result<Self, RpcError> {
            let compiled = jsonschema::validator_for(schema)
                .map_err(|e| RpcError::bad_request(format!("Invalid schema: {}", e)))?;
            Ok(JsonSchemaValidator { schema: compiled })
        }

        pub fn from_type<T: JsonSchema>() -> Result<Self, RpcError> {
            let schema = schema_for!(T);
            let schema_value = serde_json::to_value(schema)
                .map_err(|e| RpcError::internal(format!("Schema serialization error: {}", e)))?;
            Self::new(&schema_value)
        }

        pub fn is_valid(&self, value: &Value) -> bool {
            self.schema.is_valid(value)
        }
    }

    #[async_trait]
    impl SchemaValidator for JsonSchemaValidator {
        async fn validate(
            &self,
            document: &Value,
            _options: Option<&Value>,
        ) -> Result<(), RpcError> {
            let errors: Vec<String> = self
                .schema
                .iter_errors(document)
                .map(|e| e.to_string())
                .collect();
            if errors.is_empty() {
                Ok(())
            } else {
                debug!("Schema rejected document with {} error(s)", errors.len());
                Err(RpcError::invalid_arguments(errors))
            }
        }
    }

    /// Engine for full JSON Schema definitions.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct JsonSchemaFactory;

    impl SchemaFactory for JsonSchemaFactory {
        fn create(
            &self,
            definition: &Value,
            _options: Option<&Value>,
        ) -> Result<Arc<dyn SchemaValidator>, RpcError> {
            Ok(Arc::new(JsonSchemaValidator::new(definition)?))
        }
    }

    /// Engine for field maps such as `{"title": "string", "age": "integer?"}`.
    ///
    /// Every listed field is required unless its type ends in `?`; fields not
    /// listed are rejected. Recognized types: `string`, `number`, `integer`,
    /// `boolean`, `object`, `array`, `any`.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct ShorthandSchemaFactory;

    impl ShorthandSchemaFactory {
        /// Expand a field map into the equivalent JSON Schema.
        pub fn expand(definition: &Value) -> Result<Value, RpcError> {
            let fields = definition.as_object().ok_or_else(|| {
                RpcError::bad_request("shorthand schema must be an object of field types")
            })?;

            let mut properties = Map::new();
            let mut required = Vec::new();
            for (field, ty) in fields {
                let ty = ty.as_str().ok_or_else(|| {
                    RpcError::bad_request(format!("type of field '{}' must be a string", field))
                })?;
                let (ty, optional) = match ty.strip_suffix('?') {
                    Some(base) => (base, true),
                    None => (ty, false),
                };
                let property = match ty {
                    "any" => json!({}),
                    "string" | "number" | "integer" | "boolean" | "object" | "array" => {
                        json!({ "type": ty })
                    }
                    other => {
                        return Err(RpcError::bad_request(format!(
                            "unknown type '{}' for field '{}'",
                            other, field
                        )))
                    }
                };
                properties.insert(field.clone(), property);
                if !optional {
                    required.push(Value::String(field.clone()));
                }
            }

            Ok(json!({
                "type": "object",
                "properties": properties,
                "required": required,
                "additionalProperties": false,
            }))
        }
    }

    impl SchemaFactory for ShorthandSchemaFactory {
        fn create(
            &self,
            definition: &Value,
            _options: Option<&Value>,
        ) -> Result<Arc<dyn SchemaValidator>, RpcError> {
            let expanded = Self::expand(definition)?;
            Ok(Arc::new(JsonSchemaValidator::new(&expanded)?))
        }
    }
}
