//! Per-method options and their validation.

use crate::error::OptionsError;
use futures::future::{self, BoxFuture, FutureExt};
use indexmap::IndexMap;
use method_core::{ApplyOptions, CallContext, Mixin, RpcError, RunFn};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Field names with a meaning of their own; pass-through fields may not use them.
pub const RESERVED_FIELDS: &[&str] = &[
    "name",
    "schema",
    "schemaOptions",
    "schema_options",
    "validate",
    "run",
    "applyOptions",
    "apply_options",
    "mixins",
];

/// Outcome of a custom validate function.
///
/// `Valid` and `Invalid` are the boolean answers; `Unchecked` covers functions
/// that report problems only by returning an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Valid,
    Invalid,
    Unchecked,
}

impl From<bool> for Validity {
    fn from(valid: bool) -> Self {
        if valid {
            Validity::Valid
        } else {
            Validity::Invalid
        }
    }
}

impl From<()> for Validity {
    fn from(_: ()) -> Self {
        Validity::Unchecked
    }
}

/// User supplied validate function, before the factory wraps it.
pub type CustomValidateFn = Arc<
    dyn Fn(CallContext, Option<Value>) -> BoxFuture<'static, Result<Validity, RpcError>>
        + Send
        + Sync,
>;

/// Build a custom validate function from a synchronous closure returning
/// `bool`, `()` or [`Validity`].
pub fn custom_validate<F, V>(f: F) -> CustomValidateFn
where
    F: Fn(&CallContext, Option<&Value>) -> Result<V, RpcError> + Send + Sync + 'static,
    V: Into<Validity>,
{
    Arc::new(move |ctx: CallContext, args: Option<Value>| {
        future::ready(f(&ctx, args.as_ref()).map(Into::into)).boxed()
    })
}

/// Build a custom validate function from an async closure.
pub fn custom_validate_async<F, Fut, V>(f: F) -> CustomValidateFn
where
    F: Fn(CallContext, Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, RpcError>> + Send + 'static,
    V: Into<Validity>,
{
    Arc::new(move |ctx: CallContext, args: Option<Value>| {
        f(ctx, args).map(|r| r.map(Into::into)).boxed()
    })
}

/// Schema slot of [`MethodOptions`].
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SchemaSpec {
    #[default]
    Unset,
    /// Accept any input.
    Null,
    Definition(Value),
}

impl SchemaSpec {
    /// Derive a JSON Schema definition from a Rust type.
    #[cfg(feature = "validation")]
    pub fn from_type<T: schemars::JsonSchema>() -> Result<Self, RpcError> {
        let schema = schemars::schema_for!(T);
        let value = serde_json::to_value(schema)
            .map_err(|e| RpcError::internal(format!("Schema serialization error: {}", e)))?;
        Ok(SchemaSpec::Definition(value))
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, SchemaSpec::Unset)
    }
}

impl From<Value> for SchemaSpec {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => SchemaSpec::Null,
            other => SchemaSpec::Definition(other),
        }
    }
}

/// Apply options either typed or still in JSON form.
#[derive(Debug, Clone)]
pub enum ApplyOptionsInput {
    Typed(ApplyOptions),
    Json(Value),
}

/// Declarative description of one method, handed to `MethodFactory::create`.
#[derive(Clone, Default)]
pub struct MethodOptions {
    pub name: String,
    pub schema: SchemaSpec,
    pub schema_options: Option<Value>,
    pub validate: Option<CustomValidateFn>,
    pub run: Option<RunFn>,
    pub apply_options: Option<ApplyOptionsInput>,
    pub mixins: Vec<Mixin>,
    pub extra: IndexMap<String, Value>,
}

impl MethodOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn schema(mut self, schema: impl Into<SchemaSpec>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Explicit "validate nothing" schema.
    pub fn null_schema(mut self) -> Self {
        self.schema = SchemaSpec::Null;
        self
    }

    pub fn schema_options(mut self, options: Value) -> Self {
        self.schema_options = Some(options);
        self
    }

    pub fn validate(mut self, validate: CustomValidateFn) -> Self {
        self.validate = Some(validate);
        self
    }

    pub fn run(mut self, run: RunFn) -> Self {
        self.run = Some(run);
        self
    }

    pub fn apply_options(mut self, options: ApplyOptions) -> Self {
        self.apply_options = Some(ApplyOptionsInput::Typed(options));
        self
    }

    pub fn apply_options_json(mut self, options: Value) -> Self {
        self.apply_options = Some(ApplyOptionsInput::Json(options));
        self
    }

    pub fn mixin(mut self, mixin: Mixin) -> Self {
        self.mixins.push(mixin);
        self
    }

    pub fn mixins(mut self, mixins: impl IntoIterator<Item = Mixin>) -> Self {
        self.mixins.extend(mixins);
        self
    }

    /// Add a pass-through field.
    pub fn field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

impl fmt::Debug for MethodOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodOptions")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("schema_options", &self.schema_options)
            .field("validate", &self.validate.is_some())
            .field("run", &self.run.is_some())
            .field("apply_options", &self.apply_options)
            .field("mixins", &self.mixins)
            .field("extra", &self.extra)
            .finish()
    }
}

/// Where the resolved validate function comes from.
pub(crate) enum ValidationSource {
    Custom(CustomValidateFn),
    Schema(Value),
    AcceptAll,
}

/// Method options that passed [`check`].
pub(crate) struct CheckedOptions {
    pub name: String,
    pub validation: ValidationSource,
    pub schema_options: Option<Value>,
    pub run: RunFn,
    pub apply_options: Option<ApplyOptions>,
    pub mixins: Vec<Mixin>,
    pub extra: IndexMap<String, Value>,
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validate per-method options and pick the validation path.
///
/// A custom validate function always wins. Without one, a schema factory is
/// required and the schema must be given, either as an object or as null.
pub(crate) fn check(
    options: MethodOptions,
    has_schema_factory: bool,
) -> Result<CheckedOptions, OptionsError> {
    let MethodOptions {
        name,
        schema,
        schema_options,
        validate,
        run,
        apply_options,
        mixins,
        extra,
    } = options;

    if name.is_empty() {
        return Err(OptionsError::EmptyName);
    }

    let run = run.ok_or_else(|| OptionsError::MissingRun {
        method: name.clone(),
    })?;

    if let SchemaSpec::Definition(definition) = &schema {
        if !definition.is_object() {
            return Err(OptionsError::SchemaNotObject {
                method: name,
                actual: json_type_name(definition),
            });
        }
    }

    let schema_options = match schema_options {
        None | Some(Value::Null) => None,
        Some(value) if value.is_object() => Some(value),
        Some(other) => {
            return Err(OptionsError::SchemaOptionsNotObject {
                method: name,
                actual: json_type_name(&other),
            })
        }
    };

    if let Some(field) = extra.keys().find(|k| RESERVED_FIELDS.contains(&k.as_str())) {
        return Err(OptionsError::ReservedField {
            method: name.clone(),
            field: field.clone(),
        });
    }

    if let Some(index) = mixins.iter().position(|m| m.name().is_empty()) {
        return Err(OptionsError::UnnamedMixin {
            method: name,
            index,
        });
    }

    let apply_options = match apply_options {
        None => None,
        Some(ApplyOptionsInput::Typed(options)) => Some(options),
        Some(ApplyOptionsInput::Json(value)) => Some(ApplyOptions::from_value(value).map_err(
            |source| OptionsError::ApplyOptions {
                method: name.clone(),
                source,
            },
        )?),
    };

    let validation = match (validate, schema) {
        (Some(custom), _) => ValidationSource::Custom(custom),
        (None, _) if !has_schema_factory => {
            return Err(OptionsError::MissingValidate { method: name })
        }
        (None, SchemaSpec::Null) => ValidationSource::AcceptAll,
        (None, SchemaSpec::Definition(definition)) => ValidationSource::Schema(definition),
        (None, SchemaSpec::Unset) => return Err(OptionsError::MissingSchema { method: name }),
    };

    Ok(CheckedOptions {
        name,
        validation,
        schema_options,
        run,
        apply_options,
        mixins,
        extra,
    })
}
