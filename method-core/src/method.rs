//! Method definitions and the base method contract.
//!
//! A [`MethodDefinition`] is the options object handed to a method type's
//! constructor. Any type implementing [`MethodType`] can be instantiated from
//! one; [`StandardMethod`] is the stock implementation.

use crate::{CallContext, RpcError};
use async_trait::async_trait;
use futures::future::{self, BoxFuture, FutureExt};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Resolved validation function attached to a method.
pub type ValidateFn = Arc<
    dyn Fn(CallContext, Option<Value>) -> BoxFuture<'static, Result<(), RpcError>> + Send + Sync,
>;

/// Method body.
pub type RunFn = Arc<
    dyn Fn(CallContext, Option<Value>) -> BoxFuture<'static, Result<Value, RpcError>>
        + Send
        + Sync,
>;

/// Callback receiving the outcome of every call.
pub type ResultCallback = Arc<dyn Fn(&Result<Value, RpcError>) + Send + Sync>;

type Transform = dyn Fn(MethodDefinition) -> Result<MethodDefinition, RpcError> + Send + Sync;

/// Wrap a synchronous closure as a [`RunFn`].
pub fn run_with<F>(f: F) -> RunFn
where
    F: Fn(&CallContext, Option<Value>) -> Result<Value, RpcError> + Send + Sync + 'static,
{
    Arc::new(move |ctx: CallContext, args: Option<Value>| {
        future::ready(f(&ctx, args)).boxed()
    })
}

/// Wrap an async closure as a [`RunFn`].
pub fn run_async<F, Fut>(f: F) -> RunFn
where
    F: Fn(CallContext, Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, RpcError>> + Send + 'static,
{
    Arc::new(move |ctx: CallContext, args: Option<Value>| f(ctx, args).boxed())
}

/// Wrap a synchronous closure as a [`ValidateFn`].
pub fn validate_with<F>(f: F) -> ValidateFn
where
    F: Fn(&CallContext, Option<&Value>) -> Result<(), RpcError> + Send + Sync + 'static,
{
    Arc::new(move |ctx: CallContext, args: Option<Value>| {
        future::ready(f(&ctx, args.as_ref())).boxed()
    })
}

/// A validator that accepts every input.
pub fn accept_all() -> ValidateFn {
    Arc::new(|_: CallContext, _: Option<Value>| future::ready(Ok(())).boxed())
}

/// Named transformer applied to a [`MethodDefinition`] while a method is
/// being constructed.
#[derive(Clone)]
pub struct Mixin {
    name: Cow<'static, str>,
    transform: Arc<Transform>,
}

impl Mixin {
    pub fn new<F>(name: impl Into<Cow<'static, str>>, transform: F) -> Self
    where
        F: Fn(MethodDefinition) -> Result<MethodDefinition, RpcError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            transform: Arc::new(transform),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, definition: MethodDefinition) -> Result<MethodDefinition, RpcError> {
        (self.transform)(definition)
    }
}

impl fmt::Debug for Mixin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mixin").field("name", &self.name).finish()
    }
}

/// Call-behavior flags forwarded to the runtime with every invocation.
///
/// Only the fields below are recognized; parsing a JSON document with any
/// other key fails. `on_result_received` can only be set in code.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ApplyOptions {
    pub wait: Option<bool>,
    #[serde(skip)]
    pub on_result_received: Option<ResultCallback>,
    pub no_retry: Option<bool>,
    pub throw_stub_exceptions: Option<bool>,
    pub return_stub_value: Option<bool>,
}

impl ApplyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn wait(mut self, wait: bool) -> Self {
        self.wait = Some(wait);
        self
    }

    pub fn no_retry(mut self, no_retry: bool) -> Self {
        self.no_retry = Some(no_retry);
        self
    }

    pub fn throw_stub_exceptions(mut self, throw: bool) -> Self {
        self.throw_stub_exceptions = Some(throw);
        self
    }

    pub fn return_stub_value(mut self, value: bool) -> Self {
        self.return_stub_value = Some(value);
        self
    }

    pub fn on_result_received<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Result<Value, RpcError>) + Send + Sync + 'static,
    {
        self.on_result_received = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for ApplyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplyOptions")
            .field("wait", &self.wait)
            .field("on_result_received", &self.on_result_received.is_some())
            .field("no_retry", &self.no_retry)
            .field("throw_stub_exceptions", &self.throw_stub_exceptions)
            .field("return_stub_value", &self.return_stub_value)
            .finish()
    }
}

/// Options object passed to a method type's constructor.
#[derive(Clone, Default)]
pub struct MethodDefinition {
    pub name: String,
    pub validate: Option<ValidateFn>,
    pub run: Option<RunFn>,
    pub apply_options: Option<ApplyOptions>,
    pub mixins: Vec<Mixin>,
    /// Pass-through fields, in declaration order.
    pub extra: IndexMap<String, Value>,
}

impl MethodDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Fetch a pass-through field that must hold a string.
    ///
    /// Meant for mixins that depend on a field another mixin or the caller
    /// provides.
    pub fn require_str(&self, key: &str) -> Result<&str, RpcError> {
        match self.extra.get(key) {
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(RpcError::bad_request(format!(
                "method '{}': field '{}' must be a string, got {}",
                self.name, key, other
            ))),
            None => Err(RpcError::bad_request(format!(
                "method '{}': missing required field '{}'",
                self.name, key
            ))),
        }
    }
}

impl fmt::Debug for MethodDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDefinition")
            .field("name", &self.name)
            .field("validate", &self.validate.is_some())
            .field("run", &self.run.is_some())
            .field("apply_options", &self.apply_options)
            .field("mixins", &self.mixins)
            .field("extra", &self.extra)
            .finish()
    }
}

/// Contract every invocable method fulfils.
#[async_trait]
pub trait ValidatedMethod: Send + Sync {
    fn name(&self) -> &str;

    fn validate(&self) -> Option<&ValidateFn>;

    fn run(&self) -> Option<&RunFn>;

    fn apply_options(&self) -> Option<&ApplyOptions> {
        None
    }

    fn extra(&self, _key: &str) -> Option<&Value> {
        None
    }

    /// Validate `args`, then run the method body with them.
    async fn call(&self, ctx: CallContext, args: Option<Value>) -> Result<Value, RpcError> {
        let validate = self.validate().ok_or_else(|| {
            RpcError::internal(format!("method '{}' has no validate function", self.name()))
        })?;
        let run = self.run().ok_or_else(|| {
            RpcError::internal(format!("method '{}' has no run function", self.name()))
        })?;

        let result = match validate(ctx.clone(), args.clone()).await {
            Ok(()) => run(ctx, args).await,
            Err(e) => Err(e),
        };

        if let Some(callback) = self
            .apply_options()
            .and_then(|options| options.on_result_received.as_ref())
        {
            callback(&result);
        }
        result
    }
}

/// A method type constructible from a [`MethodDefinition`].
///
/// Custom method types wrap or replace [`StandardMethod`] by implementing
/// this trait.
pub trait MethodType: ValidatedMethod + Sized + 'static {
    fn construct(definition: MethodDefinition) -> Result<Self, RpcError>;
}

/// The stock validated method.
///
/// Construction applies the definition's mixins in order, then requires a
/// name, a validate function and a run function.
pub struct StandardMethod {
    name: String,
    validate: ValidateFn,
    run: RunFn,
    apply_options: Option<ApplyOptions>,
    extra: IndexMap<String, Value>,
}

impl MethodType for StandardMethod {
    fn construct(mut definition: MethodDefinition) -> Result<Self, RpcError> {
        let mixins = std::mem::take(&mut definition.mixins);
        let definition = mixins.iter().try_fold(definition, |definition, mixin| {
            debug!("Applying mixin '{}' to method '{}'", mixin.name(), definition.name);
            mixin.apply(definition)
        })?;

        let MethodDefinition {
            name,
            validate,
            run,
            apply_options,
            extra,
            ..
        } = definition;

        if name.is_empty() {
            return Err(RpcError::bad_request("method name must not be empty"));
        }
        let validate = validate.ok_or_else(|| {
            RpcError::bad_request(format!("method '{}' requires a validate function", name))
        })?;
        let run = run.ok_or_else(|| {
            RpcError::bad_request(format!("method '{}' requires a run function", name))
        })?;

        Ok(StandardMethod {
            name,
            validate,
            run,
            apply_options,
            extra,
        })
    }
}

#[async_trait]
impl ValidatedMethod for StandardMethod {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Option<&ValidateFn> {
        Some(&self.validate)
    }

    fn run(&self) -> Option<&RunFn> {
        Some(&self.run)
    }

    fn apply_options(&self) -> Option<&ApplyOptions> {
        self.apply_options.as_ref()
    }

    fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

impl fmt::Debug for StandardMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardMethod")
            .field("name", &self.name)
            .field("apply_options", &self.apply_options)
            .field("extra", &self.extra)
            .finish()
    }
}
