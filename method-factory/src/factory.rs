//! The method builder.

use crate::config::FactoryConfig;
use crate::error::{BuildError, ConfigurationError};
use crate::options::{
    self, CheckedOptions, CustomValidateFn, MethodOptions, ValidationSource, Validity,
};
use futures::future::FutureExt;
use method_core::{
    accept_all, CallContext, MethodDefinition, MethodRegistry, MethodType, Mixin, RpcError,
    SchemaFactory, SchemaValidator, StandardMethod, ValidateFn, ValidatedMethod,
};
use serde_json::{Map, Value};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builds validated methods of type `B` from [`MethodOptions`].
///
/// Created once from a [`FactoryConfig`]; `create` can then be called for
/// every method, from any thread. The method type is checked at compile
/// time, so a type that does not implement `MethodType` is rejected:
///
/// ```compile_fail
/// use method_factory::{FactoryConfig, MethodFactory};
///
/// struct NotAMethod;
///
/// let factory = MethodFactory::new(FactoryConfig::new().with_base::<NotAMethod>());
/// ```
pub struct MethodFactory<B: MethodType = StandardMethod> {
    schema_factory: Option<Arc<dyn SchemaFactory>>,
    mixins: Arc<[Mixin]>,
    registry: Option<Arc<MethodRegistry>>,
    base: PhantomData<fn() -> B>,
}

impl<B: MethodType> MethodFactory<B> {
    pub fn new(config: FactoryConfig<B>) -> Result<Self, ConfigurationError> {
        config.check()?;

        debug!(
            "Method factory for {} with {} factory-level mixin(s), schema factory: {}",
            std::any::type_name::<B>(),
            config.mixins.len(),
            config.schema_factory.is_some()
        );

        Ok(MethodFactory {
            schema_factory: config.schema_factory,
            mixins: config.mixins.into(),
            registry: config.registry,
            base: PhantomData,
        })
    }

    pub fn registry(&self) -> Option<&Arc<MethodRegistry>> {
        self.registry.as_ref()
    }

    /// Validate `options`, resolve the validate function, compose the mixin
    /// chain, construct the method and register it.
    ///
    /// Nothing is registered unless every step succeeds.
    pub fn create(&self, options: MethodOptions) -> Result<Arc<B>, BuildError> {
        let CheckedOptions {
            name,
            validation,
            schema_options,
            run,
            apply_options,
            mixins,
            extra,
        } = options::check(options, self.schema_factory.is_some())?;

        let validate = self.resolve_validation(&name, validation, schema_options)?;

        let mixins: Vec<Mixin> = self.mixins.iter().cloned().chain(mixins).collect();
        debug!(
            "Constructing method '{}' with mixins [{}]",
            name,
            mixins.iter().map(Mixin::name).collect::<Vec<_>>().join(", ")
        );

        let definition = MethodDefinition {
            name: name.clone(),
            validate: Some(validate),
            run: Some(run),
            apply_options,
            mixins,
            extra,
        };

        let method = Arc::new(B::construct(definition)?);
        ensure_consistent(method.as_ref(), &name)?;

        if let Some(registry) = &self.registry {
            let endpoint: Arc<dyn ValidatedMethod> = method.clone();
            registry.register(endpoint)?;
        }

        info!("Created method '{}'", name);
        Ok(method)
    }

    fn resolve_validation(
        &self,
        name: &str,
        source: ValidationSource,
        schema_options: Option<Value>,
    ) -> Result<ValidateFn, BuildError> {
        match source {
            ValidationSource::Custom(custom) => Ok(wrap_custom(name, custom)),
            ValidationSource::AcceptAll => Ok(accept_all()),
            ValidationSource::Schema(definition) => {
                let factory = self.schema_factory.as_ref().ok_or_else(|| {
                    BuildError::Consistency {
                        method: name.to_string(),
                        reason: "schema validation selected without a schema factory".into(),
                    }
                })?;
                let validator = factory.create(&definition, schema_options.as_ref())?;
                Ok(delegate_to_schema(validator, schema_options))
            }
        }
    }
}

/// Interpret the boolean answers of a custom validate function. Errors the
/// function returns, and `Validity::Unchecked`, pass through untouched.
fn wrap_custom(name: &str, custom: CustomValidateFn) -> ValidateFn {
    let name: Arc<str> = Arc::from(name);
    Arc::new(move |ctx: CallContext, args: Option<Value>| {
        let custom = Arc::clone(&custom);
        let name = Arc::clone(&name);
        async move {
            match custom(ctx.clone(), args).await? {
                Validity::Invalid => {
                    warn!(
                        "Validation of '{}' failed for caller {:?}",
                        name,
                        ctx.caller_id()
                    );
                    Err(RpcError::validation_failed(ctx.caller_id(), &name))
                }
                Validity::Valid | Validity::Unchecked => Ok(()),
            }
        }
        .boxed()
    })
}

/// Validate through a compiled schema. A missing argument is checked as an
/// empty object.
fn delegate_to_schema(
    validator: Arc<dyn SchemaValidator>,
    schema_options: Option<Value>,
) -> ValidateFn {
    let schema_options = schema_options.map(Arc::new);
    Arc::new(move |_ctx: CallContext, args: Option<Value>| {
        let validator = Arc::clone(&validator);
        let schema_options = schema_options.clone();
        async move {
            let document = match args {
                None | Some(Value::Null) => Value::Object(Map::new()),
                Some(document) => document,
            };
            validator
                .validate(&document, schema_options.as_deref())
                .await
        }
        .boxed()
    })
}

/// Guard against method types or mixins that drop required fields.
fn ensure_consistent<B: ValidatedMethod>(method: &B, requested: &str) -> Result<(), BuildError> {
    let reason = if method.name() != requested {
        format!("constructed method is named '{}'", method.name())
    } else if method.validate().is_none() {
        "constructed method has no validate function".to_string()
    } else if method.run().is_none() {
        "constructed method has no run function".to_string()
    } else {
        return Ok(());
    };

    Err(BuildError::Consistency {
        method: requested.to_string(),
        reason,
    })
}

impl<B: MethodType> Clone for MethodFactory<B> {
    fn clone(&self) -> Self {
        MethodFactory {
            schema_factory: self.schema_factory.clone(),
            mixins: Arc::clone(&self.mixins),
            registry: self.registry.clone(),
            base: PhantomData,
        }
    }
}

impl<B: MethodType> fmt::Debug for MethodFactory<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodFactory")
            .field("base", &std::any::type_name::<B>())
            .field("schema_factory", &self.schema_factory.is_some())
            .field("mixins", &self.mixins)
            .field("registry", &self.registry)
            .finish()
    }
}
