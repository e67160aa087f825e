//! Factory configuration.
//!
//! [`FactoryConfig`] is assembled in code. [`FactorySettings`] is the
//! declarative form, read from JSON and resolved against a [`MixinCatalog`].

use crate::error::ConfigurationError;
use indexmap::IndexMap;
use method_core::{MethodRegistry, MethodType, Mixin, SchemaFactory, StandardMethod};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Settings shared by every method one factory produces.
///
/// `B` is the method type to instantiate; it defaults to [`StandardMethod`].
pub struct FactoryConfig<B: MethodType = StandardMethod> {
    pub(crate) schema_factory: Option<Arc<dyn SchemaFactory>>,
    pub(crate) mixins: Vec<Mixin>,
    pub(crate) registry: Option<Arc<MethodRegistry>>,
    base: PhantomData<fn() -> B>,
}

impl FactoryConfig<StandardMethod> {
    pub fn new() -> Self {
        FactoryConfig {
            schema_factory: None,
            mixins: Vec::new(),
            registry: None,
            base: PhantomData,
        }
    }
}

impl Default for FactoryConfig<StandardMethod> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: MethodType> FactoryConfig<B> {
    /// Switch the method type the factory instantiates.
    pub fn with_base<C: MethodType>(self) -> FactoryConfig<C> {
        FactoryConfig {
            schema_factory: self.schema_factory,
            mixins: self.mixins,
            registry: self.registry,
            base: PhantomData,
        }
    }

    pub fn schema_factory(mut self, factory: impl SchemaFactory + 'static) -> Self {
        self.schema_factory = Some(Arc::new(factory));
        self
    }

    pub fn shared_schema_factory(mut self, factory: Arc<dyn SchemaFactory>) -> Self {
        self.schema_factory = Some(factory);
        self
    }

    /// Append a factory-level mixin.
    pub fn mixin(mut self, mixin: Mixin) -> Self {
        self.mixins.push(mixin);
        self
    }

    pub fn mixins(mut self, mixins: impl IntoIterator<Item = Mixin>) -> Self {
        self.mixins.extend(mixins);
        self
    }

    /// Register every constructed method in `registry`.
    pub fn registry(mut self, registry: Arc<MethodRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn has_schema_factory(&self) -> bool {
        self.schema_factory.is_some()
    }

    pub(crate) fn check(&self) -> Result<(), ConfigurationError> {
        match self.mixins.iter().position(|m| m.name().is_empty()) {
            Some(index) => Err(ConfigurationError::UnnamedMixin { index }),
            None => Ok(()),
        }
    }
}

impl<B: MethodType> Clone for FactoryConfig<B> {
    fn clone(&self) -> Self {
        FactoryConfig {
            schema_factory: self.schema_factory.clone(),
            mixins: self.mixins.clone(),
            registry: self.registry.clone(),
            base: PhantomData,
        }
    }
}

impl<B: MethodType> fmt::Debug for FactoryConfig<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryConfig")
            .field("base", &std::any::type_name::<B>())
            .field("schema_factory", &self.schema_factory.is_some())
            .field("mixins", &self.mixins)
            .field("registry", &self.registry.is_some())
            .finish()
    }
}

/// Mixins addressable by name from [`FactorySettings`].
#[derive(Debug, Clone, Default)]
pub struct MixinCatalog {
    mixins: IndexMap<String, Mixin>,
}

impl MixinCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mixin under its own name, replacing any previous entry.
    pub fn insert(&mut self, mixin: Mixin) -> &mut Self {
        self.mixins.insert(mixin.name().to_string(), mixin);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Mixin> {
        self.mixins.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.mixins.keys().cloned().collect()
    }
}

/// Declarative factory configuration, e.g.
///
/// ```json
/// { "schemaEngine": "json-schema", "mixins": ["audited", "loggedIn"] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FactorySettings {
    /// `"json-schema"` or `"shorthand"`; no engine when absent.
    #[serde(default)]
    pub schema_engine: Option<String>,
    /// Factory-level mixins, by catalog name, in application order.
    #[serde(default)]
    pub mixins: Vec<String>,
}

impl FactorySettings {
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(json).map_err(|source| ConfigurationError::InvalidSettings { source })
    }

    /// Turn the settings into a [`FactoryConfig`] for the standard method type.
    pub fn resolve(&self, catalog: &MixinCatalog) -> Result<FactoryConfig, ConfigurationError> {
        let mut config = FactoryConfig::new();

        if let Some(engine) = &self.schema_engine {
            config.schema_factory = Some(schema_engine(engine)?);
        }

        for name in &self.mixins {
            let mixin = catalog
                .get(name)
                .ok_or_else(|| ConfigurationError::UnknownMixin {
                    name: name.clone(),
                    known: catalog.names(),
                })?;
            config.mixins.push(mixin.clone());
        }

        config.check()?;
        Ok(config)
    }
}

#[cfg(feature = "validation")]
fn schema_engine(name: &str) -> Result<Arc<dyn SchemaFactory>, ConfigurationError> {
    use method_core::{JsonSchemaFactory, ShorthandSchemaFactory};

    match name {
        "json-schema" => Ok(Arc::new(JsonSchemaFactory)),
        "shorthand" => Ok(Arc::new(ShorthandSchemaFactory)),
        other => Err(ConfigurationError::UnknownSchemaEngine {
            name: other.to_string(),
        }),
    }
}

#[cfg(not(feature = "validation"))]
fn schema_engine(name: &str) -> Result<Arc<dyn SchemaFactory>, ConfigurationError> {
    Err(ConfigurationError::UnknownSchemaEngine {
        name: name.to_string(),
    })
}
