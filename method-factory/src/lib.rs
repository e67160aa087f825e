//! Factory for validated RPC methods.
//!
//! A [`MethodFactory`] is configured once with an optional schema engine, a
//! set of factory-level mixins and an optional registry. Each call to
//! [`MethodFactory::create`] checks a [`MethodOptions`] value, resolves its
//! validate function, chains the mixins and constructs the method.
//!
//! # Example
//!
//! ```
//! use method_core::{run_with, CallContext, ShorthandSchemaFactory, ValidatedMethod};
//! use method_factory::{FactoryConfig, MethodFactory, MethodOptions};
//! use serde_json::json;
//!
//! let factory = MethodFactory::new(
//!     FactoryConfig::new().schema_factory(ShorthandSchemaFactory),
//! )
//! .unwrap();
//!
//! let greet = factory
//!     .create(
//!         MethodOptions::new("greet")
//!             .schema(json!({ "title": "string" }))
//!             .run(run_with(|_, args| {
//!                 let title = args.as_ref().and_then(|a| a["title"].as_str()).unwrap_or("");
//!                 Ok(json!(format!("Hello, {}", title)))
//!             })),
//!     )
//!     .unwrap();
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! let reply = rt
//!     .block_on(greet.call(CallContext::anonymous(), Some(json!({ "title": "Mr.x" }))))
//!     .unwrap();
//! assert_eq!(reply, json!("Hello, Mr.x"));
//! ```
//!
//! # Validation precedence
//!
//! | validate | schema factory | schema  | validation used               |
//! |----------|----------------|---------|-------------------------------|
//! | given    | any            | any     | custom validate               |
//! | absent   | configured     | null    | none, every input accepted    |
//! | absent   | configured     | object  | schema engine                 |
//! | absent   | configured     | unset   | rejected: `MissingSchema`     |
//! | absent   | none           | any     | rejected: `MissingValidate`   |

pub mod config;
pub mod error;
pub mod factory;
pub mod logging;
pub mod options;

pub use config::{FactoryConfig, FactorySettings, MixinCatalog};
pub use error::{BuildError, ConfigurationError, OptionsError, ValidationOptionsError};
pub use factory::MethodFactory;
pub use logging::{init_logging, init_logging_with, init_test_logging, LogFormat, LOG_FORMAT_ENV};
pub use options::{
    custom_validate, custom_validate_async, ApplyOptionsInput, CustomValidateFn, MethodOptions,
    SchemaSpec, Validity, RESERVED_FIELDS,
};
