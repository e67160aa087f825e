use crate::{CallContext, RpcError, RpcTarget, ValidatedMethod};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Table of invocable methods, keyed by method name.
pub struct MethodRegistry {
    methods: DashMap<String, Arc<dyn ValidatedMethod>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        MethodRegistry {
            methods: DashMap::new(),
        }
    }

    /// Register a method under its own name.
    ///
    /// Fails with a conflict if the name is taken; the existing entry is kept.
    pub fn register(&self, method: Arc<dyn ValidatedMethod>) -> Result<(), RpcError> {
        match self.methods.entry(method.name().to_string()) {
            Entry::Occupied(entry) => Err(RpcError::conflict(format!(
                "method '{}' is already registered",
                entry.key()
            ))),
            Entry::Vacant(entry) => {
                info!("Registered method '{}'", entry.key());
                entry.insert(method);
                Ok(())
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn ValidatedMethod>> {
        self.methods.get(name).map(|entry| Arc::clone(&*entry))
    }

    pub fn remove(&self, name: &str) -> Option<Arc<dyn ValidatedMethod>> {
        self.methods.remove(name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Registered method names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Invoke a registered method on behalf of the caller in `ctx`.
    pub async fn invoke(
        &self,
        name: &str,
        ctx: CallContext,
        args: Option<Value>,
    ) -> Result<Value, RpcError> {
        let method = self
            .lookup(name)
            .ok_or_else(|| RpcError::not_found(format!("Unknown method: {}", name)))?;
        debug!(
            "Invoking method '{}' (invocation {}, caller {:?})",
            name,
            ctx.invocation_id(),
            ctx.caller_id()
        );
        method.call(ctx, args).await
    }
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.names())
            .finish()
    }
}

/// Transport-facing dispatch: calls arrive without an authenticated caller
/// and carry at most one payload argument.
#[async_trait]
impl RpcTarget for MethodRegistry {
    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, RpcError> {
        if args.len() > 1 {
            return Err(RpcError::bad_request(format!(
                "{} accepts a single argument, got {}",
                method,
                args.len()
            )));
        }
        self.invoke(method, CallContext::anonymous(), args.into_iter().next())
            .await
    }

    async fn get_property(&self, property: &str) -> Result<Value, RpcError> {
        match property {
            "methods" => Ok(json!(self.names())),
            "size" => Ok(json!(self.len())),
            _ => Err(RpcError::not_found(format!("Unknown property: {}", property))),
        }
    }
}
