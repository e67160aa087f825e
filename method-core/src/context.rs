use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-invocation context handed to validate and run functions.
///
/// Carries the identity of the invoking principal explicitly instead of
/// reading it from ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallContext {
    caller_id: Option<String>,
    invocation_id: Uuid,
}

impl CallContext {
    /// Context for an unauthenticated caller.
    pub fn anonymous() -> Self {
        Self {
            caller_id: None,
            invocation_id: Uuid::new_v4(),
        }
    }

    pub fn for_caller(caller_id: impl Into<String>) -> Self {
        Self {
            caller_id: Some(caller_id.into()),
            invocation_id: Uuid::new_v4(),
        }
    }

    pub fn caller_id(&self) -> Option<&str> {
        self.caller_id.as_deref()
    }

    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    pub fn is_anonymous(&self) -> bool {
        self.caller_id.is_none()
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::anonymous()
    }
}
