use serde::{Deserialize, Serialize};

/// Caller identity threaded explicitly through store and dispatcher calls.
///
/// Every read is scoped to `user_id`; records created on behalf of the
/// caller are owned by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestContext {
    pub user_id: String,
}

impl RequestContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into() }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}
