use serde::{Deserialize, Serialize};

/// A single key/value secret injected into every container invocation.
///
/// Secrets live in memory only — they are never written to the store or
/// echoed into logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    pub key: String,
    pub value: String,
}

impl Secret {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}
