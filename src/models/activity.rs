use serde::{Deserialize, Serialize};

/// Append-only on the server; the client view is read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub timestamp: String,
    pub username: String,
    pub action: String,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityLogResponse {
    #[serde(default)]
    pub logs: Vec<ActivityLogEntry>,
}
