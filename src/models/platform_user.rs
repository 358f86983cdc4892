use serde::{Deserialize, Serialize};

use crate::models::identity::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
    /// Absent for accounts that never logged in; rendered as "Never".
    #[serde(default)]
    pub last_login: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformUserCreate {
    pub username: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListResponse {
    #[serde(default)]
    pub users: Vec<PlatformUser>,
}
