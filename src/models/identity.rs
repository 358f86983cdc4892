use serde::{Deserialize, Serialize};

/// Role claim carried by the server-issued identity. Trust is delegated
/// to the server; the client only routes and gates views on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Salesperson,
    Manager,
    Dev,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Salesperson => "salesperson",
            Role::Manager => "manager",
            Role::Dev => "dev",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "salesperson" => Some(Role::Salesperson),
            "manager" => Some(Role::Manager),
            "dev" => Some(Role::Dev),
            _ => None,
        }
    }

    /// View a freshly authenticated user of this role lands on.
    pub fn home_view(self) -> &'static str {
        match self {
            Role::Salesperson => "/salesperson",
            Role::Manager => "/manager",
            Role::Dev => "/dev",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub username: String,
    pub role: Role,
}

/// One logical session: the opaque bearer token plus the identity it
/// was issued for. Stored as-is; the client never inspects the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: UserIdentity,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub role: Role,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserIdentity,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub role: Role,
    pub username: String,
    pub password: String,
}
