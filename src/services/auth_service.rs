use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ApiErrorCode, AppError, AppResult, ENTRY_REDIRECT};
use crate::models::identity::{AuthSession, LoginRequest, LoginResponse, RegisterRequest, Role, UserIdentity};
use crate::services::api_gateway::{ApiGateway, RequestOptions};
use crate::services::credential_store::{CredentialStore, PersistencePolicy};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub identity: UserIdentity,
    pub home_view: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterOutcome {
    pub message: String,
    pub next_view: String,
}

pub struct AuthService {
    gateway: Arc<ApiGateway>,
    credentials: Arc<CredentialStore>,
}

impl AuthService {
    pub fn new(gateway: Arc<ApiGateway>, credentials: Arc<CredentialStore>) -> Self {
        Self {
            gateway,
            credentials,
        }
    }

    /// Authenticate against the public login endpoint and persist the
    /// issued session. The outcome carries the role-specific home view
    /// the caller navigates to.
    pub async fn login(
        &self,
        role: Role,
        username: &str,
        password: &str,
    ) -> AppResult<LoginOutcome> {
        let username = username.trim();
        if username.is_empty() || password.trim().is_empty() {
            return Err(AppError::validation("请输入用户名和密码"));
        }

        let request = LoginRequest {
            role,
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self
            .gateway
            .send_unauthenticated("/api/login", RequestOptions::post(serde_json::to_value(&request)?))
            .await?;

        if !response.is_ok() {
            let message = response
                .error_message()
                .unwrap_or_else(|| "Login failed".to_string());
            warn!(
                target: "app::auth",
                status = response.status,
                username = %username,
                "login rejected"
            );
            return Err(AppError::api_with_details(
                ApiErrorCode::InvalidCredentials,
                message,
                Some(response.status),
                None,
                None,
            ));
        }

        let decoded: LoginResponse = response.decode()?;
        let session = AuthSession {
            token: decoded.token,
            user: decoded.user,
        };

        self.credentials.save(&session, PersistencePolicy::Durable)?;

        info!(
            target: "app::auth",
            username = %session.user.username,
            role = %session.user.role,
            "login succeeded"
        );

        Ok(LoginOutcome {
            home_view: session.user.role.home_view().to_string(),
            identity: session.user,
        })
    }

    /// Public self-registration. The dev role is provisioned by an
    /// admin, never through this flow; the restriction is enforced
    /// locally before any network call.
    pub async fn register(
        &self,
        role: Role,
        username: &str,
        password: &str,
    ) -> AppResult<RegisterOutcome> {
        let username = username.trim();
        if username.is_empty() || password.trim().is_empty() {
            return Err(AppError::validation("请输入用户名和密码"));
        }

        if !matches!(role, Role::Salesperson | Role::Manager) {
            return Err(AppError::validation(
                "公开注册仅支持 salesperson 和 manager 角色",
            ));
        }

        let request = RegisterRequest {
            role,
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self
            .gateway
            .send_unauthenticated(
                "/api/register",
                RequestOptions::post(serde_json::to_value(&request)?),
            )
            .await?;

        if !response.is_ok() {
            let message = response
                .error_message()
                .unwrap_or_else(|| "Registration failed".to_string());
            return Err(crate::services::api_gateway::status_error(
                response.status,
                message,
            ));
        }

        info!(target: "app::auth", username = %username, role = %role, "registration succeeded");

        Ok(RegisterOutcome {
            message: response
                .body
                .get("message")
                .and_then(|value| value.as_str())
                .unwrap_or("Registration successful! Please login.")
                .to_string(),
            next_view: ENTRY_REDIRECT.to_string(),
        })
    }

    /// Clear both credential scopes and hand back the entry view. Any
    /// poll tick still in flight resolves through the gateway's 401
    /// path, so no teardown ordering matters here.
    pub fn logout(&self) -> AppResult<String> {
        self.credentials.clear()?;
        info!(target: "app::auth", "logged out");
        Ok(ENTRY_REDIRECT.to_string())
    }
}
