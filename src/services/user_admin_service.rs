use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::platform_user::{PlatformUser, PlatformUserCreate, UserListResponse};
use crate::services::api_gateway::{status_error, ApiGateway, RequestOptions};

/// Admin-visible platform users. Same refetch-after-mutation discipline
/// as the product panel; the server owns the records.
pub struct UserAdminService {
    gateway: Arc<ApiGateway>,
    items: RwLock<Vec<PlatformUser>>,
}

impl UserAdminService {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self {
            gateway,
            items: RwLock::new(Vec::new()),
        }
    }

    pub async fn load(&self) -> AppResult<Vec<PlatformUser>> {
        let response = self.gateway.send("/api/users", RequestOptions::get()).await?;
        if !response.is_ok() {
            return Err(status_error(
                response.status,
                response
                    .error_message()
                    .unwrap_or_else(|| "Failed to load users".to_string()),
            ));
        }

        let decoded: UserListResponse = response.decode()?;
        self.replace_items(decoded.users.clone());
        debug!(target: "app::users", count = decoded.users.len(), "user list loaded");
        Ok(decoded.users)
    }

    pub fn current(&self) -> Vec<PlatformUser> {
        self.items
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub async fn add(&self, input: PlatformUserCreate) -> AppResult<Vec<PlatformUser>> {
        if input.username.trim().is_empty() || input.password.trim().is_empty() {
            return Err(AppError::validation("请填写用户名和密码"));
        }

        let response = self
            .gateway
            .send(
                "/api/users",
                RequestOptions::post(serde_json::to_value(&input)?),
            )
            .await?;

        if !response.is_ok() {
            // The server rejects duplicates with an explanatory body;
            // surface it verbatim and keep the form populated.
            return Err(status_error(
                response.status,
                response
                    .error_message()
                    .unwrap_or_else(|| "Failed to add user".to_string()),
            ));
        }

        info!(target: "app::users", username = %input.username, role = %input.role, "user added");
        self.load().await
    }

    pub async fn delete(&self, id: i64, confirmed: bool) -> AppResult<Vec<PlatformUser>> {
        if !confirmed {
            return Err(AppError::validation("删除用户前需要确认"));
        }

        let response = self
            .gateway
            .send(&format!("/api/users/{id}"), RequestOptions::delete())
            .await?;

        if !response.is_ok() {
            return Err(status_error(
                response.status,
                response
                    .error_message()
                    .unwrap_or_else(|| "Failed to delete user".to_string()),
            ));
        }

        info!(target: "app::users", id, "user deleted");
        self.load().await
    }

    fn replace_items(&self, items: Vec<PlatformUser>) {
        if let Ok(mut guard) = self.items.write() {
            *guard = items;
        }
    }
}
