pub mod auth;
pub mod dashboard;
pub mod logs;
pub mod products;
pub mod settings;
pub mod submission;
pub mod users;
pub mod view;

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::{error, warn};

use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::services::activity_log_service::ActivityLogService;
use crate::services::api_gateway::ApiGateway;
use crate::services::auth_service::AuthService;
use crate::services::credential_store::CredentialStore;
use crate::services::dashboard_service::DashboardService;
use crate::services::product_service::ProductService;
use crate::services::session_guard::SessionGuard;
use crate::services::settings_service::SettingsService;
use crate::services::submission_service::SubmissionService;
use crate::services::user_admin_service::UserAdminService;
use crate::services::view_state::ViewRegistry;

#[derive(Clone)]
pub struct AppState {
    db_pool: DbPool,
    settings_service: Arc<SettingsService>,
    credential_store: Arc<CredentialStore>,
    gateway: Arc<ApiGateway>,
    session_guard: Arc<SessionGuard>,
    auth_service: Arc<AuthService>,
    view_registry: Arc<ViewRegistry>,
    dashboard_service: Arc<DashboardService>,
    product_service: Arc<ProductService>,
    user_admin_service: Arc<UserAdminService>,
    activity_log_service: Arc<ActivityLogService>,
    submission_service: Arc<SubmissionService>,
}

impl AppState {
    pub fn new(db_pool: DbPool) -> AppResult<Self> {
        let settings_service = Arc::new(SettingsService::new(db_pool.clone())?);
        let credential_store = Arc::new(CredentialStore::new(db_pool.clone()));
        let gateway = Arc::new(ApiGateway::new(
            Arc::clone(&credential_store),
            Arc::clone(&settings_service),
        )?);
        let session_guard = Arc::new(SessionGuard::new(Arc::clone(&credential_store)));
        let auth_service = Arc::new(AuthService::new(
            Arc::clone(&gateway),
            Arc::clone(&credential_store),
        ));
        let view_registry = Arc::new(ViewRegistry::new());
        let dashboard_service = Arc::new(DashboardService::new(
            Arc::clone(&gateway),
            Arc::clone(&settings_service),
            db_pool.path(),
        )?);
        let product_service = Arc::new(ProductService::new(Arc::clone(&gateway)));
        let user_admin_service = Arc::new(UserAdminService::new(Arc::clone(&gateway)));
        let activity_log_service = Arc::new(ActivityLogService::new(
            Arc::clone(&gateway),
            Arc::clone(&settings_service),
        ));
        let submission_service = Arc::new(SubmissionService::new(Arc::clone(&gateway)));

        Ok(Self {
            db_pool,
            settings_service,
            credential_store,
            gateway,
            session_guard,
            auth_service,
            view_registry,
            dashboard_service,
            product_service,
            user_admin_service,
            activity_log_service,
            submission_service,
        })
    }

    pub fn settings(&self) -> Arc<SettingsService> {
        Arc::clone(&self.settings_service)
    }

    pub fn credentials(&self) -> Arc<CredentialStore> {
        Arc::clone(&self.credential_store)
    }

    pub fn gateway(&self) -> Arc<ApiGateway> {
        Arc::clone(&self.gateway)
    }

    pub fn guard(&self) -> Arc<SessionGuard> {
        Arc::clone(&self.session_guard)
    }

    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth_service)
    }

    pub fn views(&self) -> Arc<ViewRegistry> {
        Arc::clone(&self.view_registry)
    }

    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard_service)
    }

    pub fn products(&self) -> Arc<ProductService> {
        Arc::clone(&self.product_service)
    }

    pub fn users(&self) -> Arc<UserAdminService> {
        Arc::clone(&self.user_admin_service)
    }

    pub fn logs(&self) -> Arc<ActivityLogService> {
        Arc::clone(&self.activity_log_service)
    }

    pub fn submissions(&self) -> Arc<SubmissionService> {
        Arc::clone(&self.submission_service)
    }

    pub fn db(&self) -> DbPool {
        self.db_pool.clone()
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

impl CommandError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Option<JsonValue>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details,
        }
    }
}

impl From<AppError> for CommandError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::AuthExpired { redirect } => {
                warn!(target: "app::command", %redirect, "session expired in command");
                CommandError::new(
                    "AUTH_EXPIRED",
                    "会话已失效，请重新登录",
                    Some(serde_json::json!({ "redirect": redirect })),
                )
            }
            AppError::Validation {
                message, details, ..
            } => CommandError::new("VALIDATION_ERROR", message, details),
            AppError::NotFound => CommandError::new("NOT_FOUND", "请求的资源不存在", None),
            AppError::Conflict { message } => CommandError::new("CONFLICT", message, None),
            AppError::Api {
                code,
                message,
                status,
                correlation_id,
                details,
            } => {
                let mut merged = JsonMap::new();
                if let Some(existing) = details {
                    match existing {
                        JsonValue::Object(map) => {
                            for (key, value) in map {
                                merged.insert(key, value);
                            }
                        }
                        value => {
                            merged.insert("info".to_string(), value);
                        }
                    }
                }
                if let Some(status) = status {
                    merged.insert("status".to_string(), JsonValue::from(status));
                }
                if let Some(id) = correlation_id {
                    merged.insert("correlationId".to_string(), JsonValue::String(id));
                }
                let detail_value = if merged.is_empty() {
                    None
                } else {
                    Some(JsonValue::Object(merged))
                };
                CommandError::new(code.as_str(), message, detail_value)
            }
            AppError::Database { message } => {
                error!(target: "app::command", %message, "database error in command");
                CommandError::new("UNKNOWN", message, None)
            }
            AppError::Serialization(error) => {
                error!(target: "app::command", error = %error, "serialization error in command");
                CommandError::new("UNKNOWN", "序列化失败", None)
            }
            AppError::Io(error) => {
                error!(target: "app::command", error = %error, "io error in command");
                CommandError::new("UNKNOWN", "文件系统读写失败", None)
            }
            AppError::Other(message) => {
                error!(target: "app::command", %message, "unexpected error in command");
                CommandError::new("UNKNOWN", message, None)
            }
        }
    }
}
