use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::db::repositories::settings_repository::{AppSettingRow, SettingsRepository};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};

const KEY_API_BASE_URL: &str = "api_base_url";
const KEY_HTTP_TIMEOUT: &str = "http_timeout_secs";
const KEY_DASHBOARD_POLL: &str = "dashboard_poll_secs";
const KEY_LOGS_POLL: &str = "logs_poll_secs";
const KEY_THEME: &str = "theme";

const ENV_API_BASE_URL: &str = "SALESPULSE_API_BASE_URL";

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DASHBOARD_POLL_SECS: u64 = 30;
const DEFAULT_LOGS_POLL_SECS: u64 = 60;
const DEFAULT_THEME: &str = "system";
const THEME_OPTIONS: [&str; 3] = ["system", "light", "dark"];
const MIN_POLL_SECS: u64 = 5;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientSettings {
    pub api_base_url: String,
    pub http_timeout_secs: u64,
    pub dashboard_poll_secs: u64,
    pub logs_poll_secs: u64,
    pub theme: String,
    pub updated_at: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdateInput {
    pub api_base_url: Option<String>,
    pub http_timeout_secs: Option<u64>,
    pub dashboard_poll_secs: Option<u64>,
    pub logs_poll_secs: Option<u64>,
    pub theme: Option<String>,
}

pub struct SettingsService {
    db: DbPool,
    cache: RwLock<Option<ClientSettings>>,
}

impl SettingsService {
    pub fn new(db: DbPool) -> AppResult<Self> {
        Ok(Self {
            db,
            cache: RwLock::new(None),
        })
    }

    pub fn get(&self) -> AppResult<ClientSettings> {
        if let Ok(guard) = self.cache.read() {
            if let Some(settings) = guard.as_ref() {
                return Ok(settings.clone());
            }
        }

        let settings = self.load_settings_from_db()?;
        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(settings.clone());
        }
        Ok(settings)
    }

    pub fn update(&self, input: SettingsUpdateInput) -> AppResult<ClientSettings> {
        let mut current = self.get()?;

        if let Some(base_url) = input.api_base_url.as_ref() {
            let trimmed = base_url.trim();
            if trimmed.is_empty() {
                return Err(AppError::validation("服务器地址不能为空"));
            }
            if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
                return Err(AppError::validation("服务器地址必须以 http:// 或 https:// 开头"));
            }
            current.api_base_url = trimmed.trim_end_matches('/').to_string();
        }

        if let Some(timeout) = input.http_timeout_secs {
            if timeout == 0 {
                return Err(AppError::validation("请求超时必须大于 0 秒"));
            }
            current.http_timeout_secs = timeout;
        }

        if let Some(interval) = input.dashboard_poll_secs {
            ensure_valid_poll_interval(interval)?;
            current.dashboard_poll_secs = interval;
        }

        if let Some(interval) = input.logs_poll_secs {
            ensure_valid_poll_interval(interval)?;
            current.logs_poll_secs = interval;
        }

        if let Some(theme) = input.theme.as_ref() {
            let normalized = theme.trim().to_lowercase();
            if normalized.is_empty() {
                return Err(AppError::validation("主题不能为空"));
            }
            if !THEME_OPTIONS.contains(&normalized.as_str()) {
                return Err(AppError::validation("主题仅支持 system、light 或 dark"));
            }
            current.theme = normalized;
        }

        self.persist_changes(&input)?;
        current.updated_at = Utc::now().to_rfc3339();

        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(current.clone());
        }

        Ok(current)
    }

    pub fn api_base_url(&self) -> AppResult<String> {
        Ok(self.get()?.api_base_url)
    }

    pub fn http_timeout(&self) -> AppResult<Duration> {
        Ok(Duration::from_secs(self.get()?.http_timeout_secs))
    }

    pub fn dashboard_poll_interval(&self) -> AppResult<Duration> {
        Ok(Duration::from_secs(self.get()?.dashboard_poll_secs))
    }

    pub fn logs_poll_interval(&self) -> AppResult<Duration> {
        Ok(Duration::from_secs(self.get()?.logs_poll_secs))
    }

    fn persist_changes(&self, input: &SettingsUpdateInput) -> AppResult<()> {
        let base_url = input
            .api_base_url
            .as_ref()
            .map(|value| value.trim().trim_end_matches('/').to_string());
        let theme = input.theme.as_ref().map(|value| value.trim().to_lowercase());

        self.db.with_connection(|conn| {
            if let Some(value) = base_url.as_ref() {
                SettingsRepository::upsert(conn, KEY_API_BASE_URL, value)?;
            }

            if let Some(value) = input.http_timeout_secs {
                SettingsRepository::upsert(conn, KEY_HTTP_TIMEOUT, &value.to_string())?;
            }

            if let Some(value) = input.dashboard_poll_secs {
                SettingsRepository::upsert(conn, KEY_DASHBOARD_POLL, &value.to_string())?;
            }

            if let Some(value) = input.logs_poll_secs {
                SettingsRepository::upsert(conn, KEY_LOGS_POLL, &value.to_string())?;
            }

            if let Some(value) = theme.as_ref() {
                SettingsRepository::upsert(conn, KEY_THEME, value)?;
            }

            Ok(())
        })
    }

    fn load_settings_from_db(&self) -> AppResult<ClientSettings> {
        self.db.with_connection(|conn| {
            let rows = SettingsRepository::list(conn)?;
            let mut map: HashMap<String, AppSettingRow> = HashMap::new();
            let mut latest_updated_at: Option<String> = None;

            for row in rows {
                if latest_updated_at
                    .as_ref()
                    .map(|latest| row.updated_at > *latest)
                    .unwrap_or(true)
                {
                    latest_updated_at = Some(row.updated_at.clone());
                }
                map.insert(row.key.clone(), row);
            }

            // Env override beats the stored row, matching how the rest of
            // the configuration surface resolves.
            let api_base_url = std::env::var(ENV_API_BASE_URL)
                .ok()
                .map(|value| value.trim().trim_end_matches('/').to_string())
                .filter(|value| !value.is_empty())
                .or_else(|| map.get(KEY_API_BASE_URL).map(|row| row.value.clone()))
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

            let http_timeout_secs =
                parse_u64_setting(&map, KEY_HTTP_TIMEOUT, DEFAULT_HTTP_TIMEOUT_SECS);
            let dashboard_poll_secs =
                parse_u64_setting(&map, KEY_DASHBOARD_POLL, DEFAULT_DASHBOARD_POLL_SECS);
            let logs_poll_secs = parse_u64_setting(&map, KEY_LOGS_POLL, DEFAULT_LOGS_POLL_SECS);

            let theme = map
                .get(KEY_THEME)
                .map(|row| row.value.clone())
                .filter(|value| THEME_OPTIONS.contains(&value.as_str()))
                .unwrap_or_else(|| DEFAULT_THEME.to_string());

            Ok(ClientSettings {
                api_base_url,
                http_timeout_secs,
                dashboard_poll_secs,
                logs_poll_secs,
                theme,
                updated_at: latest_updated_at.unwrap_or_else(|| Utc::now().to_rfc3339()),
            })
        })
    }
}

fn parse_u64_setting(map: &HashMap<String, AppSettingRow>, key: &str, default: u64) -> u64 {
    match map.get(key) {
        Some(row) => row.value.parse().unwrap_or_else(|_| {
            warn!(
                target: "app::settings",
                key,
                value = %row.value,
                "stored setting is not a number, using default"
            );
            default
        }),
        None => default,
    }
}

fn ensure_valid_poll_interval(interval: u64) -> AppResult<()> {
    if interval < MIN_POLL_SECS {
        return Err(AppError::validation(format!(
            "轮询间隔不能小于 {MIN_POLL_SECS} 秒"
        )));
    }
    Ok(())
}
