use std::sync::{Arc, Mutex, RwLock};

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::AppResult;
use crate::models::activity::{ActivityLogEntry, ActivityLogResponse};
use crate::services::api_gateway::{status_error, ApiGateway, RequestOptions};
use crate::services::settings_service::SettingsService;

/// Read-only activity log panel with the 60-second keep-alive variant
/// of the polling pipeline: each tick re-fetches the unfiltered list,
/// and a failed tick only logs; the previous entries stay rendered.
pub struct ActivityLogService {
    gateway: Arc<ApiGateway>,
    settings: Arc<SettingsService>,
    entries: RwLock<Vec<ActivityLogEntry>>,
    keepalive: Mutex<Option<JoinHandle<()>>>,
}

impl ActivityLogService {
    pub fn new(gateway: Arc<ApiGateway>, settings: Arc<SettingsService>) -> Self {
        Self {
            gateway,
            settings,
            entries: RwLock::new(Vec::new()),
            keepalive: Mutex::new(None),
        }
    }

    /// Fetch the log list, optionally filtered server-side.
    pub async fn load(&self, filter: Option<&str>) -> AppResult<Vec<ActivityLogEntry>> {
        let path = match filter.map(str::trim).filter(|value| !value.is_empty()) {
            Some(filter) => format!("/api/logs?filter={}", urlencoding::encode(filter)),
            None => "/api/logs".to_string(),
        };

        let response = self.gateway.send(&path, RequestOptions::get()).await?;
        if !response.is_ok() {
            return Err(status_error(
                response.status,
                response
                    .error_message()
                    .unwrap_or_else(|| "Failed to load activity logs".to_string()),
            ));
        }

        let decoded: ActivityLogResponse = response.decode()?;
        if let Ok(mut guard) = self.entries.write() {
            *guard = decoded.logs.clone();
        }
        debug!(target: "app::logs", count = decoded.logs.len(), "activity logs loaded");
        Ok(decoded.logs)
    }

    pub fn current(&self) -> Vec<ActivityLogEntry> {
        self.entries
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Start the keep-alive tick for the dev view. Starting again
    /// replaces (and aborts) any previous task, so one view owns at
    /// most one live tick.
    pub fn start_keepalive(self: &Arc<Self>) -> AppResult<()> {
        let interval = self.settings.logs_poll_interval()?;
        let service = Arc::clone(self);

        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                match service.load(None).await {
                    Ok(_) => {}
                    Err(err) if err.is_auth_expired() => {
                        debug!(
                            target: "app::logs",
                            "keep-alive tick after session invalidation, stopping"
                        );
                        break;
                    }
                    Err(err) => {
                        warn!(target: "app::logs", error = %err, "keep-alive tick failed");
                    }
                }
            }
        });

        if let Ok(mut guard) = self.keepalive.lock() {
            if let Some(previous) = guard.replace(handle) {
                previous.abort();
            }
        }

        debug!(target: "app::logs", interval_secs = interval.as_secs(), "log keep-alive started");
        Ok(())
    }

    /// View teardown: the keep-alive task is owned by the view and dies
    /// with it.
    pub fn stop_keepalive(&self) {
        if let Ok(mut guard) = self.keepalive.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
                debug!(target: "app::logs", "log keep-alive stopped");
            }
        }
    }

    pub fn is_keepalive_running(&self) -> bool {
        self.keepalive
            .lock()
            .map(|guard| guard.as_ref().map(|handle| !handle.is_finished()).unwrap_or(false))
            .unwrap_or(false)
    }
}

impl Drop for ActivityLogService {
    fn drop(&mut self) {
        self.stop_keepalive();
    }
}
