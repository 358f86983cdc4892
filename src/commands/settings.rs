use tauri::{async_runtime, State};

use crate::error::AppError;
use crate::services::settings_service::{ClientSettings, SettingsUpdateInput};

use super::{AppState, CommandError, CommandResult};

#[tauri::command]
pub async fn settings_get(state: State<'_, AppState>) -> CommandResult<ClientSettings> {
    let app_state = state.inner().clone();
    run_blocking(move || app_state.settings().get()).await
}

#[tauri::command]
pub async fn settings_update(
    state: State<'_, AppState>,
    input: SettingsUpdateInput,
) -> CommandResult<ClientSettings> {
    let app_state = state.inner().clone();
    run_blocking(move || app_state.settings().update(input)).await
}

async fn run_blocking<T: Send + 'static>(
    task: impl FnOnce() -> Result<T, AppError> + Send + 'static,
) -> CommandResult<T> {
    async_runtime::spawn_blocking(task)
        .await
        .map_err(|err| CommandError::new("UNKNOWN", format!("设置任务执行失败: {err}"), None))?
        .map_err(CommandError::from)
}
