use tauri::State;

use crate::models::activity::ActivityLogEntry;

use super::{AppState, CommandResult};

#[tauri::command]
pub async fn logs_load(
    state: State<'_, AppState>,
    filter: Option<String>,
) -> CommandResult<Vec<ActivityLogEntry>> {
    Ok(state.logs().load(filter.as_deref()).await?)
}

/// Dev view keep-alive: re-fetches the unfiltered log list on the
/// configured cadence until the view closes.
#[tauri::command]
pub async fn logs_start_keepalive(state: State<'_, AppState>) -> CommandResult<()> {
    Ok(state.logs().start_keepalive()?)
}

#[tauri::command]
pub async fn logs_stop_keepalive(state: State<'_, AppState>) -> CommandResult<()> {
    state.logs().stop_keepalive();
    Ok(())
}
