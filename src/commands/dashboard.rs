use tauri::State;

use crate::models::dashboard::{DashboardRender, ReportDownload};

use super::{AppState, CommandResult};

/// Manager view bootstrap: one immediate refresh plus the repeating
/// poll owned by the view. The guard decision comes first via
/// `session_open_view`; this command assumes it was a grant.
#[tauri::command]
pub async fn dashboard_open(state: State<'_, AppState>) -> CommandResult<Option<DashboardRender>> {
    let dashboard = state.dashboard();
    let render = dashboard.refresh().await?;
    dashboard.start_polling()?;
    Ok(render)
}

#[tauri::command]
pub async fn dashboard_refresh(
    state: State<'_, AppState>,
) -> CommandResult<Option<DashboardRender>> {
    Ok(state.dashboard().refresh().await?)
}

#[tauri::command]
pub async fn dashboard_current(
    state: State<'_, AppState>,
) -> CommandResult<Option<DashboardRender>> {
    Ok(state.dashboard().current_render())
}

/// View teardown: cancels the repeating task and releases the chart
/// bindings the view owned.
#[tauri::command]
pub async fn dashboard_close(state: State<'_, AppState>) -> CommandResult<()> {
    state.dashboard().stop_polling();
    Ok(())
}

#[tauri::command]
pub async fn dashboard_download_report(
    state: State<'_, AppState>,
) -> CommandResult<ReportDownload> {
    Ok(state.dashboard().download_report().await?)
}
