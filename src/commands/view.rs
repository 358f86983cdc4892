use tauri::State;

use crate::services::view_state::ViewStateSnapshot;

use super::{AppState, CommandResult};

#[tauri::command]
pub async fn view_register(
    state: State<'_, AppState>,
    page: String,
    tabs: Vec<String>,
) -> CommandResult<ViewStateSnapshot> {
    Ok(state.views().register(&page, tabs)?)
}

#[tauri::command]
pub async fn view_activate(
    state: State<'_, AppState>,
    page: String,
    tab: String,
) -> CommandResult<ViewStateSnapshot> {
    Ok(state.views().activate(&page, &tab)?)
}

#[tauri::command]
pub async fn view_snapshot(
    state: State<'_, AppState>,
    page: String,
) -> CommandResult<ViewStateSnapshot> {
    Ok(state.views().snapshot(&page)?)
}
