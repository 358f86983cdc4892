use tauri::State;

use crate::models::platform_user::{PlatformUser, PlatformUserCreate};

use super::{AppState, CommandResult};

#[tauri::command]
pub async fn users_load(state: State<'_, AppState>) -> CommandResult<Vec<PlatformUser>> {
    Ok(state.users().load().await?)
}

#[tauri::command]
pub async fn users_add(
    state: State<'_, AppState>,
    input: PlatformUserCreate,
) -> CommandResult<Vec<PlatformUser>> {
    Ok(state.users().add(input).await?)
}

#[tauri::command]
pub async fn users_delete(
    state: State<'_, AppState>,
    id: i64,
    confirmed: bool,
) -> CommandResult<Vec<PlatformUser>> {
    Ok(state.users().delete(id, confirmed).await?)
}
