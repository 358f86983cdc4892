use tauri::State;

use crate::error::AppError;
use crate::models::identity::{Role, UserIdentity};
use crate::services::auth_service::{LoginOutcome, RegisterOutcome};
use crate::services::session_guard::GuardDecision;

use super::{AppState, CommandResult};

#[tauri::command]
pub async fn auth_login(
    state: State<'_, AppState>,
    role: Role,
    username: String,
    password: String,
) -> CommandResult<LoginOutcome> {
    let auth = state.auth();
    Ok(auth.login(role, &username, &password).await?)
}

#[tauri::command]
pub async fn auth_register(
    state: State<'_, AppState>,
    role: Role,
    username: String,
    password: String,
) -> CommandResult<RegisterOutcome> {
    let auth = state.auth();
    Ok(auth.register(role, &username, &password).await?)
}

#[tauri::command]
pub async fn auth_logout(state: State<'_, AppState>) -> CommandResult<String> {
    // Poll tasks owned by the views are torn down with their views; a
    // straggling tick resolves through the gateway's 401 path.
    Ok(state.auth().logout()?)
}

/// The once-per-view-open gate. The webview calls this before painting
/// any protected page and follows the decision verbatim.
#[tauri::command]
pub async fn session_open_view(
    state: State<'_, AppState>,
    page: String,
) -> CommandResult<GuardDecision> {
    let required = Role::parse(&page)
        .ok_or_else(|| AppError::validation(format!("未知的受保护页面: {page}")))?;
    Ok(state.guard().authorize(required)?)
}

#[tauri::command]
pub async fn session_current(state: State<'_, AppState>) -> CommandResult<Option<UserIdentity>> {
    Ok(state.guard().current_identity()?)
}

/// Redirect recorded by a 401 interception since the last poll, if any.
#[tauri::command]
pub async fn session_take_redirect(state: State<'_, AppState>) -> CommandResult<Option<String>> {
    Ok(state.gateway().take_redirect())
}
