use tauri::State;

use crate::models::submission::{
    AssistReply, GrammarSuggestion, SubmissionKind, SubmissionOutcome,
};
use crate::services::submission_service::DraftState;

use super::{AppState, CommandResult};

#[tauri::command]
pub async fn submission_draft_update(
    state: State<'_, AppState>,
    kind: SubmissionKind,
    text: String,
) -> CommandResult<DraftState> {
    Ok(state.submissions().update_draft(kind, text))
}

#[tauri::command]
pub async fn submission_submit(
    state: State<'_, AppState>,
    kind: SubmissionKind,
) -> CommandResult<SubmissionOutcome> {
    Ok(state.submissions().submit(kind).await?)
}

#[tauri::command]
pub async fn submission_check_grammar(
    state: State<'_, AppState>,
    kind: SubmissionKind,
) -> CommandResult<GrammarSuggestion> {
    Ok(state.submissions().check_grammar(kind).await?)
}

/// Explicit apply only; the suggestion never overwrites the draft by
/// itself.
#[tauri::command]
pub async fn submission_apply_suggestion(
    state: State<'_, AppState>,
    kind: SubmissionKind,
) -> CommandResult<DraftState> {
    Ok(state.submissions().apply_suggestion(kind)?)
}

#[tauri::command]
pub async fn assist_ask(
    state: State<'_, AppState>,
    message: String,
) -> CommandResult<AssistReply> {
    Ok(state.submissions().ask_assistant(&message).await?)
}
