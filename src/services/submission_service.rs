use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{ApiErrorCode, AppError, AppResult};
use crate::models::submission::{
    AssistReply, GrammarResponse, GrammarSuggestion, ScoreBadge, SubmissionKind,
    SubmissionOutcome, SubmissionResponse,
};
use crate::services::api_gateway::{status_error, ApiGateway, RequestOptions};

/// Draft text plus the pending grammar suggestion for one submission
/// kind. A failed submission leaves the draft populated for
/// correction; a successful one clears it.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftState {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Feedback/lead submission, grammar assist, and the conversational
/// assist surface. Everything is a single round trip through the
/// gateway; the shared endpoint disambiguates by content server-side.
pub struct SubmissionService {
    gateway: Arc<ApiGateway>,
    drafts: RwLock<HashMap<SubmissionKind, DraftState>>,
}

impl SubmissionService {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self {
            gateway,
            drafts: RwLock::new(HashMap::new()),
        }
    }

    pub fn update_draft(&self, kind: SubmissionKind, text: String) -> DraftState {
        let mut guard = match self.drafts.write() {
            Ok(guard) => guard,
            Err(_) => return DraftState::default(),
        };
        let draft = guard.entry(kind).or_default();
        draft.text = text;
        draft.clone()
    }

    pub fn draft(&self, kind: SubmissionKind) -> DraftState {
        self.drafts
            .read()
            .ok()
            .and_then(|guard| guard.get(&kind).cloned())
            .unwrap_or_default()
    }

    /// Submit the current draft. Blank input is rejected locally before
    /// any network call.
    pub async fn submit(&self, kind: SubmissionKind) -> AppResult<SubmissionOutcome> {
        let text = self.draft(kind).text;
        if text.trim().is_empty() {
            return Err(AppError::validation("请先输入内容"));
        }

        let response = self
            .gateway
            .send("/api/feedback", RequestOptions::post(json!({ "text": text })))
            .await?;

        if !response.is_ok() {
            // Draft stays populated for correction.
            return Err(status_error(
                response.status,
                response
                    .error_message()
                    .unwrap_or_else(|| "Submission failed".to_string()),
            ));
        }

        let decoded: SubmissionResponse = response.decode().unwrap_or_default();

        self.reset_draft(kind);

        let badge = decoded
            .ml_result
            .as_ref()
            .map(|result| ScoreBadge::from_label_and_score(&result.label, Some(result.score)));

        if let Some(result) = decoded.ml_result.as_ref() {
            info!(
                target: "app::submission",
                kind = %kind,
                label = %result.label,
                "submission annotated"
            );
        } else {
            info!(target: "app::submission", kind = %kind, "submission accepted");
        }

        let message = match kind {
            SubmissionKind::Feedback => "Feedback submitted successfully!",
            SubmissionKind::Lead => "Lead submitted successfully!",
        };

        Ok(SubmissionOutcome {
            message: decoded.message.unwrap_or_else(|| message.to_string()),
            badge,
        })
    }

    /// Ask the assist endpoint for a corrected rendition of the draft.
    /// The suggestion is stored next to the draft and is never applied
    /// automatically.
    pub async fn check_grammar(&self, kind: SubmissionKind) -> AppResult<GrammarSuggestion> {
        let text = self.draft(kind).text;
        if text.trim().is_empty() {
            return Err(AppError::validation("请先输入要检查的内容"));
        }

        let response = self
            .gateway
            .send(
                "/api/check-grammar",
                RequestOptions::post(json!({ "text": text })),
            )
            .await?;

        if !response.is_ok() {
            return Err(status_error(
                response.status,
                response
                    .error_message()
                    .unwrap_or_else(|| "Grammar check failed".to_string()),
            ));
        }

        let decoded: GrammarResponse = response.decode()?;
        if let Ok(mut guard) = self.drafts.write() {
            guard.entry(kind).or_default().suggestion = Some(decoded.corrected_text.clone());
        }

        debug!(target: "app::submission", kind = %kind, "grammar suggestion ready");

        Ok(GrammarSuggestion {
            original: text,
            corrected: decoded.corrected_text,
        })
    }

    /// Explicit apply: overwrite the draft with the stored suggestion
    /// and hide it.
    pub fn apply_suggestion(&self, kind: SubmissionKind) -> AppResult<DraftState> {
        let mut guard = self
            .drafts
            .write()
            .map_err(|_| AppError::other("草稿状态锁不可用"))?;

        let draft = guard.entry(kind).or_default();
        let Some(suggestion) = draft.suggestion.take() else {
            return Err(AppError::validation("没有可应用的修改建议"));
        };

        draft.text = suggestion;
        Ok(draft.clone())
    }

    /// One conversational round trip. The shared endpoint answers with
    /// a `reply` field when the assistant is configured.
    pub async fn ask_assistant(&self, message: &str) -> AppResult<AssistReply> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::validation("请先输入要发送的消息"));
        }

        let response = self
            .gateway
            .send(
                "/api/feedback",
                RequestOptions::post(json!({ "text": message })),
            )
            .await?;

        if !response.is_ok() {
            return Err(status_error(
                response.status,
                response
                    .error_message()
                    .unwrap_or_else(|| "AI is offline.".to_string()),
            ));
        }

        let decoded: SubmissionResponse = response.decode().unwrap_or_default();
        let reply = decoded.reply.ok_or_else(|| {
            AppError::api(ApiErrorCode::InvalidResponse, "助手响应缺少回复内容")
        })?;

        Ok(AssistReply { reply })
    }

    fn reset_draft(&self, kind: SubmissionKind) {
        if let Ok(mut guard) = self.drafts.write() {
            guard.insert(kind, DraftState::default());
        }
    }
}
