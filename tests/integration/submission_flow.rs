use std::sync::Arc;

use httpmock::prelude::*;
use salespulse_app_lib::db::DbPool;
use salespulse_app_lib::error::AppResult;
use salespulse_app_lib::models::identity::{AuthSession, Role, UserIdentity};
use salespulse_app_lib::models::submission::{BadgeTier, SubmissionKind};
use salespulse_app_lib::services::api_gateway::ApiGateway;
use salespulse_app_lib::services::credential_store::{CredentialStore, PersistencePolicy};
use salespulse_app_lib::services::settings_service::{SettingsService, SettingsUpdateInput};
use salespulse_app_lib::services::submission_service::SubmissionService;
use serde_json::json;
use tempfile::TempDir;

fn setup_service(base_url: &str) -> AppResult<(SubmissionService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db = DbPool::new(temp_dir.path().join("test.db"))?;

    let settings = Arc::new(SettingsService::new(db.clone())?);
    settings.update(SettingsUpdateInput {
        api_base_url: Some(base_url.to_string()),
        ..Default::default()
    })?;

    let credentials = Arc::new(CredentialStore::new(db));
    credentials.save(
        &AuthSession {
            token: "T".to_string(),
            user: UserIdentity {
                username: "sales".to_string(),
                role: Role::Salesperson,
            },
        },
        PersistencePolicy::Durable,
    )?;

    let gateway = Arc::new(ApiGateway::new(credentials, Arc::clone(&settings))?);
    Ok((SubmissionService::new(gateway), temp_dir))
}

#[tokio::test]
async fn blank_drafts_never_reach_the_network() -> AppResult<()> {
    let server = MockServer::start_async().await;
    let (service, _temp_dir) = setup_service(&server.base_url())?;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/feedback");
            then.status(201).json_body(json!({}));
        })
        .await;

    assert!(service.submit(SubmissionKind::Feedback).await.is_err());

    service.update_draft(SubmissionKind::Lead, "   \n".to_string());
    assert!(service.submit(SubmissionKind::Lead).await.is_err());

    assert_eq!(mock.hits_async().await, 0);
    Ok(())
}

#[tokio::test]
async fn annotated_submission_clears_the_draft_and_renders_the_badge() -> AppResult<()> {
    let server = MockServer::start_async().await;
    let (service, _temp_dir) = setup_service(&server.base_url())?;

    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/feedback")
                .header("authorization", "Bearer T")
                .json_body(json!({ "text": "ok" }));
            then.status(201).json_body(json!({
                "message": "Lead submitted",
                "ml_result": { "label": "High", "score": 0.91 }
            }));
        })
        .await;

    service.update_draft(SubmissionKind::Lead, "ok".to_string());
    let outcome = service.submit(SubmissionKind::Lead).await?;

    let badge = outcome.badge.expect("annotated response carries a badge");
    assert_eq!(badge.label, "High");
    assert_eq!(badge.tier, BadgeTier::Strong);
    // The rendered badge text carries the label and the percentage.
    assert!(badge.score_display.as_deref().unwrap_or_default().contains("91"));

    // Input cleared on success.
    assert!(service.draft(SubmissionKind::Lead).text.is_empty());

    Ok(())
}

#[tokio::test]
async fn unannotated_submission_succeeds_without_a_badge() -> AppResult<()> {
    let server = MockServer::start_async().await;
    let (service, _temp_dir) = setup_service(&server.base_url())?;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/feedback");
            then.status(201).json_body(json!({ "message": "Feedback submitted" }));
        })
        .await;

    service.update_draft(SubmissionKind::Feedback, "The update is great".to_string());
    let outcome = service.submit(SubmissionKind::Feedback).await?;

    assert!(outcome.badge.is_none());
    assert!(outcome.message.contains("submitted"));

    Ok(())
}

#[tokio::test]
async fn failed_submission_keeps_the_draft_for_correction() -> AppResult<()> {
    let server = MockServer::start_async().await;
    let (service, _temp_dir) = setup_service(&server.base_url())?;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/feedback");
            then.status(400).json_body(json!({ "error": "Submission failed" }));
        })
        .await;

    service.update_draft(SubmissionKind::Feedback, "needs work".to_string());
    let error = service
        .submit(SubmissionKind::Feedback)
        .await
        .expect_err("submission must fail");

    assert!(error.to_string().contains("Submission failed"));
    assert_eq!(service.draft(SubmissionKind::Feedback).text, "needs work");

    Ok(())
}

#[tokio::test]
async fn grammar_suggestion_is_applied_only_explicitly() -> AppResult<()> {
    let server = MockServer::start_async().await;
    let (service, _temp_dir) = setup_service(&server.base_url())?;

    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/check-grammar")
                .json_body(json!({ "text": "i dont know" }));
            then.status(200).json_body(json!({ "corrected_text": "I don't know" }));
        })
        .await;

    service.update_draft(SubmissionKind::Feedback, "i dont know".to_string());
    let suggestion = service.check_grammar(SubmissionKind::Feedback).await?;

    assert_eq!(suggestion.original, "i dont know");
    assert_eq!(suggestion.corrected, "I don't know");

    // The suggestion is stored next to the draft but never auto-applied.
    let draft = service.draft(SubmissionKind::Feedback);
    assert_eq!(draft.text, "i dont know");
    assert_eq!(draft.suggestion.as_deref(), Some("I don't know"));

    // Explicit apply overwrites the draft and hides the suggestion.
    let applied = service.apply_suggestion(SubmissionKind::Feedback)?;
    assert_eq!(applied.text, "I don't know");
    assert!(applied.suggestion.is_none());

    // A second apply has nothing to work with.
    assert!(service.apply_suggestion(SubmissionKind::Feedback).is_err());

    Ok(())
}

#[tokio::test]
async fn drafts_are_tracked_per_kind() -> AppResult<()> {
    let server = MockServer::start_async().await;
    let (service, _temp_dir) = setup_service(&server.base_url())?;

    service.update_draft(SubmissionKind::Feedback, "feedback text".to_string());
    service.update_draft(SubmissionKind::Lead, "lead text".to_string());

    assert_eq!(service.draft(SubmissionKind::Feedback).text, "feedback text");
    assert_eq!(service.draft(SubmissionKind::Lead).text, "lead text");

    Ok(())
}

#[tokio::test]
async fn assistant_round_trip_returns_the_reply() -> AppResult<()> {
    let server = MockServer::start_async().await;
    let (service, _temp_dir) = setup_service(&server.base_url())?;

    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/feedback")
                .json_body(json!({ "text": "How do I close this deal?" }));
            then.status(200)
                .json_body(json!({ "reply": "**Focus** on the budget holder." }));
        })
        .await;

    let reply = service.ask_assistant("How do I close this deal?").await?;
    assert_eq!(reply.reply, "**Focus** on the budget holder.");

    Ok(())
}

#[tokio::test]
async fn offline_assistant_surfaces_a_single_error() -> AppResult<()> {
    let server = MockServer::start_async().await;
    let (service, _temp_dir) = setup_service(&server.base_url())?;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/feedback");
            then.status(503).json_body(json!({ "error": "Chatbot not configured" }));
        })
        .await;

    let error = service
        .ask_assistant("hello")
        .await
        .expect_err("offline assistant must fail");
    assert!(error.to_string().contains("Chatbot not configured"));

    Ok(())
}
