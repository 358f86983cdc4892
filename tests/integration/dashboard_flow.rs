use std::sync::Arc;

use httpmock::prelude::*;
use salespulse_app_lib::db::DbPool;
use salespulse_app_lib::error::{AppResult, ENTRY_REDIRECT};
use salespulse_app_lib::models::dashboard::ChartSurface;
use salespulse_app_lib::models::identity::{AuthSession, Role, UserIdentity};
use salespulse_app_lib::services::api_gateway::ApiGateway;
use salespulse_app_lib::services::credential_store::{CredentialStore, PersistencePolicy};
use salespulse_app_lib::services::dashboard_service::DashboardService;
use salespulse_app_lib::services::settings_service::{SettingsService, SettingsUpdateInput};
use serde_json::json;
use tempfile::TempDir;

struct DashboardHarness {
    dashboard: Arc<DashboardService>,
    gateway: Arc<ApiGateway>,
    credentials: Arc<CredentialStore>,
    _temp_dir: TempDir,
}

fn setup_harness(base_url: &str) -> AppResult<DashboardHarness> {
    let temp_dir = TempDir::new()?;
    let db = DbPool::new(temp_dir.path().join("test.db"))?;

    let settings = Arc::new(SettingsService::new(db.clone())?);
    settings.update(SettingsUpdateInput {
        api_base_url: Some(base_url.to_string()),
        dashboard_poll_secs: Some(5),
        ..Default::default()
    })?;

    let credentials = Arc::new(CredentialStore::new(db.clone()));
    credentials.save(
        &AuthSession {
            token: "T".to_string(),
            user: UserIdentity {
                username: "m1".to_string(),
                role: Role::Manager,
            },
        },
        PersistencePolicy::Durable,
    )?;

    let gateway = Arc::new(ApiGateway::new(
        Arc::clone(&credentials),
        Arc::clone(&settings),
    )?);
    let dashboard = Arc::new(DashboardService::new(
        Arc::clone(&gateway),
        Arc::clone(&settings),
        db.path(),
    )?);

    Ok(DashboardHarness {
        dashboard,
        gateway,
        credentials,
        _temp_dir: temp_dir,
    })
}

fn full_snapshot_body() -> serde_json::Value {
    json!({
        "stats": {
            "total": 10,
            "week": 2,
            "active_sales": 3,
            "leads": { "high": 1, "medium": 2, "low": 7 }
        },
        "trends": { "labels": ["01/01"], "data": [2] },
        "sentiment": { "positive": 5, "neutral": 3, "negative": 2 },
        "wordcloud_data": [["great", 5]],
        "recent": []
    })
}

#[tokio::test]
async fn refresh_fans_the_snapshot_out_to_every_renderer() -> AppResult<()> {
    let server = MockServer::start_async().await;
    let harness = setup_harness(&server.base_url())?;

    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/dashboard")
                .header("authorization", "Bearer T");
            then.status(200).json_body(full_snapshot_body());
        })
        .await;

    let render = harness
        .dashboard
        .refresh()
        .await?
        .expect("refresh must produce a render");

    assert_eq!(render.stats.total, "10");
    assert_eq!(render.stats.week, "2");
    assert_eq!(render.stats.active_sales, "3");
    assert_eq!(render.lead_quality.series, vec![1.0, 2.0, 7.0]);
    assert_eq!(render.trend.labels, vec!["01/01"]);
    assert_eq!(render.sentiment.series, vec![5.0, 3.0, 2.0]);
    assert_eq!(render.word_cloud.labels, vec!["great"]);
    assert!(render.recent.is_empty());

    // All four chart surfaces hold a live binding.
    for surface in [
        ChartSurface::LeadQuality,
        ChartSurface::Trend,
        ChartSurface::Sentiment,
        ChartSurface::WordCloud,
    ] {
        assert!(harness.dashboard.live_binding(surface).is_some());
    }

    Ok(())
}

#[tokio::test]
async fn non_ok_refresh_keeps_the_previous_render() -> AppResult<()> {
    let server = MockServer::start_async().await;
    let harness = setup_harness(&server.base_url())?;

    let good = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/dashboard");
            then.status(200).json_body(full_snapshot_body());
        })
        .await;

    harness.dashboard.refresh().await?.expect("initial render");
    good.delete_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/dashboard");
            then.status(503).json_body(json!({ "error": "maintenance" }));
        })
        .await;

    // Heartbeat semantics: a failed tick is not an error and does not
    // blank the view.
    let result = harness.dashboard.refresh().await?;
    assert!(result.is_none());

    let render = harness.dashboard.current_render().expect("previous render kept");
    assert_eq!(render.stats.total, "10");
    assert_eq!(render.lead_quality.series, vec![1.0, 2.0, 7.0]);

    Ok(())
}

#[tokio::test]
async fn malformed_payload_keeps_the_previous_render() -> AppResult<()> {
    let server = MockServer::start_async().await;
    let harness = setup_harness(&server.base_url())?;

    let good = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/dashboard");
            then.status(200).json_body(full_snapshot_body());
        })
        .await;

    harness.dashboard.refresh().await?.expect("initial render");
    good.delete_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/dashboard");
            then.status(200).json_body(json!(["not", "a", "snapshot"]));
        })
        .await;

    let result = harness.dashboard.refresh().await?;
    assert!(result.is_none());
    assert_eq!(
        harness
            .dashboard
            .current_render()
            .expect("previous render kept")
            .stats
            .total,
        "10"
    );

    Ok(())
}

#[tokio::test]
async fn missing_sentiment_degrades_only_that_surface() -> AppResult<()> {
    let server = MockServer::start_async().await;
    let harness = setup_harness(&server.base_url())?;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/dashboard");
            then.status(200).json_body(json!({
                "stats": {
                    "total": 4,
                    "week": 1,
                    "active_sales": 2,
                    "leads": { "high": 1, "medium": 1, "low": 2 }
                },
                "trends": { "labels": ["01/01", "01/02"], "data": [1, 3] },
                "wordcloud_data": [["demo", 3]],
                "recent": [{
                    "salesperson": "sales",
                    "text": "Loved the demo.",
                    "timestamp": "2025-01-01T00:00:00Z",
                    "lead_label": "High",
                    "lead_score": 0.91
                }]
            }));
        })
        .await;

    let render = harness
        .dashboard
        .refresh()
        .await?
        .expect("partial snapshot still renders");

    // Sentiment degrades to its zero state; the rest render normally.
    assert_eq!(render.sentiment.series, vec![0.0, 0.0, 0.0]);
    assert_eq!(render.lead_quality.series, vec![1.0, 1.0, 2.0]);
    assert_eq!(render.trend.series, vec![1.0, 3.0]);
    assert_eq!(render.word_cloud.labels, vec!["demo"]);
    assert_eq!(render.recent.len(), 1);
    let badge = render.recent[0].badge.as_ref().expect("lead badge");
    assert_eq!(badge.label, "High");
    assert_eq!(badge.score_display.as_deref(), Some("91.0"));

    Ok(())
}

#[tokio::test]
async fn stale_tick_after_logout_resolves_through_the_401_path() -> AppResult<()> {
    let server = MockServer::start_async().await;
    let harness = setup_harness(&server.base_url())?;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/dashboard");
            then.status(401).json_body(json!({ "error": "Invalid token" }));
        })
        .await;

    let error = harness
        .dashboard
        .refresh()
        .await
        .expect_err("401 invalidates the session");

    assert!(error.is_auth_expired());
    assert!(harness.credentials.load()?.is_none());
    assert_eq!(
        harness.gateway.redirect_target().as_deref(),
        Some(ENTRY_REDIRECT)
    );

    Ok(())
}

#[tokio::test]
async fn polling_is_owned_by_the_view_and_cancellable() -> AppResult<()> {
    let server = MockServer::start_async().await;
    let harness = setup_harness(&server.base_url())?;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/dashboard");
            then.status(200).json_body(full_snapshot_body());
        })
        .await;

    harness.dashboard.start_polling()?;
    assert!(harness.dashboard.is_polling());

    // Restarting replaces the prior task instead of stacking a second.
    harness.dashboard.start_polling()?;
    assert!(harness.dashboard.is_polling());

    harness.dashboard.stop_polling();
    assert!(!harness.dashboard.is_polling());

    Ok(())
}

#[tokio::test]
async fn report_download_writes_the_dated_csv() -> AppResult<()> {
    let server = MockServer::start_async().await;
    let harness = setup_harness(&server.base_url())?;

    let csv_bytes = "ID,Salesperson,Feedback\n1,sales,Loved the demo\n";
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/download-report")
                .header("authorization", "Bearer T");
            then.status(200)
                .header("content-type", "text/csv")
                .body(csv_bytes);
        })
        .await;

    let download = harness.dashboard.download_report().await?;

    assert!(download.file_name.starts_with("sales_report_"));
    assert!(download.file_name.ends_with(".csv"));
    assert_eq!(download.bytes_written, csv_bytes.len());

    // The blob is opaque: stored byte-for-byte.
    let stored = std::fs::read_to_string(&download.path)?;
    assert_eq!(stored, csv_bytes);

    Ok(())
}

#[tokio::test]
async fn failed_report_download_surfaces_an_error() -> AppResult<()> {
    let server = MockServer::start_async().await;
    let harness = setup_harness(&server.base_url())?;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/download-report");
            then.status(500).json_body(json!({ "error": "export failed" }));
        })
        .await;

    assert!(harness.dashboard.download_report().await.is_err());
    Ok(())
}
