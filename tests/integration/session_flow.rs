use std::sync::Arc;

use httpmock::prelude::*;
use salespulse_app_lib::db::DbPool;
use salespulse_app_lib::error::{ApiErrorCode, AppResult, ENTRY_REDIRECT};
use salespulse_app_lib::models::identity::{AuthSession, Role, UserIdentity};
use salespulse_app_lib::services::api_gateway::ApiGateway;
use salespulse_app_lib::services::auth_service::AuthService;
use salespulse_app_lib::services::credential_store::{CredentialStore, PersistencePolicy};
use salespulse_app_lib::services::session_guard::{GuardDecision, SessionGuard};
use salespulse_app_lib::services::settings_service::{SettingsService, SettingsUpdateInput};
use serde_json::json;
use tempfile::TempDir;

struct SessionHarness {
    auth: AuthService,
    guard: SessionGuard,
    credentials: Arc<CredentialStore>,
    _temp_dir: TempDir,
}

fn setup_harness(base_url: &str) -> AppResult<SessionHarness> {
    let temp_dir = TempDir::new()?;
    let db = DbPool::new(temp_dir.path().join("test.db"))?;

    let settings = Arc::new(SettingsService::new(db.clone())?);
    settings.update(SettingsUpdateInput {
        api_base_url: Some(base_url.to_string()),
        ..Default::default()
    })?;

    let credentials = Arc::new(CredentialStore::new(db));
    let gateway = Arc::new(ApiGateway::new(
        Arc::clone(&credentials),
        Arc::clone(&settings),
    )?);
    let auth = AuthService::new(Arc::clone(&gateway), Arc::clone(&credentials));
    let guard = SessionGuard::new(Arc::clone(&credentials));

    Ok(SessionHarness {
        auth,
        guard,
        credentials,
        _temp_dir: temp_dir,
    })
}

#[tokio::test]
async fn login_stores_identity_and_routes_to_the_role_home() -> AppResult<()> {
    let server = MockServer::start_async().await;
    let harness = setup_harness(&server.base_url())?;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/login").json_body(json!({
                "role": "manager",
                "username": "m1",
                "password": "p"
            }));
            then.status(200).json_body(json!({
                "token": "T",
                "user": { "username": "m1", "role": "manager" }
            }));
        })
        .await;

    let outcome = harness.auth.login(Role::Manager, "m1", "p").await?;

    assert_eq!(outcome.home_view, "/manager");
    assert_eq!(outcome.identity.username, "m1");

    let session = harness.credentials.load()?.expect("session stored");
    assert_eq!(session.token, "T");
    assert_eq!(session.user.role, Role::Manager);

    // The freshly stored identity passes the manager gate.
    match harness.guard.authorize(Role::Manager)? {
        GuardDecision::Grant { identity } => assert_eq!(identity.username, "m1"),
        GuardDecision::Redirect { .. } => panic!("expected grant after login"),
    }

    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn rejected_login_stores_nothing() -> AppResult<()> {
    let server = MockServer::start_async().await;
    let harness = setup_harness(&server.base_url())?;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/login");
            then.status(401)
                .json_body(json!({ "error": "Invalid credentials" }));
        })
        .await;

    let error = harness
        .auth
        .login(Role::Manager, "m1", "wrong")
        .await
        .expect_err("login must fail");

    assert_eq!(error.api_code(), Some(ApiErrorCode::InvalidCredentials));
    assert!(error.to_string().contains("Invalid credentials"));
    assert!(harness.credentials.load()?.is_none());

    Ok(())
}

#[tokio::test]
async fn blank_credentials_never_reach_the_network() -> AppResult<()> {
    let server = MockServer::start_async().await;
    let harness = setup_harness(&server.base_url())?;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/login");
            then.status(200).json_body(json!({}));
        })
        .await;

    assert!(harness.auth.login(Role::Manager, "  ", "p").await.is_err());
    assert!(harness.auth.login(Role::Manager, "m1", " ").await.is_err());

    assert_eq!(mock.hits_async().await, 0);
    Ok(())
}

#[tokio::test]
async fn public_registration_rejects_the_dev_role_locally() -> AppResult<()> {
    let server = MockServer::start_async().await;
    let harness = setup_harness(&server.base_url())?;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/register");
            then.status(201).json_body(json!({ "message": "ok" }));
        })
        .await;

    let error = harness
        .auth
        .register(Role::Dev, "eve", "p")
        .await
        .expect_err("dev registration must be rejected");

    assert!(error.to_string().contains("salesperson"));
    assert_eq!(mock.hits_async().await, 0);

    Ok(())
}

#[tokio::test]
async fn registration_routes_back_to_the_entry_view() -> AppResult<()> {
    let server = MockServer::start_async().await;
    let harness = setup_harness(&server.base_url())?;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/register").json_body(json!({
                "role": "salesperson",
                "username": "s2",
                "password": "p"
            }));
            then.status(201)
                .json_body(json!({ "message": "Registration successful! Please login." }));
        })
        .await;

    let outcome = harness.auth.register(Role::Salesperson, "s2", "p").await?;

    assert_eq!(outcome.next_view, ENTRY_REDIRECT);
    assert!(outcome.message.contains("Registration successful"));
    // Registration issues no token.
    assert!(harness.credentials.load()?.is_none());

    Ok(())
}

#[tokio::test]
async fn duplicate_registration_surfaces_the_server_error() -> AppResult<()> {
    let server = MockServer::start_async().await;
    let harness = setup_harness(&server.base_url())?;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/register");
            then.status(400)
                .json_body(json!({ "error": "Username already exists" }));
        })
        .await;

    let error = harness
        .auth
        .register(Role::Salesperson, "s1", "p")
        .await
        .expect_err("duplicate registration must fail");

    assert!(error.to_string().contains("Username already exists"));
    Ok(())
}

#[tokio::test]
async fn logout_clears_both_scopes_and_routes_to_entry() -> AppResult<()> {
    let server = MockServer::start_async().await;
    let harness = setup_harness(&server.base_url())?;

    harness.credentials.save(
        &AuthSession {
            token: "T".to_string(),
            user: UserIdentity {
                username: "m1".to_string(),
                role: Role::Manager,
            },
        },
        PersistencePolicy::Durable,
    )?;
    harness.credentials.save(
        &AuthSession {
            token: "T2".to_string(),
            user: UserIdentity {
                username: "m1".to_string(),
                role: Role::Manager,
            },
        },
        PersistencePolicy::Ephemeral,
    )?;

    let target = harness.auth.logout()?;

    assert_eq!(target, ENTRY_REDIRECT);
    assert!(harness.credentials.load()?.is_none());

    // The guard now redirects instead of granting.
    match harness.guard.authorize(Role::Manager)? {
        GuardDecision::Redirect { target } => assert_eq!(target, ENTRY_REDIRECT),
        GuardDecision::Grant { .. } => panic!("expected redirect after logout"),
    }

    Ok(())
}
