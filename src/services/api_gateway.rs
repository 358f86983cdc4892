use std::sync::{Arc, RwLock};
use std::time::Instant;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ApiErrorCode, AppError, AppResult, ENTRY_REDIRECT};
use crate::services::credential_store::CredentialStore;
use crate::services::settings_service::SettingsService;
use crate::utils::redact::redact_sensitive_data;

/// Options for one outbound call. Caller-supplied headers are merged in
/// first; `Content-Type` and `Authorization` are always installed after
/// them and can never be overridden.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<JsonValue>,
    pub headers: Vec<(String, String)>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: Vec::new(),
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: JsonValue) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            headers: Vec::new(),
        }
    }

    pub fn delete() -> Self {
        Self {
            method: Method::DELETE,
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Status plus the decoded JSON body (or `Null` when the body is not
/// JSON). Non-401 statuses are handed back unmodified for caller-side
/// interpretation; the gateway never retries or follows up.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: JsonValue,
}

impl GatewayResponse {
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn decode<T: DeserializeOwned>(&self) -> AppResult<T> {
        serde_json::from_value(self.body.clone()).map_err(|err| {
            AppError::api_with_details(
                ApiErrorCode::InvalidResponse,
                format!("解析服务器响应失败: {err}"),
                Some(self.status),
                None,
                None,
            )
        })
    }

    /// The server's `{error}` body field, when present.
    pub fn error_message(&self) -> Option<String> {
        self.body
            .get("error")
            .and_then(|value| value.as_str())
            .map(|value| value.to_string())
    }
}

/// Single outbound wrapper every network-touching component goes
/// through. Reads the credential store fresh on every call (never a
/// token captured at construction time) and on a 401 clears the store
/// and records the entry redirect before any caller can decode a body.
pub struct ApiGateway {
    http: reqwest::Client,
    credentials: Arc<CredentialStore>,
    settings: Arc<SettingsService>,
    pending_redirect: RwLock<Option<String>>,
}

impl ApiGateway {
    pub fn new(
        credentials: Arc<CredentialStore>,
        settings: Arc<SettingsService>,
    ) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.http_timeout()?)
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(Some(std::time::Duration::from_secs(90)))
            .build()
            .map_err(|err| AppError::other(format!("初始化 HTTP 客户端失败: {err}")))?;

        Ok(Self {
            http,
            credentials,
            settings,
            pending_redirect: RwLock::new(None),
        })
    }

    /// Authenticated call. A 401 response invalidates the session
    /// globally; every other status is returned unmodified.
    pub async fn send(&self, path: &str, options: RequestOptions) -> AppResult<GatewayResponse> {
        let response = self.dispatch(path, &options, true).await?;
        self.intercept_unauthorized(&response)?;
        Self::read_json(response).await
    }

    /// Unauthenticated call for the public endpoints (login, register).
    /// No bearer header is injected and a 401 here is a caller-visible
    /// credential failure, not a session invalidation.
    pub async fn send_unauthenticated(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> AppResult<GatewayResponse> {
        let response = self.dispatch(path, &options, false).await?;
        Self::read_json(response).await
    }

    /// Authenticated call returning the raw body bytes (the CSV report
    /// blob). Same 401 interception as `send`.
    pub async fn fetch_bytes(&self, path: &str) -> AppResult<(u16, Vec<u8>)> {
        let response = self.dispatch(path, &RequestOptions::get(), true).await?;
        self.intercept_unauthorized(&response)?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| {
                AppError::api_with_details(
                    ApiErrorCode::InvalidResponse,
                    format!("读取服务器响应失败: {err}"),
                    Some(status),
                    None,
                    None,
                )
            })?
            .to_vec();

        Ok((status, bytes))
    }

    /// Redirect recorded by the last 401 interception, if any. The view
    /// layer drains this when painting the navigation.
    pub fn take_redirect(&self) -> Option<String> {
        self.pending_redirect
            .write()
            .ok()
            .and_then(|mut guard| guard.take())
    }

    pub fn redirect_target(&self) -> Option<String> {
        self.pending_redirect
            .read()
            .ok()
            .and_then(|guard| guard.clone())
    }

    async fn dispatch(
        &self,
        path: &str,
        options: &RequestOptions,
        authenticated: bool,
    ) -> AppResult<reqwest::Response> {
        let correlation_id = Uuid::new_v4().to_string();
        let base_url = self.settings.api_base_url()?;
        let url = format!("{}{}", base_url.trim_end_matches('/'), path);

        let mut headers = HeaderMap::new();
        for (name, value) in &options.headers {
            let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
                warn!(target: "app::gateway", header = %name, "dropping malformed caller header");
                continue;
            };
            let Ok(header_value) = HeaderValue::from_str(value) else {
                warn!(target: "app::gateway", header = %name, "dropping malformed caller header value");
                continue;
            };
            headers.insert(header_name, header_value);
        }

        // Installed after the caller's headers so they always win.
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if authenticated {
            // Fresh read on every call: a logout in another view must be
            // observed here within one poll interval.
            match self.credentials.token()? {
                Some(token) => {
                    let bearer = format!("Bearer {token}");
                    let value = HeaderValue::from_str(&bearer).map_err(|_| {
                        AppError::api(ApiErrorCode::InvalidRequest, "凭据令牌包含非法字符")
                    })?;
                    headers.insert(AUTHORIZATION, value);
                }
                None => {
                    debug!(
                        target: "app::gateway",
                        correlation_id = %correlation_id,
                        "no stored token, dispatching without Authorization"
                    );
                }
            }
        }

        if let Some(body) = options.body.as_ref() {
            let sanitized = redact_sensitive_data(body)
                .unwrap_or_else(|_| JsonValue::String("<redacted>".to_string()));
            debug!(
                target: "app::gateway",
                method = %options.method,
                path,
                correlation_id = %correlation_id,
                payload = %sanitized,
                "dispatching request"
            );
        } else {
            debug!(
                target: "app::gateway",
                method = %options.method,
                path,
                correlation_id = %correlation_id,
                "dispatching request"
            );
        }

        let mut request = self
            .http
            .request(options.method.clone(), &url)
            .headers(headers);
        if let Some(body) = options.body.as_ref() {
            request = request.json(body);
        }

        let start = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|err| Self::transport_error(err, &correlation_id))?;

        debug!(
            target: "app::gateway",
            correlation_id = %correlation_id,
            status = response.status().as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            "server responded"
        );

        Ok(response)
    }

    /// The 401 invalidation path: clear both credential scopes, record
    /// the redirect, and fail the call so no caller decodes a body from
    /// an invalidated session. Callers must not retry after this.
    fn intercept_unauthorized(&self, response: &reqwest::Response) -> AppResult<()> {
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(());
        }

        if let Err(err) = self.credentials.clear() {
            warn!(
                target: "app::gateway",
                error = %err,
                "failed to clear credential scopes during invalidation"
            );
        }

        if let Ok(mut guard) = self.pending_redirect.write() {
            *guard = Some(ENTRY_REDIRECT.to_string());
        }

        Err(AppError::auth_expired())
    }

    async fn read_json(response: reqwest::Response) -> AppResult<GatewayResponse> {
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(|err| {
            AppError::api_with_details(
                ApiErrorCode::InvalidResponse,
                format!("读取服务器响应失败: {err}"),
                Some(status),
                None,
                None,
            )
        })?;

        // A non-JSON body is not an error at this layer; callers
        // interpret the status and shape themselves.
        let body = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);

        Ok(GatewayResponse { status, body })
    }

    fn transport_error(err: reqwest::Error, correlation_id: &str) -> AppError {
        if err.is_timeout() {
            AppError::api_with_details(
                ApiErrorCode::HttpTimeout,
                "请求超时",
                None,
                Some(correlation_id),
                None,
            )
        } else if err.is_connect() {
            AppError::api_with_details(
                ApiErrorCode::Unreachable,
                "无法连接到服务器",
                None,
                Some(correlation_id),
                None,
            )
        } else {
            AppError::api_with_details(
                ApiErrorCode::Unknown,
                format!("请求失败: {err}"),
                None,
                Some(correlation_id),
                None,
            )
        }
    }
}

/// Map a non-OK, non-401 status onto the error taxonomy. Used by the
/// panels when they need to surface a single caller-visible failure.
pub fn status_error(status: u16, message: impl Into<String>) -> AppError {
    let code = match status {
        403 => ApiErrorCode::Forbidden,
        400 => ApiErrorCode::InvalidRequest,
        404 => ApiErrorCode::InvalidRequest,
        500..=599 => ApiErrorCode::ServerUnavailable,
        _ => ApiErrorCode::Unknown,
    };
    AppError::api_with_details(code, message, Some(status), None, None)
}
