// Session-aware HTTP client for the marketplace API
// Expired sessions (401) are refreshed once, with concurrent callers sharing
// a single refresh call, and the original request is retried once.

use std::{
    mem,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::{
    config::ClientConfig,
    session::{handle_session_expired, SessionObserver, TracingObserver},
};

pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please login again.";

// Endpoints containing this never trigger a refresh
const AUTH_SEGMENT: &str = "/auth/";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Session expired. Please login again.")]
    SessionExpired,

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Decode error: {0}")]
    DecodeError(String),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initialization error: {0}")]
    InitError(String),
}

/// Response body: parsed JSON when possible, raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    fn from_text(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(text),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub ok: bool,
    pub status: u16,
    pub data: ResponseBody,
    pub headers: HeaderMap,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        match &self.data {
            ResponseBody::Json(value) => serde_json::from_value(value.clone())
                .map_err(|e| ApiError::DecodeError(e.to_string())),
            ResponseBody::Text(text) => Err(ApiError::DecodeError(format!(
                "expected JSON body, got {} bytes of text",
                text.len()
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    // JSON-encodes the payload into the body; `None` leaves the body untouched
    pub fn with_json(mut self, data: Option<&Value>) -> Result<Self, ApiError> {
        if let Some(data) = data {
            let body = serde_json::to_string(data)
                .map_err(|e| ApiError::SerializationError(e.to_string()))?;
            self.body = Some(body);
        }
        Ok(self)
    }
}

#[derive(Debug, Default)]
pub struct ClientStats {
    pub requests_sent: AtomicUsize,
    pub refreshes_started: AtomicUsize,
    pub refreshes_failed: AtomicUsize,
    pub requests_retried: AtomicUsize,
}

#[async_trait]
pub trait ApiClient: Send + Sync + 'static {
    // Issue `options.method` against `endpoint`; HTTP error statuses are
    // returned as responses, not errors
    async fn request(&self, endpoint: &str, options: RequestOptions)
        -> Result<ApiResponse, ApiError>;

    async fn get(&self, endpoint: &str, options: RequestOptions) -> Result<ApiResponse, ApiError> {
        self.request(endpoint, options.with_method(Method::GET)).await
    }

    async fn post(
        &self,
        endpoint: &str,
        data: Option<Value>,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        let options = options.with_method(Method::POST).with_json(data.as_ref())?;
        self.request(endpoint, options).await
    }

    async fn put(
        &self,
        endpoint: &str,
        data: Option<Value>,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        let options = options.with_method(Method::PUT).with_json(data.as_ref())?;
        self.request(endpoint, options).await
    }

    async fn delete(&self, endpoint: &str, options: RequestOptions) -> Result<ApiResponse, ApiError> {
        self.request(endpoint, options.with_method(Method::DELETE)).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshOutcome {
    Refreshed,
    Failed,
}

#[derive(Debug, Default)]
struct RefreshState {
    is_refreshing: bool,
    subscribers: Vec<oneshot::Sender<RefreshOutcome>>,
}

// Held by the caller that performs the refresh. If that caller is dropped
// mid-flight, the queue is dropped too and waiters see a closed channel.
struct RefreshGuard<'a> {
    state: &'a Mutex<RefreshState>,
    settled: bool,
}

impl RefreshGuard<'_> {
    fn drain(&mut self) -> Vec<oneshot::Sender<RefreshOutcome>> {
        self.settled = true;
        let mut state = self.state.lock();
        state.is_refreshing = false;
        mem::take(&mut state.subscribers)
    }

    fn settle(mut self, outcome: RefreshOutcome) {
        for subscriber in self.drain() {
            let _ = subscriber.send(outcome);
        }
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.drain();
        }
    }
}

pub struct SessionClient {
    http: reqwest::Client,
    config: ClientConfig,
    stats: ClientStats,
    refresh: Mutex<RefreshState>,
    observer: Arc<dyn SessionObserver>,
}

impl SessionClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Self::with_observer(config, Arc::new(TracingObserver))
    }

    pub fn with_observer(
        config: ClientConfig,
        observer: Arc<dyn SessionObserver>,
    ) -> Result<Self, ClientError> {
        config.validate()?;

        // Cookie store keeps the session cookie set by login/refresh
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Ok(Self {
            http,
            config,
            stats: ClientStats::default(),
            refresh: Mutex::new(RefreshState::default()),
            observer,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn stats(&self) -> &ClientStats {
        &self.stats
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh.lock().is_refreshing
    }

    pub fn pending_subscribers(&self) -> usize {
        self.refresh.lock().subscribers.len()
    }

    async fn send(&self, url: &str, options: &RequestOptions) -> Result<ApiResponse, ApiError> {
        self.stats.requests_sent.fetch_add(1, Ordering::SeqCst);

        let mut headers = options.headers.clone();
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        let mut builder = self
            .http
            .request(options.method.clone(), url)
            .headers(headers);
        if let Some(body) = &options.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        Ok(ApiResponse {
            ok: status.is_success(),
            status: status.as_u16(),
            data: ResponseBody::from_text(text),
            headers,
        })
    }

    async fn refresh_session(&self) -> RefreshOutcome {
        let waiter = {
            let mut state = self.refresh.lock();
            if state.is_refreshing {
                let (tx, rx) = oneshot::channel();
                state.subscribers.push(tx);
                Some(rx)
            } else {
                state.is_refreshing = true;
                None
            }
        };

        if let Some(rx) = waiter {
            debug!("joining in-flight session refresh");
            return rx.await.unwrap_or(RefreshOutcome::Failed);
        }

        let guard = RefreshGuard {
            state: &self.refresh,
            settled: false,
        };
        self.stats.refreshes_started.fetch_add(1, Ordering::SeqCst);
        info!(endpoint = %self.config.refresh_endpoint, "refreshing session");

        let url = self.config.endpoint_url(&self.config.refresh_endpoint);
        let outcome = match self.http.post(url).send().await {
            Ok(response) if response.status().is_success() => RefreshOutcome::Refreshed,
            Ok(response) => {
                warn!(status = %response.status(), "session refresh rejected");
                RefreshOutcome::Failed
            }
            Err(e) => {
                warn!(error = %e, "session refresh failed");
                RefreshOutcome::Failed
            }
        };

        guard.settle(outcome);

        if outcome == RefreshOutcome::Failed {
            self.stats.refreshes_failed.fetch_add(1, Ordering::SeqCst);
            handle_session_expired(
                &self.observer,
                &self.config.login_path,
                self.config.redirect_delay(),
                SESSION_EXPIRED_MESSAGE,
            );
        }

        outcome
    }
}

#[async_trait]
impl ApiClient for SessionClient {
    async fn request(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.config.endpoint_url(endpoint);
        let response = self.send(&url, &options).await?;

        if response.status != StatusCode::UNAUTHORIZED.as_u16() || endpoint.contains(AUTH_SEGMENT) {
            return Ok(response);
        }

        match self.refresh_session().await {
            RefreshOutcome::Refreshed => {
                self.stats.requests_retried.fetch_add(1, Ordering::SeqCst);
                debug!(%endpoint, "retrying after session refresh");
                // A second 401 is returned as-is
                self.send(&url, &options).await
            }
            RefreshOutcome::Failed => Err(ApiError::SessionExpired),
        }
    }
}
