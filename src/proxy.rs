// Backend proxy: forwards a request to the upstream `/api/v1` service and
// relays its response unchanged.

use bytes::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderName, ACCEPT, AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE},
    Method,
};
use tracing::debug;

use crate::{
    api_client::{ApiError, ClientError},
    config::ClientConfig,
};

const BACKEND_PREFIX: &str = "/api/v1";

// End-to-end headers passed upstream; everything else stays at the edge
static FORWARDED_REQUEST_HEADERS: [HeaderName; 4] = [CONTENT_TYPE, ACCEPT, COOKIE, AUTHORIZATION];
static RELAYED_RESPONSE_HEADERS: [HeaderName; 2] = [CONTENT_TYPE, SET_COOKIE];

#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl ProxyRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Normalizes `path` to live under `/api/v1`.
///
/// `"bookings"`, `"/bookings"` and `"/api/v1/bookings"` all map to
/// `"/api/v1/bookings"`.
pub fn backend_path(path: &str) -> String {
    let trimmed = path.trim_start_matches('/');
    let prefix = BACKEND_PREFIX.trim_start_matches('/');

    match trimmed.strip_prefix(prefix) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => {
            format!("{BACKEND_PREFIX}{rest}")
        }
        _ => format!("{BACKEND_PREFIX}/{trimmed}"),
    }
}

pub struct BackendProxy {
    http: reqwest::Client,
    backend_url: String,
}

impl BackendProxy {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Ok(Self {
            http,
            backend_url: config.backend_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, path: &str, query: Option<&str>) -> String {
        let mut url = format!("{}{}", self.backend_url, backend_path(path));
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query.trim_start_matches('?'));
        }
        url
    }

    pub async fn forward(&self, request: ProxyRequest) -> Result<ProxyResponse, ApiError> {
        let url = self.url(&request.path, request.query.as_deref());
        debug!(method = %request.method, %url, "forwarding to backend");

        let mut headers = HeaderMap::new();
        for name in &FORWARDED_REQUEST_HEADERS {
            for value in request.headers.get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }

        let mut builder = self.http.request(request.method, url).headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        let status = response.status().as_u16();
        let mut relayed = HeaderMap::new();
        for name in &RELAYED_RESPONSE_HEADERS {
            for value in response.headers().get_all(name) {
                relayed.append(name.clone(), value.clone());
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::NetworkError(e.to_string()))?;

        Ok(ProxyResponse {
            status,
            headers: relayed,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn proxy_for(server: &MockServer) -> BackendProxy {
        let config = ClientConfig {
            backend_url: format!("{}/", server.uri()),
            ..Default::default()
        };
        BackendProxy::new(&config).unwrap()
    }

    #[test]
    fn test_backend_path() {
        assert_eq!(backend_path("bookings"), "/api/v1/bookings");
        assert_eq!(backend_path("/bookings/7/cancel"), "/api/v1/bookings/7/cancel");
        assert_eq!(backend_path("/api/v1/bookings"), "/api/v1/bookings");
        assert_eq!(backend_path("api/v1"), "/api/v1");
        assert_eq!(backend_path("/api/v10/x"), "/api/v1/api/v10/x");
    }

    #[tokio::test]
    async fn test_forward_relays_status_body_and_cookies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/bookings/7/cancel"))
            .and(query_param("reason", "schedule"))
            .and(header("cookie", "session=abc"))
            .and(body_json(json!({"note": "moving"})))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(json!({"message": "cannot cancel completed booking"}))
                    .insert_header("set-cookie", "session=abc2; Path=/")
                    .insert_header("x-internal-trace", "t-1"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let proxy = proxy_for(&server);
        let mut request = ProxyRequest::new(Method::POST, "/bookings/7/cancel");
        request.query = Some("?reason=schedule".to_string());
        request
            .headers
            .insert(COOKIE, HeaderValue::from_static("session=abc"));
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        request
            .headers
            .insert("x-forwarded-host", HeaderValue::from_static("app.local"));
        request.body = Some(Bytes::from_static(br#"{"note":"moving"}"#));

        let response = proxy.forward(request).await.unwrap();

        assert_eq!(response.status, 422);
        assert_eq!(
            response.headers.get(SET_COOKIE).unwrap(),
            "session=abc2; Path=/"
        );
        assert!(response.headers.get("x-internal-trace").is_none());

        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["message"], "cannot cancel completed booking");
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let config = ClientConfig {
            backend_url: "http://127.0.0.1:1".to_string(),
            timeout_ms: 2_000,
            ..Default::default()
        };
        let proxy = BackendProxy::new(&config).unwrap();

        let result = proxy.forward(ProxyRequest::new(Method::GET, "services")).await;
        assert!(matches!(result, Err(ApiError::NetworkError(_))));
    }
}
