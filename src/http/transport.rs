use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{AppError, AppResult, GENERIC_SERVER_MESSAGE};

/// Failure to obtain any HTTP response.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Other(String),
}

impl TransportError {
    pub fn code(&self) -> &'static str {
        match self {
            TransportError::Connect(_) => "connect",
            TransportError::Timeout => "timeout",
            TransportError::Other(_) => "transport",
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() { TransportError::Timeout }
        else if e.is_connect() { TransportError::Connect(e.to_string()) }
        else { TransportError::Other(e.to_string()) }
    }
}

/// A fully-described request. Cloneable so it can be replayed after a token refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, headers: HeaderMap::new(), body: None }
    }

    pub fn get(url: Url) -> Self { Self::new(Method::GET, url) }
    pub fn post(url: Url) -> Self { Self::new(Method::POST, url) }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> AppResult<Self> {
        let bytes = serde_json::to_vec(body).map_err(|e| AppError::internal("encode", format!("cannot encode request body: {}", e)))?;
        self.body = Some(bytes);
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: Vec<u8>) -> Self {
        Self { status, headers: HeaderMap::new(), body }
    }

    pub fn is_success(&self) -> bool { self.status.is_success() }

    pub fn text(&self) -> String { String::from_utf8_lossy(&self.body).into_owned() }

    pub fn json_value(&self) -> Option<Value> { serde_json::from_slice(&self.body).ok() }

    pub fn json<T: DeserializeOwned>(&self) -> AppResult<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| AppError::server(self.status.as_u16(), format!("{}: respuesta inesperada ({})", GENERIC_SERVER_MESSAGE, e)))
    }

    /// Message from a conventional error field (`detail`, `error`, `message`). A JSON body
    /// without one of those is echoed compactly; a non-JSON body yields the generic message.
    pub fn error_message(&self) -> String {
        match self.json_value() {
            Some(Value::Object(map)) => {
                for key in ["detail", "error", "message"] {
                    if let Some(Value::String(s)) = map.get(key) {
                        if !s.is_empty() { return s.clone(); }
                    }
                }
                if map.is_empty() { GENERIC_SERVER_MESSAGE.to_string() } else { Value::Object(map).to_string() }
            }
            Some(Value::String(s)) if !s.is_empty() => s,
            Some(Value::Array(items)) if !items.is_empty() => Value::Array(items).to_string(),
            _ => GENERIC_SERVER_MESSAGE.to_string(),
        }
    }

    /// Turn a non-2xx response into `AppError::Server`.
    pub fn error_for_status(self) -> AppResult<Self> {
        if self.is_success() { return Ok(self); }
        Err(AppError::server(self.status.as_u16(), self.error_message()))
    }
}

/// The seam between request logic and the network.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Production transport over a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::config("http_client", format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self { Self { client } }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let ApiRequest { method, url, headers, body } = request;
        debug!(target: "resetmental::http", "{} {}", method, url);
        let mut rb = self.client.request(method, url).headers(headers);
        if let Some(b) = body { rb = rb.body(b); }
        let resp = rb.send().await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?.to_vec();
        debug!(target: "resetmental::http", "status={} bytes={}", status, body.len());
        Ok(ApiResponse { status, headers, body })
    }
}
