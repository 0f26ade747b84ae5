use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};
use crate::config::{ClientConfig, RefreshMode};
use crate::error::{AppError, AppResult};
use crate::session::{SessionStore, SessionUpdate};

pub const TOKEN_PATH: &str = "/api/token/";
pub const TOKEN_REFRESH_PATH: &str = "/api/token/refresh/";

/// Result of one refresh attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new access token was issued and stored.
    Refreshed(String),
    /// No refresh token stored; nothing was sent.
    NoRefreshAvailable,
    /// The refresh endpoint failed or refused; the session was left as is.
    RefreshRejected,
}

impl RefreshOutcome {
    pub fn token(&self) -> Option<&str> {
        match self {
            RefreshOutcome::Refreshed(t) => Some(t.as_str()),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct RefreshBody<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshReply {
    #[serde(default)]
    access: Option<String>,
}

type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

struct InflightRefresh {
    id: u64,
    fut: SharedRefresh,
}

/// Issues requests on behalf of the current session: attaches the bearer token,
/// and on a 401 performs exactly one refresh-and-retry before giving up.
#[derive(Clone)]
pub struct AuthClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn HttpTransport>,
    session: SessionStore,
    inflight: Arc<Mutex<Option<InflightRefresh>>>,
    next_refresh_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("api_base_url", &self.config.api_base_url.as_str())
            .field("refresh_mode", &self.config.refresh_mode)
            .finish()
    }
}

impl AuthClient {
    pub fn new(config: ClientConfig, transport: Arc<dyn HttpTransport>, session: SessionStore) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            session,
            inflight: Arc::new(Mutex::new(None)),
            next_refresh_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Client over the real network, with the configured request timeout.
    pub fn from_config(config: ClientConfig, session: SessionStore) -> AppResult<Self> {
        let transport = ReqwestTransport::new(config.request_timeout)?;
        Ok(Self::new(config, Arc::new(transport), session))
    }

    pub fn config(&self) -> &ClientConfig { &self.config }
    pub fn session(&self) -> &SessionStore { &self.session }

    /// JSON content type, then caller overrides, then the bearer token if one is stored.
    pub fn auth_headers(&self, extra: &HeaderMap) -> HeaderMap {
        let mut headers = json_headers();
        headers.extend(extra.clone());
        if let Some(token) = self.session.access_token() {
            match bearer(&token) {
                Some(v) => { headers.insert(AUTHORIZATION, v); }
                None => warn!(target: "resetmental::http", "stored access token is not a valid header value; sending without it"),
            }
        }
        headers
    }

    /// Exchange the stored refresh token for a new access token.
    pub async fn refresh_token(&self) -> RefreshOutcome {
        match self.config.refresh_mode {
            RefreshMode::Independent => {
                run_refresh(self.transport.clone(), self.config.clone(), self.session.clone()).await
            }
            RefreshMode::SingleFlight => self.refresh_single_flight().await,
        }
    }

    async fn refresh_single_flight(&self) -> RefreshOutcome {
        let (id, fut) = {
            let mut slot = self.inflight.lock();
            match slot.as_ref() {
                Some(f) => {
                    debug!(target: "resetmental::http", "joining in-flight refresh #{}", f.id);
                    (f.id, f.fut.clone())
                }
                None => {
                    let id = self.next_refresh_id.fetch_add(1, Ordering::Relaxed);
                    let fut = run_refresh(self.transport.clone(), self.config.clone(), self.session.clone())
                        .boxed()
                        .shared();
                    *slot = Some(InflightRefresh { id, fut: fut.clone() });
                    (id, fut)
                }
            }
        };
        let outcome = fut.await;
        let mut slot = self.inflight.lock();
        if slot.as_ref().map(|f| f.id) == Some(id) {
            *slot = None;
        }
        outcome
    }

    /// Send `request` as given. A 401 triggers one refresh; on success the request is
    /// replayed once with the new token and that response is returned whatever its status.
    /// If no refresh is possible the session is cleared and `SessionExpired` is returned.
    pub async fn fetch_with_auth(&self, request: ApiRequest) -> AppResult<ApiResponse> {
        let replay = request.clone();
        let response = self.transport.send(request).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!(target: "resetmental::http", "401 from {} {}, attempting refresh", replay.method, replay.url);
        match self.refresh_token().await {
            RefreshOutcome::Refreshed(token) => {
                let Some(value) = bearer(&token) else {
                    self.session.clear();
                    return Err(AppError::session_expired());
                };
                let mut retry = replay;
                retry.headers.insert(AUTHORIZATION, value);
                let response = self.transport.send(retry).await?;
                debug!(target: "resetmental::http", "retry status={}", response.status);
                Ok(response)
            }
            outcome => {
                info!(target: "resetmental::http", "refresh unavailable ({:?}); clearing session", outcome);
                self.session.clear();
                Err(AppError::session_expired())
            }
        }
    }

    /// Authorized request against an API path.
    pub async fn send_json<B: Serialize + ?Sized>(&self, method: Method, path: &str, body: Option<&B>) -> AppResult<ApiResponse> {
        let mut req = ApiRequest::new(method, self.config.endpoint(path)?).with_headers(self.auth_headers(&HeaderMap::new()));
        if let Some(b) = body { req = req.with_json(b)?; }
        self.fetch_with_auth(req).await
    }

    /// Unauthenticated request: no bearer token and no refresh on 401.
    pub async fn send_public<B: Serialize + ?Sized>(&self, method: Method, path: &str, body: Option<&B>) -> AppResult<ApiResponse> {
        let mut req = ApiRequest::new(method, self.config.endpoint(path)?).with_headers(json_headers());
        if let Some(b) = body { req = req.with_json(b)?; }
        Ok(self.transport.send(req).await?)
    }

    /// A 401 that outlived the refresh ends the session; other non-2xx become `Server` errors.
    pub fn check_response(&self, response: ApiResponse) -> AppResult<ApiResponse> {
        if response.status == StatusCode::UNAUTHORIZED {
            info!(target: "resetmental::http", "401 after refresh; clearing session");
            self.session.clear();
            return Err(AppError::session_expired());
        }
        response.error_for_status()
    }

    /// `send_json` followed by `check_response`.
    pub async fn send_checked<B: Serialize + ?Sized>(&self, method: Method, path: &str, body: Option<&B>) -> AppResult<ApiResponse> {
        let response = self.send_json(method, path, body).await?;
        self.check_response(response)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        self.send_checked::<()>(Method::GET, path, None).await?.json()
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> AppResult<T> {
        self.send_checked(Method::POST, path, Some(body)).await?.json()
    }
}

fn json_headers() -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    h
}

fn bearer(token: &str) -> Option<HeaderValue> {
    let mut v = HeaderValue::from_str(&format!("Bearer {}", token)).ok()?;
    v.set_sensitive(true);
    Some(v)
}

async fn run_refresh(transport: Arc<dyn HttpTransport>, config: Arc<ClientConfig>, session: SessionStore) -> RefreshOutcome {
    let Some(refresh) = session.refresh_token() else {
        debug!(target: "resetmental::http", "no refresh token stored");
        return RefreshOutcome::NoRefreshAvailable;
    };
    let req = match config
        .endpoint(TOKEN_REFRESH_PATH)
        .and_then(|url| ApiRequest::post(url).with_headers(json_headers()).with_json(&RefreshBody { refresh: &refresh }))
    {
        Ok(r) => r,
        Err(e) => {
            warn!(target: "resetmental::http", "cannot build refresh request: {}", e);
            return RefreshOutcome::RefreshRejected;
        }
    };
    let response = match transport.send(req).await {
        Ok(r) => r,
        Err(e) => {
            warn!(target: "resetmental::http", "token refresh failed: {}", e);
            return RefreshOutcome::RefreshRejected;
        }
    };
    if !response.is_success() {
        warn!(target: "resetmental::http", "token refresh rejected: status={}", response.status);
        return RefreshOutcome::RefreshRejected;
    }
    match response.json::<RefreshReply>() {
        Ok(RefreshReply { access: Some(access) }) if !access.is_empty() => {
            session.save(SessionUpdate::access(access.clone()));
            info!(target: "resetmental::http", "access token refreshed");
            RefreshOutcome::Refreshed(access)
        }
        _ => {
            warn!(target: "resetmental::http", "token refresh reply carried no access token");
            RefreshOutcome::RefreshRejected
        }
    }
}
