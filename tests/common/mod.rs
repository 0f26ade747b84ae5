//! In-process mock of the ResetMental backend, served by axum on an ephemeral port.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

use async_trait::async_trait;
use resetmental::http::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport, TransportError};
use resetmental::{ApiClient, AuthClient, ClientConfig, RefreshMode, SessionStore, SessionUpdate};

pub const PASSWORD: &str = "Secreto123";
pub const REFRESH: &str = "refresh-1";
pub const CLIENT_EMAIL: &str = "ana@example.com";
pub const PSYCHOLOGIST_EMAIL: &str = "laura@example.com";

pub struct MockState {
    /// The only access token protected routes accept.
    pub access: Mutex<String>,
    pub refresh_ok: AtomicBool,
    pub refresh_calls: AtomicUsize,
    pub refresh_delay: Mutex<Duration>,
    pub protected_calls: AtomicUsize,
    pub citas: Mutex<Vec<Value>>,
    pub booked: Mutex<Vec<Value>>,
    pub pqrs: Mutex<Vec<Value>>,
    pub registered: Mutex<Vec<Value>>,
    /// Login replies carry tokens but no `user`.
    pub omit_user: AtomicBool,
    /// Booking replies are 201 with a plain-text body.
    pub plain_booking_reply: AtomicBool,
    token_seq: AtomicUsize,
}

impl MockState {
    fn new() -> Self {
        Self {
            access: Mutex::new("access-0".to_string()),
            refresh_ok: AtomicBool::new(true),
            refresh_calls: AtomicUsize::new(0),
            refresh_delay: Mutex::new(Duration::ZERO),
            protected_calls: AtomicUsize::new(0),
            citas: Mutex::new(Vec::new()),
            booked: Mutex::new(Vec::new()),
            pqrs: Mutex::new(Vec::new()),
            registered: Mutex::new(Vec::new()),
            omit_user: AtomicBool::new(false),
            plain_booking_reply: AtomicBool::new(false),
            token_seq: AtomicUsize::new(0),
        }
    }

    /// Invalidate the current access token, as if it expired server-side.
    pub fn expire_access(&self) {
        let n = self.token_seq.fetch_add(1, Ordering::SeqCst) + 1;
        *self.access.lock() = format!("expired-{}", n);
    }

    pub fn current_access(&self) -> String { self.access.lock().clone() }

    fn rotate_access(&self) -> String {
        let n = self.token_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let t = format!("access-{}", n);
        *self.access.lock() = t.clone();
        t
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", self.access.lock());
        headers.get("authorization").and_then(|v| v.to_str().ok()) == Some(expected.as_str())
    }
}

pub struct MockBackend {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::new());
        let app = Router::new()
            .route("/api/token/", post(login))
            .route("/api/token/refresh/", post(refresh))
            .route("/auth/register/", post(register))
            .route("/api/profile/", get(profile))
            .route("/psicologos/", get(psicologos))
            .route("/typedocuments/", get(typedocuments))
            .route("/citas/", get(list_citas).post(create_cita))
            .route("/pqrs/", post(create_pqrs))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind mock backend");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock backend");
        });
        Self { addr, state }
    }

    pub fn base_url(&self) -> String { format!("http://{}", self.addr) }

    pub fn config(&self, mode: RefreshMode) -> ClientConfig {
        let mut cfg = ClientConfig::new(&self.base_url()).expect("config");
        cfg.refresh_mode = mode;
        cfg.request_timeout = Duration::from_secs(5);
        cfg
    }

    pub fn auth_client(&self, mode: RefreshMode, session: SessionStore) -> AuthClient {
        let cfg = self.config(mode);
        let transport = ReqwestTransport::new(cfg.request_timeout).expect("transport");
        AuthClient::new(cfg, Arc::new(transport), session)
    }

    pub fn api(&self, session: SessionStore) -> ApiClient { ApiClient::new(self.auth_client(RefreshMode::Independent, session)) }
}

/// Transport replaying canned replies in order; records every request it was given.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<(u16, Value)>>,
    sent: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<(u16, Value)>) -> Arc<Self> {
        Arc::new(Self { replies: Mutex::new(replies.into()), sent: Mutex::new(Vec::new()) })
    }

    pub fn sent(&self) -> Vec<ApiRequest> { self.sent.lock().clone() }

    /// Client whose session already holds an expired access token and a refresh token.
    pub fn api(self: &Arc<Self>, user: Value) -> ApiClient {
        let session = SessionStore::in_memory();
        session.save(SessionUpdate { access: Some("OLD".into()), refresh: Some(REFRESH.into()), user: Some(user) });
        let transport: Arc<dyn HttpTransport> = self.clone();
        ApiClient::new(AuthClient::new(ClientConfig::default(), transport, session))
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.sent.lock().push(request);
        let next = self.replies.lock().pop_front();
        match next {
            Some((status, body)) => {
                let status = reqwest::StatusCode::from_u16(status).map_err(|e| TransportError::Other(e.to_string()))?;
                Ok(ApiResponse::new(status, serde_json::to_vec(&body).unwrap_or_default()))
            }
            None => Err(TransportError::Other("script exhausted".into())),
        }
    }
}

/// 401, then a successful refresh to `NEW`, then 401 again on the replay.
pub fn still_unauthorized_after_refresh() -> Vec<(u16, Value)> {
    vec![
        (401, json!({"detail": "Given token not valid for any token type"})),
        (200, json!({"access": "NEW"})),
        (401, json!({"detail": "Given token not valid for any token type"})),
    ]
}

fn user_for(username: &str) -> Value {
    if username == PSYCHOLOGIST_EMAIL {
        json!({"username": username, "email": username, "psicologos_id": 2, "rol": {"rol": "PSICOLOGO"}})
    } else {
        json!({"username": username, "email": username, "customer_id": 7, "rol": {"rol": "CLIENTE"}})
    }
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (StatusCode::UNAUTHORIZED, Json(json!({"detail": "Given token not valid for any token type", "code": "token_not_valid"})))
}

async fn login(State(st): State<Arc<MockState>>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let username = body["username"].as_str().unwrap_or_default().to_string();
    if body["password"].as_str() != Some(PASSWORD) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"detail": "No active account found with the given credentials"})));
    }
    let access = st.rotate_access();
    if st.omit_user.load(Ordering::SeqCst) {
        return (StatusCode::OK, Json(json!({"access": access, "refresh": REFRESH})));
    }
    (StatusCode::OK, Json(json!({"access": access, "refresh": REFRESH, "user": user_for(&username)})))
}

async fn refresh(State(st): State<Arc<MockState>>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    st.refresh_calls.fetch_add(1, Ordering::SeqCst);
    let delay = *st.refresh_delay.lock();
    if !delay.is_zero() { tokio::time::sleep(delay).await; }
    if !st.refresh_ok.load(Ordering::SeqCst) || body["refresh"].as_str() != Some(REFRESH) {
        return unauthorized();
    }
    (StatusCode::OK, Json(json!({"access": st.rotate_access()})))
}

async fn register(State(st): State<Arc<MockState>>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if st.registered.lock().iter().any(|r| r["email"] == body["email"]) {
        return (StatusCode::BAD_REQUEST, Json(json!({"email": ["Ya existe un usuario con este correo."]})));
    }
    st.registered.lock().push(body.clone());
    let user = json!({"username": email, "email": email, "customer_id": 99, "rol": {"rol": body["rol"].clone()}});
    (StatusCode::CREATED, Json(json!({"access": st.rotate_access(), "refresh": REFRESH, "user": user})))
}

async fn profile(State(st): State<Arc<MockState>>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    st.protected_calls.fetch_add(1, Ordering::SeqCst);
    if !st.authorized(&headers) { return unauthorized(); }
    (StatusCode::OK, Json(json!({"ok": true})))
}

async fn psicologos() -> Json<Value> {
    Json(json!([
        {"psicologos_id": 1, "psicologos_name": "Laura", "psicologos_lastname": "Pérez", "especialidad": "Ansiedad", "precio_cita": "45000.00", "modalidad": "virtual", "experiencia_anios": 6},
        {"psicologos_id": 2, "psicologos_name": "Mario", "psicologos_lastname": "Ruiz", "especialidad": "Terapia de pareja", "precio_cita": 120000, "modalidad": "presencial"},
        {"psicologos_id": 3, "psicologos_name": "", "precio_cita": null}
    ]))
}

async fn typedocuments() -> Json<Value> {
    Json(json!([
        {"typedocument_id": 1, "typedocument_name": "Cédula de ciudadanía"},
        {"typedocument_id": 2, "typedocument_name": "Pasaporte"}
    ]))
}

async fn list_citas(State(st): State<Arc<MockState>>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !st.authorized(&headers) { return unauthorized(); }
    (StatusCode::OK, Json(Value::Array(st.citas.lock().clone())))
}

async fn create_cita(State(st): State<Arc<MockState>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !st.authorized(&headers) { return unauthorized().into_response(); }
    if st.plain_booking_reply.load(Ordering::SeqCst) {
        st.booked.lock().push(body);
        return (StatusCode::CREATED, "cita creada").into_response();
    }
    let mut saved = body.clone();
    saved["cita_id"] = json!(st.booked.lock().len() + 100);
    saved["cita_estado"] = json!("PENDIENTE");
    st.booked.lock().push(body);
    (StatusCode::CREATED, Json(saved)).into_response()
}

async fn create_pqrs(State(st): State<Arc<MockState>>, headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if !st.authorized(&headers) { return unauthorized(); }
    st.pqrs.lock().push(body.clone());
    (StatusCode::CREATED, Json(json!({"pqrs_id": 1, "estado": "RADICADA"})))
}
