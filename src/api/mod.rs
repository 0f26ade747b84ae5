//! Typed operations against the ResetMental backend. Each service borrows the shared
//! [`AuthClient`] so every call goes through the same session and refresh path.

mod appointments;
mod auth;
mod document_types;
pub mod models;
mod pqrs;
mod psychologists;

pub use appointments::{sort_by_start, AppointmentsApi, PENDING_STATUS};
pub use auth::AuthApi;
pub use document_types::DocumentTypesApi;
pub use models::{AppointmentRecord, DocumentType, ProviderRecord, TokenReply};
pub use pqrs::PqrsApi;
pub use psychologists::PsychologistsApi;

use crate::config::ClientConfig;
use crate::error::{AppError, AppResult};
use crate::http::AuthClient;
use crate::session::{Session, SessionStore};

pub const REGISTER_PATH: &str = "/auth/register/";
pub const PSYCHOLOGISTS_PATH: &str = "/psicologos/";
pub const DOCUMENT_TYPES_PATH: &str = "/typedocuments/";
pub const APPOINTMENTS_PATH: &str = "/citas/";
pub const PQRS_PATH: &str = "/pqrs/";

/// Entry point bundling the executor with the per-resource services.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: AuthClient,
}

impl ApiClient {
    pub fn new(http: AuthClient) -> Self { Self { http } }

    pub fn from_config(config: ClientConfig, session: SessionStore) -> AppResult<Self> {
        Ok(Self::new(AuthClient::from_config(config, session)?))
    }

    pub fn http(&self) -> &AuthClient { &self.http }
    pub fn session(&self) -> &SessionStore { self.http.session() }

    pub fn auth(&self) -> AuthApi<'_> { AuthApi::new(&self.http) }
    pub fn psychologists(&self) -> PsychologistsApi<'_> { PsychologistsApi::new(&self.http) }
    pub fn document_types(&self) -> DocumentTypesApi<'_> { DocumentTypesApi::new(&self.http) }
    pub fn appointments(&self) -> AppointmentsApi<'_> { AppointmentsApi::new(&self.http) }
    pub fn pqrs(&self) -> PqrsApi<'_> { PqrsApi::new(&self.http) }
}

/// Session with an access token and a `customer_id`, as booking and PQRS need.
pub(crate) fn require_customer(session: &Session, action: &str) -> AppResult<i64> {
    if session.access_token.is_none() {
        return Err(AppError::unauthenticated("login_required", format!("Debes iniciar sesión para {}", action)));
    }
    session
        .user
        .as_ref()
        .and_then(|u| u.customer_id())
        .ok_or_else(|| AppError::forbidden("customer_required", format!("Solo los clientes pueden {}", action)))
}
