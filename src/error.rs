//! Unified client error model.
//! Every network-facing operation reports one of these to its caller; page-level callers
//! (CLI, UI shells) decide how to present them. The session store itself never produces one.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const SESSION_EXPIRED_MESSAGE: &str = "Tu sesión expiró. Por favor, inicia sesión nuevamente.";
pub const GENERIC_SERVER_MESSAGE: &str = "Error del servidor";
pub const GENERIC_NETWORK_MESSAGE: &str = "No se pudo conectar con el servidor";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    /// Local form validation failure; `code` names the offending field.
    Validation { code: String, message: String },
    /// A 401 survived the single refresh attempt; the session has been cleared.
    SessionExpired { code: String, message: String },
    /// Operation needs a logged-in session and there is none.
    Unauthenticated { code: String, message: String },
    /// Logged in, but the role/profile does not allow the operation.
    Forbidden { code: String, message: String },
    /// No response at all (connect, timeout, TLS, body read).
    Transport { code: String, message: String },
    /// Non-2xx response from the backend.
    Server { status: u16, code: String, message: String },
    Config { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::Validation { code, .. }
            | AppError::SessionExpired { code, .. }
            | AppError::Unauthenticated { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::Transport { code, .. }
            | AppError::Server { code, .. }
            | AppError::Config { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Validation { message, .. }
            | AppError::SessionExpired { message, .. }
            | AppError::Unauthenticated { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::Transport { message, .. }
            | AppError::Server { message, .. }
            | AppError::Config { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn validation<C: Into<String>, M: Into<String>>(field: C, msg: M) -> Self { AppError::Validation { code: field.into(), message: msg.into() } }
    pub fn unauthenticated<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::Unauthenticated { code: code.into(), message: msg.into() } }
    pub fn forbidden<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::Forbidden { code: code.into(), message: msg.into() } }
    pub fn transport<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::Transport { code: code.into(), message: msg.into() } }
    pub fn server<M: Into<String>>(status: u16, msg: M) -> Self { AppError::Server { status, code: "server_error".into(), message: msg.into() } }
    pub fn config<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::Config { code: code.into(), message: msg.into() } }
    pub fn internal<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    pub fn session_expired() -> Self {
        AppError::SessionExpired { code: "session_expired".into(), message: SESSION_EXPIRED_MESSAGE.into() }
    }

    pub fn is_session_expired(&self) -> bool { matches!(self, AppError::SessionExpired { .. }) }

    /// HTTP status associated with the error, when one exists.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            AppError::Server { status, .. } => Some(*status),
            AppError::SessionExpired { .. } | AppError::Unauthenticated { .. } => Some(401),
            AppError::Forbidden { .. } => Some(403),
            _ => None,
        }
    }

    /// Text suitable for an end-user notification.
    /// Transport failures collapse to one generic message; everything else carries its own.
    pub fn user_message(&self) -> &str {
        match self {
            AppError::Transport { .. } => GENERIC_NETWORK_MESSAGE,
            other => other.message(),
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Server { status, message, .. } => write!(f, "server_error({}): {}", status, message),
            other => write!(f, "{}: {}", other.code_str(), other.message()),
        }
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<crate::http::TransportError> for AppError {
    fn from(err: crate::http::TransportError) -> Self {
        AppError::Transport { code: err.code().into(), message: err.to_string() }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal { code: "internal_error".into(), message: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert_eq!(AppError::server(500u16, "boom").http_status(), Some(500));
        assert_eq!(AppError::session_expired().http_status(), Some(401));
        assert_eq!(AppError::unauthenticated("login_required", "no").http_status(), Some(401));
        assert_eq!(AppError::forbidden("role", "no").http_status(), Some(403));
        assert_eq!(AppError::validation("email", "bad").http_status(), None);
        assert_eq!(AppError::transport("connect", "refused").http_status(), None);
    }

    #[test]
    fn user_message_hides_transport_details() {
        let e = AppError::transport("connect", "tcp connect error: 127.0.0.1:1");
        assert_eq!(e.user_message(), GENERIC_NETWORK_MESSAGE);
        let e = AppError::server(400u16, "Usuario ya existe");
        assert_eq!(e.user_message(), "Usuario ya existe");
        assert_eq!(AppError::session_expired().user_message(), SESSION_EXPIRED_MESSAGE);
    }

    #[test]
    fn serializes_with_type_tag() {
        let v = serde_json::to_value(AppError::validation("email", "Formato de correo electrónico inválido")).unwrap();
        assert_eq!(v["type"], "validation");
        assert_eq!(v["code"], "email");
        assert!(AppError::session_expired().is_session_expired());
        assert_eq!(format!("{}", AppError::server(404u16, "not found")), "server_error(404): not found");
    }
}
