use reqwest::Method;
use tracing::info;

use super::models::{LoginRequest, RegisterRequest, TokenReply};
use super::REGISTER_PATH;
use crate::error::{AppError, AppResult};
use crate::http::{AuthClient, TOKEN_PATH};
use crate::session::{SessionUpdate, CUSTOMER_TAG, PROVIDER_TAG};
use crate::validation::{digits_only, validate_login, RegistrationForm, USER_TYPE_PSYCHOLOGIST};

pub struct AuthApi<'a> {
    client: &'a AuthClient,
}

impl<'a> AuthApi<'a> {
    pub fn new(client: &'a AuthClient) -> Self { Self { client } }

    /// Obtain a token pair and store it together with the returned profile.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<TokenReply> {
        let username = username.trim();
        validate_login(username, password)?;
        let body = LoginRequest { username, password };
        let reply: TokenReply = self
            .client
            .send_public(Method::POST, TOKEN_PATH, Some(&body))
            .await?
            .error_for_status()?
            .json()?;
        if reply.access.as_deref().unwrap_or("").is_empty() {
            return Err(AppError::server(200, "La respuesta de inicio de sesión no incluye un token"));
        }
        self.store(&reply);
        info!(target: "resetmental::api", "logged in as {}", username);
        Ok(reply)
    }

    pub async fn register(&self, form: &RegistrationForm) -> AppResult<TokenReply> {
        form.validate()?;
        let rol = if form.user_type == USER_TYPE_PSYCHOLOGIST { PROVIDER_TAG } else { CUSTOMER_TAG };
        let email = form.email.trim();
        let body = RegisterRequest {
            username: email,
            email,
            password: &form.password,
            first_name: form.first_name.trim(),
            last_name: form.last_name.trim(),
            typedocument: form.document_type.trim(),
            document_number: form.document_number.trim(),
            phone: form.phone.as_deref().map(digits_only).filter(|p| !p.is_empty()),
            rol,
            registration_reason: form.registration_reason.as_deref().map(str::trim).filter(|r| !r.is_empty()),
        };
        let reply: TokenReply = self
            .client
            .send_public(Method::POST, REGISTER_PATH, Some(&body))
            .await?
            .error_for_status()?
            .json()?;
        self.store(&reply);
        info!(target: "resetmental::api", "registered {} as {}", email, rol);
        Ok(reply)
    }

    pub fn logout(&self) {
        self.client.session().clear();
        info!(target: "resetmental::api", "logged out");
    }

    /// A fresh login replaces the previous session outright.
    fn store(&self, reply: &TokenReply) {
        let session = self.client.session();
        session.clear();
        session.save(SessionUpdate {
            access: reply.access.clone(),
            refresh: reply.refresh.clone(),
            user: reply.user.clone(),
        });
    }
}
