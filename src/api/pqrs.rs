use reqwest::Method;
use serde_json::Value;
use tracing::info;

use super::models::PqrsRequest;
use super::{require_customer, PQRS_PATH};
use crate::error::AppResult;
use crate::http::AuthClient;
use crate::validation::PqrsForm;

pub struct PqrsApi<'a> {
    client: &'a AuthClient,
}

impl<'a> PqrsApi<'a> {
    pub fn new(client: &'a AuthClient) -> Self { Self { client } }

    /// File a petition, complaint, claim or suggestion for the logged-in customer.
    pub async fn submit(&self, form: &PqrsForm) -> AppResult<Value> {
        let customer = require_customer(&self.client.session().get(), "enviar una PQRS")?;
        let kind = form.validate()?;
        let body = PqrsRequest {
            customer,
            pqrs_tipo: kind.as_str(),
            asunto: form.subject.trim(),
            descripcion: form.description.trim(),
        };
        let resp = self.client.send_checked(Method::POST, PQRS_PATH, Some(&body)).await?;
        info!(target: "resetmental::api", "pqrs '{}' submitted by customer {}", kind.as_str(), customer);
        Ok(resp.json_value().unwrap_or(Value::Null))
    }
}
