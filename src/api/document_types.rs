use reqwest::Method;

use super::models::DocumentType;
use super::DOCUMENT_TYPES_PATH;
use crate::error::AppResult;
use crate::http::AuthClient;

pub struct DocumentTypesApi<'a> {
    client: &'a AuthClient,
}

impl<'a> DocumentTypesApi<'a> {
    pub fn new(client: &'a AuthClient) -> Self { Self { client } }

    /// Public catalogue used by the registration form.
    pub async fn list(&self) -> AppResult<Vec<DocumentType>> {
        self.client.send_public::<()>(Method::GET, DOCUMENT_TYPES_PATH, None).await?.error_for_status()?.json()
    }
}
