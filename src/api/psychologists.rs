use reqwest::Method;
use tracing::debug;

use super::models::ProviderRecord;
use super::PSYCHOLOGISTS_PATH;
use crate::directory::{Directory, Psychologist};
use crate::error::AppResult;
use crate::http::AuthClient;

pub struct PsychologistsApi<'a> {
    client: &'a AuthClient,
}

impl<'a> PsychologistsApi<'a> {
    pub fn new(client: &'a AuthClient) -> Self { Self { client } }

    /// Public listing, mapped to directory cards.
    pub async fn list(&self) -> AppResult<Vec<Psychologist>> {
        let records: Vec<ProviderRecord> = self
            .client
            .send_public::<()>(Method::GET, PSYCHOLOGISTS_PATH, None)
            .await?
            .error_for_status()?
            .json()?;
        debug!(target: "resetmental::api", "fetched {} psychologists", records.len());
        Ok(records
            .into_iter()
            .enumerate()
            .map(|(i, r)| r.into_entry(i as i64 + 1))
            .collect())
    }

    pub async fn directory(&self) -> AppResult<Directory> { Ok(Directory::new(self.list().await?)) }
}
