use payloads::{APIClient, ListQuery, Page, RecordId};

use super::{one, page_of};
use crate::error::{AdminError, ErrorMessages, FORBIDDEN_MESSAGE};
use crate::models::{Record, RecordForm, parse_id};

pub const MESSAGES: ErrorMessages = ErrorMessages {
    not_found: "Línea de vida no encontrada",
    conflict: "Ya existe una línea de vida con ese código",
    forbidden: FORBIDDEN_MESSAGE,
};

/// Líneas de vida.
#[derive(Clone)]
pub struct RecordsService {
    client: APIClient,
}

impl RecordsService {
    pub fn new(client: APIClient) -> Self {
        Self { client }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(
        &self,
        query: &ListQuery,
    ) -> Result<Page<Record>, AdminError> {
        page_of(self.client.list_records(query).await, &MESSAGES)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Record, AdminError> {
        let id: RecordId = parse_id("Línea de vida", id)?;
        one(self.client.get_record(id).await, &MESSAGES)
    }

    #[tracing::instrument(skip(self, form))]
    pub async fn create(
        &self,
        form: &RecordForm,
    ) -> Result<Record, AdminError> {
        let details = form.to_create()?;
        let record: Record =
            one(self.client.create_record(&details).await, &MESSAGES)?;
        tracing::info!(codigo = %record.codigo, "Created línea de vida");
        Ok(record)
    }

    /// Sends only the fields that changed from `original`.
    #[tracing::instrument(skip_all, fields(id = %original.id))]
    pub async fn update(
        &self,
        original: &Record,
        form: &RecordForm,
    ) -> Result<Record, AdminError> {
        let id: RecordId = parse_id("Línea de vida", &original.id)?;
        let details = form.to_update(original)?;
        one(self.client.update_record(id, &details).await, &MESSAGES)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), AdminError> {
        let id: RecordId = parse_id("Línea de vida", id)?;
        self.client
            .delete_record(id)
            .await
            .map_err(|e| MESSAGES.map(e))?;
        tracing::info!("Deleted línea de vida");
        Ok(())
    }
}
