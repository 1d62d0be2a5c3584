use payloads::{APIClient, AccidentId, ListQuery, Page, RecordId};

use super::{many, one, page_of};
use crate::error::{AdminError, ErrorMessages, FORBIDDEN_MESSAGE};
use crate::models::{
    Accident, AccidentForm, AccidentStatistics, Severity, parse_id,
};

pub const MESSAGES: ErrorMessages = ErrorMessages {
    not_found: "Accidente no encontrado",
    conflict: "El accidente ya fue registrado",
    forbidden: FORBIDDEN_MESSAGE,
};

#[derive(Clone)]
pub struct AccidentsService {
    client: APIClient,
}

impl AccidentsService {
    pub fn new(client: APIClient) -> Self {
        Self { client }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(
        &self,
        query: &ListQuery,
    ) -> Result<Page<Accident>, AdminError> {
        page_of(self.client.list_accidents(query).await, &MESSAGES)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Accident, AdminError> {
        let id: AccidentId = parse_id("Accidente", id)?;
        one(self.client.get_accident(id).await, &MESSAGES)
    }

    #[tracing::instrument(skip_all, fields(record_id = %form.record_id))]
    pub async fn create(
        &self,
        form: &AccidentForm,
    ) -> Result<Accident, AdminError> {
        let details = form.to_create()?;
        let accident: Accident =
            one(self.client.create_accident(&details).await, &MESSAGES)?;
        tracing::info!(
            id = %accident.id,
            severidad = %accident.severidad,
            "Reported accident"
        );
        Ok(accident)
    }

    #[tracing::instrument(skip_all, fields(id = %original.id))]
    pub async fn update(
        &self,
        original: &Accident,
        form: &AccidentForm,
    ) -> Result<Accident, AdminError> {
        let id: AccidentId = parse_id("Accidente", &original.id)?;
        let details = form.to_update(original)?;
        one(self.client.update_accident(id, &details).await, &MESSAGES)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), AdminError> {
        let id: AccidentId = parse_id("Accidente", id)?;
        self.client
            .delete_accident(id)
            .await
            .map_err(|e| MESSAGES.map(e))
    }

    #[tracing::instrument(skip(self))]
    pub async fn statistics(&self) -> Result<AccidentStatistics, AdminError> {
        one(self.client.accident_statistics().await, &MESSAGES)
    }

    #[tracing::instrument(skip(self))]
    pub async fn by_record(
        &self,
        record_id: &str,
    ) -> Result<Vec<Accident>, AdminError> {
        let record_id: RecordId = parse_id("Línea de vida", record_id)?;
        many(self.client.accidents_by_record(record_id).await, &MESSAGES)
    }

    #[tracing::instrument(skip(self))]
    pub async fn by_severity(
        &self,
        severity: &Severity,
    ) -> Result<Vec<Accident>, AdminError> {
        let severity = severity.to_backend();
        many(self.client.accidents_by_severity(&severity).await, &MESSAGES)
    }

    /// Spreadsheet bytes for the rows matching `query`.
    #[tracing::instrument(skip(self))]
    pub async fn export(
        &self,
        query: &ListQuery,
    ) -> Result<Vec<u8>, AdminError> {
        self.client
            .export_accidents(query)
            .await
            .map_err(|e| MESSAGES.map(e))
    }
}
