use payloads::{APIClient, ListQuery, MaintenanceId, Page};

use super::{one, page_of};
use crate::error::{AdminError, ErrorMessages, FORBIDDEN_MESSAGE};
use crate::models::{Maintenance, MaintenanceForm, parse_id};

pub const MESSAGES: ErrorMessages = ErrorMessages {
    not_found: "Mantenimiento no encontrado",
    conflict: "El mantenimiento ya fue registrado",
    forbidden: FORBIDDEN_MESSAGE,
};

#[derive(Clone)]
pub struct MaintenanceService {
    client: APIClient,
}

impl MaintenanceService {
    pub fn new(client: APIClient) -> Self {
        Self { client }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(
        &self,
        query: &ListQuery,
    ) -> Result<Page<Maintenance>, AdminError> {
        page_of(self.client.list_maintenance(query).await, &MESSAGES)
    }

    #[tracing::instrument(skip_all, fields(record_id = %form.record_id))]
    pub async fn create(
        &self,
        form: &MaintenanceForm,
    ) -> Result<Maintenance, AdminError> {
        let details = form.to_request()?;
        one(self.client.create_maintenance(&details).await, &MESSAGES)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), AdminError> {
        let id: MaintenanceId = parse_id("Mantenimiento", id)?;
        self.client
            .delete_maintenance(id)
            .await
            .map_err(|e| MESSAGES.map(e))
    }
}
