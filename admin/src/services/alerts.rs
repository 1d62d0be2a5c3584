use payloads::{APIClient, AlertId, ListQuery, Page};

use super::{one, page_of};
use crate::error::{AdminError, ErrorMessages, FORBIDDEN_MESSAGE};
use crate::models::{Alert, AlertDashboard, parse_id};

pub const MESSAGES: ErrorMessages = ErrorMessages {
    not_found: "Alerta no encontrada",
    conflict: "La alerta ya fue actualizada",
    forbidden: FORBIDDEN_MESSAGE,
};

#[derive(Clone)]
pub struct AlertsService {
    client: APIClient,
}

impl AlertsService {
    pub fn new(client: APIClient) -> Self {
        Self { client }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(
        &self,
        query: &ListQuery,
    ) -> Result<Page<Alert>, AdminError> {
        page_of(self.client.list_alerts(query).await, &MESSAGES)
    }

    #[tracing::instrument(skip(self))]
    pub async fn unread_count(&self) -> Result<u64, AdminError> {
        let unread = self
            .client
            .unread_alert_count()
            .await
            .map_err(|e| MESSAGES.map(e))?;
        Ok(unread.count)
    }

    #[tracing::instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<AlertDashboard, AdminError> {
        one(self.client.alert_dashboard().await, &MESSAGES)
    }

    #[tracing::instrument(skip(self))]
    pub async fn mark_read(&self, id: &str) -> Result<Alert, AdminError> {
        let id: AlertId = parse_id("Alerta", id)?;
        one(self.client.mark_alert_read(id).await, &MESSAGES)
    }

    /// Returns the backend's confirmation message.
    #[tracing::instrument(skip(self))]
    pub async fn mark_all_read(&self) -> Result<String, AdminError> {
        let response = self
            .client
            .mark_all_alerts_read()
            .await
            .map_err(|e| MESSAGES.map(e))?;
        Ok(response.message)
    }
}
