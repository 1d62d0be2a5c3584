use payloads::{APIClient, ListQuery, MovementId, Page};

use super::{one, page_of};
use crate::error::{AdminError, ErrorMessages, FORBIDDEN_MESSAGE};
use crate::models::{Movement, MovementAction, MovementStatistics, parse_id};

pub const MESSAGES: ErrorMessages = ErrorMessages {
    not_found: "Movimiento no encontrado",
    conflict: "Conflicto al consultar el historial",
    forbidden: FORBIDDEN_MESSAGE,
};

/// Read-only audit trail of changes to líneas de vida.
#[derive(Clone)]
pub struct MovementHistoryService {
    client: APIClient,
}

impl MovementHistoryService {
    pub fn new(client: APIClient) -> Self {
        Self { client }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(
        &self,
        query: &ListQuery,
    ) -> Result<Page<Movement>, AdminError> {
        page_of(self.client.list_movements(query).await, &MESSAGES)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Movement, AdminError> {
        let id: MovementId = parse_id("Movimiento", id)?;
        one(self.client.get_movement(id).await, &MESSAGES)
    }

    #[tracing::instrument(skip(self))]
    pub async fn statistics(&self) -> Result<MovementStatistics, AdminError> {
        one(self.client.movement_statistics().await, &MESSAGES)
    }

    /// Distinct actions, for the filter drop-down.
    #[tracing::instrument(skip(self))]
    pub async fn actions(&self) -> Result<Vec<MovementAction>, AdminError> {
        let actions = self
            .client
            .movement_actions()
            .await
            .map_err(|e| MESSAGES.map(e))?;
        Ok(actions
            .iter()
            .map(|action| MovementAction::from_backend(action))
            .collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn usernames(&self) -> Result<Vec<String>, AdminError> {
        self.client
            .movement_usernames()
            .await
            .map_err(|e| MESSAGES.map(e))
    }

    #[tracing::instrument(skip(self))]
    pub async fn export(
        &self,
        query: &ListQuery,
    ) -> Result<Vec<u8>, AdminError> {
        self.client
            .export_movements(query)
            .await
            .map_err(|e| MESSAGES.map(e))
    }
}
