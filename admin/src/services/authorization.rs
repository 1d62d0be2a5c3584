use payloads::{APIClient, AuthorizationCodeId, ListQuery, Page};

use super::{many, one, page_of};
use crate::error::{AdminError, ErrorMessages, FORBIDDEN_MESSAGE};
use crate::models::authorization::rejection;
use crate::models::{AuthorizationForm, AuthorizationRequest, parse_id};

pub const MESSAGES: ErrorMessages = ErrorMessages {
    not_found: "Solicitud no encontrada",
    conflict: "La solicitud ya fue procesada",
    forbidden: FORBIDDEN_MESSAGE,
};

/// Requests to delete or modify protected records, approved by an
/// administrator.
#[derive(Clone)]
pub struct AuthorizationService {
    client: APIClient,
}

impl AuthorizationService {
    pub fn new(client: APIClient) -> Self {
        Self { client }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(
        &self,
        query: &ListQuery,
    ) -> Result<Page<AuthorizationRequest>, AdminError> {
        page_of(self.client.list_authorization_codes(query).await, &MESSAGES)
    }

    #[tracing::instrument(skip(self))]
    pub async fn pending(
        &self,
    ) -> Result<Vec<AuthorizationRequest>, AdminError> {
        many(self.client.pending_authorization_codes().await, &MESSAGES)
    }

    #[tracing::instrument(skip_all, fields(entity_id = %form.entity_id))]
    pub async fn generate(
        &self,
        form: &AuthorizationForm,
    ) -> Result<AuthorizationRequest, AdminError> {
        let details = form.to_request()?;
        one(
            self.client.generate_authorization_code(&details).await,
            &MESSAGES,
        )
    }

    #[tracing::instrument(skip(self))]
    pub async fn approve(
        &self,
        id: &str,
    ) -> Result<AuthorizationRequest, AdminError> {
        let id: AuthorizationCodeId = parse_id("Solicitud", id)?;
        let request: AuthorizationRequest =
            one(self.client.approve_authorization_code(id).await, &MESSAGES)?;
        tracing::info!(code = %request.code, "Approved request");
        Ok(request)
    }

    #[tracing::instrument(skip(self))]
    pub async fn reject(
        &self,
        id: &str,
        reason: &str,
    ) -> Result<AuthorizationRequest, AdminError> {
        let id: AuthorizationCodeId = parse_id("Solicitud", id)?;
        let details = rejection(reason)?;
        one(
            self.client.reject_authorization_code(id, &details).await,
            &MESSAGES,
        )
    }
}
