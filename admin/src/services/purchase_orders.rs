use payloads::{APIClient, ListQuery, Page, PurchaseOrderId};

use super::{one, page_of};
use crate::error::{AdminError, ErrorMessages, FORBIDDEN_MESSAGE};
use crate::models::{PurchaseOrder, PurchaseOrderForm, parse_id};

pub const MESSAGES: ErrorMessages = ErrorMessages {
    not_found: "Orden de compra no encontrada",
    conflict: "Ya existe una orden de compra con ese número",
    forbidden: FORBIDDEN_MESSAGE,
};

#[derive(Clone)]
pub struct PurchaseOrdersService {
    client: APIClient,
}

impl PurchaseOrdersService {
    pub fn new(client: APIClient) -> Self {
        Self { client }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(
        &self,
        query: &ListQuery,
    ) -> Result<Page<PurchaseOrder>, AdminError> {
        page_of(self.client.list_purchase_orders(query).await, &MESSAGES)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<PurchaseOrder, AdminError> {
        let id: PurchaseOrderId = parse_id("Orden de compra", id)?;
        one(self.client.get_purchase_order(id).await, &MESSAGES)
    }

    #[tracing::instrument(skip_all, fields(numero = %form.numero))]
    pub async fn create(
        &self,
        form: &PurchaseOrderForm,
    ) -> Result<PurchaseOrder, AdminError> {
        let details = form.to_create()?;
        one(self.client.create_purchase_order(&details).await, &MESSAGES)
    }

    #[tracing::instrument(skip_all, fields(id = %original.id))]
    pub async fn update(
        &self,
        original: &PurchaseOrder,
        form: &PurchaseOrderForm,
    ) -> Result<PurchaseOrder, AdminError> {
        let id: PurchaseOrderId = parse_id("Orden de compra", &original.id)?;
        let details = form.to_update(original)?;
        one(
            self.client.update_purchase_order(id, &details).await,
            &MESSAGES,
        )
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), AdminError> {
        let id: PurchaseOrderId = parse_id("Orden de compra", id)?;
        self.client
            .delete_purchase_order(id)
            .await
            .map_err(|e| MESSAGES.map(e))
    }
}
