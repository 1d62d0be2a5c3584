use actix_web::{HttpRequest, HttpResponse, delete, get, patch, post, web};
use jiff::Timestamp;
use payloads::{PurchaseOrderId, requests, responses};
use std::collections::HashMap;

use super::{
    APIError, current_user, list_params, require_non_empty, require_role,
    validated,
};
use crate::store::{Store, list};

const SEARCH_FIELDS: &[&str] = &["numero", "proveedor", "descripcion"];

fn not_found() -> APIError {
    APIError::NotFound("Orden de compra no encontrada".to_string())
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/purchase-orders")]
pub async fn list_purchase_orders(
    request: HttpRequest,
    query: web::Query<HashMap<String, String>>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    current_user(&request, &store)?;
    let params = list_params(query);
    let page =
        store.with(|t| list(&t.purchase_orders, &params, SEARCH_FIELDS));
    Ok(HttpResponse::Ok().json(page))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/purchase-orders/{id}")]
pub async fn get_purchase_order(
    request: HttpRequest,
    path: web::Path<PurchaseOrderId>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    current_user(&request, &store)?;
    let id = path.into_inner();
    let order = store
        .with(|t| t.purchase_orders.iter().find(|o| o.id == id).cloned())
        .ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(order))
}

#[tracing::instrument(skip(request, details, store), fields(user_id = tracing::field::Empty))]
#[post("/purchase-orders")]
pub async fn create_purchase_order(
    request: HttpRequest,
    details: web::Json<requests::CreatePurchaseOrder>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    current_user(&request, &store)?;
    let details = details.into_inner();
    let mut problems = Vec::new();
    require_non_empty(&mut problems, "numero", &details.numero);
    if details.monto_total.is_some_and(|m| m.is_sign_negative()) {
        problems.push("monto_total must not be negative".to_string());
    }
    validated(problems)?;

    let order = store.with(|t| {
        if t.purchase_orders.iter().any(|o| o.numero == details.numero) {
            return Err(APIError::Conflict(format!(
                "Ya existe una orden de compra con el número {}",
                details.numero
            )));
        }
        let records = details
            .record_ids
            .iter()
            .map(|id| {
                t.record_summary(*id).ok_or_else(|| {
                    APIError::NotFound(format!("Registro {id} no encontrado"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let order = responses::PurchaseOrder {
            id: PurchaseOrderId(t.next_id()),
            numero: details.numero,
            estado: details.estado,
            fecha_realizacion: details.fecha_realizacion,
            fecha_entrega: details.fecha_entrega,
            proveedor: details.proveedor,
            descripcion: details.descripcion,
            monto_total: details.monto_total,
            records,
            created_at: Timestamp::now(),
        };
        t.purchase_orders.push(order.clone());
        Ok(order)
    })?;
    Ok(HttpResponse::Created().json(order))
}

#[tracing::instrument(skip(request, details, store), fields(user_id = tracing::field::Empty))]
#[patch("/purchase-orders/{id}")]
pub async fn update_purchase_order(
    request: HttpRequest,
    path: web::Path<PurchaseOrderId>,
    details: web::Json<requests::UpdatePurchaseOrder>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    current_user(&request, &store)?;
    let id = path.into_inner();
    let details = details.into_inner();
    let order = store.with(|t| {
        let order = t
            .purchase_orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(not_found)?;
        if let Some(v) = details.estado {
            order.estado = v;
        }
        if details.fecha_entrega.is_some() {
            order.fecha_entrega = details.fecha_entrega;
        }
        if details.proveedor.is_some() {
            order.proveedor = details.proveedor;
        }
        if details.descripcion.is_some() {
            order.descripcion = details.descripcion;
        }
        if details.monto_total.is_some() {
            order.monto_total = details.monto_total;
        }
        Ok::<_, APIError>(order.clone())
    })?;
    Ok(HttpResponse::Ok().json(order))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[delete("/purchase-orders/{id}")]
pub async fn delete_purchase_order(
    request: HttpRequest,
    path: web::Path<PurchaseOrderId>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    require_role(&request, &store, &["ADMIN", "SUPERVISOR"])?;
    let id = path.into_inner();
    store.with(|t| {
        let before = t.purchase_orders.len();
        t.purchase_orders.retain(|o| o.id != id);
        if t.purchase_orders.len() == before {
            Err(not_found())
        } else {
            Ok(())
        }
    })?;
    Ok(HttpResponse::Ok().json(responses::SuccessMessage {
        message: "Orden de compra eliminada".to_string(),
    }))
}
