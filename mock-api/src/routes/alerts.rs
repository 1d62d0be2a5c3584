use actix_web::{HttpRequest, HttpResponse, get, patch, web};
use payloads::{AlertId, SortOrder, responses};
use std::collections::HashMap;

use super::{APIError, current_user, list_params};
use crate::store::{Store, list};

const SEARCH_FIELDS: &[&str] = &["mensaje", "tipo"];
pub const CRITICAL: &str = "critica";

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/alerts")]
pub async fn list_alerts(
    request: HttpRequest,
    query: web::Query<HashMap<String, String>>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    current_user(&request, &store)?;
    let mut params = list_params(query);
    if params.sort_by.is_none() {
        params.sort_by = Some("id".to_string());
        params.sort_order = SortOrder::Desc;
    }
    let page = store.with(|t| list(&t.alerts, &params, SEARCH_FIELDS));
    Ok(HttpResponse::Ok().json(page))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/alerts/unread-count")]
pub async fn unread_count(
    request: HttpRequest,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    current_user(&request, &store)?;
    let count =
        store.with(|t| t.alerts.iter().filter(|a| !a.leida).count() as u64);
    Ok(HttpResponse::Ok().json(responses::UnreadCount { count }))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/alerts/dashboard")]
pub async fn dashboard(
    request: HttpRequest,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    current_user(&request, &store)?;
    let dashboard = store.with(|t| responses::AlertDashboard {
        total: t.alerts.len() as u64,
        unread: t.alerts.iter().filter(|a| !a.leida).count() as u64,
        critical: t
            .alerts
            .iter()
            .filter(|a| !a.leida && a.prioridad == CRITICAL)
            .count() as u64,
        recent: t.alerts.iter().rev().take(5).cloned().collect(),
    });
    Ok(HttpResponse::Ok().json(dashboard))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[patch("/alerts/mark-all-read")]
pub async fn mark_all_read(
    request: HttpRequest,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    current_user(&request, &store)?;
    let marked = store.with(|t| {
        let mut marked = 0;
        for alert in t.alerts.iter_mut().filter(|a| !a.leida) {
            alert.leida = true;
            marked += 1;
        }
        marked
    });
    Ok(HttpResponse::Ok().json(responses::SuccessMessage {
        message: format!("{marked} alertas marcadas como leídas"),
    }))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[patch("/alerts/{id}/mark-read")]
pub async fn mark_read(
    request: HttpRequest,
    path: web::Path<AlertId>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    current_user(&request, &store)?;
    let id = path.into_inner();
    let alert = store
        .with(|t| {
            let alert = t.alerts.iter_mut().find(|a| a.id == id)?;
            alert.leida = true;
            Some(alert.clone())
        })
        .ok_or_else(|| APIError::NotFound("Alerta no encontrada".to_string()))?;
    Ok(HttpResponse::Ok().json(alert))
}
