//! Record movement history. This module answers with a `pagination`
//! envelope (snake_case totals) instead of the usual `meta`.

use actix_web::{HttpRequest, HttpResponse, get, web};
use jiff::{Span, Timestamp};
use payloads::{MovementId, SortOrder, responses};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{APIError, csv, csv_response, list_params, require_role};
use crate::store::{ListParams, Store, list};

const VIEWERS: &[&str] = &["ADMIN", "SUPERVISOR"];
const SEARCH_FIELDS: &[&str] = &["record_code", "description", "username"];

fn newest_first(mut params: ListParams) -> ListParams {
    if params.sort_by.is_none() {
        params.sort_by = Some("id".to_string());
        params.sort_order = SortOrder::Desc;
    }
    params
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/record-movement-history")]
pub async fn list_movements(
    request: HttpRequest,
    query: web::Query<HashMap<String, String>>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    require_role(&request, &store, VIEWERS)?;
    let params = newest_first(list_params(query));
    let page = store.with(|t| list(&t.movements, &params, SEARCH_FIELDS));
    Ok(HttpResponse::Ok().json(json!({
        "data": page.data,
        "pagination": {
            "page": page.meta.page,
            "limit": page.meta.limit,
            "total": page.meta.total,
            "total_pages": page.meta.total_pages,
            "hasNext": page.meta.has_more(),
            "hasPrev": page.meta.page > 1,
        },
    })))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/record-movement-history/statistics")]
pub async fn statistics(
    request: HttpRequest,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    require_role(&request, &store, VIEWERS)?;
    let day_ago = Timestamp::now()
        .checked_sub(Span::new().hours(24))
        .map_err(anyhow::Error::from)?;
    let statistics = store.with(|t| {
        let mut by_action = BTreeMap::new();
        let mut by_user = BTreeMap::new();
        for entry in &t.movements {
            *by_action.entry(entry.action.clone()).or_insert(0) += 1;
            if let Some(username) = &entry.username {
                *by_user.entry(username.clone()).or_insert(0) += 1;
            }
        }
        responses::MovementStatistics {
            total_movements: t.movements.len() as u64,
            by_action,
            by_user,
            last_24_hours: t
                .movements
                .iter()
                .filter(|m| m.action_date >= day_ago)
                .count() as u64,
        }
    });
    Ok(HttpResponse::Ok().json(statistics))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/record-movement-history/actions")]
pub async fn actions(
    request: HttpRequest,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    require_role(&request, &store, VIEWERS)?;
    let actions: BTreeSet<String> =
        store.with(|t| t.movements.iter().map(|m| m.action.clone()).collect());
    Ok(HttpResponse::Ok().json(actions))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/record-movement-history/usernames")]
pub async fn usernames(
    request: HttpRequest,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    require_role(&request, &store, VIEWERS)?;
    let usernames: BTreeSet<String> = store.with(|t| {
        t.movements.iter().filter_map(|m| m.username.clone()).collect()
    });
    Ok(HttpResponse::Ok().json(usernames))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/record-movement-history/export")]
pub async fn export(
    request: HttpRequest,
    query: web::Query<HashMap<String, String>>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    require_role(&request, &store, VIEWERS)?;
    let mut params = newest_first(list_params(query));
    params.page = 1;
    params.limit = u32::MAX;
    let rows = store.with(|t| list(&t.movements, &params, SEARCH_FIELDS).data);
    let body = csv(
        &["id", "fecha", "accion", "registro", "usuario", "descripcion"],
        rows.into_iter().map(|m| {
            vec![
                m.id.to_string(),
                m.action_date.to_string(),
                m.action,
                m.record_code.unwrap_or_default(),
                m.username.unwrap_or_default(),
                m.description.unwrap_or_default(),
            ]
        }),
    );
    Ok(csv_response("historial.csv", body))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/record-movement-history/{id}")]
pub async fn get_movement(
    request: HttpRequest,
    path: web::Path<MovementId>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    require_role(&request, &store, VIEWERS)?;
    let id = path.into_inner();
    let entry = store
        .with(|t| t.movements.iter().find(|m| m.id == id).cloned())
        .ok_or_else(|| {
            APIError::NotFound("Movimiento no encontrado".to_string())
        })?;
    Ok(HttpResponse::Ok().json(entry))
}
