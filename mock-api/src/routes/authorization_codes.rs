use actix_web::{HttpRequest, HttpResponse, get, patch, post, web};
use jiff::{Span, Timestamp};
use payloads::{AuthorizationCodeId, requests, responses};
use std::collections::HashMap;
use uuid::Uuid;

use super::{
    APIError, current_user, list_params, require_non_empty, require_role,
    validated,
};
use crate::store::{Store, Tables, list};

const APPROVERS: &[&str] = &["ADMIN", "SUPERVISOR"];
const SEARCH_FIELDS: &[&str] =
    &["code", "operation", "entity_type", "requested_by_username"];

pub const PENDING: &str = "pending";
pub const APPROVED: &str = "approved";
pub const REJECTED: &str = "rejected";

fn is_approver(user: &responses::User) -> bool {
    APPROVERS.iter().any(|r| user.role.eq_ignore_ascii_case(r))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/authorization-codes")]
pub async fn list_codes(
    request: HttpRequest,
    query: web::Query<HashMap<String, String>>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    let user = current_user(&request, &store)?;
    let params = list_params(query);
    let page = store.with(|t| {
        let visible: Vec<_> = t
            .authorization_codes
            .iter()
            .filter(|c| is_approver(&user) || c.requested_by == user.id)
            .cloned()
            .collect();
        list(&visible, &params, SEARCH_FIELDS)
    });
    Ok(HttpResponse::Ok().json(page))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/authorization-codes/pending")]
pub async fn pending(
    request: HttpRequest,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    require_role(&request, &store, APPROVERS)?;
    let codes: Vec<_> = store.with(|t| {
        t.authorization_codes
            .iter()
            .filter(|c| c.status == PENDING)
            .cloned()
            .collect()
    });
    Ok(HttpResponse::Ok().json(codes))
}

#[tracing::instrument(skip(request, details, store), fields(user_id = tracing::field::Empty))]
#[post("/authorization-codes/generate")]
pub async fn generate(
    request: HttpRequest,
    details: web::Json<requests::GenerateAuthorizationCode>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    let user = current_user(&request, &store)?;
    let details = details.into_inner();
    let mut problems = Vec::new();
    require_non_empty(&mut problems, "operation", &details.operation);
    require_non_empty(&mut problems, "entity_type", &details.entity_type);
    require_non_empty(&mut problems, "justificacion", &details.justificacion);
    validated(problems)?;

    let now = Timestamp::now();
    let expires_at =
        now.checked_add(Span::new().hours(24)).map_err(anyhow::Error::from)?;
    let code = store.with(|t| {
        let code = responses::AuthorizationCode {
            id: AuthorizationCodeId(t.next_id()),
            code: Uuid::new_v4().simple().to_string()[..8].to_uppercase(),
            operation: details.operation,
            entity_type: details.entity_type,
            entity_id: details.entity_id,
            justificacion: Some(details.justificacion),
            status: PENDING.to_string(),
            requested_by: user.id,
            requested_by_username: Some(user.username.clone()),
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            expires_at: Some(expires_at),
            created_at: now,
        };
        t.authorization_codes.push(code.clone());
        code
    });
    tracing::info!(id = %code.id, operation = %code.operation, "Authorization requested");
    Ok(HttpResponse::Created().json(code))
}

/// Apply a decision to a pending code. Fails if it was already decided.
fn decide(
    t: &mut Tables,
    id: AuthorizationCodeId,
    apply: impl FnOnce(&mut responses::AuthorizationCode),
) -> Result<responses::AuthorizationCode, APIError> {
    let code = t
        .authorization_codes
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| {
            APIError::NotFound("Solicitud no encontrada".to_string())
        })?;
    if code.status != PENDING {
        return Err(APIError::bad_request(format!(
            "La solicitud ya fue procesada ({})",
            code.status
        )));
    }
    apply(code);
    Ok(code.clone())
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[patch("/authorization-codes/{id}/approve")]
pub async fn approve(
    request: HttpRequest,
    path: web::Path<AuthorizationCodeId>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    let approver = require_role(&request, &store, APPROVERS)?;
    let code = store.with(|t| {
        decide(t, path.into_inner(), |code| {
            code.status = APPROVED.to_string();
            code.approved_by = Some(approver.id);
            code.approved_at = Some(Timestamp::now());
        })
    })?;
    Ok(HttpResponse::Ok().json(code))
}

#[tracing::instrument(skip(request, details, store), fields(user_id = tracing::field::Empty))]
#[patch("/authorization-codes/{id}/reject")]
pub async fn reject(
    request: HttpRequest,
    path: web::Path<AuthorizationCodeId>,
    details: web::Json<requests::RejectAuthorizationCode>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    let approver = require_role(&request, &store, APPROVERS)?;
    let details = details.into_inner();
    let mut problems = Vec::new();
    require_non_empty(&mut problems, "reason", &details.reason);
    validated(problems)?;
    let code = store.with(|t| {
        decide(t, path.into_inner(), |code| {
            code.status = REJECTED.to_string();
            code.approved_by = Some(approver.id);
            code.rejection_reason = Some(details.reason);
        })
    })?;
    Ok(HttpResponse::Ok().json(code))
}
