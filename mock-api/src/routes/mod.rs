pub mod accidents;
pub mod alerts;
pub mod auth;
pub mod authorization_codes;
pub mod maintenance;
pub mod movement_history;
pub mod purchase_orders;
pub mod records;
pub mod users;

use actix_web::http::{StatusCode, header};
use actix_web::{
    HttpRequest, HttpResponse, Responder, ResponseError, body::BoxBody,
    dev::HttpServiceFactory, get, web,
};
use payloads::responses;
use serde_json::json;
use std::collections::HashMap;

use crate::store::{ListParams, Store};

pub fn api_services() -> impl HttpServiceFactory {
    // specific paths are registered before their `{id}` siblings
    web::scope("")
        .service(health_check)
        .service(auth::login)
        .service(auth::logout)
        .service(auth::profile)
        .service(auth::verify_session)
        .service(records::list_records)
        .service(records::create_record)
        .service(records::get_record)
        .service(records::update_record)
        .service(records::delete_record)
        .service(users::list_users)
        .service(users::create_user)
        .service(users::get_user)
        .service(users::update_user)
        .service(users::delete_user)
        .service(accidents::statistics)
        .service(accidents::export)
        .service(accidents::by_record)
        .service(accidents::by_severity)
        .service(accidents::list_accidents)
        .service(accidents::create_accident)
        .service(accidents::get_accident)
        .service(accidents::update_accident)
        .service(accidents::delete_accident)
        .service(purchase_orders::list_purchase_orders)
        .service(purchase_orders::create_purchase_order)
        .service(purchase_orders::get_purchase_order)
        .service(purchase_orders::update_purchase_order)
        .service(purchase_orders::delete_purchase_order)
        .service(movement_history::statistics)
        .service(movement_history::actions)
        .service(movement_history::usernames)
        .service(movement_history::export)
        .service(movement_history::list_movements)
        .service(movement_history::get_movement)
        .service(authorization_codes::pending)
        .service(authorization_codes::generate)
        .service(authorization_codes::approve)
        .service(authorization_codes::reject)
        .service(authorization_codes::list_codes)
        .service(alerts::unread_count)
        .service(alerts::dashboard)
        .service(alerts::mark_all_read)
        .service(alerts::mark_read)
        .service(alerts::list_alerts)
        .service(maintenance::list_maintenance)
        .service(maintenance::create_maintenance)
        .service(maintenance::delete_maintenance)
}

#[get("/health_check")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("healthy")
}

#[derive(Debug, thiserror::Error)]
pub enum APIError {
    #[error("{0}")]
    AuthError(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{}", .0.join(", "))]
    BadRequest(Vec<String>),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Internal server error")]
    UnexpectedError(#[from] anyhow::Error),
}

impl APIError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(vec![message.into()])
    }
}

impl ResponseError for APIError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthError(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        let status = self.status_code();
        match self {
            Self::BadRequest(messages) => HttpResponse::build(status).json(
                responses::ErrorBody {
                    status_code: Some(status.as_u16()),
                    message: Some(responses::ErrorMessage::Many(
                        messages.clone(),
                    )),
                    error: status.canonical_reason().map(str::to_string),
                    code: None,
                    details: None,
                },
            ),
            Self::UnexpectedError(e) => {
                tracing::error!("{e:#}");
                error_response(status, &self.to_string())
            }
            _ => error_response(status, &self.to_string()),
        }
    }
}

/// A JSON error body with a single message.
pub fn error_response(status: StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(json!({
        "statusCode": status.as_u16(),
        "message": message,
        "error": status.canonical_reason().unwrap_or("Error"),
    }))
}

fn bearer_token(request: &HttpRequest) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// The account behind the request's bearer token.
fn current_user(
    request: &HttpRequest,
    store: &Store,
) -> Result<responses::User, APIError> {
    let token = bearer_token(request)
        .ok_or_else(|| APIError::AuthError("Unauthorized".to_string()))?;
    let user = store.with(|t| {
        let id = t.tokens.get(token).copied()?;
        t.user(id).cloned()
    });
    let user =
        user.ok_or_else(|| APIError::AuthError("Unauthorized".to_string()))?;
    // recorded on the span of the route that called us
    tracing::Span::current()
        .record("user_id", tracing::field::display(&user.id));
    Ok(user)
}

/// Like [`current_user`], also requiring one of `roles`.
fn require_role(
    request: &HttpRequest,
    store: &Store,
    roles: &[&str],
) -> Result<responses::User, APIError> {
    let user = current_user(request, store)?;
    if roles.iter().any(|role| user.role.eq_ignore_ascii_case(role)) {
        Ok(user)
    } else {
        Err(APIError::Forbidden(
            "No tiene permisos para realizar esta acción".to_string(),
        ))
    }
}

fn list_params(query: web::Query<HashMap<String, String>>) -> ListParams {
    ListParams::from_query(query.into_inner())
}

fn require_non_empty(
    problems: &mut Vec<String>,
    field: &str,
    value: &str,
) {
    if value.trim().is_empty() {
        problems.push(format!("{field} should not be empty"));
    }
}

fn validated(problems: Vec<String>) -> Result<(), APIError> {
    if problems.is_empty() {
        Ok(())
    } else {
        Err(APIError::BadRequest(problems))
    }
}

/// Render rows as CSV with a header line. Fields are quoted when needed.
fn csv(header: &[&str], rows: impl Iterator<Item = Vec<String>>) -> String {
    fn field(value: &str) -> String {
        if value.contains([',', '"', '\n']) {
            format!("\"{}\"", value.replace('"', "\"\""))
        } else {
            value.to_string()
        }
    }
    let mut out = header.join(",");
    out.push('\n');
    for row in rows {
        let line: Vec<_> = row.iter().map(|value| field(value)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

fn csv_response(filename: &str, body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(body)
}
