//! User administration. Every route here is admin-only.

use actix_web::{HttpRequest, HttpResponse, delete, get, patch, post, web};
use jiff::Timestamp;
use payloads::{UserId, requests, responses};
use std::collections::HashMap;

use super::{APIError, list_params, require_non_empty, require_role, validated};
use crate::store::{Account, Store, list};

const ADMIN: &[&str] = &["ADMIN"];
const SEARCH_FIELDS: &[&str] = &["username", "email", "nombre", "empresa"];

fn not_found() -> APIError {
    APIError::NotFound("Usuario no encontrado".to_string())
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/users")]
pub async fn list_users(
    request: HttpRequest,
    query: web::Query<HashMap<String, String>>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    require_role(&request, &store, ADMIN)?;
    let params = list_params(query);
    let page = store.with(|t| {
        let users: Vec<_> = t.accounts.iter().map(|a| a.user.clone()).collect();
        list(&users, &params, SEARCH_FIELDS)
    });
    Ok(HttpResponse::Ok().json(page))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/users/{id}")]
pub async fn get_user(
    request: HttpRequest,
    path: web::Path<UserId>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    require_role(&request, &store, ADMIN)?;
    let user = store.with(|t| t.user(*path).cloned()).ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(user))
}

#[tracing::instrument(skip(request, details, store), fields(user_id = tracing::field::Empty))]
#[post("/users")]
pub async fn create_user(
    request: HttpRequest,
    details: web::Json<requests::CreateUser>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    require_role(&request, &store, ADMIN)?;
    let details = details.into_inner();
    let mut problems = Vec::new();
    require_non_empty(&mut problems, "username", &details.username);
    require_non_empty(&mut problems, "email", &details.email);
    if details.password.chars().count() < requests::PASSWORD_MIN_LEN {
        problems.push(format!(
            "password must be longer than or equal to {} characters",
            requests::PASSWORD_MIN_LEN
        ));
    }
    validated(problems)?;

    let user = store.with(|t| {
        if t.accounts.iter().any(|a| {
            a.user.username == details.username || a.user.email == details.email
        }) {
            return Err(APIError::Conflict(
                "El usuario o email ya existe".to_string(),
            ));
        }
        let user = responses::User {
            id: UserId(t.next_id()),
            username: details.username,
            email: details.email,
            nombre: Some(details.nombre),
            role: details.role,
            empresa: details.empresa,
            telefono: details.telefono,
            cargo: details.cargo,
            is_active: true,
            must_change_password: true,
            last_login: None,
            created_at: Timestamp::now(),
        };
        t.accounts.push(Account {
            user: user.clone(),
            password: details.password,
        });
        Ok(user)
    })?;
    Ok(HttpResponse::Created().json(user))
}

#[tracing::instrument(skip(request, details, store), fields(user_id = tracing::field::Empty))]
#[patch("/users/{id}")]
pub async fn update_user(
    request: HttpRequest,
    path: web::Path<UserId>,
    details: web::Json<requests::UpdateUser>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    require_role(&request, &store, ADMIN)?;
    let id = path.into_inner();
    let details = details.into_inner();
    let user = store.with(|t| {
        let account = t
            .accounts
            .iter_mut()
            .find(|a| a.user.id == id)
            .ok_or_else(not_found)?;
        let user = &mut account.user;
        if let Some(email) = details.email {
            user.email = email;
        }
        if details.nombre.is_some() {
            user.nombre = details.nombre;
        }
        if let Some(role) = details.role {
            user.role = role;
        }
        if details.empresa.is_some() {
            user.empresa = details.empresa;
        }
        if details.telefono.is_some() {
            user.telefono = details.telefono;
        }
        if details.cargo.is_some() {
            user.cargo = details.cargo;
        }
        if let Some(is_active) = details.is_active {
            user.is_active = is_active;
        }
        Ok::<_, APIError>(user.clone())
    })?;
    Ok(HttpResponse::Ok().json(user))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[delete("/users/{id}")]
pub async fn delete_user(
    request: HttpRequest,
    path: web::Path<UserId>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    let admin = require_role(&request, &store, ADMIN)?;
    let id = path.into_inner();
    if admin.id == id {
        return Err(APIError::bad_request(
            "No puede eliminar su propio usuario",
        ));
    }
    store.with(|t| {
        let index = t
            .accounts
            .iter()
            .position(|a| a.user.id == id)
            .ok_or_else(not_found)?;
        t.accounts.remove(index);
        t.tokens.retain(|_, user_id| *user_id != id);
        Ok::<_, APIError>(())
    })?;
    Ok(HttpResponse::Ok().json(responses::SuccessMessage {
        message: "Usuario eliminado".to_string(),
    }))
}
