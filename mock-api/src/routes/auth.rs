use actix_web::{HttpRequest, HttpResponse, get, post, web};
use jiff::Timestamp;
use payloads::{requests, responses};
use uuid::Uuid;

use super::{APIError, bearer_token, current_user};
use crate::store::Store;

#[tracing::instrument(
    skip(credentials, store),
    fields(username = %credentials.username, user_id = tracing::field::Empty),
)]
#[post("/auth/login")]
pub async fn login(
    credentials: web::Json<requests::LoginCredentials>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    let credentials = credentials.into_inner();
    let token = Uuid::new_v4().simple().to_string();
    let user = store.with(|t| {
        let account = t.accounts.iter_mut().find(|a| {
            a.user.username == credentials.username
                && a.password == credentials.password
        })?;
        if !account.user.is_active {
            return None;
        }
        account.user.last_login = Some(Timestamp::now());
        let user = account.user.clone();
        t.tokens.insert(token.clone(), user.id);
        Some(user)
    });
    let Some(user) = user else {
        tracing::info!("Rejected credentials");
        return Err(APIError::AuthError("Credenciales inválidas".to_string()));
    };
    tracing::Span::current()
        .record("user_id", tracing::field::display(&user.id));
    Ok(HttpResponse::Ok().json(responses::LoginResponse {
        access_token: token,
        needs_password_change: user.must_change_password,
        user,
    }))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[post("/auth/logout")]
pub async fn logout(
    request: HttpRequest,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    current_user(&request, &store)?;
    if let Some(token) = bearer_token(&request) {
        store.with(|t| t.tokens.remove(token));
    }
    Ok(HttpResponse::Ok().json(responses::SuccessMessage {
        message: "Sesión cerrada".to_string(),
    }))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/auth/profile")]
pub async fn profile(
    request: HttpRequest,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    let user = current_user(&request, &store)?;
    Ok(HttpResponse::Ok().json(user))
}

#[tracing::instrument(skip(request, store), fields(user_id = tracing::field::Empty))]
#[get("/auth/verify-session")]
pub async fn verify_session(
    request: HttpRequest,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    let user = current_user(&request, &store)?;
    Ok(HttpResponse::Ok().json(responses::VerifySession {
        valid: true,
        user: Some(user),
    }))
}
