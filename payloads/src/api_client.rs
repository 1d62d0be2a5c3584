use crate::storage::TOKEN_KEY;
use crate::{
    AccidentId, AlertId, AuthorizationCodeId, ListQuery, MaintenanceId,
    MovementId, Page, PurchaseOrderId, RecordId, RetryPolicy, Storage, UserId,
    requests, responses,
};
use reqwest::{Method, StatusCode, header};
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const SESSION_EXPIRED_MESSAGE: &str =
    "Tu sesión ha expirado. Por favor, inicia sesión nuevamente.";

type TokenExpiredHandler = Arc<dyn Fn() + Send + Sync>;

/// An API client for interfacing with the AyniLine backend.
///
/// Cloning is cheap and clones share the token storage and the
/// token-expired handler.
#[derive(Clone)]
pub struct APIClient {
    pub address: String,
    pub inner_client: reqwest::Client,
    storage: Arc<dyn Storage>,
    retry_policy: RetryPolicy,
    timeout: Duration,
    token_expired: Arc<Mutex<Option<TokenExpiredHandler>>>,
}

/// Construction and token handling
impl APIClient {
    pub fn new(address: impl Into<String>, storage: Arc<dyn Storage>) -> Self {
        Self {
            address: address.into().trim_end_matches('/').to_string(),
            inner_client: reqwest::Client::new(),
            storage,
            retry_policy: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
            token_expired: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn token(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn set_token(&self, token: &str) {
        self.storage.set(TOKEN_KEY, token);
    }

    pub fn clear_token(&self) {
        self.storage.remove(TOKEN_KEY);
    }

    /// Register the callback run when an authenticated request comes back
    /// with 401. Replaces any previously registered callback.
    pub fn on_token_expired(&self, handler: impl Fn() + Send + Sync + 'static) {
        *self.handler_slot() = Some(Arc::new(handler));
    }

    pub fn clear_token_expired_handler(&self) {
        *self.handler_slot() = None;
    }

    fn handler_slot(
        &self,
    ) -> std::sync::MutexGuard<'_, Option<TokenExpiredHandler>> {
        self.token_expired
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn expire_session(&self) {
        tracing::info!("Bearer token rejected, clearing stored session");
        self.clear_token();
        // run the handler without holding the lock, it may re-register
        let handler = self.handler_slot().clone();
        if let Some(handler) = handler {
            handler();
        }
    }
}

/// Helper methods for http actions
impl APIClient {
    fn format_url(&self, path: &str) -> String {
        format!("{}/{}", self.address, path.trim_start_matches('/'))
    }

    async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&B>,
    ) -> Result<reqwest::Response, ClientError> {
        self.request_with(method, path, query, body, true).await
    }

    /// Send with retries. `notify_expiry` controls whether a 401 on an
    /// authenticated request runs the token-expired path.
    async fn request_with<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&B>,
        notify_expiry: bool,
    ) -> Result<reqwest::Response, ClientError> {
        let url = self.format_url(path);
        let mut attempt = 1;
        loop {
            let result = self
                .send_once(method.clone(), &url, query, body, notify_expiry)
                .await;
            match result {
                Ok(response) => return Ok(response),
                Err(e) if self.retry_policy.should_retry(attempt, &e) => {
                    let delay = self.retry_policy.delay(attempt);
                    tracing::warn!(
                        %method,
                        %url,
                        attempt,
                        ?delay,
                        "Request failed, retrying: {e}"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::debug!(
                        %method,
                        %url,
                        attempt,
                        "Request failed: {e}"
                    );
                    return Err(e);
                }
            }
        }
    }

    async fn send_once<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        query: &[(String, String)],
        body: Option<&B>,
        notify_expiry: bool,
    ) -> Result<reqwest::Response, ClientError> {
        let token = self.token();
        let mut request = self
            .inner_client
            .request(method, url)
            .timeout(self.timeout);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(token) = &token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED && token.is_some() {
            if notify_expiry {
                self.expire_session();
            } else {
                self.clear_token();
            }
            return Err(ClientError::SessionExpired);
        }
        Err(ClientError::APIError(error_details(response).await))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, ClientError> {
        let response = self.request(Method::GET, path, &[], None::<&()>).await?;
        ok_body(response).await
    }

    pub async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &ListQuery,
    ) -> Result<T, ClientError> {
        let response = self
            .request(Method::GET, path, &query.to_pairs(), None::<&()>)
            .await?;
        ok_body(response).await
    }

    /// Raw response body, for file exports.
    pub async fn get_bytes(
        &self,
        path: &str,
        query: &ListQuery,
    ) -> Result<Vec<u8>, ClientError> {
        let response = self
            .request(Method::GET, path, &query.to_pairs(), None::<&()>)
            .await?;
        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(bytes.to_vec())
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response =
            self.request(Method::POST, path, &[], Some(body)).await?;
        ok_body(response).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self.request(Method::PUT, path, &[], Some(body)).await?;
        ok_body(response).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response =
            self.request(Method::PATCH, path, &[], Some(body)).await?;
        ok_body(response).await
    }

    pub async fn patch_empty<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, ClientError> {
        let response =
            self.request(Method::PATCH, path, &[], None::<&()>).await?;
        ok_body(response).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, ClientError> {
        let response =
            self.request(Method::DELETE, path, &[], None::<&()>).await?;
        ok_body(response).await
    }
}

/// Authentication endpoints
impl APIClient {
    /// Log in and persist the returned bearer token.
    pub async fn login(
        &self,
        credentials: &requests::LoginCredentials,
    ) -> Result<responses::LoginResponse, ClientError> {
        // a fresh login never sends a leftover token
        self.clear_token();
        let response: responses::LoginResponse =
            self.post("auth/login", &credentials.normalized()).await?;
        self.set_token(&response.access_token);
        Ok(response)
    }

    /// Best-effort server logout. The local token is cleared regardless of
    /// the outcome.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = match self
            .request_with(Method::POST, "auth/logout", &[], None::<&()>, false)
            .await
        {
            Ok(response) => ok_empty(response).await,
            Err(e) => Err(e),
        };
        self.clear_token();
        result
    }

    pub async fn user_profile(&self) -> Result<responses::User, ClientError> {
        self.get("auth/profile").await
    }

    pub async fn verify_session(
        &self,
    ) -> Result<responses::VerifySession, ClientError> {
        self.get("auth/verify-session").await
    }
}

/// Líneas de vida
impl APIClient {
    pub async fn list_records(
        &self,
        query: &ListQuery,
    ) -> Result<Page<responses::Record>, ClientError> {
        self.get_query("records", query).await
    }

    pub async fn get_record(
        &self,
        id: RecordId,
    ) -> Result<responses::Record, ClientError> {
        self.get(&format!("records/{id}")).await
    }

    pub async fn create_record(
        &self,
        details: &requests::CreateRecord,
    ) -> Result<responses::Record, ClientError> {
        self.post("records", details).await
    }

    pub async fn update_record(
        &self,
        id: RecordId,
        details: &requests::UpdateRecord,
    ) -> Result<responses::Record, ClientError> {
        self.patch(&format!("records/{id}"), details).await
    }

    pub async fn delete_record(&self, id: RecordId) -> Result<(), ClientError> {
        self.delete::<IgnoredAny>(&format!("records/{id}")).await?;
        Ok(())
    }
}

/// Users
impl APIClient {
    pub async fn list_users(
        &self,
        query: &ListQuery,
    ) -> Result<Page<responses::User>, ClientError> {
        self.get_query("users", query).await
    }

    pub async fn get_user(
        &self,
        id: UserId,
    ) -> Result<responses::User, ClientError> {
        self.get(&format!("users/{id}")).await
    }

    pub async fn create_user(
        &self,
        details: &requests::CreateUser,
    ) -> Result<responses::User, ClientError> {
        self.post("users", details).await
    }

    pub async fn update_user(
        &self,
        id: UserId,
        details: &requests::UpdateUser,
    ) -> Result<responses::User, ClientError> {
        self.patch(&format!("users/{id}"), details).await
    }

    pub async fn delete_user(&self, id: UserId) -> Result<(), ClientError> {
        self.delete::<IgnoredAny>(&format!("users/{id}")).await?;
        Ok(())
    }
}

/// Accidents
impl APIClient {
    pub async fn list_accidents(
        &self,
        query: &ListQuery,
    ) -> Result<Page<responses::Accident>, ClientError> {
        self.get_query("accidents", query).await
    }

    pub async fn get_accident(
        &self,
        id: AccidentId,
    ) -> Result<responses::Accident, ClientError> {
        self.get(&format!("accidents/{id}")).await
    }

    pub async fn create_accident(
        &self,
        details: &requests::CreateAccident,
    ) -> Result<responses::Accident, ClientError> {
        self.post("accidents", details).await
    }

    pub async fn update_accident(
        &self,
        id: AccidentId,
        details: &requests::UpdateAccident,
    ) -> Result<responses::Accident, ClientError> {
        self.patch(&format!("accidents/{id}"), details).await
    }

    pub async fn delete_accident(
        &self,
        id: AccidentId,
    ) -> Result<(), ClientError> {
        self.delete::<IgnoredAny>(&format!("accidents/{id}")).await?;
        Ok(())
    }

    pub async fn accident_statistics(
        &self,
    ) -> Result<responses::AccidentStatistics, ClientError> {
        self.get("accidents/statistics").await
    }

    pub async fn accidents_by_record(
        &self,
        record_id: RecordId,
    ) -> Result<Vec<responses::Accident>, ClientError> {
        self.get(&format!("accidents/by-linea-vida/{record_id}")).await
    }

    pub async fn accidents_by_severity(
        &self,
        severity: &str,
    ) -> Result<Vec<responses::Accident>, ClientError> {
        self.get(&format!("accidents/by-severity/{severity}")).await
    }

    pub async fn export_accidents(
        &self,
        query: &ListQuery,
    ) -> Result<Vec<u8>, ClientError> {
        self.get_bytes("accidents/export", query).await
    }
}

/// Purchase orders
impl APIClient {
    pub async fn list_purchase_orders(
        &self,
        query: &ListQuery,
    ) -> Result<Page<responses::PurchaseOrder>, ClientError> {
        self.get_query("purchase-orders", query).await
    }

    pub async fn get_purchase_order(
        &self,
        id: PurchaseOrderId,
    ) -> Result<responses::PurchaseOrder, ClientError> {
        self.get(&format!("purchase-orders/{id}")).await
    }

    pub async fn create_purchase_order(
        &self,
        details: &requests::CreatePurchaseOrder,
    ) -> Result<responses::PurchaseOrder, ClientError> {
        self.post("purchase-orders", details).await
    }

    pub async fn update_purchase_order(
        &self,
        id: PurchaseOrderId,
        details: &requests::UpdatePurchaseOrder,
    ) -> Result<responses::PurchaseOrder, ClientError> {
        self.patch(&format!("purchase-orders/{id}"), details).await
    }

    pub async fn delete_purchase_order(
        &self,
        id: PurchaseOrderId,
    ) -> Result<(), ClientError> {
        self.delete::<IgnoredAny>(&format!("purchase-orders/{id}"))
            .await?;
        Ok(())
    }
}

/// Record movement history
impl APIClient {
    pub async fn list_movements(
        &self,
        query: &ListQuery,
    ) -> Result<Page<responses::MovementHistoryEntry>, ClientError> {
        self.get_query("record-movement-history", query).await
    }

    pub async fn get_movement(
        &self,
        id: MovementId,
    ) -> Result<responses::MovementHistoryEntry, ClientError> {
        self.get(&format!("record-movement-history/{id}")).await
    }

    pub async fn movement_statistics(
        &self,
    ) -> Result<responses::MovementStatistics, ClientError> {
        self.get("record-movement-history/statistics").await
    }

    pub async fn movement_actions(&self) -> Result<Vec<String>, ClientError> {
        self.get("record-movement-history/actions").await
    }

    pub async fn movement_usernames(
        &self,
    ) -> Result<Vec<String>, ClientError> {
        self.get("record-movement-history/usernames").await
    }

    pub async fn export_movements(
        &self,
        query: &ListQuery,
    ) -> Result<Vec<u8>, ClientError> {
        self.get_bytes("record-movement-history/export", query).await
    }
}

/// Authorization codes
impl APIClient {
    pub async fn list_authorization_codes(
        &self,
        query: &ListQuery,
    ) -> Result<Page<responses::AuthorizationCode>, ClientError> {
        self.get_query("authorization-codes", query).await
    }

    pub async fn pending_authorization_codes(
        &self,
    ) -> Result<Vec<responses::AuthorizationCode>, ClientError> {
        self.get("authorization-codes/pending").await
    }

    pub async fn generate_authorization_code(
        &self,
        details: &requests::GenerateAuthorizationCode,
    ) -> Result<responses::AuthorizationCode, ClientError> {
        self.post("authorization-codes/generate", details).await
    }

    pub async fn approve_authorization_code(
        &self,
        id: AuthorizationCodeId,
    ) -> Result<responses::AuthorizationCode, ClientError> {
        self.patch_empty(&format!("authorization-codes/{id}/approve"))
            .await
    }

    pub async fn reject_authorization_code(
        &self,
        id: AuthorizationCodeId,
        details: &requests::RejectAuthorizationCode,
    ) -> Result<responses::AuthorizationCode, ClientError> {
        self.patch(&format!("authorization-codes/{id}/reject"), details)
            .await
    }
}

/// Alerts
impl APIClient {
    pub async fn list_alerts(
        &self,
        query: &ListQuery,
    ) -> Result<Page<responses::Alert>, ClientError> {
        self.get_query("alerts", query).await
    }

    pub async fn unread_alert_count(
        &self,
    ) -> Result<responses::UnreadCount, ClientError> {
        self.get("alerts/unread-count").await
    }

    pub async fn alert_dashboard(
        &self,
    ) -> Result<responses::AlertDashboard, ClientError> {
        self.get("alerts/dashboard").await
    }

    pub async fn mark_alert_read(
        &self,
        id: AlertId,
    ) -> Result<responses::Alert, ClientError> {
        self.patch_empty(&format!("alerts/{id}/mark-read")).await
    }

    pub async fn mark_all_alerts_read(
        &self,
    ) -> Result<responses::SuccessMessage, ClientError> {
        self.patch_empty("alerts/mark-all-read").await
    }
}

/// Maintenance
impl APIClient {
    pub async fn list_maintenance(
        &self,
        query: &ListQuery,
    ) -> Result<Page<responses::Maintenance>, ClientError> {
        self.get_query("maintenance", query).await
    }

    pub async fn create_maintenance(
        &self,
        details: &requests::CreateMaintenance,
    ) -> Result<responses::Maintenance, ClientError> {
        self.post("maintenance", details).await
    }

    pub async fn delete_maintenance(
        &self,
        id: MaintenanceId,
    ) -> Result<(), ClientError> {
        self.delete::<IgnoredAny>(&format!("maintenance/{id}")).await?;
        Ok(())
    }
}

/// A non-2xx response, normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct APIErrorDetails {
    pub status: StatusCode,
    pub message: String,
    pub code: Option<String>,
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// An error response from the backend, carrying its message.
    #[error("{}", .0.message)]
    APIError(APIErrorDetails),
    /// The backend rejected the bearer token. The stored token has already
    /// been cleared.
    #[error("{}", SESSION_EXPIRED_MESSAGE)]
    SessionExpired,
    #[error("No se puede conectar con el servidor. Verifica tu conexión.")]
    Network(#[source] reqwest::Error),
    #[error("El servidor tardó demasiado en responder.")]
    Timeout,
    #[error("Respuesta inesperada del servidor.")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// The HTTP status behind this error, or `None` when no response was
    /// received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::APIError(details) => Some(details.status),
            ClientError::SessionExpired => Some(StatusCode::UNAUTHORIZED),
            ClientError::Network(_)
            | ClientError::Timeout
            | ClientError::Decode(_) => None,
        }
    }
}

fn transport_error(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout
    } else {
        ClientError::Network(e)
    }
}

async fn error_details(response: reqwest::Response) -> APIErrorDetails {
    let status = response.status();
    let status_text = status
        .canonical_reason()
        .unwrap_or("Unknown error")
        .to_string();
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"));

    let body = if is_json {
        response.json::<responses::ErrorBody>().await.ok()
    } else {
        None
    };
    match body {
        Some(body) => APIErrorDetails {
            status,
            message: body
                .message
                .map(|m| m.joined())
                .filter(|m| !m.is_empty())
                .or(body.error)
                .unwrap_or(status_text),
            code: body.code,
            details: body.details,
        },
        None => APIErrorDetails {
            status,
            message: status_text,
            code: None,
            details: None,
        },
    }
}

/// Deserialize a successful response into the desired type. An empty body
/// reads as JSON `null`.
pub async fn ok_body<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let bytes = response.bytes().await.map_err(transport_error)?;
    let bytes: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
    Ok(serde_json::from_slice(bytes)?)
}

/// Check that a response is OK, discarding any body.
pub async fn ok_empty(response: reqwest::Response) -> Result<(), ClientError> {
    ok_body::<IgnoredAny>(response).await?;
    Ok(())
}
