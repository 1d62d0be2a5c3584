use crate::{
    AccidentId, AlertId, AuthorizationCodeId, MaintenanceId, MovementId,
    PurchaseOrderId, RecordId, UserId,
};
use jiff::Timestamp;
use jiff::civil::Date;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A user as the backend returns it. `role` is a free-form backend string;
/// the admin crate maps it to its own role set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub nombre: Option<String>,
    pub role: String,
    #[serde(default)]
    pub empresa: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub cargo: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub must_change_password: bool,
    #[serde(default)]
    pub last_login: Option<Timestamp>,
    pub created_at: Timestamp,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: User,
    #[serde(default, rename = "needsPasswordChange")]
    pub needs_password_change: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifySession {
    pub valid: bool,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessMessage {
    pub message: String,
}

/// Error body in the shape the backend framework emits. `message` is a
/// string for most errors and a list of strings for validation failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "statusCode", default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub message: Option<ErrorMessage>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

impl ErrorMessage {
    pub fn joined(&self) -> String {
        match self {
            ErrorMessage::One(message) => message.clone(),
            ErrorMessage::Many(messages) => messages.join(", "),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub codigo: String,
    pub cliente: String,
    pub equipo: String,
    pub fv_anios: i32,
    pub fv_meses: i32,
    pub fecha_instalacion: Date,
    #[serde(default)]
    pub fecha_caducidad: Option<Date>,
    pub estado_actual: String,
    pub tipo_linea: String,
    pub ubicacion: String,
    #[serde(default)]
    pub seec: Option<String>,
    #[serde(default)]
    pub anclaje_equipos: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// The subset of a record embedded in other resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub id: RecordId,
    pub codigo: String,
    pub cliente: String,
    pub ubicacion: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accident {
    pub id: AccidentId,
    pub linea_vida_id: RecordId,
    pub fecha_accidente: Date,
    pub descripcion_incidente: String,
    #[serde(default)]
    pub persona_involucrada: Option<String>,
    #[serde(default)]
    pub acciones_correctivas: Option<String>,
    #[serde(default)]
    pub evidencias_urls: Vec<String>,
    pub estado: String,
    pub severidad: String,
    #[serde(default)]
    pub reportado_por: Option<UserId>,
    pub fecha_creacion: Timestamp,
    #[serde(default)]
    pub linea_vida: Option<RecordSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccidentStatistics {
    pub total: u64,
    #[serde(default)]
    pub por_estado: BTreeMap<String, u64>,
    #[serde(default)]
    pub por_severidad: BTreeMap<String, u64>,
    #[serde(default)]
    pub ultimo_mes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: PurchaseOrderId,
    pub numero: String,
    pub estado: String,
    pub fecha_realizacion: Date,
    #[serde(default)]
    pub fecha_entrega: Option<Date>,
    #[serde(default)]
    pub proveedor: Option<String>,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub monto_total: Option<Decimal>,
    #[serde(default)]
    pub records: Vec<RecordSummary>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementHistoryEntry {
    pub id: MovementId,
    #[serde(default)]
    pub record_id: Option<RecordId>,
    #[serde(default)]
    pub record_code: Option<String>,
    pub action: String,
    pub action_date: Timestamp,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub changed_field: Option<String>,
    #[serde(default)]
    pub previous_values: Option<serde_json::Value>,
    #[serde(default)]
    pub new_values: Option<serde_json::Value>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementStatistics {
    pub total_movements: u64,
    #[serde(default)]
    pub by_action: BTreeMap<String, u64>,
    #[serde(default)]
    pub by_user: BTreeMap<String, u64>,
    #[serde(default)]
    pub last_24_hours: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationCode {
    pub id: AuthorizationCodeId,
    pub code: String,
    pub operation: String,
    pub entity_type: String,
    pub entity_id: i64,
    #[serde(default)]
    pub justificacion: Option<String>,
    pub status: String,
    pub requested_by: UserId,
    #[serde(default)]
    pub requested_by_username: Option<String>,
    #[serde(default)]
    pub approved_by: Option<UserId>,
    #[serde(default)]
    pub approved_at: Option<Timestamp>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub tipo: String,
    pub prioridad: String,
    pub mensaje: String,
    #[serde(default)]
    pub record_id: Option<RecordId>,
    pub leida: bool,
    pub fecha_creacion: Timestamp,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertDashboard {
    pub total: u64,
    pub unread: u64,
    pub critical: u64,
    #[serde(default)]
    pub recent: Vec<Alert>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maintenance {
    pub id: MaintenanceId,
    pub record_id: RecordId,
    pub fecha_mantenimiento: Date,
    pub descripcion: String,
    #[serde(default)]
    pub estado_anterior: Option<String>,
    #[serde(default)]
    pub estado_nuevo: Option<String>,
    #[serde(default)]
    pub usuario_id: Option<UserId>,
    pub created_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_joins_validation_messages() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"statusCode":400,"message":["codigo is required","cliente is required"],"error":"Bad Request"}"#,
        )
        .unwrap();
        assert_eq!(
            body.message.unwrap().joined(),
            "codigo is required, cliente is required"
        );
    }

    #[test]
    fn login_response_reads_camel_case_flag() {
        let response: LoginResponse = serde_json::from_str(
            r#"{
                "access_token": "t",
                "needsPasswordChange": true,
                "user": {
                    "id": 1, "username": "admin", "email": "a@b.c",
                    "role": "ADMIN", "created_at": "2025-01-01T00:00:00Z"
                }
            }"#,
        )
        .unwrap();
        assert!(response.needs_password_change);
        assert!(response.user.is_active);
        assert_eq!(response.user.nombre, None);
    }
}
