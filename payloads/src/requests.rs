use crate::RecordId;
use jiff::civil::Date;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const USERNAME_MIN_LEN: usize = 3;
pub const PASSWORD_MIN_LEN: usize = 6;

pub const USERNAME_REQUIRED: &str = "El usuario es requerido";
pub const USERNAME_TOO_SHORT: &str =
    "El usuario debe tener al menos 3 caracteres";
pub const PASSWORD_REQUIRED: &str = "La contraseña es requerida";
pub const PASSWORD_TOO_SHORT: &str =
    "La contraseña debe tener al menos 6 caracteres";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

impl LoginCredentials {
    /// The credentials as they are validated and sent: the username
    /// without surrounding whitespace, the password untouched.
    pub fn normalized(&self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
        }
    }

    /// Client-side checks run before any request is sent.
    ///
    /// Returns every problem found, in field order.
    pub fn validate(&self) -> Vec<&'static str> {
        let mut problems = Vec::new();
        let username = self.username.trim();
        if username.is_empty() {
            problems.push(USERNAME_REQUIRED);
        } else if username.chars().count() < USERNAME_MIN_LEN {
            problems.push(USERNAME_TOO_SHORT);
        }
        if self.password.is_empty() {
            problems.push(PASSWORD_REQUIRED);
        } else if self.password.chars().count() < PASSWORD_MIN_LEN {
            problems.push(PASSWORD_TOO_SHORT);
        }
        problems
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRecord {
    pub codigo: String,
    pub cliente: String,
    pub equipo: String,
    pub fv_anios: i32,
    pub fv_meses: i32,
    pub fecha_instalacion: Date,
    pub fecha_caducidad: Date,
    pub estado_actual: String,
    pub tipo_linea: String,
    pub ubicacion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anclaje_equipos: Option<String>,
}

/// Partial update; absent fields are left untouched by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codigo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cliente: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fv_anios: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fv_meses: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_instalacion: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_caducidad: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado_actual: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo_linea: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ubicacion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anclaje_equipos: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub nombre: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empresa: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cargo: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empresa: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cargo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAccident {
    pub linea_vida_id: RecordId,
    pub fecha_accidente: Date,
    pub descripcion_incidente: String,
    pub severidad: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona_involucrada: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acciones_correctivas: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidencias_urls: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateAccident {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_accidente: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion_incidente: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severidad: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona_involucrada: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acciones_correctivas: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePurchaseOrder {
    pub numero: String,
    pub estado: String,
    pub fecha_realizacion: Date,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_entrega: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proveedor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monto_total: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub record_ids: Vec<RecordId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatePurchaseOrder {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_entrega: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proveedor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monto_total: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateAuthorizationCode {
    pub operation: String,
    pub entity_type: String,
    pub entity_id: i64,
    pub justificacion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectAuthorizationCode {
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMaintenance {
    pub record_id: RecordId,
    pub fecha_mantenimiento: Date,
    pub descripcion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado_nuevo: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(username: &str, password: &str) -> LoginCredentials {
        LoginCredentials {
            username: username.into(),
            password: password.into(),
        }
    }

    #[test]
    fn short_username_is_rejected() {
        let problems = credentials("ab", "x").validate();
        assert_eq!(problems, vec![USERNAME_TOO_SHORT, PASSWORD_TOO_SHORT]);
    }

    #[test]
    fn empty_fields_are_required() {
        let problems = credentials("   ", "").validate();
        assert_eq!(problems, vec![USERNAME_REQUIRED, PASSWORD_REQUIRED]);
    }

    #[test]
    fn valid_credentials_pass() {
        assert!(credentials("admin", "secreto123").validate().is_empty());
    }

    #[test]
    fn username_is_sent_as_validated() {
        let padded = credentials("  ab ", " secreto ");
        assert_eq!(padded.validate(), vec![USERNAME_TOO_SHORT]);
        let normalized = padded.normalized();
        assert_eq!(normalized.username, "ab");
        assert_eq!(normalized.password, " secreto ");
    }

    #[test]
    fn partial_update_omits_absent_fields() {
        let update = UpdateRecord {
            estado_actual: Some("vencido".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"estado_actual": "vencido"}));
    }
}
