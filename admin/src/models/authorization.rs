use jiff::Timestamp;
use payloads::{requests, responses};

use super::{require, validated, wire_enum};
use crate::error::AdminError;

wire_enum!(RequestStatus {
    Pending => "pending", "Pendiente",
    Approved => "approved", "Aprobada",
    Rejected => "rejected", "Rechazada",
    Expired => "expired", "Expirada",
});

wire_enum!(RequestedOperation {
    Delete => "DELETE", "Eliminar",
    Update => "UPDATE", "Modificar",
});

pub const JUSTIFICATION_MIN_LEN: usize = 10;

/// A request for authorization to run a restricted operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub id: String,
    pub code: String,
    pub operation: RequestedOperation,
    pub entity_type: String,
    pub entity_id: String,
    pub justificacion: Option<String>,
    pub status: RequestStatus,
    pub requested_by: String,
    pub requested_by_username: Option<String>,
    pub approved_by: Option<String>,
    pub approved_at: Option<Timestamp>,
    pub rejection_reason: Option<String>,
    pub expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl From<responses::AuthorizationCode> for AuthorizationRequest {
    fn from(code: responses::AuthorizationCode) -> Self {
        Self {
            id: code.id.to_string(),
            code: code.code,
            operation: RequestedOperation::from_backend(&code.operation),
            entity_type: code.entity_type,
            entity_id: code.entity_id.to_string(),
            justificacion: code.justificacion,
            status: RequestStatus::from_backend(&code.status),
            requested_by: code.requested_by.to_string(),
            requested_by_username: code.requested_by_username,
            approved_by: code.approved_by.map(|id| id.to_string()),
            approved_at: code.approved_at,
            rejection_reason: code.rejection_reason,
            expires_at: code.expires_at,
            created_at: code.created_at,
        }
    }
}

impl AuthorizationRequest {
    /// Pending and not past its expiry at `now`.
    pub fn is_actionable_at(&self, now: Timestamp) -> bool {
        self.status == RequestStatus::Pending
            && self.expires_at.is_none_or(|expires| now < expires)
    }

    pub fn requester(&self) -> &str {
        self.requested_by_username
            .as_deref()
            .unwrap_or(&self.requested_by)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationForm {
    pub operation: RequestedOperation,
    pub entity_type: String,
    pub entity_id: String,
    pub justificacion: String,
}

impl AuthorizationForm {
    pub fn to_request(
        &self,
    ) -> Result<requests::GenerateAuthorizationCode, AdminError> {
        let mut problems = Vec::new();
        require(&mut problems, "El tipo de entidad", &self.entity_type);
        let entity_id = self.entity_id.trim().parse::<i64>();
        if entity_id.is_err() {
            problems
                .push(format!("Identificador inválido: {}", self.entity_id));
        }
        if self.justificacion.trim().chars().count() < JUSTIFICATION_MIN_LEN {
            problems.push(format!(
                "La justificación debe tener al menos {JUSTIFICATION_MIN_LEN} \
                 caracteres"
            ));
        }
        validated(problems, || requests::GenerateAuthorizationCode {
            operation: self.operation.to_backend(),
            entity_type: self.entity_type.trim().to_string(),
            entity_id: entity_id.unwrap_or_default(),
            justificacion: self.justificacion.trim().to_string(),
        })
    }
}

pub fn rejection(
    reason: &str,
) -> Result<requests::RejectAuthorizationCode, AdminError> {
    let mut problems = Vec::new();
    require(&mut problems, "El motivo de rechazo", reason);
    validated(problems, || requests::RejectAuthorizationCode {
        reason: reason.trim().to_string(),
    })
}
