use jiff::Timestamp;
use jiff::civil::Date;
use payloads::{RecordId, requests, responses};

use super::{RecordStatus, parse_id, require};
use crate::error::AdminError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maintenance {
    pub id: String,
    pub record_id: String,
    pub fecha: Date,
    pub descripcion: String,
    pub estado_anterior: Option<RecordStatus>,
    pub estado_nuevo: Option<RecordStatus>,
    pub usuario_id: Option<String>,
    pub created_at: Timestamp,
}

impl From<responses::Maintenance> for Maintenance {
    fn from(entry: responses::Maintenance) -> Self {
        Self {
            id: entry.id.to_string(),
            record_id: entry.record_id.to_string(),
            fecha: entry.fecha_mantenimiento,
            descripcion: entry.descripcion,
            estado_anterior: entry
                .estado_anterior
                .as_deref()
                .map(RecordStatus::from_backend),
            estado_nuevo: entry
                .estado_nuevo
                .as_deref()
                .map(RecordStatus::from_backend),
            usuario_id: entry.usuario_id.map(|id| id.to_string()),
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenanceForm {
    pub record_id: String,
    pub fecha: Option<Date>,
    pub descripcion: String,
    /// Status to move the línea de vida to, if any.
    pub estado_nuevo: Option<RecordStatus>,
}

impl MaintenanceForm {
    pub fn to_request(
        &self,
    ) -> Result<requests::CreateMaintenance, AdminError> {
        let mut problems = Vec::new();
        require(&mut problems, "La descripción", &self.descripcion);
        let Some(fecha) = self.fecha else {
            problems
                .push("La fecha de mantenimiento es requerida".to_string());
            return Err(AdminError::Validation(problems));
        };
        if !problems.is_empty() {
            return Err(AdminError::Validation(problems));
        }
        let record_id: RecordId = parse_id("Línea de vida", &self.record_id)?;
        Ok(requests::CreateMaintenance {
            record_id,
            fecha_mantenimiento: fecha,
            descripcion: self.descripcion.trim().to_string(),
            estado_nuevo: self.estado_nuevo.as_ref().map(|e| e.to_backend()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_change_is_sent_in_backend_form() {
        let form = MaintenanceForm {
            record_id: "7".into(),
            fecha: Some(Date::constant(2025, 4, 1)),
            descripcion: "Inspección semestral".into(),
            estado_nuevo: Some(RecordStatus::Mantenimiento),
        };
        let request = form.to_request().unwrap();
        assert_eq!(request.record_id, RecordId(7));
        assert_eq!(request.estado_nuevo.as_deref(), Some("mantenimiento"));
    }

    #[test]
    fn missing_date_is_reported() {
        let form = MaintenanceForm {
            record_id: "7".into(),
            ..Default::default()
        };
        let Err(AdminError::Validation(problems)) = form.to_request() else {
            panic!("expected validation error");
        };
        assert_eq!(problems.len(), 2);
    }
}
