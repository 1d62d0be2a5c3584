use jiff::Timestamp;
use jiff::civil::Date;
use payloads::{RecordId, requests, responses};

use super::{changed, optional, parse_id, validated, wire_enum};
use crate::error::AdminError;

wire_enum!(Severity {
    Leve => "LEVE", "Leve",
    Moderado => "MODERADO", "Moderado",
    Grave => "GRAVE", "Grave",
    Fatal => "FATAL", "Fatal",
});

wire_enum!(AccidentStatus {
    Reportado => "REPORTADO", "Reportado",
    EnInvestigacion => "EN_INVESTIGACION", "En investigación",
    Resuelto => "RESUELTO", "Resuelto",
    Cerrado => "CERRADO", "Cerrado",
});

pub const DESCRIPTION_MIN_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accident {
    pub id: String,
    pub record_id: String,
    /// Código of the línea de vida, when the backend embedded it.
    pub record_codigo: Option<String>,
    pub fecha: Date,
    pub descripcion: String,
    pub persona_involucrada: Option<String>,
    pub acciones_correctivas: Option<String>,
    pub evidencias: Vec<String>,
    pub estado: AccidentStatus,
    pub severidad: Severity,
    pub reportado_por: Option<String>,
    pub fecha_creacion: Timestamp,
}

impl From<responses::Accident> for Accident {
    fn from(accident: responses::Accident) -> Self {
        Self {
            id: accident.id.to_string(),
            record_id: accident.linea_vida_id.to_string(),
            record_codigo: accident.linea_vida.map(|record| record.codigo),
            fecha: accident.fecha_accidente,
            descripcion: accident.descripcion_incidente,
            persona_involucrada: accident.persona_involucrada,
            acciones_correctivas: accident.acciones_correctivas,
            evidencias: accident.evidencias_urls,
            estado: AccidentStatus::from_backend(&accident.estado),
            severidad: Severity::from_backend(&accident.severidad),
            reportado_por: accident.reportado_por.map(|id| id.to_string()),
            fecha_creacion: accident.fecha_creacion,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccidentStatistics {
    pub total: u64,
    pub por_estado: Vec<(AccidentStatus, u64)>,
    pub por_severidad: Vec<(Severity, u64)>,
    pub ultimo_mes: u64,
}

impl From<responses::AccidentStatistics> for AccidentStatistics {
    fn from(stats: responses::AccidentStatistics) -> Self {
        Self {
            total: stats.total,
            por_estado: stats
                .por_estado
                .iter()
                .map(|(estado, n)| (AccidentStatus::from_backend(estado), *n))
                .collect(),
            por_severidad: stats
                .por_severidad
                .iter()
                .map(|(severidad, n)| (Severity::from_backend(severidad), *n))
                .collect(),
            ultimo_mes: stats.ultimo_mes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccidentForm {
    pub record_id: String,
    pub fecha: Option<Date>,
    pub descripcion: String,
    pub severidad: Severity,
    pub estado: AccidentStatus,
    pub persona_involucrada: String,
    pub acciones_correctivas: String,
    pub evidencias_urls: Vec<String>,
}

impl Default for AccidentForm {
    fn default() -> Self {
        Self {
            record_id: String::new(),
            fecha: None,
            descripcion: String::new(),
            severidad: Severity::Leve,
            estado: AccidentStatus::Reportado,
            persona_involucrada: String::new(),
            acciones_correctivas: String::new(),
            evidencias_urls: Vec::new(),
        }
    }
}

impl AccidentForm {
    pub fn from_accident(accident: &Accident) -> Self {
        Self {
            record_id: accident.record_id.clone(),
            fecha: Some(accident.fecha),
            descripcion: accident.descripcion.clone(),
            severidad: accident.severidad.clone(),
            estado: accident.estado.clone(),
            persona_involucrada: accident
                .persona_involucrada
                .clone()
                .unwrap_or_default(),
            acciones_correctivas: accident
                .acciones_correctivas
                .clone()
                .unwrap_or_default(),
            evidencias_urls: accident.evidencias.clone(),
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.record_id.trim().is_empty() {
            problems.push("Debe seleccionar una línea de vida".to_string());
        }
        if self.fecha.is_none() {
            problems.push("La fecha del accidente es requerida".to_string());
        }
        if self.descripcion.trim().chars().count() < DESCRIPTION_MIN_LEN {
            problems.push(format!(
                "La descripción debe tener al menos {DESCRIPTION_MIN_LEN} \
                 caracteres"
            ));
        }
        if let Severity::Other(value) = &self.severidad {
            problems.push(format!("Severidad desconocida: {value}"));
        }
        problems
    }

    pub fn to_create(&self) -> Result<requests::CreateAccident, AdminError> {
        let problems = self.validate();
        let Some(fecha) = self.fecha.filter(|_| problems.is_empty()) else {
            return Err(AdminError::Validation(problems));
        };
        let linea_vida_id: RecordId =
            parse_id("Línea de vida", &self.record_id)?;
        validated(problems, || requests::CreateAccident {
            linea_vida_id,
            fecha_accidente: fecha,
            descripcion_incidente: self.descripcion.trim().to_string(),
            severidad: self.severidad.to_backend(),
            persona_involucrada: optional(&self.persona_involucrada),
            acciones_correctivas: optional(&self.acciones_correctivas),
            evidencias_urls: self.evidencias_urls.clone(),
        })
    }

    pub fn to_update(
        &self,
        original: &Accident,
    ) -> Result<requests::UpdateAccident, AdminError> {
        let problems = self.validate();
        validated(problems, || requests::UpdateAccident {
            fecha_accidente: self
                .fecha
                .and_then(|fecha| changed(&original.fecha, fecha)),
            descripcion_incidente: changed(
                &original.descripcion,
                self.descripcion.trim().to_string(),
            ),
            severidad: changed(&original.severidad, self.severidad.clone())
                .map(|severidad| severidad.to_backend()),
            estado: changed(&original.estado, self.estado.clone())
                .map(|estado| estado.to_backend()),
            persona_involucrada: changed(
                &original.persona_involucrada,
                optional(&self.persona_involucrada),
            )
            .flatten(),
            acciones_correctivas: changed(
                &original.acciones_correctivas,
                optional(&self.acciones_correctivas),
            )
            .flatten(),
        })
    }
}
