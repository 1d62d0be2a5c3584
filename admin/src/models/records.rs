use jiff::civil::Date;
use jiff::{Span, Timestamp};
use payloads::{requests, responses};

use super::{changed, optional, require, validated, wire_enum};
use crate::error::AdminError;

wire_enum!(
    /// `estado_actual` of a línea de vida.
    RecordStatus {
        Activo => "activo", "Activo",
        Vencido => "vencido", "Vencido",
        Mantenimiento => "mantenimiento", "En mantenimiento",
        Inactivo => "inactivo", "Inactivo",
    }
);

wire_enum!(LineType {
    Vertical => "vertical", "Vertical",
    Horizontal => "horizontal", "Horizontal",
    Rigida => "rigida", "Rígida",
});

pub const MAX_VIDA_UTIL_ANIOS: i32 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    pub codigo: String,
    pub cliente: String,
    pub equipo: String,
    pub fv_anios: i32,
    pub fv_meses: i32,
    pub fecha_instalacion: Date,
    pub fecha_caducidad: Option<Date>,
    pub estado: RecordStatus,
    pub tipo_linea: LineType,
    pub ubicacion: String,
    pub seec: Option<String>,
    pub anclaje_equipos: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<responses::Record> for Record {
    fn from(record: responses::Record) -> Self {
        Self {
            id: record.id.to_string(),
            codigo: record.codigo,
            cliente: record.cliente,
            equipo: record.equipo,
            fv_anios: record.fv_anios,
            fv_meses: record.fv_meses,
            fecha_instalacion: record.fecha_instalacion,
            fecha_caducidad: record.fecha_caducidad,
            estado: RecordStatus::from_backend(&record.estado_actual),
            tipo_linea: LineType::from_backend(&record.tipo_linea),
            ubicacion: record.ubicacion,
            seec: record.seec,
            anclaje_equipos: record.anclaje_equipos,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl Record {
    /// Service life as `"2a 6m"`.
    pub fn vida_util(&self) -> String {
        format!("{}a {}m", self.fv_anios, self.fv_meses)
    }

    pub fn is_expired_on(&self, today: Date) -> bool {
        self.fecha_caducidad.is_some_and(|caducidad| caducidad < today)
    }
}

/// Create/edit form. Dates are `None` until the user picks one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordForm {
    pub codigo: String,
    pub cliente: String,
    pub equipo: String,
    pub fv_anios: i32,
    pub fv_meses: i32,
    pub fecha_instalacion: Option<Date>,
    pub estado: RecordStatus,
    pub tipo_linea: LineType,
    pub ubicacion: String,
    pub seec: String,
    pub anclaje_equipos: String,
}

impl Default for RecordForm {
    fn default() -> Self {
        Self {
            codigo: String::new(),
            cliente: String::new(),
            equipo: String::new(),
            fv_anios: 0,
            fv_meses: 0,
            fecha_instalacion: None,
            estado: RecordStatus::Activo,
            tipo_linea: LineType::Vertical,
            ubicacion: String::new(),
            seec: String::new(),
            anclaje_equipos: String::new(),
        }
    }
}

impl RecordForm {
    pub fn from_record(record: &Record) -> Self {
        Self {
            codigo: record.codigo.clone(),
            cliente: record.cliente.clone(),
            equipo: record.equipo.clone(),
            fv_anios: record.fv_anios,
            fv_meses: record.fv_meses,
            fecha_instalacion: Some(record.fecha_instalacion),
            estado: record.estado.clone(),
            tipo_linea: record.tipo_linea.clone(),
            ubicacion: record.ubicacion.clone(),
            seec: record.seec.clone().unwrap_or_default(),
            anclaje_equipos: record.anclaje_equipos.clone().unwrap_or_default(),
        }
    }

    /// Installation date plus the service life.
    pub fn fecha_caducidad(&self) -> Option<Date> {
        let instalacion = self.fecha_instalacion?;
        let vida = Span::new()
            .try_years(self.fv_anios)
            .and_then(|span| span.try_months(self.fv_meses))
            .ok()?;
        instalacion.checked_add(vida).ok()
    }

    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        require(&mut problems, "El código", &self.codigo);
        require(&mut problems, "El cliente", &self.cliente);
        require(&mut problems, "El equipo", &self.equipo);
        require(&mut problems, "La ubicación", &self.ubicacion);
        if !(0..=MAX_VIDA_UTIL_ANIOS).contains(&self.fv_anios) {
            problems.push(format!(
                "Los años de vida útil deben estar entre 0 y \
                 {MAX_VIDA_UTIL_ANIOS}"
            ));
        }
        if !(0..=11).contains(&self.fv_meses) {
            problems.push(
                "Los meses de vida útil deben estar entre 0 y 11".to_string(),
            );
        }
        if self.fv_anios == 0 && self.fv_meses == 0 {
            problems.push("La vida útil debe ser mayor a cero".to_string());
        }
        if self.fecha_instalacion.is_none() {
            problems.push("La fecha de instalación es requerida".to_string());
        }
        problems
    }

    pub fn to_create(&self) -> Result<requests::CreateRecord, AdminError> {
        let problems = self.validate();
        let caducidad = self.fecha_caducidad();
        match (self.fecha_instalacion, caducidad) {
            (Some(instalacion), Some(caducidad)) => {
                validated(problems, || requests::CreateRecord {
                    codigo: self.codigo.trim().to_string(),
                    cliente: self.cliente.trim().to_string(),
                    equipo: self.equipo.trim().to_string(),
                    fv_anios: self.fv_anios,
                    fv_meses: self.fv_meses,
                    fecha_instalacion: instalacion,
                    fecha_caducidad: caducidad,
                    estado_actual: self.estado.to_backend(),
                    tipo_linea: self.tipo_linea.to_backend(),
                    ubicacion: self.ubicacion.trim().to_string(),
                    seec: optional(&self.seec),
                    anclaje_equipos: optional(&self.anclaje_equipos),
                })
            }
            _ => Err(AdminError::Validation(problems)),
        }
    }

    /// Only the fields that differ from `original`.
    pub fn to_update(
        &self,
        original: &Record,
    ) -> Result<requests::UpdateRecord, AdminError> {
        let create = self.to_create()?;
        Ok(requests::UpdateRecord {
            codigo: changed(&original.codigo, create.codigo),
            cliente: changed(&original.cliente, create.cliente),
            equipo: changed(&original.equipo, create.equipo),
            fv_anios: changed(&original.fv_anios, create.fv_anios),
            fv_meses: changed(&original.fv_meses, create.fv_meses),
            fecha_instalacion: changed(
                &original.fecha_instalacion,
                create.fecha_instalacion,
            ),
            fecha_caducidad: changed(
                &original.fecha_caducidad,
                Some(create.fecha_caducidad),
            )
            .flatten(),
            estado_actual: changed(
                &original.estado.to_backend(),
                create.estado_actual,
            ),
            tipo_linea: changed(
                &original.tipo_linea.to_backend(),
                create.tipo_linea,
            ),
            ubicacion: changed(&original.ubicacion, create.ubicacion),
            seec: changed(&original.seec, create.seec).flatten(),
            anclaje_equipos: changed(
                &original.anclaje_equipos,
                create.anclaje_equipos,
            )
            .flatten(),
        })
    }
}
