//! Development dataset for the mock backend.
//!
//! Used by dev-server so the CLI has something to browse, and by tests that
//! want a populated backend. Records are seeded directly in the store; the
//! rest goes through the API so the movement history fills up the way it
//! would in production.

use crate::{TestApp, tecnico_credentials};
use anyhow::Result;
use jiff::civil::Date;
use payloads::{RecordId, requests, responses};
use rust_decimal::Decimal;

pub const RECORD_COUNT: usize = 47;

pub struct DevDataset {
    pub records: Vec<RecordId>,
    pub accidents: Vec<responses::Accident>,
    pub purchase_orders: Vec<responses::PurchaseOrder>,
    pub pending_requests: Vec<responses::AuthorizationCode>,
    pub unread_alerts: usize,
}

impl DevDataset {
    pub async fn create(app: &TestApp) -> Result<Self> {
        tracing::info!("Seeding {RECORD_COUNT} líneas de vida");
        let records = app.seed_records(RECORD_COUNT);

        let admin = app.new_client();
        admin.login(&crate::admin_credentials()).await?;

        tracing::info!("Registering accidents");
        let mut accidents = Vec::new();
        for (record_id, severidad) in records
            .iter()
            .step_by(9)
            .zip(["LEVE", "MODERADO", "GRAVE", "LEVE", "FATAL", "LEVE"])
        {
            let accident = admin
                .create_accident(&requests::CreateAccident {
                    linea_vida_id: *record_id,
                    fecha_accidente: Date::constant(2025, 2, 10),
                    descripcion_incidente: format!(
                        "Incidente en línea {record_id}"
                    ),
                    severidad: severidad.to_string(),
                    persona_involucrada: Some("Operario de turno".into()),
                    acciones_correctivas: None,
                    evidencias_urls: Vec::new(),
                })
                .await?;
            accidents.push(accident);
        }

        tracing::info!("Creating purchase orders");
        let mut purchase_orders = Vec::new();
        for (n, chunk) in records.chunks(12).take(3).enumerate() {
            let order = admin
                .create_purchase_order(&requests::CreatePurchaseOrder {
                    numero: format!("OC-2025-{:03}", n + 1),
                    estado: "pendiente".into(),
                    fecha_realizacion: Date::constant(2025, 3, 1),
                    fecha_entrega: None,
                    proveedor: Some("Seguridad Industrial SAC".into()),
                    descripcion: Some("Reposición de anclajes".into()),
                    monto_total: Some(Decimal::new(450_000 + n as i64, 2)),
                    record_ids: chunk.iter().take(3).copied().collect(),
                })
                .await?;
            purchase_orders.push(order);
        }

        tracing::info!("Recording maintenance and edits");
        for record_id in records.iter().take(5) {
            admin
                .create_maintenance(&requests::CreateMaintenance {
                    record_id: *record_id,
                    fecha_mantenimiento: Date::constant(2025, 4, 1),
                    descripcion: "Inspección semestral".into(),
                    estado_nuevo: Some("mantenimiento".into()),
                })
                .await?;
        }
        if let Some(record_id) = records.get(6) {
            admin
                .update_record(
                    *record_id,
                    &requests::UpdateRecord {
                        ubicacion: Some("Almacén central".into()),
                        ..Default::default()
                    },
                )
                .await?;
        }

        tracing::info!("Filing authorization requests");
        let tecnico = app.new_client();
        tecnico.login(&tecnico_credentials()).await?;
        let mut pending_requests = Vec::new();
        for record_id in records.iter().rev().take(3) {
            let code = tecnico
                .generate_authorization_code(
                    &requests::GenerateAuthorizationCode {
                        operation: "DELETE".into(),
                        entity_type: "record".into(),
                        entity_id: record_id.0,
                        justificacion: "Equipo dado de baja".into(),
                    },
                )
                .await?;
            pending_requests.push(code);
        }

        for (n, record_id) in records.iter().enumerate().take(8) {
            let prioridad = if n % 3 == 0 { "critica" } else { "media" };
            app.store.seed_alert(Some(*record_id), prioridad, n >= 6);
        }

        Ok(Self {
            records,
            accidents,
            purchase_orders,
            pending_requests,
            unread_alerts: 6,
        })
    }

    pub fn print_summary(&self) {
        tracing::info!("Available data:");
        tracing::info!("   {} líneas de vida", self.records.len());
        tracing::info!("   {} accidentes", self.accidents.len());
        for order in &self.purchase_orders {
            tracing::info!(
                "   orden {} con {} registros",
                order.numero,
                order.records.len()
            );
        }
        for code in &self.pending_requests {
            tracing::info!(
                "   solicitud {} ({} {} {}) pendiente",
                code.id,
                code.operation,
                code.entity_type,
                code.entity_id
            );
        }
        tracing::info!("   {} alertas sin leer", self.unread_alerts);
        tracing::info!("Accounts: admin/admin123, supervisor/super123, tecnico/tecnico123");
    }
}
