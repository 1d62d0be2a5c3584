use jiff::Timestamp;
use payloads::responses;

use super::wire_enum;

wire_enum!(AlertPriority {
    Baja => "baja", "Baja",
    Media => "media", "Media",
    Alta => "alta", "Alta",
    Critica => "critica", "Crítica",
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub id: String,
    pub tipo: String,
    pub prioridad: AlertPriority,
    pub mensaje: String,
    pub record_id: Option<String>,
    pub leida: bool,
    pub fecha_creacion: Timestamp,
}

impl From<responses::Alert> for Alert {
    fn from(alert: responses::Alert) -> Self {
        Self {
            id: alert.id.to_string(),
            tipo: alert.tipo,
            prioridad: AlertPriority::from_backend(&alert.prioridad),
            mensaje: alert.mensaje,
            record_id: alert.record_id.map(|id| id.to_string()),
            leida: alert.leida,
            fecha_creacion: alert.fecha_creacion,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertDashboard {
    pub total: u64,
    pub unread: u64,
    pub critical: u64,
    pub recent: Vec<Alert>,
}

impl From<responses::AlertDashboard> for AlertDashboard {
    fn from(dashboard: responses::AlertDashboard) -> Self {
        Self {
            total: dashboard.total,
            unread: dashboard.unread,
            critical: dashboard.critical,
            recent: dashboard.recent.into_iter().map(Alert::from).collect(),
        }
    }
}
