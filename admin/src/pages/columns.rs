//! Column sets for each listing. Keys double as the backend `sortBy`
//! field for sortable columns.

use jiff::Timestamp;

use crate::components::Column;
use crate::models::{
    Accident, Alert, AuthorizationRequest, Maintenance, Movement,
    PurchaseOrder, Record, Severity, User,
};

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

fn yes_no(flag: bool) -> String {
    let label = if flag { "Sí" } else { "No" };
    label.to_string()
}

fn moment(timestamp: &Timestamp) -> String {
    timestamp.strftime("%Y-%m-%d %H:%M").to_string()
}

pub fn records() -> Vec<Column<Record>> {
    vec![
        Column::new("id", "ID", |r: &Record| r.id.clone()),
        Column::new("codigo", "Código", |r: &Record| r.codigo.clone())
            .sortable(),
        Column::new("cliente", "Cliente", |r: &Record| r.cliente.clone())
            .sortable()
            .max_width(24),
        Column::new("ubicacion", "Ubicación", |r: &Record| {
            r.ubicacion.clone()
        })
        .max_width(24),
        Column::new("tipo_linea", "Tipo", |r: &Record| {
            r.tipo_linea.to_string()
        }),
        Column::new("fecha_caducidad", "Caducidad", |r: &Record| {
            r.fecha_caducidad
                .map(|fecha| fecha.to_string())
                .unwrap_or_else(|| "-".to_string())
        })
        .sortable(),
        Column::new("estado_actual", "Estado", |r: &Record| {
            r.estado.to_string()
        })
        .sortable(),
    ]
}

pub fn users() -> Vec<Column<User>> {
    vec![
        Column::new("id", "ID", |u: &User| u.id.clone()),
        Column::new("username", "Usuario", |u: &User| u.username.clone())
            .sortable(),
        Column::new("nombre", "Nombre", |u: &User| u.nombre.clone())
            .sortable(),
        Column::new("email", "Correo", |u: &User| u.email.clone()),
        Column::new("role", "Rol", |u: &User| u.role.label().to_string())
            .sortable(),
        Column::new("is_active", "Activo", |u: &User| {
            yes_no(u.is_active)
        }),
    ]
}

pub fn accidents() -> Vec<Column<Accident>> {
    vec![
        Column::new("id", "ID", |a: &Accident| a.id.clone()),
        Column::new("fecha_accidente", "Fecha", |a: &Accident| {
            a.fecha.to_string()
        })
        .sortable(),
        Column::new("linea_vida", "Línea de vida", |a: &Accident| {
            a.record_codigo.clone().unwrap_or_else(|| a.record_id.clone())
        }),
        Column::new("severidad", "Severidad", |a: &Accident| {
            a.severidad.to_string()
        })
        .sortable()
        .render(|value, accident| match accident.severidad {
            Severity::Grave | Severity::Fatal => format!("{value} !"),
            _ => value.to_string(),
        }),
        Column::new("estado", "Estado", |a: &Accident| a.estado.to_string())
            .sortable(),
        Column::new("descripcion", "Descripción", |a: &Accident| {
            a.descripcion.clone()
        })
        .max_width(40),
    ]
}

pub fn movements() -> Vec<Column<Movement>> {
    vec![
        Column::new("action_date", "Fecha", |m: &Movement| {
            moment(&m.action_date)
        })
        .sortable(),
        Column::new("action", "Acción", |m: &Movement| m.action.to_string())
            .sortable(),
        Column::new("record_code", "Línea de vida", |m: &Movement| {
            or_dash(m.record_code.as_deref())
        }),
        Column::new("username", "Usuario", |m: &Movement| {
            or_dash(m.username.as_deref())
        })
        .sortable(),
        Column::new("changes", "Cambios", |m: &Movement| {
            let summary = m.summary();
            if summary.is_empty() {
                or_dash(m.description.as_deref())
            } else {
                summary
            }
        })
        .max_width(48),
    ]
}

pub fn authorization_requests() -> Vec<Column<AuthorizationRequest>> {
    vec![
        Column::new("id", "ID", |r: &AuthorizationRequest| r.id.clone()),
        Column::new("code", "Código", |r: &AuthorizationRequest| {
            r.code.clone()
        }),
        Column::new("operation", "Operación", |r: &AuthorizationRequest| {
            r.operation.to_string()
        }),
        Column::new("entity", "Entidad", |r: &AuthorizationRequest| {
            format!("{} #{}", r.entity_type, r.entity_id)
        }),
        Column::new(
            "requested_by",
            "Solicitante",
            |r: &AuthorizationRequest| r.requester().to_string(),
        ),
        Column::new("status", "Estado", |r: &AuthorizationRequest| {
            r.status.to_string()
        })
        .sortable(),
        Column::new("created_at", "Creada", |r: &AuthorizationRequest| {
            moment(&r.created_at)
        })
        .sortable(),
    ]
}

pub fn purchase_orders() -> Vec<Column<PurchaseOrder>> {
    vec![
        Column::new("numero", "Número", |o: &PurchaseOrder| o.numero.clone())
            .sortable(),
        Column::new("estado", "Estado", |o: &PurchaseOrder| {
            o.estado.to_string()
        })
        .sortable(),
        Column::new("fecha_realizacion", "Fecha", |o: &PurchaseOrder| {
            o.fecha_realizacion.to_string()
        })
        .sortable(),
        Column::new("proveedor", "Proveedor", |o: &PurchaseOrder| {
            or_dash(o.proveedor.as_deref())
        }),
        Column::new("monto_total", "Monto", PurchaseOrder::monto_display),
        Column::new("records", "Líneas", |o: &PurchaseOrder| {
            o.records
                .iter()
                .map(|record| record.codigo.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        }),
    ]
}

pub fn alerts() -> Vec<Column<Alert>> {
    vec![
        Column::new("id", "ID", |a: &Alert| a.id.clone()),
        Column::new("prioridad", "Prioridad", |a: &Alert| {
            a.prioridad.to_string()
        })
        .sortable(),
        Column::new("mensaje", "Mensaje", |a: &Alert| a.mensaje.clone())
            .max_width(48),
        Column::new("leida", "Leída", |a: &Alert| {
            yes_no(a.leida)
        }),
        Column::new("fecha_creacion", "Fecha", |a: &Alert| {
            moment(&a.fecha_creacion)
        })
        .sortable(),
    ]
}

pub fn maintenance() -> Vec<Column<Maintenance>> {
    vec![
        Column::new("fecha_mantenimiento", "Fecha", |m: &Maintenance| {
            m.fecha.to_string()
        })
        .sortable(),
        Column::new("record_id", "Línea de vida", |m: &Maintenance| {
            m.record_id.clone()
        }),
        Column::new("descripcion", "Descripción", |m: &Maintenance| {
            m.descripcion.clone()
        })
        .max_width(40),
    ]
}
