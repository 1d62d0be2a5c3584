//! In-memory backend state.
//!
//! Every table lives behind one mutex; handlers take the lock for the
//! duration of a single operation. Alongside the data the store keeps a
//! log of every request it served and a list of injected faults, which is
//! what the integration tests inspect and drive.

pub mod listing;

use jiff::Timestamp;
use jiff::civil::Date;
use payloads::{
    AccidentId, AlertId, AuthorizationCodeId, MaintenanceId, MovementId,
    PurchaseOrderId, RecordId, UserId, responses,
};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

pub use listing::{ListParams, list};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub authorization: Option<String>,
}

/// A canned misbehaviour for requests whose path starts with `path`.
#[derive(Debug, Clone)]
pub struct Fault {
    pub method: Option<String>,
    pub path: String,
    /// Respond with this status instead of running the handler.
    pub status: Option<u16>,
    /// Sleep before responding (or before running the handler).
    pub delay: Option<Duration>,
    /// How many matching requests this fault applies to.
    pub remaining: u32,
    pub message: String,
}

impl Fault {
    pub fn status(path: &str, status: u16, times: u32) -> Self {
        Self {
            method: None,
            path: path.to_string(),
            status: Some(status),
            delay: None,
            remaining: times,
            message: format!("Injected failure ({status})"),
        }
    }

    pub fn delay(path: &str, delay: Duration, times: u32) -> Self {
        Self {
            method: None,
            path: path.to_string(),
            status: None,
            delay: Some(delay),
            remaining: times,
            message: String::new(),
        }
    }

    pub fn for_method(mut self, method: &str) -> Self {
        self.method = Some(method.to_ascii_uppercase());
        self
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = message.to_string();
        self
    }

    fn matches(&self, method: &str, path: &str) -> bool {
        self.remaining > 0
            && path.starts_with(&self.path)
            && self.method.as_deref().is_none_or(|m| m == method)
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub user: responses::User,
    pub password: String,
}

#[derive(Debug, Default)]
pub struct Tables {
    next_id: i64,
    pub accounts: Vec<Account>,
    pub tokens: HashMap<String, UserId>,
    pub records: Vec<responses::Record>,
    pub accidents: Vec<responses::Accident>,
    pub purchase_orders: Vec<responses::PurchaseOrder>,
    pub movements: Vec<responses::MovementHistoryEntry>,
    pub authorization_codes: Vec<responses::AuthorizationCode>,
    pub alerts: Vec<responses::Alert>,
    pub maintenance: Vec<responses::Maintenance>,
}

impl Tables {
    pub fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn user(&self, id: UserId) -> Option<&responses::User> {
        self.accounts.iter().map(|a| &a.user).find(|u| u.id == id)
    }

    pub fn record(&self, id: RecordId) -> Option<&responses::Record> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn record_summary(
        &self,
        id: RecordId,
    ) -> Option<responses::RecordSummary> {
        self.record(id).map(|r| responses::RecordSummary {
            id: r.id,
            codigo: r.codigo.clone(),
            cliente: r.cliente.clone(),
            ubicacion: r.ubicacion.clone(),
        })
    }

    pub fn add_account(
        &mut self,
        username: &str,
        password: &str,
        role: &str,
        nombre: &str,
    ) -> UserId {
        let id = UserId(self.next_id());
        self.accounts.push(Account {
            user: responses::User {
                id,
                username: username.to_string(),
                email: format!("{username}@ayniline.test"),
                nombre: Some(nombre.to_string()),
                role: role.to_string(),
                empresa: Some("AyniLine".to_string()),
                telefono: None,
                cargo: None,
                is_active: true,
                must_change_password: false,
                last_login: None,
                created_at: Timestamp::now(),
            },
            password: password.to_string(),
        });
        id
    }

    /// Append a movement history entry for a record change.
    pub fn log_movement(
        &mut self,
        record: &responses::Record,
        action: &str,
        user: Option<&responses::User>,
        previous_values: Option<serde_json::Value>,
        new_values: Option<serde_json::Value>,
    ) {
        let id = MovementId(self.next_id());
        let changed_field = match (&previous_values, &new_values) {
            (Some(serde_json::Value::Object(before)), Some(_))
                if before.len() == 1 =>
            {
                before.keys().next().cloned()
            }
            _ => None,
        };
        self.movements.push(responses::MovementHistoryEntry {
            id,
            record_id: Some(record.id),
            record_code: Some(record.codigo.clone()),
            action: action.to_string(),
            action_date: Timestamp::now(),
            description: Some(format!("{action} {}", record.codigo)),
            changed_field,
            previous_values,
            new_values,
            user_id: user.map(|u| u.id),
            username: user.map(|u| u.username.clone()),
            ip_address: Some("127.0.0.1".to_string()),
        });
    }
}

pub struct Store {
    tables: Mutex<Tables>,
    faults: Mutex<Vec<Fault>>,
    requests: Mutex<Vec<LoggedRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// A store with the three standard accounts and nothing else.
    pub fn new() -> Self {
        let mut tables = Tables::default();
        tables.add_account("admin", "admin123", "ADMIN", "Administrador");
        tables.add_account(
            "supervisor",
            "super123",
            "SUPERVISOR",
            "Supervisora de planta",
        );
        tables.add_account("tecnico", "tecnico123", "TECNICO", "Técnico");
        Self {
            tables: Mutex::new(tables),
            faults: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        f(&mut lock(&self.tables))
    }

    pub fn inject(&self, fault: Fault) {
        lock(&self.faults).push(fault);
    }

    pub fn clear_faults(&self) {
        lock(&self.faults).clear();
    }

    /// Consume one use of the first fault matching the request, if any.
    pub fn take_fault(&self, method: &str, path: &str) -> Option<Fault> {
        let mut faults = lock(&self.faults);
        let fault = faults.iter_mut().find(|f| f.matches(method, path))?;
        fault.remaining -= 1;
        Some(fault.clone())
    }

    pub fn log_request(&self, request: LoggedRequest) {
        lock(&self.requests).push(request);
    }

    pub fn requests(&self) -> Vec<LoggedRequest> {
        lock(&self.requests).clone()
    }

    /// Requests whose path equals `path` exactly.
    pub fn requests_to(&self, path: &str) -> Vec<LoggedRequest> {
        lock(&self.requests)
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    pub fn clear_requests(&self) {
        lock(&self.requests).clear();
    }

    /// Mark an account as having to change its password on next login.
    pub fn require_password_change(&self, username: &str) {
        self.with(|t| {
            if let Some(account) =
                t.accounts.iter_mut().find(|a| a.user.username == username)
            {
                account.user.must_change_password = true;
            }
        });
    }

    /// Forget every issued token, as if they all expired.
    pub fn expire_tokens(&self) {
        self.with(|t| t.tokens.clear());
    }

    /// Insert `count` records with codes `LV-001`, `LV-002`, ...
    pub fn seed_records(&self, count: usize) -> Vec<RecordId> {
        self.with(|t| {
            (1..=count)
                .map(|n| {
                    let id = RecordId(t.next_id());
                    let installed = Date::constant(2023, 1, 1)
                        .saturating_add(jiff::Span::new().days(n as i64));
                    t.records.push(responses::Record {
                        id,
                        codigo: format!("LV-{n:03}"),
                        cliente: format!("Cliente {}", (n - 1) % 5 + 1),
                        equipo: "Línea horizontal".to_string(),
                        fv_anios: 5,
                        fv_meses: 0,
                        fecha_instalacion: installed,
                        fecha_caducidad: Some(
                            installed
                                .saturating_add(jiff::Span::new().years(5)),
                        ),
                        estado_actual: if n % 4 == 0 {
                            "vencido".to_string()
                        } else {
                            "activo".to_string()
                        },
                        tipo_linea: "horizontal".to_string(),
                        ubicacion: format!("Nave {}", n % 3 + 1),
                        seec: None,
                        anclaje_equipos: None,
                        created_at: Timestamp::now(),
                        updated_at: Timestamp::now(),
                    });
                    id
                })
                .collect()
        })
    }

    pub fn seed_accident(
        &self,
        record_id: RecordId,
        severidad: &str,
        estado: &str,
    ) -> AccidentId {
        self.with(|t| {
            let id = AccidentId(t.next_id());
            let linea_vida = t.record_summary(record_id);
            t.accidents.push(responses::Accident {
                id,
                linea_vida_id: record_id,
                fecha_accidente: Date::constant(2024, 6, 15),
                descripcion_incidente: "Caída de altura contenida".to_string(),
                persona_involucrada: Some("Operario".to_string()),
                acciones_correctivas: None,
                evidencias_urls: Vec::new(),
                estado: estado.to_string(),
                severidad: severidad.to_string(),
                reportado_por: None,
                fecha_creacion: Timestamp::now(),
                linea_vida,
            });
            id
        })
    }

    pub fn seed_alert(
        &self,
        record_id: Option<RecordId>,
        prioridad: &str,
        leida: bool,
    ) -> AlertId {
        self.with(|t| {
            let id = AlertId(t.next_id());
            t.alerts.push(responses::Alert {
                id,
                tipo: "caducidad".to_string(),
                prioridad: prioridad.to_string(),
                mensaje: "Línea de vida próxima a caducar".to_string(),
                record_id,
                leida,
                fecha_creacion: Timestamp::now(),
            });
            id
        })
    }

    pub fn seed_purchase_order(&self, numero: &str) -> PurchaseOrderId {
        self.with(|t| {
            let id = PurchaseOrderId(t.next_id());
            t.purchase_orders.push(responses::PurchaseOrder {
                id,
                numero: numero.to_string(),
                estado: "pendiente".to_string(),
                fecha_realizacion: Date::constant(2024, 3, 1),
                fecha_entrega: None,
                proveedor: Some("Proveedor Andino".to_string()),
                descripcion: None,
                monto_total: Some(rust_decimal::Decimal::new(125050, 2)),
                records: Vec::new(),
                created_at: Timestamp::now(),
            });
            id
        })
    }

    pub fn authorization_code(
        &self,
        id: AuthorizationCodeId,
    ) -> Option<responses::AuthorizationCode> {
        self.with(|t| {
            t.authorization_codes.iter().find(|c| c.id == id).cloned()
        })
    }

    pub fn maintenance_for(&self, record_id: RecordId) -> Vec<MaintenanceId> {
        self.with(|t| {
            t.maintenance
                .iter()
                .filter(|m| m.record_id == record_id)
                .map(|m| m.id)
                .collect()
        })
    }
}
