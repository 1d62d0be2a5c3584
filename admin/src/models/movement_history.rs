use jiff::Timestamp;
use payloads::responses;
use serde_json::Value;
use std::collections::BTreeSet;

use super::wire_enum;

wire_enum!(MovementAction {
    Create => "CREATE", "Creación",
    Update => "UPDATE", "Actualización",
    Delete => "DELETE", "Eliminación",
    StatusChange => "STATUS_CHANGE", "Cambio de estado",
    Maintenance => "MAINTENANCE", "Mantenimiento",
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: String,
    pub previous: Option<String>,
    pub new: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Movement {
    pub id: String,
    pub record_id: Option<String>,
    pub record_code: Option<String>,
    pub action: MovementAction,
    pub action_date: Timestamp,
    pub description: Option<String>,
    pub changes: Vec<FieldChange>,
    pub username: Option<String>,
    pub ip_address: Option<String>,
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn field(values: Option<&Value>, key: &str) -> Option<String> {
    values.and_then(|v| v.get(key)).and_then(text)
}

/// Per-field differences between two JSON objects, in key order.
pub fn field_changes(
    previous: Option<&Value>,
    new: Option<&Value>,
) -> Vec<FieldChange> {
    let keys: BTreeSet<&String> = [previous, new]
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .flat_map(|object| object.keys())
        .collect();
    keys.into_iter()
        .filter_map(|key| {
            let before = field(previous, key);
            let after = field(new, key);
            (before != after).then(|| FieldChange {
                field: key.clone(),
                previous: before,
                new: after,
            })
        })
        .collect()
}

impl From<responses::MovementHistoryEntry> for Movement {
    fn from(entry: responses::MovementHistoryEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            record_id: entry.record_id.map(|id| id.to_string()),
            record_code: entry.record_code,
            action: MovementAction::from_backend(&entry.action),
            action_date: entry.action_date,
            description: entry.description,
            changes: field_changes(
                entry.previous_values.as_ref(),
                entry.new_values.as_ref(),
            ),
            username: entry.username,
            ip_address: entry.ip_address,
        }
    }
}

impl Movement {
    /// `"estado_actual: activo → vencido"`, one change per entry.
    pub fn summary(&self) -> String {
        self.changes
            .iter()
            .map(|change| {
                format!(
                    "{}: {} → {}",
                    change.field,
                    change.previous.as_deref().unwrap_or("-"),
                    change.new.as_deref().unwrap_or("-"),
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementStatistics {
    pub total: u64,
    pub by_action: Vec<(MovementAction, u64)>,
    pub by_user: Vec<(String, u64)>,
    pub last_24_hours: u64,
}

impl From<responses::MovementStatistics> for MovementStatistics {
    fn from(stats: responses::MovementStatistics) -> Self {
        let mut by_user: Vec<_> = stats.by_user.into_iter().collect();
        by_user.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Self {
            total: stats.total_movements,
            by_action: stats
                .by_action
                .iter()
                .map(|(action, n)| (MovementAction::from_backend(action), *n))
                .collect(),
            by_user,
            last_24_hours: stats.last_24_hours,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn changes_skip_equal_fields() {
        let previous = json!({"estado_actual": "activo", "ubicacion": "Lima"});
        let new = json!({"estado_actual": "vencido", "ubicacion": "Lima"});
        let changes = field_changes(Some(&previous), Some(&new));
        assert_eq!(
            changes,
            vec![FieldChange {
                field: "estado_actual".into(),
                previous: Some("activo".into()),
                new: Some("vencido".into()),
            }]
        );
    }

    #[test]
    fn creation_lists_every_new_field() {
        let new = json!({"codigo": "LV-001", "fv_anios": 2, "seec": null});
        let changes = field_changes(None, Some(&new));
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].field, "codigo");
        assert_eq!(changes[1].new.as_deref(), Some("2"));
    }

    #[test]
    fn summary_joins_changes() {
        let movement = Movement {
            id: "1".into(),
            record_id: Some("3".into()),
            record_code: Some("LV-003".into()),
            action: MovementAction::from_backend("update"),
            action_date: "2025-01-01T00:00:00Z".parse().unwrap(),
            description: None,
            changes: field_changes(
                Some(&json!({"ubicacion": "Lima"})),
                Some(&json!({"ubicacion": "Cusco"})),
            ),
            username: Some("admin".into()),
            ip_address: None,
        };
        assert_eq!(movement.action, MovementAction::Update);
        assert_eq!(movement.summary(), "ubicacion: Lima → Cusco");
    }
}
