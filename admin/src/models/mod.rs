//! View models: what the admin shows and edits.
//!
//! Backend payloads use numeric ids and free-form status strings. View
//! models use string ids and typed enums, with one pure mapping per
//! direction: `From<responses::X>` for reads, `XForm::to_create` /
//! `to_update` for writes.

use crate::error::AdminError;
use std::str::FromStr;

/// A status-like backend string with known values and a passthrough for
/// anything else.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => $wire:literal, $label:literal),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)*
            Other(String),
        }

        impl $name {
            pub const KNOWN: &[$name] = &[$($name::$variant),*];

            pub fn from_backend(value: &str) -> Self {
                let value = value.trim();
                $(
                    if value.eq_ignore_ascii_case($wire) {
                        return $name::$variant;
                    }
                )*
                $name::Other(value.to_string())
            }

            pub fn to_backend(&self) -> String {
                match self {
                    $($name::$variant => $wire.to_string(),)*
                    $name::Other(value) => value.clone(),
                }
            }

            pub fn label(&self) -> &str {
                match self {
                    $($name::$variant => $label,)*
                    $name::Other(value) => value,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(
                &self,
                f: &mut std::fmt::Formatter<'_>,
            ) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

pub(crate) use wire_enum;

pub mod accidents;
pub mod alerts;
pub mod authorization;
pub mod maintenance;
pub mod movement_history;
pub mod purchase_orders;
pub mod records;
pub mod users;

pub use accidents::{
    Accident, AccidentForm, AccidentStatistics, AccidentStatus, Severity,
};
pub use alerts::{Alert, AlertDashboard, AlertPriority};
pub use authorization::{
    AuthorizationForm, AuthorizationRequest, RequestStatus, RequestedOperation,
};
pub use maintenance::{Maintenance, MaintenanceForm};
pub use movement_history::{
    FieldChange, Movement, MovementAction, MovementStatistics,
};
pub use purchase_orders::{
    LinkedRecord, OrderStatus, PurchaseOrder, PurchaseOrderForm,
};
pub use records::{LineType, Record, RecordForm, RecordStatus};
pub use users::{Role, User, UserForm};

pub(crate) fn parse_id<I: FromStr>(
    label: &str,
    value: &str,
) -> Result<I, AdminError> {
    value.trim().parse().map_err(|_| {
        AdminError::validation(format!("{label} inválido: {value:?}"))
    })
}

/// Trimmed text, `None` when blank.
pub(crate) fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

pub(crate) fn require(problems: &mut Vec<String>, label: &str, value: &str) {
    if value.trim().is_empty() {
        problems.push(format!("{label} es requerido"));
    }
}

pub(crate) fn validated<T>(
    problems: Vec<String>,
    value: impl FnOnce() -> T,
) -> Result<T, AdminError> {
    if problems.is_empty() {
        Ok(value())
    } else {
        Err(AdminError::Validation(problems))
    }
}

/// `Some(new)` when it differs from `old`.
pub(crate) fn changed<T: PartialEq>(old: &T, new: T) -> Option<T> {
    (*old != new).then_some(new)
}
