//! One service per backend module.
//!
//! Services own a clone of the [`APIClient`], accept and return view
//! models, and turn client errors into the module's wording through
//! [`ErrorMessages`]. Ids arrive as the strings the views hold; a value
//! that does not parse is a validation error and nothing is sent.

use crate::error::{AdminError, ErrorMessages};
use payloads::{ClientError, Page};

pub mod accidents;
pub mod alerts;
pub mod authorization;
pub mod maintenance;
pub mod movement_history;
pub mod purchase_orders;
pub mod records;
pub mod users;

pub use accidents::AccidentsService;
pub use alerts::AlertsService;
pub use authorization::AuthorizationService;
pub use maintenance::MaintenanceService;
pub use movement_history::MovementHistoryService;
pub use purchase_orders::PurchaseOrdersService;
pub use records::RecordsService;
pub use users::UsersService;

/// Map a fetched page of backend rows into view models.
pub(crate) fn page_of<D, V: From<D>>(
    result: Result<Page<D>, ClientError>,
    messages: &ErrorMessages,
) -> Result<Page<V>, AdminError> {
    result.map(|page| page.map(V::from)).map_err(|e| messages.map(e))
}

/// Map a single backend row into its view model.
pub(crate) fn one<D, V: From<D>>(
    result: Result<D, ClientError>,
    messages: &ErrorMessages,
) -> Result<V, AdminError> {
    result.map(V::from).map_err(|e| messages.map(e))
}

pub(crate) fn many<D, V: From<D>>(
    result: Result<Vec<D>, ClientError>,
    messages: &ErrorMessages,
) -> Result<Vec<V>, AdminError> {
    result
        .map(|rows| rows.into_iter().map(V::from).collect())
        .map_err(|e| messages.map(e))
}
