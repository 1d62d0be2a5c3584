//! Text components for the terminal front end.

pub mod data_table;
pub mod pagination_controls;

pub use data_table::{Column, DataTable, SortState};
pub use pagination_controls::{PaginationControls, page_window};
