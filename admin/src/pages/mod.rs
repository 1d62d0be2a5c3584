//! Listing pages: a [`PaginatedFetch`] feeding a [`DataTable`].

use payloads::{ListQuery, Page, PageMeta, SortOrder};
use std::future::Future;

use crate::components::{Column, DataTable, SortState};
use crate::error::AdminError;
use crate::hooks::{AsyncOptions, FilterPatch, PaginatedFetch};
use crate::models::{
    Accident, Alert, AuthorizationRequest, Maintenance, Movement,
    PurchaseOrder, Record, User,
};
use crate::services::{
    AccidentsService, AlertsService, AuthorizationService, MaintenanceService,
    MovementHistoryService, PurchaseOrdersService, RecordsService,
    UsersService,
};

pub mod columns;

/// A page-number listing. Each navigation replaces the visible rows with
/// the fetched page; sorting and searching go back to page 1.
pub struct ListPage<T> {
    fetch: PaginatedFetch<T>,
    table: DataTable<T>,
}

impl<T> ListPage<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut>(
        fetch: F,
        initial: ListQuery,
        columns: Vec<Column<T>>,
    ) -> Self
    where
        F: Fn(ListQuery) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Page<T>, AdminError>> + Send + 'static,
    {
        let mut table = DataTable::new(columns);
        if let Some(column) = initial.sort_by.clone() {
            table.set_sort(Some(SortState {
                column,
                direction: initial.sort_order.unwrap_or(SortOrder::Asc),
            }));
        }
        Self {
            fetch: PaginatedFetch::new(fetch, initial, AsyncOptions::default()),
            table,
        }
    }

    pub fn with_empty_message(mut self, message: &str) -> Self {
        self.table = self.table.with_empty_message(message);
        self
    }

    /// Fetch with the current filters.
    pub async fn load(&mut self) -> Result<(), String> {
        let outcome = self.fetch.execute(FilterPatch::default()).await;
        self.settle(outcome)
    }

    pub async fn go_to_page(&mut self, page: u32) -> Result<(), String> {
        let outcome = self.fetch.go_to_page(page).await;
        self.settle(outcome)
    }

    pub async fn next_page(&mut self) -> Result<(), String> {
        let pagination = self.table.pagination().clone();
        if pagination.page >= pagination.total_pages {
            return Ok(());
        }
        self.go_to_page(pagination.page + 1).await
    }

    pub async fn previous_page(&mut self) -> Result<(), String> {
        let page = self.table.pagination().page;
        if page <= 1 {
            return Ok(());
        }
        self.go_to_page(page - 1).await
    }

    /// Toggle sorting on `key` and re-fetch from page 1. A column that is
    /// not sortable is ignored.
    pub async fn sort_by(&mut self, key: &str) -> Result<(), String> {
        let Some(sort) = self.table.toggle_sort(key) else {
            return Ok(());
        };
        let patch = FilterPatch::sort(sort.column, sort.direction);
        let outcome = self.fetch.update_filters(patch).await;
        self.settle(outcome)
    }

    pub async fn search(&mut self, text: &str) -> Result<(), String> {
        let patch = FilterPatch::search(text);
        let outcome = self.fetch.update_filters(patch).await;
        self.settle(outcome)
    }

    pub async fn filter(
        &mut self,
        key: &str,
        value: Option<&str>,
    ) -> Result<(), String> {
        let patch = match value {
            Some(value) => FilterPatch::default().with_param(key, value),
            None => FilterPatch::default().without_param(key),
        };
        let outcome = self.fetch.update_filters(patch).await;
        self.settle(outcome)
    }

    /// Copy the fetched page into the table. A discarded fetch leaves the
    /// table as it was.
    fn settle(
        &mut self,
        outcome: Option<Result<PageMeta, String>>,
    ) -> Result<(), String> {
        let state = self.fetch.state();
        self.table.set_loading(state.loading);
        match outcome {
            Some(Ok(_)) => {
                self.table.set_data(state.page_items);
                self.table.set_pagination(state.pagination);
                Ok(())
            }
            Some(Err(message)) => Err(message),
            None => Ok(()),
        }
    }

    pub fn table(&self) -> &DataTable<T> {
        &self.table
    }

    pub fn filters(&self) -> ListQuery {
        self.fetch.filters()
    }

    pub fn render(&self) -> String {
        self.table.render()
    }

    pub fn unmount(&self) {
        self.fetch.unmount();
    }
}

pub fn records(
    service: RecordsService,
    initial: ListQuery,
) -> ListPage<Record> {
    ListPage::new(
        move |query| {
            let service = service.clone();
            async move { service.list(&query).await }
        },
        initial,
        columns::records(),
    )
    .with_empty_message("No hay líneas de vida registradas")
}

pub fn users(service: UsersService, initial: ListQuery) -> ListPage<User> {
    ListPage::new(
        move |query| {
            let service = service.clone();
            async move { service.list(&query).await }
        },
        initial,
        columns::users(),
    )
    .with_empty_message("No hay usuarios registrados")
}

pub fn accidents(
    service: AccidentsService,
    initial: ListQuery,
) -> ListPage<Accident> {
    ListPage::new(
        move |query| {
            let service = service.clone();
            async move { service.list(&query).await }
        },
        initial,
        columns::accidents(),
    )
    .with_empty_message("No hay accidentes registrados")
}

pub fn movements(
    service: MovementHistoryService,
    initial: ListQuery,
) -> ListPage<Movement> {
    ListPage::new(
        move |query| {
            let service = service.clone();
            async move { service.list(&query).await }
        },
        initial,
        columns::movements(),
    )
    .with_empty_message("No hay movimientos registrados")
}

pub fn authorization_requests(
    service: AuthorizationService,
    initial: ListQuery,
) -> ListPage<AuthorizationRequest> {
    ListPage::new(
        move |query| {
            let service = service.clone();
            async move { service.list(&query).await }
        },
        initial,
        columns::authorization_requests(),
    )
    .with_empty_message("No hay solicitudes")
}

pub fn purchase_orders(
    service: PurchaseOrdersService,
    initial: ListQuery,
) -> ListPage<PurchaseOrder> {
    ListPage::new(
        move |query| {
            let service = service.clone();
            async move { service.list(&query).await }
        },
        initial,
        columns::purchase_orders(),
    )
    .with_empty_message("No hay órdenes de compra")
}

pub fn alerts(service: AlertsService, initial: ListQuery) -> ListPage<Alert> {
    ListPage::new(
        move |query| {
            let service = service.clone();
            async move { service.list(&query).await }
        },
        initial,
        columns::alerts(),
    )
    .with_empty_message("No hay alertas")
}

pub fn maintenance(
    service: MaintenanceService,
    initial: ListQuery,
) -> ListPage<Maintenance> {
    ListPage::new(
        move |query| {
            let service = service.clone();
            async move { service.list(&query).await }
        },
        initial,
        columns::maintenance(),
    )
    .with_empty_message("No hay mantenimientos registrados")
}
