use payloads::{ListQuery, Page, PageMeta, SortOrder};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

use super::{AsyncCall, AsyncOptions};
use crate::error::AdminError;

#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedState<T> {
    pub filters: ListQuery,
    /// Every item fetched since the last reset to page 1.
    pub all_data: Vec<T>,
    /// Items of the most recently fetched page only.
    pub page_items: Vec<T>,
    pub pagination: PageMeta,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> PaginatedState<T> {
    fn new(filters: ListQuery) -> Self {
        Self {
            pagination: PageMeta {
                page: filters.page,
                limit: filters.limit,
                ..PageMeta::default()
            },
            filters,
            all_data: Vec::new(),
            page_items: Vec::new(),
            loading: false,
            error: None,
        }
    }

    pub fn has_more(&self) -> bool {
        self.pagination.has_more()
    }
}

/// A partial change to the current filters.
///
/// An empty `search` clears the search; a `None` param value removes that
/// param.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPatch {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<(String, SortOrder)>,
    pub search: Option<String>,
    pub params: BTreeMap<String, Option<String>>,
}

impl FilterPatch {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Default::default()
        }
    }

    pub fn search(search: impl Into<String>) -> Self {
        Self {
            search: Some(search.into()),
            ..Default::default()
        }
    }

    pub fn sort(column: impl Into<String>, order: SortOrder) -> Self {
        Self {
            sort: Some((column.into(), order)),
            ..Default::default()
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_param(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.params.insert(key.into(), Some(value.into()));
        self
    }

    pub fn without_param(mut self, key: impl Into<String>) -> Self {
        self.params.insert(key.into(), None);
        self
    }

    pub fn apply(&self, filters: &mut ListQuery) {
        if let Some(page) = self.page {
            filters.page = page.max(1);
        }
        if let Some(limit) = self.limit {
            filters.limit = limit;
        }
        if let Some((column, order)) = &self.sort {
            filters.sort_by = Some(column.clone());
            filters.sort_order = Some(*order);
        }
        if let Some(search) = &self.search {
            let search = search.trim();
            filters.search = (!search.is_empty()).then(|| search.to_string());
        }
        for (key, value) in &self.params {
            match value {
                Some(value) => {
                    filters.params.insert(key.clone(), value.clone());
                }
                None => {
                    filters.params.remove(key);
                }
            }
        }
    }
}

/// Whether two queries select the same listing, whatever their page.
fn same_listing(a: &ListQuery, b: &ListQuery) -> bool {
    a.limit == b.limit
        && a.sort_by == b.sort_by
        && a.sort_order == b.sort_order
        && a.search == b.search
        && a.params == b.params
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Accumulate {
    /// Page 1 replaces, later pages append.
    ByPage,
    Replace,
}

/// A paginated listing built on [`AsyncCall`].
///
/// `execute`/`load_more` accumulate pages for infinite-scroll style views;
/// `go_to_page` and `page_items` serve page-number views.
pub struct PaginatedFetch<T> {
    call: AsyncCall<ListQuery, Page<T>, AdminError>,
    state: Arc<watch::Sender<PaginatedState<T>>>,
}

impl<T> Clone for PaginatedFetch<T> {
    fn clone(&self) -> Self {
        Self {
            call: self.call.clone(),
            state: self.state.clone(),
        }
    }
}

impl<T> PaginatedFetch<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut>(
        fetch: F,
        initial: ListQuery,
        options: AsyncOptions<Page<T>>,
    ) -> Self
    where
        F: Fn(ListQuery) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Page<T>, AdminError>> + Send + 'static,
    {
        Self {
            call: AsyncCall::new(fetch, options),
            state: Arc::new(watch::Sender::new(PaginatedState::new(initial))),
        }
    }

    /// Merge `patch` into the filters and fetch.
    pub async fn execute(
        &self,
        patch: FilterPatch,
    ) -> Option<Result<PageMeta, String>> {
        self.fetch(patch, Accumulate::ByPage).await
    }

    async fn fetch(
        &self,
        patch: FilterPatch,
        mode: Accumulate,
    ) -> Option<Result<PageMeta, String>> {
        if !self.call.is_mounted() {
            return None;
        }
        let previous = self.state.borrow().filters.clone();
        let mut filters = previous.clone();
        patch.apply(&mut filters);
        // a different listing starts over unless a page was asked for
        let restart = mode == Accumulate::ByPage
            && patch.page.is_none()
            && !same_listing(&previous, &filters);
        if restart {
            filters.page = 1;
        }
        self.state.send_modify(|state| {
            state.filters = filters.clone();
            if restart {
                state.all_data.clear();
                state.page_items.clear();
            }
            state.loading = true;
            state.error = None;
        });

        let result = self.call.execute(filters.clone()).await?;
        if !self.call.is_mounted() {
            return None;
        }
        match result {
            Ok(page) => {
                let meta = page.meta.clone();
                self.state.send_modify(|state| {
                    if mode == Accumulate::Replace || filters.page <= 1 {
                        state.all_data = page.data.clone();
                    } else {
                        state.all_data.extend(page.data.iter().cloned());
                    }
                    state.page_items = page.data;
                    state.pagination = page.meta;
                    state.loading = false;
                });
                Some(Ok(meta))
            }
            Err(message) => {
                self.state.send_modify(|state| {
                    state.loading = false;
                    state.error = Some(message.clone());
                });
                Some(Err(message))
            }
        }
    }

    /// Change filters. Always restarts from page 1 with no accumulated
    /// items.
    pub async fn update_filters(
        &self,
        mut patch: FilterPatch,
    ) -> Option<Result<PageMeta, String>> {
        patch.page = Some(1);
        if self.call.is_mounted() {
            self.state.send_modify(|state| {
                state.all_data.clear();
                state.page_items.clear();
            });
        }
        self.execute(patch).await
    }

    /// Fetch the next page, or nothing when already on the last one.
    pub async fn load_more(&self) -> Option<Result<PageMeta, String>> {
        let pagination = self.state.borrow().pagination.clone();
        if pagination.page >= pagination.total_pages {
            tracing::debug!(page = pagination.page, "No more pages to load");
            return None;
        }
        self.execute(FilterPatch::page(pagination.page + 1)).await
    }

    pub async fn refresh(&self) -> Option<Result<PageMeta, String>> {
        self.update_filters(FilterPatch::default()).await
    }

    pub async fn go_to_page(
        &self,
        page: u32,
    ) -> Option<Result<PageMeta, String>> {
        self.fetch(FilterPatch::page(page), Accumulate::Replace).await
    }

    /// Fetch with the current filters the first time an `immediate`
    /// listing is mounted.
    pub async fn mount(&self) -> Option<Result<PageMeta, String>> {
        if self.call.begin_mount() {
            self.execute(FilterPatch::default()).await
        } else {
            None
        }
    }

    pub fn unmount(&self) {
        self.call.unmount();
    }

    pub fn state(&self) -> PaginatedState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PaginatedState<T>> {
        self.state.subscribe()
    }

    pub fn filters(&self) -> ListQuery {
        self.state.borrow().filters.clone()
    }
}
