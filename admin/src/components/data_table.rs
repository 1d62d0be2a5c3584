//! A generic table rendered to fixed-width text.
//!
//! The table only displays what it is given. Sorting is UI state: toggling
//! a column returns the new [`SortState`] and the caller re-fetches with
//! it. Formatted rows and the page buttons are memoized on their inputs so
//! redrawing an unchanged table does no formatting work.

use payloads::{PageMeta, SortOrder};
use std::cell::RefCell;
use std::sync::Arc;

use super::pagination_controls::{
    MAX_PAGE_BUTTONS, PaginationControls, page_window,
};

const DEFAULT_MAX_WIDTH: usize = 32;

pub struct Column<T> {
    pub key: &'static str,
    pub label: &'static str,
    pub value: fn(&T) -> String,
    pub render: Option<fn(&str, &T) -> String>,
    pub sortable: bool,
    pub max_width: usize,
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            label: self.label,
            value: self.value,
            render: self.render,
            sortable: self.sortable,
            max_width: self.max_width,
        }
    }
}

impl<T> Column<T> {
    pub fn new(
        key: &'static str,
        label: &'static str,
        value: fn(&T) -> String,
    ) -> Self {
        Self {
            key,
            label,
            value,
            render: None,
            sortable: false,
            max_width: DEFAULT_MAX_WIDTH,
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn render(mut self, render: fn(&str, &T) -> String) -> Self {
        self.render = Some(render);
        self
    }

    pub fn max_width(mut self, max_width: usize) -> Self {
        self.max_width = max_width.max(1);
        self
    }

    fn cell(&self, row: &T) -> String {
        let value = (self.value)(row);
        match self.render {
            Some(render) => render(&value, row),
            None => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    pub column: String,
    pub direction: SortOrder,
}

impl SortState {
    /// Same column flips the direction; a new column starts ascending.
    pub fn toggle(current: Option<&SortState>, column: &str) -> SortState {
        match current {
            Some(state) if state.column == column => SortState {
                column: column.to_string(),
                direction: state.direction.flip(),
            },
            _ => SortState {
                column: column.to_string(),
                direction: SortOrder::Asc,
            },
        }
    }
}

type Rows = Arc<Vec<Vec<String>>>;

pub struct DataTable<T> {
    columns: Vec<Column<T>>,
    data: Vec<T>,
    data_version: u64,
    pagination: PageMeta,
    sort: Option<SortState>,
    loading: bool,
    empty_message: String,
    rows_memo: RefCell<Option<(u64, Rows)>>,
    pages_memo: RefCell<Option<((u32, u32), Arc<Vec<u32>>)>>,
}

impl<T> DataTable<T> {
    pub fn new(columns: Vec<Column<T>>) -> Self {
        Self {
            columns,
            data: Vec::new(),
            data_version: 0,
            pagination: PageMeta::default(),
            sort: None,
            loading: false,
            empty_message: "No hay datos disponibles".to_string(),
            rows_memo: RefCell::new(None),
            pages_memo: RefCell::new(None),
        }
    }

    pub fn with_empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = message.into();
        self
    }

    pub fn columns(&self) -> &[Column<T>] {
        &self.columns
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn set_data(&mut self, data: Vec<T>) {
        self.data = data;
        self.data_version += 1;
    }

    pub fn set_pagination(&mut self, pagination: PageMeta) {
        self.pagination = pagination;
    }

    pub fn pagination(&self) -> &PageMeta {
        &self.pagination
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn sort(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    pub fn set_sort(&mut self, sort: Option<SortState>) {
        self.sort = sort;
    }

    /// Toggle sorting on `key`. `None` when the column does not exist or
    /// is not sortable.
    pub fn toggle_sort(&mut self, key: &str) -> Option<SortState> {
        let column = self.columns.iter().find(|c| c.key == key)?;
        if !column.sortable {
            return None;
        }
        let next = SortState::toggle(self.sort.as_ref(), key);
        self.sort = Some(next.clone());
        Some(next)
    }

    /// Formatted cells, recomputed only when the data changes.
    pub fn rows(&self) -> Rows {
        let mut memo = self.rows_memo.borrow_mut();
        if let Some((version, rows)) = memo.as_ref() {
            if *version == self.data_version {
                return rows.clone();
            }
        }
        let rows: Rows = Arc::new(
            self.data
                .iter()
                .map(|row| self.columns.iter().map(|c| c.cell(row)).collect())
                .collect(),
        );
        *memo = Some((self.data_version, rows.clone()));
        rows
    }

    /// Page buttons, recomputed only when page or page count change.
    pub fn page_buttons(&self) -> Arc<Vec<u32>> {
        let key = (self.pagination.page, self.pagination.total_pages);
        let mut memo = self.pages_memo.borrow_mut();
        if let Some((cached, pages)) = memo.as_ref() {
            if *cached == key {
                return pages.clone();
            }
        }
        let pages = Arc::new(page_window(key.0, key.1, MAX_PAGE_BUTTONS));
        *memo = Some((key, pages.clone()));
        pages
    }

    pub fn pagination_controls(&self) -> PaginationControls {
        PaginationControls {
            is_loading: self.loading,
            ..PaginationControls::new(
                self.pagination.page,
                self.pagination.total_pages,
            )
        }
    }

    fn header(&self, column: &Column<T>) -> String {
        match &self.sort {
            Some(sort) if sort.column == column.key => {
                let marker = match sort.direction {
                    SortOrder::Asc => '▲',
                    SortOrder::Desc => '▼',
                };
                format!("{} {marker}", column.label)
            }
            _ => column.label.to_string(),
        }
    }

    pub fn render(&self) -> String {
        let rows = self.rows();
        let headers: Vec<String> =
            self.columns.iter().map(|c| self.header(c)).collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                rows.iter()
                    .map(|row| width(&row[i]))
                    .chain(std::iter::once(width(&headers[i])))
                    .max()
                    .unwrap_or(0)
                    .min(column.max_width)
            })
            .collect();

        let mut lines = vec![format_line(&headers, &widths)];
        lines.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        if rows.is_empty() {
            lines.push(if self.loading {
                "Cargando...".to_string()
            } else {
                self.empty_message.clone()
            });
        }
        for row in rows.iter() {
            lines.push(format_line(row, &widths));
        }

        let pages = self.page_buttons();
        if !pages.is_empty() {
            let controls = self.pagination_controls();
            lines.push(String::new());
            lines.push(format!(
                "{}   Página {} de {} ({} registros)",
                controls.render_pages(&pages),
                controls.current_page,
                controls.total_pages,
                self.pagination.total,
            ));
        }
        lines.join("\n")
    }
}

fn width(text: &str) -> usize {
    text.chars().count()
}

fn fit(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len > width {
        let mut cut: String =
            text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    } else {
        format!("{text}{}", " ".repeat(width - len))
    }
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| fit(cell, *w))
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        codigo: &'static str,
        estado: &'static str,
    }

    fn table() -> DataTable<Row> {
        DataTable::new(vec![
            Column::new("codigo", "Código", |r: &Row| r.codigo.to_string())
                .sortable(),
            Column::new("estado", "Estado", |r: &Row| r.estado.to_string())
                .render(|value, _| value.to_uppercase()),
        ])
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                codigo: "LV-002",
                estado: "activo",
            },
            Row {
                codigo: "LV-001",
                estado: "vencido",
            },
        ]
    }

    #[test]
    fn sort_toggle_flips_same_column() {
        let mut table = table();
        let first = table.toggle_sort("codigo").unwrap();
        assert_eq!(first.direction, SortOrder::Asc);
        let second = table.toggle_sort("codigo").unwrap();
        assert_eq!(second.direction, SortOrder::Desc);
        assert_eq!(table.toggle_sort("estado"), None);
        assert_eq!(table.toggle_sort("missing"), None);
    }

    #[test]
    fn rows_are_not_reordered_by_sort() {
        let mut table = table();
        table.set_data(rows());
        table.toggle_sort("codigo");
        let rows = table.rows();
        assert_eq!(rows[0], vec!["LV-002".to_string(), "ACTIVO".to_string()]);
        assert_eq!(rows[1][0], "LV-001");
    }

    #[test]
    fn rows_are_memoized_until_data_changes() {
        let mut table = table();
        table.set_data(rows());
        let first = table.rows();
        assert!(Arc::ptr_eq(&first, &table.rows()));
        table.set_data(rows());
        assert!(!Arc::ptr_eq(&first, &table.rows()));
    }

    #[test]
    fn page_buttons_are_memoized_on_page_and_total() {
        let mut table = table();
        table.set_pagination(PageMeta::new(1, 10, 47));
        let first = table.page_buttons();
        assert_eq!(*first, vec![1, 2, 3, 4, 5]);
        table.set_pagination(PageMeta::new(1, 10, 47));
        assert!(Arc::ptr_eq(&first, &table.page_buttons()));
        table.set_pagination(PageMeta::new(3, 10, 47));
        assert!(!Arc::ptr_eq(&first, &table.page_buttons()));
    }

    #[test]
    fn render_marks_sorted_column_and_active_page() {
        let mut table = table();
        table.set_data(rows());
        table.set_pagination(PageMeta::new(1, 2, 3));
        table.toggle_sort("codigo");
        let text = table.render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Código ▲ | Estado");
        assert_eq!(lines[2], "LV-002   | ACTIVO");
        assert!(lines.last().unwrap().starts_with("  [1] 2 ›"));
    }

    #[test]
    fn footer_arrows_are_disabled_while_loading() {
        let mut table = table();
        table.set_data(rows());
        table.set_pagination(PageMeta::new(2, 1, 3));
        table.set_loading(true);
        let controls = table.pagination_controls();
        assert!(controls.is_loading);
        assert_eq!(controls.current_page, 2);
        let text = table.render();
        assert!(text.ends_with("  1 [2] 3     Página 2 de 3 (3 registros)"));
    }

    #[test]
    fn empty_table_shows_message() {
        let table = table().with_empty_message("Sin registros");
        assert!(table.render().contains("Sin registros"));
    }

    #[test]
    fn long_cells_are_truncated() {
        assert_eq!(fit("Planta Arequipa", 6), "Plant…");
        assert_eq!(fit("LV", 4), "LV  ");
    }
}
