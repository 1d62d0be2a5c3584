pub const MAX_PAGE_BUTTONS: u32 = 5;

/// At most `max` consecutive page numbers centered on `current`, clamped
/// to `1..=total_pages`.
pub fn page_window(current: u32, total_pages: u32, max: u32) -> Vec<u32> {
    if total_pages == 0 || max == 0 {
        return Vec::new();
    }
    let current = current.clamp(1, total_pages);
    let count = max.min(total_pages);
    let start = current
        .saturating_sub(count / 2)
        .max(1)
        .min(total_pages - count + 1);
    (start..start + count).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationControls {
    pub current_page: u32,
    pub total_pages: u32,
    pub is_loading: bool,
}

impl PaginationControls {
    pub fn new(current_page: u32, total_pages: u32) -> Self {
        Self {
            current_page,
            total_pages,
            is_loading: false,
        }
    }

    pub fn pages(&self) -> Vec<u32> {
        page_window(self.current_page, self.total_pages, MAX_PAGE_BUTTONS)
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// `‹ 1 [2] 3 4 5 ›`, with the arrows blank when disabled.
    pub fn render(&self) -> String {
        self.render_pages(&self.pages())
    }

    /// Render with an already computed page window.
    pub fn render_pages(&self, pages: &[u32]) -> String {
        if pages.is_empty() {
            return String::new();
        }
        let previous = self.has_previous() && !self.is_loading;
        let next = self.has_next() && !self.is_loading;
        let mut parts = Vec::with_capacity(pages.len() + 2);
        parts.push(if previous { "‹" } else { " " }.to_string());
        for page in pages {
            if *page == self.current_page {
                parts.push(format!("[{page}]"));
            } else {
                parts.push(page.to_string());
            }
        }
        parts.push(if next { "›" } else { " " }.to_string());
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_centered_and_clamped() {
        assert_eq!(page_window(1, 5, 5), vec![1, 2, 3, 4, 5]);
        assert_eq!(page_window(5, 10, 5), vec![3, 4, 5, 6, 7]);
        assert_eq!(page_window(10, 10, 5), vec![6, 7, 8, 9, 10]);
        assert_eq!(page_window(2, 3, 5), vec![1, 2, 3]);
        assert_eq!(page_window(1, 0, 5), Vec::<u32>::new());
    }

    #[test]
    fn out_of_range_page_is_clamped() {
        assert_eq!(page_window(99, 7, 5), vec![3, 4, 5, 6, 7]);
        assert_eq!(page_window(0, 7, 5), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn active_page_is_bracketed() {
        let controls = PaginationControls::new(1, 5);
        assert_eq!(controls.render(), "  [1] 2 3 4 5 ›");
        let controls = PaginationControls::new(5, 5);
        assert_eq!(controls.render(), "‹ 1 2 3 4 [5]  ");
    }

    #[test]
    fn arrows_are_disabled_while_loading() {
        let controls = PaginationControls {
            is_loading: true,
            ..PaginationControls::new(2, 3)
        };
        assert_eq!(controls.render(), "  1 [2] 3  ");
    }
}
