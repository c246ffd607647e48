//! Client-side pagination: discrete pages and the "load more" variant

use serde::{Deserialize, Serialize};

/// A window over a collection
///
/// `page_index` is 0-based. Once `total_count > 0` the window always points
/// at an existing page: `page_index * page_size < total_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    pub page_index: usize,
    pub page_size: usize,
    pub total_count: usize,
}

impl PageWindow {
    /// Create a window, clamping `page_index` into range
    pub fn new(page_index: usize, page_size: usize, total_count: usize) -> Self {
        let mut window = Self {
            page_index,
            page_size: page_size.max(1),
            total_count,
        };
        window.clamp();
        window
    }

    /// Total number of pages (ceiling division)
    pub fn page_count(&self) -> usize {
        self.total_count.div_ceil(self.page_size.max(1))
    }

    pub fn has_next_page(&self) -> bool {
        self.page_index + 1 < self.page_count()
    }

    pub fn has_previous_page(&self) -> bool {
        self.page_index > 0
    }

    /// Offset of the first item in the window
    pub fn offset(&self) -> usize {
        self.page_index * self.page_size
    }

    /// Slice `items` to this window, clipped to its length
    pub fn window<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.offset().min(items.len());
        let end = (start + self.page_size).min(items.len());
        &items[start..end]
    }

    fn clamp(&mut self) {
        let pages = self.page_count();
        if pages == 0 {
            self.page_index = 0;
        } else if self.page_index >= pages {
            self.page_index = pages - 1;
        }
    }
}

/// Slice `items` to `page`
pub fn window<'a, T>(items: &'a [T], page: &PageWindow) -> &'a [T] {
    page.window(items)
}

/// Navigation state for discrete pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    page: PageWindow,
}

impl Paginator {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: PageWindow::new(0, page_size, 0),
        }
    }

    pub fn page(&self) -> PageWindow {
        self.page
    }

    pub fn page_index(&self) -> usize {
        self.page.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page.page_size
    }

    pub fn page_count(&self) -> usize {
        self.page.page_count()
    }

    pub fn has_next_page(&self) -> bool {
        self.page.has_next_page()
    }

    pub fn has_previous_page(&self) -> bool {
        self.page.has_previous_page()
    }

    /// Update the total after filtering or refetching
    ///
    /// A shrinking total pulls the page index back onto the last page.
    pub fn set_total(&mut self, total_count: usize) {
        self.page = PageWindow::new(self.page.page_index, self.page.page_size, total_count);
    }

    /// Advance one page; returns whether the page changed
    pub fn next(&mut self) -> bool {
        if !self.has_next_page() {
            return false;
        }
        self.page.page_index += 1;
        true
    }

    /// Go back one page; returns whether the page changed
    pub fn previous(&mut self) -> bool {
        if !self.has_previous_page() {
            return false;
        }
        self.page.page_index -= 1;
        true
    }

    /// Jump to a page, clamped into range
    pub fn go_to(&mut self, page_index: usize) {
        self.page = PageWindow::new(page_index, self.page.page_size, self.page.total_count);
    }

    /// Change the page size and return to the first page
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page = PageWindow::new(0, page_size, self.page.total_count);
    }

    /// Return to the first page
    pub fn reset(&mut self) {
        self.page.page_index = 0;
    }

    pub fn window<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        self.page.window(items)
    }
}

/// "Load more" pagination: the window is always `[0, visible_count)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadMore {
    initial: usize,
    increment: usize,
    visible_count: usize,
}

impl LoadMore {
    pub fn new(initial: usize, increment: usize) -> Self {
        Self {
            initial,
            increment: increment.max(1),
            visible_count: initial,
        }
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    /// Whether more items exist beyond the visible count
    pub fn has_more(&self, total_count: usize) -> bool {
        self.visible_count < total_count
    }

    /// Grow the window by one increment
    pub fn load_more(&mut self) {
        self.visible_count += self.increment;
    }

    /// Shrink back to the initial count
    pub fn reset(&mut self) {
        self.visible_count = self.initial;
    }

    pub fn window<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[..self.visible_count.min(items.len())]
    }
}

/// Which pagination style a view uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pagination {
    Pages(Paginator),
    LoadMore(LoadMore),
}

impl Pagination {
    pub fn window<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        match self {
            Pagination::Pages(p) => p.window(items),
            Pagination::LoadMore(l) => l.window(items),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Pagination::Pages(p) => p.reset(),
            Pagination::LoadMore(l) => l.reset(),
        }
    }

    pub fn set_total(&mut self, total_count: usize) {
        if let Pagination::Pages(p) = self {
            p.set_total(total_count);
        }
    }
}
