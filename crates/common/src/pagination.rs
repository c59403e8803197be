//! Page-number pagination.
//!
//! A [`Paginator`] turns a total item count and a raw `?page=` value into a
//! [`PageMeta`] (which page, how many pages, and the slice bounds). Lookup
//! never fails: a value that is not a number resolves to the first page and
//! a number outside `1..=num_pages` resolves to the last page.

use std::num::IntErrorKind;

use serde::Serialize;

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Page-number paginator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: u64,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// Position of one page within a paginated collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// 1-based page number.
    pub number: u64,
    /// Total number of pages (at least 1).
    pub num_pages: u64,
    /// Total number of items across all pages.
    pub count: u64,
    /// Maximum number of items per page.
    pub per_page: u64,
}

/// One page of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Items on this page, in collection order.
    pub items: Vec<T>,
    /// Pagination metadata.
    #[serde(flatten)]
    pub meta: PageMeta,
}

impl Paginator {
    /// Create a paginator. A page size of zero is treated as one.
    #[must_use]
    pub const fn new(per_page: u64) -> Self {
        Self {
            per_page: if per_page == 0 { 1 } else { per_page },
        }
    }

    /// Items per page.
    #[must_use]
    pub const fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Number of pages for `count` items. An empty collection has one page.
    #[must_use]
    pub const fn num_pages(&self, count: u64) -> u64 {
        if count == 0 {
            1
        } else {
            count.div_ceil(self.per_page)
        }
    }

    /// Resolve a raw page value against a collection of `count` items.
    #[must_use]
    pub fn page_meta(&self, count: u64, requested: Option<&str>) -> PageMeta {
        let num_pages = self.num_pages(count);
        let number = resolve_number(requested, num_pages);

        PageMeta {
            number,
            num_pages,
            count,
            per_page: self.per_page,
        }
    }

    /// Paginate an in-memory slice.
    #[must_use]
    pub fn paginate<T: Clone>(&self, items: &[T], requested: Option<&str>) -> Page<T> {
        let meta = self.page_meta(items.len() as u64, requested);
        let start = (meta.offset() as usize).min(items.len());
        let end = (meta.end() as usize).min(items.len());

        Page {
            items: items[start..end].to_vec(),
            meta,
        }
    }
}

fn resolve_number(requested: Option<&str>, num_pages: u64) -> u64 {
    let Some(raw) = requested else {
        return 1;
    };

    match raw.trim().parse::<i64>() {
        Ok(n) if n >= 1 && n.unsigned_abs() <= num_pages => n.unsigned_abs(),
        Ok(_) => num_pages,
        Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
            num_pages
        }
        Err(_) => 1,
    }
}

impl PageMeta {
    /// Index of the first item on this page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.number - 1) * self.per_page
    }

    /// Index one past the last item on this page.
    #[must_use]
    pub const fn end(&self) -> u64 {
        let end = self.offset() + self.per_page;
        if end > self.count { self.count } else { end }
    }

    /// Whether a later page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    /// Whether an earlier page exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.number > 1
    }

    /// Number of the next page, if any.
    #[must_use]
    pub const fn next_page_number(&self) -> Option<u64> {
        if self.has_next() {
            Some(self.number + 1)
        } else {
            None
        }
    }

    /// Number of the previous page, if any.
    #[must_use]
    pub const fn previous_page_number(&self) -> Option<u64> {
        if self.has_previous() {
            Some(self.number - 1)
        } else {
            None
        }
    }
}

impl<T> Page<T> {
    /// Assemble a page from items fetched for `meta`.
    #[must_use]
    pub const fn new(items: Vec<T>, meta: PageMeta) -> Self {
        Self { items, meta }
    }

    /// Map the items, keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }

    /// Number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether this page holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: u32) -> Vec<u32> {
        (0..n).collect()
    }

    #[test]
    fn test_fourteen_items_split_ten_and_four() {
        let paginator = Paginator::default();
        let all = items(14);

        let first = paginator.paginate(&all, None);
        assert_eq!(first.len(), 10);
        assert_eq!(first.meta.num_pages, 2);
        assert!(first.meta.has_next());
        assert!(!first.meta.has_previous());

        let second = paginator.paginate(&all, Some("2"));
        assert_eq!(second.len(), 4);
        assert_eq!(second.meta.number, 2);
        assert!(!second.meta.has_next());
        assert_eq!(second.meta.previous_page_number(), Some(1));
    }

    #[test]
    fn test_adjacent_pages_cover_collection_exactly_once() {
        for per_page in 1..=7 {
            let paginator = Paginator::new(per_page);
            for n in 0..30 {
                let all = items(n);
                let pages = paginator.num_pages(u64::from(n));
                let mut seen = Vec::new();
                for number in 1..=pages {
                    let page = paginator.paginate(&all, Some(&number.to_string()));
                    assert!(page.len() as u64 <= per_page);
                    seen.extend(page.items);
                }
                assert_eq!(seen, all, "per_page={per_page} n={n}");
            }
        }
    }

    #[test]
    fn test_non_numeric_page_falls_back_to_first() {
        let paginator = Paginator::default();
        for raw in ["abc", "", "2.0", "1e3"] {
            let meta = paginator.page_meta(35, Some(raw));
            assert_eq!(meta.number, 1, "raw={raw:?}");
        }
    }

    #[test]
    fn test_out_of_range_page_clamps_to_last() {
        let paginator = Paginator::default();
        for raw in ["5", "0", "-3", "99999999999999999999999"] {
            let meta = paginator.page_meta(35, Some(raw));
            assert_eq!(meta.number, 4, "raw={raw:?}");
        }
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let meta = Paginator::default().page_meta(35, Some(" 3 "));
        assert_eq!(meta.number, 3);
    }

    #[test]
    fn test_empty_collection_has_one_empty_page() {
        let paginator = Paginator::default();
        let page = paginator.paginate::<u32>(&[], Some("7"));
        assert!(page.is_empty());
        assert_eq!(page.meta.number, 1);
        assert_eq!(page.meta.num_pages, 1);
        assert_eq!(page.meta.offset(), 0);
        assert!(!page.meta.has_next());
        assert!(!page.meta.has_previous());
    }

    #[test]
    fn test_zero_page_size_is_treated_as_one() {
        let paginator = Paginator::new(0);
        assert_eq!(paginator.per_page(), 1);
        assert_eq!(paginator.num_pages(3), 3);
    }

    #[test]
    fn test_offset_and_end() {
        let meta = Paginator::default().page_meta(25, Some("3"));
        assert_eq!(meta.offset(), 20);
        assert_eq!(meta.end(), 25);
    }
}
