//! Page-number pagination with clamping

use std::num::IntErrorKind;

use serde::Serialize;

/// Resolved position of a page inside a result set.
///
/// Requested page numbers never fail: anything below the first page maps to
/// the first page, anything past the last page maps to the last one. An empty
/// result set still has one (empty) page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: i64,
    pub size: i64,
    pub total_pages: i64,
    pub total_count: i64,
}

impl PageWindow {
    pub fn clamp(requested: i64, size: i64, total_count: i64) -> Self {
        let size = size.max(1);
        let total_pages = ((total_count + size - 1) / size).max(1);
        Self {
            number: requested.clamp(1, total_pages),
            size,
            total_pages,
            total_count,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.size
    }

    pub fn limit(&self) -> i64 {
        self.size
    }

    pub fn into_page<T>(self, items: Vec<T>) -> Page<T> {
        Page {
            items,
            page: self.number,
            page_size: self.size,
            total_pages: self.total_pages,
            total_count: self.total_count,
        }
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub total_count: i64,
}

/// Parse a page number the lenient way: missing or garbage means page 1.
///
/// Integers too large for `i64` saturate so that clamping still lands on the
/// nearest valid page.
pub fn parse_page_number(raw: Option<&str>) -> i64 {
    let Some(raw) = raw else {
        return 1;
    };
    match raw.trim().parse::<i64>() {
        Ok(number) => number,
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => i64::MAX,
            _ => 1,
        },
    }
}
