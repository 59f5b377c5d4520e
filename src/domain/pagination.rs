use serde::Serialize;

use super::errors::DomainError;

/// Page metadata returned alongside every list result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
    pub previous_page: Option<i64>,
    pub next_page: Option<i64>,
}

/// Storage range for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: i64,
    pub limit: i64,
}

/// Rows of one page together with the exact count of rows across all pages.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResult<T> {
    pub documents: Vec<T>,
    pub total: i64,
    pub meta: PageMeta,
}

impl<T> PaginatedResult<T> {
    pub fn from_page(page: Page<T>, meta: PageMeta) -> Self {
        Self {
            documents: page.rows,
            total: page.total,
            meta,
        }
    }

    /// Empty result for a page that could not be loaded.
    pub fn empty(page: i64, limit: i64) -> Self {
        Self {
            documents: Vec::new(),
            total: 0,
            meta: PageMeta {
                page,
                limit,
                total_pages: 0,
                previous_page: (page > 1).then(|| page - 1),
                next_page: None,
            },
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            documents: self.documents.into_iter().map(f).collect(),
            total: self.total,
            meta: self.meta,
        }
    }
}

fn validate(page: i64, limit: i64) -> Result<(), DomainError> {
    if page <= 0 {
        return Err(DomainError::Validation(format!(
            "page must be at least 1, got {page}"
        )));
    }
    if limit <= 0 {
        return Err(DomainError::Validation(format!(
            "limit must be at least 1, got {limit}"
        )));
    }
    Ok(())
}

pub fn compute_meta(page: i64, limit: i64, total: i64) -> Result<PageMeta, DomainError> {
    validate(page, limit)?;
    if total < 0 {
        return Err(DomainError::Validation(format!(
            "total must not be negative, got {total}"
        )));
    }
    let total_pages = (total + limit - 1) / limit;
    Ok(PageMeta {
        page,
        limit,
        total_pages,
        previous_page: (page > 1).then(|| page - 1),
        next_page: (page < total_pages).then(|| page + 1),
    })
}

pub fn window(page: i64, limit: i64) -> Result<PageWindow, DomainError> {
    validate(page, limit)?;
    Ok(PageWindow {
        offset: (page - 1) * limit,
        limit,
    })
}
