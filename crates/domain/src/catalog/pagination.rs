use chrono::{DateTime, Utc};
use store::{Page, ReceptionWindow};

use crate::error::ValidationError;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

/// A validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    limit: u64,
}

impl PageRequest {
    /// Validates caller-supplied pagination.
    ///
    /// Both `page` and `limit` must be at least 1; there is no upper bound
    /// on either.
    pub fn new(page: i64, limit: i64) -> Result<Self, ValidationError> {
        if page < 1 {
            return Err(ValidationError::InvalidPage(page));
        }
        if limit < 1 {
            return Err(ValidationError::InvalidLimit(limit));
        }

        Ok(Self {
            page: page as u64,
            limit: limit as u64,
        })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Translates into the store's offset/limit slice.
    ///
    /// An offset that overflows `u64` saturates, which lands past the last
    /// row and yields an empty page. A limit wider than the store accepts
    /// is capped at `u32::MAX`.
    pub fn to_page(&self) -> Page {
        let offset = (self.page - 1).saturating_mul(self.limit);
        let limit = u32::try_from(self.limit).unwrap_or(u32::MAX);
        Page::new(offset, limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE as u64,
            limit: DEFAULT_LIMIT as u64,
        }
    }
}

/// Builds the inclusive reception window, rejecting an inverted range.
pub fn reception_window(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<ReceptionWindow, ValidationError> {
    if let (Some(start), Some(end)) = (start, end)
        && start > end
    {
        return Err(ValidationError::InvalidDateRange { start, end });
    }

    Ok(ReceptionWindow {
        from: start,
        to: end,
    })
}
