use chrono::{DateTime, Utc};

/// A validated slice of the pickup point listing.
///
/// Constructed by the caller after it has checked its own pagination
/// convention; the store only ever sees a non-negative offset and a
/// positive limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    offset: u64,
    limit: u32,
}

impl Page {
    /// Creates a page. A zero limit is bumped to one.
    pub fn new(offset: u64, limit: u32) -> Self {
        Self {
            offset,
            limit: limit.max(1),
        }
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Maximum number of rows to return.
    pub fn limit(&self) -> u32 {
        self.limit
    }
}

/// Inclusive time window applied to a reception's `opened_at`.
///
/// An absent bound leaves that side of the window open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceptionWindow {
    /// Receptions opened at or after this instant.
    pub from: Option<DateTime<Utc>>,

    /// Receptions opened at or before this instant.
    pub to: Option<DateTime<Utc>>,
}

impl ReceptionWindow {
    /// A window with no bounds.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Sets the lower bound (inclusive).
    pub fn since(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    /// Sets the upper bound (inclusive).
    pub fn until(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    /// Returns true if `ts` falls inside the window.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        if let Some(from) = self.from
            && ts < from
        {
            return false;
        }
        if let Some(to) = self.to
            && ts > to
        {
            return false;
        }
        true
    }
}
