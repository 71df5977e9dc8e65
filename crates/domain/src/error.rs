//! Domain error types.

use std::time::Duration;

use chrono::{DateTime, Utc};
use common::{ParseVariantError, PickupPointId, Role};
use store::StoreError;
use thiserror::Error;

use crate::auth::Operation;

/// Classification of every failure the domain can report.
///
/// Transport layers map kinds, not individual variants, onto their own
/// status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthenticated,
    Forbidden,
    ValidationFailed,
    NotFound,
    ConflictOpenReceptionExists,
    NoOpenReception,
    NothingToRemove,
    StoreUnavailable,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::ValidationFailed => "validation_failed",
            ErrorKind::NotFound => "not_found",
            ErrorKind::ConflictOpenReceptionExists => "conflict_open_reception_exists",
            ErrorKind::NoOpenReception => "no_open_reception",
            ErrorKind::NothingToRemove => "nothing_to_remove",
            ErrorKind::StoreUnavailable => "store_unavailable",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input rejected before any store call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0}")]
    InvalidCity(ParseVariantError),

    #[error("{0}")]
    InvalidParcelType(ParseVariantError),

    #[error("pickup point id is required")]
    MissingPickupPointId,

    #[error("page must be at least 1, got {0}")]
    InvalidPage(i64),

    #[error("limit must be at least 1, got {0}")]
    InvalidLimit(i64),

    #[error("start date {start} is after end date {end}")]
    InvalidDateRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Stage of the catalog assembly that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingStage {
    PickupPoints,
    Receptions,
    Parcels,
}

impl std::fmt::Display for ListingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ListingStage::PickupPoints => "pickup points",
            ListingStage::Receptions => "receptions",
            ListingStage::Parcels => "parcels",
        })
    }
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No identity accompanied the request.
    #[error("Authentication required")]
    Unauthenticated,

    /// The identity's role lacks the capability for the operation.
    #[error("Role '{role}' is not allowed to {operation}")]
    Forbidden { role: Role, operation: Operation },

    /// Malformed input.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The referenced pickup point does not exist.
    #[error("Pickup point not found: {0}")]
    PickupPointNotFound(PickupPointId),

    /// An open reception already exists for the pickup point.
    #[error("Pickup point {0} already has an open reception")]
    OpenReceptionExists(PickupPointId),

    /// There is no open reception to close or add to.
    #[error("No open reception for pickup point {0}")]
    NoOpenReception(PickupPointId),

    /// No parcel is eligible for removal.
    #[error("No parcel to remove for pickup point {0}")]
    NothingToRemove(PickupPointId),

    /// A catalog assembly stage failed; nothing is returned.
    #[error("Failed listing {stage}: {source}")]
    Listing {
        stage: ListingStage,
        #[source]
        source: StoreError,
    },

    /// The underlying store failed.
    #[error("Store unavailable: {0}")]
    Store(#[source] StoreError),

    /// The store call did not finish before its deadline.
    #[error("{operation} cancelled after {timeout:?}")]
    Cancelled {
        operation: Operation,
        timeout: Duration,
    },
}

impl DomainError {
    /// Wraps a store failure raised while assembling the catalog.
    pub fn listing(stage: ListingStage, source: StoreError) -> Self {
        DomainError::Listing { stage, source }
    }

    /// Returns the taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Unauthenticated => ErrorKind::Unauthenticated,
            DomainError::Forbidden { .. } => ErrorKind::Forbidden,
            DomainError::Validation(_) => ErrorKind::ValidationFailed,
            DomainError::PickupPointNotFound(_) => ErrorKind::NotFound,
            DomainError::OpenReceptionExists(_) => ErrorKind::ConflictOpenReceptionExists,
            DomainError::NoOpenReception(_) => ErrorKind::NoOpenReception,
            DomainError::NothingToRemove(_) => ErrorKind::NothingToRemove,
            DomainError::Listing { .. } | DomainError::Store(_) => ErrorKind::StoreUnavailable,
            DomainError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Logs and counts the rejection of `operation`, returning the error.
    pub(crate) fn rejected(self, operation: Operation) -> Self {
        let kind = self.kind();
        match kind {
            ErrorKind::StoreUnavailable => {
                tracing::error!(%operation, error = %self, "store failure");
            }
            _ => tracing::warn!(%operation, %kind, error = %self, "operation rejected"),
        }
        metrics::counter!("operations_rejected_total", "kind" => kind.as_str()).increment(1);
        self
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PickupPointNotFound(id) => DomainError::PickupPointNotFound(id),
            StoreError::OpenReceptionExists(id) => DomainError::OpenReceptionExists(id),
            StoreError::NoOpenReception(id) => DomainError::NoOpenReception(id),
            StoreError::NothingToRemove(id) => DomainError::NothingToRemove(id),
            other => DomainError::Store(other),
        }
    }
}
