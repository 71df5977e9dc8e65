use common::{ParseVariantError, PickupPointId};
use thiserror::Error;

/// Errors that can occur when interacting with the pickup point store.
///
/// The first four variants are the outcomes of the conditional writes; the
/// rest are infrastructure failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced pickup point does not exist.
    #[error("Pickup point not found: {0}")]
    PickupPointNotFound(PickupPointId),

    /// An in-progress reception already exists for the pickup point.
    #[error("Pickup point {0} already has an open reception")]
    OpenReceptionExists(PickupPointId),

    /// The pickup point has no in-progress reception.
    #[error("No open reception for pickup point {0}")]
    NoOpenReception(PickupPointId),

    /// The open reception of the pickup point holds no parcels (or there is
    /// no open reception at all).
    #[error("No parcel to remove for pickup point {0}")]
    NothingToRemove(PickupPointId),

    /// A stored value fell outside its closed set.
    #[error("Corrupt row: {0}")]
    Decode(#[from] ParseVariantError),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
