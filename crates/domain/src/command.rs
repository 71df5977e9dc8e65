//! Commands accepted by the reception and catalog services.
//!
//! Commands carry caller input as received. Parsing into closed sets and
//! range checks happen inside the services, after authorization.

use chrono::{DateTime, Utc};
use common::PickupPointId;

use crate::auth::Operation;
use crate::error::ValidationError;

/// An intention to perform one gated operation.
pub trait Command: Send + Sync {
    /// The operation the caller must be authorized for.
    fn operation(&self) -> Operation;
}

/// Rejects the nil id a missing field deserializes to.
pub(crate) fn require_pickup_point(id: PickupPointId) -> Result<PickupPointId, ValidationError> {
    if id.is_nil() {
        Err(ValidationError::MissingPickupPointId)
    } else {
        Ok(id)
    }
}

/// Command to register a pickup point.
#[derive(Debug, Clone)]
pub struct CreatePickupPoint {
    /// City name as supplied; must be one of the supported cities.
    pub city: String,
}

impl CreatePickupPoint {
    pub fn new(city: impl Into<String>) -> Self {
        Self { city: city.into() }
    }
}

impl Command for CreatePickupPoint {
    fn operation(&self) -> Operation {
        Operation::CreatePickupPoint
    }
}

/// Command to open a reception at a pickup point.
#[derive(Debug, Clone, Copy)]
pub struct OpenReception {
    pub pickup_point_id: PickupPointId,
}

impl OpenReception {
    pub fn new(pickup_point_id: PickupPointId) -> Self {
        Self { pickup_point_id }
    }
}

impl Command for OpenReception {
    fn operation(&self) -> Operation {
        Operation::OpenReception
    }
}

/// Command to close the open reception of a pickup point.
#[derive(Debug, Clone, Copy)]
pub struct CloseReception {
    pub pickup_point_id: PickupPointId,
}

impl CloseReception {
    pub fn new(pickup_point_id: PickupPointId) -> Self {
        Self { pickup_point_id }
    }
}

impl Command for CloseReception {
    fn operation(&self) -> Operation {
        Operation::CloseReception
    }
}

/// Command to add a parcel to the open reception.
#[derive(Debug, Clone)]
pub struct AddParcel {
    pub pickup_point_id: PickupPointId,

    /// Parcel type as supplied; canonical or English name.
    pub parcel_type: String,
}

impl AddParcel {
    pub fn new(pickup_point_id: PickupPointId, parcel_type: impl Into<String>) -> Self {
        Self {
            pickup_point_id,
            parcel_type: parcel_type.into(),
        }
    }
}

impl Command for AddParcel {
    fn operation(&self) -> Operation {
        Operation::AddParcel
    }
}

/// Command to remove the most recently added parcel of the open reception.
#[derive(Debug, Clone, Copy)]
pub struct RemoveLastParcel {
    pub pickup_point_id: PickupPointId,
}

impl RemoveLastParcel {
    pub fn new(pickup_point_id: PickupPointId) -> Self {
        Self { pickup_point_id }
    }
}

impl Command for RemoveLastParcel {
    fn operation(&self) -> Operation {
        Operation::RemoveLastParcel
    }
}

/// Query for one page of pickup points with their reception history.
#[derive(Debug, Clone, Copy)]
pub struct ListPickupPoints {
    /// Only receptions opened at or after this instant.
    pub start_date: Option<DateTime<Utc>>,

    /// Only receptions opened at or before this instant.
    pub end_date: Option<DateTime<Utc>>,

    /// 1-based page number.
    pub page: i64,

    pub limit: i64,
}

impl ListPickupPoints {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            start_date: None,
            end_date: None,
            page,
            limit,
        }
    }

    pub fn since(mut self, start_date: DateTime<Utc>) -> Self {
        self.start_date = Some(start_date);
        self
    }

    pub fn until(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }
}

impl Default for ListPickupPoints {
    fn default() -> Self {
        Self::new(
            crate::catalog::DEFAULT_PAGE,
            crate::catalog::DEFAULT_LIMIT,
        )
    }
}

impl Command for ListPickupPoints {
    fn operation(&self) -> Operation {
        Operation::ListPickupPoints
    }
}
