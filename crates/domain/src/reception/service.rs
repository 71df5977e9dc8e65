//! Reception lifecycle service.

use std::time::Duration;

use common::{Parcel, ParcelType, PickupPointId, Reception};
use store::PickupPointStore;

use crate::auth::{Identity, Operation, authorize};
use crate::command::{
    AddParcel, CloseReception, Command, OpenReception, RemoveLastParcel, require_pickup_point,
};
use crate::deadline::StoreDeadline;
use crate::error::{DomainError, ValidationError};

use super::ReceptionState;

/// Service enforcing the reception lifecycle of every pickup point.
///
/// Each operation authorizes the caller, validates input, then issues one
/// atomic conditional write to the store. The store decides the outcome, so
/// any number of service instances may share it.
pub struct ReceptionService<S: PickupPointStore> {
    store: S,
    deadline: StoreDeadline,
}

impl<S: PickupPointStore> ReceptionService<S> {
    /// Creates a new reception service with no store deadline.
    pub fn new(store: S) -> Self {
        Self {
            store,
            deadline: StoreDeadline::none(),
        }
    }

    /// Creates a new reception service bounding each store call by `timeout`.
    pub fn with_timeout(store: S, timeout: Duration) -> Self {
        Self {
            store,
            deadline: StoreDeadline::after(timeout),
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Opens a reception at a pickup point that has none in progress.
    #[tracing::instrument(skip(self))]
    pub async fn open_reception(
        &self,
        identity: Option<&Identity>,
        cmd: OpenReception,
    ) -> Result<Reception, DomainError> {
        let operation = cmd.operation();
        authorize(identity, operation)?;
        let pickup_point_id = require_pickup_point(cmd.pickup_point_id)
            .map_err(|e| DomainError::from(e).rejected(operation))?;

        let reception = self
            .deadline
            .run(operation, self.store.open_reception(pickup_point_id))
            .await?
            .map_err(|e| DomainError::from(e).rejected(operation))?;

        metrics::counter!("receptions_opened_total").increment(1);
        tracing::info!(%pickup_point_id, reception_id = %reception.id, "reception opened");
        Ok(reception)
    }

    /// Closes the reception in progress and returns it.
    #[tracing::instrument(skip(self))]
    pub async fn close_reception(
        &self,
        identity: Option<&Identity>,
        cmd: CloseReception,
    ) -> Result<Reception, DomainError> {
        let operation = cmd.operation();
        authorize(identity, operation)?;
        let pickup_point_id = require_pickup_point(cmd.pickup_point_id)
            .map_err(|e| DomainError::from(e).rejected(operation))?;

        let reception = self
            .deadline
            .run(operation, self.store.close_reception(pickup_point_id))
            .await?
            .map_err(|e| DomainError::from(e).rejected(operation))?;

        metrics::counter!("receptions_closed_total").increment(1);
        tracing::info!(%pickup_point_id, reception_id = %reception.id, "reception closed");
        Ok(reception)
    }

    /// Adds a parcel to the reception in progress.
    ///
    /// The parcel type is checked before the store is touched.
    #[tracing::instrument(skip(self))]
    pub async fn add_parcel(
        &self,
        identity: Option<&Identity>,
        cmd: AddParcel,
    ) -> Result<Parcel, DomainError> {
        let operation = cmd.operation();
        authorize(identity, operation)?;
        let pickup_point_id = require_pickup_point(cmd.pickup_point_id)
            .map_err(|e| DomainError::from(e).rejected(operation))?;
        let parcel_type = cmd.parcel_type.parse::<ParcelType>().map_err(|e| {
            DomainError::from(ValidationError::InvalidParcelType(e)).rejected(operation)
        })?;

        let parcel = self
            .deadline
            .run(operation, self.store.add_parcel(pickup_point_id, parcel_type))
            .await?
            .map_err(|e| DomainError::from(e).rejected(operation))?;

        metrics::counter!("parcels_added_total", "type" => parcel_type.as_str()).increment(1);
        tracing::info!(
            %pickup_point_id,
            parcel_id = %parcel.id,
            %parcel_type,
            "parcel added"
        );
        Ok(parcel)
    }

    /// Removes the most recently added parcel of the reception in progress
    /// and returns it.
    #[tracing::instrument(skip(self))]
    pub async fn remove_last_parcel(
        &self,
        identity: Option<&Identity>,
        cmd: RemoveLastParcel,
    ) -> Result<Parcel, DomainError> {
        let operation = cmd.operation();
        authorize(identity, operation)?;
        let pickup_point_id = require_pickup_point(cmd.pickup_point_id)
            .map_err(|e| DomainError::from(e).rejected(operation))?;

        let parcel = self
            .deadline
            .run(operation, self.store.remove_last_parcel(pickup_point_id))
            .await?
            .map_err(|e| DomainError::from(e).rejected(operation))?;

        metrics::counter!("parcels_removed_total").increment(1);
        tracing::info!(%pickup_point_id, parcel_id = %parcel.id, "parcel removed");
        Ok(parcel)
    }

    /// Reports whether a pickup point has a reception in progress.
    ///
    /// Read-only; requires the listing capability.
    #[tracing::instrument(skip(self))]
    pub async fn reception_state(
        &self,
        identity: Option<&Identity>,
        pickup_point_id: PickupPointId,
    ) -> Result<ReceptionState, DomainError> {
        let operation = Operation::ListPickupPoints;
        authorize(identity, operation)?;
        let pickup_point_id = require_pickup_point(pickup_point_id)
            .map_err(|e| DomainError::from(e).rejected(operation))?;

        let open = self
            .deadline
            .run(operation, self.store.find_open_reception(pickup_point_id))
            .await?
            .map_err(|e| DomainError::from(e).rejected(operation))?;

        Ok(ReceptionState::from_open(open))
    }
}
