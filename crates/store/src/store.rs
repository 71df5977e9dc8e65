use async_trait::async_trait;
use common::{City, Parcel, ParcelType, PickupPoint, PickupPointId, Reception, ReceptionId};

use crate::{Page, ReceptionWindow, Result};

/// Repository contract for pickup points, receptions and parcels.
///
/// The four reception/parcel mutations are conditional writes: each one
/// checks its precondition and applies its change as a single atomic unit,
/// so concurrent callers (including other processes sharing the same
/// database) can never observe the gap between check and write.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait PickupPointStore: Send + Sync {
    /// Registers a new pickup point in `city`.
    async fn create_pickup_point(&self, city: City) -> Result<PickupPoint>;

    /// Returns one page of pickup points, most recently registered first
    /// (ties broken by id, descending).
    async fn list_pickup_points(&self, page: Page) -> Result<Vec<PickupPoint>>;

    /// Returns the in-progress reception of a pickup point, if any.
    ///
    /// Fails with `PickupPointNotFound` when the pickup point is unknown.
    async fn find_open_reception(&self, pickup_point_id: PickupPointId)
    -> Result<Option<Reception>>;

    /// Opens a reception unless one is already in progress.
    ///
    /// Fails with `OpenReceptionExists` when the pickup point already has
    /// an in-progress reception.
    async fn open_reception(&self, pickup_point_id: PickupPointId) -> Result<Reception>;

    /// Closes the in-progress reception and returns it in its closed state.
    ///
    /// Fails with `NoOpenReception` when nothing is in progress.
    async fn close_reception(&self, pickup_point_id: PickupPointId) -> Result<Reception>;

    /// Appends a parcel to the in-progress reception.
    ///
    /// Fails with `NoOpenReception` when nothing is in progress.
    async fn add_parcel(
        &self,
        pickup_point_id: PickupPointId,
        parcel_type: ParcelType,
    ) -> Result<Parcel>;

    /// Deletes the most recently added parcel of the in-progress reception
    /// and returns it.
    ///
    /// Fails with `NothingToRemove` when there is no in-progress reception
    /// or it holds no parcels.
    async fn remove_last_parcel(&self, pickup_point_id: PickupPointId) -> Result<Parcel>;

    /// Returns the receptions of a pickup point opened inside `window`,
    /// most recent first (ties broken by id, descending).
    async fn list_receptions(
        &self,
        pickup_point_id: PickupPointId,
        window: ReceptionWindow,
    ) -> Result<Vec<Reception>>;

    /// Returns all parcels of a reception, most recently added first.
    async fn list_parcels(&self, reception_id: ReceptionId) -> Result<Vec<Parcel>>;
}
