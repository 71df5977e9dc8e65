//! HTTP handlers grouped by resource.

pub mod parcels;
pub mod pvz;
pub mod receptions;
pub mod system;

use std::time::Duration;

use common::PickupPointId;
use domain::{CatalogService, ReceptionService};
use store::PickupPointStore;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: PickupPointStore> {
    pub catalog: CatalogService<S>,
    pub receptions: ReceptionService<S>,
}

impl<S: PickupPointStore + Clone> AppState<S> {
    /// Builds both services over one store, each call bounded by `store_timeout`.
    pub fn new(store: S, store_timeout: Option<Duration>) -> Self {
        match store_timeout {
            Some(timeout) => Self {
                catalog: CatalogService::with_timeout(store.clone(), timeout),
                receptions: ReceptionService::with_timeout(store, timeout),
            },
            None => Self {
                catalog: CatalogService::new(store.clone()),
                receptions: ReceptionService::new(store),
            },
        }
    }
}

/// Parses a pickup point id taken from the URL path.
pub(crate) fn parse_pickup_point_id(raw: &str) -> Result<PickupPointId, ApiError> {
    uuid::Uuid::parse_str(raw)
        .map(PickupPointId::from_uuid)
        .map_err(|e| ApiError::BadRequest(format!("Invalid pvzId: {e}")))
}
