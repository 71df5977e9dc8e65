//! Shared types for the pickup point service.
//!
//! Identifiers, the closed enumerations (cities, parcel types, roles) and
//! the three persisted entities live here so that both the store and the
//! domain crates can speak the same vocabulary.

pub mod model;
pub mod types;

pub use model::{
    City, Parcel, ParcelType, ParseVariantError, PickupPoint, Reception, ReceptionStatus, Role,
};
pub use types::{ParcelId, PickupPointId, ReceptionId, UserId};
