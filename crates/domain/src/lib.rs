//! Domain layer for the pickup point reception service.
//!
//! This crate provides:
//! - The role-based authorization policy over a closed set of operations
//! - The error taxonomy every transport maps onto its own status codes
//! - The reception lifecycle service (open/close, LIFO parcel intake)
//! - The catalog service (pickup point registration, nested history listing)

pub mod auth;
pub mod catalog;
pub mod command;
pub mod deadline;
pub mod error;
pub mod reception;

pub use auth::{Identity, Operation, authorize, is_allowed};
pub use catalog::{
    CatalogService, DEFAULT_LIMIT, DEFAULT_PAGE, PageRequest, PickupPointView,
    ReceptionView,
};
pub use command::{
    AddParcel, CloseReception, Command, CreatePickupPoint, ListPickupPoints, OpenReception,
    RemoveLastParcel,
};
pub use deadline::StoreDeadline;
pub use error::{DomainError, ErrorKind, ListingStage, ValidationError};
pub use reception::{ReceptionService, ReceptionState};
