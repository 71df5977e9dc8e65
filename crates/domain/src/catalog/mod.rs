//! Pickup point catalog: registration and the nested history listing.

mod pagination;
mod service;
mod view;

pub use pagination::{DEFAULT_LIMIT, DEFAULT_PAGE, PageRequest};
pub use service::CatalogService;
pub use view::{PickupPointView, ReceptionView};
