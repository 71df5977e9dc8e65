pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use common::{
    City, Parcel, ParcelId, ParcelType, PickupPoint, PickupPointId, Reception, ReceptionId,
    ReceptionStatus,
};
pub use error::{Result, StoreError};
pub use memory::InMemoryPickupPointStore;
pub use postgres::PostgresPickupPointStore;
pub use query::{Page, ReceptionWindow};
pub use store::PickupPointStore;
