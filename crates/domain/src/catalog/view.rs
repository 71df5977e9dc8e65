use common::{Parcel, PickupPoint, Reception};
use serde::Serialize;

/// A pickup point together with its receptions inside the requested window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickupPointView {
    pub pvz: PickupPoint,
    pub receptions: Vec<ReceptionView>,
}

/// A reception together with all of its parcels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceptionView {
    pub reception: Reception,
    #[serde(rename = "products")]
    pub parcels: Vec<Parcel>,
}
