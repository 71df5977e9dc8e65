//! Parcel intake and LIFO removal endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{Parcel, PickupPointId};
use domain::{AddParcel, Operation, RemoveLastParcel, authorize};
use serde::Deserialize;
use store::PickupPointStore;

use super::{AppState, parse_pickup_point_id};
use crate::error::ApiError;
use crate::identity::Caller;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddParcelRequest {
    #[serde(rename = "type")]
    pub parcel_type: String,
    pub pvz_id: Option<PickupPointId>,
}

/// POST /products
#[tracing::instrument(skip(state, payload))]
pub async fn add<S: PickupPointStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    payload: Result<Json<AddParcelRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Parcel>), ApiError> {
    authorize(caller.identity(), Operation::AddParcel)?;
    let Json(req) = payload?;
    let pickup_point_id = req
        .pvz_id
        .unwrap_or_else(|| PickupPointId::from_uuid(uuid::Uuid::nil()));

    let parcel = state
        .receptions
        .add_parcel(
            caller.identity(),
            AddParcel::new(pickup_point_id, req.parcel_type),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(parcel)))
}

/// POST /pvz/{pvzId}/delete_last_product
#[tracing::instrument(skip(state))]
pub async fn remove_last<S: PickupPointStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(pvz_id): Path<String>,
) -> Result<Json<Parcel>, ApiError> {
    authorize(caller.identity(), Operation::RemoveLastParcel)?;
    let pickup_point_id = parse_pickup_point_id(&pvz_id)?;

    let parcel = state
        .receptions
        .remove_last_parcel(caller.identity(), RemoveLastParcel::new(pickup_point_id))
        .await?;

    Ok(Json(parcel))
}
