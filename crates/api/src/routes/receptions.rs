//! Reception open/close endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{PickupPointId, Reception};
use domain::{CloseReception, OpenReception, Operation, authorize};
use serde::Deserialize;
use store::PickupPointStore;

use super::{AppState, parse_pickup_point_id};
use crate::error::ApiError;
use crate::identity::Caller;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenReceptionRequest {
    pub pvz_id: Option<PickupPointId>,
}

/// POST /receptions
#[tracing::instrument(skip(state, payload))]
pub async fn open<S: PickupPointStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    payload: Result<Json<OpenReceptionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Reception>), ApiError> {
    authorize(caller.identity(), Operation::OpenReception)?;
    let Json(req) = payload?;
    // An absent id reaches the domain as nil and is rejected there.
    let pickup_point_id = req
        .pvz_id
        .unwrap_or_else(|| PickupPointId::from_uuid(uuid::Uuid::nil()));

    let reception = state
        .receptions
        .open_reception(caller.identity(), OpenReception::new(pickup_point_id))
        .await?;

    Ok((StatusCode::CREATED, Json(reception)))
}

/// POST /pvz/{pvzId}/close_last_reception
#[tracing::instrument(skip(state))]
pub async fn close<S: PickupPointStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(pvz_id): Path<String>,
) -> Result<Json<Reception>, ApiError> {
    authorize(caller.identity(), Operation::CloseReception)?;
    let pickup_point_id = parse_pickup_point_id(&pvz_id)?;

    let reception = state
        .receptions
        .close_reception(caller.identity(), CloseReception::new(pickup_point_id))
        .await?;

    Ok(Json(reception))
}
