//! Pickup point registration and the history listing.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use common::PickupPoint;
use domain::{
    CreatePickupPoint, DEFAULT_LIMIT, DEFAULT_PAGE, ListPickupPoints, Operation, PickupPointView,
    ReceptionState, authorize,
};
use serde::Deserialize;
use store::PickupPointStore;

use super::{AppState, parse_pickup_point_id};
use crate::error::ApiError;
use crate::identity::Caller;

#[derive(Debug, Deserialize)]
pub struct CreatePvzRequest {
    pub city: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPvzQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Which end of a date-only bound to expand to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    StartOfDay,
    EndOfDay,
}

/// Parses an RFC 3339 instant or a bare `YYYY-MM-DD` date.
fn parse_bound(name: &str, raw: &str, edge: Edge) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        ApiError::BadRequest(format!(
            "Invalid {name}: expected YYYY-MM-DD or RFC 3339, got '{raw}'"
        ))
    })?;

    let time = match edge {
        Edge::StartOfDay => NaiveTime::from_hms_opt(0, 0, 0),
        Edge::EndOfDay => NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999),
    }
    .ok_or_else(|| ApiError::BadRequest(format!("Invalid {name}")))?;
    Ok(date.and_time(time).and_utc())
}

impl ListPvzQuery {
    fn into_command(self) -> Result<ListPickupPoints, ApiError> {
        let mut query = ListPickupPoints::new(
            self.page.unwrap_or(DEFAULT_PAGE),
            self.limit.unwrap_or(DEFAULT_LIMIT),
        );
        if let Some(raw) = self.start_date.as_deref().filter(|s| !s.is_empty()) {
            query = query.since(parse_bound("startDate", raw, Edge::StartOfDay)?);
        }
        if let Some(raw) = self.end_date.as_deref().filter(|s| !s.is_empty()) {
            query = query.until(parse_bound("endDate", raw, Edge::EndOfDay)?);
        }
        Ok(query)
    }
}

/// POST /pvz
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: PickupPointStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    payload: Result<Json<CreatePvzRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PickupPoint>), ApiError> {
    // Identity problems win over malformed bodies.
    authorize(caller.identity(), Operation::CreatePickupPoint)?;
    let Json(req) = payload?;

    let pickup_point = state
        .catalog
        .create_pickup_point(caller.identity(), CreatePickupPoint::new(req.city))
        .await?;

    Ok((StatusCode::CREATED, Json(pickup_point)))
}

/// GET /pvz
#[tracing::instrument(skip(state, query))]
pub async fn list<S: PickupPointStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    query: Result<Query<ListPvzQuery>, QueryRejection>,
) -> Result<Json<Vec<PickupPointView>>, ApiError> {
    authorize(caller.identity(), Operation::ListPickupPoints)?;
    let Query(query) = query?;

    let views = state
        .catalog
        .list_pickup_points(caller.identity(), query.into_command()?)
        .await?;

    Ok(Json(views))
}

/// GET /pvz/{pvzId}/reception
#[tracing::instrument(skip(state))]
pub async fn reception_state<S: PickupPointStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(pvz_id): Path<String>,
) -> Result<Json<ReceptionState>, ApiError> {
    authorize(caller.identity(), Operation::ListPickupPoints)?;
    let pickup_point_id = parse_pickup_point_id(&pvz_id)?;

    let reception_state = state
        .receptions
        .reception_state(caller.identity(), pickup_point_id)
        .await?;

    Ok(Json(reception_state))
}
