//! HTTP API server with observability for the pickup point reception service.
//!
//! Exposes pickup point registration and listing, reception open/close and
//! parcel intake/removal over JSON, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use store::PickupPointStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: PickupPointStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/pvz", post(routes::pvz::create::<S>).get(routes::pvz::list::<S>))
        .route(
            "/pvz/{pvz_id}/reception",
            get(routes::pvz::reception_state::<S>),
        )
        .route(
            "/pvz/{pvz_id}/close_last_reception",
            post(routes::receptions::close::<S>),
        )
        .route(
            "/pvz/{pvz_id}/delete_last_product",
            post(routes::parcels::remove_last::<S>),
        )
        .route("/receptions", post(routes::receptions::open::<S>))
        .route("/products", post(routes::parcels::add::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
