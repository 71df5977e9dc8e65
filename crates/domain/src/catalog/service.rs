use std::time::{Duration, Instant};

use common::{City, PickupPoint};
use futures_util::future::try_join_all;
use store::{PickupPointStore, ReceptionWindow};

use crate::auth::{Identity, Operation, authorize};
use crate::command::{Command, CreatePickupPoint, ListPickupPoints};
use crate::deadline::StoreDeadline;
use crate::error::{DomainError, ListingStage, ValidationError};

use super::pagination::{PageRequest, reception_window};
use super::{PickupPointView, ReceptionView};

/// Service for registering pickup points and listing their history.
pub struct CatalogService<S: PickupPointStore> {
    store: S,
    deadline: StoreDeadline,
}

impl<S: PickupPointStore> CatalogService<S> {
    /// Creates a new catalog service with no store deadline.
    pub fn new(store: S) -> Self {
        Self {
            store,
            deadline: StoreDeadline::none(),
        }
    }

    /// Creates a new catalog service bounding each store call by `timeout`.
    pub fn with_timeout(store: S, timeout: Duration) -> Self {
        Self {
            store,
            deadline: StoreDeadline::after(timeout),
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Registers a pickup point in one of the supported cities.
    #[tracing::instrument(skip(self))]
    pub async fn create_pickup_point(
        &self,
        identity: Option<&Identity>,
        cmd: CreatePickupPoint,
    ) -> Result<PickupPoint, DomainError> {
        let operation = cmd.operation();
        authorize(identity, operation)?;
        let city = cmd.city.parse::<City>().map_err(|e| {
            DomainError::from(ValidationError::InvalidCity(e)).rejected(operation)
        })?;

        let pickup_point = self
            .deadline
            .run(operation, self.store.create_pickup_point(city))
            .await?
            .map_err(|e| DomainError::from(e).rejected(operation))?;

        metrics::counter!("pvz_created_total", "city" => city.as_str()).increment(1);
        tracing::info!(pickup_point_id = %pickup_point.id, %city, "pickup point created");
        Ok(pickup_point)
    }

    /// Returns one page of pickup points, each with the receptions opened
    /// inside the requested window and every parcel of those receptions.
    ///
    /// Any failing stage aborts the whole listing.
    #[tracing::instrument(skip(self))]
    pub async fn list_pickup_points(
        &self,
        identity: Option<&Identity>,
        query: ListPickupPoints,
    ) -> Result<Vec<PickupPointView>, DomainError> {
        let operation = query.operation();
        authorize(identity, operation)?;
        let request = PageRequest::new(query.page, query.limit)
            .map_err(|e| DomainError::from(e).rejected(operation))?;
        let window = reception_window(query.start_date, query.end_date)
            .map_err(|e| DomainError::from(e).rejected(operation))?;

        let started = Instant::now();

        let pickup_points = self
            .deadline
            .run(operation, self.store.list_pickup_points(request.to_page()))
            .await?
            .map_err(|e| DomainError::listing(ListingStage::PickupPoints, e).rejected(operation))?;

        let views = try_join_all(
            pickup_points
                .into_iter()
                .map(|pickup_point| self.assemble(pickup_point, window)),
        )
        .await?;

        metrics::histogram!("catalog_query_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::debug!(
            page = request.page(),
            limit = request.limit(),
            returned = views.len(),
            "pickup points listed"
        );
        Ok(views)
    }

    async fn assemble(
        &self,
        pickup_point: PickupPoint,
        window: ReceptionWindow,
    ) -> Result<PickupPointView, DomainError> {
        let operation = Operation::ListPickupPoints;

        let receptions = self
            .deadline
            .run(
                operation,
                self.store.list_receptions(pickup_point.id, window),
            )
            .await?
            .map_err(|e| DomainError::listing(ListingStage::Receptions, e).rejected(operation))?;

        let receptions = try_join_all(receptions.into_iter().map(|reception| async move {
            let parcels = self
                .deadline
                .run(operation, self.store.list_parcels(reception.id))
                .await?
                .map_err(|e| DomainError::listing(ListingStage::Parcels, e).rejected(operation))?;

            Ok::<_, DomainError>(ReceptionView { reception, parcels })
        }))
        .await?;

        Ok(PickupPointView {
            pvz: pickup_point,
            receptions,
        })
    }
}
