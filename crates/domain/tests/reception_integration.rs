//! Integration tests for the reception lifecycle and catalog services.
//!
//! These tests drive the services end to end against the in-memory store,
//! covering the single-open-reception rule, LIFO parcel removal, the
//! authorization matrix and the catalog listing.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::{
    City, Parcel, ParcelType, ParseVariantError, PickupPoint, PickupPointId, Reception,
    ReceptionId, ReceptionStatus,
};
use domain::{
    AddParcel, CatalogService, CloseReception, CreatePickupPoint, DomainError, ErrorKind,
    Identity, ListPickupPoints, ListingStage, OpenReception, Operation, ReceptionService,
    ReceptionState, RemoveLastParcel, is_allowed,
};
use store::{InMemoryPickupPointStore, Page, PickupPointStore, ReceptionWindow, StoreError};

/// Store wrapper that counts calls and can be told to fail or stall.
#[derive(Clone, Default)]
struct CountingStore {
    inner: InMemoryPickupPointStore,
    calls: Arc<AtomicUsize>,
    fail_pickup_points: bool,
    fail_receptions: bool,
    fail_parcels: bool,
    delay: Option<Duration>,
}

impl CountingStore {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn corrupt_row() -> StoreError {
    StoreError::Decode(ParseVariantError {
        kind: "parcel type",
        value: "мебель".to_string(),
        expected: "электроника, одежда, обувь",
    })
}

#[async_trait]
impl PickupPointStore for CountingStore {
    async fn create_pickup_point(&self, city: City) -> store::Result<PickupPoint> {
        self.touch().await;
        self.inner.create_pickup_point(city).await
    }

    async fn list_pickup_points(&self, page: Page) -> store::Result<Vec<PickupPoint>> {
        self.touch().await;
        if self.fail_pickup_points {
            return Err(corrupt_row());
        }
        self.inner.list_pickup_points(page).await
    }

    async fn find_open_reception(&self, id: PickupPointId) -> store::Result<Option<Reception>> {
        self.touch().await;
        self.inner.find_open_reception(id).await
    }

    async fn open_reception(&self, id: PickupPointId) -> store::Result<Reception> {
        self.touch().await;
        self.inner.open_reception(id).await
    }

    async fn close_reception(&self, id: PickupPointId) -> store::Result<Reception> {
        self.touch().await;
        self.inner.close_reception(id).await
    }

    async fn add_parcel(&self, id: PickupPointId, parcel_type: ParcelType) -> store::Result<Parcel> {
        self.touch().await;
        self.inner.add_parcel(id, parcel_type).await
    }

    async fn remove_last_parcel(&self, id: PickupPointId) -> store::Result<Parcel> {
        self.touch().await;
        self.inner.remove_last_parcel(id).await
    }

    async fn list_receptions(
        &self,
        id: PickupPointId,
        window: ReceptionWindow,
    ) -> store::Result<Vec<Reception>> {
        self.touch().await;
        if self.fail_receptions {
            return Err(corrupt_row());
        }
        self.inner.list_receptions(id, window).await
    }

    async fn list_parcels(&self, reception_id: ReceptionId) -> store::Result<Vec<Parcel>> {
        self.touch().await;
        if self.fail_parcels {
            return Err(corrupt_row());
        }
        self.inner.list_parcels(reception_id).await
    }
}

async fn seeded_store() -> (InMemoryPickupPointStore, PickupPointId) {
    let store = InMemoryPickupPointStore::new();
    let pickup_point = store.create_pickup_point(City::Moscow).await.unwrap();
    (store, pickup_point.id)
}

mod reception_lifecycle {
    use super::*;

    #[tokio::test]
    async fn full_intake_scenario() {
        let (store, id) = seeded_store().await;
        let service = ReceptionService::new(store);
        let first = Identity::employee();
        let second = Identity::employee();

        let reception = service
            .open_reception(Some(&first), OpenReception::new(id))
            .await
            .unwrap();

        service
            .add_parcel(Some(&first), AddParcel::new(id, "электроника"))
            .await
            .unwrap();
        service
            .add_parcel(Some(&first), AddParcel::new(id, "обувь"))
            .await
            .unwrap();

        let err = service
            .open_reception(Some(&second), OpenReception::new(id))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConflictOpenReceptionExists);

        let removed = service
            .remove_last_parcel(Some(&first), RemoveLastParcel::new(id))
            .await
            .unwrap();
        assert_eq!(removed.parcel_type, ParcelType::Footwear);
        assert_eq!(removed.reception_id, reception.id);

        let closed = service
            .close_reception(Some(&first), CloseReception::new(id))
            .await
            .unwrap();
        assert_eq!(closed.status, ReceptionStatus::Closed);

        let err = service
            .add_parcel(Some(&first), AddParcel::new(id, "одежда"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoOpenReception);

        assert_eq!(service.store().parcel_count().await, 1);
    }

    #[tokio::test]
    async fn closing_twice_fails() {
        let (store, id) = seeded_store().await;
        let service = ReceptionService::new(store);
        let employee = Identity::employee();

        service
            .open_reception(Some(&employee), OpenReception::new(id))
            .await
            .unwrap();
        service
            .close_reception(Some(&employee), CloseReception::new(id))
            .await
            .unwrap();

        let err = service
            .close_reception(Some(&employee), CloseReception::new(id))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoOpenReception);
    }

    #[tokio::test]
    async fn close_without_open_reception_fails() {
        let (store, id) = seeded_store().await;
        let service = ReceptionService::new(store);

        let err = service
            .close_reception(Some(&Identity::employee()), CloseReception::new(id))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoOpenReception);
    }

    #[tokio::test]
    async fn reopening_after_close_starts_a_new_reception() {
        let (store, id) = seeded_store().await;
        let service = ReceptionService::new(store);
        let employee = Identity::employee();

        let first = service
            .open_reception(Some(&employee), OpenReception::new(id))
            .await
            .unwrap();
        service
            .close_reception(Some(&employee), CloseReception::new(id))
            .await
            .unwrap();
        let second = service
            .open_reception(Some(&employee), OpenReception::new(id))
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        let state = service.reception_state(Some(&employee), id).await.unwrap();
        assert_eq!(state, ReceptionState::Open(second));
    }
}

mod lifo_removal {
    use super::*;

    #[tokio::test]
    async fn removal_reverses_insertion_order() {
        let (store, id) = seeded_store().await;
        let service = ReceptionService::new(store);
        let employee = Identity::employee();
        service
            .open_reception(Some(&employee), OpenReception::new(id))
            .await
            .unwrap();

        let added = ["electronics", "clothing", "обувь", "одежда", "electronics"];
        let mut ids = Vec::new();
        for parcel_type in added {
            let parcel = service
                .add_parcel(Some(&employee), AddParcel::new(id, parcel_type))
                .await
                .unwrap();
            ids.push(parcel.id);
        }

        for expected in ids.into_iter().rev() {
            let removed = service
                .remove_last_parcel(Some(&employee), RemoveLastParcel::new(id))
                .await
                .unwrap();
            assert_eq!(removed.id, expected);
        }

        let err = service
            .remove_last_parcel(Some(&employee), RemoveLastParcel::new(id))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NothingToRemove);
    }

    #[tokio::test]
    async fn removal_never_reaches_closed_receptions() {
        let (store, id) = seeded_store().await;
        let service = ReceptionService::new(store);
        let employee = Identity::employee();

        service
            .open_reception(Some(&employee), OpenReception::new(id))
            .await
            .unwrap();
        service
            .add_parcel(Some(&employee), AddParcel::new(id, "одежда"))
            .await
            .unwrap();
        service
            .close_reception(Some(&employee), CloseReception::new(id))
            .await
            .unwrap();

        let err = service
            .remove_last_parcel(Some(&employee), RemoveLastParcel::new(id))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NothingToRemove);

        service
            .open_reception(Some(&employee), OpenReception::new(id))
            .await
            .unwrap();
        let err = service
            .remove_last_parcel(Some(&employee), RemoveLastParcel::new(id))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NothingToRemove);
        assert_eq!(service.store().parcel_count().await, 1);
    }
}

mod concurrency {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_opens_admit_exactly_one() {
        let (store, id) = seeded_store().await;
        let service = Arc::new(ReceptionService::new(store));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    let employee = Identity::employee();
                    service
                        .open_reception(Some(&employee), OpenReception::new(id))
                        .await
                })
            })
            .collect();

        let mut opened = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => opened += 1,
                Err(DomainError::OpenReceptionExists(p)) => {
                    assert_eq!(p, id);
                    conflicts += 1;
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(opened, 1);
        assert_eq!(conflicts, 15);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_removals_remove_each_parcel_once() {
        let (store, id) = seeded_store().await;
        let service = Arc::new(ReceptionService::new(store));
        let employee = Identity::employee();
        service
            .open_reception(Some(&employee), OpenReception::new(id))
            .await
            .unwrap();
        for _ in 0..5 {
            service
                .add_parcel(Some(&employee), AddParcel::new(id, "обувь"))
                .await
                .unwrap();
        }

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    service
                        .remove_last_parcel(Some(&employee), RemoveLastParcel::new(id))
                        .await
                })
            })
            .collect();

        let mut removed = Vec::new();
        let mut empty = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(parcel) => removed.push(parcel.id),
                Err(e) => {
                    assert_eq!(e.kind(), ErrorKind::NothingToRemove);
                    empty += 1;
                }
            }
        }

        removed.sort();
        removed.dedup();
        assert_eq!(removed.len(), 5);
        assert_eq!(empty, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_store_call_is_cancelled() {
        let (inner, id) = seeded_store().await;
        let store = CountingStore {
            inner,
            delay: Some(Duration::from_secs(30)),
            ..Default::default()
        };
        let service = ReceptionService::with_timeout(store, Duration::from_millis(100));

        let err = service
            .open_reception(Some(&Identity::employee()), OpenReception::new(id))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(
            service
                .store()
                .inner
                .find_open_reception(id)
                .await
                .unwrap()
                .is_none()
        );
    }
}

mod authorization {
    use super::*;

    async fn attempt(
        operation: Operation,
        identity: Option<&Identity>,
        id: PickupPointId,
        store: &CountingStore,
    ) -> Result<(), DomainError> {
        let receptions = ReceptionService::new(store.clone());
        let catalog = CatalogService::new(store.clone());

        match operation {
            Operation::CreatePickupPoint => catalog
                .create_pickup_point(identity, CreatePickupPoint::new("Казань"))
                .await
                .map(|_| ()),
            Operation::ListPickupPoints => catalog
                .list_pickup_points(identity, ListPickupPoints::default())
                .await
                .map(|_| ()),
            Operation::OpenReception => receptions
                .open_reception(identity, OpenReception::new(id))
                .await
                .map(|_| ()),
            Operation::CloseReception => receptions
                .close_reception(identity, CloseReception::new(id))
                .await
                .map(|_| ()),
            Operation::AddParcel => receptions
                .add_parcel(identity, AddParcel::new(id, "одежда"))
                .await
                .map(|_| ()),
            Operation::RemoveLastParcel => receptions
                .remove_last_parcel(identity, RemoveLastParcel::new(id))
                .await
                .map(|_| ()),
        }
    }

    #[tokio::test]
    async fn disallowed_roles_never_reach_the_store() {
        let (inner, id) = seeded_store().await;

        for identity in [Identity::employee(), Identity::moderator()] {
            for operation in Operation::ALL {
                if is_allowed(identity.role, operation) {
                    continue;
                }
                let store = CountingStore {
                    inner: inner.clone(),
                    ..Default::default()
                };

                let err = attempt(operation, Some(&identity), id, &store)
                    .await
                    .unwrap_err();

                assert_eq!(err.kind(), ErrorKind::Forbidden, "{operation}");
                assert_eq!(store.calls(), 0, "{operation} touched the store");
            }
        }
    }

    #[tokio::test]
    async fn missing_identity_never_reaches_the_store() {
        let (inner, id) = seeded_store().await;

        for operation in Operation::ALL {
            let store = CountingStore {
                inner: inner.clone(),
                ..Default::default()
            };

            let err = attempt(operation, None, id, &store).await.unwrap_err();

            assert_eq!(err.kind(), ErrorKind::Unauthenticated, "{operation}");
            assert_eq!(store.calls(), 0, "{operation} touched the store");
        }
    }

    #[tokio::test]
    async fn validation_runs_before_the_store() {
        let (inner, id) = seeded_store().await;
        let store = CountingStore {
            inner,
            ..Default::default()
        };

        let err = ReceptionService::new(store.clone())
            .add_parcel(Some(&Identity::employee()), AddParcel::new(id, "мебель"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);

        let err = CatalogService::new(store.clone())
            .create_pickup_point(Some(&Identity::moderator()), CreatePickupPoint::new("Paris"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);

        assert_eq!(store.calls(), 0);
    }
}

mod catalog {
    use chrono::Duration as ChronoDuration;

    use super::*;

    #[tokio::test]
    async fn unsupported_city_creates_nothing() {
        let service = CatalogService::new(InMemoryPickupPointStore::new());
        let moderator = Identity::moderator();

        let err = service
            .create_pickup_point(Some(&moderator), CreatePickupPoint::new("Новосибирск"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);

        let listed = service
            .list_pickup_points(Some(&moderator), ListPickupPoints::default())
            .await
            .unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn pagination_is_deterministic() {
        let service = CatalogService::new(InMemoryPickupPointStore::new());
        let moderator = Identity::moderator();
        for city in ["Москва", "Казань", "Санкт-Петербург", "Москва", "Казань"] {
            service
                .create_pickup_point(Some(&moderator), CreatePickupPoint::new(city))
                .await
                .unwrap();
        }

        let all = service
            .list_pickup_points(Some(&moderator), ListPickupPoints::new(1, 10))
            .await
            .unwrap();
        assert_eq!(all.len(), 5);
        for pair in all.windows(2) {
            let (newer, older) = (&pair[0].pvz, &pair[1].pvz);
            assert!((newer.registered_at, newer.id) > (older.registered_at, older.id));
        }

        let second = service
            .list_pickup_points(Some(&moderator), ListPickupPoints::new(2, 2))
            .await
            .unwrap();
        let again = service
            .list_pickup_points(Some(&moderator), ListPickupPoints::new(2, 2))
            .await
            .unwrap();
        assert_eq!(second, again);
        assert_eq!(second, all[2..4].to_vec());

        let beyond = service
            .list_pickup_points(Some(&moderator), ListPickupPoints::new(4, 2))
            .await
            .unwrap();
        assert!(beyond.is_empty());
    }

    #[tokio::test]
    async fn receptions_are_filtered_by_window() {
        let (store, id) = seeded_store().await;
        let first = store.open_reception(id).await.unwrap();
        store.close_reception(id).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
        let second = store.open_reception(id).await.unwrap();
        store.add_parcel(id, ParcelType::Clothing).await.unwrap();

        let service = CatalogService::new(store);
        let employee = Identity::employee();

        let everything = service
            .list_pickup_points(Some(&employee), ListPickupPoints::default())
            .await
            .unwrap();
        let receptions: Vec<_> = everything[0]
            .receptions
            .iter()
            .map(|r| r.reception.id)
            .collect();
        assert_eq!(receptions, vec![second.id, first.id]);
        assert_eq!(everything[0].receptions[0].parcels.len(), 1);
        assert!(everything[0].receptions[1].parcels.is_empty());

        let recent = service
            .list_pickup_points(
                Some(&employee),
                ListPickupPoints::default().since(second.opened_at),
            )
            .await
            .unwrap();
        assert_eq!(recent[0].receptions.len(), 1);
        assert_eq!(recent[0].receptions[0].reception.id, second.id);

        let future = service
            .list_pickup_points(
                Some(&employee),
                ListPickupPoints::default().since(second.opened_at + ChronoDuration::days(1)),
            )
            .await
            .unwrap();
        assert_eq!(future.len(), 1);
        assert!(future[0].receptions.is_empty());
    }

    #[tokio::test]
    async fn inverted_window_is_rejected() {
        let service = CatalogService::new(InMemoryPickupPointStore::new());
        let now = chrono::Utc::now();

        let err = service
            .list_pickup_points(
                Some(&Identity::employee()),
                ListPickupPoints::default()
                    .since(now)
                    .until(now - ChronoDuration::hours(1)),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    }

    #[tokio::test]
    async fn failing_stage_aborts_the_listing() {
        let (inner, id) = seeded_store().await;
        inner.open_reception(id).await.unwrap();

        let pickup_points_down = CountingStore {
            inner: inner.clone(),
            fail_pickup_points: true,
            ..Default::default()
        };
        let err = CatalogService::new(pickup_points_down.clone())
            .list_pickup_points(Some(&Identity::employee()), ListPickupPoints::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
        assert!(matches!(
            err,
            DomainError::Listing {
                stage: ListingStage::PickupPoints,
                ..
            }
        ));
        // Later stages never run once the first one fails.
        assert_eq!(pickup_points_down.calls(), 1);

        let receptions_down = CountingStore {
            inner: inner.clone(),
            fail_receptions: true,
            ..Default::default()
        };
        let err = CatalogService::new(receptions_down)
            .list_pickup_points(Some(&Identity::moderator()), ListPickupPoints::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
        assert!(matches!(
            err,
            DomainError::Listing {
                stage: ListingStage::Receptions,
                ..
            }
        ));

        let parcels_down = CountingStore {
            inner,
            fail_parcels: true,
            ..Default::default()
        };
        let err = CatalogService::new(parcels_down)
            .list_pickup_points(Some(&Identity::moderator()), ListPickupPoints::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Listing {
                stage: ListingStage::Parcels,
                ..
            }
        ));
    }
}
