use std::cmp::Reverse;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{
    City, Parcel, ParcelId, ParcelType, PickupPoint, PickupPointId, Reception, ReceptionId,
    ReceptionStatus,
};
use tokio::sync::RwLock;

use crate::{Page, PickupPointStore, ReceptionWindow, Result, StoreError};

/// A parcel together with its insertion sequence number.
///
/// The sequence number breaks ties between parcels added within the same
/// clock tick, mirroring the `seq` column of the PostgreSQL schema.
#[derive(Debug, Clone)]
struct StoredParcel {
    seq: u64,
    parcel: Parcel,
}

#[derive(Debug, Default)]
struct Tables {
    pickup_points: Vec<PickupPoint>,
    receptions: Vec<Reception>,
    parcels: Vec<StoredParcel>,
    next_seq: u64,
}

impl Tables {
    fn ensure_pickup_point(&self, id: PickupPointId) -> Result<()> {
        if self.pickup_points.iter().any(|p| p.id == id) {
            Ok(())
        } else {
            Err(StoreError::PickupPointNotFound(id))
        }
    }

    fn open_reception(&self, pickup_point_id: PickupPointId) -> Option<&Reception> {
        self.receptions
            .iter()
            .find(|r| r.pickup_point_id == pickup_point_id && r.is_open())
    }
}

/// In-memory pickup point store.
///
/// Every mutation runs inside a single write-lock critical section with no
/// await point between the precondition check and the write, which gives
/// the same all-or-nothing behaviour as the transactional PostgreSQL store
/// within one process.
#[derive(Clone, Default)]
pub struct InMemoryPickupPointStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryPickupPointStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of pickup points stored.
    pub async fn pickup_point_count(&self) -> usize {
        self.tables.read().await.pickup_points.len()
    }

    /// Returns the total number of parcels stored, across all receptions.
    pub async fn parcel_count(&self) -> usize {
        self.tables.read().await.parcels.len()
    }

    /// Clears all pickup points, receptions and parcels.
    pub async fn clear(&self) {
        let mut tables = self.tables.write().await;
        *tables = Tables::default();
    }
}

#[async_trait]
impl PickupPointStore for InMemoryPickupPointStore {
    async fn create_pickup_point(&self, city: City) -> Result<PickupPoint> {
        let pickup_point = PickupPoint {
            id: PickupPointId::new(),
            registered_at: Utc::now(),
            city,
        };

        self.tables
            .write()
            .await
            .pickup_points
            .push(pickup_point.clone());
        Ok(pickup_point)
    }

    async fn list_pickup_points(&self, page: Page) -> Result<Vec<PickupPoint>> {
        let tables = self.tables.read().await;
        let mut pickup_points = tables.pickup_points.clone();
        pickup_points.sort_by_key(|p| Reverse((p.registered_at, p.id)));

        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        Ok(pickup_points
            .into_iter()
            .skip(offset)
            .take(page.limit() as usize)
            .collect())
    }

    async fn find_open_reception(
        &self,
        pickup_point_id: PickupPointId,
    ) -> Result<Option<Reception>> {
        let tables = self.tables.read().await;
        tables.ensure_pickup_point(pickup_point_id)?;
        Ok(tables.open_reception(pickup_point_id).cloned())
    }

    async fn open_reception(&self, pickup_point_id: PickupPointId) -> Result<Reception> {
        let mut tables = self.tables.write().await;
        tables.ensure_pickup_point(pickup_point_id)?;

        if tables.open_reception(pickup_point_id).is_some() {
            return Err(StoreError::OpenReceptionExists(pickup_point_id));
        }

        let reception = Reception {
            id: ReceptionId::new(),
            opened_at: Utc::now(),
            pickup_point_id,
            status: ReceptionStatus::InProgress,
        };
        tables.receptions.push(reception.clone());
        Ok(reception)
    }

    async fn close_reception(&self, pickup_point_id: PickupPointId) -> Result<Reception> {
        let mut tables = self.tables.write().await;
        tables.ensure_pickup_point(pickup_point_id)?;

        let reception = tables
            .receptions
            .iter_mut()
            .find(|r| r.pickup_point_id == pickup_point_id && r.is_open())
            .ok_or(StoreError::NoOpenReception(pickup_point_id))?;

        reception.status = ReceptionStatus::Closed;
        Ok(reception.clone())
    }

    async fn add_parcel(
        &self,
        pickup_point_id: PickupPointId,
        parcel_type: ParcelType,
    ) -> Result<Parcel> {
        let mut tables = self.tables.write().await;
        tables.ensure_pickup_point(pickup_point_id)?;

        let reception_id = tables
            .open_reception(pickup_point_id)
            .map(|r| r.id)
            .ok_or(StoreError::NoOpenReception(pickup_point_id))?;

        let parcel = Parcel {
            id: ParcelId::new(),
            added_at: Utc::now(),
            parcel_type,
            reception_id,
        };

        tables.next_seq += 1;
        let seq = tables.next_seq;
        tables.parcels.push(StoredParcel {
            seq,
            parcel: parcel.clone(),
        });
        Ok(parcel)
    }

    async fn remove_last_parcel(&self, pickup_point_id: PickupPointId) -> Result<Parcel> {
        let mut tables = self.tables.write().await;
        tables.ensure_pickup_point(pickup_point_id)?;

        let reception_id = tables
            .open_reception(pickup_point_id)
            .map(|r| r.id)
            .ok_or(StoreError::NothingToRemove(pickup_point_id))?;

        let index = tables
            .parcels
            .iter()
            .enumerate()
            .filter(|(_, p)| p.parcel.reception_id == reception_id)
            .max_by_key(|(_, p)| (p.parcel.added_at, p.seq))
            .map(|(index, _)| index)
            .ok_or(StoreError::NothingToRemove(pickup_point_id))?;

        Ok(tables.parcels.remove(index).parcel)
    }

    async fn list_receptions(
        &self,
        pickup_point_id: PickupPointId,
        window: ReceptionWindow,
    ) -> Result<Vec<Reception>> {
        let tables = self.tables.read().await;
        let mut receptions: Vec<_> = tables
            .receptions
            .iter()
            .filter(|r| r.pickup_point_id == pickup_point_id && window.contains(r.opened_at))
            .cloned()
            .collect();

        receptions.sort_by_key(|r| Reverse((r.opened_at, r.id)));
        Ok(receptions)
    }

    async fn list_parcels(&self, reception_id: ReceptionId) -> Result<Vec<Parcel>> {
        let tables = self.tables.read().await;
        let mut parcels: Vec<_> = tables
            .parcels
            .iter()
            .filter(|p| p.parcel.reception_id == reception_id)
            .cloned()
            .collect();

        parcels.sort_by_key(|p| Reverse((p.parcel.added_at, p.seq)));
        Ok(parcels.into_iter().map(|p| p.parcel).collect())
    }
}
