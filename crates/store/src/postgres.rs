use async_trait::async_trait;
use common::{
    City, Parcel, ParcelId, ParcelType, PickupPoint, PickupPointId, Reception, ReceptionId,
    ReceptionStatus,
};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::{Page, PickupPointStore, ReceptionWindow, Result, StoreError};

const RECEPTION_COLUMNS: &str = "id, pickup_point_id, opened_at, status";
const PARCEL_COLUMNS: &str = "id, reception_id, parcel_type, added_at";

/// PostgreSQL-backed pickup point store.
///
/// Each reception/parcel mutation runs in its own transaction that first
/// locks the pickup point row (`FOR UPDATE`), so mutations against the same
/// pickup point are serialised across every process sharing the database.
/// The partial unique index `receptions_one_open_per_pickup_point` backs the
/// single-open-reception rule at the schema level as well.
#[derive(Clone)]
pub struct PostgresPickupPointStore {
    pool: PgPool,
}

impl PostgresPickupPointStore {
    /// Creates a new PostgreSQL pickup point store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool of at most `max_connections` to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        tracing::info!(max_connections, "connected to PostgreSQL");
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_pickup_point(row: PgRow) -> Result<PickupPoint> {
        let city: String = row.try_get("city")?;

        Ok(PickupPoint {
            id: PickupPointId::from_uuid(row.try_get::<Uuid, _>("id")?),
            registered_at: row.try_get("registered_at")?,
            city: city.parse::<City>()?,
        })
    }

    fn row_to_reception(row: PgRow) -> Result<Reception> {
        let status: String = row.try_get("status")?;

        Ok(Reception {
            id: ReceptionId::from_uuid(row.try_get::<Uuid, _>("id")?),
            opened_at: row.try_get("opened_at")?,
            pickup_point_id: PickupPointId::from_uuid(row.try_get::<Uuid, _>("pickup_point_id")?),
            status: status.parse::<ReceptionStatus>()?,
        })
    }

    fn row_to_parcel(row: PgRow) -> Result<Parcel> {
        let parcel_type: String = row.try_get("parcel_type")?;

        Ok(Parcel {
            id: ParcelId::from_uuid(row.try_get::<Uuid, _>("id")?),
            added_at: row.try_get("added_at")?,
            parcel_type: parcel_type.parse::<ParcelType>()?,
            reception_id: ReceptionId::from_uuid(row.try_get::<Uuid, _>("reception_id")?),
        })
    }

    /// Locks the pickup point row for the rest of the transaction.
    async fn lock_pickup_point(
        tx: &mut Transaction<'_, Postgres>,
        pickup_point_id: PickupPointId,
    ) -> Result<()> {
        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM pickup_points WHERE id = $1 FOR UPDATE")
                .bind(pickup_point_id.as_uuid())
                .fetch_optional(&mut **tx)
                .await?;

        match locked {
            Some(_) => Ok(()),
            None => Err(StoreError::PickupPointNotFound(pickup_point_id)),
        }
    }
}

#[async_trait]
impl PickupPointStore for PostgresPickupPointStore {
    async fn create_pickup_point(&self, city: City) -> Result<PickupPoint> {
        let row = sqlx::query(
            r#"
            INSERT INTO pickup_points (id, city)
            VALUES ($1, $2)
            RETURNING id, registered_at, city
            "#,
        )
        .bind(PickupPointId::new().as_uuid())
        .bind(city.as_str())
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_pickup_point(row)
    }

    async fn list_pickup_points(&self, page: Page) -> Result<Vec<PickupPoint>> {
        let rows = sqlx::query(
            r#"
            SELECT id, registered_at, city
            FROM pickup_points
            ORDER BY registered_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(i64::from(page.limit()))
        .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_pickup_point).collect()
    }

    async fn find_open_reception(
        &self,
        pickup_point_id: PickupPointId,
    ) -> Result<Option<Reception>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT p.id AS pvz_id, r.id, r.pickup_point_id, r.opened_at, r.status
            FROM pickup_points p
            LEFT JOIN receptions r
                ON r.pickup_point_id = p.id AND r.status = 'in_progress'
            WHERE p.id = $1
            "#,
        )
        .bind(pickup_point_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Err(StoreError::PickupPointNotFound(pickup_point_id));
        };

        if row.try_get::<Option<Uuid>, _>("id")?.is_none() {
            return Ok(None);
        }
        Self::row_to_reception(row).map(Some)
    }

    async fn open_reception(&self, pickup_point_id: PickupPointId) -> Result<Reception> {
        let mut tx = self.pool.begin().await?;
        Self::lock_pickup_point(&mut tx, pickup_point_id).await?;

        let sql = format!(
            r#"
            INSERT INTO receptions (id, pickup_point_id, status)
            SELECT $1, $2, 'in_progress'
            WHERE NOT EXISTS (
                SELECT 1 FROM receptions
                WHERE pickup_point_id = $2 AND status = 'in_progress'
            )
            RETURNING {RECEPTION_COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(ReceptionId::new().as_uuid())
            .bind(pickup_point_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                // The partial unique index is the last line of defence
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some("receptions_one_open_per_pickup_point")
                {
                    return StoreError::OpenReceptionExists(pickup_point_id);
                }
                StoreError::Database(e)
            })?;

        let Some(row) = row else {
            tracing::debug!(%pickup_point_id, "open reception already exists");
            return Err(StoreError::OpenReceptionExists(pickup_point_id));
        };

        let reception = Self::row_to_reception(row)?;
        tx.commit().await?;
        Ok(reception)
    }

    async fn close_reception(&self, pickup_point_id: PickupPointId) -> Result<Reception> {
        let mut tx = self.pool.begin().await?;
        Self::lock_pickup_point(&mut tx, pickup_point_id).await?;

        let sql = format!(
            r#"
            UPDATE receptions
            SET status = 'close'
            WHERE pickup_point_id = $1 AND status = 'in_progress'
            RETURNING {RECEPTION_COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(pickup_point_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NoOpenReception(pickup_point_id))?;

        let reception = Self::row_to_reception(row)?;
        tx.commit().await?;
        Ok(reception)
    }

    async fn add_parcel(
        &self,
        pickup_point_id: PickupPointId,
        parcel_type: ParcelType,
    ) -> Result<Parcel> {
        let mut tx = self.pool.begin().await?;
        Self::lock_pickup_point(&mut tx, pickup_point_id).await?;

        let sql = format!(
            r#"
            INSERT INTO parcels (id, reception_id, parcel_type)
            SELECT $1, r.id, $3
            FROM receptions r
            WHERE r.pickup_point_id = $2 AND r.status = 'in_progress'
            RETURNING {PARCEL_COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(ParcelId::new().as_uuid())
            .bind(pickup_point_id.as_uuid())
            .bind(parcel_type.as_str())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NoOpenReception(pickup_point_id))?;

        let parcel = Self::row_to_parcel(row)?;
        tx.commit().await?;
        Ok(parcel)
    }

    async fn remove_last_parcel(&self, pickup_point_id: PickupPointId) -> Result<Parcel> {
        let mut tx = self.pool.begin().await?;
        Self::lock_pickup_point(&mut tx, pickup_point_id).await?;

        let sql = format!(
            r#"
            DELETE FROM parcels
            WHERE seq = (
                SELECT p.seq
                FROM parcels p
                JOIN receptions r ON r.id = p.reception_id
                WHERE r.pickup_point_id = $1 AND r.status = 'in_progress'
                ORDER BY p.added_at DESC, p.seq DESC
                LIMIT 1
            )
            RETURNING {PARCEL_COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(pickup_point_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NothingToRemove(pickup_point_id))?;

        let parcel = Self::row_to_parcel(row)?;
        tx.commit().await?;
        Ok(parcel)
    }

    async fn list_receptions(
        &self,
        pickup_point_id: PickupPointId,
        window: ReceptionWindow,
    ) -> Result<Vec<Reception>> {
        let mut sql = format!("SELECT {RECEPTION_COLUMNS} FROM receptions WHERE pickup_point_id = $1");
        let mut param_count = 1;

        if window.from.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND opened_at >= ${param_count}"));
        }
        if window.to.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND opened_at <= ${param_count}"));
        }

        sql.push_str(" ORDER BY opened_at DESC, id DESC");

        let mut query = sqlx::query(&sql).bind(pickup_point_id.as_uuid());
        if let Some(from) = window.from {
            query = query.bind(from);
        }
        if let Some(to) = window.to {
            query = query.bind(to);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_reception).collect()
    }

    async fn list_parcels(&self, reception_id: ReceptionId) -> Result<Vec<Parcel>> {
        let sql = format!(
            r#"
            SELECT {PARCEL_COLUMNS}
            FROM parcels
            WHERE reception_id = $1
            ORDER BY added_at DESC, seq DESC
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(reception_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_parcel).collect()
    }
}
