//! PostgreSQL implementation of [`LocationStore`]
//!
//! The schema is owned by the deployment, not by this service. The queries
//! below expect:
//!
//! ```sql
//! CREATE TABLE buoy_location (
//!     id            SERIAL PRIMARY KEY,
//!     location_id   TEXT NOT NULL UNIQUE,
//!     name          TEXT NOT NULL,
//!     url           TEXT,
//!     description   TEXT,
//!     location      TEXT,
//!     active        BOOLEAN NOT NULL DEFAULT TRUE,
//!     weight        INTEGER NOT NULL DEFAULT 0,
//!     date_created  TIMESTAMP,
//!     date_updated  TIMESTAMP
//! );
//!
//! CREATE TABLE spot_location (
//!     id              SERIAL PRIMARY KEY,
//!     name            TEXT NOT NULL,
//!     timezone        TEXT NOT NULL,
//!     latitude        DOUBLE PRECISION NOT NULL,
//!     longitude       DOUBLE PRECISION NOT NULL,
//!     subregion_name  TEXT NOT NULL,
//!     slug            TEXT UNIQUE
//! );
//!
//! CREATE TABLE tide_stations (
//!     id            SERIAL PRIMARY KEY,
//!     station_id    TEXT NOT NULL UNIQUE,
//!     station_name  TEXT,
//!     latitude      DOUBLE PRECISION NOT NULL,
//!     longitude     DOUBLE PRECISION NOT NULL
//! );
//!
//! CREATE TABLE tide_station_buoy_location (
//!     location_id  TEXT NOT NULL REFERENCES buoy_location (location_id),
//!     station_id   TEXT NOT NULL REFERENCES tide_stations (station_id)
//! );
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use deadpool_postgres::{Config as PgConfig, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use tokio_postgres::error::SqlState;
use tokio_postgres::{NoTls, Row};

use super::{ListQuery, LocationStore, StoreError, StoreResult};
use crate::config::DatabaseConfig;
use crate::models::{
    BuoyLocation, BuoyLocationUpdate, NewBuoyLocation, NewSpotLocation, SpotLocation,
    TideStation,
};

const BUOY_COLUMNS: &str = "b.id, b.location_id, b.name, b.url, b.description, b.location, \
     b.active, b.weight, b.date_created, b.date_updated, \
     (SELECT t.station_id FROM tide_station_buoy_location t \
      WHERE t.location_id = b.location_id LIMIT 1) AS station_id";

const SPOT_COLUMNS: &str = "s.id, s.name, s.timezone, s.latitude, s.longitude, s.subregion_name, s.slug";

impl From<tokio_postgres::Error> for StoreError {
    fn from(err: tokio_postgres::Error) -> Self {
        if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
            let detail = err
                .as_db_error()
                .and_then(|db| db.detail())
                .unwrap_or("unique constraint violated");
            return StoreError::Conflict(detail.to_string());
        }
        StoreError::Backend(err.to_string())
    }
}

impl From<deadpool_postgres::PoolError> for StoreError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        StoreError::Backend(format!("connection pool: {err}"))
    }
}

/// Location store backed by a deadpool PostgreSQL pool
pub struct PostgresStore {
    pool: Pool,
}

impl PostgresStore {
    /// Create the pool and check connectivity
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut pg_config = PgConfig::new();
        pg_config.url = Some(config.postgres_url.clone());
        pg_config.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        pg_config.pool = Some(PoolConfig::new(config.pool_size));

        let pool = pg_config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .context("Failed to create PostgreSQL connection pool")?;

        let client = pool
            .get()
            .await
            .context("Failed to connect to PostgreSQL")?;
        client.simple_query("SELECT 1").await?;

        tracing::info!(pool_size = config.pool_size, "PostgreSQL location store connected");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }
}

fn buoy_from_row(row: &Row) -> BuoyLocation {
    BuoyLocation {
        id: row.get("id"),
        location_id: row.get("location_id"),
        name: row.get("name"),
        url: row.get("url"),
        description: row.get("description"),
        location: row.get("location"),
        active: row.get("active"),
        weight: row.get("weight"),
        station_id: row.get("station_id"),
        date_created: row.get("date_created"),
        date_updated: row.get("date_updated"),
    }
}

fn spot_from_row(row: &Row) -> SpotLocation {
    SpotLocation {
        id: row.get("id"),
        name: row.get("name"),
        timezone: row.get("timezone"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        subregion_name: row.get("subregion_name"),
        slug: row.get("slug"),
    }
}

fn tide_station_from_row(row: &Row) -> TideStation {
    TideStation {
        id: row.get("id"),
        station_id: row.get("station_id"),
        station_name: row.get("station_name"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
    }
}

#[async_trait]
impl LocationStore for PostgresStore {
    async fn buoys_by_location_ids(
        &self,
        location_ids: &[String],
    ) -> StoreResult<Vec<BuoyLocation>> {
        if location_ids.is_empty() {
            return Ok(Vec::new());
        }
        let client = self.pool.get().await?;
        let query = format!("SELECT {BUOY_COLUMNS} FROM buoy_location b WHERE b.location_id = ANY($1)");
        let rows = client.query(query.as_str(), &[&location_ids]).await?;
        Ok(rows.iter().map(buoy_from_row).collect())
    }

    async fn spots_by_ids(&self, ids: &[i32]) -> StoreResult<Vec<SpotLocation>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let client = self.pool.get().await?;
        let query = format!("SELECT {SPOT_COLUMNS} FROM spot_location s WHERE s.id = ANY($1)");
        let rows = client.query(query.as_str(), &[&ids]).await?;
        Ok(rows.iter().map(spot_from_row).collect())
    }

    async fn list_buoys(&self, query: &ListQuery) -> StoreResult<Vec<BuoyLocation>> {
        let client = self.pool.get().await?;
        let sql = format!(
            "SELECT {BUOY_COLUMNS} FROM buoy_location b \
             WHERE (b.active OR NOT $3) AND ($1::text IS NULL OR b.name ILIKE '%' || $1 || '%') \
             ORDER BY b.weight DESC, b.name \
             LIMIT $2"
        );
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let rows = client
            .query(sql.as_str(), &[&query.search, &limit, &query.active_only])
            .await?;
        Ok(rows.iter().map(buoy_from_row).collect())
    }

    async fn get_buoy(&self, location_id: &str) -> StoreResult<BuoyLocation> {
        let client = self.pool.get().await?;
        let sql = format!("SELECT {BUOY_COLUMNS} FROM buoy_location b WHERE b.location_id = $1");
        client
            .query_opt(sql.as_str(), &[&location_id])
            .await?
            .map(|row| buoy_from_row(&row))
            .ok_or_else(|| StoreError::NotFound(format!("buoy location {location_id}")))
    }

    async fn create_buoy(&self, buoy: NewBuoyLocation) -> StoreResult<BuoyLocation> {
        let client = self.pool.get().await?;
        let sql = format!(
            "INSERT INTO buoy_location AS b \
             (location_id, name, url, description, location, active, weight, date_created, date_updated) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, LOCALTIMESTAMP, LOCALTIMESTAMP) \
             RETURNING {BUOY_COLUMNS}"
        );
        let row = client
            .query_one(
                sql.as_str(),
                &[
                    &buoy.location_id,
                    &buoy.name,
                    &buoy.url,
                    &buoy.description,
                    &buoy.location,
                    &buoy.active,
                    &buoy.weight,
                ],
            )
            .await?;

        tracing::info!(location_id = %buoy.location_id, "Created buoy location");
        Ok(buoy_from_row(&row))
    }

    async fn update_buoy(&self, id: i32, update: BuoyLocationUpdate) -> StoreResult<BuoyLocation> {
        let client = self.pool.get().await?;
        let sql = format!(
            "UPDATE buoy_location AS b SET \
                name = COALESCE($2, b.name), \
                url = COALESCE($3, b.url), \
                active = COALESCE($4, b.active), \
                description = COALESCE($5, b.description), \
                location = COALESCE($6, b.location), \
                weight = COALESCE($7, b.weight), \
                date_updated = LOCALTIMESTAMP \
             WHERE b.id = $1 \
             RETURNING {BUOY_COLUMNS}"
        );
        client
            .query_opt(
                sql.as_str(),
                &[
                    &id,
                    &update.name,
                    &update.url,
                    &update.active,
                    &update.description,
                    &update.location,
                    &update.weight,
                ],
            )
            .await?
            .map(|row| buoy_from_row(&row))
            .ok_or_else(|| StoreError::NotFound(format!("buoy {id}")))
    }

    async fn delete_buoy(&self, id: i32) -> StoreResult<()> {
        let client = self.pool.get().await?;
        let deleted = client
            .execute("DELETE FROM buoy_location WHERE id = $1", &[&id])
            .await?;
        if deleted == 0 {
            return Err(StoreError::NotFound(format!("buoy {id}")));
        }
        tracing::info!(id = id, "Deleted buoy location");
        Ok(())
    }

    async fn list_spots(&self, query: &ListQuery) -> StoreResult<Vec<SpotLocation>> {
        let client = self.pool.get().await?;
        let sql = format!(
            "SELECT {SPOT_COLUMNS} FROM spot_location s \
             WHERE ($1::text IS NULL OR s.name ILIKE '%' || $1 || '%') \
             ORDER BY s.name \
             LIMIT $2"
        );
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let rows = client.query(sql.as_str(), &[&query.search, &limit]).await?;
        Ok(rows.iter().map(spot_from_row).collect())
    }

    async fn all_spots(&self) -> StoreResult<Vec<SpotLocation>> {
        let client = self.pool.get().await?;
        let sql = format!("SELECT {SPOT_COLUMNS} FROM spot_location s");
        let rows = client.query(sql.as_str(), &[]).await?;
        Ok(rows.iter().map(spot_from_row).collect())
    }

    async fn get_spot(&self, id: i32) -> StoreResult<SpotLocation> {
        let client = self.pool.get().await?;
        let sql = format!("SELECT {SPOT_COLUMNS} FROM spot_location s WHERE s.id = $1");
        client
            .query_opt(sql.as_str(), &[&id])
            .await?
            .map(|row| spot_from_row(&row))
            .ok_or_else(|| StoreError::NotFound(format!("spot {id}")))
    }

    async fn slugs_with_base(&self, base: &str) -> StoreResult<Vec<String>> {
        let client = self.pool.get().await?;
        // Slugs only contain [a-z0-9-], so the LIKE pattern needs no escaping
        let pattern = format!("{base}-%");
        let rows = client
            .query(
                "SELECT slug FROM spot_location WHERE slug = $1 OR slug LIKE $2",
                &[&base, &pattern],
            )
            .await?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    async fn create_spot(&self, spot: NewSpotLocation, slug: String) -> StoreResult<SpotLocation> {
        let client = self.pool.get().await?;
        let sql = format!(
            "INSERT INTO spot_location AS s \
             (name, timezone, latitude, longitude, subregion_name, slug) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {SPOT_COLUMNS}"
        );
        let row = client
            .query_one(
                sql.as_str(),
                &[
                    &spot.name,
                    &spot.timezone,
                    &spot.latitude,
                    &spot.longitude,
                    &spot.subregion_name,
                    &slug,
                ],
            )
            .await?;

        tracing::info!(slug = %slug, "Created spot location");
        Ok(spot_from_row(&row))
    }

    async fn list_tide_stations(&self) -> StoreResult<Vec<TideStation>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT id, station_id, station_name, latitude, longitude FROM tide_stations",
                &[],
            )
            .await?;
        Ok(rows.iter().map(tide_station_from_row).collect())
    }

    async fn health_check(&self) -> StoreResult<()> {
        let client = self.pool.get().await?;
        client.simple_query("SELECT 1").await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
