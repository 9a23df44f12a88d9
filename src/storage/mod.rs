//! Persistence for buoy locations, surf spots and tide stations
//!
//! [`LocationStore`] is the seam between the HTTP layer and the database.
//! [`PostgresStore`] is the production backend; [`InMemoryStore`] backs
//! local development and the API tests.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    BuoyLocation, BuoyLocationUpdate, NewBuoyLocation, NewSpotLocation, SpotLocation,
    TideStation,
};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Default page size for list endpoints
pub const DEFAULT_LIST_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Backend failures are usually connection problems; the rest are data problems
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Filter for list endpoints
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub limit: usize,
    /// Case-insensitive substring match on the name
    pub search: Option<String>,
    /// Hide inactive buoys; spots have no active flag
    pub active_only: bool,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT,
            search: None,
            active_only: true,
        }
    }
}

impl ListQuery {
    pub fn new(limit: usize, search: Option<String>) -> Self {
        Self {
            limit,
            search: search.filter(|s| !s.trim().is_empty()),
            active_only: true,
        }
    }

    /// Include inactive buoys as well
    pub fn including_inactive(mut self) -> Self {
        self.active_only = false;
        self
    }

    pub(crate) fn matches(&self, name: &str) -> bool {
        match &self.search {
            Some(needle) => name.to_lowercase().contains(&needle.to_lowercase()),
            None => true,
        }
    }
}

#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Buoys whose station id is in `location_ids`, in one round trip; unknown ids are absent
    async fn buoys_by_location_ids(&self, location_ids: &[String])
        -> StoreResult<Vec<BuoyLocation>>;

    /// Spots whose id is in `ids`, in one round trip; unknown ids are absent
    async fn spots_by_ids(&self, ids: &[i32]) -> StoreResult<Vec<SpotLocation>>;
    /// Buoys (active only unless `query.active_only` is off) ordered by weight descending, then name
    /// Active buoys ordered by weight descending, then name
    async fn list_buoys(&self, query: &ListQuery) -> StoreResult<Vec<BuoyLocation>>;
    async fn get_buoy(&self, location_id: &str) -> StoreResult<BuoyLocation>;
    async fn create_buoy(&self, buoy: NewBuoyLocation) -> StoreResult<BuoyLocation>;
    async fn update_buoy(&self, id: i32, update: BuoyLocationUpdate)
        -> StoreResult<BuoyLocation>;
    async fn delete_buoy(&self, id: i32) -> StoreResult<()>;

    /// Spots ordered by name
    async fn list_spots(&self, query: &ListQuery) -> StoreResult<Vec<SpotLocation>>;
    async fn all_spots(&self) -> StoreResult<Vec<SpotLocation>>;
    async fn get_spot(&self, id: i32) -> StoreResult<SpotLocation>;

    /// Existing slugs equal to `base` or of the form `base-N`
    async fn slugs_with_base(&self, base: &str) -> StoreResult<Vec<String>>;

    /// Insert a spot under an already de-duplicated slug
    async fn create_spot(&self, spot: NewSpotLocation, slug: String)
        -> StoreResult<SpotLocation>;

    async fn list_tide_stations(&self) -> StoreResult<Vec<TideStation>>;

    async fn health_check(&self) -> StoreResult<()>;
    fn backend_name(&self) -> &'static str;
}
