//! In-memory implementation of [`LocationStore`]
//!
//! Not durable: everything is lost on restart. Used for local development
//! and by the HTTP tests. Reads take a shared lock; writes take the
//! exclusive lock for the whole operation so uniqueness checks and inserts
//! are atomic.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{ListQuery, LocationStore, StoreError, StoreResult};
use crate::models::{
    BuoyLocation, BuoyLocationUpdate, NewBuoyLocation, NewSpotLocation, SpotLocation,
    TideStation,
};

#[derive(Debug, Default)]
struct State {
    buoys: Vec<BuoyLocation>,
    spots: Vec<SpotLocation>,
    tide_stations: Vec<TideStation>,
    next_buoy_id: i32,
    next_spot_id: i32,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with fixed rows; ids are kept as given
    pub fn with_data(
        buoys: Vec<BuoyLocation>,
        spots: Vec<SpotLocation>,
        tide_stations: Vec<TideStation>,
    ) -> Self {
        let next_buoy_id = buoys.iter().map(|b| b.id).max().unwrap_or(0);
        let next_spot_id = spots.iter().map(|s| s.id).max().unwrap_or(0);
        Self {
            state: RwLock::new(State {
                buoys,
                spots,
                tide_stations,
                next_buoy_id,
                next_spot_id,
            }),
        }
    }
}

#[async_trait]
impl LocationStore for InMemoryStore {
    async fn buoys_by_location_ids(
        &self,
        location_ids: &[String],
    ) -> StoreResult<Vec<BuoyLocation>> {
        let state = self.state.read().await;
        Ok(state
            .buoys
            .iter()
            .filter(|b| location_ids.contains(&b.location_id))
            .cloned()
            .collect())
    }

    async fn spots_by_ids(&self, ids: &[i32]) -> StoreResult<Vec<SpotLocation>> {
        let state = self.state.read().await;
        Ok(state
            .spots
            .iter()
            .filter(|s| ids.contains(&s.id))
            .cloned()
            .collect())
    }

    async fn list_buoys(&self, query: &ListQuery) -> StoreResult<Vec<BuoyLocation>> {
        let state = self.state.read().await;
        let mut buoys: Vec<BuoyLocation> = state
            .buoys
            .iter()
            .filter(|b| (b.active || !query.active_only) && query.matches(&b.name))
            .cloned()
            .collect();
        buoys.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.name.cmp(&b.name)));
        buoys.truncate(query.limit);
        Ok(buoys)
    }

    async fn get_buoy(&self, location_id: &str) -> StoreResult<BuoyLocation> {
        let state = self.state.read().await;
        state
            .buoys
            .iter()
            .find(|b| b.location_id == location_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("buoy location {location_id}")))
    }

    async fn create_buoy(&self, buoy: NewBuoyLocation) -> StoreResult<BuoyLocation> {
        let mut state = self.state.write().await;
        if state.buoys.iter().any(|b| b.location_id == buoy.location_id) {
            return Err(StoreError::Conflict(format!(
                "buoy location {} already exists",
                buoy.location_id
            )));
        }

        state.next_buoy_id += 1;
        let now = Utc::now().naive_utc();
        let created = BuoyLocation {
            id: state.next_buoy_id,
            location_id: buoy.location_id,
            name: buoy.name,
            url: buoy.url,
            description: buoy.description,
            location: buoy.location,
            active: buoy.active,
            weight: buoy.weight,
            station_id: None,
            date_created: Some(now),
            date_updated: Some(now),
        };
        state.buoys.push(created.clone());
        Ok(created)
    }

    async fn update_buoy(&self, id: i32, update: BuoyLocationUpdate) -> StoreResult<BuoyLocation> {
        let mut state = self.state.write().await;
        let buoy = state
            .buoys
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("buoy {id}")))?;

        update.apply(buoy);
        buoy.date_updated = Some(Utc::now().naive_utc());
        Ok(buoy.clone())
    }

    async fn delete_buoy(&self, id: i32) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let before = state.buoys.len();
        state.buoys.retain(|b| b.id != id);
        if state.buoys.len() == before {
            return Err(StoreError::NotFound(format!("buoy {id}")));
        }
        Ok(())
    }

    async fn list_spots(&self, query: &ListQuery) -> StoreResult<Vec<SpotLocation>> {
        let state = self.state.read().await;
        let mut spots: Vec<SpotLocation> = state
            .spots
            .iter()
            .filter(|s| query.matches(&s.name))
            .cloned()
            .collect();
        spots.sort_by(|a, b| a.name.cmp(&b.name));
        spots.truncate(query.limit);
        Ok(spots)
    }

    async fn all_spots(&self) -> StoreResult<Vec<SpotLocation>> {
        Ok(self.state.read().await.spots.clone())
    }

    async fn get_spot(&self, id: i32) -> StoreResult<SpotLocation> {
        let state = self.state.read().await;
        state
            .spots
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("spot {id}")))
    }

    async fn slugs_with_base(&self, base: &str) -> StoreResult<Vec<String>> {
        let prefix = format!("{base}-");
        let state = self.state.read().await;
        Ok(state
            .spots
            .iter()
            .filter_map(|s| s.slug.as_deref())
            .filter(|slug| *slug == base || slug.starts_with(&prefix))
            .map(str::to_string)
            .collect())
    }

    async fn create_spot(&self, spot: NewSpotLocation, slug: String) -> StoreResult<SpotLocation> {
        let mut state = self.state.write().await;
        if state.spots.iter().any(|s| s.slug.as_deref() == Some(slug.as_str())) {
            return Err(StoreError::Conflict(format!("slug {slug} already exists")));
        }

        state.next_spot_id += 1;
        let created = SpotLocation {
            id: state.next_spot_id,
            name: spot.name,
            timezone: spot.timezone,
            latitude: spot.latitude,
            longitude: spot.longitude,
            subregion_name: spot.subregion_name,
            slug: Some(slug),
        };
        state.spots.push(created.clone());
        Ok(created)
    }

    async fn list_tide_stations(&self) -> StoreResult<Vec<TideStation>> {
        Ok(self.state.read().await.tide_stations.clone())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
