//! surfe-diem - surf conditions backend
//!
//! Serves curated buoy and surf-spot locations and joins them with live
//! upstream data: NDBC buoy observations, Open-Meteo marine forecasts and
//! NWS current conditions.
//!
//! # Architecture
//!
//! - [`config`] - TOML + environment configuration
//! - [`models`] - Locations, observations and GeoJSON types
//! - [`parser`] - NDBC coordinate and observation text, spot slugs
//! - [`cache`] - In-process TTL cache for upstream payloads
//! - [`upstream`] - HTTP clients for NDBC, Open-Meteo and NWS
//! - [`storage`] - Location store (PostgreSQL, in-memory)
//! - [`batch`] - Bounded-concurrency batch forecast aggregation
//! - [`server`] - axum REST API
//! - [`metrics`] - Prometheus counters and histograms
//!
//! # Example
//!
//! ```no_run
//! use surfe_diem::config::Config;
//! use surfe_diem::server::SurfServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let server = SurfServer::from_config(config).await?;
//!     server.start_with_shutdown(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     }).await?;
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod parser;
pub mod server;
pub mod storage;
pub mod upstream;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::batch::{BatchAggregator, BatchRequest, BatchResponse};
    pub use crate::cache::TtlCache;
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::models::{BuoyLocation, Coordinates, LatestObservation, SpotLocation};
    pub use crate::storage::{InMemoryStore, LocationStore, PostgresStore};
    pub use crate::upstream::{ForecastSource, UpstreamClient};
}

// Direct re-exports for convenience
pub use models::{BuoyLocation, Coordinates, SpotLocation};
