//! HTTP API for surfe-diem
//!
//! ```text
//! GET    /                                             greeting
//! GET    /api/v1/health                                liveness + store check
//! GET    /metrics                                      Prometheus exposition
//! POST   /api/v1/batch-forecast                        many buoys/spots at once
//! GET    /api/v1/cache/status                          cache size, keys, hit rate
//! POST   /api/v1/cache/clear                           drop all cached payloads
//! GET    /api/v1/locations                             active buoys
//! POST   /api/v1/locations                     admin   create buoy
//! GET    /api/v1/locations/geojson                     buoys as GeoJSON
//! GET    /api/v1/locations/{location_id}               one buoy
//! PUT    /api/v1/locations/{id}                admin   update buoy
//! DELETE /api/v1/locations/{id}                admin   delete buoy
//! GET    /api/v1/locations/{location_id}/latest-observation
//! GET    /api/v1/spots                                 spots
//! POST   /api/v1/spots                         admin   create spot
//! GET    /api/v1/spots/geojson                         spots as GeoJSON
//! GET    /api/v1/spots/find_closest?lat&lng&dist       spots near a point
//! GET    /api/v1/spots/{id}                            one spot
//! GET    /api/v1/search?q                              buoys and spots by name
//! GET    /api/v1/tides/find_closest?lat&lng&dist       nearest tide station
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use surfe_diem::server::SurfServer;
//!
//! let server = SurfServer::from_config(config).await?;
//! server.start_with_shutdown(shutdown_signal()).await?;
//! ```

pub mod app;
pub mod auth;
pub mod error;
pub mod routes;

pub use app::{AppState, ServerError, ServerInfo, SurfServer};
pub use error::{ApiError, ErrorResponse};
pub use routes::create_router;
