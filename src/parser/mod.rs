//! Text parsing for station locations, NDBC feeds and spot slugs
//!
//! Everything in here is pure: no I/O, no clocks.

pub mod coordinates;
pub mod observation;
pub mod slug;

pub use coordinates::parse_coordinates;
pub use observation::parse_latest_observation;
pub use slug::{slugify, unique_slug};
