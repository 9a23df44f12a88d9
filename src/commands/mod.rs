pub mod observation;
pub mod parse_location;
pub mod serve;

// Re-export command functions for convenience
pub use observation::observation;
pub use parse_location::parse_location;
pub use serve::serve;
