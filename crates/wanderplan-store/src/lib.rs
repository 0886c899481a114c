//! File-backed persistence for generated trips.

pub mod config;
pub mod error;
pub mod trips;

pub use config::StoreConfig;
pub use error::StoreError;
pub use trips::{JsonTripStore, SuggestedTrips};
