//! Collaborator interfaces for the pipeline.
//!
//! The pipeline never talks to a model, a place directory, or a database
//! directly. It goes through the object-safe traits defined in
//! [`trait_def`], so production adapters and scripted test doubles are
//! interchangeable.
//!
//! ```text
//! TripGenerator --send_prompt(prompt)--> &dyn ModelClient
//!       |
//!       +--find_photo_reference(q)--> &dyn PlaceLookup   (via PhotoEnricher)
//!
//! caller --save_trips(user, trips)--> &dyn TripStore
//! ```

pub mod command;
pub mod trait_def;

pub use command::{CommandModel, CommandPlaceLookup};
pub use trait_def::{ModelClient, ModelResponse, PlaceLookup, TripStore};
