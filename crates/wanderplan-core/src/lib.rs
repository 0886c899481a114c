//! Trip generation pipeline.
//!
//! Turns a structured [`GenerationRequest`] into validated [`Trip`] values by
//! calling an unreliable text model, repairing its output, retrying
//! transient failures, and scheduling several attempts as one batch.
//!
//! ```text
//! GenerationRequest
//!     |
//!     v
//! PromptTemplates::render ---> ModelClient::send_prompt
//!                                   |
//!                                   v
//!                    sanitize::parse -> validate::check -> PhotoEnricher
//!                                   |
//!                    TripGenerator::attempt   (one try)
//!                                   |
//!                    retry::run_with_retry    (backoff + classification)
//!                                   |
//!                    BatchScheduler           (stagger, timeout, progress)
//!                                   |
//!                                   v
//!                    Vec<Option<Trip>> ---> TripStore::save_trips
//! ```

pub mod attempt;
pub mod batch;
pub mod config;
pub mod error;
pub mod photo;
pub mod prompt;
pub mod provider;
pub mod retry;
pub mod sanitize;
pub mod types;
pub mod validate;

pub use attempt::TripGenerator;
pub use batch::{AttemptOutcome, BatchPhase, BatchProgress, BatchScheduler, SlotStatus};
pub use config::{BatchConfig, PipelineConfig, RetryPolicy, TemplateConfig};
pub use error::{ErrorKind, GenerationError, ModelError, classify_model_error};
pub use photo::PhotoEnricher;
pub use prompt::{PromptTemplates, build_prompt};
pub use provider::{ModelClient, ModelResponse, PlaceLookup, TripStore};
pub use types::{GenerationRequest, RequestMode, TravelPlan, Trip};
pub use validate::{StructureIssue, validate};
