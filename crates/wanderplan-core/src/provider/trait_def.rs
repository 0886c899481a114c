//! Collaborator traits: the text model, the place directory, and trip
//! persistence.
//!
//! All three are object-safe so they can be held as `Arc<dyn ...>` and
//! swapped for test doubles.

use anyhow::Result;
use async_trait::async_trait;

use crate::error::ModelError;
use crate::types::Trip;

/// Body of a successful model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelResponse {
    body: String,
}

impl ModelResponse {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    /// The raw response text, exactly as the model produced it.
    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn into_text(self) -> String {
        self.body
    }
}

/// A text-generation backend.
///
/// Implementations report their own failures as [`ModelError`]; the
/// pipeline classifies them into retryable and fatal kinds.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn send_prompt(&self, prompt: &str) -> Result<ModelResponse, ModelError>;
}

/// A place directory that can resolve a photo reference for a text query.
///
/// `Ok(None)` means the directory answered but had nothing to offer.
#[async_trait]
pub trait PlaceLookup: Send + Sync {
    async fn find_photo_reference(&self, query: &str) -> Result<Option<String>>;
}

/// Per-user storage for the latest batch of suggested trips.
#[async_trait]
pub trait TripStore: Send + Sync {
    /// Replace the user's stored suggestions with `trips`.
    async fn save_trips(&self, user_id: &str, trips: &[Trip]) -> Result<()>;

    /// The user's stored suggestions; empty when nothing was saved yet.
    async fn load_trips(&self, user_id: &str) -> Result<Vec<Trip>>;
}

// Compile-time assertion: every collaborator trait must be object-safe.
const _: () = {
    fn _assert_model_object_safe(_: &dyn ModelClient) {}
    fn _assert_lookup_object_safe(_: &dyn PlaceLookup) {}
    fn _assert_store_object_safe(_: &dyn TripStore) {}
};
