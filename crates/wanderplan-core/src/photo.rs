//! Best-effort photo reference lookup.
//!
//! A photo is decoration: a failed or empty lookup never fails the trip.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::provider::PlaceLookup;

/// Resolves a photo reference for a destination through an optional
/// [`PlaceLookup`].
#[derive(Clone, Default)]
pub struct PhotoEnricher {
    lookup: Option<Arc<dyn PlaceLookup>>,
}

impl std::fmt::Debug for PhotoEnricher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoEnricher")
            .field("enabled", &self.lookup.is_some())
            .finish()
    }
}

impl PhotoEnricher {
    pub fn new(lookup: Arc<dyn PlaceLookup>) -> Self {
        Self {
            lookup: Some(lookup),
        }
    }

    /// An enricher that never produces a photo.
    pub fn disabled() -> Self {
        Self { lookup: None }
    }

    /// Look up a photo reference for `query`.
    ///
    /// Returns `None` for a blank query, a disabled enricher, a lookup
    /// that found nothing, or a lookup that failed.
    pub async fn resolve_photo_ref(&self, query: &str) -> Option<String> {
        let lookup = self.lookup.as_ref()?;
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        match lookup.find_photo_reference(query).await {
            Ok(Some(reference)) if !reference.trim().is_empty() => Some(reference),
            Ok(_) => {
                debug!(query, "no photo reference found");
                None
            }
            Err(e) => {
                warn!(query, error = %e, "photo lookup failed; continuing without photo");
                None
            }
        }
    }
}
