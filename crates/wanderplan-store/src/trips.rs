//! Per-user suggested-trip files.
//!
//! Layout: `<data_dir>/users/<user_id>/suggested_trips.json`, holding a
//! [`SuggestedTrips`] document. Saving replaces the previous suggestions
//! through a temp file and a rename, so readers never see a torn file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use wanderplan_core::{Trip, TripStore};

use crate::config::StoreConfig;
use crate::error::StoreError;

const USERS_DIR: &str = "users";
const TRIPS_FILE: &str = "suggested_trips.json";

/// On-disk document for one user's latest batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedTrips {
    pub saved_at: DateTime<Utc>,
    pub trips: Vec<Trip>,
}

/// A [`TripStore`] backed by JSON files under a data directory.
#[derive(Debug, Clone)]
pub struct JsonTripStore {
    root: PathBuf,
}

impl JsonTripStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self::at(&config.data_dir)
    }

    pub fn at(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the trips file for `user_id`, after validating the id.
    pub fn user_file(&self, user_id: &str) -> Result<PathBuf, StoreError> {
        validate_user_id(user_id)?;
        Ok(self.root.join(USERS_DIR).join(user_id).join(TRIPS_FILE))
    }

    /// Replace `user_id`'s suggestions with `trips`.
    pub async fn save(&self, user_id: &str, trips: &[Trip]) -> Result<SuggestedTrips, StoreError> {
        let path = self.user_file(user_id)?;
        let record = SuggestedTrips {
            saved_at: Utc::now(),
            trips: trips.to_vec(),
        };
        let body = serde_json::to_vec_pretty(&record)?;

        let dir = path.parent().unwrap_or(self.root.as_path());
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| StoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;

        let tmp = dir.join(format!(".{TRIPS_FILE}.{}.tmp", Uuid::new_v4().simple()));
        if let Err(source) = tokio::fs::write(&tmp, &body).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StoreError::Io { path: tmp, source });
        }
        if let Err(source) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StoreError::Io { path, source });
        }

        info!(user_id, count = trips.len(), path = %path.display(), "saved suggested trips");
        Ok(record)
    }

    /// The stored document for `user_id`, or `None` if nothing was saved.
    pub async fn load_record(&self, user_id: &str) -> Result<Option<SuggestedTrips>, StoreError> {
        let path = self.user_file(user_id)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(user_id, "no stored trips");
                return Ok(None);
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Corrupt { path, source })
    }

    /// The stored trips for `user_id`; empty if nothing was saved.
    pub async fn load(&self, user_id: &str) -> Result<Vec<Trip>, StoreError> {
        Ok(self
            .load_record(user_id)
            .await?
            .map(|record| record.trips)
            .unwrap_or_default())
    }
}

#[async_trait]
impl TripStore for JsonTripStore {
    async fn save_trips(&self, user_id: &str, trips: &[Trip]) -> anyhow::Result<()> {
        self.save(user_id, trips).await?;
        Ok(())
    }

    async fn load_trips(&self, user_id: &str) -> anyhow::Result<Vec<Trip>> {
        Ok(self.load(user_id).await?)
    }
}

fn validate_user_id(user_id: &str) -> Result<(), StoreError> {
    let valid = !user_id.is_empty()
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidUserId(user_id.to_string()))
    }
}
