//! Sequential batch scheduling.
//!
//! A batch runs `count` slots one after another. Each slot is staggered by
//! its index, wrapped in a per-slot timeout, and retried inside that
//! timeout. A failed slot is followed by a cooldown before the next one.
//! The batch succeeds with `None` holes as long as one slot produced a
//! trip and fails with [`GenerationError::BatchExhaustion`] otherwise.
//!
//! ```text
//! slot 0: [loading]--attempt..retry-->[completed]
//! slot 1:            stagger 1*step  [loading]--timeout-->[error]  cooldown
//! slot 2:                                     stagger 2*step [loading]-->...
//! ```

pub mod progress;

use std::future::Future;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::attempt::TripGenerator;
use crate::config::{BatchConfig, PipelineConfig, RetryPolicy};
use crate::error::{ErrorKind, GenerationError};
use crate::retry::run_with_retry;
use crate::types::{GenerationRequest, Trip};

pub use progress::{BatchPhase, BatchProgress, SlotStatus};

// ---------------------------------------------------------------------------
// Slot outcome
// ---------------------------------------------------------------------------

/// Final outcome of one slot, folded into the progress and the result list.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome<T> {
    Success(T),
    Failure { kind: ErrorKind, message: String },
}

impl<T> AttemptOutcome<T> {
    pub fn from_result(result: Result<T, GenerationError>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(e) => Self::Failure {
                kind: e.kind(),
                message: e.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Terminal slot status for this outcome.
    pub fn status(&self) -> SlotStatus {
        match self {
            Self::Success(_) => SlotStatus::Completed,
            Self::Failure { .. } => SlotStatus::Error,
        }
    }

    pub fn into_success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Runs batches and owns their progress.
///
/// Progress is published on a watch channel after every transition. Runs
/// on the same scheduler are serialized, so snapshots always describe a
/// single batch.
#[derive(Debug)]
pub struct BatchScheduler {
    config: BatchConfig,
    retry: RetryPolicy,
    progress: watch::Sender<BatchProgress>,
    run_lock: Mutex<()>,
}

impl BatchScheduler {
    pub fn new(config: BatchConfig, retry: RetryPolicy) -> Self {
        let (progress, _) = watch::channel(BatchProgress::default());
        Self {
            config,
            retry,
            progress,
            run_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.batch.clone(), config.retry.clone())
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// A receiver that observes every published progress snapshot.
    pub fn subscribe(&self) -> watch::Receiver<BatchProgress> {
        self.progress.subscribe()
    }

    /// The latest progress snapshot.
    pub fn progress(&self) -> BatchProgress {
        self.progress.borrow().clone()
    }

    /// Generate `config.count` trips for `request`, one slot at a time.
    pub async fn generate_batch(
        &self,
        generator: &TripGenerator,
        request: &GenerationRequest,
    ) -> Result<Vec<Option<Trip>>, GenerationError> {
        info!(count = self.config.count, mode = ?request.mode(), "starting trip batch");
        self.run_slots(|_, _| generator.attempt(request)).await
    }

    /// Run one batch with an arbitrary attempt function.
    ///
    /// `attempt_fn` receives the 0-based slot index and the 1-based attempt
    /// number within that slot.
    pub async fn run_slots<T, F, Fut>(
        &self,
        mut attempt_fn: F,
    ) -> Result<Vec<Option<T>>, GenerationError>
    where
        F: FnMut(usize, u32) -> Fut,
        Fut: Future<Output = Result<T, GenerationError>>,
    {
        let _running = self.run_lock.lock().await;
        let count = self.config.count;
        self.publish(|p| p.start(count));

        let per_item_timeout = self.config.per_item_timeout();
        let mut results = Vec::with_capacity(count);

        for slot in 0..count {
            self.publish(|p| p.begin_slot(slot));

            let stagger = self.config.stagger_delay(slot);
            if !stagger.is_zero() {
                debug!(slot, delay_ms = stagger.as_millis() as u64, "staggering slot start");
                tokio::time::sleep(stagger).await;
            }

            let retried = run_with_retry(&self.retry, |attempt| attempt_fn(slot, attempt));
            let result = match tokio::time::timeout(per_item_timeout, retried).await {
                Ok(result) => result,
                Err(_) => Err(GenerationError::Timeout(per_item_timeout)),
            };

            let outcome = AttemptOutcome::from_result(result);
            match &outcome {
                AttemptOutcome::Success(_) => info!(slot, "slot completed"),
                AttemptOutcome::Failure { kind, message } => {
                    warn!(slot, kind = %kind, error = %message, "slot failed")
                }
            }
            self.publish(|p| p.finish_slot(slot, outcome.status()));

            let failed = !outcome.is_success();
            results.push(outcome.into_success());

            if failed && slot + 1 < count {
                let cooldown = self.config.failure_cooldown();
                debug!(slot, delay_ms = cooldown.as_millis() as u64, "cooling down after failure");
                tokio::time::sleep(cooldown).await;
            }
        }

        let succeeded = results.iter().filter(|r| r.is_some()).count();
        if succeeded == 0 {
            self.publish(|p| p.finish(BatchPhase::Error));
            warn!(count, "every slot in the batch failed");
            return Err(GenerationError::BatchExhaustion { count });
        }

        self.publish(|p| p.finish(BatchPhase::Success));
        info!(succeeded, count, "trip batch finished");
        Ok(results)
    }

    fn publish(&self, update: impl FnOnce(&mut BatchProgress)) {
        self.progress.send_modify(|progress| {
            update(progress);
            progress.version += 1;
        });
    }
}
