//! Tunable pipeline parameters.
//!
//! The defaults are product-tuned values, not derived ones; every one of
//! them can be overridden from the config file.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Full pipeline configuration, as stored under `[retry]`, `[batch]` and
/// `[templates]` in the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub retry: RetryPolicy,
    pub batch: BatchConfig,
    pub templates: TemplateConfig,
}

// ---------------------------------------------------------------------------
// Retry
// ---------------------------------------------------------------------------

/// Exponential backoff with jitter for a single slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles after each further one.
    pub base_delay_ms: u64,
    /// Upper bound of the uniform random jitter added to every delay.
    pub max_jitter_ms: u64,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_BASE_DELAY_MS: u64 = 2_000;
    pub const DEFAULT_MAX_JITTER_MS: u64 = 1_000;

    /// Deterministic part of the delay after `failed_attempt` (1-based):
    /// `base * 2^(failed_attempt - 1)`.
    pub fn backoff_floor(&self, failed_attempt: u32) -> Duration {
        let shift = failed_attempt.saturating_sub(1).min(20);
        let factor = 1u64.checked_shl(shift).unwrap_or(u64::MAX);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }

    /// Full delay after `failed_attempt`: the floor plus uniform jitter in
    /// `[0, max_jitter_ms]`.
    pub fn backoff_delay(&self, failed_attempt: u32) -> Duration {
        let jitter = if self.max_jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..=self.max_jitter_ms)
        };
        self.backoff_floor(failed_attempt) + Duration::from_millis(jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: Self::DEFAULT_BASE_DELAY_MS,
            max_jitter_ms: Self::DEFAULT_MAX_JITTER_MS,
        }
    }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// Slot count and pacing for one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of trips requested.
    pub count: usize,
    /// Wall-clock budget of one slot, retries included.
    pub per_item_timeout_ms: u64,
    /// Slot `i` waits `i * stagger_step_ms` before starting.
    pub stagger_step_ms: u64,
    /// Extra pause after a failed slot, unless it was the last one.
    pub failure_cooldown_ms: u64,
}

impl BatchConfig {
    pub const DEFAULT_COUNT: usize = 3;
    pub const DEFAULT_PER_ITEM_TIMEOUT_MS: u64 = 120_000;
    pub const DEFAULT_STAGGER_STEP_MS: u64 = 5_000;
    pub const DEFAULT_FAILURE_COOLDOWN_MS: u64 = 7_000;

    pub fn per_item_timeout(&self) -> Duration {
        Duration::from_millis(self.per_item_timeout_ms)
    }

    /// Start delay of `slot`; zero for the first slot.
    pub fn stagger_delay(&self, slot: usize) -> Duration {
        Duration::from_millis(self.stagger_step_ms.saturating_mul(slot as u64))
    }

    pub fn failure_cooldown(&self) -> Duration {
        Duration::from_millis(self.failure_cooldown_ms)
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            count: Self::DEFAULT_COUNT,
            per_item_timeout_ms: Self::DEFAULT_PER_ITEM_TIMEOUT_MS,
            stagger_step_ms: Self::DEFAULT_STAGGER_STEP_MS,
            failure_cooldown_ms: Self::DEFAULT_FAILURE_COOLDOWN_MS,
        }
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// Optional prompt template overrides; `None` keeps the built-in template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discover: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub named: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_product_constants() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.retry.max_attempts, 3);
        assert_eq!(cfg.retry.base_delay_ms, 2_000);
        assert_eq!(cfg.retry.max_jitter_ms, 1_000);
        assert_eq!(cfg.batch.count, 3);
        assert_eq!(cfg.batch.per_item_timeout(), Duration::from_secs(120));
        assert_eq!(cfg.batch.stagger_step_ms, 5_000);
        assert_eq!(cfg.batch.failure_cooldown(), Duration::from_secs(7));
    }

    #[test]
    fn backoff_floor_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_floor(1), Duration::from_millis(2_000));
        assert_eq!(policy.backoff_floor(2), Duration::from_millis(4_000));
        assert_eq!(policy.backoff_floor(3), Duration::from_millis(8_000));
    }

    #[test]
    fn backoff_floor_saturates() {
        let policy = RetryPolicy {
            base_delay_ms: u64::MAX / 2,
            ..Default::default()
        };
        assert_eq!(
            policy.backoff_floor(64),
            Duration::from_millis(u64::MAX)
        );
    }

    #[test]
    fn backoff_delay_stays_within_jitter_bounds() {
        let policy = RetryPolicy::default();
        for attempt in 1..=3 {
            let floor = policy.backoff_floor(attempt);
            for _ in 0..50 {
                let delay = policy.backoff_delay(attempt);
                assert!(delay >= floor);
                assert!(delay <= floor + Duration::from_millis(policy.max_jitter_ms));
            }
        }
    }

    #[test]
    fn zero_jitter_is_deterministic() {
        let policy = RetryPolicy {
            max_jitter_ms: 0,
            ..Default::default()
        };
        assert_eq!(policy.backoff_delay(2), policy.backoff_floor(2));
    }

    #[test]
    fn stagger_grows_with_slot_index() {
        let batch = BatchConfig::default();
        assert_eq!(batch.stagger_delay(0), Duration::ZERO);
        assert_eq!(batch.stagger_delay(1), Duration::from_secs(5));
        assert_eq!(batch.stagger_delay(2), Duration::from_secs(10));
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg: PipelineConfig = toml::from_str(
            r#"
[retry]
max_attempts = 5

[batch]
count = 2
"#,
        )
        .unwrap();
        assert_eq!(cfg.retry.max_attempts, 5);
        assert_eq!(cfg.retry.base_delay_ms, RetryPolicy::DEFAULT_BASE_DELAY_MS);
        assert_eq!(cfg.batch.count, 2);
        assert_eq!(
            cfg.batch.per_item_timeout_ms,
            BatchConfig::DEFAULT_PER_ITEM_TIMEOUT_MS
        );
        assert!(cfg.templates.discover.is_none());
    }
}
