//! Batch progress snapshots.
//!
//! Only the scheduler mutates a [`BatchProgress`]; observers receive
//! immutable copies, each stamped with a strictly increasing `version`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Per-slot state: `waiting -> loading -> {completed | error}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    #[default]
    Waiting,
    Loading,
    Completed,
    Error,
}

impl SlotStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Waiting => "waiting",
            Self::Loading => "loading",
            Self::Completed => "completed",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Whole-batch state: `idle -> loading -> {success | error}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPhase {
    #[default]
    Idle,
    Loading,
    /// At least one slot produced a trip.
    Success,
    /// No slot produced a trip.
    Error,
}

impl fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Snapshot of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    /// Slots that reached a terminal status. Never decreases within a run.
    pub completed: usize,
    pub total: usize,
    /// Slot currently being worked on.
    pub current_index: usize,
    /// One entry per slot, index-aligned with the batch result.
    pub statuses: Vec<SlotStatus>,
    pub phase: BatchPhase,
    /// Bumped on every published transition.
    pub version: u64,
}

impl BatchProgress {
    /// Reset for a new run of `total` slots, keeping the version counter.
    pub(crate) fn start(&mut self, total: usize) {
        self.completed = 0;
        self.total = total;
        self.current_index = 0;
        self.statuses = vec![SlotStatus::Waiting; total];
        self.phase = BatchPhase::Loading;
    }

    pub(crate) fn begin_slot(&mut self, slot: usize) {
        self.current_index = slot;
        if let Some(status) = self.statuses.get_mut(slot) {
            *status = SlotStatus::Loading;
        }
    }

    pub(crate) fn finish_slot(&mut self, slot: usize, status: SlotStatus) {
        if let Some(current) = self.statuses.get_mut(slot) {
            if !current.is_terminal() {
                self.completed += 1;
            }
            *current = status;
        }
    }

    pub(crate) fn finish(&mut self, phase: BatchPhase) {
        self.phase = phase;
    }

    /// Number of slots with the given status.
    pub fn count(&self, status: SlotStatus) -> usize {
        self.statuses.iter().filter(|s| **s == status).count()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, BatchPhase::Success | BatchPhase::Error)
    }
}

impl fmt::Display for BatchProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} [", self.completed, self.total)?;
        for (i, status) in self.statuses.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{status}")?;
        }
        write!(f, "] {}", self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_lifecycle_counts_completion_once() {
        let mut progress = BatchProgress::default();
        progress.start(2);
        assert_eq!(progress.count(SlotStatus::Waiting), 2);

        progress.begin_slot(0);
        assert_eq!(progress.statuses[0], SlotStatus::Loading);
        assert_eq!(progress.completed, 0);

        progress.finish_slot(0, SlotStatus::Completed);
        progress.finish_slot(0, SlotStatus::Completed);
        assert_eq!(progress.completed, 1);

        progress.begin_slot(1);
        progress.finish_slot(1, SlotStatus::Error);
        assert_eq!(progress.completed, 2);
        assert_eq!(progress.current_index, 1);
        assert!(!progress.is_finished());

        progress.finish(BatchPhase::Success);
        assert!(progress.is_finished());
    }

    #[test]
    fn out_of_range_slots_are_ignored() {
        let mut progress = BatchProgress::default();
        progress.start(1);
        progress.finish_slot(5, SlotStatus::Completed);
        assert_eq!(progress.completed, 0);
    }

    #[test]
    fn display_lists_statuses() {
        let mut progress = BatchProgress::default();
        progress.start(3);
        progress.begin_slot(0);
        progress.finish_slot(0, SlotStatus::Completed);
        progress.begin_slot(1);
        assert_eq!(progress.to_string(), "1/3 [completed loading waiting] loading");
    }

    #[test]
    fn serializes_in_camel_case() {
        let mut progress = BatchProgress::default();
        progress.start(1);
        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json["currentIndex"], 0);
        assert_eq!(json["statuses"][0], "waiting");
        assert_eq!(json["phase"], "loading");
    }
}
