use super::stage::{Stage, StageConfig, default_stages, validate};
use crate::errors::StageConfigError;

/// Outcome of feeding one message to the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Blank message or no keyword group matched.
    Ignored,
    /// Matched a stage that was already complete.
    AlreadyComplete { stage: String },
    /// Matched and completed a stage.
    Completed { stage: String },
}

/// Tracks which pipeline stages a run has reached.
///
/// Completion is monotonic: only [`ProgressTracker::reset`] clears a stage.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    stages: Vec<Stage>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::from_valid(default_stages())
    }
}

impl ProgressTracker {
    pub fn new(configs: Vec<StageConfig>) -> Result<Self, StageConfigError> {
        validate(&configs)?;
        Ok(Self::from_valid(configs))
    }

    fn from_valid(configs: Vec<StageConfig>) -> Self {
        Self {
            stages: configs
                .into_iter()
                .map(|config| Stage {
                    config,
                    completed: false,
                })
                .collect(),
        }
    }

    /// Mark every stage incomplete, ready for the next run.
    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.completed = false;
        }
    }

    /// Index of the first stage whose keyword group matches `message`.
    pub fn classify(&self, message: &str) -> Option<usize> {
        if message.trim().is_empty() {
            return None;
        }
        self.stages
            .iter()
            .position(|stage| stage.config.matches(message))
    }

    /// Classify a status line and complete at most one stage.
    pub fn on_message(&mut self, message: &str) -> Classification {
        let Some(idx) = self.classify(message) else {
            tracing::trace!(message, "progress message matched no stage");
            return Classification::Ignored;
        };
        let stage = &mut self.stages[idx];
        let id = stage.config.id.clone();
        if stage.completed {
            return Classification::AlreadyComplete { stage: id };
        }
        stage.completed = true;
        tracing::debug!(stage = %id, percentage = self.percentage(), "progress stage completed");
        Classification::Completed { stage: id }
    }

    /// Force every stage complete (terminal success).
    pub fn complete_all(&mut self) {
        for stage in &mut self.stages {
            stage.completed = true;
        }
    }

    /// `round(100 * completed_weight / total_weight)`, half rounding up.
    pub fn percentage(&self) -> u8 {
        let total: u64 = self.stages.iter().map(|s| u64::from(s.weight())).sum();
        if total == 0 {
            return 0;
        }
        let done: u64 = self
            .stages
            .iter()
            .filter(|s| s.completed)
            .map(|s| u64::from(s.weight()))
            .sum();
        ((200 * done + total) / (2 * total)).min(100) as u8
    }

    pub fn is_complete(&self) -> bool {
        self.stages.iter().all(|s| s.completed)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }
}
