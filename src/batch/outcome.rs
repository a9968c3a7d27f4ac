use serde::{Deserialize, Serialize};

use crate::extractors::VideoDescriptor;

/// Number of processed titles exposed to progress renderers
pub const RECENT_WINDOW: usize = 5;

/// What happened to a single playlist entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProcessingOutcome {
    Success {
        video: VideoDescriptor,
        filename: String,
        transcript: String,
    },
    Failure {
        video: VideoDescriptor,
        error: String,
    },
}

impl ProcessingOutcome {
    pub fn video(&self) -> &VideoDescriptor {
        match self {
            ProcessingOutcome::Success { video, .. } | ProcessingOutcome::Failure { video, .. } => {
                video
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProcessingOutcome::Success { .. })
    }
}

/// A video whose transcript could not be retrieved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedVideo {
    pub title: String,
    pub error: String,
}

/// Aggregate view over a run's outcomes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub total: usize,
    pub success_count: usize,
    pub failures: Vec<FailedVideo>,
}

impl BatchResult {
    pub fn from_outcomes(outcomes: &[ProcessingOutcome]) -> Self {
        let failures: Vec<FailedVideo> = outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                ProcessingOutcome::Failure { video, error } => Some(FailedVideo {
                    title: video.title.clone(),
                    error: error.clone(),
                }),
                ProcessingOutcome::Success { .. } => None,
            })
            .collect();

        Self {
            total: outcomes.len(),
            success_count: outcomes.len() - failures.len(),
            failures,
        }
    }

    /// Nothing was there to process
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn has_successes(&self) -> bool {
        self.success_count > 0
    }
}

/// Snapshot handed to a [`ProgressSink`](super::ProgressSink) after each item
#[derive(Debug, Clone, Copy)]
pub struct ProgressEvent<'a> {
    pub completed: usize,
    pub total: usize,
    pub success_count: usize,
    pub outcomes: &'a [ProcessingOutcome],
}

impl<'a> ProgressEvent<'a> {
    /// The most recently processed outcomes, oldest first
    pub fn recent(&self) -> &'a [ProcessingOutcome] {
        let start = self.outcomes.len().saturating_sub(RECENT_WINDOW);
        &self.outcomes[start..]
    }

    pub fn recent_titles(&self) -> Vec<&'a str> {
        self.recent()
            .iter()
            .map(|outcome| outcome.video().title.as_str())
            .collect()
    }
}
