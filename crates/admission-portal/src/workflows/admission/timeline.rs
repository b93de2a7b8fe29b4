use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{TimelineDraft, TimelineStep};

/// Display order requested by the caller. HTTP views default to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineOrder {
    #[default]
    #[serde(alias = "desc")]
    NewestFirst,
    #[serde(alias = "asc")]
    OldestFirst,
}

/// Append-only audit trail of an application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimelineLog {
    steps: Vec<TimelineStep>,
}

impl TimelineLog {
    pub fn append(&mut self, draft: TimelineDraft, timestamp: DateTime<Utc>) -> &TimelineStep {
        let sequence = self.steps.last().map_or(1, |step| step.sequence + 1);
        self.steps.push(TimelineStep {
            sequence,
            description: draft.description,
            timestamp,
            from_status: draft.from_status,
            to_status: draft.to_status,
        });
        &self.steps[self.steps.len() - 1]
    }

    /// Steps in insertion order.
    pub fn entries(&self) -> &[TimelineStep] {
        &self.steps
    }

    /// Ordered by timestamp; sequence breaks ties.
    pub fn ordered(&self, order: TimelineOrder) -> Vec<TimelineStep> {
        let mut steps = self.steps.clone();
        steps.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.sequence.cmp(&b.sequence))
        });
        if order == TimelineOrder::NewestFirst {
            steps.reverse();
        }
        steps
    }
}
