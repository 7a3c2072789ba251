/// Core workflow type definitions
///
/// Workflows are ordered lists of steps with an optional soft-delete marker.
/// These types are serialized as-is in API responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress of a single step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

/// One unit of work inside a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub title: String,
    /// Identifier of the person responsible for the step
    pub assigned_to: String,
    #[serde(default)]
    pub status: StepStatus,
}

/// A tracked workflow
///
/// `deleted_at` is set by a soft delete and cleared by restore; workflows are
/// never physically removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Monotonic identifier, never reused
    pub id: u64,
    pub title: String,
    pub steps: Vec<Step>,
    #[serde(serialize_with = "crate::timestamp::serialize_option")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Workflow {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Request body for workflow creation
#[derive(Debug, Clone, Deserialize)]
pub struct NewWorkflow {
    pub title: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Partial step update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StepPatch {
    pub title: Option<String>,
    pub assigned_to: Option<String>,
    pub status: Option<StepStatus>,
}

impl StepPatch {
    /// Apply the provided fields to `step`
    pub fn apply(&self, step: &mut Step) {
        if let Some(title) = &self.title {
            step.title = title.clone();
        }
        if let Some(assigned_to) = &self.assigned_to {
            step.assigned_to = assigned_to.clone();
        }
        if let Some(status) = self.status {
            step.status = status;
        }
    }
}

/// Aggregate counts over active workflows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkflowStats {
    pub total: usize,
    pub with_steps: usize,
    pub without_steps: usize,
    pub total_steps: usize,
    pub pending_steps: usize,
    pub in_progress_steps: usize,
    pub completed_steps: usize,
}

impl WorkflowStats {
    /// Count workflows and step statuses, skipping soft-deleted workflows
    pub fn from_workflows<'a>(workflows: impl IntoIterator<Item = &'a Workflow>) -> Self {
        let mut stats = Self::default();
        for workflow in workflows.into_iter().filter(|w| !w.is_deleted()) {
            stats.total += 1;
            if workflow.steps.is_empty() {
                stats.without_steps += 1;
            } else {
                stats.with_steps += 1;
            }
            for step in &workflow.steps {
                stats.total_steps += 1;
                match step.status {
                    StepStatus::Pending => stats.pending_steps += 1,
                    StepStatus::InProgress => stats.in_progress_steps += 1,
                    StepStatus::Completed => stats.completed_steps += 1,
                }
            }
        }
        stats
    }
}
