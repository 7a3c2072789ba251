/// In-memory workflow store using ArcSwap
///
/// Reads load the current snapshot without locking. Writes are serialized by a
/// mutex that also owns the id counter; each write clones the snapshot, applies
/// the change and swaps the new list in atomically.

use crate::error::ApiError;
use crate::workflow::types::{NewWorkflow, StepPatch, Workflow, WorkflowStats};
use arc_swap::ArcSwap;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Process-owned workflow list, injected into handlers through app state
#[derive(Debug)]
pub struct WorkflowStore {
    /// Workflows in creation order
    workflows: ArcSwap<Vec<Workflow>>,
    /// Next identifier to hand out; held for the duration of every write
    next_id: Mutex<u64>,
}

impl Default for WorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowStore {
    pub fn new() -> Self {
        Self {
            workflows: ArcSwap::new(Arc::new(Vec::new())),
            next_id: Mutex::new(1),
        }
    }

    /// Append a new workflow with the next identifier
    pub async fn create(&self, new: NewWorkflow) -> Workflow {
        let mut next_id = self.next_id.lock().await;

        let workflow = Workflow {
            id: *next_id,
            title: new.title,
            steps: new.steps,
            deleted_at: None,
        };
        *next_id += 1;

        let mut workflows = (**self.workflows.load()).clone();
        workflows.push(workflow.clone());
        self.workflows.store(Arc::new(workflows));

        tracing::info!("🆕 Created workflow {} ({})", workflow.id, workflow.title);
        workflow
    }

    /// Workflows without a deletion timestamp
    pub fn list_active(&self) -> Vec<Workflow> {
        self.workflows
            .load()
            .iter()
            .filter(|w| !w.is_deleted())
            .cloned()
            .collect()
    }

    /// Soft-deleted workflows
    pub fn list_deleted(&self) -> Vec<Workflow> {
        self.workflows
            .load()
            .iter()
            .filter(|w| w.is_deleted())
            .cloned()
            .collect()
    }

    /// Look up one workflow regardless of deletion state
    pub fn get(&self, workflow_id: u64) -> Result<Workflow, ApiError> {
        self.workflows
            .load()
            .iter()
            .find(|w| w.id == workflow_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Workflow not found"))
    }

    /// Apply a partial update to one step and return the parent workflow
    ///
    /// Any index outside `0..steps.len()`, negative ones included, is NotFound.
    pub async fn update_step(
        &self,
        workflow_id: u64,
        step_index: i64,
        patch: &StepPatch,
    ) -> Result<Workflow, ApiError> {
        let (workflow, ()) = self
            .modify(workflow_id, |workflow| {
                let step = usize::try_from(step_index)
                    .ok()
                    .and_then(|index| workflow.steps.get_mut(index))
                    .ok_or_else(|| ApiError::not_found("Step not found"))?;
                patch.apply(step);
                Ok(())
            })
            .await?;
        Ok(workflow)
    }

    /// Mark a workflow deleted; a second call keeps the original timestamp
    ///
    /// The flag is true only for the call that actually set `deleted_at`.
    pub async fn soft_delete(&self, workflow_id: u64) -> Result<(Workflow, bool), ApiError> {
        self.modify(workflow_id, |workflow| {
            if workflow.deleted_at.is_some() {
                return Ok(false);
            }
            workflow.deleted_at = Some(Utc::now());
            Ok(true)
        })
        .await
    }

    /// Clear the deletion timestamp
    pub async fn restore(&self, workflow_id: u64) -> Result<Workflow, ApiError> {
        let (workflow, ()) = self
            .modify(workflow_id, |workflow| {
                workflow.deleted_at = None;
                Ok(())
            })
            .await?;
        Ok(workflow)
    }

    /// Counts over the active workflows
    pub fn stats(&self) -> WorkflowStats {
        WorkflowStats::from_workflows(self.workflows.load().iter())
    }

    /// Clone-modify-swap one workflow under the writer lock
    ///
    /// Nothing is published when `change` fails, so a rejected update leaves the
    /// snapshot untouched.
    async fn modify<F, T>(&self, workflow_id: u64, change: F) -> Result<(Workflow, T), ApiError>
    where
        F: FnOnce(&mut Workflow) -> Result<T, ApiError>,
    {
        let _writer = self.next_id.lock().await;

        let mut workflows = (**self.workflows.load()).clone();
        let workflow = workflows
            .iter_mut()
            .find(|w| w.id == workflow_id)
            .ok_or_else(|| ApiError::not_found("Workflow not found"))?;

        let outcome = change(workflow)?;
        let updated = workflow.clone();

        self.workflows.store(Arc::new(workflows));
        Ok((updated, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::{Step, StepStatus};

    fn new_workflow(title: &str, steps: usize) -> NewWorkflow {
        NewWorkflow {
            title: title.to_string(),
            steps: (0..steps)
                .map(|i| Step {
                    title: format!("step {}", i),
                    assigned_to: "ana".to_string(),
                    status: StepStatus::Pending,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn identifiers_strictly_increase() {
        let store = WorkflowStore::new();
        let mut last = 0;
        for i in 0..20 {
            let workflow = store.create(new_workflow(&format!("wf {}", i), 0)).await;
            assert!(workflow.id > last);
            last = workflow.id;
        }
        assert_eq!(store.list_active().len(), 20);
    }

    #[tokio::test]
    async fn soft_delete_and_restore_move_between_lists() {
        let store = WorkflowStore::new();
        let workflow = store.create(new_workflow("Onboarding", 1)).await;

        let (deleted, changed) = store.soft_delete(workflow.id).await.unwrap();
        assert!(changed);
        let first_stamp = deleted.deleted_at;
        assert!(first_stamp.is_some());
        assert!(store.list_active().is_empty());
        assert_eq!(store.list_deleted().len(), 1);

        let (again, changed) = store.soft_delete(workflow.id).await.unwrap();
        assert!(!changed);
        assert_eq!(again.deleted_at, first_stamp);

        let restored = store.restore(workflow.id).await.unwrap();
        assert!(restored.deleted_at.is_none());
        assert_eq!(store.list_active().len(), 1);
        assert!(store.list_deleted().is_empty());
    }

    #[tokio::test]
    async fn update_step_changes_only_the_patched_field() {
        let store = WorkflowStore::new();
        let workflow = store.create(new_workflow("Launch", 1)).await;

        let patch = StepPatch {
            status: Some(StepStatus::Completed),
            ..Default::default()
        };
        let updated = store.update_step(workflow.id, 0, &patch).await.unwrap();

        assert_eq!(updated.steps[0].status, StepStatus::Completed);
        assert_eq!(updated.steps[0].title, workflow.steps[0].title);
        assert_eq!(updated.title, workflow.title);
    }

    #[tokio::test]
    async fn missing_workflow_or_step_is_not_found_and_mutates_nothing() {
        let store = WorkflowStore::new();
        let workflow = store.create(new_workflow("Launch", 1)).await;
        let patch = StepPatch {
            title: Some("changed".into()),
            ..Default::default()
        };

        let err = store.update_step(99, 0, &patch).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Workflow not found"));

        for index in [1, -1, i64::MIN] {
            let err = store.update_step(workflow.id, index, &patch).await.unwrap_err();
            assert!(matches!(err, ApiError::NotFound(ref m) if m == "Step not found"));
        }

        assert_eq!(store.get(workflow.id).unwrap(), workflow);
        assert!(store.soft_delete(42).await.is_err());
        assert!(store.restore(42).await.is_err());
    }

    #[tokio::test]
    async fn concurrent_deletes_report_one_state_change() {
        let store = Arc::new(WorkflowStore::new());
        let id = store.create(new_workflow("Shared", 0)).await.id;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.soft_delete(id).await.unwrap().1 })
            })
            .collect();

        let mut changed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                changed += 1;
            }
        }
        assert_eq!(changed, 1);
    }

    #[tokio::test]
    async fn stats_ignore_deleted_workflows() {
        let store = WorkflowStore::new();
        let a = store.create(new_workflow("a", 2)).await;
        store.create(new_workflow("b", 0)).await;
        let c = store.create(new_workflow("c", 3)).await;
        store
            .update_step(
                a.id,
                1,
                &StepPatch {
                    status: Some(StepStatus::InProgress),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store.soft_delete(c.id).await.unwrap();

        let stats = store.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.with_steps, 1);
        assert_eq!(stats.without_steps, 1);
        assert_eq!(stats.total_steps, 2);
        assert_eq!(stats.pending_steps, 1);
        assert_eq!(stats.in_progress_steps, 1);
        assert_eq!(stats.completed_steps, 0);
    }
}
