/// Workflow management REST API endpoints
///
/// Workflows live in the process-owned store. Creation, deletion and restore are
/// recorded through the event sink without waiting for the write.

use crate::{
    api::{
        extract::{ApiJson, ApiPath},
        AppState,
    },
    audit::{actions, usage, AuditEntry, UsageEvent},
    auth::AuthContext,
    error::ApiError,
    workflow::types::{NewWorkflow, StepPatch, Workflow},
};
use axum::{
    extract::State,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use serde_json::json;

/// Create workflow management routes
///
/// `/workflows/deleted` is a static segment and takes precedence over `/workflows/{id}`.
pub fn create_workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/workflows", post(create_workflow).get(list_workflows))
        .route("/workflows/deleted", get(list_deleted_workflows))
        .route("/workflows/{id}", get(get_workflow).delete(delete_workflow))
        .route("/workflows/{id}/steps/{index}", patch(update_step))
        .route("/workflows/{id}/restore", post(restore_workflow))
}

/// Create a new workflow
///
/// POST /workflows
/// Body: { "title": "...", "steps": [{ "title": "...", "assigned_to": "...", "status": "pending" }] }
async fn create_workflow(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(payload): ApiJson<NewWorkflow>,
) -> Result<Json<Workflow>, ApiError> {
    let workflow = state.workflows.create(payload).await;

    state.events.audit(AuditEntry::new(
        &auth,
        actions::WORKFLOW_CREATED,
        workflow.id.to_string(),
    ));
    state.events.usage(UsageEvent::new(
        usage::WORKFLOW_CREATED,
        &auth,
        json!({ "workflow_id": workflow.id, "steps": workflow.steps.len() }),
    ));

    Ok(Json(workflow))
}

/// List active workflows
///
/// GET /workflows
async fn list_workflows(State(state): State<AppState>) -> Json<Vec<Workflow>> {
    Json(state.workflows.list_active())
}

/// List soft-deleted workflows
///
/// GET /workflows/deleted
async fn list_deleted_workflows(State(state): State<AppState>) -> Json<Vec<Workflow>> {
    Json(state.workflows.list_deleted())
}

/// GET /workflows/{id}
async fn get_workflow(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<u64>,
) -> Result<Json<Workflow>, ApiError> {
    state.workflows.get(id).map(Json)
}

/// Partially update one step
///
/// PATCH /workflows/{id}/steps/{index}
/// Body: any subset of { "title", "assigned_to", "status" }
async fn update_step(
    State(state): State<AppState>,
    ApiPath((id, index)): ApiPath<(u64, i64)>,
    ApiJson(patch): ApiJson<StepPatch>,
) -> Result<Json<Workflow>, ApiError> {
    let workflow = state.workflows.update_step(id, index, &patch).await?;
    tracing::debug!("✏️ Updated step {} of workflow {}", index, id);
    Ok(Json(workflow))
}

/// Soft-delete a workflow (idempotent)
///
/// DELETE /workflows/{id}
async fn delete_workflow(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<u64>,
) -> Result<Json<Workflow>, ApiError> {
    let (workflow, newly_deleted) = state.workflows.soft_delete(id).await?;

    if newly_deleted {
        tracing::info!("🗑️ Soft-deleted workflow {}", id);
        state
            .events
            .audit(AuditEntry::new(&auth, actions::WORKFLOW_DELETED, id.to_string()));
    }

    Ok(Json(workflow))
}

/// Restore a soft-deleted workflow
///
/// POST /workflows/{id}/restore
async fn restore_workflow(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<u64>,
) -> Result<Json<Workflow>, ApiError> {
    let workflow = state.workflows.restore(id).await?;

    tracing::info!("♻️ Restored workflow {}", id);
    state
        .events
        .audit(AuditEntry::new(&auth, actions::WORKFLOW_RESTORED, id.to_string()));

    Ok(Json(workflow))
}
