/// Team management REST API endpoints
///
/// Role changes and removals are admin-only; the acting role comes from the
/// request's `AuthContext` (the `actor_role` parameter by default).

use crate::{
    api::{
        extract::{ApiJson, ApiPath},
        AppState,
    },
    auth::AuthContext,
    error::ApiError,
    team::{NewMember, RoleChange, TeamMember},
};
use axum::{
    extract::State,
    response::Json,
    routing::{delete, get, patch, post},
    Router,
};
use serde_json::{json, Value};

pub fn create_team_routes() -> Router<AppState> {
    Router::new()
        .route("/team", get(list_members))
        .route("/team/add", post(add_member))
        .route("/team/{id}/role", patch(update_role))
        .route("/team/{id}", delete(remove_member))
}

/// GET /team
async fn list_members(State(state): State<AppState>) -> Result<Json<Vec<TeamMember>>, ApiError> {
    state.team.list_members().await.map(Json)
}

/// Add a member within the plan ceiling
///
/// POST /team/add
/// Body: { "email": "...", "role": "admin" | "member", "plan": "free" | "pro" }
async fn add_member(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiJson(payload): ApiJson<NewMember>,
) -> Result<Json<TeamMember>, ApiError> {
    state.team.add_member(payload, &auth).await.map(Json)
}

/// PATCH /team/{id}/role?actor_role=admin
/// Body: { "role": "admin" | "member" }
async fn update_role(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<RoleChange>,
) -> Result<Json<TeamMember>, ApiError> {
    state.team.update_role(id, payload.role, &auth).await.map(Json)
}

/// DELETE /team/{id}?actor_role=admin
async fn remove_member(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Value>, ApiError> {
    let member = state.team.remove_member(id, &auth).await?;
    Ok(Json(json!({
        "message": "Team member removed successfully",
        "member": member,
    })))
}
