/// Audit log feed for admins

use crate::{
    api::{extract::ApiQuery, AppState},
    audit::{clamp_limit, recent_entries, AuditLogRecord},
    auth::AuthContext,
    error::ApiError,
};
use axum::{
    extract::State,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<usize>,
}

pub fn create_audit_routes() -> Router<AppState> {
    Router::new().route("/audit-logs", get(list_audit_logs))
}

/// GET /audit-logs?actor_role=admin&limit=50
async fn list_audit_logs(
    State(state): State<AppState>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<AuditQuery>,
) -> Result<Json<Vec<AuditLogRecord>>, ApiError> {
    auth.require_admin("view audit logs")?;
    let entries = recent_entries(state.store.as_ref(), clamp_limit(query.limit)).await?;
    Ok(Json(entries))
}
