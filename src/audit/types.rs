/// Audit and usage event definitions

use crate::auth::AuthContext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable audit action names
pub mod actions {
    pub const WORKFLOW_CREATED: &str = "workflow.created";
    pub const WORKFLOW_DELETED: &str = "workflow.deleted";
    pub const WORKFLOW_RESTORED: &str = "workflow.restored";
    pub const MEMBER_ADDED: &str = "team.member_added";
    pub const ROLE_CHANGED: &str = "team.role_changed";
    pub const MEMBER_REMOVED: &str = "team.member_removed";
}

/// Stable usage event types
pub mod usage {
    pub const WORKFLOW_CREATED: &str = "workflow_created";
    pub const MEMBER_ADDED: &str = "team_member_added";
    pub const ROLE_CHANGED: &str = "team_member_role_changed";
    pub const MEMBER_REMOVED: &str = "team_member_removed";
}

/// Append-only audit record as written to `audit_logs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub actor_id: Option<String>,
    pub actor_role: Option<String>,
    pub action: String,
    pub target: Option<String>,
    #[serde(serialize_with = "crate::timestamp::serialize")]
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(actor: &AuthContext, action: &str, target: impl Into<String>) -> Self {
        Self {
            actor_id: actor.actor_id.clone(),
            actor_role: Some(actor.role.to_string()),
            action: action.to_string(),
            target: Some(target.into()),
            created_at: Utc::now(),
        }
    }
}

/// Store-assigned identifier; integer or text depending on the table definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

/// Audit row read back from the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub entry: AuditEntry,
}

/// Usage analytics event as written to `usage_events`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageEvent {
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl UsageEvent {
    pub fn new(event_type: &str, actor: &AuthContext, metadata: Value) -> Self {
        Self {
            event_type: event_type.to_string(),
            user_id: actor.actor_id.clone(),
            metadata: Some(metadata),
        }
    }
}
