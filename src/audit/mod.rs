/// Audit logging and usage analytics
///
/// Writes go through the fire-and-forget `EventSink`; reads of recent audit
/// entries are a required path and surface store errors.

pub mod sink;
pub mod types;

pub use sink::EventSink;
pub use types::{actions, usage, AuditEntry, AuditLogRecord, RecordId, UsageEvent};

use crate::error::StoreError;
use crate::store::{tables, Query, TableStore};

pub const DEFAULT_AUDIT_LIMIT: usize = 50;
pub const MAX_AUDIT_LIMIT: usize = 200;

/// Clamp a caller-supplied page size into `1..=MAX_AUDIT_LIMIT`
pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .clamp(1, MAX_AUDIT_LIMIT)
}

/// Most recent audit entries, newest first
pub async fn recent_entries(
    store: &dyn TableStore,
    limit: usize,
) -> Result<Vec<AuditLogRecord>, StoreError> {
    let query = Query::new().order_desc("created_at").limit(limit);
    store
        .select(tables::AUDIT_LOGS, &query)
        .await?
        .into_iter()
        .map(|row| serde_json::from_value(row).map_err(StoreError::from))
        .collect()
}
