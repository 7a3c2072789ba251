/// Hosted table store access
///
/// Every external table (team members, rate-limit windows, audit logs, usage
/// events) is reached through the `TableStore` trait:
/// - `RestTableStore`: PostgREST-style REST client over reqwest
/// - `MemoryTableStore`: process-local tables for development and tests
/// - `UnconfiguredStore`: answers `Misconfigured` when credentials are missing

// Filter / order / limit description shared by all backends
pub mod query;

// REST-over-HTTP client for the hosted store
pub mod rest;

// In-memory tables with the same filter semantics
pub mod memory;

pub use memory::MemoryTableStore;
pub use query::{Filter, FilterOp, Order, Query, Returning};
pub use rest::RestTableStore;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Table names used by the service
pub mod tables {
    pub const TEAM_MEMBERS: &str = "team_members";
    pub const RATE_LIMITS: &str = "rate_limits";
    pub const AUDIT_LOGS: &str = "audit_logs";
    pub const USAGE_EVENTS: &str = "usage_events";
}

/// Row-level access to an external table store
///
/// Each call is one round trip with no retries. Rows are plain JSON objects so
/// callers decode into their own types.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Rows of `table` matching `query`
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, StoreError>;

    /// Insert one row; returns the stored row when `returning` asks for it
    async fn insert(
        &self,
        table: &str,
        row: Value,
        returning: Returning,
    ) -> Result<Vec<Value>, StoreError>;

    /// Merge `patch` into every row matching `filters`; returns the updated rows
    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> Result<Vec<Value>, StoreError>;

    /// Delete every row matching `filters`; returns the deleted rows
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, StoreError>;

    /// Cheap connectivity check used by the health endpoint
    async fn probe(&self) -> Result<String, StoreError>;
}

/// Store used when the hosted backend has no URL or credential
#[derive(Debug, Clone)]
pub struct UnconfiguredStore {
    reason: String,
}

impl UnconfiguredStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn error(&self) -> StoreError {
        StoreError::Misconfigured(self.reason.clone())
    }
}

#[async_trait]
impl TableStore for UnconfiguredStore {
    async fn select(&self, _table: &str, _query: &Query) -> Result<Vec<Value>, StoreError> {
        Err(self.error())
    }

    async fn insert(
        &self,
        _table: &str,
        _row: Value,
        _returning: Returning,
    ) -> Result<Vec<Value>, StoreError> {
        Err(self.error())
    }

    async fn update(
        &self,
        _table: &str,
        _filters: &[Filter],
        _patch: Value,
    ) -> Result<Vec<Value>, StoreError> {
        Err(self.error())
    }

    async fn delete(&self, _table: &str, _filters: &[Filter]) -> Result<Vec<Value>, StoreError> {
        Err(self.error())
    }

    async fn probe(&self) -> Result<String, StoreError> {
        Err(self.error())
    }
}

/// Build the configured store backend
///
/// A REST backend without URL or key degrades to `UnconfiguredStore` instead of
/// failing startup, so the workflow endpoints stay usable.
pub fn build_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn TableStore>> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::info!("🧠 Using in-memory table store");
            Ok(Arc::new(MemoryTableStore::new()))
        }
        StoreBackend::Rest => match (&config.url, &config.service_key) {
            (Some(url), Some(key)) => {
                tracing::info!("🗄️ Using REST table store at {}", url);
                let store = RestTableStore::new(url, key, config.timeout())?;
                Ok(Arc::new(store))
            }
            _ => {
                tracing::warn!(
                    "⚠️ SUPABASE_URL or SUPABASE_SERVICE_ROLE_KEY not set; team, audit and rate-limit storage disabled"
                );
                Ok(Arc::new(UnconfiguredStore::new(
                    "SUPABASE_URL or SUPABASE_SERVICE_ROLE_KEY not set",
                )))
            }
        },
    }
}
