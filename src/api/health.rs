/// Health check endpoint
///
/// Always answers 200; the body tells whether the store probe succeeded and how
/// long it took. `status` is "ok" only when the probe succeeds within the
/// configured timeout, otherwise "degraded".

use crate::api::AppState;
use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub ok: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub backend: ComponentHealth,
    pub store: ComponentHealth,
}

pub fn create_health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthReport> {
    let started = Instant::now();
    let backend = ComponentHealth {
        ok: true,
        latency_ms: started.elapsed().as_millis() as u64,
        detail: None,
    };

    let probe_started = Instant::now();
    let probe = tokio::time::timeout(state.probe_timeout, state.store.probe()).await;
    let probe_latency = probe_started.elapsed().as_millis() as u64;

    let store = match probe {
        Ok(Ok(detail)) => ComponentHealth {
            ok: true,
            latency_ms: probe_latency,
            detail: Some(detail),
        },
        Ok(Err(e)) => {
            tracing::warn!("⚠️ Store probe failed: {}", e);
            ComponentHealth {
                ok: false,
                latency_ms: probe_latency,
                detail: Some(e.to_string()),
            }
        }
        Err(_) => {
            tracing::warn!("⚠️ Store probe timed out after {:?}", state.probe_timeout);
            ComponentHealth {
                ok: false,
                latency_ms: probe_latency,
                detail: Some(format!("timed out after {:?}", state.probe_timeout)),
            }
        }
    };

    Json(HealthReport {
        status: if store.ok { "ok" } else { "degraded" },
        backend,
        store,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::CallerFlagVerifier,
        config::Config,
        error::StoreError,
        store::{Filter, MemoryTableStore, Query, Returning, TableStore},
    };
    use async_trait::async_trait;
    use serde_json::Value;
    use std::{sync::Arc, time::Duration};

    /// Memory store whose probe takes a fixed time
    struct SlowProbeStore {
        inner: MemoryTableStore,
        delay: Duration,
    }

    #[async_trait]
    impl TableStore for SlowProbeStore {
        async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, StoreError> {
            self.inner.select(table, query).await
        }

        async fn insert(
            &self,
            table: &str,
            row: Value,
            returning: Returning,
        ) -> Result<Vec<Value>, StoreError> {
            self.inner.insert(table, row, returning).await
        }

        async fn update(
            &self,
            table: &str,
            filters: &[Filter],
            patch: Value,
        ) -> Result<Vec<Value>, StoreError> {
            self.inner.update(table, filters, patch).await
        }

        async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, StoreError> {
            self.inner.delete(table, filters).await
        }

        async fn probe(&self) -> Result<String, StoreError> {
            tokio::time::sleep(self.delay).await;
            self.inner.probe().await
        }
    }

    #[tokio::test]
    async fn backend_latency_excludes_the_store_probe() {
        let store = Arc::new(SlowProbeStore {
            inner: MemoryTableStore::new(),
            delay: Duration::from_millis(80),
        });
        let state = AppState::new(&Config::in_memory(), store, Arc::new(CallerFlagVerifier));

        let Json(report) = health_check(State(state)).await;

        assert_eq!(report.status, "ok");
        assert!(report.store.latency_ms >= 80);
        assert!(report.backend.latency_ms < 80);
    }
}
