/// Fixed-window rate limiter persisted in the external `rate_limits` table
///
/// One row per (identifier, endpoint, window). The most recent row whose
/// `window_start` lies inside the lookback decides: no row starts a new window,
/// a row under the ceiling is incremented, a row at the ceiling rejects.
/// Store failures fail open: limiting is skipped and the request proceeds.

use crate::config::RateLimitConfig;
use crate::error::{ApiError, StoreError};
use crate::store::{tables, Filter, Query, Returning, TableStore};
use axum::http::Method;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Which ceiling applies to a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionClass {
    Read,
    Write,
}

impl ActionClass {
    /// GET/HEAD/OPTIONS read, everything else writes
    pub fn for_method(method: &Method) -> Self {
        if *method == Method::GET || *method == Method::HEAD || *method == Method::OPTIONS {
            ActionClass::Read
        } else {
            ActionClass::Write
        }
    }
}

/// Outcome of a limiter check that let the request through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// First request of a fresh window
    NewWindow,
    /// Counted against an existing window; carries the new count
    Counted(u32),
    /// Limiting disabled by configuration
    Disabled,
    /// Store failed; request allowed without bookkeeping
    FailedOpen,
}

#[derive(Debug, Deserialize)]
struct WindowRow {
    id: i64,
    request_count: u32,
}

fn timestamp(at: DateTime<Utc>) -> String {
    crate::timestamp::format(&at)
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn TableStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn TableStore>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    /// Ceiling for one action class
    pub fn ceiling(&self, class: ActionClass) -> u32 {
        match class {
            ActionClass::Read => self.config.read_per_window,
            ActionClass::Write => self.config.write_per_window,
        }
    }

    /// Count this request; `RateLimited` once the window ceiling is reached
    pub async fn check(
        &self,
        identifier: &str,
        endpoint: &str,
        class: ActionClass,
    ) -> Result<Admission, ApiError> {
        self.check_at(identifier, endpoint, class, Utc::now()).await
    }

    /// `check` with an explicit clock
    pub async fn check_at(
        &self,
        identifier: &str,
        endpoint: &str,
        class: ActionClass,
        now: DateTime<Utc>,
    ) -> Result<Admission, ApiError> {
        if !self.config.enabled {
            return Ok(Admission::Disabled);
        }

        match self.record(identifier, endpoint, self.ceiling(class), now).await {
            Ok(Some(admission)) => Ok(admission),
            Ok(None) => {
                tracing::info!("🚦 Rate limit reached: {} on {}", identifier, endpoint);
                Err(ApiError::RateLimited {
                    endpoint: endpoint.to_string(),
                })
            }
            Err(e) => {
                // TODO: count fail-open occurrences once the service exposes metrics
                tracing::warn!(
                    "⚠️ Rate limiting skipped for {} on {} (store error: {})",
                    identifier,
                    endpoint,
                    e
                );
                Ok(Admission::FailedOpen)
            }
        }
    }

    /// Read-then-write window bookkeeping; `None` means the ceiling was reached
    async fn record(
        &self,
        identifier: &str,
        endpoint: &str,
        ceiling: u32,
        now: DateTime<Utc>,
    ) -> Result<Option<Admission>, StoreError> {
        let window = chrono::Duration::from_std(self.config.window())
            .unwrap_or_else(|_| chrono::Duration::seconds(60));
        let lookback = now - window;

        let query = Query::new()
            .eq("identifier", identifier)
            .eq("endpoint", endpoint)
            .gte("window_start", timestamp(lookback))
            .order_desc("window_start")
            .limit(1);
        let current = self
            .store
            .select(tables::RATE_LIMITS, &query)
            .await?
            .into_iter()
            .next()
            .map(serde_json::from_value::<WindowRow>)
            .transpose()?;

        match current {
            None => {
                self.store
                    .insert(
                        tables::RATE_LIMITS,
                        json!({
                            "identifier": identifier,
                            "endpoint": endpoint,
                            "window_start": timestamp(now),
                            "request_count": 1,
                        }),
                        Returning::Minimal,
                    )
                    .await?;
                self.prune_expired(identifier, endpoint, lookback).await;
                Ok(Some(Admission::NewWindow))
            }
            Some(row) if row.request_count < ceiling => {
                let count = row.request_count + 1;
                self.store
                    .update(
                        tables::RATE_LIMITS,
                        &[Filter::eq("id", row.id)],
                        json!({ "request_count": count }),
                    )
                    .await?;
                Ok(Some(Admission::Counted(count)))
            }
            Some(_) => Ok(None),
        }
    }

    /// Drop this key's windows that ended before `lookback`
    ///
    /// Runs once per new window, so each (identifier, endpoint) keeps at most
    /// the live row plus whatever accrued since. Failures only cost disk space.
    async fn prune_expired(&self, identifier: &str, endpoint: &str, lookback: DateTime<Utc>) {
        let filters = [
            Filter::eq("identifier", identifier),
            Filter::eq("endpoint", endpoint),
            Filter::lt("window_start", timestamp(lookback)),
        ];
        match self.store.delete(tables::RATE_LIMITS, &filters).await {
            Ok(removed) if !removed.is_empty() => {
                tracing::debug!(
                    "🧹 Pruned {} expired window(s) for {} on {}",
                    removed.len(),
                    identifier,
                    endpoint
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("Could not prune windows for {} on {}: {}", identifier, endpoint, e);
            }
        }
    }
}
