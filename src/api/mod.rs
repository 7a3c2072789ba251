/// HTTP API Layer
///
/// This module provides the REST endpoints of the service. It handles:
/// - Workflow lifecycle (create, list, step updates, soft delete, restore)
/// - Team membership with plan ceilings and admin checks
/// - Audit log listing and the analytics overview
/// - Composite health reporting
///
/// Every route except `/health` passes through the rate-limit layer.

// Workflow lifecycle endpoints
pub mod workflows;

// Team membership endpoints
pub mod team;

// Admin audit log feed
pub mod audit;

// Dashboard overview
pub mod analytics;

// Store probe and latency report
pub mod health;

// Rate-limit middleware
pub mod middleware;

// Json / Path / Query wrappers rejecting with ApiError
pub mod extract;

use crate::{
    audit::EventSink,
    auth::IdentityVerifier,
    config::Config,
    ratelimit::RateLimiter,
    store::TableStore,
    team::{TeamService, TierPolicy},
    workflow::WorkflowStore,
};
use axum::Router;
use std::{sync::Arc, time::Duration};

pub use analytics::create_analytics_routes;
pub use audit::create_audit_routes;
pub use health::create_health_routes;
pub use team::create_team_routes;
pub use workflows::create_workflow_routes;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Process-owned workflow list
    pub workflows: Arc<WorkflowStore>,
    /// Store-backed team operations
    pub team: TeamService,
    /// Fixed-window limiter applied by the middleware
    pub limiter: RateLimiter,
    /// Fire-and-forget audit / analytics writer
    pub events: EventSink,
    /// Raw table store for audit reads and health probes
    pub store: Arc<dyn TableStore>,
    /// Turns request metadata into an `AuthContext`
    pub verifier: Arc<dyn IdentityVerifier>,
    /// Upper bound for the health probe
    pub probe_timeout: Duration,
}

impl AppState {
    /// Wire all components around one table store
    ///
    /// Spawns the event sink worker, so this must run inside a tokio runtime.
    pub fn new(
        config: &Config,
        store: Arc<dyn TableStore>,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> Self {
        let (events, _worker) = EventSink::spawn(
            Arc::clone(&store),
            config.events.queue_capacity,
            config.events.usage_analytics_enabled,
        );
        let team = TeamService::new(
            Arc::clone(&store),
            TierPolicy::new(&config.tiers),
            events.clone(),
        );
        let limiter = RateLimiter::new(Arc::clone(&store), config.rate_limit.clone());

        Self {
            workflows: Arc::new(WorkflowStore::new()),
            team,
            limiter,
            events,
            store,
            verifier,
            probe_timeout: config.store.timeout(),
        }
    }
}

/// Assemble every route with the rate-limit layer applied
///
/// `route_layer` only wraps routes registered before it, so the health route is
/// merged afterwards and never counted.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(create_workflow_routes())
        .merge(create_team_routes())
        .merge(create_audit_routes())
        .merge(create_analytics_routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::enforce_rate_limit,
        ))
        .merge(create_health_routes())
        .with_state(state)
}
