/// TaskVault: workflow tracking and team management API
///
/// This library provides the HTTP service behind the TaskVault dashboard:
/// in-memory workflows, store-backed team membership with plan ceilings,
/// fixed-window rate limiting and best-effort audit / usage logging.

// Core configuration and setup
pub mod config;

// Typed API and store errors
pub mod error;

// RFC 3339 millisecond timestamp rendering
pub mod timestamp;

// Authorization context and the identity verification boundary
pub mod auth;

// Hosted table store access (REST, in-memory, unconfigured)
pub mod store;

// Workflow management layer - types and the process-owned store
pub mod workflow;

// Team membership and subscription tier policy
pub mod team;

// Fixed-window rate limiting against the store
pub mod ratelimit;

// Audit log and usage analytics events
pub mod audit;

// Dashboard overview aggregation
pub mod analytics;

// HTTP API layer - REST endpoints and middleware
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use api::{build_router, AppState};
pub use config::Config;
pub use error::{ApiError, StoreError};
pub use server::{build_state, create_app, start_server};
pub use workflow::{Step, StepStatus, Workflow, WorkflowStore};
