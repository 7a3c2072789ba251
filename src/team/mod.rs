/// Team Management Layer
///
/// Team members live in the external store; this layer adds the uniqueness,
/// plan-ceiling and admin checks around each write.

// Member, request body and stats types
pub mod types;

// Plan -> member ceiling table
pub mod tier;

// Store-backed member operations
pub mod service;

pub use service::TeamService;
pub use tier::TierPolicy;
pub use types::{NewMember, RoleChange, TeamMember, TeamStats};
