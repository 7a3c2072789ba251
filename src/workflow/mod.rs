/// Workflow Management Layer
///
/// Handles workflow definitions and their process-owned store:
/// - Type definitions (Workflow, Step, StepStatus, StepPatch)
/// - Lock-free snapshot store using ArcSwap with a single writer lock

// Core workflow type definitions
pub mod types;

// ArcSwap-backed in-memory store
pub mod store;

// Re-export commonly used types
pub use store::WorkflowStore;
pub use types::{NewWorkflow, Step, StepPatch, StepStatus, Workflow, WorkflowStats};
