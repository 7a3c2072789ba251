/// Usage overview for the dashboard
///
/// Combines the workflow snapshot with the current team roster.

use crate::error::ApiError;
use crate::team::{TeamService, TeamStats};
use crate::workflow::{WorkflowStats, WorkflowStore};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub workflows: WorkflowStats,
    pub team: TeamStats,
}

/// Build the overview; a team store failure fails the whole call
pub async fn overview(workflows: &WorkflowStore, team: &TeamService) -> Result<Overview, ApiError> {
    let members = team.list_members().await?;
    Ok(Overview {
        workflows: workflows.stats(),
        team: TeamStats::from_members(&members),
    })
}
