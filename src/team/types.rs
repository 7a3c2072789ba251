/// Team member type definitions

use crate::auth::Role;
use serde::{Deserialize, Serialize};

/// A row of the external `team_members` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    /// Store-assigned identifier
    pub id: i64,
    pub email: String,
    pub role: Role,
}

/// Body of `POST /team/add`
#[derive(Debug, Clone, Deserialize)]
pub struct NewMember {
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_plan")]
    pub plan: String,
}

fn default_plan() -> String {
    "free".to_string()
}

/// Body of `PATCH /team/{id}/role`
#[derive(Debug, Clone, Deserialize)]
pub struct RoleChange {
    pub role: Role,
}

/// Member counts for the analytics overview
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeamStats {
    pub total_members: usize,
    pub admins: usize,
    pub members: usize,
}

impl TeamStats {
    pub fn from_members(members: &[TeamMember]) -> Self {
        let admins = members.iter().filter(|m| m.role == Role::Admin).count();
        Self {
            total_members: members.len(),
            admins,
            members: members.len() - admins,
        }
    }
}
