/// Team membership operations backed by the external `team_members` table
///
/// Each operation is a single read or write round trip. There is no cross-call
/// locking: two concurrent `add_member` calls can both pass the uniqueness and
/// capacity checks before either insert lands.

use crate::audit::{actions, usage, AuditEntry, EventSink, UsageEvent};
use crate::auth::{AuthContext, Role};
use crate::error::{ApiError, StoreError};
use crate::store::{tables, Filter, Query, Returning, TableStore};
use crate::team::tier::TierPolicy;
use crate::team::types::{NewMember, TeamMember};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Clone)]
pub struct TeamService {
    store: Arc<dyn TableStore>,
    policy: TierPolicy,
    events: EventSink,
}

fn decode_members(rows: Vec<Value>) -> Result<Vec<TeamMember>, ApiError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(|e| ApiError::from(StoreError::from(e))))
        .collect()
}

fn first_member(rows: Vec<Value>, member_id: i64) -> Result<TeamMember, ApiError> {
    decode_members(rows)?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found(format!("Team member {} not found", member_id)))
}

impl TeamService {
    pub fn new(store: Arc<dyn TableStore>, policy: TierPolicy, events: EventSink) -> Self {
        Self {
            store,
            policy,
            events,
        }
    }

    /// All members ordered by id
    pub async fn list_members(&self) -> Result<Vec<TeamMember>, ApiError> {
        let rows = self
            .store
            .select(tables::TEAM_MEMBERS, &Query::new().order_asc("id"))
            .await?;
        decode_members(rows)
    }

    /// Add a member after the uniqueness and plan ceiling checks
    pub async fn add_member(
        &self,
        new: NewMember,
        actor: &AuthContext,
    ) -> Result<TeamMember, ApiError> {
        let email = new.email.trim().to_string();
        if email.is_empty() || !email.contains('@') {
            return Err(ApiError::validation("A valid email address is required."));
        }

        let existing = self.list_members().await?;
        let folded = email.to_lowercase();
        if existing.iter().any(|m| m.email.trim().to_lowercase() == folded) {
            return Err(ApiError::Conflict(format!(
                "{} is already a team member.",
                email
            )));
        }
        self.policy.check_limit(&new.plan, existing.len())?;

        let rows = self
            .store
            .insert(
                tables::TEAM_MEMBERS,
                json!({ "email": email, "role": new.role }),
                Returning::Representation,
            )
            .await?;
        let member = decode_members(rows)?.into_iter().next().ok_or_else(|| {
            ApiError::UpstreamUnavailable("store did not return the created member".to_string())
        })?;

        tracing::info!("👤 Added team member {} ({})", member.email, member.role);
        self.events.audit(AuditEntry::new(
            actor,
            actions::MEMBER_ADDED,
            member.email.clone(),
        ));
        self.events.usage(UsageEvent::new(
            usage::MEMBER_ADDED,
            actor,
            json!({ "member_id": member.id, "role": member.role, "plan": new.plan }),
        ));
        Ok(member)
    }

    /// Change a member's role; admins only
    pub async fn update_role(
        &self,
        member_id: i64,
        role: Role,
        actor: &AuthContext,
    ) -> Result<TeamMember, ApiError> {
        actor.require_admin("change team roles")?;

        let rows = self
            .store
            .update(
                tables::TEAM_MEMBERS,
                &[Filter::eq("id", member_id)],
                json!({ "role": role }),
            )
            .await?;
        let member = first_member(rows, member_id)?;

        tracing::info!("🔁 Team member {} is now {}", member.email, member.role);
        self.events.audit(AuditEntry::new(
            actor,
            actions::ROLE_CHANGED,
            format!("{}:{}", member.email, member.role),
        ));
        self.events.usage(UsageEvent::new(
            usage::ROLE_CHANGED,
            actor,
            json!({ "member_id": member.id, "role": member.role }),
        ));
        Ok(member)
    }

    /// Remove a member; admins only
    pub async fn remove_member(
        &self,
        member_id: i64,
        actor: &AuthContext,
    ) -> Result<TeamMember, ApiError> {
        actor.require_admin("remove team members")?;

        let rows = self
            .store
            .delete(tables::TEAM_MEMBERS, &[Filter::eq("id", member_id)])
            .await?;
        let member = first_member(rows, member_id)?;

        tracing::info!("👋 Removed team member {}", member.email);
        self.events.audit(AuditEntry::new(
            actor,
            actions::MEMBER_REMOVED,
            member.email.clone(),
        ));
        self.events.usage(UsageEvent::new(
            usage::MEMBER_REMOVED,
            actor,
            json!({ "member_id": member.id }),
        ));
        Ok(member)
    }
}
