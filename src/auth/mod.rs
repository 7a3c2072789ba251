/// Authorization context
///
/// Handlers receive an explicit `AuthContext` instead of reading role flags
/// themselves. The context is produced by an `IdentityVerifier`; the default
/// `CallerFlagVerifier` trusts caller-supplied flags and can be replaced by a
/// real token verifier without touching handler code.

use crate::error::ApiError;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Team role, shared by team members and acting callers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            other => Err(ApiError::validation(format!(
                "Unknown role '{}'. Expected 'admin' or 'member'.",
                other
            ))),
        }
    }
}

/// Who is acting on this request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub actor_id: Option<String>,
    pub role: Role,
}

impl AuthContext {
    pub fn admin(actor_id: impl Into<String>) -> Self {
        Self {
            actor_id: Some(actor_id.into()),
            role: Role::Admin,
        }
    }

    pub fn member(actor_id: impl Into<String>) -> Self {
        Self {
            actor_id: Some(actor_id.into()),
            role: Role::Member,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fail with `Forbidden` unless the actor is an admin
    pub fn require_admin(&self, action: &str) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!("Only admins can {}.", action)))
        }
    }

    /// Key used for per-caller bookkeeping such as rate limiting
    pub fn identifier(&self) -> &str {
        self.actor_id.as_deref().unwrap_or("anonymous")
    }
}

/// Boundary that turns request metadata into an `AuthContext`
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, parts: &Parts) -> Result<AuthContext, ApiError>;
}

/// Stand-in verifier trusting caller-supplied flags
///
/// Role comes from the `actor_role` query parameter, then the `x-actor-role`
/// header, and defaults to member. Actor id comes from `actor_id` / `x-actor-id`.
#[derive(Debug, Clone, Default)]
pub struct CallerFlagVerifier;

impl CallerFlagVerifier {
    fn lookup(parts: &Parts, params: &HashMap<String, String>, param: &str, header: &str) -> Option<String> {
        params
            .get(param)
            .cloned()
            .or_else(|| {
                parts
                    .headers
                    .get(header)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            })
            .filter(|v| !v.trim().is_empty())
    }
}

#[async_trait]
impl IdentityVerifier for CallerFlagVerifier {
    async fn verify(&self, parts: &Parts) -> Result<AuthContext, ApiError> {
        let params = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map(|Query(params)| params)
            .unwrap_or_default();

        let role = match Self::lookup(parts, &params, "actor_role", "x-actor-role") {
            Some(raw) => raw.parse()?,
            None => Role::Member,
        };
        let actor_id = Self::lookup(parts, &params, "actor_id", "x-actor-id");

        Ok(AuthContext { actor_id, role })
    }
}

/// Extractor: reuse the context resolved by the rate-limit layer, or verify now
impl FromRequestParts<crate::api::AppState> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &crate::api::AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(context) = parts.extensions.get::<AuthContext>() {
            return Ok(context.clone());
        }
        let context = state.verifier.verify(parts).await?;
        parts.extensions.insert(context.clone());
        Ok(context)
    }
}
