/// Subscription tier policy
///
/// Maps a plan name to the maximum number of team members. The table comes
/// from configuration; unknown plans use the fallback ceiling.

use crate::config::TierConfig;
use crate::error::ApiError;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct TierPolicy {
    limits: BTreeMap<String, u32>,
    fallback_limit: u32,
}

impl TierPolicy {
    pub fn new(config: &TierConfig) -> Self {
        Self {
            limits: config
                .limits
                .iter()
                .map(|(plan, limit)| (plan.to_lowercase(), *limit))
                .collect(),
            fallback_limit: config.fallback_limit,
        }
    }

    /// Member ceiling for `plan` (case-insensitive)
    pub fn limit_for(&self, plan: &str) -> u32 {
        self.limits
            .get(&plan.trim().to_lowercase())
            .copied()
            .unwrap_or(self.fallback_limit)
    }

    /// Reject adding a member when `current_count` already reached the ceiling
    pub fn check_limit(&self, plan: &str, current_count: usize) -> Result<(), ApiError> {
        let limit = self.limit_for(plan);
        if current_count >= limit as usize {
            return Err(ApiError::CapacityExceeded(format!(
                "{} plan is limited to {} team members.",
                capitalize(plan.trim()),
                limit
            )));
        }
        Ok(())
    }
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self::new(&TierConfig::default())
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
