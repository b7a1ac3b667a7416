//! Admission Gate
//!
//! Pre-flight check run before every governed build. Checks are evaluated
//! in a fixed order and the first failing one wins:
//! 1. candidate count above `maxSuggestions`
//! 2. inside the cooldown window of the last degradation
//! 3. consecutive slow builds at or above the configured limit
//!
//! The check is a pure read of configuration and state.

use serde::Serialize;
use tree_governor_core::GovernorConfig;

use crate::models::outcome::{BuildErrorDescriptor, BuildErrorKind};

use super::state::GovernorState;

/// Result of an admission check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AdmissionDecision {
    Allowed,
    Rejected {
        reason: BuildErrorKind,
        error: BuildErrorDescriptor,
    },
}

impl AdmissionDecision {
    fn reject(reason: BuildErrorKind, message: String) -> Self {
        Self::Rejected {
            reason,
            error: BuildErrorDescriptor::new(reason, message),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, AdmissionDecision::Allowed)
    }

    pub fn reason(&self) -> Option<BuildErrorKind> {
        match self {
            AdmissionDecision::Allowed => None,
            AdmissionDecision::Rejected { reason, .. } => Some(*reason),
        }
    }
}

/// Decide whether a build over `candidate_count` candidates may run at `now`.
pub fn check_pre_build_conditions(
    config: &GovernorConfig,
    state: &GovernorState,
    candidate_count: usize,
    now: u64,
) -> AdmissionDecision {
    if candidate_count > config.max_suggestions {
        return AdmissionDecision::reject(
            BuildErrorKind::SuggestionCount,
            format!(
                "{} suggestions exceed the limit of {}; rendering flat list",
                candidate_count, config.max_suggestions
            ),
        );
    }

    if state.degrade.in_cooldown(now, config.degradation_cooldown_ms) {
        let remaining = config
            .degradation_cooldown_ms
            .saturating_sub(now.saturating_sub(state.degrade.last_degradation_timestamp));
        return AdmissionDecision::reject(
            BuildErrorKind::Cooldown,
            format!("Tree view disabled for another {}ms after degradation", remaining),
        );
    }

    let limit = config.auto_fallback_thresholds.consecutive_slow_builds;
    if state.degrade.consecutive_slow_builds >= limit {
        return AdmissionDecision::reject(
            BuildErrorKind::ConsecutiveSlowBuilds,
            format!(
                "{} consecutive slow builds (limit {}); rendering flat list",
                state.degrade.consecutive_slow_builds, limit
            ),
        );
    }

    AdmissionDecision::Allowed
}
