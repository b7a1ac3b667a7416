//! Governor Events
//!
//! Typed notifications fanned out to registered listeners, plus the
//! fallback record kept in the bounded fallback history.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Fallback records
// ============================================================================

/// What caused a degradation to the cheap rendering path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackTrigger {
    /// A single build breached a timing or memory threshold
    Performance,
    /// The running build error rate crossed its threshold
    ErrorRate,
    /// Heap growth over the sampling window crossed its threshold
    MemoryGrowth,
    /// The presentation layer gave up and switched to the fallback view
    RenderError,
}

impl std::fmt::Display for FallbackTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackTrigger::Performance => write!(f, "performance"),
            FallbackTrigger::ErrorRate => write!(f, "error_rate"),
            FallbackTrigger::MemoryGrowth => write!(f, "memory_growth"),
            FallbackTrigger::RenderError => write!(f, "render_error"),
        }
    }
}

/// One recorded degradation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackEvent {
    pub trigger: FallbackTrigger,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    /// Trigger-specific context (reasons, rates, counts)
    pub data: Value,
    /// Score computed just before the degradation was recorded
    pub performance_score_at_trigger: u8,
}

// ============================================================================
// Event bus payloads
// ============================================================================

/// Notification delivered to every registered listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum GovernorEvent {
    /// A paint/layout timing entry was recorded
    #[serde(rename_all = "camelCase")]
    WebVital { name: String, value: f64 },
    /// A governed build finished within every threshold
    #[serde(rename_all = "camelCase")]
    TreeBuildSuccess {
        build_time_ms: f64,
        memory_used_bytes: i64,
        performance_score: u8,
    },
    /// A governed build failed
    #[serde(rename_all = "camelCase")]
    TreeBuildError {
        message: String,
        error_count: u64,
        total_operations: u64,
    },
    /// The governor degraded to the fallback rendering path
    AutoFallback(FallbackEvent),
    /// The reported bundle size exceeds its threshold
    #[serde(rename_all = "camelCase")]
    BundleSizeWarning { size_bytes: u64, threshold_bytes: u64 },
}

impl GovernorEvent {
    /// Wire name of the event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            GovernorEvent::WebVital { .. } => "webVital",
            GovernorEvent::TreeBuildSuccess { .. } => "treeBuildSuccess",
            GovernorEvent::TreeBuildError { .. } => "treeBuildError",
            GovernorEvent::AutoFallback(_) => "autoFallback",
            GovernorEvent::BundleSizeWarning { .. } => "bundleSizeWarning",
        }
    }
}
