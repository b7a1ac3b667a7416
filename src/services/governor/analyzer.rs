//! Post-hoc Performance Analyzer
//!
//! Judges one completed build against the configured thresholds. Rules are
//! applied additively: every rule that fires contributes its reason, its
//! message and its severity penalty, so downstream reporting sees the full
//! combination.

use serde::Serialize;
use tree_governor_core::GovernorConfig;

use crate::models::outcome::DegradeReason;

use super::state::GovernorState;

const SLOW_BUILD_PENALTY: i32 = 30;
const HIGH_MEMORY_PENALTY: i32 = 40;
const AVERAGE_BUILD_PENALTY: i32 = 25;

/// Verdict for one build.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceAnalysis {
    pub should_fallback: bool,
    pub reasons: Vec<DegradeReason>,
    /// Human-readable summary of every breach
    pub message: String,
    /// Local 100-point severity (not the global performance score)
    pub severity_score: i32,
}

impl PerformanceAnalysis {
    pub fn has_reason(&self, reason: DegradeReason) -> bool {
        self.reasons.contains(&reason)
    }
}

/// Analyze a build that has already been recorded in the metric store.
///
/// A slow build also advances `consecutive_slow_builds`.
pub fn analyze_performance(
    config: &GovernorConfig,
    state: &mut GovernorState,
    build_time_ms: f64,
    memory_used_bytes: i64,
) -> PerformanceAnalysis {
    let mut reasons = Vec::new();
    let mut messages = Vec::new();
    let mut severity_score = 100;

    if build_time_ms > config.tree_build_time_threshold {
        state.degrade.consecutive_slow_builds += 1;
        reasons.push(DegradeReason::SlowBuildTime);
        messages.push(format!(
            "Build time {:.1}ms exceeds threshold {}ms",
            build_time_ms, config.tree_build_time_threshold
        ));
        severity_score -= SLOW_BUILD_PENALTY;
    }

    if memory_used_bytes > 0 && memory_used_bytes as u64 > config.memory_threshold {
        reasons.push(DegradeReason::HighMemoryUsage);
        messages.push(format!(
            "Memory usage {} bytes exceeds threshold {} bytes",
            memory_used_bytes, config.memory_threshold
        ));
        severity_score -= HIGH_MEMORY_PENALTY;
    }

    if let Some(average) = state.metrics.average_build_time() {
        let threshold = config.auto_fallback_thresholds.average_build_time_threshold;
        if average > threshold {
            reasons.push(DegradeReason::AverageBuildTime);
            messages.push(format!(
                "Average build time {:.1}ms exceeds threshold {}ms",
                average, threshold
            ));
            severity_score -= AVERAGE_BUILD_PENALTY;
        }
    }

    PerformanceAnalysis {
        should_fallback: !reasons.is_empty(),
        reasons,
        message: messages.join("; "),
        severity_score,
    }
}
