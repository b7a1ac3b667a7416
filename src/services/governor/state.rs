//! Degrade/Cooldown State
//!
//! Counters and the fallback history owned by one governor. The cooldown
//! state is never stored: it is derived from `last_degradation_timestamp`
//! and the configured window every time admission is checked.

use std::collections::VecDeque;

use tree_governor_core::FallbackEvent;

use crate::models::metrics::{MetricsSnapshot, FALLBACK_HISTORY_CAPACITY};
use crate::services::telemetry::MetricStore;

// ============================================================================
// DegradeState
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct DegradeState {
    /// 0 = never degraded
    pub last_degradation_timestamp: u64,
    pub degradation_count: u64,
    /// Slow or failed builds since the last clean build
    pub consecutive_slow_builds: u32,
    fallback_history: VecDeque<FallbackEvent>,
}

impl DegradeState {
    /// Whether `now` falls inside the cooldown window of the last degradation.
    pub fn in_cooldown(&self, now: u64, cooldown_ms: u64) -> bool {
        self.last_degradation_timestamp != 0
            && now.saturating_sub(self.last_degradation_timestamp) < cooldown_ms
    }

    /// Normal -> Cooldown transition.
    pub fn record_fallback(&mut self, event: FallbackEvent) {
        self.last_degradation_timestamp = self.last_degradation_timestamp.max(event.timestamp);
        self.degradation_count += 1;
        self.fallback_history.push_back(event);
        while self.fallback_history.len() > FALLBACK_HISTORY_CAPACITY {
            self.fallback_history.pop_front();
        }
    }

    /// Fallbacks recorded within `window_ms` before `now`.
    pub fn recent_fallbacks(&self, now: u64, window_ms: u64) -> usize {
        self.fallback_history
            .iter()
            .filter(|event| now.saturating_sub(event.timestamp) < window_ms)
            .count()
    }

    pub fn fallback_history(&self) -> impl Iterator<Item = &FallbackEvent> {
        self.fallback_history.iter()
    }
}

// ============================================================================
// GovernorState
// ============================================================================

/// Every mutable field of a governor, guarded by a single lock.
#[derive(Debug, Clone, Default)]
pub struct GovernorState {
    pub metrics: MetricStore,
    pub degrade: DegradeState,
    pub error_count: u64,
    /// Admitted attempts
    pub total_operations: u64,
    pub bundle_size: u64,
    /// Last value written by the scoring engine
    pub performance_score: u8,
    pub render_error_count: u64,
    pub render_retry_count: u64,
}

impl GovernorState {
    pub fn new() -> Self {
        Self {
            performance_score: 100,
            ..Default::default()
        }
    }

    /// `error_count / max(1, total_operations)`
    pub fn error_rate(&self) -> f64 {
        self.error_count as f64 / self.total_operations.max(1) as f64
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tree_build_times: self.metrics.tree_build_times.to_vec(),
            render_times: self.metrics.render_times.to_vec(),
            memory_usage: self.metrics.memory_usage.to_vec(),
            memory_growth_history: self.metrics.memory_growth_history.to_vec(),
            web_vitals: self.metrics.web_vitals.clone(),
            fallback_triggers: self.degrade.fallback_history().cloned().collect(),
            error_count: self.error_count,
            total_operations: self.total_operations,
            degradation_count: self.degrade.degradation_count,
            consecutive_slow_builds: self.degrade.consecutive_slow_builds,
            last_degradation_timestamp: self.degrade.last_degradation_timestamp,
            bundle_size: self.bundle_size,
            performance_score: self.performance_score,
            render_error_count: self.render_error_count,
            render_retry_count: self.render_retry_count,
            average_build_time: self.metrics.average_build_time(),
            average_render_time: self.metrics.average_render_time(),
            error_rate: self.error_rate(),
            current_growth_rate: self.metrics.current_growth_rate(),
        }
    }
}
