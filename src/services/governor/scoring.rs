//! Performance Score
//!
//! Composite 0-100 health indicator:
//! - up to -30 as the rolling average build time exceeds its threshold
//! - up to -25 when recent heap growth averages above 10%
//! - `-error_rate * 100`
//! - -10 per fallback in the last minute
//!
//! The raw value is a signed, unbounded subtraction; it is clamped and
//! rounded before leaving this module.

use tree_governor_core::GovernorConfig;

use super::state::GovernorState;

const BUILD_TIME_MAX_PENALTY: f64 = 30.0;
const GROWTH_MAX_PENALTY: f64 = 25.0;
const GROWTH_SAMPLES: usize = 5;
const GROWTH_TOLERANCE: f64 = 0.10;
const FALLBACK_PENALTY: f64 = 10.0;
const FALLBACK_WINDOW_MS: u64 = 60_000;

/// Compute the score for `state` at `now`.
pub fn calculate_performance_score(config: &GovernorConfig, state: &GovernorState, now: u64) -> u8 {
    let mut score = 100.0;

    if let Some(average) = state.metrics.average_build_time() {
        let threshold = config.tree_build_time_threshold;
        if average > threshold {
            score -= BUILD_TIME_MAX_PENALTY.min((average / threshold - 1.0) * BUILD_TIME_MAX_PENALTY);
        }
    }

    if let Some(average_growth) = state.metrics.memory_growth_history.recent_average(GROWTH_SAMPLES) {
        if average_growth > GROWTH_TOLERANCE {
            score -= GROWTH_MAX_PENALTY.min(average_growth * 100.0);
        }
    }

    score -= state.error_rate() * 100.0;
    score -= FALLBACK_PENALTY * state.degrade.recent_fallbacks(now, FALLBACK_WINDOW_MS) as f64;

    clamp_score(score)
}

fn clamp_score(raw: f64) -> u8 {
    if raw.is_nan() {
        return 0;
    }
    raw.clamp(0.0, 100.0).round() as u8
}
