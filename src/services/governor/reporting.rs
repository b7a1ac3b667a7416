//! Reporting & Recommendations
//!
//! Read-only diagnostics derived from the rolling metrics. Nothing here
//! mutates governor state.

use tree_governor_core::GovernorConfig;

use crate::models::report::{Recommendation, RecommendationPriority, RegressionTest};

use super::state::GovernorState;

/// Heap samples compared by the memory trend check
const MEMORY_TREND_SAMPLES: usize = 5;
/// Error rate above which error handling deserves a look
const ERROR_RATE_ADVISORY: f64 = 0.05;
/// Heap growth rate above which a leak is suspected
const GROWTH_RATE_ADVISORY: f64 = 0.15;

/// Compare current rolling values against their thresholds.
///
/// Build time, memory trend and error rate are always checked; render time
/// is checked once render samples exist.
pub fn create_regression_tests(config: &GovernorConfig, state: &GovernorState) -> Vec<RegressionTest> {
    let mut tests = vec![
        RegressionTest::compare(
            "build_time",
            state.metrics.average_build_time().unwrap_or(0.0),
            config.tree_build_time_threshold,
        ),
        RegressionTest::compare(
            "memory_trend",
            state.metrics.memory_trend(MEMORY_TREND_SAMPLES).unwrap_or(0.0),
            config.memory_threshold as f64,
        ),
        RegressionTest::compare(
            "error_rate",
            state.error_rate(),
            config.auto_fallback_thresholds.error_rate,
        ),
    ];

    if let Some(average_render) = state.metrics.average_render_time() {
        tests.push(RegressionTest::compare(
            "render_time",
            average_render,
            config.render_time_threshold,
        ));
    }

    tests
}

/// Threshold-triggered optimization hints.
pub fn generate_recommendations(config: &GovernorConfig, state: &GovernorState) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if let Some(average) = state.metrics.average_build_time() {
        if average > config.tree_build_time_threshold {
            recommendations.push(Recommendation::new(
                "build_time",
                RecommendationPriority::High,
                format!(
                    "Average tree build takes {:.1}ms (threshold {}ms). Consider virtualizing the tree or reducing the number of suggestions per build.",
                    average, config.tree_build_time_threshold
                ),
            ));
        }
    }

    let error_rate = state.error_rate();
    if error_rate > ERROR_RATE_ADVISORY {
        recommendations.push(Recommendation::new(
            "error_handling",
            RecommendationPriority::High,
            format!(
                "{:.1}% of tree builds fail. Review error handling in the tree builder.",
                error_rate * 100.0
            ),
        ));
    }

    if state.bundle_size > config.bundle_size_threshold {
        recommendations.push(Recommendation::new(
            "bundle_size",
            RecommendationPriority::Medium,
            format!(
                "Bundle is {} bytes (threshold {} bytes). Consider code-splitting the tree view.",
                state.bundle_size, config.bundle_size_threshold
            ),
        ));
    }

    if let Some(growth) = state.metrics.current_growth_rate() {
        if growth > GROWTH_RATE_ADVISORY {
            recommendations.push(Recommendation::new(
                "memory",
                RecommendationPriority::High,
                format!(
                    "Heap grew {:.1}% over the sampling window. Check for retained tree nodes or listener leaks.",
                    growth * 100.0
                ),
            ));
        }
    }

    if let Some(average_render) = state.metrics.average_render_time() {
        if average_render > config.render_time_threshold {
            recommendations.push(Recommendation::new(
                "rendering",
                RecommendationPriority::Medium,
                format!(
                    "Average render takes {:.1}ms (budget {}ms). Consider memoizing tree nodes or rendering fewer levels eagerly.",
                    average_render, config.render_time_threshold
                ),
            ));
        }
    }

    recommendations
}
