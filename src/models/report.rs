//! Report Models
//!
//! Operator-facing diagnostics: regression checks, advisory recommendations
//! and the bundled performance report.

use serde::{Deserialize, Serialize};
use tree_governor_core::GovernorConfig;

use super::metrics::MetricsSnapshot;

/// Qualitative weight of a regression check result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    High,
    Low,
}

/// One threshold comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionTest {
    /// Stable identifier (`build_time`, `memory_trend`, `error_rate`, `render_time`)
    pub name: String,
    pub passed: bool,
    pub current: f64,
    pub threshold: f64,
    pub impact: Impact,
}

impl RegressionTest {
    /// Passes when `current <= threshold`; failures carry high impact.
    pub fn compare(name: &str, current: f64, threshold: f64) -> Self {
        let passed = current <= threshold;
        Self {
            name: name.to_string(),
            passed,
            current,
            threshold,
            impact: if passed { Impact::Low } else { Impact::High },
        }
    }
}

/// Priority of an optimization hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationPriority {
    High,
    Medium,
    Low,
}

/// Advisory optimization hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Area the hint concerns (`build_time`, `error_handling`, `bundle_size`, `memory`, `rendering`)
    pub category: String,
    pub priority: RecommendationPriority,
    pub message: String,
}

impl Recommendation {
    pub fn new(category: &str, priority: RecommendationPriority, message: impl Into<String>) -> Self {
        Self {
            category: category.to_string(),
            priority,
            message: message.into(),
        }
    }
}

/// Everything a dashboard needs in one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub performance_score: u8,
    pub metrics: MetricsSnapshot,
    pub config: GovernorConfig,
    pub regression_tests: Vec<RegressionTest>,
    pub recommendations: Vec<Recommendation>,
    /// RFC 3339 generation time
    pub generated_at: String,
}

impl PerformanceReport {
    /// True when every regression check passed.
    pub fn all_tests_passed(&self) -> bool {
        self.regression_tests.iter().all(|t| t.passed)
    }
}
