//! Governed Outcome Models
//!
//! Structured results returned by `run_governed`. Every failure, whether an
//! admission rejection, a threshold breach or an error from the build itself,
//! is described by a `BuildErrorDescriptor` rather than returned as `Err`.

use serde::{Deserialize, Serialize};

// ============================================================================
// Enums
// ============================================================================

/// Which rendering path the consumer should paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// The expensive hierarchical view built by the governed operation
    Hierarchical,
    /// The cheap flat suggestion list
    Flat,
}

impl std::fmt::Display for RenderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderMode::Hierarchical => write!(f, "hierarchical"),
            RenderMode::Flat => write!(f, "flat"),
        }
    }
}

/// Classification of a build error descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildErrorKind {
    /// Too many candidates for the hierarchical view
    SuggestionCount,
    /// A recent degradation keeps admission closed
    Cooldown,
    /// Too many slow or failed builds in a row
    ConsecutiveSlowBuilds,
    /// Another governed attempt holds the single-flight slot
    AttemptInFlight,
    /// The build completed but breached a threshold
    PerformanceDegradation,
    /// The build itself failed
    BuildError,
}

impl std::fmt::Display for BuildErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildErrorKind::SuggestionCount => write!(f, "suggestion_count"),
            BuildErrorKind::Cooldown => write!(f, "cooldown"),
            BuildErrorKind::ConsecutiveSlowBuilds => write!(f, "consecutive_slow_builds"),
            BuildErrorKind::AttemptInFlight => write!(f, "attempt_in_flight"),
            BuildErrorKind::PerformanceDegradation => write!(f, "performance_degradation"),
            BuildErrorKind::BuildError => write!(f, "build_error"),
        }
    }
}

/// Why the analyzer flagged a completed build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradeReason {
    SlowBuildTime,
    HighMemoryUsage,
    AverageBuildTime,
}

impl std::fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DegradeReason::SlowBuildTime => write!(f, "slow_build_time"),
            DegradeReason::HighMemoryUsage => write!(f, "high_memory_usage"),
            DegradeReason::AverageBuildTime => write!(f, "average_build_time"),
        }
    }
}

// ============================================================================
// Descriptors
// ============================================================================

/// Structured description of a failed or refused build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildErrorDescriptor {
    pub kind: BuildErrorKind,
    pub message: String,
    /// What the consumer should render instead
    pub recommended_fallback: RenderMode,
    /// Message of the error raised by the governed operation, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_error: Option<String>,
}

impl BuildErrorDescriptor {
    /// Descriptor for a refusal or threshold breach.
    pub fn new(kind: BuildErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            recommended_fallback: RenderMode::Flat,
            original_error: None,
        }
    }

    /// Descriptor wrapping an error raised by the governed operation.
    pub fn build_failed(original: impl Into<String>) -> Self {
        let original = original.into();
        Self {
            kind: BuildErrorKind::BuildError,
            message: format!("Tree build failed: {}", original),
            recommended_fallback: RenderMode::Flat,
            original_error: Some(original),
        }
    }
}

impl std::fmt::Display for BuildErrorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Measurements taken around one executed build.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptMetrics {
    pub build_time_ms: f64,
    /// Heap delta across the build; 0 when no heap telemetry is available
    pub memory_used_bytes: i64,
    pub candidate_count: usize,
}

// ============================================================================
// GovernedOutcome
// ============================================================================

/// Result of one governed attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernedOutcome<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<BuildErrorDescriptor>,
    pub should_degrade: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<AttemptMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_score: Option<u8>,
    /// Every analyzer reason that fired for this attempt
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<DegradeReason>,
}

impl<T> GovernedOutcome<T> {
    /// The build ran within every threshold.
    pub fn success(result: T, metrics: AttemptMetrics, performance_score: u8) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
            should_degrade: false,
            metrics: Some(metrics),
            performance_score: Some(performance_score),
            reasons: Vec::new(),
        }
    }

    /// Admission refused the attempt; nothing was executed.
    pub fn rejected(error: BuildErrorDescriptor) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error),
            should_degrade: true,
            metrics: None,
            performance_score: None,
            reasons: Vec::new(),
        }
    }

    /// The build completed but the analyzer asked for degradation.
    pub fn degraded(
        error: BuildErrorDescriptor,
        metrics: AttemptMetrics,
        reasons: Vec<DegradeReason>,
        performance_score: u8,
    ) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error),
            should_degrade: true,
            metrics: Some(metrics),
            performance_score: Some(performance_score),
            reasons,
        }
    }

    /// The governed operation itself failed.
    pub fn failed(error: BuildErrorDescriptor, should_degrade: bool) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error),
            should_degrade,
            metrics: None,
            performance_score: None,
            reasons: Vec::new(),
        }
    }

    /// Rendering directive for the consumer.
    pub fn render_mode(&self) -> RenderMode {
        if self.success {
            RenderMode::Hierarchical
        } else {
            RenderMode::Flat
        }
    }

    /// Error kind, if the attempt did not succeed.
    pub fn error_kind(&self) -> Option<BuildErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// Collapse into a plain `Result`.
    pub fn into_result(self) -> Result<T, BuildErrorDescriptor> {
        match (self.result, self.error) {
            (Some(result), _) => Ok(result),
            (None, Some(error)) => Err(error),
            (None, None) => Err(BuildErrorDescriptor::new(
                BuildErrorKind::BuildError,
                "Governed attempt produced no result",
            )),
        }
    }
}
