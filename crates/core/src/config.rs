//! Governor Configuration
//!
//! Threshold record consulted by the admission gate, the post-hoc analyzer,
//! the scoring engine and the report generator. The structure is supplied
//! once at construction and never mutated afterwards.
//!
//! Keys are camelCase on the wire. Every field carries a serde default, so a
//! caller-supplied JSON object overrides defaults field-by-field and unknown
//! keys are ignored.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;

// ============================================================================
// Auto-fallback thresholds
// ============================================================================

/// Thresholds that flip the governor into the cheap rendering path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoFallbackThresholds {
    /// Slow or failed builds in a row before admission closes
    #[serde(default = "default_consecutive_slow_builds")]
    pub consecutive_slow_builds: u32,
    /// Rolling average build time (ms) above which a build degrades
    #[serde(default = "default_average_build_time_threshold")]
    pub average_build_time_threshold: f64,
    /// Heap growth fraction over the sampling window that triggers fallback
    #[serde(default = "default_memory_growth_rate")]
    pub memory_growth_rate: f64,
    /// Failed builds / admitted builds above which fallback triggers
    #[serde(default = "default_error_rate")]
    pub error_rate: f64,
}

fn default_consecutive_slow_builds() -> u32 {
    3
}

fn default_average_build_time_threshold() -> f64 {
    150.0
}

fn default_memory_growth_rate() -> f64 {
    0.2
}

fn default_error_rate() -> f64 {
    0.1
}

impl Default for AutoFallbackThresholds {
    fn default() -> Self {
        Self {
            consecutive_slow_builds: default_consecutive_slow_builds(),
            average_build_time_threshold: default_average_build_time_threshold(),
            memory_growth_rate: default_memory_growth_rate(),
            error_rate: default_error_rate(),
        }
    }
}

// ============================================================================
// Governor configuration
// ============================================================================

/// Immutable-after-construction governor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernorConfig {
    /// Single build duration (ms) above which the build counts as slow
    #[serde(default = "default_tree_build_time_threshold")]
    pub tree_build_time_threshold: f64,
    /// Render duration (ms) budget reported by the presentation layer
    #[serde(default = "default_render_time_threshold")]
    pub render_time_threshold: f64,
    /// Heap delta (bytes) a single build may allocate
    #[serde(default = "default_memory_threshold")]
    pub memory_threshold: u64,
    /// Largest candidate list the hierarchical view may be built from
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
    /// Admission stays closed this long (ms) after a degradation
    #[serde(default = "default_degradation_cooldown_ms")]
    pub degradation_cooldown_ms: u64,
    /// Bundle size (bytes) above which a warning is emitted
    #[serde(default = "default_bundle_size_threshold")]
    pub bundle_size_threshold: u64,
    /// Auto-fallback thresholds
    #[serde(default)]
    pub auto_fallback_thresholds: AutoFallbackThresholds,
    /// Period (ms) of the heap sampler
    #[serde(default = "default_memory_sample_interval_ms")]
    pub memory_sample_interval_ms: u64,
    /// Reject attempts while another governed attempt is in flight
    #[serde(default)]
    pub single_flight: bool,
}

fn default_tree_build_time_threshold() -> f64 {
    100.0
}

fn default_render_time_threshold() -> f64 {
    16.0
}

fn default_memory_threshold() -> u64 {
    50 * 1024 * 1024
}

fn default_max_suggestions() -> usize {
    1000
}

fn default_degradation_cooldown_ms() -> u64 {
    30_000
}

fn default_bundle_size_threshold() -> u64 {
    500 * 1024
}

fn default_memory_sample_interval_ms() -> u64 {
    5000
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            tree_build_time_threshold: default_tree_build_time_threshold(),
            render_time_threshold: default_render_time_threshold(),
            memory_threshold: default_memory_threshold(),
            max_suggestions: default_max_suggestions(),
            degradation_cooldown_ms: default_degradation_cooldown_ms(),
            bundle_size_threshold: default_bundle_size_threshold(),
            auto_fallback_thresholds: AutoFallbackThresholds::default(),
            memory_sample_interval_ms: default_memory_sample_interval_ms(),
            single_flight: false,
        }
    }
}

impl GovernorConfig {
    /// Parse a configuration from a JSON options object.
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Report values that are accepted but probably not what the caller meant.
    ///
    /// The governor never rejects a configuration; these warnings are only
    /// logged so odd thresholds show up in diagnostics.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let ms_fields = [
            ("treeBuildTimeThreshold", self.tree_build_time_threshold),
            ("renderTimeThreshold", self.render_time_threshold),
            (
                "autoFallbackThresholds.averageBuildTimeThreshold",
                self.auto_fallback_thresholds.average_build_time_threshold,
            ),
        ];
        for (name, value) in ms_fields {
            if !value.is_finite() || value <= 0.0 {
                warnings.push(format!("{} should be a positive duration, got {}", name, value));
            }
        }

        let rate_fields = [
            (
                "autoFallbackThresholds.memoryGrowthRate",
                self.auto_fallback_thresholds.memory_growth_rate,
            ),
            (
                "autoFallbackThresholds.errorRate",
                self.auto_fallback_thresholds.error_rate,
            ),
        ];
        for (name, value) in rate_fields {
            if !value.is_finite() || value < 0.0 {
                warnings.push(format!("{} should be a non-negative fraction, got {}", name, value));
            }
        }
        if self.auto_fallback_thresholds.error_rate >= 1.0 {
            warnings.push("autoFallbackThresholds.errorRate >= 1 never triggers a fallback".to_string());
        }

        if self.max_suggestions == 0 {
            warnings.push("maxSuggestions is 0, every non-empty build is rejected".to_string());
        }
        if self.auto_fallback_thresholds.consecutive_slow_builds == 0 {
            warnings.push(
                "autoFallbackThresholds.consecutiveSlowBuilds is 0, admission is always closed"
                    .to_string(),
            );
        }
        if self.memory_sample_interval_ms == 0 {
            warnings.push("memorySampleIntervalMs is 0, heap sampling is disabled".to_string());
        }

        warnings
    }
}
