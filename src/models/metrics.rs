//! Metric Models
//!
//! Timestamped samples, the bounded FIFO series that hold them, and the
//! serializable snapshot handed to reports and dashboards.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use tree_governor_core::FallbackEvent;

/// Retained build-time samples
pub const TREE_BUILD_TIMES_CAPACITY: usize = 20;
/// Retained render-time samples
pub const RENDER_TIMES_CAPACITY: usize = 20;
/// Retained heap-usage samples
pub const MEMORY_USAGE_CAPACITY: usize = 50;
/// Retained growth-rate samples
pub const MEMORY_GROWTH_CAPACITY: usize = 20;
/// Retained fallback events
pub const FALLBACK_HISTORY_CAPACITY: usize = 10;

/// A single `{timestamp, value}` observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    pub value: f64,
}

impl MetricSample {
    pub fn new(timestamp: u64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

// ============================================================================
// BoundedSeries
// ============================================================================

/// Insertion-ordered series that keeps only the most recent `capacity` samples.
///
/// Older samples are dropped from the front on every push; the series is
/// never sorted.
#[derive(Debug, Clone)]
pub struct BoundedSeries {
    samples: VecDeque<MetricSample>,
    capacity: usize,
}

impl BoundedSeries {
    /// Create an empty series retaining at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest ones past capacity.
    pub fn push(&mut self, sample: MetricSample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest-to-newest iteration.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &MetricSample> + ExactSizeIterator {
        self.samples.iter()
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<&MetricSample> {
        self.samples.back()
    }

    /// The most recent `n` samples, oldest first.
    pub fn recent(&self, n: usize) -> Vec<MetricSample> {
        let skip = self.samples.len().saturating_sub(n);
        self.samples.iter().skip(skip).copied().collect()
    }

    /// Mean of every retained value.
    pub fn average(&self) -> Option<f64> {
        mean(self.samples.iter().map(|s| s.value))
    }

    /// Mean of the most recent `n` values.
    pub fn recent_average(&self, n: usize) -> Option<f64> {
        let skip = self.samples.len().saturating_sub(n);
        mean(self.samples.iter().skip(skip).map(|s| s.value))
    }

    pub fn to_vec(&self) -> Vec<MetricSample> {
        self.samples.iter().copied().collect()
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Point-in-time copy of every rolling metric and counter, plus derived values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub tree_build_times: Vec<MetricSample>,
    pub render_times: Vec<MetricSample>,
    pub memory_usage: Vec<MetricSample>,
    pub memory_growth_history: Vec<MetricSample>,
    /// Latest value per web-vital name
    pub web_vitals: BTreeMap<String, f64>,
    pub fallback_triggers: Vec<FallbackEvent>,
    pub error_count: u64,
    pub total_operations: u64,
    pub degradation_count: u64,
    pub consecutive_slow_builds: u32,
    /// 0 when no degradation has happened yet
    pub last_degradation_timestamp: u64,
    pub bundle_size: u64,
    pub performance_score: u8,
    pub render_error_count: u64,
    pub render_retry_count: u64,
    pub average_build_time: Option<f64>,
    pub average_render_time: Option<f64>,
    pub error_rate: f64,
    /// Most recent heap growth rate, if growth has been analyzed
    pub current_growth_rate: Option<f64>,
}
