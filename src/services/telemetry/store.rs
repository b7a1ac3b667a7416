//! Metric Store
//!
//! Bounded in-memory series of timing and heap samples. Pure data holder:
//! the governor decides what to do with the numbers.

use std::collections::BTreeMap;

use crate::models::metrics::{
    BoundedSeries, MetricSample, MEMORY_GROWTH_CAPACITY, MEMORY_USAGE_CAPACITY,
    RENDER_TIMES_CAPACITY, TREE_BUILD_TIMES_CAPACITY,
};

/// Heap samples considered by one growth analysis
pub const GROWTH_WINDOW: usize = 10;

#[derive(Debug, Clone)]
pub struct MetricStore {
    pub tree_build_times: BoundedSeries,
    pub render_times: BoundedSeries,
    pub memory_usage: BoundedSeries,
    pub memory_growth_history: BoundedSeries,
    /// Latest value per web-vital name
    pub web_vitals: BTreeMap<String, f64>,
}

impl Default for MetricStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricStore {
    pub fn new() -> Self {
        Self {
            tree_build_times: BoundedSeries::new(TREE_BUILD_TIMES_CAPACITY),
            render_times: BoundedSeries::new(RENDER_TIMES_CAPACITY),
            memory_usage: BoundedSeries::new(MEMORY_USAGE_CAPACITY),
            memory_growth_history: BoundedSeries::new(MEMORY_GROWTH_CAPACITY),
            web_vitals: BTreeMap::new(),
        }
    }

    pub fn record_build_time(&mut self, at: u64, build_time_ms: f64) {
        self.tree_build_times.push(MetricSample::new(at, build_time_ms));
    }

    pub fn record_render_time(&mut self, at: u64, render_time_ms: f64) {
        self.render_times.push(MetricSample::new(at, render_time_ms));
    }

    pub fn record_memory_sample(&mut self, at: u64, bytes_used: u64) {
        self.memory_usage.push(MetricSample::new(at, bytes_used as f64));
    }

    pub fn record_web_vital(&mut self, name: &str, value: f64) {
        self.web_vitals.insert(name.to_string(), value);
    }

    pub fn record_growth_rate(&mut self, at: u64, rate: f64) {
        self.memory_growth_history.push(MetricSample::new(at, rate));
    }

    /// `(newest - oldest) / oldest` over the last `GROWTH_WINDOW` heap samples.
    ///
    /// `None` with fewer than two samples or when the oldest reading is zero.
    pub fn growth_rate(&self) -> Option<f64> {
        let window = self.memory_usage.recent(GROWTH_WINDOW);
        if window.len() < 2 {
            return None;
        }
        let oldest = window.first()?.value;
        let newest = window.last()?.value;
        if oldest <= 0.0 {
            return None;
        }
        Some((newest - oldest) / oldest)
    }

    /// Heap delta between the earliest and latest of the last `n` samples.
    pub fn memory_trend(&self, n: usize) -> Option<f64> {
        let window = self.memory_usage.recent(n);
        if window.len() < 2 {
            return None;
        }
        Some(window.last()?.value - window.first()?.value)
    }

    pub fn average_build_time(&self) -> Option<f64> {
        self.tree_build_times.average()
    }

    pub fn average_render_time(&self) -> Option<f64> {
        self.render_times.average()
    }

    pub fn current_growth_rate(&self) -> Option<f64> {
        self.memory_growth_history.latest().map(|s| s.value)
    }
}
