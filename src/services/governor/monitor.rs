//! Tree Build Governor
//!
//! Owns the control loop around the expensive hierarchical view build:
//! admission before each attempt, timing and heap measurement around it,
//! post-hoc analysis after it, the degrade/cooldown state machine, the
//! composite score and the event fan-out.
//!
//! One governor is meant to live for one view session. It is cheap to clone
//! (all clones share state) and is torn down with `destroy()`.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures_util::FutureExt;
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tree_governor_core::{FallbackEvent, FallbackTrigger, GovernorConfig, GovernorEvent};

use crate::models::metrics::MetricsSnapshot;
use crate::models::outcome::{AttemptMetrics, BuildErrorDescriptor, BuildErrorKind, GovernedOutcome};
use crate::models::report::{PerformanceReport, Recommendation, RegressionTest};
use crate::services::telemetry::{
    Clock, MemoryReader, NoopMemoryReader, NoopPaintSource, PaintEntry, PaintEntryKind,
    PaintTimingSource, SystemClock,
};
use crate::utils::error::{GovernorError, GovernorResult};

use super::admission::{self, AdmissionDecision};
use super::analyzer::{self, PerformanceAnalysis};
use super::events::{EventBus, ListenerId};
use super::panic_message;
use super::render::RenderErrorReporter;
use super::reporting;
use super::scoring;
use super::state::GovernorState;

// ============================================================================
// Builder
// ============================================================================

/// Assembles a governor with its telemetry collaborators.
pub struct GovernorBuilder {
    config: GovernorConfig,
    clock: Arc<dyn Clock>,
    memory_reader: Arc<dyn MemoryReader>,
    paint_source: Arc<dyn PaintTimingSource>,
    start_samplers: bool,
}

impl GovernorBuilder {
    pub fn new(config: GovernorConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock::new()),
            memory_reader: Arc::new(NoopMemoryReader),
            paint_source: Arc::new(NoopPaintSource),
            start_samplers: true,
        }
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn memory_reader(mut self, reader: Arc<dyn MemoryReader>) -> Self {
        self.memory_reader = reader;
        self
    }

    pub fn paint_source(mut self, source: Arc<dyn PaintTimingSource>) -> Self {
        self.paint_source = source;
        self
    }

    /// Skip the background samplers (heap reader and paint subscription).
    pub fn without_samplers(mut self) -> Self {
        self.start_samplers = false;
        self
    }

    /// Like `build`, but fails instead of skipping the samplers when no tokio
    /// runtime is available.
    pub fn try_build(self) -> GovernorResult<TreeBuildGovernor> {
        if self.start_samplers {
            tokio::runtime::Handle::try_current()
                .map_err(|e| GovernorError::runtime(format!("governor samplers need a tokio runtime: {}", e)))?;
        }
        Ok(self.build())
    }

    /// Build the governor and start its samplers on the current tokio runtime.
    ///
    /// Configuration warnings are logged, never rejected. Without a runtime
    /// the samplers are skipped and the governor still works.
    pub fn build(self) -> TreeBuildGovernor {
        for warning in self.config.validate() {
            warn!(warning = %warning, "Governor configuration accepted with warning");
        }

        let inner = Arc::new(GovernorInner {
            config: self.config,
            clock: self.clock,
            memory_reader: self.memory_reader,
            state: Mutex::new(GovernorState::new()),
            bus: EventBus::new(),
            in_flight: Semaphore::new(1),
            cancel: CancellationToken::new(),
            destroyed: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
        });

        if self.start_samplers {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    start_memory_sampler(&inner, &handle);
                    start_paint_subscriber(&inner, &handle, self.paint_source.as_ref());
                }
                Err(e) => {
                    warn!(error = %e, "No tokio runtime, governor samplers not started");
                }
            }
        }

        info!(
            tree_build_time_threshold = inner.config.tree_build_time_threshold,
            max_suggestions = inner.config.max_suggestions,
            cooldown_ms = inner.config.degradation_cooldown_ms,
            "Tree build governor created"
        );

        TreeBuildGovernor { inner }
    }
}

// ============================================================================
// Governor
// ============================================================================

struct GovernorInner {
    config: GovernorConfig,
    clock: Arc<dyn Clock>,
    memory_reader: Arc<dyn MemoryReader>,
    state: Mutex<GovernorState>,
    bus: EventBus,
    in_flight: Semaphore,
    cancel: CancellationToken,
    destroyed: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Drop for GovernorInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Adaptive gate around the hierarchical suggestion view build.
#[derive(Clone)]
pub struct TreeBuildGovernor {
    inner: Arc<GovernorInner>,
}

impl std::fmt::Debug for TreeBuildGovernor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeBuildGovernor")
            .field("config", &self.inner.config)
            .field("destroyed", &self.is_destroyed())
            .finish_non_exhaustive()
    }
}

impl TreeBuildGovernor {
    /// Start building a governor for `config`.
    pub fn builder(config: GovernorConfig) -> GovernorBuilder {
        GovernorBuilder::new(config)
    }

    /// Governor with default collaborators (system clock, no heap or paint telemetry).
    pub fn new(config: GovernorConfig) -> Self {
        GovernorBuilder::new(config).build()
    }

    pub fn config(&self) -> &GovernorConfig {
        &self.inner.config
    }

    // ------------------------------------------------------------------------
    // Governed execution
    // ------------------------------------------------------------------------

    /// Run `operation` under governance for a build over `candidates`.
    ///
    /// Never returns `Err`: refusals, threshold breaches and build failures
    /// (including panics inside the operation) all come back as a
    /// `GovernedOutcome` carrying a `BuildErrorDescriptor`.
    pub async fn run_governed<S, T, E, F, Fut>(&self, candidates: &[S], operation: F) -> GovernedOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let candidate_count = candidates.len();
        let start_ms = self.inner.clock.now_precise_ms();
        let start_heap = self.inner.memory_reader.used_heap_bytes();

        if let AdmissionDecision::Rejected { reason, error } = self.check_pre_build_conditions(candidate_count) {
            info!(reason = %reason, candidates = candidate_count, "Tree build refused");
            return GovernedOutcome::rejected(error);
        }

        let _permit = if self.inner.config.single_flight {
            match self.inner.in_flight.try_acquire() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    info!(candidates = candidate_count, "Tree build refused, another build in flight");
                    return GovernedOutcome::rejected(BuildErrorDescriptor::new(
                        BuildErrorKind::AttemptInFlight,
                        "Another tree build is already running; rendering flat list",
                    ));
                }
            }
        } else {
            None
        };

        self.lock_state().total_operations += 1;

        let result = AssertUnwindSafe(async move { operation().await })
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(value)) => self.on_build_completed(value, start_ms, start_heap, candidate_count),
            Ok(Err(e)) => self.on_build_failed(e.to_string()),
            Err(payload) => self.on_build_failed(format!("panic: {}", panic_message(payload.as_ref()))),
        }
    }

    fn on_build_completed<T>(
        &self,
        value: T,
        start_ms: f64,
        start_heap: Option<u64>,
        candidate_count: usize,
    ) -> GovernedOutcome<T> {
        let build_time_ms = (self.inner.clock.now_precise_ms() - start_ms).max(0.0);
        let memory_used_bytes = match (start_heap, self.inner.memory_reader.used_heap_bytes()) {
            (Some(start), Some(end)) => end as i64 - start as i64,
            _ => 0,
        };
        let metrics = AttemptMetrics {
            build_time_ms,
            memory_used_bytes,
            candidate_count,
        };

        let analysis = {
            let mut state = self.lock_state();
            state.metrics.record_build_time(self.inner.clock.now_ms(), build_time_ms);
            analyzer::analyze_performance(&self.inner.config, &mut state, build_time_ms, memory_used_bytes)
        };

        if analysis.should_fallback {
            self.trigger_auto_fallback(
                FallbackTrigger::Performance,
                json!({
                    "reasons": analysis.reasons,
                    "message": analysis.message,
                    "severityScore": analysis.severity_score,
                    "buildTime": build_time_ms,
                    "memoryUsed": memory_used_bytes,
                    "candidateCount": candidate_count,
                }),
            );
            let score = self.calculate_performance_score();
            return GovernedOutcome::degraded(
                BuildErrorDescriptor::new(BuildErrorKind::PerformanceDegradation, analysis.message),
                metrics,
                analysis.reasons,
                score,
            );
        }

        self.lock_state().degrade.consecutive_slow_builds = 0;
        let score = self.calculate_performance_score();
        debug!(build_time_ms, memory_used_bytes, score, "Tree build succeeded");
        self.inner.bus.notify(&GovernorEvent::TreeBuildSuccess {
            build_time_ms,
            memory_used_bytes,
            performance_score: score,
        });

        GovernedOutcome::success(value, metrics, score)
    }

    fn on_build_failed<T>(&self, message: String) -> GovernedOutcome<T> {
        let (error_count, total_operations, error_rate) = {
            let mut state = self.lock_state();
            state.error_count += 1;
            state.degrade.consecutive_slow_builds += 1;
            (state.error_count, state.total_operations, state.error_rate())
        };

        warn!(error = %message, error_count, total_operations, "Tree build failed");
        self.inner.bus.notify(&GovernorEvent::TreeBuildError {
            message: message.clone(),
            error_count,
            total_operations,
        });

        if error_rate > self.inner.config.auto_fallback_thresholds.error_rate {
            self.trigger_auto_fallback(
                FallbackTrigger::ErrorRate,
                json!({
                    "errorRate": error_rate,
                    "errorCount": error_count,
                    "totalOperations": total_operations,
                    "error": message,
                }),
            );
        }

        GovernedOutcome::failed(BuildErrorDescriptor::build_failed(message), true)
    }

    // ------------------------------------------------------------------------
    // Admission, analysis, degradation
    // ------------------------------------------------------------------------

    /// Side-effect-free admission check for a build over `candidate_count` candidates.
    pub fn check_pre_build_conditions(&self, candidate_count: usize) -> AdmissionDecision {
        let now = self.inner.clock.now_ms();
        let state = self.lock_state();
        admission::check_pre_build_conditions(&self.inner.config, &state, candidate_count, now)
    }

    /// Judge a build against the thresholds using the current rolling metrics.
    ///
    /// Does not record `build_time_ms`; a slow build still advances the
    /// consecutive-slow-build counter.
    pub fn analyze_performance(&self, build_time_ms: f64, memory_used_bytes: i64) -> PerformanceAnalysis {
        let mut state = self.lock_state();
        analyzer::analyze_performance(&self.inner.config, &mut state, build_time_ms, memory_used_bytes)
    }

    /// Record a degradation and start the cooldown window.
    pub fn trigger_auto_fallback(&self, trigger: FallbackTrigger, data: Value) -> FallbackEvent {
        let score = self.calculate_performance_score();
        let event = FallbackEvent {
            trigger,
            timestamp: self.inner.clock.now_ms(),
            data,
            performance_score_at_trigger: score,
        };

        let degradation_count = {
            let mut state = self.lock_state();
            state.degrade.record_fallback(event.clone());
            state.degrade.degradation_count
        };

        warn!(
            trigger = %trigger,
            score,
            degradation_count,
            "Auto fallback to flat suggestion list"
        );
        self.inner.bus.notify(&GovernorEvent::AutoFallback(event.clone()));
        event
    }

    /// Recompute, store and return the 0-100 performance score.
    pub fn calculate_performance_score(&self) -> u8 {
        let now = self.inner.clock.now_ms();
        let mut state = self.lock_state();
        let score = scoring::calculate_performance_score(&self.inner.config, &state, now);
        state.performance_score = score;
        score
    }

    // ------------------------------------------------------------------------
    // Metric recording
    // ------------------------------------------------------------------------

    pub fn record_build_time(&self, build_time_ms: f64) {
        let now = self.inner.clock.now_ms();
        self.lock_state().metrics.record_build_time(now, build_time_ms);
    }

    pub fn record_render_time(&self, render_time_ms: f64) {
        let now = self.inner.clock.now_ms();
        self.lock_state().metrics.record_render_time(now, render_time_ms);
    }

    /// Append a heap sample taken at `at` (ms since epoch).
    pub fn record_memory_sample(&self, bytes_used: u64, at: u64) {
        self.lock_state().metrics.record_memory_sample(at, bytes_used);
    }

    /// Store the latest value for a web vital and emit `webVital`.
    pub fn record_web_vital(&self, name: &str, value: f64) {
        self.lock_state().metrics.record_web_vital(name, value);
        debug!(name, value, "Web vital recorded");
        self.inner.bus.notify(&GovernorEvent::WebVital {
            name: name.to_string(),
            value,
        });
    }

    /// Growth over the recent heap window; triggers `memory_growth` fallback past threshold.
    ///
    /// No-op (returns `None`) with fewer than two heap samples.
    pub fn analyze_memory_growth(&self) -> Option<f64> {
        let now = self.inner.clock.now_ms();
        let growth_rate = {
            let mut state = self.lock_state();
            let rate = state.metrics.growth_rate()?;
            state.metrics.record_growth_rate(now, rate);
            rate
        };

        let threshold = self.inner.config.auto_fallback_thresholds.memory_growth_rate;
        if growth_rate > threshold {
            self.trigger_auto_fallback(
                FallbackTrigger::MemoryGrowth,
                json!({ "growthRate": growth_rate, "threshold": threshold }),
            );
        }
        Some(growth_rate)
    }

    fn record_paint_entry(&self, entry: PaintEntry) {
        match entry.kind {
            PaintEntryKind::Measure => self.record_render_time(entry.value),
            PaintEntryKind::Paint
            | PaintEntryKind::LargestContentfulPaint
            | PaintEntryKind::LayoutShift => self.record_web_vital(&entry.name, entry.value),
        }
    }

    fn sample_memory(&self) {
        let Some(bytes) = self.inner.memory_reader.used_heap_bytes() else {
            return;
        };
        self.record_memory_sample(bytes, self.inner.clock.now_ms());
        if let Some(rate) = self.analyze_memory_growth() {
            tracing::trace!(bytes, growth_rate = rate, "Heap sampled");
        }
    }

    // ------------------------------------------------------------------------
    // Bundle size, render errors
    // ------------------------------------------------------------------------

    /// Record the bundle size; emits `bundleSizeWarning` and returns `true` past threshold.
    pub fn monitor_bundle_size(&self, size_bytes: u64) -> bool {
        self.lock_state().bundle_size = size_bytes;
        let threshold_bytes = self.inner.config.bundle_size_threshold;
        if size_bytes <= threshold_bytes {
            return false;
        }

        warn!(size_bytes, threshold_bytes, "Bundle size exceeds threshold");
        self.inner.bus.notify(&GovernorEvent::BundleSizeWarning {
            size_bytes,
            threshold_bytes,
        });
        true
    }

    /// Handle for the presentation layer's error boundary.
    pub fn render_reporter(&self) -> RenderErrorReporter {
        RenderErrorReporter::new(self.clone())
    }

    pub(crate) fn note_render_error(&self) -> u64 {
        let mut state = self.lock_state();
        state.render_error_count += 1;
        state.render_error_count
    }

    pub(crate) fn note_render_retry(&self) -> u64 {
        let mut state = self.lock_state();
        state.render_retry_count += 1;
        state.render_retry_count
    }

    // ------------------------------------------------------------------------
    // Reporting
    // ------------------------------------------------------------------------

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.lock_state().snapshot()
    }

    pub fn create_regression_tests(&self) -> Vec<RegressionTest> {
        let state = self.lock_state();
        reporting::create_regression_tests(&self.inner.config, &state)
    }

    pub fn generate_recommendations(&self) -> Vec<Recommendation> {
        let state = self.lock_state();
        reporting::generate_recommendations(&self.inner.config, &state)
    }

    /// Score, metrics, configuration, regression checks and recommendations in one document.
    pub fn get_performance_report(&self) -> PerformanceReport {
        let performance_score = self.calculate_performance_score();
        let generated_at = chrono::DateTime::from_timestamp_millis(self.inner.clock.now_ms() as i64)
            .map(|at| at.to_rfc3339())
            .unwrap_or_default();

        let state = self.lock_state();
        PerformanceReport {
            performance_score,
            metrics: state.snapshot(),
            config: self.inner.config.clone(),
            regression_tests: reporting::create_regression_tests(&self.inner.config, &state),
            recommendations: reporting::generate_recommendations(&self.inner.config, &state),
            generated_at,
        }
    }

    // ------------------------------------------------------------------------
    // Listeners and lifecycle
    // ------------------------------------------------------------------------

    pub fn add_listener(&self, listener: impl Fn(&GovernorEvent) + Send + Sync + 'static) -> ListenerId {
        self.inner.bus.add_listener(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.bus.remove_listener(id)
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::SeqCst)
    }

    /// Stop the samplers, detach the paint subscription, then drop all listeners.
    ///
    /// Idempotent. No sampler callback fires after this returns.
    pub fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.inner.cancel.cancel();
        let tasks: Vec<JoinHandle<()>> = self
            .inner
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for task in &tasks {
            task.abort();
        }
        self.inner.bus.clear();

        info!(stopped_tasks = tasks.len(), "Tree build governor destroyed");
    }

    fn lock_state(&self) -> MutexGuard<'_, GovernorState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// Samplers
// ============================================================================

fn start_memory_sampler(inner: &Arc<GovernorInner>, handle: &tokio::runtime::Handle) {
    if !inner.memory_reader.is_supported() {
        debug!("Heap telemetry unavailable, memory sampler inert");
        return;
    }
    if inner.config.memory_sample_interval_ms == 0 {
        return;
    }

    let weak = Arc::downgrade(inner);
    let cancel = inner.cancel.clone();
    let period = Duration::from_millis(inner.config.memory_sample_interval_ms);
    let task = handle.spawn(run_memory_sampler(weak, cancel, period));
    push_task(inner, task);
}

async fn run_memory_sampler(weak: Weak<GovernorInner>, cancel: CancellationToken, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; samples start one period in.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let Some(governor) = upgrade(&weak) else {
            break;
        };
        governor.sample_memory();
    }
    debug!("Memory sampler stopped");
}

fn start_paint_subscriber(
    inner: &Arc<GovernorInner>,
    handle: &tokio::runtime::Handle,
    source: &dyn PaintTimingSource,
) {
    if !source.is_supported() {
        warn!("Paint timing unavailable, web vitals will not be collected");
        return;
    }

    let receiver = match source.subscribe() {
        Ok(receiver) => receiver,
        Err(e) => {
            warn!(error = %e, "Paint timing subscription failed, continuing without it");
            return;
        }
    };

    let weak = Arc::downgrade(inner);
    let cancel = inner.cancel.clone();
    let task = handle.spawn(async move {
        let mut receiver = receiver;
        loop {
            let entry = tokio::select! {
                _ = cancel.cancelled() => break,
                entry = receiver.recv() => entry,
            };
            let Some(entry) = entry else {
                break;
            };
            let Some(governor) = upgrade(&weak) else {
                break;
            };
            governor.record_paint_entry(entry);
        }
        debug!("Paint timing subscriber stopped");
    });
    push_task(inner, task);
}

/// Live, non-destroyed governor for a background task, if any.
fn upgrade(weak: &Weak<GovernorInner>) -> Option<TreeBuildGovernor> {
    let inner = weak.upgrade()?;
    if inner.destroyed.load(Ordering::SeqCst) {
        return None;
    }
    Some(TreeBuildGovernor { inner })
}

fn push_task(inner: &GovernorInner, task: JoinHandle<()>) {
    inner
        .tasks
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(task);
}
