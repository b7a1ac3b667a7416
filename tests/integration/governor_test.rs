//! Governor Integration Tests
//!
//! Drives `run_governed` through the documented scenarios:
//! - fast build succeeds and leaves the score untouched
//! - slow build degrades and records a `performance` fallback
//! - oversized candidate sets are refused without side effects
//! - error rate crossing its threshold records an `error_rate` fallback
//! - cooldown and consecutive-slow-build gating

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;

use tree_governor::services::telemetry::ManualClock;
use tree_governor::{
    AutoFallbackThresholds, BuildErrorKind, DegradeReason, FallbackTrigger, GovernedOutcome,
    GovernorConfig, GovernorEvent, RenderMode, TreeBuildGovernor,
};

// ============================================================================
// Helpers
// ============================================================================

const T0: u64 = 1_700_000_000_000;

fn governor(config: GovernorConfig) -> (TreeBuildGovernor, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(T0));
    let governor = TreeBuildGovernor::builder(config)
        .clock(clock.clone())
        .without_samplers()
        .build();
    (governor, clock)
}

/// Governed build that takes `duration_ms` on the manual clock.
async fn timed_build(
    governor: &TreeBuildGovernor,
    clock: &Arc<ManualClock>,
    duration_ms: u64,
) -> GovernedOutcome<&'static str> {
    let clock = clock.clone();
    governor
        .run_governed(&[0u8; 10], move || async move {
            clock.advance(duration_ms);
            Ok::<_, String>("tree")
        })
        .await
}

async fn failing_build(governor: &TreeBuildGovernor) -> GovernedOutcome<&'static str> {
    governor
        .run_governed(&[0u8; 10], || async { Err::<&'static str, _>("missing parent node") })
        .await
}

fn record_events(governor: &TreeBuildGovernor) -> Arc<Mutex<Vec<GovernorEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    governor.add_listener(move |event| sink.lock().unwrap().push(event.clone()));
    events
}

fn event_types(events: &Arc<Mutex<Vec<GovernorEvent>>>) -> Vec<&'static str> {
    events.lock().unwrap().iter().map(|e| e.event_type()).collect()
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_fast_build_succeeds() {
    let (governor, clock) = governor(GovernorConfig::default());
    let events = record_events(&governor);

    let outcome = timed_build(&governor, &clock, 50).await;

    assert!(outcome.success);
    assert!(!outcome.should_degrade);
    assert_eq!(outcome.render_mode(), RenderMode::Hierarchical);
    assert_eq!(outcome.result, Some("tree"));
    assert_eq!(outcome.metrics.unwrap().build_time_ms, 50.0);
    assert_eq!(outcome.metrics.unwrap().memory_used_bytes, 0);
    assert_eq!(outcome.performance_score, Some(100));

    let snapshot = governor.snapshot();
    assert_eq!(snapshot.consecutive_slow_builds, 0);
    assert_eq!(snapshot.total_operations, 1);
    assert_eq!(snapshot.tree_build_times.len(), 1);
    assert_eq!(event_types(&events), vec!["treeBuildSuccess"]);
}

#[tokio::test]
async fn test_slow_build_degrades() {
    let (governor, clock) = governor(GovernorConfig {
        tree_build_time_threshold: 200.0,
        ..Default::default()
    });
    let events = record_events(&governor);

    let outcome = timed_build(&governor, &clock, 250).await;

    assert!(!outcome.success);
    assert!(outcome.should_degrade);
    assert_eq!(outcome.render_mode(), RenderMode::Flat);
    assert!(outcome.result.is_none());
    assert!(outcome.reasons.contains(&DegradeReason::SlowBuildTime));
    let error = outcome.error.unwrap();
    assert_eq!(error.kind, BuildErrorKind::PerformanceDegradation);
    assert_eq!(error.recommended_fallback, RenderMode::Flat);

    let snapshot = governor.snapshot();
    assert_eq!(snapshot.fallback_triggers.len(), 1);
    assert_eq!(snapshot.fallback_triggers[0].trigger, FallbackTrigger::Performance);
    assert_eq!(snapshot.fallback_triggers[0].data["buildTime"], json!(250.0));
    assert_eq!(snapshot.last_degradation_timestamp, T0 + 250);
    assert_eq!(snapshot.degradation_count, 1);
    assert_eq!(snapshot.consecutive_slow_builds, 1);
    assert_eq!(event_types(&events), vec!["autoFallback"]);
}

#[tokio::test]
async fn test_oversized_candidate_set_is_refused() {
    let (governor, _clock) = governor(GovernorConfig::default());
    let events = record_events(&governor);
    let ran = Arc::new(AtomicUsize::new(0));
    let counter = ran.clone();

    let candidates = vec![0u32; 1500];
    let outcome = governor
        .run_governed(&candidates, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(())
        })
        .await;

    assert!(!outcome.success);
    assert!(outcome.should_degrade);
    assert_eq!(outcome.render_mode(), RenderMode::Flat);
    assert_eq!(outcome.error_kind(), Some(BuildErrorKind::SuggestionCount));
    assert_eq!(ran.load(Ordering::SeqCst), 0);

    let snapshot = governor.snapshot();
    assert!(snapshot.tree_build_times.is_empty());
    assert_eq!(snapshot.total_operations, 0);
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_error_rate_triggers_fallback() {
    let (governor, clock) = governor(GovernorConfig {
        degradation_cooldown_ms: 0,
        ..Default::default()
    });

    for _ in 0..8 {
        assert!(timed_build(&governor, &clock, 5).await.success);
    }
    let first = failing_build(&governor).await;
    // 1/9 already exceeds 0.1
    assert_eq!(governor.snapshot().fallback_triggers.len(), 1);
    let second = failing_build(&governor).await;
    assert_eq!(governor.snapshot().fallback_triggers.len(), 2);

    for outcome in [&first, &second] {
        assert!(outcome.should_degrade);
        let error = outcome.error.as_ref().unwrap();
        assert_eq!(error.kind, BuildErrorKind::BuildError);
        assert_eq!(error.original_error.as_deref(), Some("missing parent node"));
    }

    let snapshot = governor.snapshot();
    assert_eq!(snapshot.error_count, 2);
    assert_eq!(snapshot.total_operations, 10);
    assert!((snapshot.error_rate - 0.2).abs() < f64::EPSILON);

    let last = snapshot.fallback_triggers.last().unwrap();
    assert_eq!(last.trigger, FallbackTrigger::ErrorRate);
    assert_eq!(last.data["errorCount"], 2);
    assert_eq!(last.data["totalOperations"], 10);
}

#[tokio::test]
async fn test_failure_emits_error_then_fallback() {
    let (governor, _clock) = governor(GovernorConfig::default());
    let events = record_events(&governor);

    failing_build(&governor).await;

    assert_eq!(event_types(&events), vec!["treeBuildError", "autoFallback"]);
    match &events.lock().unwrap()[0] {
        GovernorEvent::TreeBuildError {
            message,
            error_count,
            total_operations,
        } => {
            assert_eq!(message, "missing parent node");
            assert_eq!(*error_count, 1);
            assert_eq!(*total_operations, 1);
        }
        other => panic!("unexpected event {:?}", other),
    };
}

#[tokio::test]
async fn test_second_failure_crosses_error_rate() {
    let (governor, clock) = governor(GovernorConfig {
        degradation_cooldown_ms: 0,
        ..Default::default()
    });

    for _ in 0..9 {
        assert!(timed_build(&governor, &clock, 5).await.success);
    }

    // 1/10 equals the threshold, which is not a breach
    failing_build(&governor).await;
    let snapshot = governor.snapshot();
    assert_eq!(snapshot.error_count, 1);
    assert!(snapshot.fallback_triggers.is_empty());

    // 2/11 crosses it
    failing_build(&governor).await;
    let snapshot = governor.snapshot();
    assert_eq!(snapshot.error_count, 2);
    assert_eq!(snapshot.fallback_triggers.len(), 1);
    assert_eq!(snapshot.fallback_triggers[0].trigger, FallbackTrigger::ErrorRate);
    assert_eq!(snapshot.fallback_triggers[0].data["errorCount"], 2);
    assert_eq!(snapshot.fallback_triggers[0].data["totalOperations"], 11);
}

#[tokio::test]
async fn test_error_below_threshold_does_not_degrade_state() {
    let (governor, clock) = governor(GovernorConfig {
        auto_fallback_thresholds: AutoFallbackThresholds {
            error_rate: 0.5,
            ..Default::default()
        },
        ..Default::default()
    });

    timed_build(&governor, &clock, 5).await;
    timed_build(&governor, &clock, 5).await;
    let outcome = failing_build(&governor).await;

    assert!(outcome.should_degrade);
    let snapshot = governor.snapshot();
    assert!(snapshot.fallback_triggers.is_empty());
    assert_eq!(snapshot.consecutive_slow_builds, 1);
}

// ============================================================================
// Gating
// ============================================================================

#[tokio::test]
async fn test_cooldown_window() {
    let (governor, clock) = governor(GovernorConfig {
        degradation_cooldown_ms: 5_000,
        ..Default::default()
    });
    let t0 = T0 + 10_000;
    clock.set(t0);
    governor.trigger_auto_fallback(FallbackTrigger::Performance, json!({}));

    for offset in [1, 2_500, 4_999] {
        clock.set(t0 + offset);
        assert_eq!(
            governor.check_pre_build_conditions(1).reason(),
            Some(BuildErrorKind::Cooldown),
            "offset {}",
            offset
        );
    }
    for offset in [5_000, 5_001, 60_000] {
        clock.set(t0 + offset);
        assert!(governor.check_pre_build_conditions(1).is_allowed(), "offset {}", offset);
    }
}

#[tokio::test]
async fn test_refused_attempt_inside_cooldown_mutates_nothing() {
    let (governor, clock) = governor(GovernorConfig::default());
    governor.trigger_auto_fallback(FallbackTrigger::RenderError, json!({}));
    let before = governor.snapshot();

    clock.advance(1_000);
    let outcome = timed_build(&governor, &clock, 5).await;

    assert_eq!(outcome.error_kind(), Some(BuildErrorKind::Cooldown));
    let after = governor.snapshot();
    assert_eq!(after.total_operations, before.total_operations);
    assert_eq!(after.degradation_count, before.degradation_count);
    assert!(after.tree_build_times.is_empty());
}

#[tokio::test]
async fn test_consecutive_slow_builds_close_admission() {
    let (governor, clock) = governor(GovernorConfig {
        degradation_cooldown_ms: 0,
        ..Default::default()
    });

    for _ in 0..3 {
        let outcome = timed_build(&governor, &clock, 150).await;
        assert_eq!(outcome.reasons, vec![DegradeReason::SlowBuildTime]);
    }
    assert_eq!(governor.snapshot().consecutive_slow_builds, 3);

    let decision = governor.check_pre_build_conditions(10);
    assert_eq!(decision.reason(), Some(BuildErrorKind::ConsecutiveSlowBuilds));
    let outcome = timed_build(&governor, &clock, 5).await;
    assert_eq!(outcome.error_kind(), Some(BuildErrorKind::ConsecutiveSlowBuilds));
}

#[tokio::test]
async fn test_fast_build_resets_slow_streak() {
    let (governor, clock) = governor(GovernorConfig {
        degradation_cooldown_ms: 0,
        ..Default::default()
    });

    timed_build(&governor, &clock, 150).await;
    timed_build(&governor, &clock, 150).await;
    assert_eq!(governor.snapshot().consecutive_slow_builds, 2);

    let outcome = timed_build(&governor, &clock, 10).await;
    assert!(outcome.success);
    assert_eq!(governor.snapshot().consecutive_slow_builds, 0);
    assert!(governor.check_pre_build_conditions(10).is_allowed());
}

#[tokio::test]
async fn test_size_gate_ignores_other_state() {
    let (governor, _clock) = governor(GovernorConfig::default());

    assert!(governor.check_pre_build_conditions(1_000).is_allowed());
    assert_eq!(
        governor.check_pre_build_conditions(1_001).reason(),
        Some(BuildErrorKind::SuggestionCount)
    );

    governor.trigger_auto_fallback(FallbackTrigger::Performance, json!({}));
    assert_eq!(
        governor.check_pre_build_conditions(1_001).reason(),
        Some(BuildErrorKind::SuggestionCount)
    );
    assert_eq!(
        governor.check_pre_build_conditions(1_000).reason(),
        Some(BuildErrorKind::Cooldown)
    );
}

// ============================================================================
// Listeners and lifecycle
// ============================================================================

#[tokio::test]
async fn test_panicking_listener_does_not_affect_outcome() {
    let (governor, clock) = governor(GovernorConfig::default());
    governor.add_listener(|_| panic!("toast renderer crashed"));
    let events = record_events(&governor);

    let outcome = timed_build(&governor, &clock, 20).await;

    assert!(outcome.success);
    assert_eq!(event_types(&events), vec!["treeBuildSuccess"]);
}

#[tokio::test]
async fn test_remove_listener() {
    let (governor, _clock) = governor(GovernorConfig::default());
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let id = governor.add_listener(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    governor.monitor_bundle_size(10 * 1024 * 1024);
    assert!(governor.remove_listener(id));
    governor.monitor_bundle_size(10 * 1024 * 1024);

    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_destroy_is_idempotent_and_silences_listeners() {
    let (governor, _clock) = governor(GovernorConfig::default());
    let events = record_events(&governor);

    governor.destroy();
    governor.destroy();

    assert!(governor.is_destroyed());
    assert!(governor.monitor_bundle_size(10 * 1024 * 1024));
    assert!(events.lock().unwrap().is_empty());
}
