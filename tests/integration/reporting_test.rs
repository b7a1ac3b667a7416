//! Reporting Integration Tests
//!
//! Performance report, regression checks, recommendations and the JSON
//! shape consumed by dashboards.

use std::sync::Arc;

use serde_json::Value;

use tree_governor::services::telemetry::ManualClock;
use tree_governor::{
    FallbackTrigger, GovernorConfig, GovernorEvent, RenderErrorContract, TreeBuildGovernor,
};

fn governor(config: GovernorConfig) -> (TreeBuildGovernor, Arc<ManualClock>) {
    // 2023-11-14T22:13:20Z
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let governor = TreeBuildGovernor::builder(config)
        .clock(clock.clone())
        .without_samplers()
        .build();
    (governor, clock)
}

#[test]
fn test_clean_report() {
    let (governor, _clock) = governor(GovernorConfig::default());

    let report = governor.get_performance_report();

    assert_eq!(report.performance_score, 100);
    assert!(report.all_tests_passed());
    assert!(report.recommendations.is_empty());
    assert_eq!(report.config, GovernorConfig::default());
    assert!(report.generated_at.starts_with("2023-11-14T22:13:20"));
}

#[test]
fn test_degraded_report() {
    let (governor, _clock) = governor(GovernorConfig::default());
    for ms in [300.0, 280.0, 320.0] {
        governor.record_build_time(ms);
    }
    governor.record_render_time(40.0);
    governor.monitor_bundle_size(900 * 1024);
    governor.trigger_auto_fallback(FallbackTrigger::Performance, serde_json::json!({}));

    let report = governor.get_performance_report();

    // -30 build time (capped), -10 recent fallback
    assert_eq!(report.performance_score, 60);
    assert_eq!(governor.snapshot().performance_score, 60);

    let failed: Vec<&str> = report
        .regression_tests
        .iter()
        .filter(|t| !t.passed)
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(failed, vec!["build_time", "render_time"]);

    let categories: Vec<&str> = report
        .recommendations
        .iter()
        .map(|r| r.category.as_str())
        .collect();
    assert_eq!(categories, vec!["build_time", "bundle_size", "rendering"]);
}

#[test]
fn test_fallback_score_is_captured_before_recording() {
    let (governor, clock) = governor(GovernorConfig::default());

    let first = governor.trigger_auto_fallback(FallbackTrigger::Performance, serde_json::json!({}));
    clock.advance(1_000);
    let second = governor.trigger_auto_fallback(FallbackTrigger::MemoryGrowth, serde_json::json!({}));

    assert_eq!(first.performance_score_at_trigger, 100);
    assert_eq!(second.performance_score_at_trigger, 90);
    assert_eq!(governor.calculate_performance_score(), 80);
    assert_eq!(governor.snapshot().last_degradation_timestamp, second.timestamp);
}

#[test]
fn test_fallback_history_keeps_last_ten() {
    let (governor, clock) = governor(GovernorConfig::default());
    for _ in 0..15 {
        governor.trigger_auto_fallback(FallbackTrigger::Performance, serde_json::json!({}));
        clock.advance(100);
    }

    let snapshot = governor.snapshot();
    assert_eq!(snapshot.fallback_triggers.len(), 10);
    assert_eq!(snapshot.degradation_count, 15);
    assert_eq!(
        snapshot.fallback_triggers[0].timestamp,
        1_700_000_000_000 + 500
    );
    assert_eq!(governor.calculate_performance_score(), 0);
}

#[test]
fn test_render_errors_do_not_touch_build_error_rate() {
    let (governor, _clock) = governor(GovernorConfig::default());
    let reporter = governor.render_reporter();

    reporter.on_error("tree node threw");
    reporter.on_retry(1);
    reporter.on_fallback("retries exhausted");

    let snapshot = governor.snapshot();
    assert_eq!(snapshot.error_count, 0);
    assert_eq!(snapshot.error_rate, 0.0);
    assert_eq!(snapshot.render_error_count, 1);
    assert_eq!(snapshot.render_retry_count, 1);
    assert_eq!(snapshot.fallback_triggers[0].trigger, FallbackTrigger::RenderError);
}

#[test]
fn test_report_json_shape() {
    let (governor, _clock) = governor(GovernorConfig::default());
    governor.record_web_vital("largest-contentful-paint", 1_800.0);

    let json: Value = serde_json::to_value(governor.get_performance_report()).unwrap();

    assert_eq!(json["performanceScore"], 100);
    assert!(json["generatedAt"].is_string());
    assert_eq!(json["config"]["treeBuildTimeThreshold"], 100.0);
    assert_eq!(json["config"]["autoFallbackThresholds"]["consecutiveSlowBuilds"], 3);
    assert_eq!(json["metrics"]["webVitals"]["largest-contentful-paint"], 1_800.0);
    assert!(json["metrics"]["treeBuildTimes"].as_array().unwrap().is_empty());
    assert_eq!(json["regressionTests"][0]["name"], "build_time");
    assert_eq!(json["regressionTests"][0]["impact"], "low");
}

#[test]
fn test_event_wire_format() {
    let (governor, _clock) = governor(GovernorConfig::default());
    let fallback = governor.trigger_auto_fallback(
        FallbackTrigger::ErrorRate,
        serde_json::json!({ "errorRate": 0.5 }),
    );

    let json = serde_json::to_value(GovernorEvent::AutoFallback(fallback)).unwrap();

    assert_eq!(json["type"], "autoFallback");
    assert_eq!(json["payload"]["trigger"], "error_rate");
    assert_eq!(json["payload"]["data"]["errorRate"], 0.5);
    assert_eq!(json["payload"]["performanceScoreAtTrigger"], 100);
}
