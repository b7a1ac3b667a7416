// Tree Governor - simulation entry point
//
// Drives a governor through a scripted session of fast, slow and failing
// tree builds against a synthetic heap, then prints the performance report.
//
// Usage: tree-governor-sim [config.json]
// Log level: RUST_LOG (default "info")

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tree_governor::services::telemetry::{ChannelPaintSource, FnMemoryReader, PaintEntry, PaintEntryKind};
use tree_governor::{GovernorConfig, GovernorEvent, RenderErrorContract, TreeBuildGovernor};

/// Build pattern for one scripted attempt.
#[derive(Debug, Clone, Copy)]
enum Step {
    Fast,
    Slow,
    Fail,
}

const SCRIPT: &[Step] = &[
    Step::Fast,
    Step::Fast,
    Step::Slow,
    Step::Fast,
    Step::Fail,
    Step::Fast,
    Step::Slow,
    Step::Slow,
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => GovernorConfig::from_file(&path)
            .with_context(|| format!("failed to load governor config from {}", path))?,
        None => GovernorConfig {
            degradation_cooldown_ms: 200,
            memory_sample_interval_ms: 50,
            ..Default::default()
        },
    };

    let heap = Arc::new(AtomicU64::new(40 * 1024 * 1024));
    let reader_heap = heap.clone();
    let (paint_source, paint_tx) = ChannelPaintSource::new();

    let governor = TreeBuildGovernor::builder(config.clone())
        .memory_reader(Arc::new(FnMemoryReader::new(move || Some(reader_heap.load(Ordering::SeqCst)))))
        .paint_source(Arc::new(paint_source))
        .try_build()?;

    governor.add_listener(|event: &GovernorEvent| {
        info!(event = event.event_type(), "Governor event");
    });

    governor.monitor_bundle_size(620 * 1024);
    paint_tx
        .send(PaintEntry::new(PaintEntryKind::Paint, "first-contentful-paint", 180.0))
        .context("paint subscriber went away")?;

    let candidates: Vec<u32> = (0..250).collect();
    let candidate_count = candidates.len();
    for (attempt, step) in SCRIPT.iter().enumerate() {
        let heap = heap.clone();
        let outcome = governor
            .run_governed(&candidates, || async move {
                match step {
                    Step::Fast => tokio::time::sleep(Duration::from_millis(20)).await,
                    Step::Slow => tokio::time::sleep(Duration::from_millis(180)).await,
                    Step::Fail => return Err(format!("attempt {} lost its parent node", attempt)),
                }
                heap.fetch_add(2 * 1024 * 1024, Ordering::SeqCst);
                Ok(candidate_count)
            })
            .await;

        info!(
            attempt,
            step = ?step,
            mode = %outcome.render_mode(),
            error = ?outcome.error_kind(),
            "Attempt finished"
        );
        paint_tx
            .send(PaintEntry::new(PaintEntryKind::Measure, "tree-render", 12.0))
            .context("paint subscriber went away")?;
        tokio::time::sleep(Duration::from_millis(60)).await;
    }

    let reporter = governor.render_reporter();
    reporter.on_error("hierarchical view threw during render");
    reporter.on_retry(1);

    let report = governor.get_performance_report();
    println!("{}", serde_json::to_string_pretty(&report)?);

    governor.destroy();
    Ok(())
}
