//! Render Error Contract
//!
//! Hooks for the presentation layer's error boundary around the
//! hierarchical view. Errors and retries are counted; giving up on the
//! hierarchical view is recorded as a `render_error` fallback, which opens
//! the same cooldown window as any other degradation.

use serde_json::json;
use tracing::{info, warn};
use tree_governor_core::{FallbackEvent, FallbackTrigger};

use super::monitor::TreeBuildGovernor;

/// Callbacks an error boundary invokes while rendering the governed view.
pub trait RenderErrorContract {
    /// The hierarchical view threw while rendering.
    fn on_error(&self, message: &str);

    /// The boundary is re-attempting the hierarchical view.
    fn on_retry(&self, attempt: u32);

    /// The boundary gave up and switched to the flat list.
    fn on_fallback(&self, reason: &str) -> FallbackEvent;
}

/// `RenderErrorContract` backed by a governor.
#[derive(Debug, Clone)]
pub struct RenderErrorReporter {
    governor: TreeBuildGovernor,
}

impl RenderErrorReporter {
    pub fn new(governor: TreeBuildGovernor) -> Self {
        Self { governor }
    }
}

impl RenderErrorContract for RenderErrorReporter {
    fn on_error(&self, message: &str) {
        let render_error_count = self.governor.note_render_error();
        warn!(error = message, render_error_count, "Hierarchical view render failed");
    }

    fn on_retry(&self, attempt: u32) {
        let render_retry_count = self.governor.note_render_retry();
        info!(attempt, render_retry_count, "Retrying hierarchical view render");
    }

    fn on_fallback(&self, reason: &str) -> FallbackEvent {
        let render_error_count = self.governor.snapshot().render_error_count;
        self.governor.trigger_auto_fallback(
            FallbackTrigger::RenderError,
            json!({ "reason": reason, "renderErrorCount": render_error_count }),
        )
    }
}
