//! Governor
//!
//! Admission, analysis, degradation and reporting around the hierarchical
//! view build. `monitor` wires the pure pieces together behind
//! `TreeBuildGovernor`.

pub mod admission;
pub mod analyzer;
pub mod events;
pub mod monitor;
pub mod render;
pub mod reporting;
pub mod scoring;
pub mod state;

pub use admission::AdmissionDecision;
pub use analyzer::PerformanceAnalysis;
pub use events::{EventBus, Listener, ListenerId};
pub use monitor::{GovernorBuilder, TreeBuildGovernor};
pub use render::{RenderErrorContract, RenderErrorReporter};
pub use state::{DegradeState, GovernorState};

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
