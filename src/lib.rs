//! Tree Governor
//!
//! Adaptive performance governor for an expensive hierarchical suggestion
//! view. Every build attempt goes through `TreeBuildGovernor::run_governed`,
//! which:
//! - refuses the attempt when the candidate set is too large, a recent
//!   degradation is cooling down, or builds keep being slow
//! - times the build and measures heap growth around it
//! - degrades to the flat list when thresholds are breached, and records why
//! - keeps a composite 0-100 performance score and emits events to listeners
//!
//! Shared configuration and event types live in `tree-governor-core`.

pub mod models;
pub mod services;
pub mod utils;

pub use models::{
    AttemptMetrics, BuildErrorDescriptor, BuildErrorKind, DegradeReason, GovernedOutcome,
    MetricsSnapshot, PerformanceReport, Recommendation, RegressionTest, RenderMode,
};
pub use services::governor::{
    AdmissionDecision, GovernorBuilder, ListenerId, PerformanceAnalysis, RenderErrorContract,
    RenderErrorReporter, TreeBuildGovernor,
};
pub use tree_governor_core::{
    AutoFallbackThresholds, FallbackEvent, FallbackTrigger, GovernorConfig, GovernorEvent,
};
pub use utils::error::{GovernorError, GovernorResult};
