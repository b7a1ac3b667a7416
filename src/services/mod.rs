//! Services
//!
//! `telemetry` collects raw measurements; `governor` turns them into
//! admission decisions, degradations and reports.

pub mod governor;
pub mod telemetry;

pub use governor::{
    AdmissionDecision, GovernorBuilder, ListenerId, PerformanceAnalysis, RenderErrorContract,
    RenderErrorReporter, TreeBuildGovernor,
};
pub use telemetry::{
    ChannelPaintSource, Clock, FnMemoryReader, ManualClock, MemoryReader, NoopMemoryReader,
    NoopPaintSource, PaintEntry, PaintEntryKind, PaintTimingSource, ProcStatusMemoryReader,
    SystemClock,
};
