//! Tree Governor Core
//!
//! Foundational configuration, error and event types for the suggestion tree
//! build governor. This crate has no runtime dependencies (no tokio, no
//! tracing) so presentation-side crates can share the types cheaply.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `config` - Threshold configuration (`GovernorConfig`, `AutoFallbackThresholds`)
//! - `events` - Listener notifications and fallback records

pub mod config;
pub mod error;
pub mod events;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Configuration ──────────────────────────────────────────────────────
pub use config::{AutoFallbackThresholds, GovernorConfig};

// ── Events ─────────────────────────────────────────────────────────────
pub use events::{FallbackEvent, FallbackTrigger, GovernorEvent};
