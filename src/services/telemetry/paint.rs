//! Paint/Layout Timing Source
//!
//! Best-effort subscription to host paint and layout timing entries. A host
//! without the API (or one that refuses the subscription) yields an error
//! that the governor logs and otherwise ignores.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::utils::error::{GovernorError, GovernorResult};

/// Kind of timing entry delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaintEntryKind {
    /// `first-paint`, `first-contentful-paint`
    Paint,
    LargestContentfulPaint,
    LayoutShift,
    /// A user timing measure around a render pass
    Measure,
}

/// One host timing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaintEntry {
    pub kind: PaintEntryKind,
    pub name: String,
    /// Start time or duration in ms, or the shift score for layout shifts
    pub value: f64,
}

impl PaintEntry {
    pub fn new(kind: PaintEntryKind, name: impl Into<String>, value: f64) -> Self {
        Self {
            kind,
            name: name.into(),
            value,
        }
    }
}

/// Host paint/layout observation API.
pub trait PaintTimingSource: Send + Sync + std::fmt::Debug {
    /// Whether the host exposes paint timing at all.
    fn is_supported(&self) -> bool;

    /// Register for entries. May fail even when supported.
    fn subscribe(&self) -> GovernorResult<mpsc::UnboundedReceiver<PaintEntry>>;
}

/// Source for hosts without paint timing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPaintSource;

impl PaintTimingSource for NoopPaintSource {
    fn is_supported(&self) -> bool {
        false
    }

    fn subscribe(&self) -> GovernorResult<mpsc::UnboundedReceiver<PaintEntry>> {
        Err(GovernorError::telemetry("paint timing is not available on this host"))
    }
}

/// Source fed through an in-process channel by the embedding host.
#[derive(Debug)]
pub struct ChannelPaintSource {
    receiver: Mutex<Option<mpsc::UnboundedReceiver<PaintEntry>>>,
}

impl ChannelPaintSource {
    /// Create the source and the sender the host pushes entries into.
    pub fn new() -> (Self, mpsc::UnboundedSender<PaintEntry>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                receiver: Mutex::new(Some(receiver)),
            },
            sender,
        )
    }
}

impl PaintTimingSource for ChannelPaintSource {
    fn is_supported(&self) -> bool {
        true
    }

    fn subscribe(&self) -> GovernorResult<mpsc::UnboundedReceiver<PaintEntry>> {
        let mut guard = self
            .receiver
            .lock()
            .map_err(|_| GovernorError::internal("paint source lock poisoned"))?;
        guard
            .take()
            .ok_or_else(|| GovernorError::telemetry("paint source already has a subscriber"))
    }
}
