//! Telemetry
//!
//! Injectable time and host telemetry sources plus the bounded metric store
//! they feed.

pub mod clock;
pub mod memory;
pub mod paint;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use memory::{FnMemoryReader, MemoryReader, NoopMemoryReader, ProcStatusMemoryReader};
pub use paint::{ChannelPaintSource, NoopPaintSource, PaintEntry, PaintEntryKind, PaintTimingSource};
pub use store::MetricStore;
