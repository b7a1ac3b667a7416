//! Heap Usage Readers
//!
//! Capability-checked access to heap telemetry. Hosts without a usable reader
//! get `NoopMemoryReader`, which makes the periodic sampler inert and reports
//! a zero memory delta for every build.

/// Reads the current heap usage of the host process.
pub trait MemoryReader: Send + Sync + std::fmt::Debug {
    /// Whether this host exposes heap telemetry at all.
    fn is_supported(&self) -> bool;

    /// Current heap usage in bytes, `None` when unavailable.
    fn used_heap_bytes(&self) -> Option<u64>;
}

/// Reader for hosts with no heap telemetry.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMemoryReader;

impl MemoryReader for NoopMemoryReader {
    fn is_supported(&self) -> bool {
        false
    }

    fn used_heap_bytes(&self) -> Option<u64> {
        None
    }
}

/// Resident set size read from `/proc/self/status` (Linux only).
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcStatusMemoryReader;

impl ProcStatusMemoryReader {
    #[cfg(target_os = "linux")]
    fn read_rss_bytes() -> Option<u64> {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        parse_vm_rss(&status)
    }

    #[cfg(not(target_os = "linux"))]
    fn read_rss_bytes() -> Option<u64> {
        None
    }
}

impl MemoryReader for ProcStatusMemoryReader {
    fn is_supported(&self) -> bool {
        Self::read_rss_bytes().is_some()
    }

    fn used_heap_bytes(&self) -> Option<u64> {
        Self::read_rss_bytes()
    }
}

/// Extract `VmRSS` (reported in KiB) from a `/proc/<pid>/status` document.
pub(crate) fn parse_vm_rss(status: &str) -> Option<u64> {
    status.lines().find_map(|line| {
        let rest = line.strip_prefix("VmRSS:")?;
        let kib = rest.split_whitespace().next()?.parse::<u64>().ok()?;
        Some(kib.saturating_mul(1024))
    })
}

/// Reader backed by a closure; useful for embedding hosts and tests.
pub struct FnMemoryReader {
    read_fn: Box<dyn Fn() -> Option<u64> + Send + Sync>,
}

impl FnMemoryReader {
    pub fn new(read_fn: impl Fn() -> Option<u64> + Send + Sync + 'static) -> Self {
        Self {
            read_fn: Box::new(read_fn),
        }
    }
}

impl std::fmt::Debug for FnMemoryReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMemoryReader").finish_non_exhaustive()
    }
}

impl MemoryReader for FnMemoryReader {
    fn is_supported(&self) -> bool {
        true
    }

    fn used_heap_bytes(&self) -> Option<u64> {
        (self.read_fn)()
    }
}
