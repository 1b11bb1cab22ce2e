use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

/// Record counters shared by the collector and the sink workers
#[derive(Debug, Default)]
pub struct PipelineStats {
    received: AtomicU64,
    forwarded: AtomicU64,
    printed: AtomicU64,
    written: AtomicU64,
    rejected: AtomicU64,
    dropped: AtomicU64,
}

impl PipelineStats {
    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_printed(&self) {
        self.printed.fetch_add(1, Ordering::Relaxed);
    }

    /// Backend answered 2xx
    pub fn record_written(&self) {
        self.written.fetch_add(1, Ordering::Relaxed);
    }

    /// Backend answered, but not with 2xx
    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record type has no storage destination
    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            printed: self.printed.load(Ordering::Relaxed),
            written: self.written.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub received: u64,
    pub forwarded: u64,
    pub printed: u64,
    pub written: u64,
    pub rejected: u64,
    pub dropped: u64,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "received={} forwarded={} printed={} written={} rejected={} dropped={}",
            self.received, self.forwarded, self.printed, self.written, self.rejected, self.dropped
        )
    }
}
