use std::sync::atomic::{AtomicU64, Ordering};

/// Internal atomic counters backing [`CacheMetricsSnapshot`].
///
/// Mirrors the teacher crate's `Metrics`/`MetricsSnapshot` split: cheap
/// `Relaxed` atomics updated on the hot path, collapsed into a plain
/// `Copy` struct only when a caller asks for a snapshot.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    deliveries_accepted: AtomicU64,
    out_of_order_drops: AtomicU64,
    corrupt_drops: AtomicU64,
    grows: AtomicU64,
    expirations_detected: AtomicU64,
}

impl CacheMetrics {
    #[inline]
    pub(crate) fn record_accept(&self) {
        self.deliveries_accepted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_out_of_order_drop(&self) {
        self.out_of_order_drops.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_corrupt_drop(&self) {
        self.corrupt_drops.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_grow(&self) {
        self.grows.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_expiration(&self) {
        self.expirations_detected.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            deliveries_accepted: self.deliveries_accepted.load(Ordering::Relaxed),
            out_of_order_drops: self.out_of_order_drops.load(Ordering::Relaxed),
            corrupt_drops: self.corrupt_drops.load(Ordering::Relaxed),
            grows: self.grows.load(Ordering::Relaxed),
            expirations_detected: self.expirations_detected.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of [`ParameterCache`](crate::ParameterCache)
/// activity. Purely observability, returned by `ParameterCache::metrics()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheMetricsSnapshot {
    /// Per-parameter `CacheEntry::add` calls that stored a delivery.
    pub deliveries_accepted: u64,
    /// Writes dropped because their generation time was older than the
    /// newest retained value.
    pub out_of_order_drops: u64,
    /// Writes dropped because a delivery claimed to carry a parameter but
    /// could not report `first_inserted` for it (a defensive no-op).
    pub corrupt_drops: u64,
    /// Ring-growth events across all parameters.
    pub grows: u64,
    /// `Acquired -> Expired` transitions observed on read.
    pub expirations_detected: u64,
}
