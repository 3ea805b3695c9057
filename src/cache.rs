use std::hash::Hash;
use std::sync::Arc;

use dashmap::{DashMap, DashSet};

use crate::clock::Clock;
use crate::config::CacheConfig;
use crate::delivery::DeliveryList;
use crate::entry::{AddOutcome, CacheEntry};
use crate::metrics::{CacheMetrics, CacheMetricsSnapshot};
use crate::value::ParameterValue;

/// Maps parameter identity to a per-parameter [`CacheEntry`], applies the
/// cache-all vs. lazy-subscription policy, and implements the three read
/// operations.
///
/// Cheap to clone and share across threads (an `Arc` around a `DashMap` of
/// `Arc<CacheEntry<..>>`, the same "cheap handle" shape as
/// `Channel<T>`/`ChannelInner<T>` in the teacher crate) — one writer thread
/// (the telemetry pipeline, via [`update`](Self::update)) and many reader
/// threads (display fan-out, algorithms, verifiers) are expected to hold
/// their own clone.
pub struct ParameterCache<K, V> {
    entries: DashMap<K, Arc<CacheEntry<K, V>>>,
    subscribed: DashSet<K>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    metrics: CacheMetrics,
}

impl<K, V> ParameterCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates an empty cache under the given configuration and clock.
    pub fn new(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            subscribed: DashSet::new(),
            config,
            clock,
            metrics: CacheMetrics::default(),
        }
    }

    /// Producer write path: builds one `DeliveryList` from `values` and
    /// routes it into the `CacheEntry` of every distinct parameter id it
    /// contains, subject to the cache-all
    /// vs. lazy-subscription policy. A single shared `Arc<DeliveryList>`
    /// is inserted into every chosen entry so that a later
    /// [`get_values`](Self::get_values) call can detect co-delivery by
    /// pointer identity.
    pub fn update(&self, values: Vec<ParameterValue<K, V>>) {
        let delivery = DeliveryList::new(values);
        if delivery.is_empty() {
            return;
        }
        let delivery = Arc::new(delivery);

        let mut routed = std::collections::HashSet::new();
        for pv in delivery.iter() {
            if !routed.insert(pv.id.clone()) {
                continue; // already routed this pid for this delivery
            }
            self.route(&pv.id, &delivery);
        }
    }

    fn route(&self, pid: &K, delivery: &Arc<DeliveryList<K, V>>) {
        if let Some(entry) = self.entries.get(pid) {
            let outcome = entry.add(Arc::clone(delivery), pid, &self.metrics);
            self.record_add_outcome(outcome);
            return;
        }

        if self.config.cache_all || self.subscribed.contains(pid) {
            let entry = self.entries.entry(pid.clone()).or_insert_with(|| {
                Arc::new(CacheEntry::new(
                    self.config.max_num_entries,
                    self.config.max_duration_ms,
                ))
            });
            let outcome = entry.add(Arc::clone(delivery), pid, &self.metrics);
            self.record_add_outcome(outcome);
        }
        // Neither cached nor subscribed: the parameter is silently dropped.
    }

    /// Records the correct counter for a `CacheEntry::add` outcome — a
    /// dropped write must never also count as an accepted delivery.
    fn record_add_outcome(&self, outcome: AddOutcome) {
        match outcome {
            AddOutcome::Stored => self.metrics.record_accept(),
            AddOutcome::DroppedOutOfOrder => self.metrics.record_out_of_order_drop(),
            AddOutcome::DroppedCorrupt => self.metrics.record_corrupt_drop(),
        }
    }

    /// Enrolls `pid` into `subscribed` if the cache is in lazy mode.
    /// Called whenever a read misses an entry from `get_last`/`get_all`/
    /// `get_values`.
    fn maybe_enroll(&self, pid: &K) {
        if !self.config.cache_all {
            tracing::trace!("lazily subscribing to parameter on read miss");
            self.subscribed.insert(pid.clone());
        }
    }

    fn finalize(&self, pv: &ParameterValue<K, V>) -> ParameterValue<K, V> {
        use crate::value::AcquisitionStatus;
        let before = pv.status();
        let after = pv.refresh_expiry(self.clock.now_millis());
        if before == AcquisitionStatus::Acquired && after == AcquisitionStatus::Expired {
            self.metrics.record_expiration();
        }
        pv.clone()
    }

    /// Latest value for `pid`, or `None` if nothing has ever been stored
    /// for it (in lazy mode, this also enrolls `pid` for future writes).
    pub fn get_last(&self, pid: &K) -> Option<ParameterValue<K, V>> {
        let Some(entry) = self.entries.get(pid) else {
            self.maybe_enroll(pid);
            return None;
        };
        let delivery = entry.get_last()?;
        let pv = delivery.last_inserted(pid)?;
        Some(self.finalize(pv))
    }

    /// Every retained value for `pid`, newest first, or `None` if no entry
    /// exists for it yet (same missing-entry behavior as
    /// [`get_last`](Self::get_last)).
    pub fn get_all(&self, pid: &K) -> Option<Vec<ParameterValue<K, V>>> {
        let Some(entry) = self.entries.get(pid) else {
            self.maybe_enroll(pid);
            return None;
        };
        Some(entry.get_all(pid, |pv| self.finalize(pv)))
    }

    /// Batched read: one value per found parameter id, in first-found
    /// order, with co-delivered parameters grouped consecutively. Result
    /// length is at most `pids.len()`.
    pub fn get_values(&self, pids: &[K]) -> Vec<ParameterValue<K, V>> {
        let mut remaining = vec![true; pids.len()];
        let mut out = Vec::with_capacity(pids.len());

        for i in 0..pids.len() {
            if !remaining[i] {
                continue;
            }
            remaining[i] = false;

            let pid_i = &pids[i];
            let Some(entry) = self.entries.get(pid_i) else {
                self.maybe_enroll(pid_i);
                continue;
            };
            let Some(delivery) = entry.get_last() else {
                continue;
            };
            let Some(pv_i) = delivery.last_inserted(pid_i) else {
                continue;
            };
            out.push(self.finalize(pv_i));

            for j in (i + 1)..pids.len() {
                if !remaining[j] {
                    continue;
                }
                if let Some(pv_j) = delivery.last_inserted(&pids[j]) {
                    out.push(self.finalize(pv_j));
                    remaining[j] = false;
                }
            }
        }

        out
    }

    /// Number of parameter ids currently tracked (cached or, in lazy
    /// mode, merely subscribed-but-never-written).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no parameter has a `CacheEntry` yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if `pid` has a `CacheEntry` (has received at least one write).
    pub fn contains(&self, pid: &K) -> bool {
        self.entries.contains_key(pid)
    }

    /// Snapshot of cache-wide activity counters (see
    /// [`CacheMetricsSnapshot`]).
    pub fn metrics(&self) -> CacheMetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::value::AcquisitionStatus;

    fn pv(id: u32, t: i64) -> ParameterValue<u32, i64> {
        ParameterValue::new(id, t, AcquisitionStatus::Acquired, t, t, None)
    }

    fn cache(cache_all: bool) -> ParameterCache<u32, i64> {
        let config = CacheConfig::new(cache_all, 10_000, 1024).unwrap();
        ParameterCache::new(config, Arc::new(ManualClock::new(0)))
    }

    #[test]
    fn basic_last_scenario() {
        // last-value read after two writes to the same parameter
        let c = cache(true);
        c.update(vec![pv(1, 100), pv(2, 100)]);
        c.update(vec![pv(1, 200)]);

        assert_eq!(c.get_last(&1).unwrap().generation_time, 200);
        assert_eq!(c.get_last(&2).unwrap().generation_time, 100);
    }

    #[test]
    fn batch_grouping_scenario() {
        // three parameters delivered together come back grouped
        let c = cache(true);
        c.update(vec![pv(1, 500), pv(2, 500), pv(3, 500)]);

        let values = c.get_values(&[1, 2, 3]);
        assert_eq!(values.len(), 3);
        for v in &values {
            assert_eq!(v.generation_time, 500);
        }
    }

    #[test]
    fn lazy_subscription_scenario() {
        // lazy subscription: write before any read is dropped, then enrolled on miss
        let c = cache(false);
        c.update(vec![pv(1, 10)]);
        assert!(c.get_last(&1).is_none(), "not subscribed yet, write dropped");

        // The miss above enrolled pid 1.
        c.update(vec![pv(1, 20)]);
        assert_eq!(c.get_last(&1).unwrap().generation_time, 20);
    }

    #[test]
    fn expiration_scenario() {
        // expiration flips status once and never reverts
        let config = CacheConfig::default();
        let clock = Arc::new(ManualClock::new(1000));
        let c: ParameterCache<u32, i64> = ParameterCache::new(config, clock.clone());

        c.update(vec![ParameterValue::new(
            1,
            0,
            AcquisitionStatus::Acquired,
            1000,
            1000,
            Some(500),
        )]);

        clock.set(1499);
        assert_eq!(c.get_last(&1).unwrap().status(), AcquisitionStatus::Acquired);

        clock.set(1501);
        assert_eq!(c.get_last(&1).unwrap().status(), AcquisitionStatus::Expired);
        // Still expired on a later read, never reverts.
        assert_eq!(c.get_last(&1).unwrap().status(), AcquisitionStatus::Expired);
    }

    #[test]
    fn get_values_skips_missing_and_preserves_grouping() {
        let c = cache(true);
        c.update(vec![pv(1, 100), pv(2, 100)]);
        c.update(vec![pv(3, 200)]);

        let values = c.get_values(&[1, 99, 2, 3]);
        let ids: Vec<u32> = values.iter().map(|v| v.id).collect();
        // pid 99 has no entry and is skipped; 1 and 2 (co-delivered) stay adjacent.
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn non_subscribed_parameter_is_not_cached() {
        let c = cache(false);
        c.update(vec![pv(7, 1)]); // never read first, so never subscribed
        assert!(!c.contains(&7));
    }
}
