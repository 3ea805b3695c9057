use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::delivery::DeliveryList;
use crate::metrics::CacheMetrics;
use crate::value::ParameterValue;

// =============================================================================
// RING LAYOUT
// =============================================================================
//
// `buffer` is a power-of-two ring of `Option<Arc<DeliveryList<K, V>>>`.
// `tail` is the next slot to write; `(tail - 1) & mask` is always the
// newest stored delivery, and `tail` itself (if non-nil) is the oldest
// still retained. Growth never changes `tail`:
// `grow` leaves the physical hole exactly where the ring wraps, by copying
// `[0, tail)` to the same offsets in the bigger buffer and `[tail,
// capacity)` to `[tail + capacity, 2*capacity)`. Naively doubling into
// `[0, 2*capacity)` would put old and new deliveries out of wrap order.
//
// =============================================================================

struct Inner<K, V> {
    buffer: Vec<Option<Arc<DeliveryList<K, V>>>>,
    tail: usize,
    capacity: usize,
}

/// Outcome of a [`CacheEntry::add`] call, so a caller can tell a stored
/// write apart from a silent drop instead of assuming success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AddOutcome {
    /// The delivery was stored (possibly after growing the ring).
    Stored,
    /// Dropped: its generation time was older than the newest retained one.
    DroppedOutOfOrder,
    /// Dropped: the occupied slot or the incoming delivery couldn't report
    /// `first_inserted` for the tracked parameter.
    DroppedCorrupt,
}

impl<K, V> Inner<K, V> {
    #[inline]
    fn mask(&self) -> usize {
        self.capacity - 1
    }

    #[inline]
    fn newest_index(&self) -> usize {
        (self.tail + self.capacity - 1) & self.mask()
    }
}

/// A per-parameter bounded ring of retained deliveries.
///
/// Enforces a minimum time window and a hard entry-count bound, and
/// serializes concurrent access behind a single `RwLock` covering
/// `buffer`, `tail`, and `capacity` together — readers take the read side
/// only long enough to snapshot a pointer or walk the ring; the one writer
/// (the telemetry pipeline) takes the write side for the whole `add`.
pub(crate) struct CacheEntry<K, V> {
    inner: RwLock<Inner<K, V>>,
    /// Rounded-up-to-a-power-of-two cap on `capacity`.
    capacity_cap: usize,
    time_to_cache_ms: i64,
}

impl<K: Eq + Hash + Clone, V> CacheEntry<K, V> {
    pub(crate) fn new(max_entries: usize, time_to_cache_ms: u64) -> Self {
        let capacity_cap = max_entries.max(1).next_power_of_two();
        let initial_capacity = max_entries.min(128).max(1).next_power_of_two();
        Self {
            inner: RwLock::new(Inner {
                buffer: vec![None; initial_capacity],
                tail: 0,
                capacity: initial_capacity,
            }),
            capacity_cap,
            time_to_cache_ms: time_to_cache_ms as i64,
        }
    }

    /// Write path. `pid` identifies which parameter in `delivery` this
    /// entry tracks — a delivery may carry several parameters, each routed
    /// to its own `CacheEntry::add` call. Returns whether the delivery was
    /// actually stored or silently dropped (and why), so the caller can
    /// record the matching counter instead of assuming every call accepted
    /// a write. `metrics` is only used here to count ring growths, which
    /// are an entry-internal event rather than part of the add/drop outcome.
    pub(crate) fn add(
        &self,
        delivery: Arc<DeliveryList<K, V>>,
        pid: &K,
        metrics: &CacheMetrics,
    ) -> AddOutcome {
        let mut guard = self.inner.write();
        loop {
            let tail = guard.tail;
            let Some(occupant) = guard.buffer[tail].clone() else {
                guard.buffer[tail] = Some(delivery);
                guard.tail = (tail + 1) & guard.mask();
                return AddOutcome::Stored;
            };

            // Ring is full at this slot: decide whether to overwrite,
            // drop, or grow first.
            let (Some(old_first), Some(new_first)) =
                (occupant.first_inserted(pid), delivery.first_inserted(pid))
            else {
                // Defensive no-op: a delivery nominally about `pid` that
                // can't report it is corrupt. Never expected in practice.
                tracing::debug!(?tail, "dropping write: missing first_inserted for tracked parameter");
                return AddOutcome::DroppedCorrupt;
            };

            if let Some(old_newest) = guard.buffer[guard.newest_index()]
                .as_ref()
                .and_then(|d| d.last_inserted(pid))
            {
                if new_first.generation_time < old_newest.generation_time {
                    tracing::debug!(
                        new = new_first.generation_time,
                        newest = old_newest.generation_time,
                        "dropping out-of-order write"
                    );
                    return AddOutcome::DroppedOutOfOrder;
                }
            }

            let span = new_first.generation_time - old_first.generation_time;
            if span < self.time_to_cache_ms && guard.capacity < self.capacity_cap {
                Self::grow(&mut guard, self.capacity_cap);
                metrics.record_grow();
                // `tail`'s slot is now empty (see module comment); loop
                // back around to take the fast path above.
                continue;
            }

            // Overwrite the oldest retained delivery.
            guard.buffer[tail] = Some(delivery);
            guard.tail = (tail + 1) & guard.mask();
            return AddOutcome::Stored;
        }
    }

    /// Doubles `capacity` up to `capacity_cap`, preserving wrap order by
    /// leaving `tail` untouched and inserting the new space exactly where
    /// the ring wraps.
    fn grow(guard: &mut Inner<K, V>, capacity_cap: usize) {
        if guard.capacity >= capacity_cap {
            return;
        }
        let new_capacity = (guard.capacity * 2).min(capacity_cap);
        let mut new_buffer: Vec<Option<Arc<DeliveryList<K, V>>>> = vec![None; new_capacity];

        let tail = guard.tail;
        let capacity = guard.capacity;
        for i in 0..tail {
            new_buffer[i] = guard.buffer[i].take();
        }
        for i in tail..capacity {
            new_buffer[i + capacity] = guard.buffer[i].take();
        }

        guard.buffer = new_buffer;
        guard.capacity = new_capacity;
    }

    /// Newest retained delivery, or `None` if nothing has been written yet.
    /// Holds the read lock only long enough to clone the `Arc`.
    pub(crate) fn get_last(&self) -> Option<Arc<DeliveryList<K, V>>> {
        let guard = self.inner.read();
        guard.buffer[guard.newest_index()].clone()
    }

    /// Every retained value for `pid`, newest delivery first, with
    /// `finalize` applied to each (used by the cache façade to run the
    /// expiration check against an injected [`Clock`]).
    pub(crate) fn get_all<F>(&self, pid: &K, mut finalize: F) -> Vec<ParameterValue<K, V>>
    where
        F: FnMut(&ParameterValue<K, V>) -> ParameterValue<K, V>,
    {
        let guard = self.inner.read();
        let mut out = Vec::new();
        let mask = guard.mask();
        let mut idx = guard.tail;
        for _ in 0..guard.capacity {
            idx = (idx + guard.capacity - 1) & mask;
            let Some(delivery) = guard.buffer[idx].clone() else {
                break;
            };
            delivery.for_each(pid, |pv| out.push(finalize(pv)));
            if idx == guard.tail {
                break;
            }
        }
        out
    }

    #[cfg(test)]
    pub(crate) fn retained_count(&self) -> usize {
        let guard = self.inner.read();
        guard.buffer.iter().filter(|s| s.is_some()).count()
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.inner.read().capacity
    }
}
