use std::sync::atomic::{AtomicU8, Ordering};

/// Freshness flag for a single [`ParameterValue`](crate::ParameterValue).
///
/// The only sanctioned transition after a value is stored is
/// `Acquired -> Expired`, applied lazily on read (see
/// [`ParameterValue::refresh_expiry`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AcquisitionStatus {
    /// A fresh reading, within its `expire_millis` window (or never expiring).
    Acquired = 0,
    /// An `Acquired` reading whose `expire_millis` window has elapsed.
    Expired = 1,
    /// The producer flagged this reading as invalid.
    Invalid = 2,
    /// No reading was available at generation time (gap in telemetry).
    NotReceived = 3,
}

impl AcquisitionStatus {
    fn decode(byte: u8) -> Self {
        match byte {
            0 => Self::Acquired,
            1 => Self::Expired,
            2 => Self::Invalid,
            _ => Self::NotReceived,
        }
    }
}

/// One reading of one parameter, as delivered by the producer.
///
/// `id`, `value`, `generation_time`, `acquisition_time`, and `expire_millis`
/// are fixed at construction. `acquisition_status` is the one field the
/// cache may mutate after storage, and only in the `Acquired -> Expired`
/// direction.
#[derive(Debug)]
pub struct ParameterValue<K, V> {
    /// Identity of the parameter this reading belongs to.
    pub id: K,
    /// Raw or engineering value payload; opaque to the cache.
    pub value: V,
    /// Producer-side timestamp, milliseconds since a fixed epoch.
    pub generation_time: i64,
    /// Ground-system receipt timestamp, milliseconds since a fixed epoch.
    pub acquisition_time: i64,
    /// Time-to-live for an `Acquired` value relative to `acquisition_time`.
    /// `None` means the value never expires.
    pub expire_millis: Option<u64>,
    status: AtomicU8,
}

impl<K, V> ParameterValue<K, V> {
    /// Builds a new reading with the given initial status.
    pub fn new(
        id: K,
        value: V,
        status: AcquisitionStatus,
        generation_time: i64,
        acquisition_time: i64,
        expire_millis: Option<u64>,
    ) -> Self {
        Self {
            id,
            value,
            generation_time,
            acquisition_time,
            expire_millis,
            status: AtomicU8::new(status as u8),
        }
    }

    /// Current freshness flag.
    #[inline]
    pub fn status(&self) -> AcquisitionStatus {
        AcquisitionStatus::decode(self.status.load(Ordering::Acquire))
    }

    /// Applies the `Acquired -> Expired` transition if `expire_millis` has
    /// elapsed as of `now_millis`. Idempotent: calling this repeatedly, or
    /// concurrently from multiple readers, only ever moves the status
    /// forward, never back. Returns the status after the check.
    pub fn refresh_expiry(&self, now_millis: i64) -> AcquisitionStatus {
        if let Some(expire_ms) = self.expire_millis {
            if expire_ms > 0 && self.acquisition_time.saturating_add(expire_ms as i64) < now_millis
            {
                // Only moves Acquired -> Expired; a failed CAS means another
                // reader (or an already-Invalid/NotReceived value) got there
                // first or there was nothing to do, which is fine either way.
                let _ = self.status.compare_exchange(
                    AcquisitionStatus::Acquired as u8,
                    AcquisitionStatus::Expired as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
            }
        }
        self.status()
    }
}

impl<K: Clone, V: Clone> Clone for ParameterValue<K, V> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            value: self.value.clone(),
            generation_time: self.generation_time,
            acquisition_time: self.acquisition_time,
            expire_millis: self.expire_millis,
            status: AtomicU8::new(self.status.load(Ordering::Acquire)),
        }
    }
}
