//! An in-memory, concurrent, time-bounded, delivery-preserving cache of
//! the most recent values of named telemetry parameters.
//!
//! This is the core of a mission-control parameter cache: it sits between
//! a single telemetry processing pipeline (the producer) and many
//! concurrent readers — display fan-out, algorithms, command verifiers —
//! and does three things a plain `HashMap<Id, Value>` cannot:
//!
//! - preserves *delivery grouping*, so parameters acquired together can be
//!   read back together ([`ParameterCache::get_values`]);
//! - bounds memory with a per-parameter ring buffer that grows
//!   geometrically up to a hard cap while still guaranteeing a configured
//!   minimum time window of history;
//! - supports a lazy-subscription mode where only parameters a reader has
//!   asked about are retained, so memory scales with what displays are
//!   watching rather than with the size of the full parameter catalog.
//!
//! # Example
//!
//! ```
//! use parameter_cache::{CacheConfig, ParameterCache, ParameterValue, AcquisitionStatus, SystemClock};
//! use std::sync::Arc;
//!
//! let cache: ParameterCache<u32, f64> = ParameterCache::new(
//!     CacheConfig::default(),
//!     Arc::new(SystemClock),
//! );
//!
//! let now = 0; // a real producer would stamp with wall-clock millis
//! cache.update(vec![
//!     ParameterValue::new(1, 36.6, AcquisitionStatus::Acquired, now, now, None),
//!     ParameterValue::new(2, 101.0, AcquisitionStatus::Acquired, now, now, None),
//! ]);
//!
//! let temperature = cache.get_last(&1).expect("parameter 1 was just written");
//! assert_eq!(temperature.value, 36.6);
//!
//! // Co-delivered parameters come back grouped, in one call.
//! let batch = cache.get_values(&[1, 2]);
//! assert_eq!(batch.len(), 2);
//! ```

mod cache;
mod clock;
mod config;
mod delivery;
mod entry;
mod metrics;
mod value;

pub use cache::ParameterCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, CacheConfigError};
pub use delivery::DeliveryList;
pub use metrics::CacheMetricsSnapshot;
pub use value::{AcquisitionStatus, ParameterValue};
