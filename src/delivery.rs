use std::collections::HashMap;
use std::hash::Hash;

use crate::value::ParameterValue;

/// One producer delivery: a group of [`ParameterValue`]s published
/// together, with fast per-parameter lookup by insertion order.
///
/// A `DeliveryList` is built once from an iterable of values and is
/// immutable from that point on — no method on it mutates its contents.
/// Multiple per-parameter cache entries hold `Arc` clones of the same
/// `DeliveryList`, which is what lets
/// [`ParameterCache::get_values`](crate::ParameterCache::get_values) detect
/// that two parameters were acquired together.
pub struct DeliveryList<K, V> {
    values: Vec<ParameterValue<K, V>>,
    index: HashMap<K, Vec<usize>>,
}

impl<K: Eq + Hash + Clone, V> DeliveryList<K, V> {
    /// Builds a delivery from its values, preserving insertion order.
    pub fn new(values: Vec<ParameterValue<K, V>>) -> Self {
        let mut index: HashMap<K, Vec<usize>> = HashMap::with_capacity(values.len());
        for (i, pv) in values.iter().enumerate() {
            index.entry(pv.id.clone()).or_default().push(i);
        }
        Self { values, index }
    }

    /// Number of values in this delivery (including repeated occurrences
    /// of the same parameter id).
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if this delivery carries no values. An empty delivery is
    /// legal but is never stored in a `CacheEntry`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The earliest value for `pid` in this delivery, or `None` if `pid`
    /// does not appear in it.
    pub fn first_inserted(&self, pid: &K) -> Option<&ParameterValue<K, V>> {
        self.index
            .get(pid)
            .and_then(|idxs| idxs.first())
            .map(|&i| &self.values[i])
    }

    /// The latest value for `pid` in this delivery, or `None` if `pid`
    /// does not appear in it.
    pub fn last_inserted(&self, pid: &K) -> Option<&ParameterValue<K, V>> {
        self.index
            .get(pid)
            .and_then(|idxs| idxs.last())
            .map(|&i| &self.values[i])
    }

    /// Visits every occurrence of `pid` in this delivery, in insertion
    /// order. A no-op if `pid` does not appear.
    pub fn for_each<F: FnMut(&ParameterValue<K, V>)>(&self, pid: &K, mut f: F) {
        if let Some(idxs) = self.index.get(pid) {
            for &i in idxs {
                f(&self.values[i]);
            }
        }
    }

    /// Iterates every value in the delivery, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ParameterValue<K, V>> {
        self.values.iter()
    }
}
