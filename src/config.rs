use thiserror::Error;

/// Errors returned by [`CacheConfig::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CacheConfigError {
    /// `max_num_entries` must retain at least one delivery per parameter.
    #[error("max_num_entries must be at least 1, got {0}")]
    MaxEntriesZero(usize),
}

/// Configuration for a [`ParameterCache`](crate::ParameterCache).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// If `true`, every incoming parameter is cached. If `false`, only
    /// parameters a reader has previously asked about are cached.
    pub cache_all: bool,
    /// Minimum history window retained per parameter, in milliseconds.
    pub max_duration_ms: u64,
    /// Hard upper bound on deliveries retained per parameter.
    pub max_num_entries: usize,
}

impl CacheConfig {
    /// Builds a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CacheConfigError::MaxEntriesZero`] if `max_num_entries` is 0.
    pub fn new(
        cache_all: bool,
        max_duration_ms: u64,
        max_num_entries: usize,
    ) -> Result<Self, CacheConfigError> {
        if max_num_entries < 1 {
            return Err(CacheConfigError::MaxEntriesZero(max_num_entries));
        }
        Ok(Self {
            cache_all,
            max_duration_ms,
            max_num_entries,
        })
    }
}

impl Default for CacheConfig {
    /// Cache everything, retain at least a minute of history per
    /// parameter, up to 1024 deliveries.
    fn default() -> Self {
        Self {
            cache_all: true,
            max_duration_ms: 60_000,
            max_num_entries: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_max_entries() {
        assert_eq!(
            CacheConfig::new(true, 1_000, 0),
            Err(CacheConfigError::MaxEntriesZero(0))
        );
    }

    #[test]
    fn accepts_valid_config() {
        let cfg = CacheConfig::new(false, 5_000, 64).unwrap();
        assert!(!cfg.cache_all);
        assert_eq!(cfg.max_duration_ms, 5_000);
        assert_eq!(cfg.max_num_entries, 64);
    }

    #[test]
    fn default_is_cache_all() {
        let cfg = CacheConfig::default();
        assert!(cfg.cache_all);
        assert_eq!(cfg.max_num_entries, 1024);
    }
}
