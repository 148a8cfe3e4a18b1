//! Operation metrics
//!
//! Counters are plain relaxed atomics so a snapshot can be taken without the
//! table lock. Under concurrent traffic a snapshot is therefore approximate:
//! each counter is exact, but counters are not read at a single instant.

use core::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Point-in-time view of a map's operation counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MapMetrics {
    /// Accepted put calls (inserts plus overwrites)
    pub puts: u64,
    /// Puts that created a new entry
    pub inserts: u64,
    /// Puts that replaced an existing value
    pub overwrites: u64,
    /// Puts rejected because the key was too long
    pub rejected_keys: u64,
    /// Puts that failed while growing the table
    pub failed_resizes: u64,
    /// Lookups, including `contains_key`
    pub lookups: u64,
    /// Lookups that found their key
    pub hits: u64,
    /// Remove calls, whether or not the key was present
    pub removes: u64,
    /// Times the slot array was doubled
    pub resizes: u64,
    /// Slots stepped over across all probes
    pub probe_steps: u64,
    /// Longest single probe seen
    pub max_probe_length: usize,
}

impl MapMetrics {
    /// Lookups that did not find their key
    pub fn misses(&self) -> u64 {
        self.lookups.saturating_sub(self.hits)
    }

    /// Hit rate as percentage
    pub fn hit_rate(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            (self.hits as f64 / self.lookups as f64) * 100.0
        }
    }

    /// Average slots stepped over per probing operation
    pub fn avg_probe_length(&self) -> f64 {
        let probes = self.puts + self.lookups + self.removes;
        if probes == 0 {
            0.0
        } else {
            self.probe_steps as f64 / probes as f64
        }
    }
}

/// Internal atomic metrics collection
#[derive(Debug)]
pub(crate) struct AtomicMetrics {
    enabled: AtomicBool,
    puts: AtomicU64,
    inserts: AtomicU64,
    overwrites: AtomicU64,
    rejected_keys: AtomicU64,
    failed_resizes: AtomicU64,
    lookups: AtomicU64,
    hits: AtomicU64,
    removes: AtomicU64,
    resizes: AtomicU64,
    probe_steps: AtomicU64,
    max_probe_length: AtomicUsize,
}

impl Default for AtomicMetrics {
    fn default() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            puts: AtomicU64::new(0),
            inserts: AtomicU64::new(0),
            overwrites: AtomicU64::new(0),
            rejected_keys: AtomicU64::new(0),
            failed_resizes: AtomicU64::new(0),
            lookups: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            removes: AtomicU64::new(0),
            resizes: AtomicU64::new(0),
            probe_steps: AtomicU64::new(0),
            max_probe_length: AtomicUsize::new(0),
        }
    }
}

impl AtomicMetrics {
    #[inline]
    fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Record a successful put
    pub(crate) fn record_put(&self, overwrote: bool, probes: usize, resizes: usize) {
        if !self.enabled() {
            return;
        }
        self.puts.fetch_add(1, Ordering::Relaxed);
        if overwrote {
            self.overwrites.fetch_add(1, Ordering::Relaxed);
        } else {
            self.inserts.fetch_add(1, Ordering::Relaxed);
        }
        self.resizes.fetch_add(resizes as u64, Ordering::Relaxed);
        self.record_probe(probes);
    }

    /// Record a put rejected for its key length
    pub(crate) fn record_rejected_key(&self) {
        if self.enabled() {
            self.rejected_keys.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a put that could not grow the table
    pub(crate) fn record_failed_resize(&self) {
        if self.enabled() {
            self.failed_resizes.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a lookup
    pub(crate) fn record_lookup(&self, hit: bool, probes: usize) {
        if !self.enabled() {
            return;
        }
        self.lookups.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        self.record_probe(probes);
    }

    /// Record a remove
    pub(crate) fn record_remove(&self, probes: usize) {
        if !self.enabled() {
            return;
        }
        self.removes.fetch_add(1, Ordering::Relaxed);
        self.record_probe(probes);
    }

    fn record_probe(&self, probes: usize) {
        self.probe_steps.fetch_add(probes as u64, Ordering::Relaxed);

        // Update max probe length if this probe was longer
        let mut current_max = self.max_probe_length.load(Ordering::Relaxed);
        while probes > current_max {
            match self.max_probe_length.compare_exchange_weak(
                current_max,
                probes,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(x) => current_max = x,
            }
        }
    }

    /// Get current metrics snapshot
    pub(crate) fn snapshot(&self) -> MapMetrics {
        MapMetrics {
            puts: self.puts.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            overwrites: self.overwrites.load(Ordering::Relaxed),
            rejected_keys: self.rejected_keys.load(Ordering::Relaxed),
            failed_resizes: self.failed_resizes.load(Ordering::Relaxed),
            lookups: self.lookups.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            removes: self.removes.load(Ordering::Relaxed),
            resizes: self.resizes.load(Ordering::Relaxed),
            probe_steps: self.probe_steps.load(Ordering::Relaxed),
            max_probe_length: self.max_probe_length.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters
    pub(crate) fn reset(&self) {
        self.puts.store(0, Ordering::Relaxed);
        self.inserts.store(0, Ordering::Relaxed);
        self.overwrites.store(0, Ordering::Relaxed);
        self.rejected_keys.store(0, Ordering::Relaxed);
        self.failed_resizes.store(0, Ordering::Relaxed);
        self.lookups.store(0, Ordering::Relaxed);
        self.hits.store(0, Ordering::Relaxed);
        self.removes.store(0, Ordering::Relaxed);
        self.resizes.store(0, Ordering::Relaxed);
        self.probe_steps.store(0, Ordering::Relaxed);
        self.max_probe_length.store(0, Ordering::Relaxed);
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled()
    }
}

/// Trait for data structures that expose operation metrics
pub trait MetricsCollector {
    /// Get current metrics
    fn metrics(&self) -> MapMetrics;

    /// Reset all metrics
    fn reset_metrics(&self);

    /// Enable or disable metrics collection
    fn set_metrics_enabled(&self, enabled: bool);

    /// Check if metrics collection is enabled
    fn is_metrics_enabled(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_snapshot() {
        let metrics = AtomicMetrics::default();
        metrics.record_put(false, 2, 1);
        metrics.record_put(true, 0, 0);
        metrics.record_lookup(true, 1);
        metrics.record_lookup(false, 5);
        metrics.record_remove(0);
        metrics.record_rejected_key();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.puts, 2);
        assert_eq!(snapshot.inserts, 1);
        assert_eq!(snapshot.overwrites, 1);
        assert_eq!(snapshot.resizes, 1);
        assert_eq!(snapshot.lookups, 2);
        assert_eq!(snapshot.hits, 1);
        assert_eq!(snapshot.misses(), 1);
        assert_eq!(snapshot.removes, 1);
        assert_eq!(snapshot.rejected_keys, 1);
        assert_eq!(snapshot.probe_steps, 8);
        assert_eq!(snapshot.max_probe_length, 5);
        assert_eq!(snapshot.hit_rate(), 50.0);
        assert_eq!(snapshot.avg_probe_length(), 8.0 / 5.0);
    }

    #[test]
    fn test_disabled_and_reset() {
        let metrics = AtomicMetrics::default();
        metrics.record_put(false, 3, 0);
        metrics.reset();
        assert_eq!(metrics.snapshot(), MapMetrics::default());

        metrics.set_enabled(false);
        assert!(!metrics.is_enabled());
        metrics.record_lookup(true, 1);
        assert_eq!(metrics.snapshot().lookups, 0);
    }

    #[test]
    fn test_empty_rates() {
        let snapshot = MapMetrics::default();
        assert_eq!(snapshot.hit_rate(), 0.0);
        assert_eq!(snapshot.avg_probe_length(), 0.0);
    }
}
