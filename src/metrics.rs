// Session metrics module
//
// Lightweight counters for what the user did during a session, logged at shutdown

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Session metrics
///
/// Uses atomic operations so page controllers can record from any task without locks.
#[derive(Debug)]
pub struct Metrics {
    /// Page navigations that completed
    pub navigations: AtomicU64,

    /// Scans dispatched to the backend
    pub scans_started: AtomicU64,

    /// Scans that ended in a logical or transport failure
    pub scans_failed: AtomicU64,

    /// Quick-find searches dispatched to the backend
    pub searches: AtomicU64,

    /// Delete requests that succeeded
    pub cleans_completed: AtomicU64,

    /// Delete requests that failed
    pub cleans_failed: AtomicU64,

    /// Directories removed by successful delete requests
    pub directories_removed: AtomicU64,

    /// Exact bytes of the directories removed
    pub bytes_reclaimed: AtomicU64,

    /// Reveal-in-folder requests that failed
    pub reveal_failures: AtomicU64,

    /// Session start time
    start_time: Instant,
}

impl Metrics {
    /// Create a new Metrics instance
    pub fn new() -> Self {
        Self {
            navigations: AtomicU64::new(0),
            scans_started: AtomicU64::new(0),
            scans_failed: AtomicU64::new(0),
            searches: AtomicU64::new(0),
            cleans_completed: AtomicU64::new(0),
            cleans_failed: AtomicU64::new(0),
            directories_removed: AtomicU64::new(0),
            bytes_reclaimed: AtomicU64::new(0),
            reveal_failures: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_navigation(&self) {
        self.navigations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scan_started(&self) {
        self.scans_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scan_failed(&self) {
        self.scans_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_search(&self) {
        self.searches.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful delete request of `directories` rows totalling `bytes`
    pub fn record_clean(&self, directories: usize, bytes: u64) {
        self.cleans_completed.fetch_add(1, Ordering::Relaxed);
        self.directories_removed
            .fetch_add(directories as u64, Ordering::Relaxed);
        self.bytes_reclaimed.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_clean_failed(&self) {
        self.cleans_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reveal_failed(&self) {
        self.reveal_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Session Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Navigations: {}, searches: {}",
            self.navigations.load(Ordering::Relaxed),
            self.searches.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Scans: {} started, {} failed",
            self.scans_started.load(Ordering::Relaxed),
            self.scans_failed.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Cleans: {} completed, {} failed, {} directories removed, {} reclaimed",
            self.cleans_completed.load(Ordering::Relaxed),
            self.cleans_failed.load(Ordering::Relaxed),
            self.directories_removed.load(Ordering::Relaxed),
            crate::services::format_bytes(self.bytes_reclaimed.load(Ordering::Relaxed))
        );
        tracing::info!(
            "Reveal failures: {}",
            self.reveal_failures.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert_eq!(metrics.scans_started.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.bytes_reclaimed.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_scans() {
        let metrics = Metrics::new();

        metrics.record_scan_started();
        metrics.record_scan_started();
        metrics.record_scan_failed();

        assert_eq!(metrics.scans_started.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.scans_failed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_record_clean_accumulates() {
        let metrics = Metrics::new();

        metrics.record_clean(2, 1024);
        metrics.record_clean(1, 512);
        metrics.record_clean_failed();

        assert_eq!(metrics.cleans_completed.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.cleans_failed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.directories_removed.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.bytes_reclaimed.load(Ordering::Relaxed), 1536);
    }

    #[test]
    fn test_uptime() {
        let metrics = Metrics::new();
        thread::sleep(Duration::from_millis(10));
        assert!(metrics.uptime().as_millis() >= 10);
    }
}
