//! Time-windowed suppression of repeated detections in a video stream.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::trace;

/// Default window before a barcode may be reported again
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Remembers when each payload was last observed.
///
/// The window slides: every observation refreshes the timestamp, so a code
/// held continuously in front of the camera stays suppressed until it has
/// been absent for a full timeout.
#[derive(Debug, Clone)]
pub struct DuplicateFilter {
    timeout: Duration,
    last_seen: HashMap<String, Instant>,
}

impl DuplicateFilter {
    /// Filter with the given window
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_seen: HashMap::new(),
        }
    }

    /// Filter with a window in seconds; negative or non-finite values become zero
    pub fn from_secs_f64(seconds: f64) -> Self {
        let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        Self::new(Duration::from_secs_f64(seconds))
    }

    /// Suppression window
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of remembered payloads
    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    /// True when nothing is remembered
    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }

    /// Observe `code` now; true when it was already seen within the window
    pub fn is_duplicate(&mut self, code: &str) -> bool {
        self.is_duplicate_at(code, Instant::now())
    }

    /// Observe `code` at `now`
    pub fn is_duplicate_at(&mut self, code: &str, now: Instant) -> bool {
        let duplicate = match self.last_seen.get_mut(code) {
            Some(seen) => {
                let recent = now.saturating_duration_since(*seen) < self.timeout;
                *seen = now;
                recent
            }
            None => {
                self.last_seen.insert(code.to_string(), now);
                false
            }
        };
        trace!(code, duplicate, "duplicate filter");
        duplicate
    }

    /// Forget everything
    pub fn reset(&mut self) {
        self.last_seen.clear();
    }

    /// Evict entries older than the window
    pub fn cleanup(&mut self) {
        self.cleanup_at(Instant::now());
    }

    /// Evict entries older than the window, measured from `now`
    pub fn cleanup_at(&mut self, now: Instant) {
        let timeout = self.timeout;
        self.last_seen
            .retain(|_, seen| now.saturating_duration_since(*seen) < timeout);
    }
}

impl Default for DuplicateFilter {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_call_is_duplicate() {
        let mut filter = DuplicateFilter::default();
        assert!(!filter.is_duplicate("12345"));
        assert!(filter.is_duplicate("12345"));
        assert!(!filter.is_duplicate("67890"));
    }

    #[test]
    fn test_reset_forgets() {
        let mut filter = DuplicateFilter::default();
        assert!(!filter.is_duplicate("12345"));
        filter.reset();
        assert!(filter.is_empty());
        assert!(!filter.is_duplicate("12345"));
    }

    #[test]
    fn test_window_slides_on_every_observation() {
        let mut filter = DuplicateFilter::new(Duration::from_secs(3));
        let t0 = Instant::now();
        assert!(!filter.is_duplicate_at("A", t0));
        assert!(filter.is_duplicate_at("A", t0 + Duration::from_secs(2)));
        // 4s after the first sighting but only 2s after the refresh
        assert!(filter.is_duplicate_at("A", t0 + Duration::from_secs(4)));
        // Absent for a full window
        assert!(!filter.is_duplicate_at("A", t0 + Duration::from_secs(8)));
    }

    #[test]
    fn test_cleanup_evicts_stale_entries() {
        let mut filter = DuplicateFilter::new(Duration::from_secs(3));
        let t0 = Instant::now();
        filter.is_duplicate_at("old", t0);
        filter.is_duplicate_at("new", t0 + Duration::from_secs(2));
        filter.cleanup_at(t0 + Duration::from_secs(4));
        assert_eq!(filter.len(), 1);
        // Eviction has no effect on classification of live entries
        assert!(filter.is_duplicate_at("new", t0 + Duration::from_secs(4)));
        assert!(!filter.is_duplicate_at("old", t0 + Duration::from_secs(4)));
    }

    #[test]
    fn test_zero_timeout_never_suppresses() {
        let mut filter = DuplicateFilter::from_secs_f64(-1.0);
        assert_eq!(filter.timeout(), Duration::ZERO);
        assert!(!filter.is_duplicate("A"));
        assert!(!filter.is_duplicate("A"));
    }
}
