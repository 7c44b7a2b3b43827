//! Virtual Clock
//!
//! Maps a test's relative time axis (seconds since test start) onto wall
//! clock time and back. Sleeping uses a monotonic anchor captured together
//! with the wall-clock base so that system clock adjustments cannot make an
//! action fire early.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
pub struct VirtualClock {
    base_time: DateTime<Utc>,
    base_instant: Instant,
}

impl VirtualClock {
    /// Create a clock whose relative zero is now
    pub fn new() -> Self {
        // Wall time first: the monotonic anchor must not precede it.
        let base_time = Utc::now();
        let base_instant = Instant::now();
        Self {
            base_time,
            base_instant,
        }
    }

    pub fn base_time(&self) -> DateTime<Utc> {
        self.base_time
    }

    /// Absolute time for the relative time `rel`
    pub fn expand(&self, rel: f64) -> DateTime<Utc> {
        let nanos = (rel * 1e9).round() as i64;
        self.base_time + TimeDelta::nanoseconds(nanos)
    }

    /// Relative time for the absolute time `at`
    pub fn relativize(&self, at: DateTime<Utc>) -> f64 {
        let delta = at - self.base_time;
        match delta.num_nanoseconds() {
            Some(nanos) => nanos as f64 / 1e9,
            None => delta.num_milliseconds() as f64 / 1e3,
        }
    }

    /// Current relative time
    pub fn now(&self) -> f64 {
        self.relativize(Utc::now())
    }

    /// Monotonic instant at which relative time `rel` arrives, `None` when
    /// `rel` cannot be represented on either time axis
    pub fn deadline(&self, rel: f64) -> Option<Instant> {
        if !rel.is_finite() || (rel * 1e9).abs() >= i64::MAX as f64 {
            return None;
        }
        let offset = Duration::try_from_secs_f64(rel.max(0.0)).ok()?;
        self.base_instant.checked_add(offset)
    }

    /// Suspend until relative time `rel` has arrived. Times already in the
    /// past complete immediately; unrepresentable times never complete.
    pub async fn sleep_until(&self, rel: f64) {
        match self.deadline(rel) {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => {
                tracing::warn!("⚠️ Relative time {} is out of range, sleeping indefinitely", rel);
                tokio::time::sleep(Duration::MAX).await;
            }
        }
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_relativize_roundtrip() {
        let clock = VirtualClock::new();
        for rel in [0.0, 0.001, 1.5, 2.25, 10.0, 3600.125, -4.5] {
            let back = clock.relativize(clock.expand(rel));
            assert!((back - rel).abs() < 1e-6, "{rel} came back as {back}");
        }
    }

    #[test]
    fn test_expand_offsets_base() {
        let clock = VirtualClock::new();
        assert_eq!(clock.expand(0.0), clock.base_time());
        assert_eq!(clock.expand(2.5) - clock.base_time(), TimeDelta::milliseconds(2500));
    }

    #[tokio::test]
    async fn test_sleep_until_never_wakes_early() {
        let clock = VirtualClock::new();
        clock.sleep_until(0.05).await;
        assert!(Utc::now() >= clock.expand(0.05));
        assert!(clock.now() >= 0.05);
    }

    #[test]
    fn test_deadline_rejects_unrepresentable_times() {
        let clock = VirtualClock::new();
        assert!(clock.deadline(1.0).is_some());
        assert!(clock.deadline(-2.0).is_some());
        assert!(clock.deadline(3600.0 * 24.0 * 365.0).is_some());

        for rel in [1e20, 1e10, f64::MAX, f64::INFINITY, f64::NAN] {
            assert!(clock.deadline(rel).is_none(), "{rel} was accepted");
        }
    }

    #[tokio::test]
    async fn test_sleep_until_out_of_range_does_not_complete() {
        let clock = VirtualClock::new();
        let slept = tokio::time::timeout(Duration::from_millis(50), clock.sleep_until(1e20)).await;
        assert!(slept.is_err());
    }

    #[tokio::test]
    async fn test_sleep_until_past_returns_immediately() {
        let clock = VirtualClock::new();
        let started = std::time::Instant::now();
        clock.sleep_until(-3.0).await;
        clock.sleep_until(0.0).await;
        assert!(started.elapsed() < Duration::from_millis(50));
    }
}
