//! Pacing against Shopify's query cost budget.

use std::time::Duration;

use crate::shopify::Quota;

/// Quota below which the governor pauses.
pub const DEFAULT_THRESHOLD: u32 = 50;

/// How long the governor pauses.
pub const DEFAULT_PAUSE: Duration = Duration::from_millis(1000);

/// Decides whether to wait before the next upstream call.
///
/// A known quota below the threshold triggers one fixed pause. An unknown
/// quota never does.
#[derive(Debug, Clone, Copy)]
pub struct RateGovernor {
    threshold: u32,
    pause: Duration,
}

impl Default for RateGovernor {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, DEFAULT_PAUSE)
    }
}

impl RateGovernor {
    /// Create a governor with a custom threshold and pause.
    #[must_use]
    pub const fn new(threshold: u32, pause: Duration) -> Self {
        Self { threshold, pause }
    }

    /// Whether `quota` is low enough to pause.
    #[must_use]
    pub fn should_pause(&self, quota: Option<Quota>) -> bool {
        quota.is_some_and(|q| q.available() < self.threshold)
    }

    /// Pause if `quota` is below the threshold. Returns whether it paused.
    pub async fn throttle(&self, quota: Option<Quota>) -> bool {
        if !self.should_pause(quota) {
            return false;
        }

        tracing::debug!(
            quota = ?quota.map(Quota::available),
            pause_ms = u64::try_from(self.pause.as_millis()).unwrap_or(u64::MAX),
            "quota low, pausing"
        );
        tokio::time::sleep(self.pause).await;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn test_should_pause_boundaries() {
        let governor = RateGovernor::default();

        assert!(governor.should_pause(Some(Quota::new(0))));
        assert!(governor.should_pause(Some(Quota::new(49))));
        assert!(!governor.should_pause(Some(Quota::new(50))));
        assert!(!governor.should_pause(Some(Quota::new(1000))));
        assert!(!governor.should_pause(None));
    }

    #[tokio::test(start_paused = true)]
    async fn test_low_quota_pauses_fixed_delay() {
        let governor = RateGovernor::default();
        let start = Instant::now();

        assert!(governor.throttle(Some(Quota::new(10))).await);
        let elapsed = start.elapsed();
        assert!(elapsed >= DEFAULT_PAUSE);
        assert!(elapsed < DEFAULT_PAUSE + Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sufficient_or_unknown_quota_returns_immediately() {
        let governor = RateGovernor::default();
        let start = Instant::now();

        assert!(!governor.throttle(Some(Quota::new(50))).await);
        assert!(!governor.throttle(None).await);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_threshold_and_pause() {
        let governor = RateGovernor::new(5, Duration::from_millis(20));
        let start = Instant::now();

        assert!(!governor.throttle(Some(Quota::new(10))).await);
        assert!(governor.throttle(Some(Quota::new(4))).await);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(20));
        assert!(elapsed < Duration::from_millis(30));
    }
}
