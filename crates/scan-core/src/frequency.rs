//! Lines-per-second estimate over fixed wall-clock windows.

use std::time::{Duration, Instant};

/// Minimum window length before a rate is reported.
pub const FREQUENCY_WINDOW: Duration = Duration::from_millis(1000);

/// Sliding-window rate counter.
///
/// The first tick after a reset only records a baseline. Each later tick
/// that lands at least one window after the baseline reports the rounded
/// rate and starts a new window.
#[derive(Debug, Clone)]
pub struct FrequencyEstimator {
    window: Duration,
    window_start: Option<(Instant, u64)>,
}

impl FrequencyEstimator {
    /// Estimator with the standard one-second window.
    #[must_use]
    pub fn new() -> Self {
        Self::with_window(FREQUENCY_WINDOW)
    }

    /// Estimator with a custom window.
    #[must_use]
    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            window_start: None,
        }
    }

    /// Feed the current line count. Returns a rate at most once per window.
    pub fn tick(&mut self, line_count: u64, now: Instant) -> Option<u32> {
        let Some((start, start_count)) = self.window_start else {
            self.window_start = Some((now, line_count));
            return None;
        };

        let elapsed = now.saturating_duration_since(start);
        if elapsed < self.window {
            return None;
        }

        let lines = line_count.saturating_sub(start_count) as f64;
        let rate = (lines / elapsed.as_secs_f64()).round();
        self.window_start = Some((now, line_count));
        Some(rate.min(f64::from(u32::MAX)) as u32)
    }

    /// Forget the baseline. The next tick starts a fresh window.
    pub fn reset(&mut self) {
        self.window_start = None;
    }
}

impl Default for FrequencyEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_first_tick_is_baseline() {
        let mut est = FrequencyEstimator::new();
        let t0 = Instant::now();
        assert_eq!(est.tick(0, t0), None);
        assert_eq!(est.tick(50, t0 + ms(999)), None);
    }

    #[test]
    fn test_hundred_rows_over_one_second() {
        let mut est = FrequencyEstimator::new();
        let t0 = Instant::now();
        let mut reported = None;
        est.tick(0, t0);
        for i in 1..=100u64 {
            if let Some(rate) = est.tick(i, t0 + ms(i * 10)) {
                reported = Some(rate);
            }
        }
        assert_eq!(reported, Some(100));
    }

    #[test]
    fn test_window_resets_after_report() {
        let mut est = FrequencyEstimator::new();
        let t0 = Instant::now();
        est.tick(0, t0);
        assert_eq!(est.tick(500, t0 + ms(1000)), Some(500));
        assert_eq!(est.tick(600, t0 + ms(1500)), None);
        assert_eq!(est.tick(750, t0 + ms(2000)), Some(250));
    }

    #[test]
    fn test_rate_is_rounded() {
        let mut est = FrequencyEstimator::new();
        let t0 = Instant::now();
        est.tick(0, t0);
        // 7 lines over 1.5 s = 4.67/s
        assert_eq!(est.tick(7, t0 + ms(1500)), Some(5));
    }

    #[test]
    fn test_reset_starts_new_baseline() {
        let mut est = FrequencyEstimator::new();
        let t0 = Instant::now();
        est.tick(0, t0);
        est.reset();
        assert_eq!(est.tick(10, t0 + ms(5000)), None);
        assert_eq!(est.tick(30, t0 + ms(6000)), Some(20));
    }
}
