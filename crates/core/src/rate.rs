use std::time::SystemTime;

#[derive(Debug, Clone, Copy)]
struct RateState {
    bytes: u64,
    at: SystemTime,
}

/// Turns a monotonically increasing byte counter into bytes per second.
///
/// The first update, and any update where the counter went backwards, only
/// records a baseline and reports 0.
#[derive(Debug, Default)]
pub struct RateCounter {
    last: Option<RateState>,
}

impl RateCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, cumulative: u64, at: SystemTime) -> f64 {
        let Some(last) = self.last else {
            self.last = Some(RateState { bytes: cumulative, at });
            return 0.0;
        };

        if cumulative < last.bytes {
            self.last = Some(RateState { bytes: cumulative, at });
            return 0.0;
        }

        // A clock that did not move (or went back) keeps the old baseline.
        let elapsed = match at.duration_since(last.at) {
            Ok(elapsed) if !elapsed.is_zero() => elapsed.as_secs_f64(),
            _ => return 0.0,
        };

        self.last = Some(RateState { bytes: cumulative, at });
        (cumulative - last.bytes) as f64 / elapsed
    }

    /// Forget the baseline; the next update starts over
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs)
    }

    #[test]
    fn test_first_update_is_zero() {
        for value in [0, 1, 1000, u64::MAX] {
            let mut counter = RateCounter::new();
            assert_eq!(counter.update(value, at(0)), 0.0);
        }
    }

    #[test]
    fn test_rate_between_samples() {
        let mut counter = RateCounter::new();
        assert_eq!(counter.update(1000, at(0)), 0.0);
        assert_eq!(counter.update(3000, at(2)), 1000.0);
        assert_eq!(counter.update(3000, at(4)), 0.0);
    }

    #[test]
    fn test_counter_reset_rebaselines() {
        let mut counter = RateCounter::new();
        counter.update(5000, at(0));
        assert_eq!(counter.update(100, at(2)), 0.0);
        // measured from the new baseline
        assert_eq!(counter.update(300, at(4)), 100.0);
    }

    #[test]
    fn test_zero_elapsed_time() {
        let mut counter = RateCounter::new();
        counter.update(1000, at(5));
        assert_eq!(counter.update(9000, at(5)), 0.0);
        assert_eq!(counter.update(9000, at(3)), 0.0);
        // baseline untouched by the degenerate updates
        assert_eq!(counter.update(3000, at(7)), 1000.0);
    }

    #[test]
    fn test_reset_forgets_baseline() {
        let mut counter = RateCounter::new();
        counter.update(1000, at(0));
        counter.reset();
        assert_eq!(counter.update(5000, at(1)), 0.0);
    }
}
