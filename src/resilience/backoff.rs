//! Linear backoff with optional jitter.

use std::time::Duration;
use rand::Rng;

/// Calculate the linear backoff delay for an attempt (`base_ms * attempt`).
pub fn linear_backoff(attempt: u32, base_ms: u64) -> Duration {
    Duration::from_millis(base_ms.saturating_mul(u64::from(attempt)))
}

/// Add uniform random jitter of up to `ratio` of the delay.
pub fn apply_jitter(delay: Duration, ratio: f64) -> Duration {
    let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    let jitter_range = (delay_ms as f64 * ratio.clamp(0.0, 1.0)) as u64;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(delay_ms.saturating_add(jitter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_backoff() {
        assert_eq!(linear_backoff(0, 2000), Duration::ZERO);
        assert_eq!(linear_backoff(1, 2000), Duration::from_millis(2000));
        assert_eq!(linear_backoff(2, 2000), Duration::from_millis(4000));
        assert_eq!(linear_backoff(3, 500), Duration::from_millis(1500));
        assert_eq!(linear_backoff(2, u64::MAX), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_jitter_bounds() {
        let base = Duration::from_millis(1000);
        for _ in 0..100 {
            let d = apply_jitter(base, 0.1);
            assert!(d >= base);
            assert!(d < Duration::from_millis(1100));
        }
    }

    #[test]
    fn test_zero_jitter_is_exact() {
        let base = Duration::from_millis(500);
        assert_eq!(apply_jitter(base, 0.0), base);
        assert_eq!(apply_jitter(Duration::ZERO, 0.5), Duration::ZERO);
    }
}
