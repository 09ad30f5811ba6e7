//! Exponential backoff between delivery attempts.

use std::time::Duration;

/// Delay to wait after failed attempt number `attempt` (1-based).
///
/// `base_ms * 2^(attempt-1)`, capped at `max_ms`. Attempt 0 waits nothing.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);

    Duration::from_millis(delay_ms.min(max_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(calculate_backoff(0, 1000, 60_000), Duration::ZERO);
        assert_eq!(calculate_backoff(1, 1000, 60_000), Duration::from_secs(1));
        assert_eq!(calculate_backoff(2, 1000, 60_000), Duration::from_secs(2));
        assert_eq!(calculate_backoff(3, 1000, 60_000), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_is_capped() {
        assert_eq!(calculate_backoff(10, 100, 1000), Duration::from_millis(1000));
        assert_eq!(calculate_backoff(u32::MAX, u64::MAX, 5), Duration::from_millis(5));
    }
}
