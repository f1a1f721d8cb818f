//! Retry backoff schedule
//!
//! Waits follow the Fibonacci sequence: 1, 1, 2, 3, 5, 8, 13, ...

use std::time::Duration;

/// Returns the number of seconds to wait after a failure on `attempt`
///
/// `attempt` is 1-based; zero is treated as the first attempt. The value
/// saturates instead of overflowing for very large attempt numbers.
///
/// # Example
///
/// ```
/// use chart_harvest::crawler::backoff_seconds;
///
/// assert_eq!(backoff_seconds(5), 5);
/// assert_eq!(backoff_seconds(7), 13);
/// ```
pub fn backoff_seconds(attempt: u32) -> u64 {
    let (mut previous, mut current) = (0u64, 1u64);
    for _ in 1..attempt.max(1) {
        let next = previous.saturating_add(current);
        previous = current;
        current = next;
    }
    current
}

/// Same as [`backoff_seconds`], as a [`Duration`]
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(backoff_seconds(attempt))
}
