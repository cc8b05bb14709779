//! Monotonic timing of optimizer calls.

use std::time::{Duration, Instant};

/// Call `call` `repeats` times (at least once) and return the last value with the mean
/// duration. The clock is read immediately around each call; dropping the previous value
/// happens outside the measured window.
pub fn measure<T>(repeats: u32, mut call: impl FnMut() -> T) -> (T, Duration) {
    let repeats = repeats.max(1);
    let start = Instant::now();
    let mut value = call();
    let mut total = start.elapsed();
    for _ in 1..repeats {
        let start = Instant::now();
        let next = call();
        total += start.elapsed();
        value = next;
    }
    (value, total / repeats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_calls_at_least_once() {
        let mut calls = 0;
        let (value, _) = measure(0, || {
            calls += 1;
            calls
        });
        assert_eq!(value, 1);
        assert_eq!(calls, 1);
    }

    #[test]
    fn measure_returns_last_value_and_mean() {
        let mut calls = 0;
        let (value, mean) = measure(4, || {
            calls += 1;
            std::thread::sleep(Duration::from_millis(2));
            calls
        });
        assert_eq!(value, 4);
        assert!(mean >= Duration::from_millis(2));
    }
}
