use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Monotonic nanosecond-resolution clock used to stamp order arrival.
///
/// spec.md §9 leaves open what happens when two orders land on the same
/// wall-clock nanosecond. Rather than leave tie-breaking on `timestamp`
/// implementation-defined, this clock guarantees each call returns a value
/// strictly greater than the last one it returned, by bumping off the wall
/// clock when two calls land in the same nanosecond.
pub struct MonotonicClock {
    last: AtomicI64,
}

impl MonotonicClock {
    pub const fn new() -> Self {
        Self {
            last: AtomicI64::new(i64::MIN),
        }
    }

    pub fn now_nanos(&self) -> i64 {
        let wall = Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_else(|| Utc::now().timestamp_millis() * 1_000_000);
        loop {
            let last = self.last.load(Ordering::SeqCst);
            let next = if wall > last { wall } else { last + 1 };
            if self
                .last
                .compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return next;
            }
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_strictly_increase() {
        let clock = MonotonicClock::new();
        let mut last = clock.now_nanos();
        for _ in 0..1000 {
            let next = clock.now_nanos();
            assert!(next > last);
            last = next;
        }
    }
}
