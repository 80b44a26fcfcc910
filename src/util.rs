//! Small shared capabilities: wall-clock access and text truncation.

use chrono::{DateTime, Utc};

/// Source of the current time.
///
/// Injected wherever timestamps are recorded so tests can pin the clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system wall clock.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Truncate `input` to at most `max_chars` characters, replacing the final
/// three with `"..."` when truncation occurs. Character-based, never splits
/// a code point.
pub fn truncate_with_marker(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    let kept: String = input.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Clock;
    use chrono::{DateTime, Utc};
    use parking_lot::Mutex;

    /// Manually advanced clock for deterministic tests.
    pub struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        pub fn new(start: DateTime<Utc>) -> Self {
            Self {
                now: Mutex::new(start),
            }
        }

        pub fn advance(&self, duration: chrono::Duration) {
            let mut now = self.now.lock();
            *now += duration;
        }

        pub fn set(&self, to: DateTime<Utc>) {
            *self.now.lock() = to;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock()
        }
    }
}
