use chrono::{DateTime, Duration, Utc};

/// A simple clock abstraction for deterministic time in services and tests.
///
/// The ledger records timestamps as unix seconds, so the clock exposes both
/// `DateTime<Utc>` and unix-second views of "now".
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Returns the current time as unix seconds, clamped to zero for
    /// pre-epoch fixed clocks.
    #[must_use]
    pub fn now_unix(&self) -> u64 {
        let secs = self.now().timestamp();
        u64::try_from(secs).unwrap_or(0)
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`. Used by tests to walk a fixed
    /// clock past envelope expiry deadlines.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

/// Deterministic timestamp for tests and doc examples (2024-05-02T12:00:00Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_714_651_200;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_is_stable() {
        let clock = fixed_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now_unix(), FIXED_TEST_TIMESTAMP as u64);
    }

    #[test]
    fn advance_moves_fixed_clocks_only() {
        let mut fixed = fixed_clock();
        let before = fixed.now();
        fixed.advance(Duration::seconds(45));
        assert_eq!(fixed.now() - before, Duration::seconds(45));

        let mut default = Clock::default_clock();
        default.advance(Duration::seconds(45));
        assert!(matches!(default, Clock::Default));
    }
}
