//! Clock
//!
//! Date-dependent checks read the current time through [`Clock`] so callers
//! can pin it.

use std::fmt::Debug;

use jiff::Timestamp;

/// Source of the current time.
pub trait Clock: Debug + Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// Returns whether `now` falls inside an optional, inclusive window.
pub fn within_window(
    now: Timestamp,
    starts_at: Option<Timestamp>,
    ends_at: Option<Timestamp>,
) -> bool {
    starts_at.is_none_or(|start| start <= now) && ends_at.is_none_or(|end| now <= end)
}
