//! Clock source for the lifecycle engine.

use chrono::Utc;

/// Source of "now" in unix seconds.
///
/// Every operation reads the clock once and uses that value for both the
/// accounting math and the row it writes.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}
