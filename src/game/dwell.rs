/// Dwell timers
///
/// Measures how long the ball has continuously satisfied the scoring-zone
/// predicate on each half. A single frame outside the zone resets the side.
use std::time::{Duration, Instant};

use super::side::{Side, SideMap};

#[derive(Debug, Clone, Default)]
pub struct DwellTimers {
    started_at: SideMap<Option<Instant>>,
}

impl DwellTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one observation for `side`.
    ///
    /// Returns `None` when the ball is not in the zone, `Some(ZERO)` on the
    /// first in-zone observation and the time since that observation after.
    /// Repeating a call with the same arguments returns the same result.
    pub fn evaluate(&mut self, side: Side, in_zone: bool, now: Instant) -> Option<Duration> {
        if !in_zone {
            self.started_at[side] = None;
            return None;
        }

        let started = *self.started_at[side].get_or_insert(now);
        Some(now.saturating_duration_since(started))
    }

    /// Forget any running dwell on `side`
    pub fn clear(&mut self, side: Side) {
        self.started_at[side] = None;
    }

    pub fn clear_all(&mut self) {
        self.started_at = SideMap::default();
    }

    pub fn started_at(&self, side: Side) -> Option<Instant> {
        self.started_at[side]
    }

    pub fn is_running(&self, side: Side) -> bool {
        self.started_at[side].is_some()
    }

    /// Running dwell time without touching state
    pub fn elapsed(&self, side: Side, now: Instant) -> Option<Duration> {
        self.started_at[side].map(|started| now.saturating_duration_since(started))
    }
}
