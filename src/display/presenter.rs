use std::time::{Duration, Instant};

use super::{fit_line, StatusDisplay};
use crate::game::MatchState;
use crate::utils::RateLimiter;

/// Pushes the match state to a character display at a bounded rate
///
/// Display failures are logged and swallowed; a failed write is retried on
/// the next refresh window.
pub struct StatusPresenter<D: StatusDisplay> {
    display: D,
    width: usize,
    limiter: RateLimiter,
    failures: u64,
}

impl<D: StatusDisplay> StatusPresenter<D> {
    pub fn new(display: D, width: usize, update_interval_ms: u64) -> Self {
        Self {
            display,
            width,
            limiter: RateLimiter::new(update_interval_ms),
            failures: 0,
        }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Number of display writes that failed
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Lines that `render` would send for `state`
    pub fn lines(&self, state: &MatchState) -> (String, String) {
        let (score, status) = state.display_strings();
        (fit_line(&score, self.width), fit_line(&status, self.width))
    }

    /// Show the current score if the refresh interval has elapsed.
    /// Returns true when the display was written.
    pub fn render(&mut self, state: &MatchState, now: Instant) -> bool {
        if !self.limiter.should_trigger(now) {
            return false;
        }

        let (line1, line2) = self.lines(state);
        self.write(&line1, &line2)
    }

    /// Final screen on shutdown: the score, held for `hold`, then a blank display
    pub fn farewell(&mut self, state: &MatchState, hold: Duration) {
        let (left, right) = state.scores();
        let line1 = fit_line("GAME FINISHED", self.width);
        let line2 = fit_line(&format!("SCORE: {}-{}", left, right), self.width);

        if self.write(&line1, &line2) && !hold.is_zero() {
            std::thread::sleep(hold);
        }

        if let Err(e) = self.display.clear() {
            self.failures += 1;
            tracing::warn!("Failed to clear display: {}", e);
        }
    }

    fn write(&mut self, line1: &str, line2: &str) -> bool {
        match self.display.display(line1, line2) {
            Ok(()) => true,
            Err(e) => {
                self.failures += 1;
                tracing::warn!("Display update failed: {}", e);
                false
            }
        }
    }
}
