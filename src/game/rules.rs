/// Match rules
///
/// Scoring-zone geometry, timing thresholds and the win condition.
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Scoring zone starts below this frame row (pixels, y grows downwards)
    pub bottom_threshold: f32,

    /// Continuous time in the zone before a point is awarded
    pub dwell_threshold_ms: u64,

    /// Pause between points
    pub point_delay_ms: u64,

    /// Time the final result stays up before a new match starts
    pub restart_delay_ms: u64,

    /// Minimum score to win a match
    pub winning_score: u32,

    /// Minimum lead over the opponent to win a match
    pub winning_margin: u32,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            bottom_threshold: 400.0,
            dwell_threshold_ms: 1500,
            point_delay_ms: 2000,
            restart_delay_ms: 5000,
            winning_score: 11,
            winning_margin: 2,
        }
    }
}

impl GameRules {
    pub fn dwell_threshold(&self) -> Duration {
        Duration::from_millis(self.dwell_threshold_ms)
    }

    pub fn point_delay(&self) -> Duration {
        Duration::from_millis(self.point_delay_ms)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    /// Whether `score` against `opponent` wins the match
    pub fn is_winning(&self, score: u32, opponent: u32) -> bool {
        score >= self.winning_score && score.saturating_sub(opponent) >= self.winning_margin
    }

    /// All values must be positive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.bottom_threshold.is_finite() && self.bottom_threshold > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "bottom_threshold must be > 0 (got {})",
                self.bottom_threshold
            )));
        }

        let durations = [
            ("dwell_threshold_ms", self.dwell_threshold_ms),
            ("point_delay_ms", self.point_delay_ms),
            ("restart_delay_ms", self.restart_delay_ms),
        ];
        for (field, value) in durations {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{} must be > 0", field)));
            }
        }

        if self.winning_score == 0 {
            return Err(ConfigError::Invalid("winning_score must be > 0".to_string()));
        }
        if self.winning_margin == 0 {
            return Err(ConfigError::Invalid("winning_margin must be > 0".to_string()));
        }

        Ok(())
    }
}
